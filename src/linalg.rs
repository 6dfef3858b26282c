//! Small dense solves on top of nalgebra.
//!
//! Feature matrices live in ndarray; the k×k systems are handed to nalgebra
//! for Cholesky and LU factorizations.

extern crate nalgebra as na;

use na::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::AlsError;

pub fn clone_to_dmatrix<T>(array_view: ArrayView2<T>) -> DMatrix<T>
where
    T: Clone,
    T: na::Scalar,
{
    let nrows = array_view.ncols();
    let ncols = array_view.nrows();
    let elements = array_view.iter().cloned().collect::<Vec<T>>();
    DMatrix::from_vec(nrows, ncols, elements).transpose()
}

fn dmatrix_to_array(matrix: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((matrix.nrows(), matrix.ncols()), |(i, j)| matrix[(i, j)])
}

/// Solves `a * x = b` for symmetric positive-definite `a`.
///
/// `refinement_passes` extra rounds of `x += a⁻¹ (b - a x)` reuse the same
/// Cholesky factor.
pub fn solve_spd(
    a: ArrayView2<f64>,
    b: ArrayView1<f64>,
    refinement_passes: usize,
) -> Result<Array1<f64>, AlsError> {
    if a.nrows() != a.ncols() || a.nrows() != b.len() {
        return Err(AlsError::DimensionMismatch(format!(
            "cannot solve a {}x{} system against a vector of length {}",
            a.nrows(),
            a.ncols(),
            b.len()
        )));
    }

    let a = clone_to_dmatrix(a);
    let b = DVector::from_iterator(b.len(), b.iter().cloned());

    let cholesky = a.clone().cholesky().ok_or_else(|| {
        AlsError::SingularMatrix(format!(
            "{}x{} Gram matrix is not positive-definite",
            a.nrows(),
            a.ncols()
        ))
    })?;

    let mut x = cholesky.solve(&b);
    for _ in 0..refinement_passes {
        let residual = &b - &a * &x;
        x += cholesky.solve(&residual);
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(AlsError::SingularMatrix(
            "row solve produced non-finite values".to_string(),
        ));
    }

    Ok(Array1::from_iter(x.iter().cloned()))
}

/// Inverse of a square matrix through LU decomposition
pub fn invert(a: ArrayView2<f64>) -> Result<Array2<f64>, AlsError> {
    if a.nrows() != a.ncols() {
        return Err(AlsError::DimensionMismatch(format!(
            "cannot invert a {}x{} matrix",
            a.nrows(),
            a.ncols()
        )));
    }

    let inverse = clone_to_dmatrix(a)
        .lu()
        .try_inverse()
        .ok_or_else(|| AlsError::SingularMatrix(format!("{}x{} matrix", a.nrows(), a.ncols())))?;

    if inverse.iter().any(|v| !v.is_finite()) {
        return Err(AlsError::SingularMatrix(
            "inverse contains non-finite values".to_string(),
        ));
    }

    Ok(dmatrix_to_array(&inverse))
}

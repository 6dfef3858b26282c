//! # Row Solver
//!
//! Closed-form least-squares update of a single feature row while the
//! counterpart matrix is held fixed.
//!
//! - Explicit feedback (ALS-WR): `x = (VᵀV + λ·n·I)⁻¹ Vᵀr` over the `n` rated
//!   counterparts.
//! - Implicit feedback (Hu, Koren, Volinsky): `x = (YᵀY + Yᵀ(C−I)Y + λI)⁻¹ YᵀCp`
//!   over the whole counterpart matrix `Y`, with confidence `c = 1 + α·r`.
//!   `YᵀY` is shared by every row of a phase and `Yᵀ(C−I)Y` is a rank-`n`
//!   update over the rated rows only.

use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::error::AlsError;
use crate::linalg::solve_spd;

/// Solve mode, chosen once per factorization
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Solver {
    Explicit,
    Implicit { alpha: f64 },
}

impl Solver {
    pub fn is_implicit(&self) -> bool {
        matches!(self, Solver::Implicit { .. })
    }

    /// Binds the solver to the fixed matrix of one phase
    pub fn for_phase<'a>(
        &self,
        fixed: ArrayView2<'a, f64>,
        lambda: f64,
        refinement_passes: usize,
    ) -> RowSolver<'a> {
        let gram = match self {
            Solver::Explicit => None,
            Solver::Implicit { .. } => Some(fixed.t().dot(&fixed)),
        };
        RowSolver {
            solver: *self,
            fixed,
            gram,
            lambda,
            refinement_passes,
        }
    }
}

/// Per-phase solver: read-only view of the fixed matrix plus the shared
/// precomputation for implicit feedback.
pub struct RowSolver<'a> {
    solver: Solver,
    fixed: ArrayView2<'a, f64>,
    gram: Option<Array2<f64>>,
    lambda: f64,
    refinement_passes: usize,
}

impl<'a> RowSolver<'a> {
    /// New feature row for an entity whose observations are
    /// `(counterpart_index, rating)` pairs.
    pub fn solve(&self, ratings: &[(usize, f64)]) -> Result<Array1<f64>, AlsError> {
        match (self.solver, &self.gram) {
            (Solver::Explicit, _) => self.solve_explicit(ratings),
            (Solver::Implicit { alpha }, Some(gram)) => self.solve_implicit(ratings, alpha, gram),
            (Solver::Implicit { .. }, None) => Err(AlsError::DimensionMismatch(
                "implicit solve without a Gram matrix".to_string(),
            )),
        }
    }

    fn solve_explicit(&self, ratings: &[(usize, f64)]) -> Result<Array1<f64>, AlsError> {
        let (v, r) = self.gather(ratings);

        let mut gram = v.t().dot(&v);
        // an entity without observations keeps λI and resolves to the zero vector
        let weight = self.lambda * ratings.len().max(1) as f64;
        let mut diag = gram.diag_mut();
        diag += weight;

        let rhs = v.t().dot(&r);
        solve_spd(gram.view(), rhs.view(), self.refinement_passes)
    }

    fn solve_implicit(
        &self,
        ratings: &[(usize, f64)],
        alpha: f64,
        gram: &Array2<f64>,
    ) -> Result<Array1<f64>, AlsError> {
        let (v, r) = self.gather(ratings);

        let confidence = r.mapv(|value| 1.0 + alpha * value);
        let extra = &confidence - 1.0;
        let weighted = &v * &extra.view().insert_axis(Axis(1));

        let mut a = gram + &weighted.t().dot(&v);
        let mut diag = a.diag_mut();
        diag += self.lambda;

        // p is 1 exactly on the rated rows, so YᵀCp only sums those
        let rhs = v.t().dot(&confidence);
        solve_spd(a.view(), rhs.view(), self.refinement_passes)
    }

    fn gather(&self, ratings: &[(usize, f64)]) -> (Array2<f64>, Array1<f64>) {
        let indices: Vec<usize> = ratings.iter().map(|&(index, _)| index).collect();
        let values = ratings.iter().map(|&(_, value)| value).collect::<Array1<f64>>();
        (self.fixed.select(Axis(0), &indices), values)
    }
}

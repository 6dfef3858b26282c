//! # Fold-in Projection
//!
//! Places users that were not part of training into the learned factor
//! space from the items they interacted with, without retraining.
//!
//! The projector `P = M (MᵀM)⁻¹` is computed once from the finished item
//! matrix; a known user's rating row `r` maps to `Pᵀ r`.

use log::{debug, info};
use ndarray::{Array1, Array2};

use crate::error::{AlsError, EntityKind};
use crate::factorization::Factorization;
use crate::linalg::invert;

/// A finished factorization together with its user fold-in matrix
#[derive(Debug, Clone)]
pub struct FoldInProjector {
    factorization: Factorization,
    /// items x k, empty when the factorization has no items
    projection: Array2<f64>,
}

impl FoldInProjector {
    pub fn new(factorization: Factorization) -> Result<Self, AlsError> {
        let item_features = factorization.all_item_features();

        // without items there is nothing to invert and nothing to fold in
        if item_features.nrows() == 0 {
            return Ok(Self {
                projection: Array2::zeros((0, factorization.num_features())),
                factorization,
            });
        }

        info!(
            "Computing fold-in matrix from a {} x {} item features matrix",
            factorization.num_items(),
            factorization.num_features()
        );

        let gram = item_features.t().dot(item_features);
        let inverse = invert(gram.view())?;
        let projection = item_features.dot(&inverse);

        Ok(Self {
            factorization,
            projection,
        })
    }

    pub fn factorization(&self) -> &Factorization {
        &self.factorization
    }

    pub fn projection(&self) -> &Array2<f64> {
        &self.projection
    }

    /// Sum of the projector rows of all known items.
    ///
    /// The result is not normalized and grows with the number of items.
    pub fn fold_in_user(&self, item_ids: &[u64]) -> Result<Array1<f64>, AlsError> {
        let mut user_features = Array1::<f64>::zeros(self.factorization.num_features());
        for &item_id in item_ids {
            if let Some(row) = self.resolve(item_ids, item_id)? {
                user_features += &self.projection.row(row);
            }
        }
        Ok(user_features)
    }

    /// Sum of unit-length item rows, divided by its L1 norm.
    ///
    /// Independent of session length, so sessions of different sizes stay
    /// comparable.
    pub fn fold_in_anonymous_user(&self, item_ids: &[u64]) -> Result<Array1<f64>, AlsError> {
        let item_features = self.factorization.all_item_features();
        let mut user_features = Array1::<f64>::zeros(self.factorization.num_features());

        for &item_id in item_ids {
            if let Some(row) = self.resolve(item_ids, item_id)? {
                let features = item_features.row(row);
                let norm = features.dot(&features).sqrt();
                if norm > 0.0 {
                    user_features.scaled_add(1.0 / norm, &features);
                } else {
                    debug!("Item {} has an all-zero feature row, skipping", item_id);
                }
            }
        }

        let l1_norm: f64 = user_features.iter().map(|v| v.abs()).sum();
        if l1_norm > 0.0 {
            user_features /= l1_norm;
        }
        Ok(user_features)
    }

    /// Row of a known item. Unknown items are skipped unless they are the
    /// only item given.
    fn resolve(&self, item_ids: &[u64], item_id: u64) -> Result<Option<usize>, AlsError> {
        match self.factorization.item_index().get(item_id) {
            Some(row) => Ok(Some(row)),
            None => {
                debug!("Item unknown: {}", item_id);
                if item_ids.len() == 1 {
                    Err(AlsError::not_found(EntityKind::Item, item_id))
                } else {
                    Ok(None)
                }
            }
        }
    }
}

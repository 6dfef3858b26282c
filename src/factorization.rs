//! Immutable result of a finished training run.

use ndarray::{Array2, ArrayView1};

use crate::error::AlsError;
use crate::index::IdIndex;

/// The two factor matrices with their ID mappings and the error recorded
/// after every iteration.
#[derive(Debug, Clone)]
pub struct Factorization {
    user_index: IdIndex,
    item_index: IdIndex,
    user_features: Array2<f64>,
    item_features: Array2<f64>,
    errors: Vec<f64>,
}

impl Factorization {
    pub fn new(
        user_index: IdIndex,
        item_index: IdIndex,
        user_features: Array2<f64>,
        item_features: Array2<f64>,
        errors: Vec<f64>,
    ) -> Result<Self, AlsError> {
        if user_features.nrows() != user_index.len() {
            return Err(AlsError::DimensionMismatch(format!(
                "{} user rows for {} user ids",
                user_features.nrows(),
                user_index.len()
            )));
        }
        if item_features.nrows() != item_index.len() {
            return Err(AlsError::DimensionMismatch(format!(
                "{} item rows for {} item ids",
                item_features.nrows(),
                item_index.len()
            )));
        }
        if user_features.ncols() != item_features.ncols() {
            return Err(AlsError::DimensionMismatch(format!(
                "users have {} features, items have {}",
                user_features.ncols(),
                item_features.ncols()
            )));
        }

        Ok(Self {
            user_index,
            item_index,
            user_features,
            item_features,
            errors,
        })
    }

    pub fn user_features(&self, user_id: u64) -> Result<ArrayView1<'_, f64>, AlsError> {
        let row = self.user_index.index_of(user_id)?;
        Ok(self.user_features.row(row))
    }

    pub fn item_features(&self, item_id: u64) -> Result<ArrayView1<'_, f64>, AlsError> {
        let row = self.item_index.index_of(item_id)?;
        Ok(self.item_features.row(row))
    }

    /// Predicted preference `dot(user, item)`
    pub fn estimate(&self, user_id: u64, item_id: u64) -> Result<f64, AlsError> {
        Ok(self
            .user_features(user_id)?
            .dot(&self.item_features(item_id)?))
    }

    pub fn num_features(&self) -> usize {
        self.item_features.ncols()
    }

    pub fn num_users(&self) -> usize {
        self.user_index.len()
    }

    pub fn num_items(&self) -> usize {
        self.item_index.len()
    }

    /// One entry per configured iteration
    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    pub fn user_index(&self) -> &IdIndex {
        &self.user_index
    }

    pub fn item_index(&self) -> &IdIndex {
        &self.item_index
    }

    pub fn all_user_features(&self) -> &Array2<f64> {
        &self.user_features
    }

    pub fn all_item_features(&self) -> &Array2<f64> {
        &self.item_features
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::error::EntityKind;

    fn factorization() -> Factorization {
        Factorization::new(
            IdIndex::from_ids(EntityKind::User, vec![5, 6]).unwrap(),
            IdIndex::from_ids(EntityKind::Item, vec![50, 60, 70]).unwrap(),
            array![[1.0, 2.0], [0.5, -1.0]],
            array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
            vec![3.0, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_and_counts() {
        let f = factorization();
        assert_eq!(f.num_users(), 2);
        assert_eq!(f.num_items(), 3);
        assert_eq!(f.num_features(), 2);
        assert_eq!(f.errors(), &[3.0, 1.0]);
        assert_eq!(f.user_features(6).unwrap().to_vec(), vec![0.5, -1.0]);
        assert_eq!(f.item_features(70).unwrap().to_vec(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_estimate() {
        let f = factorization();
        assert_eq!(f.estimate(5, 70).unwrap(), 3.0);
        assert_eq!(f.estimate(6, 60).unwrap(), -1.0);
    }

    #[test]
    fn test_unknown_ids() {
        let f = factorization();
        assert!(matches!(
            f.user_features(1),
            Err(AlsError::NotFound {
                kind: EntityKind::User,
                id: 1
            })
        ));
        assert!(matches!(
            f.estimate(5, 1),
            Err(AlsError::NotFound {
                kind: EntityKind::Item,
                id: 1
            })
        ));
    }

    #[test]
    fn test_shape_validation() {
        let result = Factorization::new(
            IdIndex::from_ids(EntityKind::User, vec![5]).unwrap(),
            IdIndex::from_ids(EntityKind::Item, vec![50]).unwrap(),
            array![[1.0, 2.0]],
            array![[1.0, 0.0, 3.0]],
            vec![],
        );
        assert!(matches!(result, Err(AlsError::DimensionMismatch(_))));

        let result = Factorization::new(
            IdIndex::from_ids(EntityKind::User, vec![5, 6]).unwrap(),
            IdIndex::from_ids(EntityKind::Item, vec![50]).unwrap(),
            array![[1.0, 2.0]],
            array![[1.0, 0.0]],
            vec![],
        );
        assert!(matches!(result, Err(AlsError::DimensionMismatch(_))));
    }
}

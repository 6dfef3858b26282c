//! Initial factor matrices.
//!
//! `M` starts from each item's mean rating plus small random noise, `U` from
//! zero, so the first user phase already solves against informative items.

use ndarray::{s, Array2};
use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

/// Column 0 of an item that has no ratings at all
pub const UNRATED_ITEM_SEED: f64 = 0.1;

/// Upper bound (exclusive) of the random item features
const RANDOM_FEATURE_SCALE: f64 = 0.1;

/// The two factor matrices, owned exclusively by the factorizer while it trains
#[derive(Debug, Clone)]
pub struct FeatureMatrices {
    /// users x k
    pub u: Array2<f64>,
    /// items x k
    pub m: Array2<f64>,
}

impl FeatureMatrices {
    /// Initial state: `U` all zero, `M` with its first column seeded by the
    /// mean rating of each item and the remaining columns drawn from
    /// `Uniform[0, 0.1)`.
    ///
    /// `item_ratings[i]` holds the observed values of item row `i`.
    pub fn initialize<R>(
        num_users: usize,
        item_ratings: &[R],
        num_features: usize,
        seed: u64,
    ) -> FeatureMatrices
    where
        R: AsRef<[(usize, f64)]>,
    {
        let num_items = item_ratings.len();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut m = Array2::<f64>::zeros((num_items, num_features));
        for (row, ratings) in item_ratings.iter().enumerate() {
            m[[row, 0]] = mean_rating(ratings.as_ref());
        }
        if num_features > 1 {
            let random = Array2::random_using(
                (num_items, num_features - 1),
                Uniform::new(0.0, RANDOM_FEATURE_SCALE),
                &mut rng,
            );
            m.slice_mut(s![.., 1..]).assign(&random);
        }

        FeatureMatrices {
            u: Array2::zeros((num_users, num_features)),
            m,
        }
    }

    pub fn num_features(&self) -> usize {
        self.m.ncols()
    }
}

fn mean_rating(ratings: &[(usize, f64)]) -> f64 {
    if ratings.is_empty() {
        return UNRATED_ITEM_SEED;
    }
    ratings.iter().map(|&(_, value)| value).sum::<f64>() / ratings.len() as f64
}

//! Shared synthetic rating sets for unit tests

use crate::ratings::{InMemoryRatings, Preference};

/// Sparse 1-5 star ratings for five users and four items.
pub fn small_ratings() -> InMemoryRatings {
    InMemoryRatings::from_preferences(vec![
        Preference::new(1, 101, 5.0),
        Preference::new(1, 102, 3.0),
        Preference::new(1, 104, 1.0),
        Preference::new(2, 101, 4.0),
        Preference::new(2, 103, 2.0),
        Preference::new(3, 102, 5.0),
        Preference::new(3, 103, 4.0),
        Preference::new(3, 104, 2.0),
        Preference::new(4, 101, 1.0),
        Preference::new(4, 104, 5.0),
        Preference::new(5, 102, 3.0),
        Preference::new(5, 103, 3.0),
    ])
}

/// User factors of `dense_exact_rank_ratings`
pub const USER_FACTORS: [[f64; 2]; 6] = [
    [1.0, 2.0],
    [2.0, 1.0],
    [0.5, 1.5],
    [3.0, 0.5],
    [1.0, 1.0],
    [2.0, 2.5],
];

/// Item factors of `dense_exact_rank_ratings`
pub const ITEM_FACTORS: [[f64; 2]; 5] = [
    [1.0, 0.5],
    [0.2, 1.0],
    [1.5, 1.5],
    [0.7, 0.3],
    [1.0, 2.0],
];

/// Fully observed, noiseless rank-2 rating matrix: `r(u, i) = a_u · b_i`.
/// Users are numbered from 1, items from 100.
pub fn dense_exact_rank_ratings() -> InMemoryRatings {
    let mut prefs = Vec::new();
    for (u, a) in USER_FACTORS.iter().enumerate() {
        for (i, b) in ITEM_FACTORS.iter().enumerate() {
            let value = a[0] * b[0] + a[1] * b[1];
            prefs.push(Preference::new(u as u64 + 1, i as u64 + 100, value));
        }
    }
    InMemoryRatings::from_preferences(prefs)
}

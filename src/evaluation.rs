//! Held-out error after each iteration.
//!
//! Full-error policy: for every test user known to the training index, sum
//! `|predicted - actual|` over that user's test preferences, with
//! `predicted = dot(user_row, item_row)`. Test users or items that never
//! appeared in training are skipped and counted.

use ndarray::Array2;

use crate::error::AlsError;
use crate::index::IdIndex;
use crate::ratings::RatingSource;

/// Error of one iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub total_absolute_error: f64,
    pub samples: usize,
}

impl Evaluation {
    /// Summed absolute error, NaN when nothing could be scored
    pub fn error(&self) -> f64 {
        if self.samples == 0 {
            f64::NAN
        } else {
            self.total_absolute_error
        }
    }

    pub fn mean_absolute_error(&self) -> f64 {
        if self.samples == 0 {
            f64::NAN
        } else {
            self.total_absolute_error / self.samples as f64
        }
    }

    pub fn has_data(&self) -> bool {
        self.samples > 0
    }
}

/// Test preferences resolved to dense `(user_row, item_row, actual)` triples
#[derive(Debug, Clone, Default)]
pub struct ErrorEvaluator {
    samples: Vec<(usize, usize, f64)>,
    skipped_users: usize,
    skipped_preferences: usize,
}

impl ErrorEvaluator {
    pub fn new(
        test: &dyn RatingSource,
        users: &IdIndex,
        items: &IdIndex,
    ) -> Result<Self, AlsError> {
        let mut evaluator = ErrorEvaluator::default();

        for &user_id in test.user_ids() {
            let preferences = test.preferences_from_user(user_id)?;
            let user_row = match users.get(user_id) {
                Some(row) => row,
                None => {
                    evaluator.skipped_users += 1;
                    evaluator.skipped_preferences += preferences.len();
                    continue;
                }
            };
            for &(item_id, actual) in preferences {
                match items.get(item_id) {
                    Some(item_row) => evaluator.samples.push((user_row, item_row, actual)),
                    None => evaluator.skipped_preferences += 1,
                }
            }
        }

        Ok(evaluator)
    }

    /// Evaluator without test data; every iteration evaluates to NaN
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn skipped_users(&self) -> usize {
        self.skipped_users
    }

    pub fn skipped_preferences(&self) -> usize {
        self.skipped_preferences
    }

    pub fn evaluate(&self, u: &Array2<f64>, m: &Array2<f64>) -> Evaluation {
        let total_absolute_error = self
            .samples
            .iter()
            .map(|&(user_row, item_row, actual)| {
                let predicted = u.row(user_row).dot(&m.row(item_row));
                (predicted - actual).abs()
            })
            .sum();

        Evaluation {
            total_absolute_error,
            samples: self.samples.len(),
        }
    }
}

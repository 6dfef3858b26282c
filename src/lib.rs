//! # fast_als
//!
//! Alternating Least Squares matrix factorization for collaborative
//! filtering, with weighted-λ regularization, confidence-weighted implicit
//! feedback, data-parallel row solves and fold-in of users unseen at
//! training time.
//!
//! ```no_run
//! use fast_als::{AlsConfig, Factorizer, FoldInProjector, InMemoryRatings, Preference};
//!
//! # fn main() -> Result<(), fast_als::AlsError> {
//! let ratings = InMemoryRatings::from_preferences(vec![
//!     Preference::new(1, 10, 4.0),
//!     Preference::new(1, 11, 2.0),
//!     Preference::new(2, 10, 5.0),
//! ]);
//! let factorization = Factorizer::new(AlsConfig::new(2, 0.065, 10), &ratings)?.factorize()?;
//! let projector = FoldInProjector::new(factorization)?;
//! let new_user = projector.fold_in_user(&[10, 11])?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod evaluation;
pub mod executor;
pub mod factorization;
pub mod factorizer;
pub mod features;
pub mod fold_in;
pub mod index;
pub mod linalg;
pub mod observer;
pub mod ratings;
pub mod solver;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for convenience
pub use config::{AlsConfig, TrainingArgs};
pub use error::{AlsError, EntityKind};
pub use evaluation::{ErrorEvaluator, Evaluation};
pub use executor::{CancelHandle, Phase, PhaseExecutor};
pub use factorization::Factorization;
pub use factorizer::Factorizer;
pub use fold_in::FoldInProjector;
pub use index::IdIndex;
pub use observer::{LogObserver, RecordingObserver, TrainingEvent, TrainingObserver};
pub use ratings::{InMemoryRatings, Preference, RatingSource};
pub use solver::Solver;

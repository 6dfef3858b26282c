//! # Error Types
//!
//! A single error enum covers every failure of the training core: unknown
//! IDs, invalid configuration, singular systems and aborted phases.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use crate::executor::Phase;

/// Which side of the rating matrix an ID belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Item,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EntityKind::User => write!(f, "user"),
            EntityKind::Item => write!(f, "item"),
        }
    }
}

/// Errors raised while indexing, training, evaluating or folding in
#[derive(Debug)]
pub enum AlsError {
    /// Lookup of an ID that was never indexed
    NotFound { kind: EntityKind, id: u64 },
    /// The same ID was enumerated twice while building an index
    DuplicateId { kind: EntityKind, id: u64 },
    InvalidConfiguration(String),
    DimensionMismatch(String),
    /// A k×k system could not be factored or produced non-finite values
    SingularMatrix(String),
    PhaseTimeout {
        iteration: usize,
        phase: Phase,
        elapsed: Duration,
    },
    Cancelled { iteration: usize, phase: Phase },
    ThreadPool(String),
    Input(String),
}

impl AlsError {
    pub fn not_found(kind: EntityKind, id: u64) -> Self {
        AlsError::NotFound { kind, id }
    }

    /// True for the failures that abort a running phase
    pub fn is_abort(&self) -> bool {
        matches!(
            self,
            AlsError::PhaseTimeout { .. } | AlsError::Cancelled { .. }
        )
    }
}

impl fmt::Display for AlsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AlsError::NotFound { kind, id } => write!(f, "No such {}: {}", kind, id),
            AlsError::DuplicateId { kind, id } => {
                write!(f, "Duplicate {} id {} while building index", kind, id)
            }
            AlsError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            AlsError::DimensionMismatch(msg) => write!(f, "Dimension mismatch: {}", msg),
            AlsError::SingularMatrix(msg) => write!(f, "Singular matrix: {}", msg),
            AlsError::PhaseTimeout {
                iteration,
                phase,
                elapsed,
            } => write!(
                f,
                "{} phase of iteration {} exceeded its deadline after {:?}",
                phase, iteration, elapsed
            ),
            AlsError::Cancelled { iteration, phase } => {
                write!(f, "{} phase of iteration {} was cancelled", phase, iteration)
            }
            AlsError::ThreadPool(msg) => write!(f, "Thread pool error: {}", msg),
            AlsError::Input(msg) => write!(f, "Input error: {}", msg),
        }
    }
}

impl Error for AlsError {}

impl From<rayon::ThreadPoolBuildError> for AlsError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        AlsError::ThreadPool(e.to_string())
    }
}

impl From<csv::Error> for AlsError {
    fn from(e: csv::Error) -> Self {
        AlsError::Input(e.to_string())
    }
}

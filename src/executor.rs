//! # Phase Executor
//!
//! Data-parallel scheduler for one half-iteration: every row of the target
//! matrix is recomputed by exactly one task while the counterpart matrix is
//! only read. A phase either completes for every row or fails as a whole.
//!
//! ## Guarantees
//! - One writer per row: tasks receive disjoint mutable row views.
//! - Barrier: `run` returns only after every task has finished, so the next
//!   phase observes all writes.
//! - Abort: the first failing row, an expired deadline or a cancellation
//!   stops the remaining tasks and the error is returned to the caller.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::error::AlsError;

/// Half of an ALS iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Recompute U with M fixed
    Users,
    /// Recompute M with U fixed
    Items,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Phase::Users => write!(f, "user"),
            Phase::Items => write!(f, "item"),
        }
    }
}

/// Shared flag to abort a running factorization from another thread
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Outcome of a completed phase
#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub rows: usize,
    pub elapsed: Duration,
}

/// Bounded worker pool running one task per row
pub struct PhaseExecutor {
    pool: ThreadPool,
    timeout: Option<Duration>,
    cancel: CancelHandle,
}

impl PhaseExecutor {
    pub fn new(
        num_workers: usize,
        timeout: Option<Duration>,
        cancel: CancelHandle,
    ) -> Result<Self, AlsError> {
        if num_workers == 0 {
            return Err(AlsError::InvalidConfiguration(
                "executor needs at least one worker".to_string(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|i| format!("als-worker-{}", i))
            .build()?;

        Ok(Self {
            pool,
            timeout,
            cancel,
        })
    }

    pub fn num_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Replaces every row of `target` with `solve_row(row)`.
    pub fn run<F>(
        &self,
        iteration: usize,
        phase: Phase,
        target: &mut Array2<f64>,
        solve_row: F,
    ) -> Result<PhaseReport, AlsError>
    where
        F: Fn(usize) -> Result<Array1<f64>, AlsError> + Sync,
    {
        let start = Instant::now();
        let deadline = self.timeout.map(|timeout| start + timeout);
        let rows = target.nrows();
        let num_features = target.ncols();
        let cancel = &self.cancel;

        self.pool.install(|| {
            target
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .enumerate()
                .try_for_each(|(row, mut features)| {
                    if cancel.is_cancelled() {
                        return Err(AlsError::Cancelled { iteration, phase });
                    }
                    if let Some(deadline) = deadline {
                        if Instant::now() >= deadline {
                            return Err(AlsError::PhaseTimeout {
                                iteration,
                                phase,
                                elapsed: start.elapsed(),
                            });
                        }
                    }

                    let solved = solve_row(row)?;
                    if solved.len() != num_features {
                        return Err(AlsError::DimensionMismatch(format!(
                            "{} row {} solved to {} features, expected {}",
                            phase,
                            row,
                            solved.len(),
                            num_features
                        )));
                    }
                    features.assign(&solved);
                    Ok(())
                })
        })?;

        let elapsed = start.elapsed();
        // the last tasks may have started in time and still finished late
        if let Some(timeout) = self.timeout {
            if elapsed > timeout {
                return Err(AlsError::PhaseTimeout {
                    iteration,
                    phase,
                    elapsed,
                });
            }
        }

        Ok(PhaseReport { rows, elapsed })
    }
}

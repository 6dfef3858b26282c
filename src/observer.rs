//! Training progress sink.
//!
//! The factorizer reports through an observer handed to it at construction
//! instead of writing to a global logger directly.

use std::sync::Mutex;
use std::time::Duration;

use log::{info, warn};

use crate::executor::Phase;

#[derive(Debug, Clone, PartialEq)]
pub enum TrainingEvent {
    Started {
        num_users: usize,
        num_items: usize,
        num_features: usize,
        num_workers: usize,
        implicit: bool,
    },
    TestDataResolved {
        samples: usize,
        skipped_users: usize,
        skipped_preferences: usize,
    },
    PhaseCompleted {
        iteration: usize,
        phase: Phase,
        rows: usize,
        elapsed: Duration,
    },
    IterationEvaluated {
        iteration: usize,
        error: f64,
        samples: usize,
    },
    /// No test sample could be scored, the recorded error is NaN
    NoEvaluationData { iteration: usize },
    Finished { elapsed: Duration },
}

pub trait TrainingObserver: Send + Sync {
    fn on_event(&self, event: &TrainingEvent);
}

/// Forwards events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl TrainingObserver for LogObserver {
    fn on_event(&self, event: &TrainingEvent) {
        match event {
            TrainingEvent::Started {
                num_users,
                num_items,
                num_features,
                num_workers,
                implicit,
            } => info!(
                "starting to compute the factorization: {} users, {} items, {} features, {} workers{}",
                num_users,
                num_items,
                num_features,
                num_workers,
                if *implicit { ", implicit feedback" } else { "" }
            ),
            TrainingEvent::TestDataResolved {
                samples,
                skipped_users,
                skipped_preferences,
            } => {
                info!("evaluating against {} test preferences", samples);
                if *skipped_users > 0 || *skipped_preferences > 0 {
                    warn!(
                        "{} test users and {} test preferences are unknown to the training data and will be skipped",
                        skipped_users, skipped_preferences
                    );
                }
            }
            TrainingEvent::PhaseCompleted {
                iteration,
                phase,
                rows,
                elapsed,
            } => info!(
                "iteration {}: {} phase solved {} rows in {:?}",
                iteration, phase, rows, elapsed
            ),
            TrainingEvent::IterationEvaluated {
                iteration,
                error,
                samples,
            } => info!(
                "iteration {}: error {:.6} over {} test preferences",
                iteration, error, samples
            ),
            TrainingEvent::NoEvaluationData { iteration } => {
                warn!("iteration {}: no test data to evaluate, error is undefined", iteration)
            }
            TrainingEvent::Finished { elapsed } => {
                info!("finished computation of the factorization in {:?}", elapsed)
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<TrainingEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TrainingEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl TrainingObserver for RecordingObserver {
    fn on_event(&self, event: &TrainingEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.on_event(&TrainingEvent::NoEvaluationData { iteration: 0 });
        observer.on_event(&TrainingEvent::Finished {
            elapsed: Duration::from_millis(5),
        });

        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], TrainingEvent::NoEvaluationData { iteration: 0 });
        assert!(matches!(events[1], TrainingEvent::Finished { .. }));
    }

    #[test]
    fn test_log_observer_handles_every_event() {
        let _ = env_logger::builder().is_test(true).try_init();
        let events = vec![
            TrainingEvent::Started {
                num_users: 4,
                num_items: 3,
                num_features: 2,
                num_workers: 1,
                implicit: true,
            },
            TrainingEvent::TestDataResolved {
                samples: 3,
                skipped_users: 1,
                skipped_preferences: 2,
            },
            TrainingEvent::PhaseCompleted {
                iteration: 0,
                phase: Phase::Users,
                rows: 4,
                elapsed: Duration::from_millis(5),
            },
            TrainingEvent::IterationEvaluated {
                iteration: 0,
                error: 0.25,
                samples: 3,
            },
            TrainingEvent::NoEvaluationData { iteration: 1 },
            TrainingEvent::Finished {
                elapsed: Duration::from_secs(1),
            },
        ];

        // the log observer only forwards; the recording one sees the same stream
        let recorder = RecordingObserver::new();
        for event in &events {
            LogObserver.on_event(event);
            recorder.on_event(event);
        }
        assert_eq!(recorder.events(), events);
    }
}

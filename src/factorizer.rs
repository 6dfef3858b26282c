//! # ALS-WR Factorizer
//!
//! Factorizes the rating matrix with Alternating Least Squares and
//! weighted-λ regularization, optionally with confidence-weighted implicit
//! feedback.
//!
//! ## Training loop
//! `Init → (UserPhase → ItemPhase → Eval) × num_iterations → Done`
//!
//! 1. **UserPhase**: every user row is re-solved with `M` fixed
//! 2. **ItemPhase**: every item row is re-solved with `U` fixed
//! 3. **Eval**: held-out error of the iteration is recorded
//!
//! Each phase runs on the worker pool and finishes completely before the
//! next one starts. Any failing row aborts the whole factorization.
//!
//! ## References
//! Zhou, Y., et al. (2008). "Large-scale Parallel Collaborative Filtering for the Netflix Prize."
//! Hu, Y., Koren, Y., Volinsky, C. (2008). "Collaborative Filtering for Implicit Feedback Datasets."

use std::sync::Arc;
use std::time::Instant;

use crate::config::AlsConfig;
use crate::error::{AlsError, EntityKind};
use crate::evaluation::ErrorEvaluator;
use crate::executor::{CancelHandle, Phase, PhaseExecutor, PhaseReport};
use crate::factorization::Factorization;
use crate::features::FeatureMatrices;
use crate::index::IdIndex;
use crate::observer::{LogObserver, TrainingEvent, TrainingObserver};
use crate::ratings::RatingSource;

/// Training data resolved to dense row indices on both sides
#[derive(Debug, Clone)]
pub struct IndexedRatings {
    /// per user row: `(item_row, rating)`
    pub by_user: Vec<Vec<(usize, f64)>>,
    /// per item row: `(user_row, rating)`
    pub by_item: Vec<Vec<(usize, f64)>>,
}

impl IndexedRatings {
    pub fn resolve(
        source: &dyn RatingSource,
        users: &IdIndex,
        items: &IdIndex,
    ) -> Result<Self, AlsError> {
        let by_user = users
            .ids()
            .iter()
            .map(|&user_id| {
                source
                    .preferences_from_user(user_id)?
                    .iter()
                    .map(|&(item_id, value)| Ok((items.index_of(item_id)?, value)))
                    .collect::<Result<Vec<_>, AlsError>>()
            })
            .collect::<Result<Vec<_>, AlsError>>()?;

        let by_item = items
            .ids()
            .iter()
            .map(|&item_id| {
                source
                    .preferences_for_item(item_id)?
                    .iter()
                    .map(|&(user_id, value)| Ok((users.index_of(user_id)?, value)))
                    .collect::<Result<Vec<_>, AlsError>>()
            })
            .collect::<Result<Vec<_>, AlsError>>()?;

        Ok(Self { by_user, by_item })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrainingState {
    Init,
    UserPhase(usize),
    ItemPhase(usize),
    Eval(usize),
    Done,
}

pub struct Factorizer<'a> {
    config: AlsConfig,
    training: &'a dyn RatingSource,
    test: Option<&'a dyn RatingSource>,
    observer: Arc<dyn TrainingObserver>,
    cancel: CancelHandle,
}

impl<'a> Factorizer<'a> {
    pub fn new(config: AlsConfig, training: &'a dyn RatingSource) -> Result<Self, AlsError> {
        config.validate()?;
        Ok(Self {
            config,
            training,
            test: None,
            observer: Arc::new(LogObserver),
            cancel: CancelHandle::new(),
        })
    }

    /// Held-out preferences scored after every iteration
    pub fn with_test_data(mut self, test: &'a dyn RatingSource) -> Self {
        self.test = Some(test);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn TrainingObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Handle that aborts a running `factorize` call.
    ///
    /// The flag is never reset: once cancelled, every later `factorize` on
    /// this factorizer fails with `Cancelled` before solving a row.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn factorize(&self) -> Result<Factorization, AlsError> {
        let start_time = Instant::now();
        let config = &self.config;
        let num_features = config.num_features;
        let solver = config.solver();

        let user_index =
            IdIndex::from_ids(EntityKind::User, self.training.user_ids().iter().copied())?;
        let item_index =
            IdIndex::from_ids(EntityKind::Item, self.training.item_ids().iter().copied())?;
        let ratings = IndexedRatings::resolve(self.training, &user_index, &item_index)?;
        let evaluator = match self.test {
            Some(test) => ErrorEvaluator::new(test, &user_index, &item_index)?,
            None => ErrorEvaluator::empty(),
        };
        let executor = PhaseExecutor::new(
            config.num_workers,
            config.phase_timeout,
            self.cancel.clone(),
        )?;

        let mut features = FeatureMatrices::initialize(
            user_index.len(),
            &ratings.by_item,
            num_features,
            config.seed(),
        );
        let mut errors = Vec::with_capacity(config.num_iterations);

        let mut state = TrainingState::Init;
        loop {
            state = match state {
                TrainingState::Init => {
                    self.observer.on_event(&TrainingEvent::Started {
                        num_users: user_index.len(),
                        num_items: item_index.len(),
                        num_features,
                        num_workers: executor.num_workers(),
                        implicit: solver.is_implicit(),
                    });
                    if self.test.is_some() {
                        self.observer.on_event(&TrainingEvent::TestDataResolved {
                            samples: evaluator.num_samples(),
                            skipped_users: evaluator.skipped_users(),
                            skipped_preferences: evaluator.skipped_preferences(),
                        });
                    }
                    TrainingState::UserPhase(0)
                }
                TrainingState::UserPhase(iteration) => {
                    // fix M - compute U
                    let FeatureMatrices { u, m } = &mut features;
                    let row_solver =
                        solver.for_phase(m.view(), config.lambda, config.refinement_passes);
                    let report = executor.run(iteration, Phase::Users, u, |row| {
                        row_solver.solve(&ratings.by_user[row])
                    })?;
                    self.phase_completed(iteration, Phase::Users, &report);
                    TrainingState::ItemPhase(iteration)
                }
                TrainingState::ItemPhase(iteration) => {
                    // fix U - compute M
                    let FeatureMatrices { u, m } = &mut features;
                    let row_solver =
                        solver.for_phase(u.view(), config.lambda, config.refinement_passes);
                    let report = executor.run(iteration, Phase::Items, m, |row| {
                        row_solver.solve(&ratings.by_item[row])
                    })?;
                    self.phase_completed(iteration, Phase::Items, &report);
                    TrainingState::Eval(iteration)
                }
                TrainingState::Eval(iteration) => {
                    let evaluation = evaluator.evaluate(&features.u, &features.m);
                    if evaluation.has_data() {
                        self.observer.on_event(&TrainingEvent::IterationEvaluated {
                            iteration,
                            error: evaluation.error(),
                            samples: evaluation.samples,
                        });
                    } else {
                        self.observer
                            .on_event(&TrainingEvent::NoEvaluationData { iteration });
                    }
                    errors.push(evaluation.error());

                    if iteration + 1 < config.num_iterations {
                        TrainingState::UserPhase(iteration + 1)
                    } else {
                        TrainingState::Done
                    }
                }
                TrainingState::Done => break,
            };
        }

        self.observer.on_event(&TrainingEvent::Finished {
            elapsed: start_time.elapsed(),
        });

        let FeatureMatrices { u, m } = features;
        Factorization::new(user_index, item_index, u, m, errors)
    }

    fn phase_completed(&self, iteration: usize, phase: Phase, report: &PhaseReport) {
        self.observer.on_event(&TrainingEvent::PhaseCompleted {
            iteration,
            phase,
            rows: report.rows,
            elapsed: report.elapsed,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::RecordingObserver;
    use crate::ratings::{InMemoryRatings, Preference};
    use crate::test_utils::{dense_exact_rank_ratings, small_ratings};

    #[test]
    fn test_shapes_follow_config() {
        let ratings = small_ratings();
        let config = AlsConfig::new(3, 0.1, 4).with_workers(2);
        let factorization = Factorizer::new(config, &ratings)
            .unwrap()
            .factorize()
            .unwrap();

        assert_eq!(factorization.all_user_features().dim(), (ratings.num_users(), 3));
        assert_eq!(factorization.all_item_features().dim(), (ratings.num_items(), 3));
        assert_eq!(factorization.errors().len(), 4);
        // no test data: every error is undefined
        assert!(factorization.errors().iter().all(|e| e.is_nan()));
    }

    #[test]
    fn test_index_order_follows_source() {
        let ratings = small_ratings();
        let factorization = Factorizer::new(AlsConfig::new(2, 0.1, 1), &ratings)
            .unwrap()
            .factorize()
            .unwrap();
        assert_eq!(factorization.user_index().ids(), ratings.user_ids());
        assert_eq!(factorization.item_index().ids(), ratings.item_ids());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let ratings = small_ratings();
        assert!(matches!(
            Factorizer::new(AlsConfig::new(2, 0.0, 1), &ratings),
            Err(AlsError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_error_decreases_on_exact_rank_data() {
        let ratings = dense_exact_rank_ratings();
        let config = AlsConfig::new(2, 1e-9, 6).with_workers(3);
        let factorization = Factorizer::new(config, &ratings)
            .unwrap()
            .with_test_data(&ratings)
            .factorize()
            .unwrap();

        let errors = factorization.errors();
        assert_eq!(errors.len(), 6);
        for pair in errors.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-6, "errors increased: {:?}", errors);
        }
        assert!(errors[5] < 1e-4, "final error too large: {:?}", errors);
    }

    #[test]
    fn test_implicit_training_is_finite() {
        let ratings = small_ratings();
        let config = AlsConfig::new(3, 0.1, 3).implicit(40.0).with_workers(2);
        let factorization = Factorizer::new(config, &ratings)
            .unwrap()
            .factorize()
            .unwrap();
        assert!(factorization.all_user_features().iter().all(|v| v.is_finite()));
        assert!(factorization.all_item_features().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_unrated_item_stays_finite() {
        let ratings = small_ratings().with_items(vec![999]);
        for config in [
            AlsConfig::new(2, 0.1, 3),
            AlsConfig::new(2, 0.1, 3).implicit(10.0),
        ] {
            let factorization = Factorizer::new(config, &ratings)
                .unwrap()
                .factorize()
                .unwrap();
            let row = factorization.item_features(999).unwrap();
            assert!(row.iter().all(|v| v.is_finite()));
            assert!(factorization.all_user_features().iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_unknown_counterpart_is_not_found() {
        struct BrokenSource(InMemoryRatings);

        impl RatingSource for BrokenSource {
            fn user_ids(&self) -> &[u64] {
                self.0.user_ids()
            }
            // drops the last item from the enumeration
            fn item_ids(&self) -> &[u64] {
                let ids = self.0.item_ids();
                &ids[..ids.len() - 1]
            }
            fn preferences_from_user(&self, user_id: u64) -> Result<&[(u64, f64)], AlsError> {
                self.0.preferences_from_user(user_id)
            }
            fn preferences_for_item(&self, item_id: u64) -> Result<&[(u64, f64)], AlsError> {
                self.0.preferences_for_item(item_id)
            }
        }

        let source = BrokenSource(InMemoryRatings::from_preferences(vec![
            Preference::new(1, 10, 1.0),
            Preference::new(1, 11, 2.0),
        ]));
        let result = Factorizer::new(AlsConfig::new(2, 0.1, 1), &source)
            .unwrap()
            .factorize();
        assert!(matches!(
            result,
            Err(AlsError::NotFound {
                kind: EntityKind::Item,
                id: 11
            })
        ));
    }

    #[test]
    fn test_observer_sees_state_sequence() {
        let ratings = small_ratings();
        let observer = Arc::new(RecordingObserver::new());
        Factorizer::new(AlsConfig::new(2, 0.1, 2).with_workers(1), &ratings)
            .unwrap()
            .with_test_data(&ratings)
            .with_observer(observer.clone())
            .factorize()
            .unwrap();

        let phases: Vec<(usize, Phase)> = observer
            .events()
            .iter()
            .filter_map(|event| match event {
                TrainingEvent::PhaseCompleted {
                    iteration, phase, ..
                } => Some((*iteration, *phase)),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                (0, Phase::Users),
                (0, Phase::Items),
                (1, Phase::Users),
                (1, Phase::Items)
            ]
        );

        let events = observer.events();
        assert!(matches!(events.first(), Some(TrainingEvent::Started { .. })));
        assert!(matches!(events.last(), Some(TrainingEvent::Finished { .. })));
        let evaluated = events
            .iter()
            .filter(|event| matches!(event, TrainingEvent::IterationEvaluated { .. }))
            .count();
        assert_eq!(evaluated, 2);
    }

    #[test]
    fn test_cancelled_before_start() {
        let ratings = small_ratings();
        let factorizer = Factorizer::new(AlsConfig::new(2, 0.1, 3), &ratings).unwrap();
        factorizer.cancel_handle().cancel();
        assert!(matches!(
            factorizer.factorize(),
            Err(AlsError::Cancelled {
                iteration: 0,
                phase: Phase::Users
            })
        ));
    }

    #[test]
    fn test_cancellation_is_sticky() {
        let ratings = small_ratings();
        let factorizer = Factorizer::new(AlsConfig::new(2, 0.1, 1), &ratings).unwrap();
        assert!(factorizer.factorize().is_ok());

        factorizer.cancel_handle().cancel();
        for _ in 0..2 {
            assert!(matches!(
                factorizer.factorize(),
                Err(AlsError::Cancelled { .. })
            ));
        }
    }
}

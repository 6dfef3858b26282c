//! Training configuration and command line arguments.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AlsError;
use crate::solver::Solver;

/// Confidence weight used when no alpha is given for implicit feedback
pub const DEFAULT_ALPHA: f64 = 40.0;

/// Seed used for feature initialization when none is configured
pub const DEFAULT_SEED: u64 = 42;

/// Configuration consumed by the factorizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlsConfig {
    /// Number of latent features k
    pub num_features: usize,
    /// Regularization strength, must be positive
    pub lambda: f64,
    /// Fixed iteration budget, no early exit
    pub num_iterations: usize,
    pub uses_implicit_feedback: bool,
    /// Confidence weighting, only read in implicit mode
    pub alpha: f64,
    pub num_workers: usize,
    pub seed: Option<u64>,
    /// Iterative refinement passes applied after each row solve
    pub refinement_passes: usize,
    /// Hard deadline for a single phase
    pub phase_timeout: Option<Duration>,
}

impl Default for AlsConfig {
    fn default() -> Self {
        Self {
            num_features: 10,
            lambda: 0.1,
            num_iterations: 10,
            uses_implicit_feedback: false,
            alpha: DEFAULT_ALPHA,
            num_workers: num_cpus::get(),
            seed: None,
            refinement_passes: 0,
            phase_timeout: None,
        }
    }
}

impl AlsConfig {
    pub fn new(num_features: usize, lambda: f64, num_iterations: usize) -> Self {
        Self {
            num_features,
            lambda,
            num_iterations,
            ..Default::default()
        }
    }

    /// Switch to confidence-weighted implicit feedback
    pub fn implicit(mut self, alpha: f64) -> Self {
        self.uses_implicit_feedback = true;
        self.alpha = alpha;
        self
    }

    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_phase_timeout(mut self, timeout: Duration) -> Self {
        self.phase_timeout = Some(timeout);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    pub fn validate(&self) -> Result<(), AlsError> {
        if self.num_features == 0 {
            return Err(AlsError::InvalidConfiguration(
                "num_features must be positive".to_string(),
            ));
        }
        // lambda > 0 keeps every Gram matrix positive-definite
        if !(self.lambda.is_finite() && self.lambda > 0.0) {
            return Err(AlsError::InvalidConfiguration(format!(
                "lambda must be a positive number, got {}",
                self.lambda
            )));
        }
        if self.num_iterations == 0 {
            return Err(AlsError::InvalidConfiguration(
                "num_iterations must be positive".to_string(),
            ));
        }
        if self.num_workers == 0 {
            return Err(AlsError::InvalidConfiguration(
                "num_workers must be positive".to_string(),
            ));
        }
        if self.uses_implicit_feedback && !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return Err(AlsError::InvalidConfiguration(format!(
                "alpha must be a non-negative number, got {}",
                self.alpha
            )));
        }
        Ok(())
    }

    /// The row solver selected for this run
    pub fn solver(&self) -> Solver {
        if self.uses_implicit_feedback {
            Solver::Implicit { alpha: self.alpha }
        } else {
            Solver::Explicit
        }
    }
}

/// Arguments of the `fast_als` binary
#[derive(Debug, Clone)]
pub struct TrainingArgs {
    pub ratings_path: PathBuf,
    pub config: AlsConfig,
}

impl TrainingArgs {
    /// constructor
    ///
    /// # Examples
    /// ```bash
    /// $ cargo run -- data/ratings.tsv 10 0.065 15
    /// $ cargo run -- data/clicks.tsv 20 0.1 10 40
    /// ```
    pub fn new(mut args: impl Iterator<Item = String>) -> Result<TrainingArgs, AlsError> {
        // args:
        // 0: program name
        // 1: ratings path
        // 2: num_features
        // 3: lambda
        // 4: num_iterations
        // 5: alpha (optional, enables implicit feedback)
        args.next();
        let ratings_path = PathBuf::from(next_arg(&mut args, "ratings path")?);
        let num_features = parse_arg(&mut args, "num_features")?;
        let lambda = parse_arg(&mut args, "lambda")?;
        let num_iterations = parse_arg(&mut args, "num_iterations")?;

        let mut config = AlsConfig::new(num_features, lambda, num_iterations);
        if let Some(alpha) = args.next() {
            let alpha = alpha
                .parse::<f64>()
                .map_err(|e| AlsError::Input(format!("alpha: {}", e)))?;
            config = config.implicit(alpha);
        }
        config.validate()?;

        Ok(TrainingArgs {
            ratings_path,
            config,
        })
    }
}

fn next_arg(args: &mut impl Iterator<Item = String>, name: &str) -> Result<String, AlsError> {
    args.next()
        .ok_or_else(|| AlsError::Input(format!("missing argument: {}", name)))
}

fn parse_arg<T>(args: &mut impl Iterator<Item = String>, name: &str) -> Result<T, AlsError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    next_arg(args, name)?
        .parse::<T>()
        .map_err(|e| AlsError::Input(format!("{}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_default_config() {
        let config = AlsConfig::default();
        assert_eq!(config.num_features, 10);
        assert_eq!(config.alpha, 40.0);
        assert!(!config.uses_implicit_feedback);
        assert!(config.num_workers >= 1);
        assert_eq!(config.seed(), DEFAULT_SEED);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(AlsConfig::new(0, 0.1, 5).validate().is_err());
        assert!(AlsConfig::new(3, 0.0, 5).validate().is_err());
        assert!(AlsConfig::new(3, f64::NAN, 5).validate().is_err());
        assert!(AlsConfig::new(3, 0.1, 0).validate().is_err());
        assert!(AlsConfig::new(3, 0.1, 5).with_workers(0).validate().is_err());
        assert!(AlsConfig::new(3, 0.1, 5).implicit(-1.0).validate().is_err());
    }

    #[test]
    fn test_solver_selection() {
        assert_eq!(AlsConfig::new(3, 0.1, 5).solver(), Solver::Explicit);
        assert_eq!(
            AlsConfig::new(3, 0.1, 5).implicit(15.0).solver(),
            Solver::Implicit { alpha: 15.0 }
        );
    }

    #[test]
    fn test_training_args_explicit() {
        let parsed = TrainingArgs::new(args(&["fast_als", "ratings.tsv", "4", "0.065", "15"]))
            .unwrap();
        assert_eq!(parsed.ratings_path, PathBuf::from("ratings.tsv"));
        assert_eq!(parsed.config.num_features, 4);
        assert_eq!(parsed.config.lambda, 0.065);
        assert_eq!(parsed.config.num_iterations, 15);
        assert!(!parsed.config.uses_implicit_feedback);
    }

    #[test]
    fn test_training_args_implicit() {
        let parsed =
            TrainingArgs::new(args(&["fast_als", "clicks.tsv", "8", "0.1", "3", "20"])).unwrap();
        assert!(parsed.config.uses_implicit_feedback);
        assert_eq!(parsed.config.alpha, 20.0);
    }

    #[test]
    fn test_training_args_missing_or_malformed() {
        assert!(TrainingArgs::new(args(&["fast_als", "ratings.tsv", "4"])).is_err());
        assert!(TrainingArgs::new(args(&["fast_als", "ratings.tsv", "four", "0.1", "3"])).is_err());
        assert!(TrainingArgs::new(args(&["fast_als", "ratings.tsv", "4", "0", "3"])).is_err());
    }
}

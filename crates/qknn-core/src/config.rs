//! Run configuration.
//!
//! Loaded from a YAML file and/or `QKNN_*` environment variables.
//! Precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values
//!
//! ```yaml
//! target_dim: 32
//! k: 3
//! kernel: closed_form
//! parallel: false
//! split:
//!   test_size: 0.2
//!   seed: 42
//!   standardize: true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::kernel::KernelMode;

/// Classifier and pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QknnConfig {
    /// Encoded dimension `N`; must be at least the raw feature count.
    #[serde(default = "default_target_dim")]
    pub target_dim: usize,

    /// Number of neighbours that vote.
    #[serde(default = "default_k")]
    pub k: usize,

    /// Kernel implementation.
    #[serde(default)]
    pub kernel: KernelMode,

    /// Evaluate queries on the rayon thread pool.
    #[serde(default)]
    pub parallel: bool,

    /// Data preparation settings.
    #[serde(default)]
    pub split: SplitConfig,
}

/// Standardization and train/test split settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of samples held out for testing.
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    /// Shuffle seed; `None` draws one from entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Standardize features before encoding.
    #[serde(default = "default_true")]
    pub standardize: bool,
}

fn default_target_dim() -> usize {
    32
}

fn default_k() -> usize {
    3
}

fn default_test_size() -> f64 {
    0.2
}

fn default_true() -> bool {
    true
}

impl Default for QknnConfig {
    fn default() -> Self {
        Self {
            target_dim: default_target_dim(),
            k: default_k(),
            kernel: KernelMode::default(),
            parallel: false,
            split: SplitConfig::default(),
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: default_test_size(),
            seed: None,
            standardize: true,
        }
    }
}

impl QknnConfig {
    /// Configuration for `n_qubits` qubits (`target_dim = 2^n_qubits`).
    pub fn with_qubits(n_qubits: u32) -> Self {
        Self {
            target_dim: 1usize << n_qubits,
            ..Self::default()
        }
    }

    /// Number of qubits, if `target_dim` is a power of two.
    pub fn num_qubits(&self) -> Option<u32> {
        self.target_dim
            .is_power_of_two()
            .then(|| self.target_dim.trailing_zeros())
    }

    /// Parse configuration from a YAML file.
    ///
    /// Values are not validated here; higher-precedence layers may still
    /// replace them. Call [`Self::validate`] once every layer is applied.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        serde_yaml_ng::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    ///
    /// The result is not validated.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(config_file, |key| std::env::var(key).ok())
    }

    /// Like [`Self::load`], reading variables through `lookup`.
    pub fn load_with<F>(config_file: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.merge_vars(lookup)
    }

    /// Apply `QKNN_*` environment variables that are set.
    ///
    /// Unlike absent variables, a set variable that fails to parse is an error.
    pub fn merge_env(self) -> Result<Self, ConfigError> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Apply `QKNN_*` variables resolved through `lookup`.
    pub fn merge_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = var_parse(&lookup, "QKNN_TARGET_DIM")? {
            self.target_dim = v;
        }
        if let Some(v) = var_parse(&lookup, "QKNN_K")? {
            self.k = v;
        }
        if let Some(v) = var_parse(&lookup, "QKNN_KERNEL")? {
            self.kernel = v;
        }
        if let Some(v) = var_parse(&lookup, "QKNN_PARALLEL")? {
            self.parallel = v;
        }
        if let Some(v) = var_parse(&lookup, "QKNN_TEST_SIZE")? {
            self.split.test_size = v;
        }
        if let Some(v) = var_parse(&lookup, "QKNN_SEED")? {
            self.split.seed = Some(v);
        }
        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_dim == 0 {
            return Err(ConfigError::ValidationError(
                "target_dim must be at least 1".to_string(),
            ));
        }
        if self.k == 0 {
            return Err(ConfigError::ValidationError(
                "k must be at least 1".to_string(),
            ));
        }
        if self.kernel == KernelMode::Circuit && !self.target_dim.is_power_of_two() {
            return Err(ConfigError::ValidationError(format!(
                "circuit kernel needs a power-of-two target_dim, got {}",
                self.target_dim
            )));
        }
        let t = self.split.test_size;
        if !(t > 0.0 && t < 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "test_size must be in (0, 1), got {t}"
            )));
        }
        Ok(())
    }
}

fn var_parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::ValidationError(format!("{key}={raw}: {e}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QknnConfig::default();
        assert_eq!(config.target_dim, 32);
        assert_eq!(config.k, 3);
        assert_eq!(config.kernel, KernelMode::ClosedForm);
        assert!(!config.parallel);
        assert!((config.split.test_size - 0.2).abs() < f64::EPSILON);
        assert!(config.split.standardize);
        assert_eq!(config.num_qubits(), Some(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_qubits() {
        let config = QknnConfig::with_qubits(3);
        assert_eq!(config.target_dim, 8);
        assert_eq!(config.num_qubits(), Some(3));
    }

    #[test]
    fn test_yaml_partial() {
        let config: QknnConfig = serde_yaml_ng::from_str(
            "k: 5\nkernel: circuit\nsplit:\n  seed: 7\n",
        )
        .unwrap();
        assert_eq!(config.k, 5);
        assert_eq!(config.target_dim, 32);
        assert_eq!(config.kernel, KernelMode::Circuit);
        assert_eq!(config.split.seed, Some(7));
        assert!(config.split.standardize);
    }

    #[test]
    fn test_validation() {
        let mut config = QknnConfig::default();
        config.k = 0;
        assert!(config.validate().is_err());

        let mut config = QknnConfig::default();
        config.kernel = KernelMode::Circuit;
        config.target_dim = 30;
        assert!(config.validate().is_err());

        let mut config = QknnConfig::default();
        config.split.test_size = 1.0;
        assert!(config.validate().is_err());
    }

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn test_vars_override_defaults() {
        let config = QknnConfig::load_with(None, vars(&[("QKNN_K", "7"), ("QKNN_SEED", "42")]))
            .unwrap();
        assert_eq!(config.k, 7);
        assert_eq!(config.split.seed, Some(42));
        assert_eq!(config.target_dim, 32);
    }

    #[test]
    fn test_unparsable_var_is_error() {
        let err = QknnConfig::load_with(None, vars(&[("QKNN_K", "three")])).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_load_defers_validation() {
        // An invalid layer is kept as is so a later layer can replace it.
        let config = QknnConfig::load_with(None, vars(&[("QKNN_K", "0")])).unwrap();
        assert_eq!(config.k, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let err = QknnConfig::from_file("/nonexistent/qknn.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}

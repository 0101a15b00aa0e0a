//! Shared helpers for CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use qknn_core::{Dataset, KernelMode, QknnConfig, StandardScaler, pad_features};

/// Command-line values that take precedence over file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub k: Option<usize>,
    pub target_dim: Option<usize>,
    pub kernel: Option<KernelMode>,
    pub standardize: Option<bool>,
    pub test_size: Option<f64>,
    pub seed: Option<u64>,
    pub parallel: Option<bool>,
}

impl Overrides {
    /// Apply the set values onto `config`.
    pub fn apply(&self, mut config: QknnConfig) -> QknnConfig {
        if let Some(k) = self.k {
            config.k = k;
        }
        if let Some(dim) = self.target_dim {
            config.target_dim = dim;
        }
        if let Some(kernel) = self.kernel {
            config.kernel = kernel;
        }
        if let Some(standardize) = self.standardize {
            config.split.standardize = standardize;
        }
        if let Some(test_size) = self.test_size {
            config.split.test_size = test_size;
        }
        if let Some(seed) = self.seed {
            config.split.seed = Some(seed);
        }
        if let Some(parallel) = self.parallel {
            config.parallel = parallel;
        }
        config
    }
}

/// Load configuration: file, then environment, then command-line overrides.
///
/// Validation runs once, after every layer is applied.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<QknnConfig> {
    load_config_with(path, overrides, |key| std::env::var(key).ok())
}

fn load_config_with<F>(
    path: Option<&Path>,
    overrides: &Overrides,
    lookup: F,
) -> Result<QknnConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let config = QknnConfig::load_with(path, lookup).with_context(|| match path {
        Some(p) => format!("Failed to load configuration from {}", p.display()),
        None => "Failed to load configuration from environment".to_string(),
    })?;
    let config = overrides.apply(config);
    config.validate()?;
    Ok(config)
}

/// Load a dataset from a JSON file.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    let dataset = Dataset::from_json_file(path)
        .with_context(|| format!("Failed to load dataset: {}", path.display()))?;
    if dataset.is_empty() {
        anyhow::bail!("Dataset {} contains no samples", path.display());
    }
    Ok(dataset)
}

/// Standardize (if enabled) and zero-pad the dataset features.
///
/// Returns the fitted scaler so new queries can be transformed the same way.
pub fn prepare_features(
    dataset: &Dataset,
    config: &QknnConfig,
) -> Result<(Option<StandardScaler>, Vec<Vec<f64>>)> {
    if dataset.num_features() > config.target_dim {
        anyhow::bail!(
            "Dataset has {} features but the encoded dimension is only {} (use --qubits or --target-dim)",
            dataset.num_features(),
            config.target_dim
        );
    }

    let (scaler, rows) = if config.split.standardize {
        let (scaler, rows) = StandardScaler::fit_transform(&dataset.features)?;
        (Some(scaler), rows)
    } else {
        (None, dataset.features.clone())
    };

    Ok((scaler, pad_features(&rows, config.target_dim)?))
}

/// Parse a comma-separated list of floats.
pub fn parse_query(raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, s)| {
            s.parse::<f64>()
                .with_context(|| format!("Invalid value '{s}' at query position {i}"))
        })
        .collect()
}

/// Human-readable encoding size, e.g. "5 qubits" or "dimension 30".
pub fn describe_encoding(config: &QknnConfig) -> String {
    match config.num_qubits() {
        Some(1) => "1 qubit".to_string(),
        Some(n) => format!("{n} qubits"),
        None => format!("dimension {}", config.target_dim),
    }
}

/// Print a result line.
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        assert_eq!(parse_query("1, -2.5,3e1").unwrap(), vec![1.0, -2.5, 30.0]);
        assert_eq!(parse_query("1,2,").unwrap(), vec![1.0, 2.0]);
        assert!(parse_query("1,abc").is_err());
    }

    #[test]
    fn test_overrides_apply() {
        let overrides = Overrides {
            k: Some(7),
            kernel: Some(KernelMode::Circuit),
            standardize: Some(false),
            ..Overrides::default()
        };
        let config = overrides.apply(QknnConfig::default());
        assert_eq!(config.k, 7);
        assert_eq!(config.kernel, KernelMode::Circuit);
        assert!(!config.split.standardize);
        assert_eq!(config.target_dim, 32);
    }

    #[test]
    fn test_flag_overrides_invalid_environment() {
        let lookup = |key: &str| (key == "QKNN_K").then(|| "0".to_string());

        let overrides = Overrides {
            k: Some(3),
            ..Overrides::default()
        };
        let config = load_config_with(None, &overrides, lookup).unwrap();
        assert_eq!(config.k, 3);

        let err = load_config_with(None, &Overrides::default(), lookup).unwrap_err();
        assert!(format!("{err:#}").contains("k must be at least 1"));
    }

    #[test]
    fn test_flag_overrides_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qknn.yaml");
        std::fs::write(&path, "target_dim: 30\nkernel: circuit\n").unwrap();

        let overrides = Overrides {
            target_dim: Some(32),
            ..Overrides::default()
        };
        let config = load_config_with(Some(&path), &overrides, |_| None).unwrap();
        assert_eq!(config.target_dim, 32);
        assert_eq!(config.kernel, KernelMode::Circuit);
        assert!(load_config_with(Some(&path), &Overrides::default(), |_| None).is_err());
    }

    #[test]
    fn test_describe_encoding() {
        assert_eq!(describe_encoding(&QknnConfig::with_qubits(5)), "5 qubits");
        let config = QknnConfig {
            target_dim: 30,
            ..QknnConfig::default()
        };
        assert_eq!(describe_encoding(&config), "dimension 30");
    }

    #[test]
    fn test_prepare_features_rejects_small_dimension() {
        let dataset = Dataset::new(vec![vec![1.0, 2.0, 3.0]], vec![0]).unwrap();
        let config = QknnConfig {
            target_dim: 2,
            ..QknnConfig::default()
        };
        assert!(prepare_features(&dataset, &config).is_err());
    }

    #[test]
    fn test_prepare_features_pads() {
        let dataset = Dataset::new(vec![vec![1.0, 2.0], vec![3.0, 6.0]], vec![0, 1]).unwrap();
        let config = QknnConfig::with_qubits(2);
        let (scaler, rows) = prepare_features(&dataset, &config).unwrap();
        assert!(scaler.is_some());
        assert_eq!(rows[0], vec![-1.0, -1.0, 0.0, 0.0]);
        assert_eq!(rows[1], vec![1.0, 1.0, 0.0, 0.0]);
    }
}

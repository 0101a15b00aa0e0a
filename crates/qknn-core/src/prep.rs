//! Data preparation: loading, standardization, padding and splitting.

use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Component, QknnError, QknnResult};
use crate::knn::{Label, TrainingSet};

/// A labelled feature matrix.
///
/// JSON layout:
///
/// ```json
/// {
///   "features": [[1.0, 2.0], [0.5, -1.0]],
///   "labels": [0, 1],
///   "feature_names": ["radius", "texture"],
///   "label_names": ["malignant", "benign"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// One row per sample.
    pub features: Vec<Vec<f64>>,
    /// One label per sample.
    pub labels: Vec<Label>,
    /// Optional column names.
    #[serde(default)]
    pub feature_names: Vec<String>,
    /// Optional display names, indexed by label.
    #[serde(default)]
    pub label_names: Vec<String>,
}

impl Dataset {
    /// Create a dataset, checking that rows and labels line up.
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<Label>) -> QknnResult<Self> {
        let dataset = Self {
            features,
            labels,
            feature_names: Vec::new(),
            label_names: Vec::new(),
        };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Load a dataset from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> QknnResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Parse a dataset from a JSON string.
    pub fn from_json_str(s: &str) -> QknnResult<Self> {
        let dataset: Dataset = serde_json::from_str(s)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of feature columns (0 for an empty dataset).
    pub fn num_features(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }

    /// Display name of `label`, falling back to the number.
    pub fn label_name(&self, label: Label) -> String {
        self.label_names
            .get(label)
            .cloned()
            .unwrap_or_else(|| label.to_string())
    }

    /// The whole dataset as a training set.
    pub fn to_training_set(&self) -> QknnResult<TrainingSet> {
        TrainingSet::from_parts(self.features.clone(), self.labels.clone())
    }

    fn validate(&self) -> QknnResult<()> {
        if self.features.len() != self.labels.len() {
            return Err(QknnError::invalid(
                Component::Prep,
                format!(
                    "{} feature rows but {} labels",
                    self.features.len(),
                    self.labels.len()
                ),
            ));
        }
        check_rectangular(&self.features)?;
        if !self.feature_names.is_empty() && self.feature_names.len() != self.num_features() {
            return Err(QknnError::invalid(
                Component::Prep,
                format!(
                    "{} feature names for {} columns",
                    self.feature_names.len(),
                    self.num_features()
                ),
            ));
        }
        Ok(())
    }
}

/// Per-column standardization to zero mean and unit variance.
///
/// Uses the population standard deviation. Constant columns are only
/// centred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Compute column means and standard deviations.
    ///
    /// # Errors
    ///
    /// [`QknnError::InvalidArgument`] for an empty or ragged matrix.
    pub fn fit(rows: &[Vec<f64>]) -> QknnResult<Self> {
        if rows.is_empty() {
            return Err(QknnError::invalid(
                Component::Prep,
                "cannot fit scaler on empty data",
            ));
        }
        check_rectangular(rows)?;

        let n = rows.len() as f64;
        let cols = rows[0].len();
        let mut means = vec![0.0; cols];
        for row in rows {
            for (m, x) in means.iter_mut().zip(row) {
                *m += x;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut scales = vec![0.0; cols];
        for row in rows {
            for ((s, x), m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (x - m) * (x - m);
            }
        }
        for s in &mut scales {
            let std = (*s / n).sqrt();
            *s = if std == 0.0 { 1.0 } else { std };
        }

        debug!("Fitted scaler on {} rows x {} columns", rows.len(), cols);
        Ok(Self { means, scales })
    }

    /// Fit on `rows` and return the transformed copy.
    pub fn fit_transform(rows: &[Vec<f64>]) -> QknnResult<(Self, Vec<Vec<f64>>)> {
        let scaler = Self::fit(rows)?;
        let out = scaler.transform(rows)?;
        Ok((scaler, out))
    }

    /// Standardize a batch of rows.
    pub fn transform(&self, rows: &[Vec<f64>]) -> QknnResult<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    /// Standardize one row.
    pub fn transform_row(&self, row: &[f64]) -> QknnResult<Vec<f64>> {
        if row.len() != self.means.len() {
            return Err(QknnError::invalid(
                Component::Prep,
                format!(
                    "row has {} columns, scaler was fitted on {}",
                    row.len(),
                    self.means.len()
                ),
            ));
        }
        Ok(row
            .iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((x, m), s)| (x - m) / s)
            .collect())
    }

    /// Column means.
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Column scales (standard deviations, 1 for constant columns).
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }
}

/// Right-pad every row with zeros to `target_dim` columns.
///
/// # Errors
///
/// [`QknnError::InvalidArgument`] if a row is already longer.
pub fn pad_features(rows: &[Vec<f64>], target_dim: usize) -> QknnResult<Vec<Vec<f64>>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            if row.len() > target_dim {
                return Err(QknnError::invalid(
                    Component::Prep,
                    format!(
                        "row {i} has {} features, more than target dimension {target_dim}",
                        row.len()
                    ),
                ));
            }
            let mut padded = row.clone();
            padded.resize(target_dim, 0.0);
            Ok(padded)
        })
        .collect()
}

/// A shuffled train/test partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Training rows.
    pub train_features: Vec<Vec<f64>>,
    /// Training labels.
    pub train_labels: Vec<Label>,
    /// Test rows.
    pub test_features: Vec<Vec<f64>>,
    /// Test labels.
    pub test_labels: Vec<Label>,
}

impl Split {
    /// The training partition as a [`TrainingSet`].
    pub fn training_set(&self) -> QknnResult<TrainingSet> {
        TrainingSet::from_parts(self.train_features.clone(), self.train_labels.clone())
    }
}

/// Shuffle and split into train and test partitions.
///
/// The test partition holds `ceil(test_size * n)` samples. A fixed `seed`
/// gives a reproducible split; `None` seeds from entropy.
///
/// # Errors
///
/// [`QknnError::InvalidArgument`] if lengths differ, `test_size` is outside
/// `(0, 1)`, or either partition would be empty.
pub fn train_test_split(
    features: &[Vec<f64>],
    labels: &[Label],
    test_size: f64,
    seed: Option<u64>,
) -> QknnResult<Split> {
    if features.len() != labels.len() {
        return Err(QknnError::invalid(
            Component::Prep,
            format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            ),
        ));
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(QknnError::invalid(
            Component::Prep,
            format!("test_size must be in (0, 1), got {test_size}"),
        ));
    }

    let n = features.len();
    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(QknnError::invalid(
            Component::Prep,
            format!("cannot split {n} samples with test_size {test_size}"),
        ));
    }

    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut rng);

    let (test_idx, train_idx) = order.split_at(n_test);
    let pick_rows = |idx: &[usize]| -> Vec<Vec<f64>> {
        idx.iter().map(|&i| features[i].clone()).collect()
    };
    let pick_labels = |idx: &[usize]| -> Vec<Label> { idx.iter().map(|&i| labels[i]).collect() };

    debug!(
        "Split {} samples into {} train / {} test",
        n,
        train_idx.len(),
        test_idx.len()
    );

    Ok(Split {
        train_features: pick_rows(train_idx),
        train_labels: pick_labels(train_idx),
        test_features: pick_rows(test_idx),
        test_labels: pick_labels(test_idx),
    })
}

fn check_rectangular(rows: &[Vec<f64>]) -> QknnResult<()> {
    let Some(width) = rows.first().map(Vec::len) else {
        return Ok(());
    };
    if let Some(i) = rows.iter().position(|r| r.len() != width) {
        return Err(QknnError::invalid(
            Component::Prep,
            format!(
                "row {i} has {} columns, expected {width}",
                rows[i].len()
            ),
        ));
    }
    Ok(())
}

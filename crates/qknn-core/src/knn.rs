//! Kernel k-nearest-neighbour classification.
//!
//! Distances are `1 - k(query, x)` for the configured [`QuantumKernel`].
//! Neighbours are ranked by a stable sort on distance, so exact ties keep
//! training-set order. The vote picks the most frequent label among the
//! first `k`; equal counts resolve to the smallest label.
//!
//! ```rust
//! use qknn_core::knn::{classify, LabeledSample, TrainingSet};
//!
//! let training: TrainingSet = vec![
//!     LabeledSample::new(vec![1.0, 0.0], 0),
//!     LabeledSample::new(vec![0.0, 1.0], 1),
//! ]
//! .into_iter()
//! .collect();
//!
//! let label = classify(&[0.9, 0.1], &training, 1, 2).unwrap();
//! assert_eq!(label, 0);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::QknnConfig;
use crate::encoding::{AmplitudeEncoder, EncodedState};
use crate::error::{Component, QknnError, QknnResult, SampleRef};
use crate::kernel::{KernelMode, OverlapKernel, QuantumKernel};

/// A class label. Labels are small non-negative integers.
pub type Label = usize;

/// A feature vector paired with its class label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    /// Raw (already standardized) features.
    pub features: Vec<f64>,
    /// Class label.
    pub label: Label,
}

impl LabeledSample {
    /// Create a new sample.
    pub fn new(features: Vec<f64>, label: Label) -> Self {
        Self { features, label }
    }
}

/// An ordered, read-only collection of labelled samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSet {
    samples: Vec<LabeledSample>,
}

impl TrainingSet {
    /// Create from a list of samples.
    pub fn new(samples: Vec<LabeledSample>) -> Self {
        Self { samples }
    }

    /// Zip parallel feature and label vectors.
    ///
    /// # Errors
    ///
    /// [`QknnError::InvalidArgument`] if the lengths differ.
    pub fn from_parts(features: Vec<Vec<f64>>, labels: Vec<Label>) -> QknnResult<Self> {
        if features.len() != labels.len() {
            return Err(QknnError::invalid(
                Component::Classifier,
                format!(
                    "{} feature rows but {} labels",
                    features.len(),
                    labels.len()
                ),
            ));
        }
        Ok(features
            .into_iter()
            .zip(labels)
            .map(|(f, l)| LabeledSample::new(f, l))
            .collect())
    }

    /// All samples, in order.
    pub fn samples(&self) -> &[LabeledSample] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterate over the samples.
    pub fn iter(&self) -> std::slice::Iter<'_, LabeledSample> {
        self.samples.iter()
    }
}

impl FromIterator<LabeledSample> for TrainingSet {
    fn from_iter<T: IntoIterator<Item = LabeledSample>>(iter: T) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

/// A training set with every sample already encoded.
///
/// Build once per run with [`KernelKnn::prepare`] and reuse across queries.
#[derive(Debug, Clone)]
pub struct EncodedTrainingSet {
    states: Vec<EncodedState>,
    labels: Vec<Label>,
    target_dim: usize,
}

impl EncodedTrainingSet {
    /// Encode every sample of `training`.
    ///
    /// # Errors
    ///
    /// Propagates the first encoding failure, tagged with the training index.
    pub fn encode(training: &TrainingSet, encoder: &AmplitudeEncoder) -> QknnResult<Self> {
        let states = training
            .iter()
            .enumerate()
            .map(|(i, s)| {
                encoder
                    .encode(&s.features)
                    .map_err(|e| e.with_sample(SampleRef::Training(i)))
            })
            .collect::<QknnResult<Vec<_>>>()?;
        let labels = training.iter().map(|s| s.label).collect();
        Ok(Self {
            states,
            labels,
            target_dim: encoder.target_dim(),
        })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Encoded dimension shared by every state.
    pub fn target_dim(&self) -> usize {
        self.target_dim
    }

    /// The encoded states, in training order.
    pub fn states(&self) -> &[EncodedState] {
        &self.states
    }

    /// The labels, in training order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }
}

/// One ranked neighbour of a query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    /// Index into the training set.
    pub index: usize,
    /// `1 - kernel` between query and training sample.
    pub distance: f64,
    /// Label of the training sample.
    pub label: Label,
}

/// Kernel k-NN classifier: an encoder plus a kernel.
#[derive(Debug, Clone)]
pub struct KernelKnn<K = KernelMode> {
    encoder: AmplitudeEncoder,
    kernel: K,
}

impl KernelKnn<KernelMode> {
    /// Build the encoder and kernel described by `config`.
    pub fn from_config(config: &QknnConfig) -> Self {
        Self::new(AmplitudeEncoder::new(config.target_dim), config.kernel)
    }
}

impl<K: QuantumKernel> KernelKnn<K> {
    /// Create a classifier.
    pub fn new(encoder: AmplitudeEncoder, kernel: K) -> Self {
        Self { encoder, kernel }
    }

    /// The encoder.
    pub fn encoder(&self) -> &AmplitudeEncoder {
        &self.encoder
    }

    /// The kernel.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Encode a training set for repeated queries.
    pub fn prepare(&self, training: &TrainingSet) -> QknnResult<EncodedTrainingSet> {
        EncodedTrainingSet::encode(training, &self.encoder)
    }

    /// Classify `query` against a raw training set.
    ///
    /// Every training sample is encoded on the way; use [`Self::prepare`] and
    /// [`Self::classify_encoded`] to amortise that across queries.
    ///
    /// # Errors
    ///
    /// - [`QknnError::InvalidArgument`] for an empty training set or `k`
    ///   outside `1..=training.len()`.
    /// - [`QknnError::DegenerateVector`] if the query or any training sample
    ///   is all zeros.
    ///
    /// Query errors are tagged as query sample 0.
    pub fn classify(&self, query: &[f64], training: &TrainingSet, k: usize) -> QknnResult<Label> {
        check_k(k, training.len())?;
        let encoded_query = self
            .encoder
            .encode(query)
            .map_err(|e| e.with_sample(SampleRef::Query(0)))?;
        let encoded_training = self.prepare(training)?;
        self.classify_encoded(&encoded_query, &encoded_training, k)
    }

    /// Classify an encoded query against a pre-encoded training set.
    pub fn classify_encoded(
        &self,
        query: &EncodedState,
        training: &EncodedTrainingSet,
        k: usize,
    ) -> QknnResult<Label> {
        let neighbors = self.neighbors(query, training, k)?;
        let label = majority_vote(neighbors.iter().map(|n| n.label)).ok_or_else(|| {
            QknnError::invalid(Component::Classifier, "empty neighbour set")
        })?;
        debug!(
            kernel = self.kernel.name(),
            k,
            label,
            nearest = neighbors.first().map(|n| n.index),
            "classified query"
        );
        Ok(label)
    }

    /// The `k` nearest training samples, closest first.
    pub fn neighbors(
        &self,
        query: &EncodedState,
        training: &EncodedTrainingSet,
        k: usize,
    ) -> QknnResult<Vec<Neighbor>> {
        check_k(k, training.len())?;
        let distances = self.distances(query, training)?;

        let mut ranked: Vec<Neighbor> = distances
            .into_iter()
            .zip(training.labels())
            .enumerate()
            .map(|(index, (distance, &label))| Neighbor {
                index,
                distance,
                label,
            })
            .collect();
        // `sort_by` is stable: equal distances keep training order.
        ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        ranked.truncate(k);

        for n in &ranked {
            trace!(index = n.index, distance = n.distance, label = n.label, "neighbour");
        }
        Ok(ranked)
    }

    /// Distance from `query` to every training sample, in training order.
    pub fn distances(
        &self,
        query: &EncodedState,
        training: &EncodedTrainingSet,
    ) -> QknnResult<Vec<f64>> {
        if query.dim() != training.target_dim() {
            return Err(QknnError::invalid(
                Component::Classifier,
                format!(
                    "query encoded to dimension {} but training set to {}",
                    query.dim(),
                    training.target_dim()
                ),
            ));
        }
        training
            .states()
            .iter()
            .enumerate()
            .map(|(i, state)| {
                self.kernel
                    .distance(query, state)
                    .map_err(|e| e.with_sample(SampleRef::Training(i)))
            })
            .collect()
    }
}

/// Classify `query` with the closed-form kernel and `target_dim` slots.
pub fn classify(
    query: &[f64],
    training: &TrainingSet,
    k: usize,
    target_dim: usize,
) -> QknnResult<Label> {
    KernelKnn::new(AmplitudeEncoder::new(target_dim), OverlapKernel).classify(query, training, k)
}

/// Most frequent label; ties go to the smallest label.
///
/// Returns `None` for an empty input.
pub fn majority_vote(labels: impl IntoIterator<Item = Label>) -> Option<Label> {
    let mut counts: BTreeMap<Label, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    // Ascending label order; only a strictly larger count replaces the best.
    let mut best: Option<(Label, usize)> = None;
    for (label, count) in counts {
        match best {
            Some((_, c)) if count <= c => {}
            _ => best = Some((label, count)),
        }
    }
    best.map(|(label, _)| label)
}

fn check_k(k: usize, n: usize) -> QknnResult<()> {
    if n == 0 {
        return Err(QknnError::invalid(
            Component::Classifier,
            "training set is empty",
        ));
    }
    if k == 0 || k > n {
        return Err(QknnError::invalid(
            Component::Classifier,
            format!("k must be in 1..={n}, got {k}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_point_set() -> TrainingSet {
        vec![
            LabeledSample::new(vec![1.0, 0.0], 0),
            LabeledSample::new(vec![0.0, 1.0], 1),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_majority_vote_lowest_label_on_tie() {
        assert_eq!(majority_vote([3, 1, 3, 1]), Some(1));
        assert_eq!(majority_vote([2, 2, 0]), Some(2));
        assert_eq!(majority_vote([5]), Some(5));
        assert_eq!(majority_vote(Vec::new()), None);
    }

    #[test]
    fn test_k_out_of_range() {
        let training = two_point_set();
        let err = classify(&[1.0, 0.0], &training, 3, 2).unwrap_err();
        assert_eq!(err.component(), Some(Component::Classifier));
        assert!(classify(&[1.0, 0.0], &training, 0, 2).is_err());
    }

    #[test]
    fn test_empty_training_set() {
        let err = classify(&[1.0], &TrainingSet::default(), 1, 2).unwrap_err();
        assert!(matches!(err, QknnError::InvalidArgument { .. }));
    }

    #[test]
    fn test_degenerate_training_sample_is_reported() {
        let training: TrainingSet = vec![
            LabeledSample::new(vec![1.0, 0.0], 0),
            LabeledSample::new(vec![0.0, 0.0], 1),
        ]
        .into_iter()
        .collect();
        let err = classify(&[1.0, 0.0], &training, 1, 2).unwrap_err();
        assert!(err.is_degenerate());
        assert_eq!(err.sample(), Some(SampleRef::Training(1)));
    }

    #[test]
    fn test_from_parts_length_mismatch() {
        assert!(TrainingSet::from_parts(vec![vec![1.0]], vec![0, 1]).is_err());
    }

    #[test]
    fn test_encoded_dimension_mismatch() {
        let knn = KernelKnn::new(AmplitudeEncoder::new(4), OverlapKernel);
        let prepared = knn.prepare(&two_point_set()).unwrap();
        let query = AmplitudeEncoder::new(2).encode(&[1.0, 0.0]).unwrap();
        assert!(knn.classify_encoded(&query, &prepared, 1).is_err());
    }
}

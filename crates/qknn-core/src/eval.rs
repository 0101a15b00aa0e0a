//! Batch evaluation of the kernel k-NN classifier.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::QknnConfig;
use crate::encoding::AmplitudeEncoder;
use crate::error::{Component, QknnError, QknnResult, SampleRef};
use crate::kernel::{KernelMode, OverlapKernel, QuantumKernel};
use crate::knn::{EncodedTrainingSet, KernelKnn, Label, TrainingSet};

/// Predictions and accuracy for a test batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Fraction of predictions equal to the true label, in `[0, 1]`.
    pub accuracy: f64,
    /// One prediction per test sample, in input order.
    pub predictions: Vec<Label>,
    /// True labels, in input order.
    pub truth: Vec<Label>,
    /// Number of correct predictions.
    pub correct: usize,
}

impl Evaluation {
    /// Number of evaluated samples.
    pub fn total(&self) -> usize {
        self.predictions.len()
    }

    /// `(predicted, true)` for the first test sample.
    pub fn first_example(&self) -> Option<(Label, Label)> {
        self.example(0)
    }

    /// `(predicted, true)` for test sample `index`.
    pub fn example(&self, index: usize) -> Option<(Label, Label)> {
        Some((*self.predictions.get(index)?, *self.truth.get(index)?))
    }
}

/// Runs the classifier over a test batch.
#[derive(Debug, Clone)]
pub struct Evaluator<K = KernelMode> {
    knn: KernelKnn<K>,
    k: usize,
    parallel: bool,
}

impl Evaluator<KernelMode> {
    /// Build an evaluator from `config` (dimension, kernel, `k`, parallelism).
    pub fn from_config(config: &QknnConfig) -> Self {
        Self::new(KernelKnn::from_config(config), config.k).with_parallel(config.parallel)
    }
}

impl<K: QuantumKernel> Evaluator<K> {
    /// Create a sequential evaluator.
    pub fn new(knn: KernelKnn<K>, k: usize) -> Self {
        Self {
            knn,
            k,
            parallel: false,
        }
    }

    /// Evaluate queries on the rayon thread pool.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The underlying classifier.
    pub fn classifier(&self) -> &KernelKnn<K> {
        &self.knn
    }

    /// Classify every test sample exactly once, in order, and score.
    ///
    /// Any error aborts the whole run. With several failing samples the one
    /// with the lowest index is reported, also in parallel mode.
    ///
    /// # Errors
    ///
    /// - [`QknnError::InvalidArgument`] if `test_set` and `test_labels`
    ///   differ in length, the test set is empty, or `k` is out of range.
    /// - Any encoding error, tagged with the offending sample.
    #[instrument(skip_all, fields(n_test = test_set.len(), n_train = training.len(), k = self.k))]
    pub fn evaluate(
        &self,
        test_set: &[Vec<f64>],
        test_labels: &[Label],
        training: &TrainingSet,
    ) -> QknnResult<Evaluation> {
        if test_set.len() != test_labels.len() {
            return Err(QknnError::invalid(
                Component::Harness,
                format!(
                    "{} test samples but {} test labels",
                    test_set.len(),
                    test_labels.len()
                ),
            ));
        }
        if test_set.is_empty() {
            return Err(QknnError::invalid(Component::Harness, "test set is empty"));
        }
        if training.is_empty() || self.k == 0 || self.k > training.len() {
            return Err(QknnError::invalid(
                Component::Harness,
                format!("k must be in 1..={}, got {}", training.len(), self.k),
            ));
        }

        info!(
            "Evaluating {} queries against {} training samples ({} kernel, k={})",
            test_set.len(),
            training.len(),
            self.knn.kernel().name(),
            self.k
        );

        let encoded = self.knn.prepare(training)?;
        let predictions = if self.parallel {
            test_set
                .par_iter()
                .enumerate()
                .map(|(i, query)| self.predict_one(i, query, &encoded))
                .collect::<Vec<_>>()
                .into_iter()
                .collect::<QknnResult<Vec<_>>>()?
        } else {
            test_set
                .iter()
                .enumerate()
                .map(|(i, query)| self.predict_one(i, query, &encoded))
                .collect::<QknnResult<Vec<_>>>()?
        };

        let correct = predictions
            .iter()
            .zip(test_labels)
            .filter(|(p, t)| p == t)
            .count();
        let accuracy = correct as f64 / predictions.len() as f64;

        info!(
            "Evaluation completed: {}/{} correct, accuracy {:.4}",
            correct,
            predictions.len(),
            accuracy
        );

        Ok(Evaluation {
            accuracy,
            predictions,
            truth: test_labels.to_vec(),
            correct,
        })
    }

    fn predict_one(
        &self,
        index: usize,
        query: &[f64],
        training: &EncodedTrainingSet,
    ) -> QknnResult<Label> {
        let tag = |e: QknnError| e.with_sample(SampleRef::Query(index));
        let state = self.knn.encoder().encode(query).map_err(tag)?;
        let label = self
            .knn
            .classify_encoded(&state, training, self.k)
            .map_err(tag)?;
        debug!("Query {} -> label {}", index, label);
        Ok(label)
    }
}

/// Evaluate with the closed-form kernel, sequentially.
pub fn evaluate(
    test_set: &[Vec<f64>],
    test_labels: &[Label],
    training: &TrainingSet,
    k: usize,
    target_dim: usize,
) -> QknnResult<Evaluation> {
    let knn = KernelKnn::new(AmplitudeEncoder::new(target_dim), OverlapKernel);
    Evaluator::new(knn, k).evaluate(test_set, test_labels, training)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knn::LabeledSample;

    fn axis_training() -> TrainingSet {
        vec![
            LabeledSample::new(vec![1.0, 0.0], 0),
            LabeledSample::new(vec![0.0, 1.0], 1),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_length_mismatch() {
        let err = evaluate(&[vec![1.0, 0.0]], &[0, 1], &axis_training(), 1, 2).unwrap_err();
        assert_eq!(err.component(), Some(Component::Harness));
    }

    #[test]
    fn test_empty_test_set() {
        assert!(evaluate(&[], &[], &axis_training(), 1, 2).is_err());
    }

    #[test]
    fn test_degenerate_query_aborts_with_index() {
        let test = vec![vec![1.0, 0.0], vec![0.0, 0.0], vec![0.0, 1.0]];
        let err = evaluate(&test, &[0, 0, 1], &axis_training(), 1, 2).unwrap_err();
        assert!(err.is_degenerate());
        assert_eq!(err.sample(), Some(SampleRef::Query(1)));
    }

    #[test]
    fn test_first_example() {
        let test = vec![vec![0.1, 0.9], vec![0.9, 0.1]];
        let result = evaluate(&test, &[1, 1], &axis_training(), 1, 2).unwrap();
        assert_eq!(result.first_example(), Some((1, 1)));
        assert_eq!(result.example(1), Some((0, 1)));
        assert_eq!(result.example(2), None);
        assert_eq!(result.correct, 1);
        assert!((result.accuracy - 0.5).abs() < 1e-12);
    }
}

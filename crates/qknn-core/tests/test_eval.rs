//! Tests for the evaluation harness.

use qknn_core::encoding::AmplitudeEncoder;
use qknn_core::error::{Component, SampleRef};
use qknn_core::eval::{Evaluator, evaluate};
use qknn_core::kernel::{CircuitKernel, KernelMode};
use qknn_core::knn::{KernelKnn, LabeledSample, TrainingSet};
use qknn_core::QknnConfig;

fn axis_training() -> TrainingSet {
    vec![
        LabeledSample::new(vec![1.0, 0.0, 0.0], 0),
        LabeledSample::new(vec![0.0, 1.0, 0.0], 1),
        LabeledSample::new(vec![0.0, 0.0, 1.0], 2),
        LabeledSample::new(vec![0.9, 0.1, 0.0], 0),
    ]
    .into_iter()
    .collect()
}

fn sample_queries() -> (Vec<Vec<f64>>, Vec<usize>) {
    let test = vec![
        vec![0.95, 0.05, 0.0],
        vec![0.1, 0.9, 0.0],
        vec![0.0, 0.2, 0.8],
        // Nearest to label 0, but labelled 2.
        vec![0.8, 0.1, 0.1],
    ];
    (test, vec![0, 1, 2, 2])
}

#[test]
fn three_of_four_is_seventy_five_percent() {
    let (test, labels) = sample_queries();
    let result = evaluate(&test, &labels, &axis_training(), 1, 4).unwrap();
    assert_eq!(result.predictions, vec![0, 1, 2, 0]);
    assert_eq!(result.correct, 3);
    assert_eq!(result.total(), 4);
    assert!((result.accuracy - 0.75).abs() < 1e-12);
    assert_eq!(result.first_example(), Some((0, 0)));
}

#[test]
fn evaluation_is_deterministic() {
    let (test, labels) = sample_queries();
    let a = evaluate(&test, &labels, &axis_training(), 3, 4).unwrap();
    let b = evaluate(&test, &labels, &axis_training(), 3, 4).unwrap();
    assert_eq!(a, b);
}

#[test]
fn parallel_matches_sequential() {
    let training: TrainingSet = (0..40)
        .map(|i| {
            let t = i as f64 * 0.37;
            LabeledSample::new(vec![t.cos(), t.sin(), (2.0 * t).cos(), 0.5], i % 3)
        })
        .collect();
    let test: Vec<Vec<f64>> = (0..25)
        .map(|i| {
            let t = i as f64 * 0.53 + 0.1;
            vec![t.cos(), t.sin(), (2.0 * t).cos(), 0.5]
        })
        .collect();
    let labels: Vec<usize> = (0..25).map(|i| i % 3).collect();

    let knn = KernelKnn::new(AmplitudeEncoder::new(4), KernelMode::ClosedForm);
    let sequential = Evaluator::new(knn.clone(), 5)
        .evaluate(&test, &labels, &training)
        .unwrap();
    let parallel = Evaluator::new(knn, 5)
        .with_parallel(true)
        .evaluate(&test, &labels, &training)
        .unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn parallel_reports_lowest_failing_index() {
    let test = vec![
        vec![1.0, 0.0, 0.0],
        vec![0.0, 0.0, 0.0],
        vec![0.5, 0.5, 0.0],
        vec![0.0, 0.0, 0.0],
    ];
    let knn = KernelKnn::new(AmplitudeEncoder::new(4), KernelMode::ClosedForm);
    let err = Evaluator::new(knn, 1)
        .with_parallel(true)
        .evaluate(&test, &[0, 0, 0, 0], &axis_training())
        .unwrap_err();
    assert!(err.is_degenerate());
    assert_eq!(err.sample(), Some(SampleRef::Query(1)));
}

#[test]
fn degenerate_training_sample_aborts_run() {
    let mut samples = axis_training().samples().to_vec();
    samples.push(LabeledSample::new(vec![0.0, 0.0, 0.0], 1));
    let training = TrainingSet::new(samples);
    let (test, labels) = sample_queries();
    let err = evaluate(&test, &labels, &training, 1, 4).unwrap_err();
    assert_eq!(err.sample(), Some(SampleRef::Training(4)));
}

#[test]
fn k_larger_than_training_set() {
    let (test, labels) = sample_queries();
    let err = evaluate(&test, &labels, &axis_training(), 5, 4).unwrap_err();
    assert_eq!(err.component(), Some(Component::Harness));
}

#[test]
fn circuit_kernel_evaluator_from_config() {
    let mut config = QknnConfig::with_qubits(2);
    config.kernel = KernelMode::Circuit;
    config.k = 1;
    let (test, labels) = sample_queries();
    let from_config = Evaluator::from_config(&config)
        .evaluate(&test, &labels, &axis_training())
        .unwrap();

    let explicit = Evaluator::new(KernelKnn::new(AmplitudeEncoder::new(4), CircuitKernel), 1)
        .evaluate(&test, &labels, &axis_training())
        .unwrap();
    assert_eq!(from_config.predictions, explicit.predictions);
    assert!((from_config.accuracy - 0.75).abs() < 1e-12);
}

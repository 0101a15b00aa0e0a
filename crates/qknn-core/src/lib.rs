//! `qknn-core`: k-nearest-neighbour classification with a quantum
//! state-overlap kernel.
//!
//! Feature vectors are amplitude-encoded into unit-norm states of dimension
//! `N = 2^n`; the similarity of two samples is the squared overlap of their
//! states, and `1 - overlap` is used as the k-NN distance.
//!
//! - [`encoding`]: zero-padding and normalization (amplitude encoding)
//! - [`kernel`]: closed-form overlap kernel and the circuit-simulated one
//! - [`statevector`]: amplitude-embedding circuits on a statevector
//! - [`knn`]: neighbour ranking and majority vote
//! - [`eval`]: batch evaluation and accuracy
//! - [`prep`]: dataset loading, standardization, padding, splitting
//! - [`config`]: run configuration
//!
//! # Quick start
//!
//! ```rust
//! use qknn_core::{evaluate, LabeledSample, TrainingSet};
//!
//! let training: TrainingSet = vec![
//!     LabeledSample::new(vec![1.0, 0.0], 0),
//!     LabeledSample::new(vec![0.0, 1.0], 1),
//!     LabeledSample::new(vec![0.9, 0.1], 0),
//! ]
//! .into_iter()
//! .collect();
//!
//! let test = vec![vec![0.95, 0.05], vec![0.1, 0.9]];
//! let result = evaluate(&test, &[0, 1], &training, 1, 2).unwrap();
//! assert_eq!(result.predictions, vec![0, 1]);
//! assert!((result.accuracy - 1.0).abs() < 1e-12);
//! ```

pub mod config;
pub mod encoding;
pub mod error;
pub mod eval;
pub mod kernel;
pub mod knn;
pub mod prep;
pub mod statevector;

pub use config::{QknnConfig, SplitConfig};
pub use encoding::{AmplitudeEncoder, EncodedState, encode};
pub use error::{Component, ConfigError, QknnError, QknnResult, SampleRef};
pub use eval::{Evaluation, Evaluator, evaluate};
pub use kernel::{CircuitKernel, KernelMode, OverlapKernel, QuantumKernel, distance, kernel};
pub use knn::{
    EncodedTrainingSet, KernelKnn, Label, LabeledSample, Neighbor, TrainingSet, classify,
    majority_vote,
};
pub use prep::{Dataset, Split, StandardScaler, pad_features, train_test_split};

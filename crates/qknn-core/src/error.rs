//! Error types for the classifier core.

use std::fmt;

use thiserror::Error;

/// The component that raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Feature encoder (amplitude encoding).
    Encoder,
    /// Quantum kernel evaluator.
    Kernel,
    /// Kernel k-NN classifier.
    Classifier,
    /// Evaluation harness.
    Harness,
    /// Data preparation (scaling, padding, splitting, loading).
    Prep,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Encoder => "encoder",
            Component::Kernel => "kernel",
            Component::Classifier => "classifier",
            Component::Harness => "harness",
            Component::Prep => "prep",
        };
        f.write_str(name)
    }
}

/// Identifies the sample an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRef {
    /// A query (test) sample, by position in the query batch.
    Query(usize),
    /// A training sample, by position in the training set.
    Training(usize),
}

impl fmt::Display for SampleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleRef::Query(i) => write!(f, "query sample {i}"),
            SampleRef::Training(i) => write!(f, "training sample {i}"),
        }
    }
}

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("Failed to read configuration: {0}")]
    IoError(String),

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors produced by the encoder, kernel, classifier and harness.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QknnError {
    /// The vector has zero norm after padding, so it cannot be normalized.
    #[error("{component}: degenerate (all-zero) vector{}", format_sample(.sample))]
    DegenerateVector {
        /// Component that detected the degenerate vector.
        component: Component,
        /// Offending sample, when known.
        sample: Option<SampleRef>,
    },

    /// A precondition on the arguments was violated.
    #[error("{component}: invalid argument{}: {reason}", format_sample(.sample))]
    InvalidArgument {
        /// Component that rejected the argument.
        component: Component,
        /// Offending sample, when known.
        sample: Option<SampleRef>,
        /// What was wrong.
        reason: String,
    },

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A dataset file could not be read.
    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    /// A dataset file could not be parsed.
    #[error("Failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

#[allow(clippy::ref_option)]
fn format_sample(sample: &Option<SampleRef>) -> String {
    match sample {
        Some(s) => format!(" ({s})"),
        None => String::new(),
    }
}

impl QknnError {
    /// Shorthand for a degenerate-vector error with no sample attached yet.
    pub fn degenerate(component: Component) -> Self {
        QknnError::DegenerateVector {
            component,
            sample: None,
        }
    }

    /// Shorthand for an invalid-argument error with no sample attached yet.
    pub fn invalid(component: Component, reason: impl Into<String>) -> Self {
        QknnError::InvalidArgument {
            component,
            sample: None,
            reason: reason.into(),
        }
    }

    /// Attach a sample reference, keeping one that is already set.
    ///
    /// The innermost caller that knows the index wins, so a training index
    /// attached by the classifier is not overwritten by the harness.
    #[must_use]
    pub fn with_sample(mut self, at: SampleRef) -> Self {
        match &mut self {
            QknnError::DegenerateVector { sample, .. }
            | QknnError::InvalidArgument { sample, .. } => {
                sample.get_or_insert(at);
            }
            _ => {}
        }
        self
    }

    /// The sample this error refers to, if any.
    pub fn sample(&self) -> Option<SampleRef> {
        match self {
            QknnError::DegenerateVector { sample, .. }
            | QknnError::InvalidArgument { sample, .. } => *sample,
            _ => None,
        }
    }

    /// The component that raised this error, if it came from the core.
    pub fn component(&self) -> Option<Component> {
        match self {
            QknnError::DegenerateVector { component, .. }
            | QknnError::InvalidArgument { component, .. } => Some(*component),
            _ => None,
        }
    }

    /// True for [`QknnError::DegenerateVector`].
    pub fn is_degenerate(&self) -> bool {
        matches!(self, QknnError::DegenerateVector { .. })
    }
}

/// Result type for classifier core operations.
pub type QknnResult<T> = Result<T, QknnError>;

//! Amplitude encoding of real feature vectors.
//!
//! A feature vector of length `D` is right-padded with zeros to the target
//! dimension `N` (conventionally `2^n` for `n` qubits) and divided by its
//! Euclidean norm, giving the amplitudes of a normalized state.
//!
//! ```rust
//! use qknn_core::encoding::encode;
//!
//! let state = encode(&[3.0, 4.0], 4).unwrap();
//! assert_eq!(state.dim(), 4);
//! assert!((state.amplitudes()[0] - 0.6).abs() < 1e-12);
//! assert!((state.amplitudes()[1] - 0.8).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Component, QknnError, QknnResult};

/// A unit-norm real vector produced by [`encode`].
///
/// The amplitudes are private so the unit-norm invariant cannot be broken
/// after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodedState {
    amplitudes: Vec<f64>,
}

impl EncodedState {
    /// The normalized amplitudes.
    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes
    }

    /// Encoded dimension `N`.
    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    /// Number of qubits needed to hold this state, if `N` is a power of two.
    pub fn num_qubits(&self) -> Option<u32> {
        let n = self.amplitudes.len();
        n.is_power_of_two().then(|| n.trailing_zeros())
    }

    /// Euclidean norm of the amplitudes (1 up to rounding).
    pub fn norm(&self) -> f64 {
        l2_norm(&self.amplitudes)
    }
}

/// Encode `v` into a unit-norm state of length `target_dim`.
///
/// # Errors
///
/// - [`QknnError::InvalidArgument`] if `target_dim` is zero, `v` is longer
///   than `target_dim`, or `v` contains a non-finite value.
/// - [`QknnError::DegenerateVector`] if `v` is all zeros.
pub fn encode(v: &[f64], target_dim: usize) -> QknnResult<EncodedState> {
    if target_dim == 0 {
        return Err(QknnError::invalid(
            Component::Encoder,
            "target dimension must be at least 1",
        ));
    }
    if v.len() > target_dim {
        return Err(QknnError::invalid(
            Component::Encoder,
            format!(
                "vector of length {} does not fit target dimension {target_dim}",
                v.len()
            ),
        ));
    }
    if let Some(pos) = v.iter().position(|x| !x.is_finite()) {
        return Err(QknnError::invalid(
            Component::Encoder,
            format!("non-finite value at feature {pos}"),
        ));
    }

    // Divide by the largest magnitude first so the sum of squares can
    // neither underflow nor overflow.
    let scale = max_abs(v);
    if scale == 0.0 {
        return Err(QknnError::degenerate(Component::Encoder));
    }
    let mut amplitudes = Vec::with_capacity(target_dim);
    amplitudes.extend(v.iter().map(|x| x / scale));
    amplitudes.resize(target_dim, 0.0);

    let norm = amplitudes.iter().map(|x| x * x).sum::<f64>().sqrt();
    for a in &mut amplitudes {
        *a /= norm;
    }
    Ok(EncodedState { amplitudes })
}

fn max_abs(xs: &[f64]) -> f64 {
    xs.iter().fold(0.0_f64, |m, x| m.max(x.abs()))
}

/// Euclidean norm, computed on scaled values.
pub(crate) fn l2_norm(xs: &[f64]) -> f64 {
    let scale = max_abs(xs);
    if scale == 0.0 {
        return 0.0;
    }
    scale * xs.iter().map(|x| (x / scale).powi(2)).sum::<f64>().sqrt()
}

/// Amplitude encoder bound to a fixed target dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmplitudeEncoder {
    target_dim: usize,
}

impl AmplitudeEncoder {
    /// Create an encoder for `target_dim` slots.
    pub fn new(target_dim: usize) -> Self {
        Self { target_dim }
    }

    /// Create an encoder for `n_qubits` qubits, i.e. `2^n_qubits` slots.
    pub fn with_qubits(n_qubits: u32) -> Self {
        Self::new(1usize << n_qubits)
    }

    /// The target dimension.
    pub fn target_dim(&self) -> usize {
        self.target_dim
    }

    /// Encode a single vector.
    pub fn encode(&self, v: &[f64]) -> QknnResult<EncodedState> {
        encode(v, self.target_dim)
    }
}

//! Quantum kernel evaluation.
//!
//! The kernel between two encoded states is their squared overlap,
//!
//! ```text
//! k(a, b) = (Σ_i a_i · b_i)²
//! ```
//!
//! which is what the circuit "embed `a`, un-embed `b`, measure `|0…0⟩`"
//! yields in the noiseless case. [`OverlapKernel`] computes it in closed form;
//! [`CircuitKernel`] simulates the circuit on a statevector. The two agree to
//! within 1e-9.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::encoding::EncodedState;
use crate::error::{Component, QknnError, QknnResult};
use crate::statevector::overlap_circuit_probability;

/// A similarity measure between two encoded states, valued in `[0, 1]`.
pub trait QuantumKernel: Send + Sync {
    /// Evaluate the kernel.
    ///
    /// # Errors
    ///
    /// [`QknnError::InvalidArgument`] if the states have different dimensions.
    fn evaluate(&self, a: &EncodedState, b: &EncodedState) -> QknnResult<f64>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// `1 - k(a, b)`.
    fn distance(&self, a: &EncodedState, b: &EncodedState) -> QknnResult<f64> {
        self.evaluate(a, b).map(|k| 1.0 - k)
    }
}

/// Closed-form squared inner product.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapKernel;

impl QuantumKernel for OverlapKernel {
    fn evaluate(&self, a: &EncodedState, b: &EncodedState) -> QknnResult<f64> {
        kernel(a, b)
    }

    fn name(&self) -> &'static str {
        "closed_form"
    }
}

/// Statevector simulation of the overlap circuit.
///
/// Requires power-of-two dimensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircuitKernel;

impl QuantumKernel for CircuitKernel {
    fn evaluate(&self, a: &EncodedState, b: &EncodedState) -> QknnResult<f64> {
        check_dims(a, b)?;
        overlap_circuit_probability(a, b).map(clamp_unit)
    }

    fn name(&self) -> &'static str {
        "circuit"
    }
}

/// Which kernel implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelMode {
    /// [`OverlapKernel`].
    #[default]
    ClosedForm,
    /// [`CircuitKernel`].
    Circuit,
}

impl QuantumKernel for KernelMode {
    fn evaluate(&self, a: &EncodedState, b: &EncodedState) -> QknnResult<f64> {
        match self {
            KernelMode::ClosedForm => OverlapKernel.evaluate(a, b),
            KernelMode::Circuit => CircuitKernel.evaluate(a, b),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            KernelMode::ClosedForm => OverlapKernel.name(),
            KernelMode::Circuit => CircuitKernel.name(),
        }
    }
}

impl fmt::Display for KernelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(QuantumKernel::name(self))
    }
}

impl FromStr for KernelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "closed_form" | "closed-form" | "overlap" => Ok(KernelMode::ClosedForm),
            "circuit" | "statevector" => Ok(KernelMode::Circuit),
            other => Err(format!(
                "unknown kernel mode '{other}' (expected 'closed_form' or 'circuit')"
            )),
        }
    }
}

/// Squared inner product of two encoded states, clamped to `[0, 1]`.
///
/// # Errors
///
/// [`QknnError::InvalidArgument`] if the states have different dimensions.
pub fn kernel(a: &EncodedState, b: &EncodedState) -> QknnResult<f64> {
    check_dims(a, b)?;
    let dot: f64 = a
        .amplitudes()
        .iter()
        .zip(b.amplitudes())
        .map(|(x, y)| x * y)
        .sum();
    Ok(clamp_unit(dot * dot))
}

/// `1 - kernel(a, b)`.
pub fn distance(a: &EncodedState, b: &EncodedState) -> QknnResult<f64> {
    kernel(a, b).map(|k| 1.0 - k)
}

fn check_dims(a: &EncodedState, b: &EncodedState) -> QknnResult<()> {
    if a.dim() != b.dim() {
        return Err(QknnError::invalid(
            Component::Kernel,
            format!("dimension mismatch: {} vs {}", a.dim(), b.dim()),
        ));
    }
    Ok(())
}

fn clamp_unit(k: f64) -> f64 {
    k.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode;

    #[test]
    fn test_self_similarity() {
        let a = encode(&[0.3, -1.2, 4.0], 4).unwrap();
        assert!((kernel(&a, &a).unwrap() - 1.0).abs() < 1e-12);
        assert!(distance(&a, &a).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_orthogonal() {
        let a = encode(&[1.0, 0.0], 2).unwrap();
        let b = encode(&[0.0, 1.0], 2).unwrap();
        assert_eq!(kernel(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn test_sign_is_irrelevant() {
        let a = encode(&[1.0, 2.0], 2).unwrap();
        let b = encode(&[-1.0, -2.0], 2).unwrap();
        assert!((kernel(&a, &b).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = encode(&[1.0, 0.0], 2).unwrap();
        let b = encode(&[1.0, 0.0], 4).unwrap();
        let err = kernel(&a, &b).unwrap_err();
        assert_eq!(err.component(), Some(Component::Kernel));
        assert!(CircuitKernel.evaluate(&a, &b).is_err());
    }

    #[test]
    fn test_circuit_agrees_with_closed_form() {
        let a = encode(&[0.5, -1.0, 2.0, 0.1, 0.7], 8).unwrap();
        let b = encode(&[1.5, 0.2, -0.3, 0.9], 8).unwrap();
        let closed = OverlapKernel.evaluate(&a, &b).unwrap();
        let circuit = CircuitKernel.evaluate(&a, &b).unwrap();
        assert!((closed - circuit).abs() < 1e-9);
    }

    #[test]
    fn test_mode_parse_and_display() {
        assert_eq!("circuit".parse::<KernelMode>().unwrap(), KernelMode::Circuit);
        assert_eq!(
            "closed-form".parse::<KernelMode>().unwrap(),
            KernelMode::ClosedForm
        );
        assert!("qpu".parse::<KernelMode>().is_err());
        assert_eq!(KernelMode::Circuit.to_string(), "circuit");
    }
}

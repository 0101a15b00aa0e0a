//! Statevector simulation of the amplitude-embedding overlap circuit.
//!
//! The kernel circuit is
//!
//! ```text
//! |0…0⟩ ── U(a) ── U(b)† ── measure ⟨0…0|
//! ```
//!
//! where `U(x)` prepares the amplitude-encoded state of `x` from `|0…0⟩`.
//! The probability of observing the all-zero basis state is `|⟨b|a⟩|²`.
//!
//! `U(x)` is built as a binary amplitude tree: level `l` is a rotation
//! `Ry(θ)` on qubit `n-1-l`, uniformly controlled by the `l` qubits above
//! it, with one angle per control pattern. Internal levels split subtree
//! norms, the leaf level splits signed amplitude pairs, so real vectors of
//! either sign are reproduced exactly without phase gates.

use num_complex::Complex64;

use crate::encoding::{EncodedState, l2_norm};
use crate::error::{Component, QknnError, QknnResult};

/// A uniformly-controlled `Ry` rotation.
///
/// Applies `Ry(angles[p])` to `target` on the subspace where the qubits
/// above `target` read the binary pattern `p`.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiplexedRy {
    /// Target qubit (bit index into the amplitude vector).
    pub target: usize,
    /// One rotation angle per control pattern; `2^(n-1-target)` entries.
    pub angles: Vec<f64>,
}

/// Amplitude-embedding state preparation, or its adjoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingCircuit {
    num_qubits: usize,
    ops: Vec<MultiplexedRy>,
}

impl EmbeddingCircuit {
    /// Build the circuit that prepares `state` from `|0…0⟩`.
    ///
    /// # Errors
    ///
    /// [`QknnError::InvalidArgument`] if the state dimension is not a power
    /// of two.
    pub fn amplitude_embedding(state: &EncodedState) -> QknnResult<Self> {
        let amps = state.amplitudes();
        let dim = amps.len();
        if !dim.is_power_of_two() {
            return Err(QknnError::invalid(
                Component::Kernel,
                format!("circuit mode needs a power-of-two dimension, got {dim}"),
            ));
        }
        let n = dim.trailing_zeros() as usize;

        let mut ops = Vec::with_capacity(n);
        for level in 0..n {
            let block = dim >> level;
            let half = block / 2;
            let leaf = level == n - 1;
            let angles = amps
                .chunks_exact(block)
                .map(|chunk| {
                    let (left, right) = chunk.split_at(half);
                    if leaf {
                        2.0 * right[0].atan2(left[0])
                    } else {
                        2.0 * l2_norm(right).atan2(l2_norm(left))
                    }
                })
                .collect();
            ops.push(MultiplexedRy {
                target: n - 1 - level,
                angles,
            });
        }

        Ok(Self { num_qubits: n, ops })
    }

    /// The inverse circuit: operations reversed, angles negated.
    #[must_use]
    pub fn adjoint(&self) -> Self {
        let ops = self
            .ops
            .iter()
            .rev()
            .map(|op| MultiplexedRy {
                target: op.target,
                angles: op.angles.iter().map(|t| -t).collect(),
            })
            .collect();
        Self {
            num_qubits: self.num_qubits,
            ops,
        }
    }

    /// Number of qubits the circuit acts on.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The rotation layers in application order.
    pub fn ops(&self) -> &[MultiplexedRy] {
        &self.ops
    }
}

/// A statevector representing a quantum state.
#[derive(Debug, Clone)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The raw amplitudes.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Apply every layer of `circuit`.
    ///
    /// # Errors
    ///
    /// [`QknnError::InvalidArgument`] if the circuit width differs from the
    /// statevector width.
    pub fn run(&mut self, circuit: &EmbeddingCircuit) -> QknnResult<()> {
        if circuit.num_qubits() != self.num_qubits {
            return Err(QknnError::invalid(
                Component::Kernel,
                format!(
                    "circuit on {} qubits applied to {}-qubit statevector",
                    circuit.num_qubits(),
                    self.num_qubits
                ),
            ));
        }
        for op in circuit.ops() {
            self.apply_multiplexed_ry(op);
        }
        Ok(())
    }

    /// Apply a single-qubit `Ry(theta)`.
    pub fn apply_ry(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - s * b;
                self.amplitudes[j] = s * a + c * b;
            }
        }
    }

    /// Apply a uniformly-controlled `Ry`.
    ///
    /// A single angle means no controls, which is a plain [`Self::apply_ry`].
    pub fn apply_multiplexed_ry(&mut self, op: &MultiplexedRy) {
        if let [theta] = op.angles[..] {
            self.apply_ry(op.target, theta);
            return;
        }
        let mask = 1 << op.target;
        let shift = op.target + 1;
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let theta = op.angles[i >> shift];
                let c = (theta / 2.0).cos();
                let s = (theta / 2.0).sin();
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - s * b;
                self.amplitudes[j] = s * a + c * b;
            }
        }
    }

    /// Probability of measuring basis state `index`.
    pub fn probability(&self, index: usize) -> f64 {
        self.amplitudes[index].norm_sqr()
    }

    /// Expectation of the projector onto `|0…0⟩`.
    pub fn zero_state_probability(&self) -> f64 {
        self.probability(0)
    }
}

/// Simulate `U(b)† U(a) |0…0⟩` and return the zero-state probability.
pub fn overlap_circuit_probability(a: &EncodedState, b: &EncodedState) -> QknnResult<f64> {
    let embed_a = EmbeddingCircuit::amplitude_embedding(a)?;
    let unembed_b = EmbeddingCircuit::amplitude_embedding(b)?.adjoint();

    let mut sv = Statevector::new(embed_a.num_qubits());
    sv.run(&embed_a)?;
    sv.run(&unembed_b)?;
    Ok(sv.zero_state_probability())
}

//! Forward pass over a fixed-topology genome.
//!
//! Layer 0's activations are the raw input. For each later layer `l`, neuron
//! `n` computes `bias[l][n] + Σ_p weight[l][n][p] * activation[l-1][p]` (bias
//! first, then products in `p` order) and applies its activation tag.
//!
//! [`evaluate`] is the allocating one-shot form. [`FeedForward`] keeps two
//! scratch buffers alive between calls for the per-tick hot path; both give
//! bit-identical results for the same genome and input.

use crate::error::EvalError;
use crate::genome::Genome;
use crate::topology::Topology;

/// Evaluate `genome` on `input` and return the output layer's activations.
///
/// # Errors
///
/// - [`EvalError::InputSizeMismatch`] if `input.len() != topology.input_size()`
/// - [`EvalError::GenomeMismatch`] if the genome does not fit `topology`
pub fn evaluate(genome: &Genome, topology: &Topology, input: &[f32]) -> Result<Vec<f32>, EvalError> {
    let mut current = Vec::new();
    let mut next = Vec::new();
    forward(genome, topology, input, &mut current, &mut next)?;
    Ok(current)
}

/// A reusable evaluator that owns its scratch buffers.
#[derive(Debug, Clone)]
pub struct FeedForward {
    topology: Topology,
    current: Vec<f32>,
    next: Vec<f32>,
}

impl FeedForward {
    #[must_use]
    pub fn new(topology: Topology) -> Self {
        let widest = topology.layer_sizes().iter().copied().max().unwrap_or(0);
        Self {
            topology,
            current: Vec::with_capacity(widest),
            next: Vec::with_capacity(widest),
        }
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Evaluate `genome` and borrow the output activations.
    ///
    /// The returned slice is overwritten by the next call.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate`].
    pub fn evaluate(&mut self, genome: &Genome, input: &[f32]) -> Result<&[f32], EvalError> {
        forward(genome, &self.topology, input, &mut self.current, &mut self.next)?;
        Ok(&self.current)
    }

    /// Evaluate `genome`, writing the output activations into `output`.
    ///
    /// `output` is cleared first and ends with `topology.output_size()` values.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate`].
    pub fn evaluate_into(
        &mut self,
        genome: &Genome,
        input: &[f32],
        output: &mut Vec<f32>,
    ) -> Result<(), EvalError> {
        let result = self.evaluate(genome, input)?;
        output.clear();
        output.extend_from_slice(result);
        Ok(())
    }
}

fn forward(
    genome: &Genome,
    topology: &Topology,
    input: &[f32],
    current: &mut Vec<f32>,
    next: &mut Vec<f32>,
) -> Result<(), EvalError> {
    if input.len() != topology.input_size() {
        return Err(EvalError::InputSizeMismatch {
            expected: topology.input_size(),
            found: input.len(),
        });
    }
    if !genome.matches(topology) {
        return Err(EvalError::GenomeMismatch);
    }

    current.clear();
    current.extend_from_slice(input);

    for layer in 1..topology.network_size() {
        next.clear();
        let rows = &genome.weights[layer];
        let biases = &genome.biases[layer];
        for (neuron, (row, &bias)) in rows.iter().zip(biases).enumerate() {
            let mut sum = bias;
            for (&w, &a) in row.iter().zip(current.iter()) {
                sum += a * w;
            }
            next.push(topology.activation_for(layer, neuron).apply(sum));
        }
        std::mem::swap(current, next);
    }
    Ok(())
}

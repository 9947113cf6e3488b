//! Network shape description and validation.
//!
//! A [`Topology`] is the validated form of a layer-size list plus its
//! activation tags. Construction goes through [`Topology::validate`], so any
//! `Topology` value in hand satisfies the structural invariants:
//!
//! - at least two layers (input and output)
//! - one activation tag per layer
//! - `Input` on layer 0 and nowhere else
//! - `Output` on the last layer only, in which case every output neuron
//!   carries its own activation tag

use crate::activation::Activation;
use crate::error::ConfigError;

/// A validated feedforward network shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    layer_sizes: Vec<usize>,
    activations: Vec<Activation>,
    /// Per-neuron activations of the last layer; present iff custom output.
    output_overrides: Option<Vec<Activation>>,
}

impl Topology {
    /// Validate a layer-size list and its activation tags.
    ///
    /// Checks run in a fixed order and the first failure is reported:
    /// layer count, tag count, input placement, output placement, and
    /// (only when the last tag is `Output`) the override length. Overrides
    /// given for a network whose last tag is not `Output` are ignored.
    /// A layer with zero neurons is rejected after those checks.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(
        layer_sizes: &[usize],
        activations: &[Activation],
        output_overrides: Option<&[Activation]>,
    ) -> Result<Self, ConfigError> {
        if layer_sizes.len() < 2 {
            return Err(ConfigError::TooFewLayers {
                found: layer_sizes.len(),
            });
        }
        if activations.len() != layer_sizes.len() {
            return Err(ConfigError::ActivationCountMismatch {
                layers: layer_sizes.len(),
                activations: activations.len(),
            });
        }
        if activations[0] != Activation::Input
            || activations[1..].contains(&Activation::Input)
        {
            return Err(ConfigError::MisplacedInput);
        }
        let last = activations.len() - 1;
        if let Some(layer) = activations[..last]
            .iter()
            .position(|&a| a == Activation::Output)
        {
            return Err(ConfigError::MisplacedOutput { layer });
        }

        let output_size = layer_sizes[last];
        let output_overrides = if activations[last] == Activation::Output {
            let overrides = output_overrides.unwrap_or_default();
            if overrides.len() != output_size {
                return Err(ConfigError::OutputOverrideMismatch {
                    expected: output_size,
                    found: overrides.len(),
                });
            }
            Some(overrides.to_vec())
        } else {
            None
        };

        if let Some(layer) = layer_sizes.iter().position(|&n| n == 0) {
            return Err(ConfigError::EmptyLayer { layer });
        }

        Ok(Self {
            layer_sizes: layer_sizes.to_vec(),
            activations: activations.to_vec(),
            output_overrides,
        })
    }

    /// Number of layers, including input and output.
    #[inline]
    #[must_use]
    pub fn network_size(&self) -> usize {
        self.layer_sizes.len()
    }

    #[inline]
    #[must_use]
    pub fn input_size(&self) -> usize {
        self.layer_sizes[0]
    }

    #[inline]
    #[must_use]
    pub fn output_size(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    /// True when the last layer uses per-neuron activations.
    #[inline]
    #[must_use]
    pub fn custom_output(&self) -> bool {
        self.output_overrides.is_some()
    }

    #[must_use]
    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    #[must_use]
    pub fn activations(&self) -> &[Activation] {
        &self.activations
    }

    #[must_use]
    pub fn output_overrides(&self) -> Option<&[Activation]> {
        self.output_overrides.as_deref()
    }

    /// The activation applied to `neuron` of `layer`.
    ///
    /// # Panics
    ///
    /// Panics if `layer` is out of range, or if `neuron` is out of range for
    /// the last layer in custom output mode.
    #[inline]
    #[must_use]
    pub fn activation_for(&self, layer: usize, neuron: usize) -> Activation {
        match &self.output_overrides {
            Some(overrides) if layer + 1 == self.layer_sizes.len() => overrides[neuron],
            _ => self.activations[layer],
        }
    }

    /// Total number of weights and biases a genome for this topology holds.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.layer_sizes
            .windows(2)
            .map(|pair| pair[1] * pair[0] + pair[1])
            .sum()
    }
}

//! Activation tags for fixed-topology networks.
//!
//! A tag either selects the transfer function applied to a layer's neurons
//! or marks the structural role of a layer. `Input` may only sit on layer 0,
//! and `Output` on the last layer, where it switches the network into
//! per-neuron "custom output" mode.

use serde::{Deserialize, Serialize};

/// Activation tag attached to each layer (and optionally to each output neuron).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Activation {
    /// Marks the input layer. Performs no transform.
    Input,
    /// Sigmoid: f(x) = 1 / (1 + e^(-x))
    Sigmoid,
    /// Hyperbolic tangent: f(x) = 2 / (1 + e^(-2x)) - 1
    Tanh,
    /// Rectified Linear Unit: f(x) = max(0, x)
    ReLU,
    /// Binary step: f(x) = 0 if x < 0 else 1
    BinaryStep,
    /// Marks the last layer as using per-neuron activations. Performs no transform.
    Output,
}

impl Activation {
    /// Tags that apply a transfer function.
    pub const FUNCTIONS: [Self; 4] = [Self::Sigmoid, Self::Tanh, Self::ReLU, Self::BinaryStep];

    /// Apply this activation to a pre-activation sum.
    ///
    /// `Input` and `Output` are structural markers and return `x` unchanged.
    /// NaN propagates through every function except `BinaryStep`, which maps
    /// it to 1 (NaN is not less than zero).
    #[inline]
    #[must_use]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Self::Input | Self::Output => x,
            // exp overflow to +inf yields 0.0 / -1.0, which is the correct limit
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Self::Tanh => 2.0 / (1.0 + (-2.0 * x).exp()) - 1.0,
            Self::ReLU => {
                if x.is_nan() {
                    x
                } else {
                    x.max(0.0)
                }
            }
            Self::BinaryStep => {
                if x < 0.0 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    /// Whether this tag only marks a structural role (`Input` / `Output`).
    #[inline]
    #[must_use]
    pub const fn is_structural(self) -> bool {
        matches!(self, Self::Input | Self::Output)
    }
}

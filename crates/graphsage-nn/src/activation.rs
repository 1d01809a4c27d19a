//! Elementwise activations applied after an aggregator's combine step.

use candle_core::{Result, Tensor};
use serde::{Deserialize, Serialize};

/// Elementwise nonlinearity.
///
/// All variants are built from candle ops, so gradients flow through them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// max(0, x)
    Relu,
    /// x for x > 0, alpha * (exp(x) - 1) otherwise
    Elu(f64),
    /// max(0, x) + slope * min(0, x)
    LeakyRelu(f64),
    Tanh,
    Sigmoid,
    /// Tanh approximation of GELU.
    Gelu,
}

impl Activation {
    /// Apply the activation elementwise.
    pub fn apply(&self, x: &Tensor) -> Result<Tensor> {
        match *self {
            Activation::Relu => x.relu(),
            Activation::Elu(alpha) => x.elu(alpha),
            Activation::LeakyRelu(slope) => candle_nn::ops::leaky_relu(x, slope),
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => candle_nn::ops::sigmoid(x),
            Activation::Gelu => x.gelu(),
        }
    }
}

//! Model and optimizer configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a supervised GraphSAGE training run.
///
/// Layer specs carry sampler objects and are passed separately.
///
/// # Example
///
/// ```rust
/// use graphsage_nn::ModelConfig;
///
/// let config = ModelConfig::new(50, 121)
///     .with_learning_rate(0.01)
///     .with_weight_decay(5e-4);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_grad_norm, 5.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Width of the input feature matrix.
    pub input_dim: usize,
    /// Number of labels per node.
    pub num_classes: usize,
    /// Learning rate (default: 0.01).
    pub learning_rate: f64,
    /// L2 penalty on all parameters (default: 0.0).
    pub weight_decay: f64,
    /// Apply weight decay AdamW-style instead of as an L2 loss term (default: false).
    pub decoupled_weight_decay: bool,
    /// Global gradient-norm ceiling (default: 5.0).
    pub max_grad_norm: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_dim: 0,
            num_classes: 0,
            learning_rate: 0.01,
            weight_decay: 0.0,
            decoupled_weight_decay: false,
            max_grad_norm: 5.0,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
        }
    }
}

impl ModelConfig {
    pub fn new(input_dim: usize, num_classes: usize) -> Self {
        Self {
            input_dim,
            num_classes,
            ..Default::default()
        }
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f64) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    pub fn with_decoupled_weight_decay(mut self, decoupled: bool) -> Self {
        self.decoupled_weight_decay = decoupled;
        self
    }

    pub fn with_max_grad_norm(mut self, max_norm: f64) -> Self {
        self.max_grad_norm = max_norm;
        self
    }

    /// Reject configurations that cannot train.
    pub fn validate(&self) -> Result<()> {
        if self.input_dim == 0 {
            return Err(Error::InvalidConfig("input_dim must be positive".into()));
        }
        if self.num_classes == 0 {
            return Err(Error::InvalidConfig("num_classes must be positive".into()));
        }
        if !(self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.weight_decay >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "weight_decay must be non-negative, got {}",
                self.weight_decay
            )));
        }
        if !(self.max_grad_norm > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "max_grad_norm must be positive, got {}",
                self.max_grad_norm
            )));
        }
        Ok(())
    }
}

//! One supervised training step and the collaborators it drives.
//!
//! The step runs a fixed sequence:
//!
//! 1. drop the previous gradients ([`AutodiffContext::zero_grad`])
//! 2. forward pass
//! 3. multi-label soft-margin loss
//! 4. backward pass, then clip the global gradient norm
//!    ([`AutodiffContext::backward`])
//! 5. one optimizer update ([`OptimizerState::step`])
//!
//! Gradients and optimizer moments live in explicit objects created once per
//! training run; [`Trainer`] bundles them with a model.

use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::layer::LayerSpec;
use crate::loss::multilabel_soft_margin_loss;
use crate::model::SupervisedGraphSage;
use candle_core::backprop::GradStore;
use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{AdamW, Optimizer, ParamsAdamW};
use graphsage_core::{Adjacency, NodeId};
use tracing::{debug, warn};

/// Default global gradient-norm ceiling.
pub const DEFAULT_MAX_GRAD_NORM: f64 = 5.0;

/// Scale gradients so their global L2 norm is at most `max_norm`.
///
/// The norm is taken over every gradient of `vars` as one flat vector. When
/// it exceeds `max_norm`, each gradient is multiplied by
/// `max_norm / (norm + 1e-6)`. Vars without a gradient are skipped.
///
/// # Returns
/// The norm before clipping. Non-finite norms are returned as-is and leave
/// the gradients untouched.
pub fn clip_grad_norm(grads: &mut GradStore, vars: &[Var], max_norm: f64) -> Result<f64> {
    let total_norm = grad_norm(grads, vars)?;

    let clip_coef = max_norm / (total_norm + 1e-6);
    if clip_coef < 1.0 {
        for var in vars {
            let scaled = match grads.get(var.as_tensor()) {
                Some(grad) => grad.affine(clip_coef, 0.0)?,
                None => continue,
            };
            grads.insert(var.as_tensor(), scaled);
        }
    }

    Ok(total_norm)
}

/// Global L2 norm of the gradients held for `vars`.
pub fn grad_norm(grads: &GradStore, vars: &[Var]) -> Result<f64> {
    let mut sum_sq = 0.0f64;
    for var in vars {
        if let Some(grad) = grads.get(var.as_tensor()) {
            sum_sq += grad.sqr()?.sum_all()?.to_dtype(DType::F64)?.to_scalar::<f64>()?;
        }
    }
    Ok(sum_sq.sqrt())
}

/// Gradient bookkeeping for a training run.
///
/// Holds the gradients of the most recent backward pass (already clipped)
/// and the pre-clip norm, which callers can watch for divergence.
pub struct AutodiffContext {
    grads: Option<GradStore>,
    max_grad_norm: f64,
    last_grad_norm: Option<f64>,
}

impl Default for AutodiffContext {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_GRAD_NORM)
    }
}

impl AutodiffContext {
    pub fn new(max_grad_norm: f64) -> Self {
        Self {
            grads: None,
            max_grad_norm,
            last_grad_norm: None,
        }
    }

    pub fn max_grad_norm(&self) -> f64 {
        self.max_grad_norm
    }

    /// Drop gradients from the previous step.
    pub fn zero_grad(&mut self) {
        self.grads = None;
    }

    /// Backpropagate `loss`, then clip the gradients of `vars` to
    /// [`Self::max_grad_norm`].
    ///
    /// # Returns
    /// The pre-clip global gradient norm.
    pub fn backward(&mut self, loss: &Tensor, vars: &[Var]) -> Result<f64> {
        let mut grads = loss.backward()?;
        let norm = clip_grad_norm(&mut grads, vars, self.max_grad_norm)?;
        self.grads = Some(grads);
        self.last_grad_norm = Some(norm);
        Ok(norm)
    }

    /// Gradients of the last backward pass, after clipping.
    pub fn gradients(&self) -> Option<&GradStore> {
        self.grads.as_ref()
    }

    /// Pre-clip gradient norm of the last backward pass.
    pub fn last_grad_norm(&self) -> Option<f64> {
        self.last_grad_norm
    }
}

/// Adam optimizer state plus the weight-decay mode.
///
/// With coupled decay (the default) the update sees `grad + wd * θ`, where
/// `grad` is the already clipped gradient, as in Adam with L2
/// regularization. The retained gradients are left clipped. With decoupled
/// decay the penalty is applied inside the AdamW update instead.
pub struct OptimizerState {
    adam: AdamW,
    vars: Vec<Var>,
    l2_penalty: f64,
    steps: usize,
}

impl OptimizerState {
    /// Create optimizer state for `vars`.
    pub fn new(vars: Vec<Var>, config: &ModelConfig) -> Result<Self> {
        let (l2_penalty, decoupled) = if config.decoupled_weight_decay {
            (0.0, config.weight_decay)
        } else {
            (config.weight_decay, 0.0)
        };

        let params = ParamsAdamW {
            lr: config.learning_rate,
            beta1: config.beta1,
            beta2: config.beta2,
            eps: config.eps,
            weight_decay: decoupled,
        };
        let adam = AdamW::new(vars.clone(), params)?;

        Ok(Self {
            adam,
            vars,
            l2_penalty,
            steps: 0,
        })
    }

    pub fn learning_rate(&self) -> f64 {
        self.adam.learning_rate()
    }

    pub fn set_learning_rate(&mut self, lr: f64) {
        self.adam.set_learning_rate(lr);
    }

    /// Number of updates applied so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Apply one update from the gradients held in `ctx`.
    ///
    /// Coupled decay is added to the gradients for the update only; `ctx`
    /// holds the clipped gradients again afterwards. A context without
    /// gradients leaves the parameters unchanged.
    pub fn step(&mut self, ctx: &mut AutodiffContext) -> Result<()> {
        let Some(grads) = ctx.grads.as_mut() else {
            return Ok(());
        };

        if self.l2_penalty == 0.0 {
            self.adam.step(grads)?;
        } else {
            let mut clipped = Vec::with_capacity(self.vars.len());
            for var in &self.vars {
                let decayed = match grads.get(var.as_tensor()) {
                    Some(grad) => grad.add(&var.as_tensor().affine(self.l2_penalty, 0.0)?)?,
                    None => continue,
                };
                clipped.push((var, grads.insert(var.as_tensor(), decayed)));
            }

            let stepped = self.adam.step(grads);
            for (var, grad) in clipped {
                if let Some(grad) = grad {
                    grads.insert(var.as_tensor(), grad);
                }
            }
            stepped?;
        }

        self.steps += 1;
        Ok(())
    }
}

impl SupervisedGraphSage {
    /// Run one training step and update parameters in place.
    ///
    /// # Arguments
    /// - `ctx`: Gradient state for this run
    /// - `opt`: Optimizer state for this run (built from [`Self::parameters`])
    /// - `labels`: 0/1 targets (N x num_classes)
    ///
    /// # Returns
    /// The raw logits of the forward pass and the scalar loss.
    pub fn train_step(
        &mut self,
        ctx: &mut AutodiffContext,
        opt: &mut OptimizerState,
        ids: &[NodeId],
        features: &Tensor,
        adj: &dyn Adjacency,
        labels: &Tensor,
    ) -> Result<(Tensor, f32)> {
        let (label_rows, label_cols) = labels.dims2()?;
        if label_rows != ids.len() {
            return Err(Error::DimensionMismatch {
                expected: ids.len(),
                got: label_rows,
            });
        }
        if label_cols != self.num_classes() {
            return Err(Error::DimensionMismatch {
                expected: self.num_classes(),
                got: label_cols,
            });
        }

        ctx.zero_grad();
        let preds = self.forward(ids, features, adj)?;
        let loss = multilabel_soft_margin_loss(&preds, labels)?;

        let norm = ctx.backward(&loss, &self.parameters())?;
        if !norm.is_finite() {
            warn!(grad_norm = norm, "non-finite gradient norm");
        }

        opt.step(ctx)?;

        let loss = loss.to_dtype(DType::F32)?.to_scalar::<f32>()?;
        debug!(
            step = opt.steps(),
            loss,
            grad_norm = norm,
            clipped = norm > ctx.max_grad_norm(),
            "train step"
        );

        Ok((preds, loss))
    }
}

/// A model together with its gradient and optimizer state.
///
/// # Example
///
/// ```rust
/// use candle_core::{DType, Device, Tensor};
/// use graphsage_core::{AdjacencyList, UniformSampler};
/// use graphsage_nn::{LayerSpec, ModelConfig, Trainer};
///
/// let device = Device::Cpu;
/// let adj = AdjacencyList::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)], true).unwrap();
/// let features = Tensor::randn(0f32, 1f32, (4, 8), &device).unwrap();
/// let labels = Tensor::ones((2, 3), DType::F32, &device).unwrap();
///
/// let config = ModelConfig::new(8, 3).with_learning_rate(0.01);
/// let specs = vec![
///     LayerSpec::new(UniformSampler::new(0), 5, 16),
///     LayerSpec::new(UniformSampler::new(1), 5, 16),
/// ];
/// let mut trainer = Trainer::new(&config, specs, &device).unwrap();
///
/// let (preds, loss) = trainer.train_step(&[0, 2], &features, &adj, &labels).unwrap();
/// assert_eq!(preds.dims(), &[2, 3]);
/// assert!(loss.is_finite());
/// ```
pub struct Trainer {
    model: SupervisedGraphSage,
    autodiff: AutodiffContext,
    optimizer: OptimizerState,
}

impl Trainer {
    /// Build a model and its training state from `config`.
    pub fn new(config: &ModelConfig, layer_specs: Vec<LayerSpec>, device: &Device) -> Result<Self> {
        config.validate()?;

        let model = SupervisedGraphSage::new(config.input_dim, config.num_classes, layer_specs, device)?;
        let autodiff = AutodiffContext::new(config.max_grad_norm);
        let optimizer = OptimizerState::new(model.parameters(), config)?;

        Ok(Self {
            model,
            autodiff,
            optimizer,
        })
    }

    /// See [`SupervisedGraphSage::train_step`].
    pub fn train_step(
        &mut self,
        ids: &[NodeId],
        features: &Tensor,
        adj: &dyn Adjacency,
        labels: &Tensor,
    ) -> Result<(Tensor, f32)> {
        self.model
            .train_step(&mut self.autodiff, &mut self.optimizer, ids, features, adj, labels)
    }

    pub fn model(&self) -> &SupervisedGraphSage {
        &self.model
    }

    pub fn autodiff(&self) -> &AutodiffContext {
        &self.autodiff
    }

    pub fn optimizer(&self) -> &OptimizerState {
        &self.optimizer
    }

    pub fn optimizer_mut(&mut self) -> &mut OptimizerState {
        &mut self.optimizer
    }

    pub fn into_model(self) -> SupervisedGraphSage {
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerSpec;
    use graphsage_core::{AdjacencyList, FirstNeighborsSampler};

    fn setup(config: &ModelConfig) -> (Trainer, Tensor, AdjacencyList, Tensor) {
        let device = Device::Cpu;
        let specs = vec![
            LayerSpec::new(FirstNeighborsSampler, 2, 8),
            LayerSpec::new(FirstNeighborsSampler, 2, 8),
        ];
        let trainer = Trainer::new(config, specs, &device).unwrap();

        let edges: Vec<_> = (0..6u32).map(|i| (i, (i + 1) % 6)).collect();
        let adj = AdjacencyList::from_edges(6, &edges, true).unwrap();
        let features = Tensor::randn(0f32, 1f32, (6, 4), &device).unwrap();
        let labels = Tensor::from_slice(&[1f32, 0.0, 0.0, 1.0, 1.0, 1.0], (3, 2), &device).unwrap();

        (trainer, features, adj, labels)
    }

    fn snapshot(model: &SupervisedGraphSage) -> Vec<Vec<f32>> {
        model
            .parameters()
            .iter()
            .map(|v| v.as_tensor().flatten_all().unwrap().to_vec1::<f32>().unwrap())
            .collect()
    }

    #[test]
    fn test_clip_grad_norm_scales_down() {
        let device = Device::Cpu;
        let var = Var::from_tensor(&Tensor::from_slice(&[3f32, 4.0], 2, &device).unwrap()).unwrap();
        // d/dθ sum(θ * 10) = 10 per element, norm = sqrt(200)
        let loss = var.as_tensor().affine(10.0, 0.0).unwrap().sum_all().unwrap();
        let mut grads = loss.backward().unwrap();

        let vars = vec![var];
        let before = clip_grad_norm(&mut grads, &vars, 5.0).unwrap();
        assert!((before - 200f64.sqrt()).abs() < 1e-4);

        let after = grad_norm(&grads, &vars).unwrap();
        assert!(after <= 5.0 + 1e-5, "clipped norm {after}");
        assert!(after > 4.99);
    }

    #[test]
    fn test_clip_grad_norm_leaves_small_gradients() {
        let device = Device::Cpu;
        let var = Var::from_tensor(&Tensor::from_slice(&[1f32, 1.0], 2, &device).unwrap()).unwrap();
        let loss = var.as_tensor().sum_all().unwrap();
        let mut grads = loss.backward().unwrap();

        let vars = vec![var];
        let before = clip_grad_norm(&mut grads, &vars, 5.0).unwrap();
        let after = grad_norm(&grads, &vars).unwrap();
        assert!((before - after).abs() < 1e-9);
        assert!((after - 2f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_train_step_updates_parameters() {
        let config = ModelConfig::new(4, 2).with_learning_rate(0.05);
        let (mut trainer, features, adj, labels) = setup(&config);

        let before = snapshot(trainer.model());
        let (preds, loss) = trainer.train_step(&[0, 2, 4], &features, &adj, &labels).unwrap();
        let after = snapshot(trainer.model());

        assert_eq!(preds.dims(), &[3, 2]);
        assert!(loss.is_finite() && loss > 0.0);
        assert_ne!(before, after);
        assert_eq!(trainer.optimizer().steps(), 1);
    }

    #[test]
    fn test_train_step_clips_retained_gradients() {
        let config = ModelConfig::new(4, 2).with_max_grad_norm(1e-3);
        let (mut trainer, features, adj, labels) = setup(&config);

        trainer.train_step(&[0, 2, 4], &features, &adj, &labels).unwrap();

        let params = trainer.model().parameters();
        let grads = trainer.autodiff().gradients().unwrap();
        let norm = grad_norm(grads, &params).unwrap();
        assert!(norm <= 1e-3 + 1e-6, "retained norm {norm}");
        assert!(trainer.autodiff().last_grad_norm().unwrap() > 1e-3);
    }

    #[test]
    fn test_default_ceiling_is_five() {
        let config = ModelConfig::new(4, 2);
        let (mut trainer, features, adj, labels) = setup(&config);

        for _ in 0..3 {
            trainer.train_step(&[0, 1, 2], &features, &adj, &labels).unwrap();
            let params = trainer.model().parameters();
            let norm = grad_norm(trainer.autodiff().gradients().unwrap(), &params).unwrap();
            assert!(norm <= 5.0 + 1e-4);
        }
        assert_eq!(trainer.autodiff().max_grad_norm(), 5.0);
    }

    #[test]
    fn test_loss_decreases_on_fixed_batch() {
        let config = ModelConfig::new(4, 2).with_learning_rate(0.05);
        let (mut trainer, features, adj, labels) = setup(&config);

        let (_, first) = trainer.train_step(&[0, 2, 4], &features, &adj, &labels).unwrap();
        let mut last = first;
        for _ in 0..60 {
            let (_, loss) = trainer.train_step(&[0, 2, 4], &features, &adj, &labels).unwrap();
            last = loss;
        }
        assert!(last < first, "loss went from {first} to {last}");
    }

    #[test]
    fn test_weight_decay_modes_train() {
        for decoupled in [false, true] {
            let config = ModelConfig::new(4, 2)
                .with_weight_decay(0.01)
                .with_decoupled_weight_decay(decoupled);
            let (mut trainer, features, adj, labels) = setup(&config);

            let (_, loss) = trainer.train_step(&[3, 4, 5], &features, &adj, &labels).unwrap();
            assert!(loss.is_finite());
        }
    }

    /// Adam's first step with `eps = 1` moves θ by `lr * g / (|g| + 1)`,
    /// so the step size reveals the magnitude of the gradient it was given.
    fn first_step(decoupled: bool) -> (Vec<f32>, f64) {
        let device = Device::Cpu;
        let var = Var::new(&[2f32, -2.0], &device).unwrap();
        let mut config = ModelConfig::new(1, 1)
            .with_learning_rate(0.1)
            .with_weight_decay(1.0)
            .with_decoupled_weight_decay(decoupled)
            .with_max_grad_norm(1e-3);
        config.eps = 1.0;

        let mut ctx = AutodiffContext::new(config.max_grad_norm);
        let mut opt = OptimizerState::new(vec![var.clone()], &config).unwrap();

        // data gradient [10, 10], clipped far below the decay term
        let loss = var.as_tensor().affine(10.0, 0.0).unwrap().sum_all().unwrap();
        let vars = vec![var.clone()];
        ctx.backward(&loss, &vars).unwrap();
        opt.step(&mut ctx).unwrap();

        let retained = grad_norm(ctx.gradients().unwrap(), &vars).unwrap();
        (var.as_tensor().to_vec1::<f32>().unwrap(), retained)
    }

    #[test]
    fn test_coupled_decay_added_after_clipping() {
        let (theta, retained) = first_step(false);

        // g ≈ wd * θ = [2, -2] -> |Δ| ≈ 0.1 * 2 / 3
        assert!((theta[0] - (2.0 - 0.2 / 3.0)).abs() < 1e-3, "{theta:?}");
        assert!((theta[1] - (-2.0 + 0.2 / 3.0)).abs() < 1e-3, "{theta:?}");
        assert!(retained <= 1e-3 + 1e-9, "retained norm {retained}");
    }

    #[test]
    fn test_decoupled_decay_shrinks_weights() {
        let (theta, retained) = first_step(true);

        // θ * (1 - lr * wd) minus a tiny clipped Adam step
        assert!((theta[0] - 1.8).abs() < 1e-3, "{theta:?}");
        assert!((theta[1] + 1.8).abs() < 1e-3, "{theta:?}");
        assert!(retained <= 1e-3 + 1e-9);
    }

    #[test]
    fn test_learning_rate_schedule_hook() {
        let config = ModelConfig::new(4, 2).with_learning_rate(0.01);
        let (mut trainer, _, _, _) = setup(&config);

        assert!((trainer.optimizer().learning_rate() - 0.01).abs() < 1e-12);
        trainer.optimizer_mut().set_learning_rate(0.001);
        assert!((trainer.optimizer().learning_rate() - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_label_shape_checked() {
        let config = ModelConfig::new(4, 2);
        let (mut trainer, features, adj, _) = setup(&config);
        let wrong = Tensor::zeros((3, 5), DType::F32, &Device::Cpu).unwrap();

        assert!(matches!(
            trainer.train_step(&[0, 1, 2], &features, &adj, &wrong),
            Err(Error::DimensionMismatch { expected: 2, got: 5 })
        ));
        assert_eq!(trainer.optimizer().steps(), 0);
    }

    #[test]
    fn test_step_without_gradients_is_noop() {
        let config = ModelConfig::new(4, 2);
        let (mut trainer, _, _, _) = setup(&config);
        let before = snapshot(trainer.model());

        let mut ctx = AutodiffContext::default();
        trainer.optimizer_mut().step(&mut ctx).unwrap();

        assert_eq!(before, snapshot(trainer.model()));
        assert_eq!(trainer.optimizer().steps(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let specs = vec![LayerSpec::new(FirstNeighborsSampler, 2, 8)];
        let config = ModelConfig::new(4, 2).with_learning_rate(-1.0);
        assert!(matches!(
            Trainer::new(&config, specs, &Device::Cpu),
            Err(Error::InvalidConfig(_))
        ));
    }
}

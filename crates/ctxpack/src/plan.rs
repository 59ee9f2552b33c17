//! # Training Plan
//!
//! Derives a concrete step schedule for the external training loop from
//! a token budget and the batch geometry. The plan is serialized next to
//! the packed data so the trainer consumes both from one place.

use serde::{Deserialize, Serialize};

use crate::errors::{CPResult, CtxpackError};

/// Default token budget: ten billion tokens.
pub const DEFAULT_TOKEN_BUDGET: u64 = 10_000_000_000;

/// Default learning rate for continual pretraining.
pub const DEFAULT_LEARNING_RATE: f64 = 2e-5;

/// Options for deriving a [`TrainPlan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainPlanOptions {
    /// Total number of tokens to train on.
    pub token_budget: u64,

    /// Number of training devices.
    pub device_count: usize,

    /// Per-device batch size.
    pub per_device_batch_size: usize,

    /// Gradient accumulation steps.
    pub gradient_accumulation_steps: usize,

    /// Tokens per training example.
    pub context_length: usize,

    /// Optimizer learning rate.
    pub learning_rate: f64,

    /// Optional checkpoint path to resume the external trainer from.
    pub resume_from_checkpoint: Option<String>,
}

impl TrainPlanOptions {
    /// Construct options for the given batch geometry.
    pub fn new(
        context_length: usize,
        device_count: usize,
        per_device_batch_size: usize,
        gradient_accumulation_steps: usize,
    ) -> Self {
        Self {
            token_budget: DEFAULT_TOKEN_BUDGET,
            device_count,
            per_device_batch_size,
            gradient_accumulation_steps,
            context_length,
            learning_rate: DEFAULT_LEARNING_RATE,
            resume_from_checkpoint: None,
        }
    }

    /// Sets the token budget.
    pub fn with_token_budget(
        mut self,
        token_budget: u64,
    ) -> Self {
        self.token_budget = token_budget;
        self
    }

    /// Sets the learning rate.
    pub fn with_learning_rate(
        mut self,
        learning_rate: f64,
    ) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the resume checkpoint path.
    pub fn with_resume_from_checkpoint<S: Into<String>>(
        mut self,
        path: S,
    ) -> Self {
        self.resume_from_checkpoint = Some(path.into());
        self
    }

    /// Tokens consumed by one optimizer step across all devices.
    pub fn tokens_per_step(&self) -> u64 {
        (self.device_count * self.per_device_batch_size * self.gradient_accumulation_steps)
            as u64
            * self.context_length as u64
    }

    /// Derive the step schedule.
    ///
    /// ## Returns
    /// A `Result` with the derived [`TrainPlan`]; any zero geometry
    /// factor or zero budget is an error.
    pub fn init(self) -> CPResult<TrainPlan> {
        if self.token_budget == 0 {
            return Err(CtxpackError::InvalidPlan("token budget is zero".to_string()));
        }

        let tokens_per_step = self.tokens_per_step();
        if tokens_per_step == 0 {
            return Err(CtxpackError::InvalidPlan(
                "batch geometry has a zero factor".to_string(),
            ));
        }

        let max_steps = self.token_budget / tokens_per_step;
        if max_steps == 0 {
            return Err(CtxpackError::InvalidPlan(
                "token budget is smaller than one step".to_string(),
            ));
        }

        // Checkpoint ~48 times and evaluate ~24 times over the run.
        let save_steps = max_steps / 48 + 1;
        let eval_steps = max_steps / 24 + 1;

        let warmup_steps = (max_steps as f64 * 0.05) as u64;

        Ok(TrainPlan {
            max_steps,
            warmup_steps,
            save_steps,
            eval_steps,
            learning_rate: self.learning_rate,
            lr_scheduler: "constant_with_warmup".to_string(),
            save_total_limit: 5,
            options: self,
        })
    }
}

/// A derived step schedule for the external training loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainPlan {
    /// Total optimizer steps.
    pub max_steps: u64,

    /// Learning-rate warmup steps (5% of the run).
    pub warmup_steps: u64,

    /// Checkpoint cadence in steps.
    pub save_steps: u64,

    /// Evaluation cadence in steps.
    pub eval_steps: u64,

    /// Optimizer learning rate.
    pub learning_rate: f64,

    /// Learning-rate scheduler label.
    pub lr_scheduler: String,

    /// Maximum number of retained checkpoints.
    pub save_total_limit: u64,

    /// The options the plan was derived from.
    pub options: TrainPlanOptions,
}

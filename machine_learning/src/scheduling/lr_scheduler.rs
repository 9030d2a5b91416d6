use std::f64::consts::PI;

use comms::specs::machine_learning::{CosineSpec, MultiStepSpec, SolverSpec};
use log::info;

use crate::{MlErr, Result, dataset::DatasetKind, optimization::Optimizer};

/// Piecewise constant decay.
///
/// The rate is only recomputed at the first batch of an epoch, any other batch keeps the rate the
/// optimizer already has.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiStep {
    base_lr: f64,
    stages: Vec<usize>,
    rate: f64,
}

impl MultiStep {
    /// Creates a new `MultiStep` schedule.
    ///
    /// # Arguments
    /// * `base_lr` - The rate before any stage is exceeded.
    /// * `stages` - Epoch thresholds.
    /// * `rate` - The decay factor applied once per threshold the epoch has strictly exceeded.
    pub fn new(base_lr: f64, stages: Vec<usize>, rate: f64) -> Self {
        Self {
            base_lr,
            stages,
            rate,
        }
    }

    pub fn learning_rate(&self, epoch: usize, batch_index: usize, current_lr: f64) -> f64 {
        if batch_index != 0 {
            return current_lr;
        }

        let exceeded = self.stages.iter().filter(|&&stage| epoch > stage).count();
        self.base_lr * self.rate.powi(exceeded as i32)
    }
}

/// Linear warmup followed by cosine annealing, recomputed every batch.
#[derive(Debug, Clone, PartialEq)]
pub struct WarmupCosine {
    base_lr: f64,
    floor_lr: f64,
    batches_per_epoch: usize,
    warmup_batches: usize,
    annealing_batches: usize,
}

impl WarmupCosine {
    /// Creates a new `WarmupCosine` schedule.
    ///
    /// # Arguments
    /// * `base_lr` - The rate reached at the end of the warmup.
    /// * `end_rate_fraction` - The final rate as a fraction of `base_lr`.
    /// * `warmup_epochs` - The amount of epochs the linear warmup lasts.
    /// * `total_epochs` - The amount of epochs of the whole training.
    /// * `batches_per_epoch` - The amount of batches in every epoch.
    ///
    /// # Returns
    /// The schedule, or an error if the annealing phase would be empty.
    pub fn new(
        base_lr: f64,
        end_rate_fraction: f64,
        warmup_epochs: usize,
        total_epochs: usize,
        batches_per_epoch: usize,
    ) -> Result<Self> {
        if total_epochs <= warmup_epochs {
            return Err(MlErr::InvalidSchedule(format!(
                "the warmup ({warmup_epochs} epochs) must be shorter than the training ({total_epochs} epochs)"
            )));
        }

        if batches_per_epoch == 0 {
            return Err(MlErr::InvalidSchedule(
                "an epoch must have at least one batch".to_string(),
            ));
        }

        Ok(Self {
            base_lr,
            floor_lr: base_lr * end_rate_fraction,
            batches_per_epoch,
            warmup_batches: batches_per_epoch * warmup_epochs,
            annealing_batches: batches_per_epoch * (total_epochs - warmup_epochs),
        })
    }

    /// The rate for batch `batch_index` of `epoch`.
    ///
    /// Epochs start at 1. Epoch 0 panics in debug builds and is read as epoch 1 otherwise.
    pub fn learning_rate(&self, epoch: usize, batch_index: usize) -> f64 {
        debug_assert!(epoch > 0, "WarmupCosine: epochs are 1-indexed, got {epoch}");

        let global_batch = epoch.saturating_sub(1) * self.batches_per_epoch + batch_index;

        if global_batch < self.warmup_batches {
            return self.base_lr / self.warmup_batches as f64 * (global_batch + 1) as f64;
        }

        let progress = (global_batch - self.warmup_batches) as f64 / self.annealing_batches as f64;
        ((progress * PI).cos() + 1.0) * 0.5 * (self.base_lr - self.floor_lr) + self.floor_lr
    }

    pub fn batches_per_epoch(&self) -> usize {
        self.batches_per_epoch
    }

    pub fn warmup_batches(&self) -> usize {
        self.warmup_batches
    }

    /// The amount of batches in the whole training, warmup included.
    pub fn total_batches(&self) -> usize {
        self.warmup_batches + self.annealing_batches
    }
}

/// A learning rate schedule.
#[derive(Debug, Clone, PartialEq)]
pub enum LrScheduler {
    MultiStep(MultiStep),
    Cosine(WarmupCosine),
}

impl LrScheduler {
    /// Builds a scheduler following a solver spec.
    ///
    /// The dataset type is only looked up by schedules that need the epoch length.
    ///
    /// # Arguments
    /// * `spec` - The specification for the solver.
    ///
    /// # Returns
    /// The scheduler, or a configuration error if the schedule type or the dataset type is
    /// unknown, or the selected schedule is missing its section.
    pub fn from_spec(spec: &SolverSpec) -> Result<Self> {
        let schedule = &spec.schedule;

        let scheduler = match schedule.kind.as_str() {
            "MULTISTEP" => Self::resolve_multistep(spec, schedule.multistep.as_ref())?,
            "COSINE" => Self::resolve_cosine(spec, schedule.cosine.as_ref())?,
            other => return Err(MlErr::UnknownSchedule(other.to_string())),
        };

        info!("built {} learning rate scheduler", schedule.kind);
        Ok(scheduler)
    }

    fn resolve_multistep(spec: &SolverSpec, section: Option<&MultiStepSpec>) -> Result<Self> {
        let section = section.ok_or_else(|| {
            MlErr::InvalidSchedule("MULTISTEP needs a `multistep` section".to_string())
        })?;

        let schedule = MultiStep::new(spec.base_lr, section.stages.clone(), section.rate);
        Ok(Self::MultiStep(schedule))
    }

    fn resolve_cosine(spec: &SolverSpec, section: Option<&CosineSpec>) -> Result<Self> {
        let section = section.ok_or_else(|| {
            MlErr::InvalidSchedule("COSINE needs a `cosine` section".to_string())
        })?;

        let dataset: DatasetKind = spec.dataset_type.parse()?;
        let batches_per_epoch = dataset.batches_per_epoch(spec.batch_size);

        let schedule = WarmupCosine::new(
            spec.base_lr,
            section.end_rate_fraction,
            section.warmup_epochs,
            spec.epochs.get(),
            batches_per_epoch,
        )?;

        Ok(Self::Cosine(schedule))
    }

    /// The configured base rate, the one optimizers are usually created with.
    pub fn base_lr(&self) -> f64 {
        match self {
            LrScheduler::MultiStep(schedule) => schedule.base_lr,
            LrScheduler::Cosine(schedule) => schedule.base_lr,
        }
    }

    /// Computes the learning rate for a position in training.
    ///
    /// # Arguments
    /// * `epoch` - The current epoch, starting at 1. Cosine schedules read epoch 0 as epoch 1 in
    ///   release builds and panic on it in debug builds.
    /// * `batch_index` - The index of the batch within the epoch, starting at 0.
    /// * `current_lr` - The rate the optimizer holds right now.
    ///
    /// # Returns
    /// The rate to train the batch with.
    pub fn learning_rate(&self, epoch: usize, batch_index: usize, current_lr: f64) -> f64 {
        match self {
            LrScheduler::MultiStep(schedule) => {
                schedule.learning_rate(epoch, batch_index, current_lr)
            }
            LrScheduler::Cosine(schedule) => schedule.learning_rate(epoch, batch_index),
        }
    }

    /// Computes the learning rate for a position in training and writes it into every
    /// parameter group.
    ///
    /// The current rate is read from the first group. Groups store `f32`, so the rate is rounded
    /// before it's written.
    ///
    /// # Returns
    /// The rate as stored in the groups.
    pub fn adjust<O: Optimizer>(
        &self,
        epoch: usize,
        batch_index: usize,
        param_groups: &mut [O],
    ) -> f64 {
        let current_lr = param_groups
            .first()
            .map_or(self.base_lr(), |group| f64::from(group.learning_rate()));

        let lr = self.learning_rate(epoch, batch_index, current_lr) as f32;

        for group in param_groups.iter_mut() {
            group.set_learning_rate(lr);
        }

        f64::from(lr)
    }
}

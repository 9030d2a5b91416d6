use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// The specification for the `MultiStep` schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiStepSpec {
    /// Epoch thresholds, the rate decays once per threshold the epoch has strictly exceeded.
    pub stages: Vec<usize>,
    /// The decay factor applied per exceeded stage.
    pub rate: f64,
}

/// The specification for the `WarmupCosine` schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosineSpec {
    pub warmup_epochs: usize,
    /// The final learning rate as a fraction of the base one.
    pub end_rate_fraction: f64,
}

/// The specification for the `LrScheduler` variant.
///
/// `kind` selects which of the sections is used, the other one may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub multistep: Option<MultiStepSpec>,
    #[serde(default)]
    pub cosine: Option<CosineSpec>,
}

/// The solver section of a training config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverSpec {
    pub base_lr: f64,
    pub batch_size: NonZeroUsize,
    /// Total amount of training epochs.
    pub epochs: NonZeroUsize,
    pub dataset_type: String,
    pub schedule: ScheduleSpec,
}

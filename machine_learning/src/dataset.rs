use std::{
    fmt::{self, Display},
    num::NonZeroUsize,
    str::FromStr,
};

use crate::MlErr;

/// The training datasets a schedule can be sized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    ImageNet,
    Cifar100,
}

impl DatasetKind {
    /// The amount of training samples.
    pub fn size(self) -> usize {
        match self {
            DatasetKind::ImageNet => 1_281_167,
            DatasetKind::Cifar100 => 50_000,
        }
    }

    /// The amount of batches in one epoch, counting a trailing partial batch.
    pub fn batches_per_epoch(self, batch_size: NonZeroUsize) -> usize {
        self.size().div_ceil(batch_size.get())
    }
}

impl FromStr for DatasetKind {
    type Err = MlErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "imagenet" => Ok(DatasetKind::ImageNet),
            "cifar100" => Ok(DatasetKind::Cifar100),
            other => Err(MlErr::UnknownDataset(other.to_string())),
        }
    }
}

impl Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DatasetKind::ImageNet => "imagenet",
            DatasetKind::Cifar100 => "cifar100",
        };

        f.write_str(s)
    }
}

mod accuracy;
mod running_stat;

use ndarray::{ArrayView1, ArrayView2};

use crate::{MlErr, Result};

pub use accuracy::top_k_accuracy;
pub use running_stat::RunningStat;

/// Checks that `scores` and `targets` describe the same non empty batch and that every label
/// names one of the score columns.
pub(crate) fn check_batch(scores: ArrayView2<f32>, targets: ArrayView1<usize>) -> Result<()> {
    let (batch, classes) = scores.dim();

    if batch != targets.len() {
        return Err(MlErr::SizeMismatch {
            a: "scores",
            b: "targets",
            got: batch,
            expected: targets.len(),
        });
    }

    if batch == 0 {
        return Err(MlErr::EmptyBatch);
    }

    match targets.iter().find(|&&label| label >= classes) {
        Some(&label) => Err(MlErr::LabelOutOfRange { label, classes }),
        None => Ok(()),
    }
}

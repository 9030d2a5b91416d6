use ndarray::{ArrayView1, ArrayView2};

use super::LossFn;
use crate::{Result, metrics::check_batch};

/// Cross entropy between the softmax of the logits and the one hot encoded labels.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrossEntropy;

impl CrossEntropy {
    /// Returns a new `CrossEntropy`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for CrossEntropy {
    fn loss(&self, logits: ArrayView2<f32>, targets: ArrayView1<usize>) -> Result<f32> {
        check_batch(logits, targets)?;

        let total: f64 = logits
            .outer_iter()
            .zip(targets)
            .map(|(row, &target)| {
                // Shifting by the max keeps `exp` from overflowing.
                let max = row.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
                let sum_exp: f32 = row.iter().map(|&x| (x - max).exp()).sum();
                f64::from(max + sum_exp.ln() - row[target])
            })
            .sum();

        Ok((total / targets.len() as f64) as f32)
    }
}

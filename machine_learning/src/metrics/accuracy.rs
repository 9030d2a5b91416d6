use std::cmp::Ordering;

use ndarray::{ArrayView1, ArrayView2};

use super::check_batch;
use crate::{MlErr, Result};

/// Computes the top-k accuracy of `scores` for each k in `ks`.
///
/// A sample counts as correct for a given k when its label is among the k highest scoring
/// classes. Equal scores are ranked by class index, the lowest index first. Scores are ordered
/// with `f32::total_cmp`, so a NaN ranks above every number.
///
/// # Arguments
/// * `scores` - The class scores, one row per sample.
/// * `targets` - The true label of each sample.
/// * `ks` - The k values to evaluate.
///
/// # Returns
/// The percentage (0 to 100) of correct samples for each k, in the order of `ks`.
pub fn top_k_accuracy(
    scores: ArrayView2<f32>,
    targets: ArrayView1<usize>,
    ks: &[usize],
) -> Result<Vec<f32>> {
    check_batch(scores, targets)?;

    let (batch, classes) = scores.dim();
    if let Some(&k) = ks.iter().find(|&&k| k == 0 || k > classes) {
        return Err(MlErr::InvalidTopK { k, classes });
    }

    let ranks: Vec<usize> = scores
        .outer_iter()
        .zip(targets)
        .map(|(row, &target)| target_rank(row, target))
        .collect();

    let scale = 100.0 / batch as f32;
    let accuracies = ks
        .iter()
        .map(|&k| ranks.iter().filter(|&&rank| rank < k).count() as f32 * scale)
        .collect();

    Ok(accuracies)
}

/// The zero based position of `target` once the row is sorted by descending score.
fn target_rank(row: ArrayView1<f32>, target: usize) -> usize {
    let score = row[target];

    row.iter()
        .enumerate()
        .filter(|&(class, s)| match s.total_cmp(&score) {
            Ordering::Greater => true,
            Ordering::Equal => class < target,
            Ordering::Less => false,
        })
        .count()
}

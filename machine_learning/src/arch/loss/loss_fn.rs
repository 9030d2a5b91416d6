use ndarray::{ArrayView1, ArrayView2};

use crate::Result;

pub trait LossFn {
    /// The mean loss of a batch of logits against their labels.
    fn loss(&self, logits: ArrayView2<f32>, targets: ArrayView1<usize>) -> Result<f32>;
}

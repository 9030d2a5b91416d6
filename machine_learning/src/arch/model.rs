use std::ops::{Deref, DerefMut};

use ndarray::{Array2, ArrayViewD};

use crate::Result;

/// The behaviour a model runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    /// Evaluation behaviour with gradient tracking disabled.
    Inference,
}

/// A classifier, consumed as an opaque function from inputs to logits.
pub trait Model {
    /// Makes a forward pass through the model.
    ///
    /// # Arguments
    /// * `x` - A batch of inputs, the first axis is the batch axis.
    ///
    /// # Returns
    /// The logits, one row per sample and one column per class.
    fn forward(&mut self, x: ArrayViewD<f32>) -> Result<Array2<f32>>;

    fn mode(&self) -> Mode;

    fn set_mode(&mut self, mode: Mode);
}

/// Keeps a model in `Mode::Inference` while alive.
///
/// The previous mode is restored on drop, so an early return or an error can't leave the model
/// without gradient tracking.
pub struct InferenceGuard<'m, M: Model + ?Sized> {
    model: &'m mut M,
    previous: Mode,
}

impl<'m, M: Model + ?Sized> InferenceGuard<'m, M> {
    pub fn new(model: &'m mut M) -> Self {
        let previous = model.mode();
        model.set_mode(Mode::Inference);
        Self { model, previous }
    }
}

impl<M: Model + ?Sized> Deref for InferenceGuard<'_, M> {
    type Target = M;

    fn deref(&self) -> &Self::Target {
        self.model
    }
}

impl<M: Model + ?Sized> DerefMut for InferenceGuard<'_, M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.model
    }
}

impl<M: Model + ?Sized> Drop for InferenceGuard<'_, M> {
    fn drop(&mut self) {
        self.model.set_mode(self.previous);
    }
}

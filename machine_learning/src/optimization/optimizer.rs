/// The learning rate of one parameter group of an externally owned optimizer.
///
/// Parameter updates stay with the optimizer's owner. A model split in several groups is handed
/// over as a slice, one instance per group. Rates are stored as `f32`.
pub trait Optimizer {
    fn learning_rate(&self) -> f32;

    fn set_learning_rate(&mut self, learning_rate: f32);
}

impl<T: Optimizer + ?Sized> Optimizer for Box<T> {
    fn learning_rate(&self) -> f32 {
        (**self).learning_rate()
    }

    fn set_learning_rate(&mut self, learning_rate: f32) {
        (**self).set_learning_rate(learning_rate)
    }
}

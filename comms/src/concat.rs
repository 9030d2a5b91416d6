use ndarray::{Array, Axis, RemoveAxis};

use crate::Result;

/// Values that can be joined end to end after a gather round.
///
/// `parts` always comes in ascending rank order and is never empty.
pub trait Concat: Sized {
    fn concat(parts: Vec<Self>) -> Result<Self>;
}

impl<T> Concat for Vec<T> {
    fn concat(parts: Vec<Self>) -> Result<Self> {
        Ok(parts.into_iter().flatten().collect())
    }
}

/// Arrays are joined along their first axis, the batch axis.
impl<A, D> Concat for Array<A, D>
where
    A: Clone,
    D: RemoveAxis,
{
    fn concat(parts: Vec<Self>) -> Result<Self> {
        let views: Vec<_> = parts.iter().map(|part| part.view()).collect();
        Ok(ndarray::concatenate(Axis(0), &views)?)
    }
}

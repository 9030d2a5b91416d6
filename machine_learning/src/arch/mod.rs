pub mod loss;
mod model;

pub use model::{InferenceGuard, Mode, Model};

pub mod checkpoint;
pub mod error;
mod evaluator;
pub mod progress;

pub use error::{Result, WorkerErr};
pub use evaluator::{EvalSummary, Evaluator};

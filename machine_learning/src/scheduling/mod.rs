//! Learning rate scheduling.
//!
//! [`LrScheduler`] maps a position in training, `(epoch, batch_index)`, to a learning rate:
//!
//! - [`MultiStep`]: piecewise constant, decays by a fixed factor once per exceeded stage.
//! - [`WarmupCosine`]: linear warmup followed by cosine annealing down to a floor rate.
//!
//! Epochs are 1-indexed and batch indices 0-indexed within their epoch. The schedulers never
//! touch an optimizer on their own; [`LrScheduler::adjust`] is the one place where a computed
//! rate is written into the caller's parameter groups.

mod lr_scheduler;

pub use lr_scheduler::{LrScheduler, MultiStep, WarmupCosine};

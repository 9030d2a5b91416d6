mod concat;
mod error;
mod gather;
pub mod specs;

pub use concat::Concat;
pub use error::{GatherErr, Result};
pub use gather::{Gatherer, group};

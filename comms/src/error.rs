use std::{
    error::Error,
    fmt::{self, Display},
};

use ndarray::ShapeError;

/// The result type used by the collective operations.
pub type Result<T> = std::result::Result<T, GatherErr>;

/// Failures of a gather round.
#[derive(Debug)]
pub enum GatherErr {
    /// The contributed values can't be joined, e.g. logits with different class counts.
    Shape(ShapeError),
    /// The value deposited by `rank` is not of the type the caller asked for.
    TypeMismatch { rank: usize },
}

impl Display for GatherErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatherErr::Shape(e) => write!(f, "can't concatenate the gathered values: {e}"),
            GatherErr::TypeMismatch { rank } => write!(
                f,
                "rank {rank} contributed a value of a different type to the gather round"
            ),
        }
    }
}

impl Error for GatherErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GatherErr::Shape(e) => Some(e),
            GatherErr::TypeMismatch { .. } => None,
        }
    }
}

impl From<ShapeError> for GatherErr {
    fn from(value: ShapeError) -> Self {
        Self::Shape(value)
    }
}

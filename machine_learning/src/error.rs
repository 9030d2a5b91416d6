use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    SizeMismatch {
        a: &'static str,
        b: &'static str,
        got: usize,
        expected: usize,
    },
    EmptyBatch,
    LabelOutOfRange {
        label: usize,
        classes: usize,
    },
    InvalidTopK {
        k: usize,
        classes: usize,
    },
    UnknownSchedule(String),
    UnknownDataset(String),
    InvalidSchedule(String),
    /// The model failed during its forward pass.
    Model(String),
}

impl MlErr {
    /// Whether this error comes from a bad configuration rather than from the data.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            MlErr::UnknownSchedule(_) | MlErr::UnknownDataset(_) | MlErr::InvalidSchedule(_)
        )
    }
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MlErr::SizeMismatch {
                a,
                b,
                got,
                expected,
            } => {
                format!(
                    "There's a size mismatch between {a} and {b}, got {got} and expected {expected}"
                )
            }
            MlErr::EmptyBatch => "Can't compute metrics over an empty batch".to_string(),
            MlErr::LabelOutOfRange { label, classes } => {
                format!("The label {label} is out of range for {classes} classes")
            }
            MlErr::InvalidTopK { k, classes } => {
                format!("Can't compute top-{k} accuracy over {classes} classes")
            }
            MlErr::UnknownSchedule(kind) => format!("Unknown learning rate schedule type {kind:?}"),
            MlErr::UnknownDataset(name) => format!("Unknown dataset type {name:?}"),
            MlErr::InvalidSchedule(detail) => format!("Invalid learning rate schedule: {detail}"),
            MlErr::Model(detail) => format!("The model failed: {detail}"),
        };

        write!(f, "{s}")
    }
}

impl Error for MlErr {}

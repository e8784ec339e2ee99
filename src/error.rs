use thiserror::Error;

/// Errors raised while assembling or evaluating a thermal network.
#[derive(Debug, Error)]
pub enum ThermalError {
    #[error("size mismatch in {what}: expected {expected}, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("index {index} out of range for {what} of length {len}")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("dimension of '{0}' is smaller than the length tolerance")]
    InsufficientDimension(String),

    #[error("'{first}' collides with '{second}'")]
    Collision { first: String, second: String },

    #[error("conductivity row {row} contains index {index} twice")]
    ConductivityIndexTwice { row: usize, index: usize },

    #[error("self conductivity of element {row} is not negative ({value})")]
    SelfConductivityNotNegative { row: usize, value: f64 },

    #[error("conductivity between elements {row} and {index} is not positive ({value})")]
    ConductivityNotPositive { row: usize, index: usize, value: f64 },

    #[error("conductivity between elements {row} and {index} is not finite ({value})")]
    ConductivityNotFinite { row: usize, index: usize, value: f64 },

    #[error("overlapping area exceeds the surface area of element {element} by {excess}")]
    OverlapBiggerThanArea { element: usize, excess: f64 },

    #[error("surface area of element {element} found twice in one convection cluster")]
    AreaFoundTwice { element: usize },

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("no thermal elements to probe")]
    NoElements,

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ThermalError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ThermalError>;

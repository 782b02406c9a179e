use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    /// A parameter was outside its accepted range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An attribute was read before anything wrote it. Usually means an
    /// algorithm ran without its initialization step.
    #[error("label '{label}' has no attribute '{key}'")]
    MissingAttribute { key: String, label: String },

    #[error("attribute '{key}' holds {found}, expected {expected}")]
    AttributeType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("node '{0}' not found")]
    UnknownNode(String),

    /// The superstep bound was reached while some nodes were still active.
    #[error("{algorithm} did not converge after {supersteps} supersteps ({active} nodes still active)")]
    NotConverged {
        algorithm: &'static str,
        supersteps: u32,
        active: usize,
    },

    #[error("motif parse error in '{pattern}': {reason}")]
    MotifParse { pattern: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

impl GraphError {
    pub(crate) fn motif(pattern: &str, reason: impl Into<String>) -> Self {
        GraphError::MotifParse {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

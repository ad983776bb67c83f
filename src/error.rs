use thiserror::Error;

/// Result type for centrality operations
pub type Result<T> = std::result::Result<T, CentralityError>;

/// Errors that can occur during graph construction or centrality calculations
#[derive(Error, Debug)]
pub enum CentralityError {
    #[error("Graph has no nodes")]
    EmptyGraph,

    #[error("Invalid algorithm parameter: {message}")]
    InvalidParameter { message: String },
}

impl CentralityError {
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }
}

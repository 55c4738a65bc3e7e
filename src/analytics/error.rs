use thiserror::Error;

/// Failure taxonomy for the analytics layer.
///
/// `InvalidParameter` is raised before any data is touched; the other two
/// mean a computation was abandoned whole (no partial results).
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("data access error: {0}")]
    DataAccess(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("computation error: {0}")]
    Computation(String),
}

impl StatsError {
    pub fn invalid_parameter<S: Into<String>>(message: S) -> Self {
        StatsError::InvalidParameter(message.into())
    }
}

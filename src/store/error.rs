use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("group {0} not found")]
    NotFound(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    /// Input that is dropped without complaint, such as a blank title.
    #[error("ignored: {0}")]
    ValidationIgnored(&'static str),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("store service stopped")]
    ServiceStopped,
}

impl StoreError {
    pub fn storage(err: anyhow::Error) -> Self {
        StoreError::StorageUnavailable(format!("{err:#}"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

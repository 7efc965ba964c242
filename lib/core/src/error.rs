use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Model build failed: {0}")]
    ModelBuild(String),

    #[error("Model does not match catalog: expected {expected} items, model has {actual}")]
    ModelMismatch { expected: usize, actual: usize },

    #[error("Model fingerprint does not match catalog: {0}")]
    FingerprintMismatch(String),

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Oracle error: {0}")]
    Oracle(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether the error means the persisted model cannot serve this catalog.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Error::ModelMismatch { .. } | Error::FingerprintMismatch(_))
    }
}

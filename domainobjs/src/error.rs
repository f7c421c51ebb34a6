use maci_crypto::{CryptoError, TreeError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainObjsError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Binary layout mismatch: expected {expected} bytes, wrote {actual}")]
    BufferLayout { expected: usize, actual: usize },
}

impl From<serde_json::Error> for DomainObjsError {
    fn from(err: serde_json::Error) -> Self {
        DomainObjsError::Serialization(err.to_string())
    }
}

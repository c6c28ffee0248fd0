use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    /// The secure random source could not supply bytes. Not retried.
    #[error("secure random source failed: {0}")]
    EntropyFailure(String),

    #[error("invalid key format: {reason}")]
    InvalidKeyFormat { reason: String },
}

impl KeyError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidKeyFormat {
            reason: reason.into(),
        }
    }
}

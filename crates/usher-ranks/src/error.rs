use thiserror::Error;
use usher_cache::{CacheError, StoreError};

/// Errors produced by the promotion engine.
#[derive(Debug, Error)]
pub enum RankError {
    /// A settings or invite-count lookup failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Loading rank definitions failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The chat gateway refused a role mutation or an announcement.
    #[error("gateway error: {message}")]
    Gateway { message: String },
}

impl RankError {
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RankError>;

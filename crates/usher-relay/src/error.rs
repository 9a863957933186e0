use thiserror::Error;

/// Errors produced by the relay layer.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The broker rejected an operation or the connection is gone.
    #[error("broker error: {message}")]
    Broker {
        message: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A wire payload could not be decoded.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// The gateway refused or failed a delegated action.
    #[error("gateway error: {message}")]
    Gateway { message: String },
}

impl RelayError {
    pub fn broker(message: impl Into<String>) -> Self {
        Self::Broker {
            message: message.into(),
            cause: None,
        }
    }

    pub fn broker_with(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Broker {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
        }
    }

    /// True when retrying against the broker may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Broker { .. })
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

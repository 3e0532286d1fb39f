use thiserror::Error;

use crate::error_codes::{self, ErrorCategory};

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Failed to reach remote process: {0}")]
    ConnectionFailed(#[from] std::io::Error),

    #[error("Failed to serialize command: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Remote error ({code}): {message}")]
    Remote { code: i32, message: String },

    #[error("Remote request timed out after {0} ms")]
    Timeout(u64),

    #[error("Remote execution channel is closed")]
    Closed,

    #[error("Invalid response from remote process")]
    InvalidResponse,
}

impl ChannelError {
    pub fn remote(code: i32, message: impl Into<String>) -> Self {
        ChannelError::Remote {
            code,
            message: message.into(),
        }
    }

    /// JSON-RPC code of a remote failure.
    pub fn code(&self) -> Option<i32> {
        match self {
            ChannelError::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The remote side's own message when there is one, so wrappers can add
    /// context without nesting a second prefix.
    pub fn message(&self) -> String {
        match self {
            ChannelError::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ChannelError::Remote { code, .. } => error_codes::category_for_code(*code),
            ChannelError::Timeout(_) => ErrorCategory::Timeout,
            ChannelError::SerializationFailed(_) | ChannelError::InvalidResponse => {
                ErrorCategory::Internal
            }
            ChannelError::ConnectionFailed(_) | ChannelError::Closed => ErrorCategory::External,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ChannelError::Remote { code, .. } => error_codes::is_retryable(*code),
            ChannelError::Timeout(_) | ChannelError::ConnectionFailed(_) => true,
            _ => false,
        }
    }

    pub fn is_not_mocked(&self) -> bool {
        self.code() == Some(error_codes::NOT_MOCKED)
    }
}

use deeptree_core::ReactiveError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DemoError>;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("propagation error: {0}")]
    Reactive(#[from] ReactiveError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid trigger `{input}`: {reason}")]
    Trigger { input: String, reason: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("failed to install log subscriber: {message}")]
    Logging { message: String },
}

impl DemoError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Trigger { .. } | Self::InvalidArgument { .. } => 2,
            Self::Reactive(_) => 3,
            Self::Json(_) | Self::Logging { .. } => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn trigger(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Trigger {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

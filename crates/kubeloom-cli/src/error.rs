//! Error types for the CLI

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Engine(#[from] kubeloom_core::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("command failed: {message}")]
    CommandFailed { message: String },
}

impl Error {
    pub fn command_failed(message: impl Into<String>) -> Self {
        Error::CommandFailed {
            message: message.into(),
        }
    }
}

impl From<kubeloom_core::Rejection> for Error {
    fn from(rejection: kubeloom_core::Rejection) -> Self {
        Error::Engine(rejection.into())
    }
}

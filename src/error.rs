use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("session lookup collision")]
    SessionLookupCollision,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate(message.into())
    }

    /// Short message safe to show to clients. Storage and internal details
    /// are collapsed into a generic message.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Error::NotFound => "Not found".to_string(),
            Error::Duplicate(message)
            | Error::Validation(message)
            | Error::Forbidden(message) => message.clone(),
            Error::Unauthenticated => "Authentication required".to_string(),
            Error::Database(_)
            | Error::SessionLookupCollision
            | Error::Io(_)
            | Error::Config(_)
            | Error::Internal(_) => "Internal server error".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

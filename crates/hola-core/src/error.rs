//! Shared error type across hola crates.

use thiserror::Error;

/// Stable error codes, used in logs and by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed input (exposition text).
    BadRequest,
    /// Socket or filesystem failure.
    Io,
    /// Programmer fault, e.g. a bad metric registration.
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Io => "IO",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, HolaError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum HolaError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("io: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("internal: {0}")]
    Internal(String),
}

impl HolaError {
    /// Wrap an `io::Error` with a short description of what was attempted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        HolaError::Io { context: context.into(), source }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            HolaError::BadRequest(_) => ErrorCode::BadRequest,
            HolaError::Io { .. } => ErrorCode::Io,
            HolaError::Internal(_) => ErrorCode::Internal,
        }
    }
}

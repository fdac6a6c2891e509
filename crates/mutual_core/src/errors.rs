use std::fmt;
use std::io;

use thiserror::Error;

/// Coarse classification of a failed listing call, decided once by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The caller may not view the account's listing (HTTP 401, protected account).
    AuthorizationDenied,
    Transport,
    Protocol,
    Other,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ApiErrorKind::AuthorizationDenied => "authorization denied",
            ApiErrorKind::Transport => "transport",
            ApiErrorKind::Protocol => "protocol",
            ApiErrorKind::Other => "api",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} error (HTTP {status}): {}", self.kind, self.message),
            None => write!(f, "{} error: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn new<T: Into<String>>(kind: ApiErrorKind, message: T) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn authorization_denied<T: Into<String>>(message: T) -> Self {
        Self::new(ApiErrorKind::AuthorizationDenied, message).with_status(401)
    }

    pub fn transport<T: Into<String>>(message: T) -> Self {
        Self::new(ApiErrorKind::Transport, message)
    }

    pub fn protocol<T: Into<String>>(message: T) -> Self {
        Self::new(ApiErrorKind::Protocol, message)
    }

    pub fn is_authorization_denied(&self) -> bool {
        self.kind == ApiErrorKind::AuthorizationDenied
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::protocol(err.to_string())
        } else {
            ApiError::transport(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum MutualError {
    #[error("remote listing failed: {0}")]
    Api(#[from] ApiError),
    #[error("invalid credentials file: {0}")]
    Credentials(String),
    #[error("invalid account identifier: {0}")]
    InvalidAccount(String),
    #[error("file operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("encoding conversion failed: {0}")]
    Encoding(String),
    #[error("unexpected error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("mutual following export failed: {0}")]
    Core(#[from] MutualError),
    #[error("{0}")]
    Context(String),
}

impl RunError {
    pub fn context<T: Into<String>>(self, message: T) -> Self {
        let message = message.into();
        match self {
            RunError::Core(err) => RunError::Context(format!("{message}: {err}")),
            RunError::Context(existing) => RunError::Context(format!("{message}: {existing}")),
        }
    }
}

impl From<ApiError> for RunError {
    fn from(err: ApiError) -> Self {
        RunError::Core(MutualError::Api(err))
    }
}

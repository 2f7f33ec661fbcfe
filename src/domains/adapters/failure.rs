//! Backend failures as seen at the adapter boundary.

use thiserror::Error;

use crate::domains::tools::{BackendClass, ToolError};

/// How a remote failure should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Rate limiting; retried with backoff.
    Throttled,
    /// Transient unavailability (connection limits, 5xx); retried with backoff.
    Unavailable,
    /// Credentials expired; the session is rebuilt once and the call retried.
    AuthExpired,
    NotFound,
    AccessDenied,
    BadRequest,
    Conflict,
    StatementTimeout,
    Other,
}

impl FailureClass {
    /// Whether the adapter retries this class internally.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Throttled | Self::Unavailable)
    }

    /// Fallback classification from an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::Throttled,
            500 | 502 | 503 | 504 => Self::Unavailable,
            404 => Self::NotFound,
            401 | 403 => Self::AccessDenied,
            409 => Self::Conflict,
            400..=499 => Self::BadRequest,
            _ => Self::Other,
        }
    }

    fn backend_class(&self) -> BackendClass {
        match self {
            Self::Throttled | Self::Unavailable => BackendClass::Unavailable,
            Self::AuthExpired | Self::AccessDenied => BackendClass::AccessDenied,
            Self::NotFound => BackendClass::NotFound,
            Self::BadRequest => BackendClass::BadRequest,
            Self::Conflict => BackendClass::Conflict,
            Self::StatementTimeout => BackendClass::StatementTimeout,
            Self::Other => BackendClass::Other,
        }
    }
}

/// A classified failure returned by a backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct BackendFailure {
    pub class: FailureClass,
    pub code: String,
    pub message: String,
}

impl BackendFailure {
    pub fn new(class: FailureClass, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FailureClass::NotFound, code, message)
    }

    pub fn throttled(message: impl Into<String>) -> Self {
        Self::new(FailureClass::Throttled, "ThrottlingException", message)
    }

    pub fn is_transient(&self) -> bool {
        self.class.is_transient()
    }
}

impl From<BackendFailure> for ToolError {
    fn from(failure: BackendFailure) -> Self {
        ToolError::backend(failure.class.backend_class(), failure.code, failure.message)
    }
}

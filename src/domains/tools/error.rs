//! Tool-specific error types.
//!
//! Every failure a tool call can end in is a [`ToolError`]. Each variant maps
//! onto exactly one [`ErrorKind`] of the closed taxonomy reported back to the
//! client inside a [`ErrorDescriptor`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed taxonomy of tool call failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    UnknownTool,
    ValidationError,
    ParameterTypeError,
    Throttled,
    TransactionStateError,
    Timeout,
    BackendError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownTool => "UnknownTool",
            Self::ValidationError => "ValidationError",
            Self::ParameterTypeError => "ParameterTypeError",
            Self::Throttled => "Throttled",
            Self::TransactionStateError => "TransactionStateError",
            Self::Timeout => "Timeout",
            Self::BackendError => "BackendError",
        }
    }
}

/// Classification of an opaque remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendClass {
    NotFound,
    AccessDenied,
    BadRequest,
    Conflict,
    Unavailable,
    StatementTimeout,
    Other,
}

impl BackendClass {
    /// Whether the caller may reasonably retry later.
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Unavailable | Self::StatementTimeout)
    }
}

/// What was wrong with a single argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Violation {
    Missing,
    WrongType { expected: String, found: String },
    Unexpected,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("required parameter is missing"),
            Self::WrongType { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::Unexpected => f.write_str("parameter is not accepted by this tool"),
        }
    }
}

/// Lifecycle state of a data API transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
    Expired,
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Committed => "committed",
            Self::RolledBack => "rolled back",
            Self::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    UnknownTool(String),

    /// An argument did not match the tool's parameter schema.
    #[error("Invalid argument '{parameter}': {violation}")]
    Validation {
        parameter: String,
        violation: Violation,
    },

    /// An argument could not be marshaled into the backend's representation.
    #[error("Cannot marshal parameter '{parameter}': {reason}")]
    ParameterType { parameter: String, reason: String },

    /// The backend kept throttling after every internal retry.
    #[error("Backend throttled the request after {attempts} attempts: {message}")]
    Throttled { attempts: u32, message: String },

    /// The statement targets a transaction that is no longer usable.
    #[error("Transaction {transaction_id} is {state}")]
    TransactionState {
        transaction_id: String,
        state: TransactionState,
    },

    /// The tool timed out during execution.
    #[error("Tool execution timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// The backend failed in a way that is not otherwise classified.
    #[error("Backend error ({code}): {message}")]
    Backend {
        class: BackendClass,
        code: String,
        message: String,
    },
}

impl ToolError {
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    pub fn validation(parameter: impl Into<String>, violation: Violation) -> Self {
        Self::Validation {
            parameter: parameter.into(),
            violation,
        }
    }

    pub fn parameter_type(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParameterType {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub fn backend(class: BackendClass, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            class,
            code: code.into(),
            message: message.into(),
        }
    }

    /// An internal failure with no better classification.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::backend(BackendClass::Other, "InternalError", message)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTool(_) => ErrorKind::UnknownTool,
            Self::Validation { .. } => ErrorKind::ValidationError,
            Self::ParameterType { .. } => ErrorKind::ParameterTypeError,
            Self::Throttled { .. } => ErrorKind::Throttled,
            Self::TransactionState { .. } => ErrorKind::TransactionStateError,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Backend { .. } => ErrorKind::BackendError,
        }
    }

    pub fn retryable(&self) -> bool {
        match self {
            Self::Throttled { .. } | Self::Timeout { .. } => true,
            Self::Backend { class, .. } => class.retryable(),
            _ => false,
        }
    }

    /// Build the client-facing description of this error.
    pub fn descriptor(&self) -> ErrorDescriptor {
        let (parameter, classification) = match self {
            Self::Validation { parameter, .. } | Self::ParameterType { parameter, .. } => {
                (Some(parameter.clone()), None)
            }
            Self::Backend { class, .. } => (None, Some(*class)),
            _ => (None, None),
        };
        let violation = match self {
            Self::Validation { violation, .. } => Some(violation.clone()),
            _ => None,
        };

        ErrorDescriptor {
            kind: self.kind(),
            message: self.to_string(),
            retryable: self.retryable(),
            parameter,
            violation,
            classification,
        }
    }
}

/// Error outcome carried by a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDescriptor {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<Violation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<BackendClass>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(ToolError::unknown_tool("x").kind(), ErrorKind::UnknownTool);
        assert_eq!(
            ToolError::validation("sql", Violation::Missing).kind(),
            ErrorKind::ValidationError
        );
        assert_eq!(
            ToolError::Timeout { after_ms: 10 }.kind(),
            ErrorKind::Timeout
        );
    }

    #[test]
    fn test_retryable_flags() {
        assert!(!ToolError::unknown_tool("x").retryable());
        assert!(ToolError::Throttled { attempts: 3, message: String::new() }.retryable());
        assert!(ToolError::Timeout { after_ms: 1 }.retryable());
        assert!(ToolError::backend(BackendClass::Unavailable, "503", "down").retryable());
        assert!(!ToolError::backend(BackendClass::NotFound, "NoSuchKey", "gone").retryable());
    }

    #[test]
    fn test_descriptor_carries_parameter_and_violation() {
        let descriptor = ToolError::validation(
            "bucket",
            Violation::WrongType {
                expected: "string".into(),
                found: "integer".into(),
            },
        )
        .descriptor();

        assert_eq!(descriptor.kind, ErrorKind::ValidationError);
        assert_eq!(descriptor.parameter.as_deref(), Some("bucket"));
        assert!(descriptor.message.contains("expected string, found integer"));

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["kind"], "ValidationError");
        assert_eq!(json["violation"]["type"], "wrong_type");
        assert!(json.get("classification").is_none());
    }

    #[test]
    fn test_descriptor_carries_backend_classification() {
        let json = serde_json::to_value(
            ToolError::backend(BackendClass::NotFound, "NoSuchKey", "missing").descriptor(),
        )
        .unwrap();
        assert_eq!(json["kind"], "BackendError");
        assert_eq!(json["classification"], "not_found");
        assert_eq!(json["retryable"], false);
    }
}

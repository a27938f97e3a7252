//! Core error types for Tessera.

use thiserror::Error;

/// Result type alias using `TesseraError`.
pub type TesseraResult<T> = std::result::Result<T, TesseraError>;

/// Core error type for node construction, translation and execution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TesseraError {
    /// A node field failed validation during construction.
    #[error("ValidationError: {node}.{field}: {reason}")]
    Validation {
        node: String,
        field: String,
        reason: String,
    },

    /// No translation rule is registered for a node kind or any of its ancestors.
    #[error("DispatchError: operation {node} is not defined for the {backend} backend")]
    Dispatch { node: String, backend: String },

    /// A field that the backend can only fold as a constant was given a computed expression.
    #[error("UnsupportedArgumentError: {node}.{field} must be a literal for the {backend} backend")]
    UnsupportedArgument {
        node: String,
        field: String,
        backend: String,
    },

    /// Target-specific structural restriction (non-equi join, bad selection element, ...).
    #[error("TranslationError: {0}")]
    Translation(String),

    /// Type mismatch or invalid type operation.
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Invalid value provided.
    #[error("ValueError: {0}")]
    ValueError(String),

    /// Schema-related error (column not found, duplicate names, ...).
    #[error("SchemaError: {0}")]
    SchemaError(String),

    /// Plan execution error.
    #[error("ExecutionError: {0}")]
    ExecutionError(String),

    /// Feature not yet implemented.
    #[error("NotImplemented: {0}")]
    NotImplemented(String),

    /// Internal error (bug in Tessera).
    #[error("InternalError: {0}")]
    InternalError(String),

    /// Arrow error.
    #[error("ArrowError: {0}")]
    ArrowError(#[from] arrow_schema::ArrowError),

    /// JSON serialization error.
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl TesseraError {
    /// Create a new validation error for `node.field`.
    pub fn validation<N, F, R>(node: N, field: F, reason: R) -> Self
    where
        N: Into<String>,
        F: Into<String>,
        R: Into<String>,
    {
        Self::Validation {
            node: node.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new dispatch error.
    pub fn dispatch<N: Into<String>, B: Into<String>>(node: N, backend: B) -> Self {
        Self::Dispatch {
            node: node.into(),
            backend: backend.into(),
        }
    }

    /// Create a new unsupported-argument error.
    pub fn unsupported_argument<N, F, B>(node: N, field: F, backend: B) -> Self
    where
        N: Into<String>,
        F: Into<String>,
        B: Into<String>,
    {
        Self::UnsupportedArgument {
            node: node.into(),
            field: field.into(),
            backend: backend.into(),
        }
    }

    /// Create a new `Translation` error.
    pub fn translation<S: Into<String>>(msg: S) -> Self {
        Self::Translation(msg.into())
    }

    /// Create a new `TypeError`.
    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a new `ValueError`.
    pub fn value_error<S: Into<String>>(msg: S) -> Self {
        Self::ValueError(msg.into())
    }

    /// Create a new `SchemaError`.
    pub fn schema_error<S: Into<String>>(msg: S) -> Self {
        Self::SchemaError(msg.into())
    }

    /// Create a new `ExecutionError`.
    pub fn execution<S: Into<String>>(msg: S) -> Self {
        Self::ExecutionError(msg.into())
    }

    /// Create a new `NotImplemented` error.
    pub fn not_implemented<S: Into<String>>(msg: S) -> Self {
        Self::NotImplemented(msg.into())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }

    /// Rewrite the node name carried by a validation error.
    ///
    /// Validators run without knowing which node they belong to; the
    /// signature fills the owner in once it catches the failure.
    #[must_use]
    pub fn with_node<S: Into<String>>(self, owner: S) -> Self {
        match self {
            Self::Validation { field, reason, .. } => Self::Validation {
                node: owner.into(),
                field,
                reason,
            },
            other => other,
        }
    }

    /// Whether this is a construction-time validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Ensure a condition holds, returning an `ExecutionError` if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::TesseraError::ExecutionError($msg.to_string()));
        }
    };
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::TesseraError::$variant(format!($($msg)*)));
        }
    };
}

/// Return early with a `TranslationError`.
#[macro_export]
macro_rules! translation_err {
    ($($arg:tt)*) => {
        return Err($crate::TesseraError::Translation(format!($($arg)*)))
    };
}

/// Return early with a `TypeError`.
#[macro_export]
macro_rules! type_err {
    ($($arg:tt)*) => {
        return Err($crate::TesseraError::TypeError(format!($($arg)*)))
    };
}

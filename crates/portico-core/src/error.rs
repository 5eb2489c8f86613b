//! Error types for Portico.
//!
//! Three error layers exist, matching the dispatch lifecycle:
//!
//! - [`ResolveError`]: a declared dependency type is bound nowhere in the
//!   injector delegation chain. Always fatal for the request being
//!   dispatched; there is no optional-dependency fallback.
//! - [`PorticoError`]: an application-level error reported by a handler.
//!   Routed to the configured error-handler service, never swallowed by
//!   the dispatch core.
//! - [`DispatchError`]: the union of the two, returned by the chain walk.
//!
//! Panics raised inside handlers are deliberately *not* caught here;
//! recovery belongs to a recovery middleware placed early in the chain.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type returned by chain handlers.
pub type HandlerResult = Result<(), DispatchError>;

/// Categories of application errors for classification and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or invalid request input.
    BadRequest,
    /// Resource not found.
    NotFound,
    /// Internal server errors.
    Internal,
    /// Request timeout.
    Timeout,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

/// Application-level error reported by a handler.
///
/// `PorticoError` provides structured errors with category classification,
/// HTTP status mapping, and a serializable envelope for responses.
///
/// # Example
///
/// ```
/// use portico_core::{ErrorCategory, PorticoError};
///
/// let err = PorticoError::not_found("no such user");
/// assert_eq!(err.category(), ErrorCategory::NotFound);
/// ```
#[derive(Error, Debug)]
pub enum PorticoError {
    /// Malformed or invalid request input.
    #[error("bad request: {message}")]
    BadRequest {
        /// Human-readable error message.
        message: String,
    },

    /// Resource not found.
    #[error("not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
        /// The resource that was not found, if known.
        resource: Option<String>,
    },

    /// Internal server error.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Request timeout.
    #[error("timeout: {message}")]
    Timeout {
        /// Human-readable error message.
        message: String,
    },
}

impl PorticoError {
    /// Creates a bad-request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            resource: None,
        }
    }

    /// Creates a not-found error naming the missing resource.
    #[must_use]
    pub fn not_found_resource(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self::NotFound {
            message: format!("{resource} not found"),
            resource: Some(resource),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error wrapping a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::BadRequest { .. } => ErrorCategory::BadRequest,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Internal { .. } => ErrorCategory::Internal,
            Self::Timeout { .. } => ErrorCategory::Timeout,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "BAD_REQUEST",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Internal { .. } => "INTERNAL_ERROR",
            Self::Timeout { .. } => "TIMEOUT",
        }
    }

    /// Converts this error to a serializable envelope.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }
}

/// Error when a declared dependency type cannot be resolved.
///
/// Raised by [`Injector::get`](crate::Injector::get) and friends after the
/// entire parent delegation chain has been exhausted.
#[derive(Debug, Clone, Error)]
#[error("failed to resolve {type_name}: {reason}")]
pub struct ResolveError {
    /// The type name that could not be resolved.
    pub type_name: &'static str,
    /// The reason for the failure.
    pub reason: String,
}

impl ResolveError {
    /// Creates a resolution error for an unbound service type.
    #[must_use]
    pub fn unresolved<T: ?Sized>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            reason: "no binding in injector chain".to_string(),
        }
    }

    /// Creates a resolution error with a custom reason.
    #[must_use]
    pub fn custom<T: ?Sized>(reason: impl Into<String>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }
}

/// Error produced while walking a handler chain.
///
/// Either flavor is fatal for the request being dispatched; the composing
/// application routes it to the configured error-handler service.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A declared handler parameter was unbound in the delegation chain.
    #[error(transparent)]
    Unresolved(#[from] ResolveError),

    /// A handler reported an application error.
    #[error(transparent)]
    Handler(#[from] PorticoError),
}

impl DispatchError {
    /// Collapses this error into the application error to report.
    ///
    /// Resolution failures become internal errors; handler-reported errors
    /// pass through unchanged.
    #[must_use]
    pub fn into_portico_error(self) -> PorticoError {
        match self {
            Self::Handler(err) => err,
            Self::Unresolved(err) => {
                PorticoError::internal_with_source("dependency resolution failed", err)
            }
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
}

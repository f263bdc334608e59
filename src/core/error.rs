//! Typed error handling for crudgate
//!
//! Errors fall into three families:
//!
//! - [`DispatchError`]: the terminal failure classes of a dispatched
//!   operation (disabled, not found, unauthorized, bad request, internal)
//! - [`ConfigError`]: configuration loading and registration-time problems
//! - [`PreservationError`]: failures of the immutable-field preservation engine
//!
//! [`CrudError`] wraps all of them so startup code can use a single `?` chain.
//!
//! # Example
//!
//! ```rust,ignore
//! use crudgate::prelude::*;
//!
//! let mut registry = ResourceRegistry::new(ApiConfig::default());
//! match registry.register("fish", FishProvider::new()) {
//!     Ok(()) => {}
//!     Err(CrudError::Config(ConfigError::DuplicateResource { token })) => {
//!         eprintln!("{} registered twice", token);
//!     }
//!     Err(e) => eprintln!("startup failed: {}", e),
//! }
//! ```

use crate::config::MessagesConfig;
use crate::core::outcome::OutcomeStatus;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The main error type for crudgate
#[derive(Debug)]
pub enum CrudError {
    /// Failure of a dispatched operation
    Dispatch(DispatchError),

    /// Configuration or registration errors
    Config(ConfigError),

    /// Immutable-field preservation errors
    Preservation(PreservationError),
}

impl fmt::Display for CrudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrudError::Dispatch(e) => write!(f, "{}", e),
            CrudError::Config(e) => write!(f, "{}", e),
            CrudError::Preservation(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CrudError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CrudError::Dispatch(e) => Some(e),
            CrudError::Config(e) => Some(e),
            CrudError::Preservation(e) => Some(e),
        }
    }
}

impl CrudError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            CrudError::Dispatch(e) => e.status().status_code(),
            CrudError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CrudError::Preservation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            CrudError::Dispatch(e) => e.error_code(),
            CrudError::Config(e) => e.error_code(),
            CrudError::Preservation(_) => "PRESERVATION_ERROR",
        }
    }
}

/// Standard payload for every non-success outcome, and for message-only
/// success outcomes such as a completed delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    /// HTTP status code, repeated in the body for machine parsing
    pub code: u16,
    /// Human-readable message
    pub message: String,
}

impl ApiMessage {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_u16(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Failure classes of a single dispatched operation.
///
/// Every variant is terminal: the dispatcher converts it into an outcome and
/// never retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The operation is not enabled for this resource type.
    /// Surfaced to clients exactly like an absent resource.
    Disabled {
        resource: &'static str,
        operation: &'static str,
    },

    /// No resource with this identifier exists
    NotFound { resource: &'static str, id: u64 },

    /// An authorization predicate (or hook) refused the caller
    Unauthorized { message: String },

    /// The request body could not be decoded into a resource
    MalformedBody,

    /// Client-correctable failure: validation, store-reported business error,
    /// missing record on update
    BadRequest { message: String },

    /// Contract violation or store failure. Never shown verbatim to clients.
    Internal { message: String },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Disabled {
                resource,
                operation,
            } => {
                write!(f, "{} is disabled for {}", operation, resource)
            }
            DispatchError::NotFound { resource, id } => {
                write!(f, "{} with ID {} not found", resource, id)
            }
            DispatchError::Unauthorized { message } => write!(f, "{}", message),
            DispatchError::MalformedBody => write!(f, "Malformed request body"),
            DispatchError::BadRequest { message } => write!(f, "{}", message),
            DispatchError::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for DispatchError {}

impl DispatchError {
    /// Outcome classification this error resolves to
    pub fn status(&self) -> OutcomeStatus {
        match self {
            DispatchError::Disabled { .. } => OutcomeStatus::NotFound,
            DispatchError::NotFound { .. } => OutcomeStatus::NotFound,
            DispatchError::Unauthorized { .. } => OutcomeStatus::Unauthorized,
            DispatchError::MalformedBody => OutcomeStatus::BadRequest,
            DispatchError::BadRequest { .. } => OutcomeStatus::BadRequest,
            DispatchError::Internal { .. } => OutcomeStatus::ServerError,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            // same code as NotFound so the two cannot be told apart
            DispatchError::Disabled { .. } => "NOT_FOUND",
            DispatchError::NotFound { .. } => "NOT_FOUND",
            DispatchError::Unauthorized { .. } => "UNAUTHORIZED",
            DispatchError::MalformedBody => "MALFORMED_BODY",
            DispatchError::BadRequest { .. } => "BAD_REQUEST",
            DispatchError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Message handed to the client for this error
    pub fn client_message(&self, messages: &MessagesConfig) -> String {
        match self {
            DispatchError::Disabled { .. } => messages.not_found.clone(),
            DispatchError::MalformedBody => messages.malformed_body.clone(),
            DispatchError::Internal { .. } => messages.internal_error.clone(),
            other => other.to_string(),
        }
    }
}

impl From<DispatchError> for CrudError {
    fn from(err: DispatchError) -> Self {
        CrudError::Dispatch(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration and registration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// IO error while reading configuration
    IoError { message: String },

    /// A resource token was registered twice
    DuplicateResource { token: String },

    /// A resource token is empty or contains a path separator
    InvalidToken { token: String },

    /// A resource schema is malformed (empty or duplicate field names)
    InvalidSchema {
        resource: &'static str,
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
            ConfigError::DuplicateResource { token } => {
                write!(f, "Resource '{}' is already registered", token)
            }
            ConfigError::InvalidToken { token } => {
                write!(f, "Invalid resource token: '{}'", token)
            }
            ConfigError::InvalidSchema { resource, message } => {
                write!(f, "Invalid schema for {}: {}", resource, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::ParseError { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
            ConfigError::DuplicateResource { .. } => "DUPLICATE_RESOURCE",
            ConfigError::InvalidToken { .. } => "INVALID_RESOURCE_TOKEN",
            ConfigError::InvalidSchema { .. } => "INVALID_SCHEMA",
        }
    }
}

impl From<ConfigError> for CrudError {
    fn from(err: ConfigError) -> Self {
        CrudError::Config(err)
    }
}

// =============================================================================
// Preservation Errors
// =============================================================================

/// Errors raised while copying immutable fields from a stored instance onto
/// a client-submitted one
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreservationError {
    #[error("given a nil source object")]
    NilSource,

    #[error("given a nil destination object")]
    NilDestination,

    /// Raised by a custom copier or an embedded schema
    #[error("cannot preserve field '{field}': {message}")]
    Field { field: String, message: String },

    /// Raised by a custom copier that refuses the pair as a whole
    #[error("{0}")]
    Rejected(String),
}

impl From<PreservationError> for CrudError {
    fn from(err: PreservationError) -> Self {
        CrudError::Preservation(err)
    }
}

// =============================================================================
// Validation
// =============================================================================

/// A single field validation error, as returned by `Resource::validate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl FieldValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Reject with the first validation message, if any.
///
/// Intended for `Resource::save` implementations:
///
/// ```rust,ignore
/// async fn save(&mut self) -> anyhow::Result<()> {
///     first_validation_error(&self.validate())?;
///     self.store.put(self)
/// }
/// ```
pub fn first_validation_error(errors: &[FieldValidationError]) -> anyhow::Result<()> {
    match errors.first() {
        Some(err) => Err(anyhow::anyhow!(err.message.clone())),
        None => Ok(()),
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<std::io::Error> for CrudError {
    fn from(err: std::io::Error) -> Self {
        CrudError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for CrudError {
    fn from(err: serde_yaml::Error) -> Self {
        CrudError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<serde_json::Error> for CrudError {
    fn from(_: serde_json::Error) -> Self {
        CrudError::Dispatch(DispatchError::MalformedBody)
    }
}

/// A specialized Result type for crudgate operations
pub type CrudResult<T> = Result<T, CrudError>;

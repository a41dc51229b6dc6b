//! Error types for the directory RBAC engine

use crate::action::ActionFlag;
use std::fmt;
use thiserror::Error;

/// Fixed error taxonomy every collaborator failure is translated into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required identity or parameter was empty
    MissingInput,
    /// Principal, target, role, or ACE could not be resolved
    DoesNotExist,
    /// The authorization check failed
    NotAllowed,
    /// The object kind is not covered by the rights model
    NotSupported,
    /// The backing directory store is unreachable
    ConnectionError,
    /// Role configuration is malformed
    ConfigError,
    /// Unclassified failure
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MissingInput => "missing_input",
            ErrorKind::DoesNotExist => "does_not_exist",
            ErrorKind::NotAllowed => "not_allowed",
            ErrorKind::NotSupported => "not_supported",
            ErrorKind::ConnectionError => "connection_error",
            ErrorKind::ConfigError => "config_error",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Error thrown when role is not found
#[derive(Debug, Clone, Error)]
#[error("Role '{role}' not found. Available roles: {}", available_roles.join(", "))]
pub struct RoleNotFoundError {
    pub role: String,
    pub available_roles: Vec<String>,
}

/// Error thrown when a principal may not perform an action on a target
#[derive(Debug, Clone, Error)]
#[error("Principal '{principal}' is not allowed to perform '{action}' on '{target}'")]
pub struct NotAllowedError {
    pub principal: String,
    pub action: String,
    pub target: String,
}

impl NotAllowedError {
    pub fn new(principal: impl Into<String>, action: ActionFlag, target: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            action: action.to_string(),
            target: target.into(),
        }
    }
}

/// General engine error type
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error(transparent)]
    RoleNotFound(#[from] RoleNotFoundError),

    #[error("{kind} '{identity}' does not exist")]
    DoesNotExist { kind: &'static str, identity: String },

    #[error(transparent)]
    NotAllowed(#[from] NotAllowedError),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Directory connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Unknown(String),
}

impl AuthzError {
    /// Principal could not be resolved
    pub fn principal_not_found(identity: impl Into<String>) -> Self {
        AuthzError::DoesNotExist {
            kind: "Principal",
            identity: identity.into(),
        }
    }

    /// Target object could not be resolved
    pub fn target_not_found(identity: impl Into<String>) -> Self {
        AuthzError::DoesNotExist {
            kind: "Target",
            identity: identity.into(),
        }
    }

    /// Access rule is not present on the target
    pub fn ace_not_found(identity: impl Into<String>) -> Self {
        AuthzError::DoesNotExist {
            kind: "Access rule",
            identity: identity.into(),
        }
    }

    /// The taxonomy tag for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthzError::MissingInput(_) => ErrorKind::MissingInput,
            AuthzError::RoleNotFound(_) | AuthzError::DoesNotExist { .. } => ErrorKind::DoesNotExist,
            AuthzError::NotAllowed(_) => ErrorKind::NotAllowed,
            AuthzError::NotSupported(_) => ErrorKind::NotSupported,
            AuthzError::Connection(_) => ErrorKind::ConnectionError,
            AuthzError::Config(_)
            | AuthzError::Io(_)
            | AuthzError::Json(_)
            | AuthzError::Yaml(_) => ErrorKind::ConfigError,
            AuthzError::Unknown(_) => ErrorKind::Unknown,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthzError>;

/// Fails `MissingInput` when `value` is empty or whitespace
pub fn require_input(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AuthzError::MissingInput(format!("{} is required", field)));
    }
    Ok(())
}

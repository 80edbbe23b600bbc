//! Error types for the exit permit system.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::permit::{PermitAction, PermitStatus};

#[derive(Debug, Error)]
pub enum ExitPassError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authorization denied: {reason}")]
    Unauthorized { reason: String },

    #[error("Invalid transition: cannot {action} a permit in status {status}")]
    InvalidTransition {
        action: PermitAction,
        status: PermitStatus,
    },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Concurrent modification of {entity} with id {id}")]
    Conflict { entity: String, id: String },

    #[error("Collaborator failure ({collaborator}): {message}")]
    Collaborator {
        collaborator: String,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ExitPassResult<T> = Result<T, ExitPassError>;

/// Stable, wire-level classification of an [`ExitPassError`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    InvalidTransition,
    NotFound,
    Conflict,
    CollaboratorFailure,
    Internal,
}

impl ExitPassError {
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn permit_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "permit".into(),
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Collaborator { .. } => ErrorKind::CollaboratorFailure,
            Self::Database(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True for failures caused by the caller's input or permissions, as
    /// opposed to infrastructure or programming faults.
    pub fn is_policy_failure(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation
                | ErrorKind::Unauthorized
                | ErrorKind::InvalidTransition
                | ErrorKind::NotFound
        )
    }
}

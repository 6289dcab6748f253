//! Ledger errors
//!
//! Components return [`LedgerError`]; the service facade converts it into a
//! serializable [`ErrorDescriptor`] so nothing crosses the API boundary as a
//! panic or an opaque error.

use crate::models::validation::{FieldError, ValidationError};
use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Record kinds referenced in errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Property,
    Tenant,
    Payment,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Property => "property",
            Entity::Tenant => "tenant",
            Entity::Payment => "payment",
        })
    }
}

/// Errors raised by ledger components
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: String },

    /// A guarded write lost a race with another session
    #[error("{entity} {id} was modified concurrently: {detail}")]
    Conflict {
        entity: Entity,
        id: String,
        detail: String,
    },

    /// A multi-write operation stopped after some writes were applied
    ///
    /// Occupancy may have drifted; reconciliation repairs it.
    #[error("{operation} incomplete: {detail}; run occupancy reconciliation to repair")]
    Incomplete {
        operation: &'static str,
        detail: String,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl LedgerError {
    pub fn not_found(entity: Entity, id: &str) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Error categories exposed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    PartialFailure,
    Store,
    Config,
}

/// Serializable error returned by every service call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub kind: ErrorKind,
    pub message: String,
    /// Field-level problems (validation errors only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl ErrorDescriptor {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: Vec::new(),
        }
    }
}

impl fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl From<LedgerError> for ErrorDescriptor {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::Validation(validation) => Self {
                kind: ErrorKind::Validation,
                message,
                fields: validation.fields,
            },
            LedgerError::NotFound { .. } => Self::new(ErrorKind::NotFound, message),
            LedgerError::Conflict { .. } => Self::new(ErrorKind::Conflict, message),
            LedgerError::Incomplete { .. } => Self::new(ErrorKind::PartialFailure, message),
            LedgerError::Store(StoreError::NotFound { .. }) => {
                Self::new(ErrorKind::NotFound, message)
            }
            LedgerError::Store(_) => Self::new(ErrorKind::Store, message),
        }
    }
}

//! Error types for the basalt platform.

use thiserror::Error;

use crate::acl::DataOp;
use crate::models::credential::Level;

#[derive(Debug, Error)]
pub enum BasaltError {
    /// Presented credentials are absent, malformed, or do not match a
    /// stored record. Surfaced as "unauthorized". The reason never
    /// distinguishes an unknown login from a wrong secret.
    #[error("authentication failed: {reason}")]
    Authentication { reason: String },

    /// Credentials are valid but below the required privilege level.
    /// Surfaced as "forbidden".
    #[error("insufficient credentials, at least [{required}] level required")]
    Authorization { required: Level },

    /// Credentials are valid but the permission matrix denies the
    /// operation on this collection type.
    #[error("forbidden to {operation} objects of type [{type_name}]")]
    Forbidden { type_name: String, operation: DataOp },

    /// A cross-tenant operation was addressed to the root tenant.
    #[error("host doesn't specify any tenant id")]
    NoTenant,

    /// Caller-supplied input is structurally invalid (schema field,
    /// password policy, tenant id, ...).
    #[error("{message}")]
    Validation { message: String },

    /// A schema update is structurally incompatible with the stored
    /// mapping. Distinct from plain validation errors.
    #[error("incompatible change to schema [{type_name}]: {detail}")]
    IncompatibleSchema { type_name: String, detail: String },

    /// A store invariant was violated upstream (e.g. duplicate login).
    /// Never retried; should trigger alerting.
    #[error("internal consistency fault: {detail}")]
    InternalConsistency { detail: String },

    #[error("{entity} [{id}] not found")]
    NotFound { entity: String, id: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BasaltError {
    pub fn validation(message: impl Into<String>) -> Self {
        BasaltError::Validation {
            message: message.into(),
        }
    }

    pub fn authentication(reason: impl Into<String>) -> Self {
        BasaltError::Authentication {
            reason: reason.into(),
        }
    }
}

pub type BasaltResult<T> = Result<T, BasaltError>;

//! The domain error taxonomy.
//!
//! Every caller-visible failure in the core is one of the kinds below, and the
//! boundary layer maps each kind 1:1 to a status class. The write model passes
//! kinds through unchanged; nothing in the core re-interprets or collapses
//! them into a generic failure.

use crate::authority::AuthorityField;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// A required authorization field was absent from the request context.
    #[error("authority context is missing the {0} field")]
    AuthorityMissing(AuthorityField),

    /// The authorization context was present but structurally invalid.
    #[error("authority context is invalid: {0}")]
    AuthorityInvalid(String),

    /// The actor is authenticated but not permitted to perform this operation
    /// on this entity (authorship mismatch, missing capability, or the
    /// second-line tenant check).
    #[error("access denied")]
    AccessDenied,

    /// The entity does not exist within the token's tenant. Deliberately
    /// identical for "never existed" and "exists in another tenant".
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The requested transition is illegal from the entity's current state,
    /// the entity is terminal, or the write targeted a stale version.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed caller input (empty natural key, duplicate unique key, ...).
    #[error("invalid input: {0}")]
    Validation(String),

    /// The persistence layer failed. Wrapped, never leaked raw, never retried
    /// automatically.
    #[error("storage failure: {0}")]
    System(String),
}

pub type DomainResult<T> = std::result::Result<T, DomainError>;

impl From<crs_types::TextError> for DomainError {
    fn from(err: crs_types::TextError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl DomainError {
    /// Stable machine-readable name for the error kind, used in boundary
    /// payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthorityMissing(_) => "AUTHORITY_MISSING",
            Self::AuthorityInvalid(_) => "AUTHORITY_INVALID",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::System(_) => "SYSTEM_ERROR",
        }
    }
}

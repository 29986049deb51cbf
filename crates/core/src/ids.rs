//! Identifier types.
//!
//! Tenant and actor identifiers arrive as opaque strings on the boundary and
//! are validated once, here, into dedicated newtypes. Entity ids are UUIDs
//! generated by the core (entities are never created with caller-supplied
//! ids).

use crate::error::{DomainError, DomainResult};
use serde::Serialize;
use uuid::Uuid;

const MAX_IDENTIFIER_LEN: usize = 128;

/// Validate an external identifier string (tenant or actor).
///
/// Identifiers are trimmed and restricted to a conservative ASCII set so they
/// are safe to use as map keys and to embed in audit events.
fn validate_identifier(raw: &str, what: &str) -> DomainResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{what} cannot be empty")));
    }
    if trimmed.len() > MAX_IDENTIFIER_LEN {
        return Err(DomainError::Validation(format!(
            "{what} exceeds maximum length of {MAX_IDENTIFIER_LEN} characters"
        )));
    }

    let ok = trimmed
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_' | b':'));
    if !ok {
        return Err(DomainError::Validation(format!(
            "{what} contains invalid characters (only alphanumeric, '.', '-', '_', ':' allowed)"
        )));
    }

    Ok(trimmed.to_owned())
}

/// The identifier of a tenant. Every entity is exclusively owned by exactly
/// one tenant and every query is scoped by one of these.
///
/// No `Deserialize`: [`TenantId::parse`] is the only way in, so an unvalidated
/// identifier cannot reach the core through a payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Parses and validates a tenant identifier.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the identifier is empty, too long,
    /// or contains characters outside the permitted set.
    pub fn parse(raw: impl AsRef<str>) -> DomainResult<Self> {
        Ok(Self(validate_identifier(raw.as_ref(), "tenant identifier")?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identifier of an acting user (clinician, administrator, system actor).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Parses and validates an actor identifier.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the identifier is empty, too long,
    /// or contains characters outside the permitted set.
    pub fn parse(raw: impl AsRef<str>) -> DomainResult<Self> {
        Ok(Self(validate_identifier(raw.as_ref(), "actor identifier")?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generates a fresh entity id.
pub(crate) fn new_entity_id() -> Uuid {
    Uuid::new_v4()
}

/// Parses a caller-supplied entity id (path parameter or payload field).
///
/// # Errors
///
/// Returns `DomainError::Validation` if the string is not a valid UUID.
pub fn parse_entity_id(raw: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| DomainError::Validation("entity id must be a valid UUID".into()))
}

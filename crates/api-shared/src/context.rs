//! Request-context extraction.
//!
//! Inbound operations carry their identifying fields as headers. This module
//! only lifts the raw strings out of the request; all presence and validity
//! judgements belong to the capability gate (`crs_core::authorize`), so the
//! boundary cannot accidentally become a second, weaker authorizer.
//!
//! Reads are the exception: they take a bare tenant scope, never a token, and
//! that extraction (with its own failure) lives here too.

use axum::http::HeaderMap;
use crs_core::{AuthorityCandidate, DomainError, DomainResult, TenantId};

/// Header carrying the tenant identifier.
pub const TENANT_HEADER: &str = "x-tenant-id";
/// Header carrying the actor identifier.
pub const ACTOR_HEADER: &str = "x-actor-id";
/// Header carrying the RFC 3339 authorization timestamp.
pub const AUTHORIZED_AT_HEADER: &str = "x-authorized-at";
/// Header carrying the correlation identifier.
pub const CORRELATION_HEADER: &str = "x-correlation-id";
/// Header carrying the declared capabilities, comma-separated.
pub const CAPABILITIES_HEADER: &str = "x-capabilities";

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    // Non-UTF8 header values count as absent; the gate will reject.
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Assembles an [`AuthorityCandidate`] from a request's headers.
///
/// Absent headers become `None`/empty — deliberately not an error here, so
/// the gate's validation order (and its `AUTHORITY_MISSING` field naming) is
/// the single source of truth.
pub fn candidate_from_headers(headers: &HeaderMap) -> AuthorityCandidate {
    let capabilities = header_string(headers, CAPABILITIES_HEADER)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    AuthorityCandidate {
        actor_id: header_string(headers, ACTOR_HEADER),
        tenant_id: header_string(headers, TENANT_HEADER),
        authorized_at: header_string(headers, AUTHORIZED_AT_HEADER),
        correlation_id: header_string(headers, CORRELATION_HEADER),
        capabilities,
    }
}

/// Extracts the tenant scope for read operations.
///
/// # Errors
///
/// Returns `DomainError::Validation` (a 400-class failure) if the tenant
/// header is absent or not a valid tenant identifier.
pub fn tenant_scope(headers: &HeaderMap) -> DomainResult<TenantId> {
    let raw = header_string(headers, TENANT_HEADER)
        .ok_or_else(|| DomainError::Validation("tenant identifier header is required".into()))?;
    TenantId::parse(raw)
}

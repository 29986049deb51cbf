//! Shared write-model pipeline steps.
//!
//! Failure ordering is part of the caller-visible contract: capability first,
//! then existence (tenant-scoped, so cross-tenant is indistinguishable from
//! absent), then the defensive tenant re-check, then entity-specific rules.
//! All of these run before any persistence attempt, so every failure path is
//! side-effect free.

use crate::authority::{AuthorityToken, Capability};
use crate::error::{DomainError, DomainResult};
use crate::store::{StorageRow, TenantStore};
use uuid::Uuid;

/// Rejects the operation unless the token declared the required capability.
pub(crate) fn require_capability(
    token: &AuthorityToken,
    capability: Capability,
) -> DomainResult<()> {
    if token.allows(capability) {
        Ok(())
    } else {
        tracing::debug!(
            tenant = token.tenant_id().as_str(),
            actor = token.actor_id().as_str(),
            capability = capability.as_str(),
            "operation denied: capability not declared"
        );
        Err(DomainError::AccessDenied)
    }
}

/// Loads a record scoped to the token's tenant.
///
/// Absent — including present-under-another-tenant — is `NotFound`. The
/// explicit tenant comparison afterwards is a second line of defense: the
/// scoped load already guarantees it, but if a store ever returned a
/// mis-keyed row the mismatch surfaces as `AccessDenied` rather than a
/// cross-tenant write.
pub(crate) fn load_scoped<R: StorageRow>(
    store: &TenantStore<R>,
    token: &AuthorityToken,
    id: Uuid,
) -> DomainResult<R> {
    let record = store
        .find_by_id(token.tenant_id(), id)?
        .ok_or(DomainError::NotFound(R::ENTITY))?;

    if record.tenant_id() != token.tenant_id() {
        return Err(DomainError::AccessDenied);
    }

    Ok(record)
}

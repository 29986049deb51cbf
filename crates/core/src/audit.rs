//! Audit signal emission.
//!
//! Every successful write emits exactly one structured event on the `audit`
//! tracing target, carrying enough to answer "who did what, to which record,
//! in which tenant, traced to which request". The write model calls
//! [`record_write`] only after the persistence adapter has accepted the row;
//! a failed operation emits nothing on this target.

use crate::authority::AuthorityToken;
use crate::config::CoreConfig;
use uuid::Uuid;

/// Emits the audit event for one persisted write.
pub(crate) fn record_write(
    cfg: &CoreConfig,
    token: &AuthorityToken,
    entity: &'static str,
    action: &'static str,
    entity_id: Uuid,
) {
    tracing::info!(
        target: "audit",
        service = cfg.service_name(),
        tenant = token.tenant_id().as_str(),
        actor = token.actor_id().as_str(),
        correlation = token.correlation_id(),
        entity,
        action,
        entity_id = %entity_id,
        "write persisted"
    );
}

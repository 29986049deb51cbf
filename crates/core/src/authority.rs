//! Authority tokens and the capability gate.
//!
//! A write never proceeds on the strength of caller-supplied data. The
//! boundary layer assembles an [`AuthorityCandidate`] from the request's
//! identifying fields and hands it to [`authorize`], which either rejects it
//! or mints an [`AuthorityToken`].
//!
//! The token is the only proof the write model accepts, and it cannot be
//! forged: its provenance marker is a private type in this module, so the one
//! constructor reachable from outside is `authorize` itself. There is no
//! `Deserialize` impl and no public field, which makes "arrived as plain
//! external data" unrepresentable rather than merely checked at runtime.
//!
//! The gate is a pure validation function. It performs no I/O, touches no
//! stored state, and fails closed: any doubt about presence, shape, or
//! vocabulary is a rejection.

use crate::error::{DomainError, DomainResult};
use crate::ids::{ActorId, TenantId};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeSet;

/// The required fields of an authority context, named so that a missing-field
/// rejection can say exactly which one was absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityField {
    Actor,
    Tenant,
    AuthorizedAt,
    Correlation,
}

impl std::fmt::Display for AuthorityField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Actor => "actor",
            Self::Tenant => "tenant",
            Self::AuthorizedAt => "authorized-at",
            Self::Correlation => "correlation",
        };
        write!(f, "{name}")
    }
}

/// The closed set of entity-specific operations an actor may declare.
///
/// Declared capabilities travel with the candidate and are checked by the
/// write model per operation. The vocabulary is closed: an undeclared
/// operation is not performable, and an unknown name is rejected at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    EncounterCreate,
    EncounterActivate,
    EncounterComplete,
    NoteCreate,
    NoteUpdate,
    NoteSign,
    PatientCreate,
    PatientUpdate,
}

impl Capability {
    /// The kebab-case wire name of this capability.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EncounterCreate => "encounter-create",
            Self::EncounterActivate => "encounter-activate",
            Self::EncounterComplete => "encounter-complete",
            Self::NoteCreate => "note-create",
            Self::NoteUpdate => "note-update",
            Self::NoteSign => "note-sign",
            Self::PatientCreate => "patient-create",
            Self::PatientUpdate => "patient-update",
        }
    }

    /// Parses a declared capability name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AuthorityInvalid` for names outside the closed
    /// vocabulary; declared capabilities are part of the authority context and
    /// an unrecognised one makes the whole context suspect.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        match raw.trim() {
            "encounter-create" => Ok(Self::EncounterCreate),
            "encounter-activate" => Ok(Self::EncounterActivate),
            "encounter-complete" => Ok(Self::EncounterComplete),
            "note-create" => Ok(Self::NoteCreate),
            "note-update" => Ok(Self::NoteUpdate),
            "note-sign" => Ok(Self::NoteSign),
            "patient-create" => Ok(Self::PatientCreate),
            "patient-update" => Ok(Self::PatientUpdate),
            other => Err(DomainError::AuthorityInvalid(format!(
                "unknown capability '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A candidate authority context assembled by the boundary layer from a
/// request's identifying fields. Untrusted plain data; nothing downstream of
/// the gate ever sees one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorityCandidate {
    pub actor_id: Option<String>,
    pub tenant_id: Option<String>,
    /// RFC 3339 timestamp of when the caller claims authorization happened.
    pub authorized_at: Option<String>,
    pub correlation_id: Option<String>,
    /// Declared capability names. Absent means "none declared": the candidate
    /// still validates but every capability-gated operation will be denied.
    #[serde(default)]
    pub capabilities: Vec<String>,
}

mod provenance {
    /// Proof that a token was minted by [`super::authorize`].
    ///
    /// Private to this module tree: no code outside `authority` can name it,
    /// so no code outside `authority` can construct an `AuthorityToken`.
    #[derive(Debug, Clone, Copy)]
    pub(super) struct Minted;
}

/// Unforgeable, server-issued proof that a specific actor, in a specific
/// tenant, was authorized at a specific time for a causally-traceable request.
///
/// Tokens are immutable, ephemeral (per-request, never serialized), and carry
/// no write capability themselves. Obtain one via [`authorize`]; there is no
/// other way.
#[derive(Debug, Clone)]
pub struct AuthorityToken {
    actor_id: ActorId,
    tenant_id: TenantId,
    authorized_at: DateTime<Utc>,
    correlation_id: String,
    capabilities: BTreeSet<Capability>,
    _provenance: provenance::Minted,
}

impl AuthorityToken {
    pub fn actor_id(&self) -> &ActorId {
        &self.actor_id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn authorized_at(&self) -> DateTime<Utc> {
        self.authorized_at
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Whether the actor declared the given capability when the context was
    /// authorized.
    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

const MAX_CORRELATION_LEN: usize = 256;

/// Validates a candidate authority context into an [`AuthorityToken`].
///
/// Validation order:
/// 1. presence of the four required fields — absence is
///    [`DomainError::AuthorityMissing`] naming the field;
/// 2. `authorized_at` parses as an RFC 3339 timestamp —
///    [`DomainError::AuthorityInvalid`] otherwise;
/// 3. tenant and actor identifiers are structurally valid;
/// 4. every declared capability name is in the closed vocabulary.
///
/// No partial token is ever produced; the first failure wins.
///
/// # Errors
///
/// Returns `AuthorityMissing` or `AuthorityInvalid` as described above.
pub fn authorize(candidate: AuthorityCandidate) -> DomainResult<AuthorityToken> {
    let actor_raw = require(candidate.actor_id, AuthorityField::Actor)?;
    let tenant_raw = require(candidate.tenant_id, AuthorityField::Tenant)?;
    let authorized_at_raw = require(candidate.authorized_at, AuthorityField::AuthorizedAt)?;
    let correlation_id = require(candidate.correlation_id, AuthorityField::Correlation)?;

    let authorized_at = DateTime::parse_from_rfc3339(authorized_at_raw.trim())
        .map_err(|e| {
            DomainError::AuthorityInvalid(format!("authorized-at is not a valid timestamp: {e}"))
        })?
        .with_timezone(&Utc);

    let actor_id = ActorId::parse(&actor_raw)
        .map_err(|e| DomainError::AuthorityInvalid(format!("actor identifier: {e}")))?;
    let tenant_id = TenantId::parse(&tenant_raw)
        .map_err(|e| DomainError::AuthorityInvalid(format!("tenant identifier: {e}")))?;

    if correlation_id.len() > MAX_CORRELATION_LEN {
        return Err(DomainError::AuthorityInvalid(
            "correlation identifier exceeds maximum length".into(),
        ));
    }

    let mut capabilities = BTreeSet::new();
    for raw in &candidate.capabilities {
        capabilities.insert(Capability::parse(raw)?);
    }

    Ok(AuthorityToken {
        actor_id,
        tenant_id,
        authorized_at,
        correlation_id,
        capabilities,
        _provenance: provenance::Minted,
    })
}

/// Presence check shared by the four required fields. Empty and
/// whitespace-only values count as absent, not invalid.
fn require(value: Option<String>, field: AuthorityField) -> DomainResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_owned()),
        _ => Err(DomainError::AuthorityMissing(field)),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Mints a token for tests without going through header plumbing.
    pub(crate) fn token(
        tenant: &str,
        actor: &str,
        capabilities: &[Capability],
    ) -> AuthorityToken {
        authorize(AuthorityCandidate {
            actor_id: Some(actor.to_owned()),
            tenant_id: Some(tenant.to_owned()),
            authorized_at: Some("2026-02-01T10:00:00Z".to_owned()),
            correlation_id: Some("corr-1".to_owned()),
            capabilities: capabilities.iter().map(|c| c.as_str().to_owned()).collect(),
        })
        .expect("test candidate should authorize")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_candidate() -> AuthorityCandidate {
        AuthorityCandidate {
            actor_id: Some("a1".into()),
            tenant_id: Some("t1".into()),
            authorized_at: Some("2026-02-01T10:00:00Z".into()),
            correlation_id: Some("req-42".into()),
            capabilities: vec!["note-sign".into()],
        }
    }

    #[test]
    fn authorize_accepts_complete_candidate() {
        let token = authorize(full_candidate()).expect("should authorize");
        assert_eq!(token.actor_id().as_str(), "a1");
        assert_eq!(token.tenant_id().as_str(), "t1");
        assert_eq!(token.correlation_id(), "req-42");
        assert!(token.allows(Capability::NoteSign));
        assert!(!token.allows(Capability::NoteUpdate));
    }

    #[test]
    fn authorize_rejects_each_missing_field_by_name() {
        let cases: [(fn(&mut AuthorityCandidate), AuthorityField); 4] = [
            (|c| c.actor_id = None, AuthorityField::Actor),
            (|c| c.tenant_id = None, AuthorityField::Tenant),
            (|c| c.authorized_at = None, AuthorityField::AuthorizedAt),
            (|c| c.correlation_id = None, AuthorityField::Correlation),
        ];

        for (strip, field) in cases {
            let mut candidate = full_candidate();
            strip(&mut candidate);
            let err = authorize(candidate).expect_err("should reject");
            assert!(
                matches!(err, DomainError::AuthorityMissing(f) if f == field),
                "expected missing {field}, got {err:?}"
            );
        }
    }

    #[test]
    fn authorize_treats_whitespace_as_absent() {
        let mut candidate = full_candidate();
        candidate.tenant_id = Some("   ".into());
        let err = authorize(candidate).expect_err("should reject");
        assert!(matches!(
            err,
            DomainError::AuthorityMissing(AuthorityField::Tenant)
        ));
    }

    #[test]
    fn authorize_rejects_unparseable_timestamp_as_invalid() {
        let mut candidate = full_candidate();
        candidate.authorized_at = Some("yesterday at noon".into());
        let err = authorize(candidate).expect_err("should reject");
        assert!(matches!(err, DomainError::AuthorityInvalid(_)));
    }

    #[test]
    fn authorize_rejects_unknown_capability_names() {
        let mut candidate = full_candidate();
        candidate.capabilities.push("note-delete".into());
        let err = authorize(candidate).expect_err("should reject");
        assert!(matches!(err, DomainError::AuthorityInvalid(_)));
    }

    #[test]
    fn authorize_rejects_malformed_identifiers_as_invalid() {
        let mut candidate = full_candidate();
        candidate.actor_id = Some("a 1".into());
        let err = authorize(candidate).expect_err("should reject");
        assert!(matches!(err, DomainError::AuthorityInvalid(_)));
    }

    #[test]
    fn capability_names_round_trip() {
        for cap in [
            Capability::EncounterCreate,
            Capability::EncounterActivate,
            Capability::EncounterComplete,
            Capability::NoteCreate,
            Capability::NoteUpdate,
            Capability::NoteSign,
            Capability::PatientCreate,
            Capability::PatientUpdate,
        ] {
            assert_eq!(Capability::parse(cap.as_str()).expect("parse"), cap);
        }
    }

    #[test]
    fn empty_capability_set_is_valid_but_allows_nothing() {
        let mut candidate = full_candidate();
        candidate.capabilities.clear();
        let token = authorize(candidate).expect("should authorize");
        assert!(!token.allows(Capability::NoteSign));
    }
}

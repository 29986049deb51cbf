//! The encounter entity and its state machine.
//!
//! An encounter moves strictly forward: `Created → Active → Completed`.
//! No edge skips a state, no edge reverses, and `Completed` is terminal.
//! Transitions are a closed sum type ([`EncounterTransition`]); there is no
//! generic "set status" operation, so an illegal request is a `Conflict`
//! rather than a silently-accepted overwrite.

use crate::error::{DomainError, DomainResult};
use crate::ids::{new_entity_id, TenantId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// The lifecycle states of an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EncounterStatus {
    Created,
    Active,
    Completed,
}

impl EncounterStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
        }
    }
}

/// The closed set of legal encounter transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterTransition {
    Activate,
    Complete,
}

impl EncounterTransition {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Complete => "complete",
        }
    }
}

/// A clinical encounter owned by exactly one tenant.
///
/// Constructed only through the write model; transport code never builds one.
/// `version` is the optimistic-concurrency counter checked by the store on
/// every save.
#[derive(Debug, Clone)]
pub struct Encounter {
    id: Uuid,
    tenant_id: TenantId,
    patient_id: Uuid,
    status: EncounterStatus,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Encounter {
    /// Creates a fresh encounter in the `Created` state.
    pub(crate) fn create(tenant_id: TenantId, patient_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: new_entity_id(),
            tenant_id,
            patient_id,
            status: EncounterStatus::Created,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn patient_id(&self) -> Uuid {
        self.patient_id
    }

    pub fn status(&self) -> EncounterStatus {
        self.status
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies a transition, returning the successor record.
    ///
    /// Pure: `self` is untouched, so a failed apply leaves nothing to roll
    /// back. The successor carries `version + 1` for the store's
    /// compare-and-set.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` for every `(status, transition)` pair
    /// outside the two legal edges, including transitions from `Completed`
    /// and self-transitions.
    pub(crate) fn apply(
        &self,
        transition: EncounterTransition,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let next_status = match (self.status, transition) {
            (EncounterStatus::Created, EncounterTransition::Activate) => EncounterStatus::Active,
            (EncounterStatus::Active, EncounterTransition::Complete) => EncounterStatus::Completed,
            (status, transition) => {
                return Err(DomainError::Conflict(format!(
                    "cannot {} an encounter in the {} state",
                    transition.as_str(),
                    status.as_str()
                )))
            }
        };

        let mut next = self.clone();
        next.status = next_status;
        next.version = self.version + 1;
        next.updated_at = now;
        Ok(next)
    }
}

//! The patient record entity.
//!
//! Patient records have no terminal state: demographics stay mutable for the
//! life of the record, but only under a valid authority token whose tenant
//! matches the record's tenant. The MRN is the per-tenant natural key; its
//! uniqueness is enforced by the write model at registration time.

use crate::ids::{new_entity_id, ActorId, TenantId};
use chrono::{DateTime, Utc};
use crs_types::{Mrn, NonEmptyText};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Demographic details held for a patient.
///
/// Kept deliberately small; read projections derive a display name from this
/// rather than exposing it raw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Demographics {
    pub given_names: Vec<NonEmptyText>,
    pub family_name: NonEmptyText,
    /// ISO 8601 calendar date, e.g. "1984-03-09".
    pub birth_date: Option<chrono::NaiveDate>,
}

impl Demographics {
    /// Derives the display-safe name exposed by read projections:
    /// `"<given names> <FAMILY NAME>"`.
    pub fn display_name(&self) -> String {
        let mut parts: Vec<String> = self
            .given_names
            .iter()
            .map(|n| n.as_str().to_owned())
            .collect();
        parts.push(self.family_name.as_str().to_ascii_uppercase());
        parts.join(" ")
    }
}

/// A patient record owned by exactly one tenant.
#[derive(Debug, Clone)]
pub struct PatientRecord {
    id: Uuid,
    tenant_id: TenantId,
    mrn: Mrn,
    demographics: Demographics,
    last_modified_by: ActorId,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PatientRecord {
    /// Registers a fresh patient record. MRN uniqueness within the tenant is
    /// the caller's (write model's) responsibility.
    pub(crate) fn register(
        tenant_id: TenantId,
        mrn: Mrn,
        demographics: Demographics,
        registered_by: ActorId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_entity_id(),
            tenant_id,
            mrn,
            demographics,
            last_modified_by: registered_by,
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

    pub fn mrn(&self) -> &Mrn {
        &self.mrn
    }

    pub fn demographics(&self) -> &Demographics {
        &self.demographics
    }

    pub fn last_modified_by(&self) -> &ActorId {
        &self.last_modified_by
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

    /// Returns the successor record with replaced demographics.
    ///
    /// Pure; the MRN and id never change after registration.
    pub(crate) fn with_demographics(
        &self,
        demographics: Demographics,
        modified_by: ActorId,
        now: DateTime<Utc>,
    ) -> Self {
        let mut next = self.clone();
        next.demographics = demographics;
        next.last_modified_by = modified_by;
        next.version = self.version + 1;
        next.updated_at = now;
        next
    }
}

//! The read model.
//!
//! Query-only access to the stored entities. Deliberately asymmetric with the
//! write model: reads take a bare [`TenantId`] scope, never an authority
//! token, and return owned view snapshots that are structurally incapable of
//! reaching back into storage. Mutating a returned view changes nothing.
//!
//! Views expose display-safe fields only: `PatientView` carries a derived
//! display name instead of raw demographics, and `NoteView` omits the
//! authorship fields the write model needs.

use crate::encounter::{Encounter, EncounterStatus};
use crate::error::DomainResult;
use crate::ids::TenantId;
use crate::note::{ClinicalNote, NoteStatus};
use crate::patient::PatientRecord;
use crate::store::Datastore;
use chrono::{DateTime, Utc};
use crs_types::Mrn;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Display-oriented projection of an encounter.
#[derive(Debug, Clone, Serialize)]
pub struct EncounterView {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub status: EncounterStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Encounter> for EncounterView {
    fn from(e: &Encounter) -> Self {
        Self {
            id: e.id(),
            patient_id: e.patient_id(),
            status: e.status(),
            created_at: e.created_at(),
            updated_at: e.updated_at(),
        }
    }
}

/// Display-oriented projection of a clinical note. Carries the latest content
/// and version number; authorship stays internal to the write path.
#[derive(Debug, Clone, Serialize)]
pub struct NoteView {
    pub id: Uuid,
    pub encounter_id: Uuid,
    pub status: NoteStatus,
    pub latest_version: u64,
    pub content: String,
    pub signed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ClinicalNote> for NoteView {
    fn from(n: &ClinicalNote) -> Self {
        Self {
            id: n.id(),
            encounter_id: n.encounter_id(),
            status: n.status(),
            latest_version: n.latest_version(),
            content: n.content().to_owned(),
            signed_at: n.signed_at(),
            created_at: n.created_at(),
            updated_at: n.updated_at(),
        }
    }
}

/// Display-oriented projection of a patient record.
#[derive(Debug, Clone, Serialize)]
pub struct PatientView {
    pub id: Uuid,
    pub mrn: Mrn,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PatientRecord> for PatientView {
    fn from(p: &PatientRecord) -> Self {
        Self {
            id: p.id(),
            mrn: p.mrn().clone(),
            display_name: p.demographics().display_name(),
            created_at: p.created_at(),
            updated_at: p.updated_at(),
        }
    }
}

/// Tenant-scoped, query-only access to stored entities.
#[derive(Clone)]
pub struct ReadService {
    store: Arc<Datastore>,
}

impl ReadService {
    pub fn new(store: Arc<Datastore>) -> Self {
        Self { store }
    }

    /// Looks up one encounter. Cross-tenant ids come back as `None`.
    pub fn encounter(&self, tenant: &TenantId, id: Uuid) -> DomainResult<Option<EncounterView>> {
        Ok(self
            .store
            .encounters
            .find_by_id(tenant, id)?
            .map(|e| EncounterView::from(&e)))
    }

    /// Lists a patient's encounters, oldest first.
    pub fn encounters_for_patient(
        &self,
        tenant: &TenantId,
        patient_id: Uuid,
    ) -> DomainResult<Vec<EncounterView>> {
        Ok(self
            .store
            .encounters
            .find_by_parent(tenant, patient_id)?
            .iter()
            .map(EncounterView::from)
            .collect())
    }

    /// Looks up one clinical note.
    pub fn note(&self, tenant: &TenantId, id: Uuid) -> DomainResult<Option<NoteView>> {
        Ok(self
            .store
            .notes
            .find_by_id(tenant, id)?
            .map(|n| NoteView::from(&n)))
    }

    /// Lists an encounter's notes, oldest first.
    pub fn notes_for_encounter(
        &self,
        tenant: &TenantId,
        encounter_id: Uuid,
    ) -> DomainResult<Vec<NoteView>> {
        Ok(self
            .store
            .notes
            .find_by_parent(tenant, encounter_id)?
            .iter()
            .map(NoteView::from)
            .collect())
    }

    /// Looks up one patient record.
    pub fn patient(&self, tenant: &TenantId, id: Uuid) -> DomainResult<Option<PatientView>> {
        Ok(self
            .store
            .patients
            .find_by_id(tenant, id)?
            .map(|p| PatientView::from(&p)))
    }

    /// Looks up a patient by MRN, the per-tenant natural key.
    pub fn patient_by_mrn(&self, tenant: &TenantId, mrn: &Mrn) -> DomainResult<Option<PatientView>> {
        Ok(self
            .store
            .patients
            .find_by_mrn(tenant, mrn)?
            .map(|p| PatientView::from(&p)))
    }

    /// Lists all of a tenant's patients, oldest first.
    pub fn patients(&self, tenant: &TenantId) -> DomainResult<Vec<PatientView>> {
        Ok(self
            .store
            .patients
            .list_by_tenant(tenant)?
            .iter()
            .map(PatientView::from)
            .collect())
    }
}

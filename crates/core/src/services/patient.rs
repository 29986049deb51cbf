//! Write operations for patient records.

use crate::audit::record_write;
use crate::authority::{AuthorityToken, Capability};
use crate::config::CoreConfig;
use crate::error::DomainResult;
use crate::patient::{Demographics, PatientRecord};
use crate::read::PatientView;
use crate::services::shared::{load_scoped, require_capability};
use crate::store::Datastore;
use chrono::Utc;
use crs_types::Mrn;
use std::sync::Arc;
use uuid::Uuid;

/// Service for patient record operations.
#[derive(Clone)]
pub struct PatientService {
    store: Arc<Datastore>,
    cfg: Arc<CoreConfig>,
}

impl PatientService {
    pub fn new(store: Arc<Datastore>, cfg: Arc<CoreConfig>) -> Self {
        Self { store, cfg }
    }

    /// Registers a new patient record under the token's tenant.
    ///
    /// # Errors
    ///
    /// - `AccessDenied` if `patient-create` was not declared;
    /// - `Validation` if the MRN is already registered in the tenant;
    /// - `Conflict`/`System` from the persistence adapter.
    pub fn register(
        &self,
        token: &AuthorityToken,
        mrn: Mrn,
        demographics: Demographics,
    ) -> DomainResult<PatientView> {
        require_capability(token, Capability::PatientCreate)?;

        let record = PatientRecord::register(
            token.tenant_id().clone(),
            mrn,
            demographics,
            token.actor_id().clone(),
            Utc::now(),
        );
        let view = PatientView::from(&record);
        self.store.patients.insert_unique_mrn(record)?;

        record_write(&self.cfg, token, "patient record", "register", view.id);
        Ok(view)
    }

    /// Replaces a patient's demographics.
    ///
    /// # Errors
    ///
    /// - `AccessDenied` if `patient-update` was not declared;
    /// - `NotFound` if the record does not exist in the token's tenant;
    /// - `Conflict` if the write raced a concurrent update.
    pub fn update_demographics(
        &self,
        token: &AuthorityToken,
        id: Uuid,
        demographics: Demographics,
    ) -> DomainResult<PatientView> {
        require_capability(token, Capability::PatientUpdate)?;

        let current = load_scoped(&self.store.patients, token, id)?;
        let next = current.with_demographics(demographics, token.actor_id().clone(), Utc::now());
        let view = PatientView::from(&next);
        self.store.patients.save(next, current.version())?;

        record_write(&self.cfg, token, "patient record", "update-demographics", id);
        Ok(view)
    }
}

//! Write operations for encounters.

use crate::audit::record_write;
use crate::authority::{AuthorityToken, Capability};
use crate::config::CoreConfig;
use crate::encounter::{Encounter, EncounterTransition};
use crate::error::{DomainError, DomainResult};
use crate::read::EncounterView;
use crate::services::shared::{load_scoped, require_capability};
use crate::store::Datastore;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Service for encounter lifecycle operations.
#[derive(Clone)]
pub struct EncounterService {
    store: Arc<Datastore>,
    cfg: Arc<CoreConfig>,
}

impl EncounterService {
    pub fn new(store: Arc<Datastore>, cfg: Arc<CoreConfig>) -> Self {
        Self { store, cfg }
    }

    /// Creates a new encounter for a patient, in the `Created` state.
    ///
    /// The patient must exist within the token's tenant.
    ///
    /// # Errors
    ///
    /// - `AccessDenied` if `encounter-create` was not declared;
    /// - `NotFound` if the patient does not exist in the token's tenant;
    /// - `Conflict`/`System` from the persistence adapter.
    pub fn create(&self, token: &AuthorityToken, patient_id: Uuid) -> DomainResult<EncounterView> {
        require_capability(token, Capability::EncounterCreate)?;

        self.store
            .patients
            .find_by_id(token.tenant_id(), patient_id)?
            .ok_or(DomainError::NotFound("patient record"))?;

        let encounter = Encounter::create(token.tenant_id().clone(), patient_id, Utc::now());
        let view = EncounterView::from(&encounter);
        self.store.encounters.insert(encounter)?;

        record_write(&self.cfg, token, "encounter", "create", view.id);
        Ok(view)
    }

    /// Activates a `Created` encounter.
    ///
    /// # Errors
    ///
    /// - `AccessDenied` if `encounter-activate` was not declared;
    /// - `NotFound` if the encounter does not exist in the token's tenant;
    /// - `Conflict` if the encounter is not in `Created`, or the write raced.
    pub fn activate(&self, token: &AuthorityToken, id: Uuid) -> DomainResult<EncounterView> {
        self.transition(
            token,
            id,
            EncounterTransition::Activate,
            Capability::EncounterActivate,
        )
    }

    /// Completes an `Active` encounter. `Completed` is terminal.
    ///
    /// # Errors
    ///
    /// - `AccessDenied` if `encounter-complete` was not declared;
    /// - `NotFound` if the encounter does not exist in the token's tenant;
    /// - `Conflict` if the encounter is not in `Active` (a `Created`
    ///   encounter cannot skip to `Completed`), or the write raced.
    pub fn complete(&self, token: &AuthorityToken, id: Uuid) -> DomainResult<EncounterView> {
        self.transition(
            token,
            id,
            EncounterTransition::Complete,
            Capability::EncounterComplete,
        )
    }

    fn transition(
        &self,
        token: &AuthorityToken,
        id: Uuid,
        transition: EncounterTransition,
        capability: Capability,
    ) -> DomainResult<EncounterView> {
        require_capability(token, capability)?;

        let current = load_scoped(&self.store.encounters, token, id)?;
        let next = current.apply(transition, Utc::now())?;
        let view = EncounterView::from(&next);
        self.store.encounters.save(next, current.version())?;

        record_write(&self.cfg, token, "encounter", transition.as_str(), id);
        Ok(view)
    }
}

//! Write operations for clinical notes.
//!
//! Notes are the one entity where authorship constrains writes: only the
//! original author may update or sign a draft. The authorship check runs
//! after the tenant-scoped load (so cross-tenant stays `NotFound`) and before
//! transition legality (so a foreign author sees `AccessDenied`, not the
//! note's state).

use crate::audit::record_write;
use crate::authority::{AuthorityToken, Capability};
use crate::config::CoreConfig;
use crate::error::{DomainError, DomainResult};
use crate::note::{ClinicalNote, NoteTransition};
use crate::read::NoteView;
use crate::services::shared::{load_scoped, require_capability};
use crate::store::Datastore;
use chrono::Utc;
use crs_types::NonEmptyText;
use std::sync::Arc;
use uuid::Uuid;

/// Service for clinical note lifecycle operations.
#[derive(Clone)]
pub struct NoteService {
    store: Arc<Datastore>,
    cfg: Arc<CoreConfig>,
}

impl NoteService {
    pub fn new(store: Arc<Datastore>, cfg: Arc<CoreConfig>) -> Self {
        Self { store, cfg }
    }

    /// Creates a draft note against an encounter, with the initial content as
    /// version 1 and the token's actor recorded as the author.
    ///
    /// # Errors
    ///
    /// - `AccessDenied` if `note-create` was not declared;
    /// - `NotFound` if the encounter does not exist in the token's tenant;
    /// - `Conflict`/`System` from the persistence adapter.
    pub fn create_draft(
        &self,
        token: &AuthorityToken,
        encounter_id: Uuid,
        content: NonEmptyText,
    ) -> DomainResult<NoteView> {
        require_capability(token, Capability::NoteCreate)?;

        let encounter = self
            .store
            .encounters
            .find_by_id(token.tenant_id(), encounter_id)?
            .ok_or(DomainError::NotFound("encounter"))?;

        let note = ClinicalNote::create(
            token.tenant_id().clone(),
            encounter_id,
            encounter.patient_id(),
            token.actor_id().clone(),
            content,
            Utc::now(),
        );
        let view = NoteView::from(&note);
        self.store.notes.insert(note)?;

        record_write(&self.cfg, token, "clinical note", "create", view.id);
        Ok(view)
    }

    /// Replaces the content of a draft, appending a new version.
    ///
    /// # Errors
    ///
    /// - `AccessDenied` if `note-update` was not declared or the actor is not
    ///   the note's author;
    /// - `NotFound` if the note does not exist in the token's tenant;
    /// - `Conflict` if the note is signed, or the write raced.
    pub fn update_draft(
        &self,
        token: &AuthorityToken,
        id: Uuid,
        content: NonEmptyText,
    ) -> DomainResult<NoteView> {
        self.transition(
            token,
            id,
            NoteTransition::UpdateDraft { content },
            Capability::NoteUpdate,
        )
    }

    /// Signs a draft, freezing it. `Signed` is terminal.
    ///
    /// # Errors
    ///
    /// - `AccessDenied` if `note-sign` was not declared or the actor is not
    ///   the note's author;
    /// - `NotFound` if the note does not exist in the token's tenant;
    /// - `Conflict` if the note is already signed, or the write raced.
    pub fn sign(&self, token: &AuthorityToken, id: Uuid) -> DomainResult<NoteView> {
        self.transition(token, id, NoteTransition::Sign, Capability::NoteSign)
    }

    fn transition(
        &self,
        token: &AuthorityToken,
        id: Uuid,
        transition: NoteTransition,
        capability: Capability,
    ) -> DomainResult<NoteView> {
        require_capability(token, capability)?;

        let current = load_scoped(&self.store.notes, token, id)?;
        if current.author_id() != token.actor_id() {
            return Err(DomainError::AccessDenied);
        }

        let action = transition.as_str();
        let next = current.apply(transition, Utc::now())?;
        let view = NoteView::from(&next);
        self.store.notes.save(next, current.version())?;

        record_write(&self.cfg, token, "clinical note", action, id);
        Ok(view)
    }
}

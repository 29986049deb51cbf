//! The clinical note entity and its state machine.
//!
//! A note is authored once and then lives as `Draft → ... → Draft → Signed`.
//! Draft updates are append-only: each one produces a new immutable
//! [`NoteVersion`] with a number exactly one higher than the last, never an
//! in-place overwrite. Signing freezes the note; `Signed` is terminal and
//! every later mutation attempt is a `Conflict`.
//!
//! Authorship matters here in a way it does not for encounters: only the
//! original author may update or sign a draft. That check lives in the write
//! model ([`crate::services::note`]); this module only encodes what edges
//! exist.

use crate::error::{DomainError, DomainResult};
use crate::ids::{new_entity_id, ActorId, TenantId};
use chrono::{DateTime, Utc};
use crs_types::NonEmptyText;
use serde::Serialize;
use uuid::Uuid;

/// The lifecycle states of a clinical note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoteStatus {
    Draft,
    Signed,
}

impl NoteStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Signed)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Signed => "SIGNED",
        }
    }
}

/// The closed set of legal note transitions.
#[derive(Debug, Clone)]
pub enum NoteTransition {
    /// Replace the draft content, appending a new version.
    UpdateDraft { content: NonEmptyText },
    /// Finalise the note. Carries no fields: signing freezes what is there.
    Sign,
}

impl NoteTransition {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UpdateDraft { .. } => "update-draft",
            Self::Sign => "sign",
        }
    }
}

/// One immutable entry in a note's append-only version history.
#[derive(Debug, Clone, Serialize)]
pub struct NoteVersion {
    pub number: u64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A clinical note owned by one tenant, attached to one encounter, and
/// mutable only by its original author while in draft.
#[derive(Debug, Clone)]
pub struct ClinicalNote {
    id: Uuid,
    tenant_id: TenantId,
    encounter_id: Uuid,
    patient_id: Uuid,
    author_id: ActorId,
    status: NoteStatus,
    versions: Vec<NoteVersion>,
    signed_at: Option<DateTime<Utc>>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ClinicalNote {
    /// Creates a fresh draft with the initial content as version 1.
    pub(crate) fn create(
        tenant_id: TenantId,
        encounter_id: Uuid,
        patient_id: Uuid,
        author_id: ActorId,
        content: NonEmptyText,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_entity_id(),
            tenant_id,
            encounter_id,
            patient_id,
            author_id,
            status: NoteStatus::Draft,
            versions: vec![NoteVersion {
                number: 1,
                content: content.into_inner(),
                created_at: now,
            }],
            signed_at: None,
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

    pub fn encounter_id(&self) -> Uuid {
        self.encounter_id
    }

    pub fn patient_id(&self) -> Uuid {
        self.patient_id
    }

    pub fn author_id(&self) -> &ActorId {
        &self.author_id
    }

    pub fn status(&self) -> NoteStatus {
        self.status
    }

    /// The highest content version number. At least 1: a note is created with
    /// its initial content.
    pub fn latest_version(&self) -> u64 {
        // versions is non-empty by construction and append-only thereafter.
        self.versions.last().map(|v| v.number).unwrap_or(0)
    }

    /// The content of the latest version.
    pub fn content(&self) -> &str {
        self.versions.last().map(|v| v.content.as_str()).unwrap_or("")
    }

    /// The full append-only version history, oldest first.
    pub fn versions(&self) -> &[NoteVersion] {
        &self.versions
    }

    pub fn signed_at(&self) -> Option<DateTime<Utc>> {
        self.signed_at
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
    /// Pure, like [`crate::encounter::Encounter::apply`]: failure leaves the
    /// original record byte-for-byte unchanged.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` for any transition against a `Signed`
    /// note.
    pub(crate) fn apply(
        &self,
        transition: NoteTransition,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if self.status.is_terminal() {
            return Err(DomainError::Conflict(format!(
                "cannot {} a note in the {} state",
                transition.as_str(),
                self.status.as_str()
            )));
        }

        let mut next = self.clone();
        match transition {
            NoteTransition::UpdateDraft { content } => {
                next.versions.push(NoteVersion {
                    number: self.latest_version() + 1,
                    content: content.into_inner(),
                    created_at: now,
                });
            }
            NoteTransition::Sign => {
                next.status = NoteStatus::Signed;
                next.signed_at = Some(now);
            }
        }
        next.version = self.version + 1;
        next.updated_at = now;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(content: &str) -> ClinicalNote {
        ClinicalNote::create(
            TenantId::parse("t1").expect("tenant"),
            new_entity_id(),
            new_entity_id(),
            ActorId::parse("a1").expect("actor"),
            NonEmptyText::new(content).expect("content"),
            Utc::now(),
        )
    }

    fn updated(note: &ClinicalNote, content: &str) -> ClinicalNote {
        note.apply(
            NoteTransition::UpdateDraft {
                content: NonEmptyText::new(content).expect("content"),
            },
            Utc::now(),
        )
        .expect("update should succeed")
    }

    #[test]
    fn create_is_draft_version_one_with_initial_content() {
        let note = draft("Initial");
        assert_eq!(note.status(), NoteStatus::Draft);
        assert_eq!(note.latest_version(), 1);
        assert_eq!(note.content(), "Initial");
        assert!(note.signed_at().is_none());
    }

    #[test]
    fn each_update_appends_exactly_one_version() {
        let note = draft("Initial");
        let note = updated(&note, "Updated");
        assert_eq!(note.latest_version(), 2);
        assert_eq!(note.content(), "Updated");

        let note = updated(&note, "Third pass");
        assert_eq!(note.latest_version(), 3);

        // History is append-only: earlier versions survive verbatim.
        let numbers: Vec<u64> = note.versions().iter().map(|v| v.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(note.versions()[0].content, "Initial");
        assert_eq!(note.versions()[1].content, "Updated");
    }

    #[test]
    fn sign_freezes_the_note() {
        let note = updated(&draft("Initial"), "Updated");
        let signed = note.apply(NoteTransition::Sign, Utc::now()).expect("sign");
        assert_eq!(signed.status(), NoteStatus::Signed);
        assert!(signed.signed_at().is_some());
        assert_eq!(signed.content(), "Updated");

        // Any further transition conflicts, repeatedly.
        for _ in 0..3 {
            let err = signed
                .apply(
                    NoteTransition::UpdateDraft {
                        content: NonEmptyText::new("tamper").expect("content"),
                    },
                    Utc::now(),
                )
                .expect_err("should conflict");
            assert!(matches!(err, DomainError::Conflict(_)));
        }
        let err = signed
            .apply(NoteTransition::Sign, Utc::now())
            .expect_err("re-sign should conflict");
        assert!(matches!(err, DomainError::Conflict(_)));

        assert_eq!(signed.content(), "Updated");
        assert_eq!(signed.latest_version(), 2);
    }

    #[test]
    fn signing_does_not_add_a_content_version() {
        let note = draft("Initial");
        let signed = note.apply(NoteTransition::Sign, Utc::now()).expect("sign");
        assert_eq!(signed.latest_version(), 1);
        assert_eq!(signed.versions().len(), 1);
    }
}

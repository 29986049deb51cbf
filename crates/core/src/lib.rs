//! # CRS Core
//!
//! The authorization-and-lifecycle core of the CRS clinical record service.
//!
//! Writes to clinical entities (encounters, clinical notes, patient records)
//! are gated by a server-issued [`AuthorityToken`], progressed through strict
//! per-entity state machines, and persisted under tenant isolation with
//! post-finalization immutability. Reads go through a separate, token-free
//! [`ReadService`] that returns frozen projections.
//!
//! **No API concerns**: HTTP extraction, routing, and status mapping belong in
//! `api-rest`/`api-shared`. Transport code hands in an [`AuthorityCandidate`]
//! and maps the [`DomainError`] kinds it gets back; it never constructs
//! entities or touches the store directly.

pub mod authority;
pub mod config;
pub mod encounter;
pub mod error;
pub mod ids;
pub mod note;
pub mod patient;
pub mod read;
pub mod services;
pub mod store;

mod audit;

pub use authority::{authorize, AuthorityCandidate, AuthorityField, AuthorityToken, Capability};
pub use config::{service_name_from_env_value, CoreConfig, DEFAULT_SERVICE_NAME};
pub use encounter::{Encounter, EncounterStatus, EncounterTransition};
pub use error::{DomainError, DomainResult};
pub use ids::{parse_entity_id, ActorId, TenantId};
pub use note::{ClinicalNote, NoteStatus, NoteTransition, NoteVersion};
pub use patient::{Demographics, PatientRecord};
pub use read::{EncounterView, NoteView, PatientView, ReadService};
pub use services::{EncounterService, NoteService, PatientService};
pub use store::{Datastore, StorageRow, TenantStore};

// Re-export the shared vocabulary types so boundary crates only need one
// dependency for domain payloads.
pub use crs_types::{Mrn, NonEmptyText, TextError};

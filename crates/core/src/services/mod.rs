//! The write model.
//!
//! One service per mutable entity, all running the same pipeline from
//! [`shared`]: capability check → tenant-scoped load → second-line tenant
//! check → authorship check where it applies → transition legality →
//! compare-and-set persist → audit. The concrete services supply only the
//! entity-specific rules; everything boundary- or authorization-shaped lives
//! in one place so no entity can drift from the contract.
//!
//! Error kinds pass through unchanged — the boundary layer depends on exact
//! kind-to-status mapping, so nothing here re-interprets a failure.

pub mod encounter;
pub mod note;
pub mod patient;
pub(crate) mod shared;

pub use encounter::EncounterService;
pub use note::NoteService;
pub use patient::PatientService;

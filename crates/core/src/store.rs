//! The persistence adapter.
//!
//! Maps domain records to storage rows and enforces, independently of the
//! write model, the storage-boundary half of the core's guarantees:
//!
//! - every query is scoped by tenant (the tenant id is part of the row key,
//!   so an unscoped lookup is unwritable, not just forbidden);
//! - a row whose stored status is terminal can never be overwritten, even if
//!   the adapter is invoked directly;
//! - saves are compare-and-set on the row version, so a write against a stale
//!   version fails as a conflict instead of silently clobbering a concurrent
//!   writer;
//! - not-found is `Ok(None)`, never an error;
//! - returned rows are owned clones, so mutating a returned record has zero
//!   effect on stored state.
//!
//! The check-and-swap runs under a single write lock per store, which gives
//! each write operation its single-writer-per-entity critical section. Writes
//! to different entity kinds, and reads anywhere, never contend on the same
//! lock exclusively. A poisoned lock surfaces as `DomainError::System` rather
//! than a panic; callers must not retry automatically.

use crate::encounter::Encounter;
use crate::error::{DomainError, DomainResult};
use crate::ids::TenantId;
use crate::note::ClinicalNote;
use crate::patient::PatientRecord;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// What the adapter needs to know about a record to store it safely.
pub trait StorageRow: Clone {
    /// Human-readable entity kind, used in adapter error messages.
    const ENTITY: &'static str;

    fn id(&self) -> Uuid;
    fn tenant_id(&self) -> &TenantId;
    /// Optimistic-concurrency counter; must advance by exactly 1 per save.
    fn version(&self) -> u64;
    /// The owning parent within the same tenant, if any (notes → encounter,
    /// encounters → patient).
    fn parent_id(&self) -> Option<Uuid>;
    /// Whether the stored status forbids any further overwrite.
    fn is_terminal(&self) -> bool;
    fn created_at(&self) -> DateTime<Utc>;
}

impl StorageRow for Encounter {
    const ENTITY: &'static str = "encounter";

    fn id(&self) -> Uuid {
        Encounter::id(self)
    }
    fn tenant_id(&self) -> &TenantId {
        Encounter::tenant_id(self)
    }
    fn version(&self) -> u64 {
        Encounter::version(self)
    }
    fn parent_id(&self) -> Option<Uuid> {
        Some(self.patient_id())
    }
    fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }
    fn created_at(&self) -> DateTime<Utc> {
        Encounter::created_at(self)
    }
}

impl StorageRow for ClinicalNote {
    const ENTITY: &'static str = "clinical note";

    fn id(&self) -> Uuid {
        ClinicalNote::id(self)
    }
    fn tenant_id(&self) -> &TenantId {
        ClinicalNote::tenant_id(self)
    }
    fn version(&self) -> u64 {
        ClinicalNote::version(self)
    }
    fn parent_id(&self) -> Option<Uuid> {
        Some(self.encounter_id())
    }
    fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }
    fn created_at(&self) -> DateTime<Utc> {
        ClinicalNote::created_at(self)
    }
}

impl StorageRow for PatientRecord {
    const ENTITY: &'static str = "patient record";

    fn id(&self) -> Uuid {
        PatientRecord::id(self)
    }
    fn tenant_id(&self) -> &TenantId {
        PatientRecord::tenant_id(self)
    }
    fn version(&self) -> u64 {
        PatientRecord::version(self)
    }
    fn parent_id(&self) -> Option<Uuid> {
        None
    }
    // Patient records have no terminal state.
    fn is_terminal(&self) -> bool {
        false
    }
    fn created_at(&self) -> DateTime<Utc> {
        PatientRecord::created_at(self)
    }
}

/// An in-memory, tenant-keyed row store for one entity kind.
pub struct TenantStore<R> {
    rows: RwLock<HashMap<(TenantId, Uuid), R>>,
}

impl<R> Default for TenantStore<R> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<R: StorageRow> TenantStore<R> {
    fn read_rows(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, HashMap<(TenantId, Uuid), R>>> {
        self.rows
            .read()
            .map_err(|_| DomainError::System(format!("{} store is unavailable", R::ENTITY)))
    }

    fn write_rows(
        &self,
    ) -> DomainResult<std::sync::RwLockWriteGuard<'_, HashMap<(TenantId, Uuid), R>>> {
        self.rows
            .write()
            .map_err(|_| DomainError::System(format!("{} store is unavailable", R::ENTITY)))
    }

    /// Inserts a freshly-created row.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if a row with the same id already exists in the
    /// tenant, `System` if the store is unavailable.
    pub fn insert(&self, row: R) -> DomainResult<()> {
        let key = (row.tenant_id().clone(), row.id());
        let mut rows = self.write_rows()?;
        if rows.contains_key(&key) {
            return Err(DomainError::Conflict(format!(
                "{} already exists",
                R::ENTITY
            )));
        }
        rows.insert(key, row);
        Ok(())
    }

    /// Persists a successor row via compare-and-set on the stored version.
    ///
    /// The check and the swap happen under one write lock; a concurrent
    /// writer of the same row loses with `Conflict` instead of overwriting.
    ///
    /// # Errors
    ///
    /// - `Conflict` if no row exists to replace, the stored row is terminal,
    ///   or the stored version does not equal `expected_version`;
    /// - `System` if the successor does not advance the version by exactly 1
    ///   (a write-model defect, surfaced rather than persisted) or the store
    ///   is unavailable.
    pub fn save(&self, row: R, expected_version: u64) -> DomainResult<()> {
        if row.version() != expected_version + 1 {
            return Err(DomainError::System(format!(
                "{} version must advance by exactly 1",
                R::ENTITY
            )));
        }

        let key = (row.tenant_id().clone(), row.id());
        let mut rows = self.write_rows()?;

        let stored = rows.get(&key).ok_or_else(|| {
            DomainError::Conflict(format!("{} no longer exists", R::ENTITY))
        })?;

        if stored.is_terminal() {
            return Err(DomainError::Conflict(format!(
                "{} is finalised and immutable",
                R::ENTITY
            )));
        }
        if stored.version() != expected_version {
            return Err(DomainError::Conflict(format!(
                "{} was modified concurrently (stale version)",
                R::ENTITY
            )));
        }

        rows.insert(key, row);
        Ok(())
    }

    /// Looks up a row by id within a tenant. Absent rows — including rows
    /// that exist under a different tenant — are `Ok(None)`.
    pub fn find_by_id(&self, tenant_id: &TenantId, id: Uuid) -> DomainResult<Option<R>> {
        let rows = self.read_rows()?;
        Ok(rows.get(&(tenant_id.clone(), id)).cloned())
    }

    /// Returns all rows in a tenant owned by the given parent, oldest first.
    pub fn find_by_parent(&self, tenant_id: &TenantId, parent_id: Uuid) -> DomainResult<Vec<R>> {
        let rows = self.read_rows()?;
        let mut found: Vec<R> = rows
            .iter()
            .filter(|((t, _), row)| t == tenant_id && row.parent_id() == Some(parent_id))
            .map(|(_, row)| row.clone())
            .collect();
        found.sort_by_key(|r| (r.created_at(), r.id()));
        Ok(found)
    }

    /// Returns all rows in a tenant, oldest first.
    pub fn list_by_tenant(&self, tenant_id: &TenantId) -> DomainResult<Vec<R>> {
        let rows = self.read_rows()?;
        let mut found: Vec<R> = rows
            .iter()
            .filter(|((t, _), _)| t == tenant_id)
            .map(|(_, row)| row.clone())
            .collect();
        found.sort_by_key(|r| (r.created_at(), r.id()));
        Ok(found)
    }
}

impl TenantStore<PatientRecord> {
    /// Looks up a patient by MRN within a tenant.
    pub fn find_by_mrn(
        &self,
        tenant_id: &TenantId,
        mrn: &crs_types::Mrn,
    ) -> DomainResult<Option<PatientRecord>> {
        let rows = self.read_rows()?;
        Ok(rows
            .iter()
            .find(|((t, _), row)| t == tenant_id && row.mrn() == mrn)
            .map(|(_, row)| row.clone()))
    }

    /// Inserts a patient row, enforcing per-tenant MRN uniqueness under the
    /// same write lock as the insert (no check-then-insert race).
    ///
    /// # Errors
    ///
    /// `Validation` on a duplicate MRN, `Conflict` on a duplicate id,
    /// `System` if the store is unavailable.
    pub fn insert_unique_mrn(&self, row: PatientRecord) -> DomainResult<()> {
        let key = (row.tenant_id().clone(), row.id());
        let mut rows = self.write_rows()?;

        let duplicate = rows
            .iter()
            .any(|((t, _), stored)| t == row.tenant_id() && stored.mrn() == row.mrn());
        if duplicate {
            return Err(DomainError::Validation(format!(
                "mrn '{}' is already registered in this tenant",
                row.mrn()
            )));
        }
        if rows.contains_key(&key) {
            return Err(DomainError::Conflict("patient record already exists".into()));
        }

        rows.insert(key, row);
        Ok(())
    }
}

/// The three entity stores bundled for sharing across services.
#[derive(Default)]
pub struct Datastore {
    pub encounters: TenantStore<Encounter>,
    pub notes: TenantStore<ClinicalNote>,
    pub patients: TenantStore<PatientRecord>,
}

impl Datastore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::EncounterTransition;
    use crate::ids::{new_entity_id, ActorId};
    use crate::note::NoteTransition;
    use crate::patient::Demographics;
    use crs_types::{Mrn, NonEmptyText};

    fn tenant(name: &str) -> TenantId {
        TenantId::parse(name).expect("tenant")
    }

    fn encounter_in(t: &str) -> Encounter {
        Encounter::create(tenant(t), new_entity_id(), Utc::now())
    }

    fn patient_in(t: &str, mrn: &str) -> PatientRecord {
        PatientRecord::register(
            tenant(t),
            Mrn::parse(mrn).expect("mrn"),
            Demographics {
                given_names: vec![NonEmptyText::new("Ada").expect("name")],
                family_name: NonEmptyText::new("Lovelace").expect("family"),
                birth_date: None,
            },
            ActorId::parse("a1").expect("actor"),
            Utc::now(),
        )
    }

    #[test]
    fn find_by_id_is_tenant_scoped() {
        let store = TenantStore::<Encounter>::default();
        let e = encounter_in("t1");
        let id = e.id();
        store.insert(e).expect("insert");

        assert!(store
            .find_by_id(&tenant("t1"), id)
            .expect("find")
            .is_some());
        // Same id, other tenant: indistinguishable from absent.
        assert!(store
            .find_by_id(&tenant("t2"), id)
            .expect("find")
            .is_none());
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let store = TenantStore::<Encounter>::default();
        let e = encounter_in("t1");
        store.insert(e.clone()).expect("first insert");

        let err = store.insert(e).expect_err("duplicate id should fail");
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn poisoned_lock_surfaces_as_system_error() {
        let store = TenantStore::<Encounter>::default();
        let e = encounter_in("t1");
        let id = e.id();
        store.insert(e).expect("insert");

        // Panic while holding the write guard to poison the lock.
        std::thread::scope(|s| {
            let handle = s.spawn(|| {
                let _guard = store.rows.write().expect("write lock");
                panic!("simulated writer crash");
            });
            assert!(handle.join().is_err());
        });

        let read_err = store
            .find_by_id(&tenant("t1"), id)
            .expect_err("reads against a poisoned store should error");
        assert!(matches!(read_err, DomainError::System(_)));

        let write_err = store
            .insert(encounter_in("t1"))
            .expect_err("writes against a poisoned store should error");
        assert!(matches!(write_err, DomainError::System(_)));
    }

    #[test]
    fn save_rejects_stale_versions() {
        let store = TenantStore::<Encounter>::default();
        let e = encounter_in("t1");
        store.insert(e.clone()).expect("insert");

        let next = e
            .apply(EncounterTransition::Activate, Utc::now())
            .expect("activate");
        store.save(next.clone(), e.version()).expect("first save");

        // A second writer holding the original version loses.
        let racer = e
            .apply(EncounterTransition::Activate, Utc::now())
            .expect("activate");
        let err = store.save(racer, e.version()).expect_err("should conflict");
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn save_rejects_terminal_rows_even_when_invoked_directly() {
        let store = TenantStore::<ClinicalNote>::default();
        let draft = ClinicalNote::create(
            tenant("t1"),
            new_entity_id(),
            new_entity_id(),
            ActorId::parse("a1").expect("actor"),
            NonEmptyText::new("Initial").expect("content"),
            Utc::now(),
        );
        store.insert(draft.clone()).expect("insert");

        let signed = draft.apply(NoteTransition::Sign, Utc::now()).expect("sign");
        store.save(signed.clone(), draft.version()).expect("save signed");

        // Hand-roll a successor past the state machine; the adapter still
        // refuses to touch a terminal row.
        let tampered = draft
            .apply(
                NoteTransition::UpdateDraft {
                    content: NonEmptyText::new("tamper").expect("content"),
                },
                Utc::now(),
            )
            .expect("apply on stale copy");
        let err = store
            .save(tampered, draft.version())
            .expect_err("should conflict");
        assert!(matches!(err, DomainError::Conflict(_)));

        let stored = store
            .find_by_id(&tenant("t1"), draft.id())
            .expect("find")
            .expect("present");
        assert_eq!(stored.content(), "Initial");
    }

    #[test]
    fn save_rejects_version_jumps_as_system_defect() {
        let store = TenantStore::<Encounter>::default();
        let e = encounter_in("t1");
        store.insert(e.clone()).expect("insert");

        // Claiming expected_version one behind what the successor implies.
        let next = e
            .apply(EncounterTransition::Activate, Utc::now())
            .expect("activate");
        let err = store.save(next, e.version() + 1).expect_err("should fail");
        assert!(matches!(err, DomainError::System(_)));
    }

    #[test]
    fn not_found_is_none_not_an_error() {
        let store = TenantStore::<Encounter>::default();
        let found = store
            .find_by_id(&tenant("t1"), new_entity_id())
            .expect("should not error");
        assert!(found.is_none());
    }

    #[test]
    fn find_by_parent_filters_by_tenant_and_parent() {
        let store = TenantStore::<Encounter>::default();
        let patient = new_entity_id();
        let e1 = Encounter::create(tenant("t1"), patient, Utc::now());
        let e2 = Encounter::create(tenant("t1"), patient, Utc::now());
        let other_parent = Encounter::create(tenant("t1"), new_entity_id(), Utc::now());
        let other_tenant = Encounter::create(tenant("t2"), patient, Utc::now());
        for e in [e1, e2, other_parent, other_tenant] {
            store.insert(e).expect("insert");
        }

        let found = store
            .find_by_parent(&tenant("t1"), patient)
            .expect("find_by_parent");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|e| e.patient_id() == patient));
    }

    #[test]
    fn insert_unique_mrn_enforces_per_tenant_uniqueness() {
        let store = TenantStore::<PatientRecord>::default();
        store
            .insert_unique_mrn(patient_in("t1", "MRN-001"))
            .expect("first insert");

        let err = store
            .insert_unique_mrn(patient_in("t1", "mrn-001"))
            .expect_err("duplicate should fail");
        assert!(matches!(err, DomainError::Validation(_)));

        // Same MRN in a different tenant is fine.
        store
            .insert_unique_mrn(patient_in("t2", "MRN-001"))
            .expect("other tenant insert");
    }

    #[test]
    fn returned_rows_are_snapshots() {
        let store = TenantStore::<PatientRecord>::default();
        let p = patient_in("t1", "MRN-001");
        let id = p.id();
        store.insert_unique_mrn(p).expect("insert");

        // Dropping a returned clone has no effect on the stored row.
        let copy = store
            .find_by_id(&tenant("t1"), id)
            .expect("find")
            .expect("present");
        drop(copy);

        assert!(store
            .find_by_id(&tenant("t1"), id)
            .expect("find")
            .is_some());
    }
}

//! # Named Location Registry
//!
//! Case-insensitive, durably persisted storage of named locations. Warps use
//! a [`NamedLocationRegistry`] directly; homes reuse its [`Namespace`]
//! building block once per player (see [`crate::homes`]).
//!
//! ## Keys
//!
//! Names are stored under a folded key (trimmed, lowercased) while the
//! record keeps the name exactly as the player typed it. `"Spawn"` and
//! `"SPAWN"` are the same entry; the second add is a conflict.
//!
//! ## Persistence
//!
//! Mutations are persisted before they become visible: the registry builds
//! the full list as it will look after the change, writes it, and only then
//! updates the map. A failed write therefore leaves memory and disk as they
//! were. Mutations of one registry are serialized by a writer lock so two
//! concurrent saves can never race each other's snapshot; lookups and
//! listings never take that lock.

use crate::codec;
use crate::error::{EssentialsError, Result};
use crate::location::{Location, LocationRecord};
use crate::storage::{self, DataFile};
use dashmap::DashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Folds a name to its registry key.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Trimmed display name, or `InvalidInput` when nothing is left.
pub(crate) fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(EssentialsError::InvalidInput(
            "location name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Orders records by case-insensitive name, display name as tie-breaker.
pub(crate) fn sort_records(records: &mut [LocationRecord]) {
    records.sort_by_cached_key(|record| (record.name.to_lowercase(), record.name.clone()));
}

pub(crate) fn lock_writer(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    // The guarded value is `()`, so a poisoned lock holds no broken state.
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory set of uniquely named records.
#[derive(Debug, Default)]
pub struct Namespace {
    entries: DashMap<String, LocationRecord>,
}

impl Namespace {
    pub fn get(&self, name: &str) -> Option<LocationRecord> {
        self.entries
            .get(&normalize(name))
            .map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&normalize(name))
    }

    /// Snapshot of all records, sorted by name.
    pub fn list(&self) -> Vec<LocationRecord> {
        let mut records: Vec<_> = self
            .entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        sort_records(&mut records);
        records
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts without a uniqueness check; returns the record it replaced.
    pub(crate) fn insert(&self, record: LocationRecord) -> Option<LocationRecord> {
        self.entries.insert(normalize(&record.name), record)
    }

    pub(crate) fn remove(&self, name: &str) -> Option<LocationRecord> {
        self.entries.remove(&normalize(name)).map(|(_, record)| record)
    }
}

/// Global namespace of named locations backed by one JSON array file.
pub struct NamedLocationRegistry {
    kind: &'static str,
    entries: Namespace,
    file: DataFile,
    writer: Mutex<()>,
}

impl NamedLocationRegistry {
    /// Opens the registry, loading whatever `file` currently holds.
    ///
    /// `kind` names the registry in log output ("warp").
    pub fn open(kind: &'static str, file: DataFile) -> Self {
        let entries = Namespace::default();
        let loaded = storage::load_decoded(&file, kind, codec::decode_warps);
        for record in loaded {
            if let Some(previous) = entries.insert(record) {
                debug!("Duplicate {} '{}' in {}, keeping the later entry", kind, previous.name, file.path().display());
            }
        }
        info!("Loaded {} {} location(s) from {}", entries.len(), kind, file.path().display());

        Self {
            kind,
            entries,
            file,
            writer: Mutex::new(()),
        }
    }

    pub fn get(&self, name: &str) -> Option<LocationRecord> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(name)
    }

    pub fn list(&self) -> Vec<LocationRecord> {
        self.entries.list()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn file(&self) -> &DataFile {
        &self.file
    }

    /// Captures `location` under `name` and stores it.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a blank name or a location without dimension
    /// - `Conflict` when the name is taken, compared case-insensitively
    /// - `Persistence` when the file could not be written; nothing changes
    pub fn add(&self, name: &str, location: &Location) -> Result<LocationRecord> {
        let name = validate_name(name)?;
        let record = LocationRecord::capture(name, location)?;
        self.insert_record(record)
    }

    /// Stores an already captured record with the same rules as [`add`](Self::add).
    pub fn insert_record(&self, mut record: LocationRecord) -> Result<LocationRecord> {
        record.name = validate_name(&record.name)?.to_string();
        record.check_finite()?;

        let _writer = lock_writer(&self.writer);
        if let Some(existing) = self.entries.get(&record.name) {
            return Err(EssentialsError::Conflict(format!(
                "{} '{}' already exists",
                self.kind, existing.name
            )));
        }

        let mut snapshot = self.entries.list();
        snapshot.push(record.clone());
        sort_records(&mut snapshot);
        self.persist(&snapshot)?;

        self.entries.insert(record.clone());
        info!("Added {} '{}' in {}", self.kind, record.name, record.world_name);
        Ok(record)
    }

    /// Removes the entry stored under `name`.
    ///
    /// `Ok(false)` when there was none; the file is not touched in that case.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let key = normalize(name);

        let _writer = lock_writer(&self.writer);
        if !self.entries.contains(name) {
            debug!("No {} named '{}' to remove", self.kind, name);
            return Ok(false);
        }

        let snapshot: Vec<_> = self
            .entries
            .list()
            .into_iter()
            .filter(|record| normalize(&record.name) != key)
            .collect();
        self.persist(&snapshot)?;

        if let Some(removed) = self.entries.remove(name) {
            info!("Removed {} '{}'", self.kind, removed.name);
        }
        Ok(true)
    }

    fn persist(&self, snapshot: &[LocationRecord]) -> Result<()> {
        let json = codec::encode_warps(snapshot).map_err(|e| storage::encode_error(&self.file, e))?;
        self.file.write(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::DimensionRef;
    use crate::storage::WriteMode;
    use crate::types::Position;
    use std::fs;
    use tempfile::TempDir;

    fn location(x: f64) -> Location {
        Location::new(DimensionRef::new("world", 0), Position::new(x, 64.0, 0.0), 0.0, 90.0)
    }

    fn open(dir: &TempDir, mode: WriteMode) -> NamedLocationRegistry {
        NamedLocationRegistry::open("warp", DataFile::new(dir.path().join("warp.json"), mode))
    }

    fn tuples(records: &[LocationRecord]) -> Vec<(String, String, i32, f64, f64, f64, f64, f64)> {
        let mut tuples: Vec<_> = records
            .iter()
            .map(|r| (r.name.clone(), r.world_name.clone(), r.dimension_id, r.x, r.y, r.z, r.pitch, r.yaw))
            .collect();
        tuples.sort_by(|a, b| a.0.cmp(&b.0));
        tuples
    }

    #[test]
    fn test_case_insensitive_collision_keeps_first() {
        let dir = TempDir::new().unwrap();
        let warps = open(&dir, WriteMode::Atomic);

        warps.add("Spawn", &location(1.0)).unwrap();
        let err = warps.add("SPAWN", &location(2.0)).unwrap_err();
        assert!(matches!(err, EssentialsError::Conflict(_)));

        let kept = warps.get("spawn").unwrap();
        assert_eq!(kept.name, "Spawn");
        assert_eq!(kept.x, 1.0);
        assert_eq!(warps.len(), 1);
    }

    #[test]
    fn test_add_remove_get() {
        let dir = TempDir::new().unwrap();
        let warps = open(&dir, WriteMode::Atomic);

        warps.add("Market", &location(5.0)).unwrap();
        assert!(warps.remove("market").unwrap());
        assert!(warps.get("Market").is_none());
        assert!(!warps.remove("Market").unwrap());
    }

    #[test]
    fn test_reload_yields_same_entries() {
        let dir = TempDir::new().unwrap();
        let before = {
            let warps = open(&dir, WriteMode::Truncate);
            warps.add("b-side", &location(1.0)).unwrap();
            warps.add("Arena", &location(2.5)).unwrap();
            warps.add("Docks", &location(-7.0)).unwrap();
            warps.remove("docks").unwrap();
            warps.list()
        };

        let reloaded = open(&dir, WriteMode::Truncate);
        assert_eq!(tuples(&before), tuples(&reloaded.list()));
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn test_list_is_sorted_case_insensitively() {
        let dir = TempDir::new().unwrap();
        let warps = open(&dir, WriteMode::Atomic);
        for name in ["zeta", "Alpha", "beta", "Gamma"] {
            warps.add(name, &location(0.0)).unwrap();
        }
        let names: Vec<_> = warps.list().into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["Alpha", "beta", "Gamma", "zeta"]);
    }

    #[test]
    fn test_missing_file_then_first_add_creates_it() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("warp.json");
        let warps = open(&dir, WriteMode::Atomic);

        assert!(warps.list().is_empty());
        assert!(!path.exists());

        let spawn = location(3.0);
        warps.add("Spawn", &spawn).unwrap();

        let on_disk = codec::decode_warps(&fs::read_to_string(&path).unwrap()).unwrap().value;
        assert_eq!(on_disk, vec![LocationRecord::capture("Spawn", &spawn).unwrap()]);
    }

    #[test]
    fn test_invalid_input_is_rejected_without_mutation() {
        let dir = TempDir::new().unwrap();
        let warps = open(&dir, WriteMode::Atomic);

        let detached = Location::detached(Position::new(0.0, 0.0, 0.0), 0.0, 0.0);
        assert!(matches!(
            warps.add("Void", &detached),
            Err(EssentialsError::InvalidInput(_))
        ));
        assert!(matches!(
            warps.add("   ", &location(0.0)),
            Err(EssentialsError::InvalidInput(_))
        ));
        assert!(warps.is_empty());
        assert!(!dir.path().join("warp.json").exists());
    }

    #[test]
    fn test_non_finite_location_is_never_stored() {
        let dir = TempDir::new().unwrap();
        let warps = open(&dir, WriteMode::Atomic);

        let mut broken = location(0.0);
        broken.position.x = f64::NAN;
        broken.position.z = f64::INFINITY;
        assert!(matches!(
            warps.add("Spawn", &broken),
            Err(EssentialsError::InvalidInput(_))
        ));

        let mut record = LocationRecord::capture("Spawn", &location(0.0)).unwrap();
        record.pitch = f64::NAN;
        assert!(matches!(
            warps.insert_record(record),
            Err(EssentialsError::InvalidInput(_))
        ));

        assert!(warps.is_empty());
        assert!(!dir.path().join("warp.json").exists());

        // Whatever add accepts must come back after a reload.
        warps.add("Spawn", &location(f64::MAX)).unwrap();
        let reloaded = open(&dir, WriteMode::Atomic);
        assert_eq!(tuples(&warps.list()), tuples(&reloaded.list()));
    }

    #[test]
    fn test_failed_persist_leaves_registry_unchanged() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes every write fail.
        let blocked = dir.path().join("warp.json");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep"), "x").unwrap();

        for mode in [WriteMode::Atomic, WriteMode::Truncate] {
            let warps = NamedLocationRegistry::open("warp", DataFile::new(&blocked, mode));
            let err = warps.add("Spawn", &location(0.0)).unwrap_err();
            assert!(matches!(err, EssentialsError::Persistence { .. }));
            assert!(warps.get("Spawn").is_none());
        }
    }

    #[test]
    fn test_names_are_trimmed() {
        let dir = TempDir::new().unwrap();
        let warps = open(&dir, WriteMode::Atomic);
        let record = warps.add("  Harbor ", &location(0.0)).unwrap();
        assert_eq!(record.name, "Harbor");
        assert!(warps.contains("harbor"));
    }

    #[test]
    fn test_concurrent_adds_are_all_persisted() {
        let dir = TempDir::new().unwrap();
        let warps = open(&dir, WriteMode::Atomic);

        std::thread::scope(|scope| {
            for thread in 0..4 {
                let warps = &warps;
                scope.spawn(move || {
                    for i in 0..10 {
                        warps
                            .add(&format!("warp-{thread}-{i}"), &location(i as f64))
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(warps.len(), 40);
        let reloaded = open(&dir, WriteMode::Atomic);
        assert_eq!(reloaded.len(), 40);
    }
}

//! Per-player homes.
//!
//! Each player owns a private [`Namespace`]: two players may both have a
//! home called "Base", but one player cannot have "Base" and "base". All
//! players share one `home.json` file, an object keyed by player UUID.

use crate::codec;
use crate::error::{EssentialsError, Result};
use crate::location::{Location, LocationRecord};
use crate::registry::{lock_writer, normalize, sort_records, validate_name, Namespace};
use crate::storage::{self, DataFile};
use crate::types::PlayerId;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, info};

pub struct HomeRegistry {
    homes: DashMap<PlayerId, Namespace>,
    file: DataFile,
    writer: Mutex<()>,
}

impl HomeRegistry {
    pub fn open(file: DataFile) -> Self {
        let homes: DashMap<PlayerId, Namespace> = DashMap::new();
        let loaded = storage::load_decoded(&file, "home", codec::decode_homes);

        let mut total = 0;
        for (player, records) in loaded {
            let namespace = homes.entry(player).or_default();
            for record in records {
                total += 1;
                if let Some(previous) = namespace.insert(record) {
                    total -= 1;
                    debug!("Duplicate home '{}' for {}, keeping the later entry", previous.name, player);
                }
            }
        }
        homes.retain(|_, namespace| !namespace.is_empty());
        info!(
            "Loaded {} home(s) for {} player(s) from {}",
            total,
            homes.len(),
            file.path().display()
        );

        Self {
            homes,
            file,
            writer: Mutex::new(()),
        }
    }

    pub fn get(&self, player: PlayerId, name: &str) -> Option<LocationRecord> {
        self.homes.get(&player)?.get(name)
    }

    /// The player's homes sorted by name; empty when they have none.
    pub fn list(&self, player: PlayerId) -> Vec<LocationRecord> {
        self.homes
            .get(&player)
            .map(|namespace| namespace.list())
            .unwrap_or_default()
    }

    pub fn count(&self, player: PlayerId) -> usize {
        self.homes.get(&player).map_or(0, |namespace| namespace.len())
    }

    /// Players with at least one home, in UUID order.
    pub fn players(&self) -> Vec<PlayerId> {
        let mut players: Vec<_> = self
            .homes
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| *entry.key())
            .collect();
        players.sort_unstable();
        players
    }

    pub fn file(&self) -> &DataFile {
        &self.file
    }

    /// Captures `location` as a home of `player`.
    ///
    /// Same rules as [`crate::NamedLocationRegistry::add`], scoped to the player.
    pub fn add(&self, player: PlayerId, name: &str, location: &Location) -> Result<LocationRecord> {
        let name = validate_name(name)?;
        let record = LocationRecord::capture(name, location)?;
        self.insert_record(player, record)
    }

    pub fn insert_record(&self, player: PlayerId, mut record: LocationRecord) -> Result<LocationRecord> {
        record.name = validate_name(&record.name)?.to_string();
        record.check_finite()?;

        let _writer = lock_writer(&self.writer);
        if let Some(existing) = self.get(player, &record.name) {
            return Err(EssentialsError::Conflict(format!(
                "home '{}' already exists",
                existing.name
            )));
        }

        let mut snapshot = self.snapshot();
        let player_homes = snapshot.entry(player).or_default();
        player_homes.push(record.clone());
        sort_records(player_homes);
        self.persist(&snapshot)?;

        self.homes.entry(player).or_default().insert(record.clone());
        info!("Added home '{}' for {}", record.name, player);
        Ok(record)
    }

    /// Removes one of the player's homes; `Ok(false)` when it did not exist.
    pub fn remove(&self, player: PlayerId, name: &str) -> Result<bool> {
        let key = normalize(name);

        let _writer = lock_writer(&self.writer);
        if self.get(player, name).is_none() {
            debug!("No home named '{}' for {}", name, player);
            return Ok(false);
        }

        let mut snapshot = self.snapshot();
        if let Some(player_homes) = snapshot.get_mut(&player) {
            player_homes.retain(|record| normalize(&record.name) != key);
            if player_homes.is_empty() {
                snapshot.remove(&player);
            }
        }
        self.persist(&snapshot)?;

        let removed = self.homes.get(&player).and_then(|namespace| namespace.remove(name));
        self.homes.remove_if(&player, |_, namespace| namespace.is_empty());
        if let Some(removed) = removed {
            info!("Removed home '{}' for {}", removed.name, player);
        }
        Ok(true)
    }

    fn snapshot(&self) -> BTreeMap<PlayerId, Vec<LocationRecord>> {
        self.homes
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| (*entry.key(), entry.value().list()))
            .collect()
    }

    fn persist(&self, snapshot: &BTreeMap<PlayerId, Vec<LocationRecord>>) -> Result<()> {
        let json = codec::encode_homes(snapshot).map_err(|e| storage::encode_error(&self.file, e))?;
        self.file.write(&json)
    }
}

//! Last death location of each online player, used by `/back`.
//!
//! Never persisted: entries are dropped on disconnect and lost on restart.

use crate::location::{Location, LocationRecord};
use crate::types::PlayerId;
use dashmap::DashMap;
use tracing::debug;

/// Name given to recorded death locations.
pub const DEATH_NAME: &str = "death";

#[derive(Debug, Default)]
pub struct DeathLocationCache {
    locations: DashMap<PlayerId, LocationRecord>,
}

impl DeathLocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record` as the player's last death, replacing any earlier one.
    pub fn record(&self, player: PlayerId, record: LocationRecord) {
        self.locations.insert(player, record);
    }

    /// Captures and records a death location reported by the host.
    ///
    /// Returns `false` and records nothing when the host had no location or
    /// the location has no dimension.
    pub fn record_location(&self, player: PlayerId, location: Option<&Location>) -> bool {
        let Some(record) = location.and_then(|location| LocationRecord::capture(DEATH_NAME, location).ok())
        else {
            debug!("No usable death location for {}", player);
            return false;
        };
        self.record(player, record);
        debug!("Recorded death location for {}", player);
        true
    }

    pub fn get(&self, player: PlayerId) -> Option<LocationRecord> {
        self.locations.get(&player).map(|entry| entry.value().clone())
    }

    pub fn clear(&self, player: PlayerId) -> Option<LocationRecord> {
        self.locations.remove(&player).map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::DimensionRef;
    use crate::types::Position;

    fn died_at(x: f64) -> Location {
        Location::new(DimensionRef::new("world", 0), Position::new(x, 12.0, 0.0), 0.0, 0.0)
    }

    #[test]
    fn test_newest_death_wins_and_clear_removes() {
        let cache = DeathLocationCache::new();
        let player = PlayerId::new();

        assert!(cache.record_location(player, Some(&died_at(1.0))));
        assert!(cache.record_location(player, Some(&died_at(2.0))));
        assert_eq!(cache.get(player).unwrap().x, 2.0);

        assert!(cache.clear(player).is_some());
        assert!(cache.get(player).is_none());
        assert!(cache.clear(player).is_none());
    }

    #[test]
    fn test_get_does_not_consume() {
        let cache = DeathLocationCache::new();
        let player = PlayerId::new();
        cache.record_location(player, Some(&died_at(5.0)));
        assert!(cache.get(player).is_some());
        assert!(cache.get(player).is_some());
    }

    #[test]
    fn test_missing_location_records_nothing() {
        let cache = DeathLocationCache::new();
        let player = PlayerId::new();
        let detached = Location::detached(Position::new(0.0, 0.0, 0.0), 0.0, 0.0);

        assert!(!cache.record_location(player, None));
        assert!(!cache.record_location(player, Some(&detached)));
        assert!(cache.is_empty());
    }
}

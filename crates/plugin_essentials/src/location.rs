//! # Location snapshots
//!
//! A [`Location`] is what the host hands us when it captures where a player
//! is standing: a position, an orientation and, if the player is inside a
//! loaded world, the dimension. A [`LocationRecord`] is the immutable,
//! persistable snapshot taken from it.
//!
//! Records never hold a live dimension handle. They name the world and the
//! dimension id, and are resolved against the host's world model through a
//! [`WorldResolver`] only when someone actually teleports. A record whose
//! world has since been removed resolves to
//! [`EssentialsError::StaleReference`].

use crate::error::{EssentialsError, Result};
use crate::host::WorldResolver;
use crate::types::Position;
use serde::{Deserialize, Serialize};

/// World and dimension a location belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DimensionRef {
    /// Display name of the world
    pub world_name: String,
    /// Dimension id within the world
    pub dimension_id: i32,
}

impl DimensionRef {
    pub fn new(world_name: impl Into<String>, dimension_id: i32) -> Self {
        Self {
            world_name: world_name.into(),
            dimension_id,
        }
    }
}

/// A live location captured from the host.
///
/// `dimension` is `None` when the host could not tell which dimension the
/// player is in (for example while they are being transferred between
/// worlds). Such a location cannot be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub dimension: Option<DimensionRef>,
    pub position: Position,
    pub pitch: f64,
    pub yaw: f64,
}

impl Location {
    pub fn new(dimension: DimensionRef, position: Position, pitch: f64, yaw: f64) -> Self {
        Self {
            dimension: Some(dimension),
            position,
            pitch,
            yaw,
        }
    }

    /// A location that is not attached to any dimension.
    pub fn detached(position: Position, pitch: f64, yaw: f64) -> Self {
        Self {
            dimension: None,
            position,
            pitch,
            yaw,
        }
    }

    /// Binds the location to its live dimension.
    ///
    /// `InvalidInput` without a dimension, `StaleReference` when the host no
    /// longer knows it.
    pub fn resolve<W>(&self, world: &W) -> Result<ResolvedLocation<W::Dimension>>
    where
        W: WorldResolver + ?Sized,
    {
        let Some(dimension_ref) = &self.dimension else {
            return Err(EssentialsError::InvalidInput(
                "location has no dimension".to_string(),
            ));
        };
        let dimension = world
            .resolve(&dimension_ref.world_name, dimension_ref.dimension_id)
            .ok_or_else(|| EssentialsError::StaleReference {
                world_name: dimension_ref.world_name.clone(),
                dimension_id: dimension_ref.dimension_id,
            })?;

        Ok(ResolvedLocation {
            dimension,
            position: self.position,
            pitch: self.pitch,
            yaw: self.yaw,
        })
    }
}

/// Persistable named location.
///
/// The serde field names are the on-disk contract shared with existing
/// `warp.json`, `home.json` and `hub.json` files and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(rename = "name")]
    pub name: String,
    #[serde(rename = "worldName")]
    pub world_name: String,
    #[serde(rename = "dimensionId")]
    pub dimension_id: i32,
    #[serde(rename = "x")]
    pub x: f64,
    #[serde(rename = "y")]
    pub y: f64,
    #[serde(rename = "z")]
    pub z: f64,
    #[serde(rename = "pitch")]
    pub pitch: f64,
    #[serde(rename = "yaw")]
    pub yaw: f64,
}

impl LocationRecord {
    /// Takes a snapshot of `location` under `name`.
    ///
    /// Fails with `InvalidInput` when the location has no dimension.
    pub fn capture(name: impl Into<String>, location: &Location) -> Result<Self> {
        let name = name.into();
        let Some(dimension) = &location.dimension else {
            return Err(EssentialsError::InvalidInput(format!(
                "location for '{name}' has no dimension"
            )));
        };

        let record = Self {
            name,
            world_name: dimension.world_name.clone(),
            dimension_id: dimension.dimension_id,
            x: location.position.x,
            y: location.position.y,
            z: location.position.z,
            pitch: location.pitch,
            yaw: location.yaw,
        };
        record.check_finite()?;
        Ok(record)
    }

    /// `InvalidInput` unless every coordinate and angle is a finite number.
    ///
    /// JSON has no NaN or infinity; such a record would be written as
    /// `null` and dropped on the next load.
    pub fn check_finite(&self) -> Result<()> {
        let fields = [
            ("x", self.x),
            ("y", self.y),
            ("z", self.z),
            ("pitch", self.pitch),
            ("yaw", self.yaw),
        ];
        match fields.iter().find(|(_, value)| !value.is_finite()) {
            Some((field, value)) => Err(EssentialsError::InvalidInput(format!(
                "location '{}' has a non-finite {field} ({value})",
                self.name
            ))),
            None => Ok(()),
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y, self.z)
    }

    pub fn dimension(&self) -> DimensionRef {
        DimensionRef::new(self.world_name.clone(), self.dimension_id)
    }

    /// The snapshot as a host location, without checking that it still exists.
    pub fn to_location(&self) -> Location {
        Location::new(self.dimension(), self.position(), self.pitch, self.yaw)
    }

    /// Resolves the record against the live world model.
    pub fn resolve<W>(&self, world: &W) -> Result<ResolvedLocation<W::Dimension>>
    where
        W: WorldResolver + ?Sized,
    {
        self.to_location().resolve(world)
    }
}

/// A record bound to a live dimension of the host, ready to teleport to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation<D> {
    pub dimension: D,
    pub position: Position,
    pub pitch: f64,
    pub yaw: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Worlds(HashSet<(String, i32)>);

    impl WorldResolver for Worlds {
        type Dimension = (String, i32);

        fn resolve(&self, world_name: &str, dimension_id: i32) -> Option<Self::Dimension> {
            let key = (world_name.to_string(), dimension_id);
            self.0.contains(&key).then_some(key)
        }
    }

    fn overworld_spawn() -> Location {
        Location::new(
            DimensionRef::new("world", 0),
            Position::new(10.5, 64.0, -3.25),
            12.0,
            90.0,
        )
    }

    #[test]
    fn test_capture_copies_every_field() {
        let record = LocationRecord::capture("Spawn", &overworld_spawn()).unwrap();
        assert_eq!(record.name, "Spawn");
        assert_eq!(record.world_name, "world");
        assert_eq!(record.dimension_id, 0);
        assert_eq!(record.position(), Position::new(10.5, 64.0, -3.25));
        assert_eq!(record.pitch, 12.0);
        assert_eq!(record.yaw, 90.0);
    }

    #[test]
    fn test_capture_without_dimension_is_invalid() {
        let location = Location::detached(Position::new(0.0, 0.0, 0.0), 0.0, 0.0);
        let err = LocationRecord::capture("nowhere", &location).unwrap_err();
        assert!(matches!(err, EssentialsError::InvalidInput(_)));
    }

    #[test]
    fn test_capture_rejects_non_finite_values() {
        let mut location = overworld_spawn();
        location.position.x = f64::NAN;
        assert!(matches!(
            LocationRecord::capture("Spawn", &location),
            Err(EssentialsError::InvalidInput(_))
        ));

        let mut location = overworld_spawn();
        location.yaw = f64::INFINITY;
        assert!(LocationRecord::capture("Spawn", &location).is_err());

        let mut record = LocationRecord::capture("Spawn", &overworld_spawn()).unwrap();
        assert!(record.check_finite().is_ok());
        record.z = f64::NEG_INFINITY;
        assert!(record.check_finite().is_err());
    }

    #[test]
    fn test_serialized_field_names() {
        let record = LocationRecord::capture("Spawn", &overworld_spawn()).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["dimensionId", "name", "pitch", "worldName", "x", "y", "yaw", "z"]
        );
    }

    #[test]
    fn test_resolve_reports_stale_world() {
        let record = LocationRecord::capture("Spawn", &overworld_spawn()).unwrap();

        let live = Worlds(HashSet::from([("world".to_string(), 0)]));
        let resolved = record.resolve(&live).unwrap();
        assert_eq!(resolved.dimension, ("world".to_string(), 0));
        assert_eq!(resolved.position, record.position());

        let removed = Worlds(HashSet::new());
        let err = record.resolve(&removed).unwrap_err();
        assert!(matches!(
            err,
            EssentialsError::StaleReference { dimension_id: 0, .. }
        ));
    }
}

//! The server hub: at most one location, stored in `hub.json`.

use crate::codec;
use crate::error::Result;
use crate::location::{Location, LocationRecord};
use crate::registry::lock_writer;
use crate::storage::{self, DataFile};
use std::sync::{Mutex, PoisonError, RwLock};
use tracing::info;

/// Name given to the hub record.
pub const HUB_NAME: &str = "hub";

pub struct HubStore {
    current: RwLock<Option<LocationRecord>>,
    file: DataFile,
    writer: Mutex<()>,
}

impl HubStore {
    pub fn open(file: DataFile) -> Self {
        let current = storage::load_decoded(&file, "hub", |text| {
            codec::decode_hub(text).map(|hub| codec::Decoded {
                value: hub,
                skipped: Vec::new(),
            })
        });
        match &current {
            Some(hub) => info!(
                "Loaded hub location in {} at ({:.2}, {:.2}, {:.2})",
                hub.world_name, hub.x, hub.y, hub.z
            ),
            None => info!("Hub location is not set"),
        }

        Self {
            current: RwLock::new(current),
            file,
            writer: Mutex::new(()),
        }
    }

    pub fn get(&self) -> Option<LocationRecord> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_set(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Captures `location` as the new hub, replacing any previous one.
    pub fn set(&self, location: &Location) -> Result<LocationRecord> {
        let record = LocationRecord::capture(HUB_NAME, location)?;
        self.set_record(record)
    }

    pub fn set_record(&self, record: LocationRecord) -> Result<LocationRecord> {
        record.check_finite()?;
        let _writer = lock_writer(&self.writer);
        self.persist(Some(&record))?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(record.clone());
        info!(
            "Saved hub location in {} at ({:.2}, {:.2}, {:.2})",
            record.world_name, record.x, record.y, record.z
        );
        Ok(record)
    }

    /// Unsets the hub; `Ok(false)` when it was not set.
    pub fn clear(&self) -> Result<bool> {
        let _writer = lock_writer(&self.writer);
        if !self.is_set() {
            return Ok(false);
        }
        self.persist(None)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        info!("Cleared hub location");
        Ok(true)
    }

    fn persist(&self, hub: Option<&LocationRecord>) -> Result<()> {
        let json = codec::encode_hub(hub).map_err(|e| storage::encode_error(&self.file, e))?;
        self.file.write(&json)
    }
}

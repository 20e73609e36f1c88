//! # Essentials Plugin
//!
//! Server-side state behind the classic "essentials" player commands:
//!
//! - **Warps**: server-wide named locations (`warp.json`)
//! - **Homes**: named locations private to each player (`home.json`)
//! - **Hub**: one designated server location (`hub.json`)
//! - **Back**: the last place each online player died
//! - **TPA**: teleport requests waiting for the target's answer
//!
//! ## Architecture
//!
//! ```text
//!            core events (JSON)          player commands / UI callbacks
//!                   |                                 |
//!                   v                                 v
//!          EssentialsPlugin::dispatch_core     EssentialsPlugin accessors
//!                   |                                 |
//!     +-------------+------------+----------+---------+---------+
//!     |             |            |          |                   |
//! HomeRegistry  NamedLocation  HubStore  DeathLocation   RequestCoordinator
//!     |          Registry        |         Cache                |
//!     +------+------+------------+                              |
//!            |                                                  |
//!      codec + storage (JSON files)           PlayerHost (notify, teleport)
//! ```
//!
//! The plugin owns one instance of each enabled store; nothing is global.
//! Every store is `Send + Sync` and is used through `&self` from whichever
//! thread delivers the event or callback. Saved locations are resolved
//! against the host's world model only when a player actually teleports,
//! through the [`host::WorldResolver`] and [`host::PlayerHost`] traits.
//!
//! ## Example
//!
//! ```rust,no_run
//! use plugin_essentials::{EssentialsConfig, EssentialsPlugin};
//! use std::path::Path;
//!
//! let config = EssentialsConfig::load_from_file(Path::new("essentials.toml"))?;
//! let plugin = EssentialsPlugin::enable(config, "plugins/essentials")?;
//! if let Some(warps) = plugin.warps() {
//!     for warp in warps.list() {
//!         println!("{} in {}", warp.name, warp.world_name);
//!     }
//! }
//! # Ok::<(), plugin_essentials::EssentialsError>(())
//! ```

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub mod codec;
pub mod config;
pub mod death;
pub mod error;
pub mod events;
pub mod handlers;
pub mod homes;
pub mod host;
pub mod hub;
pub mod location;
pub mod registry;
pub mod storage;
pub mod teleport;
pub mod types;

#[cfg(test)]
mod test_support;

pub use config::EssentialsConfig;
pub use death::DeathLocationCache;
pub use error::{EssentialsError, Result};
pub use events::{PlayerDiedEvent, PlayerDisconnectedEvent, PlayerJoinedEvent};
pub use homes::HomeRegistry;
pub use host::{Notice, PlayerHost, WorldResolver};
pub use hub::HubStore;
pub use location::{DimensionRef, Location, LocationRecord, ResolvedLocation};
pub use registry::NamedLocationRegistry;
pub use storage::{DataFile, WriteMode};
pub use teleport::{PendingRequest, RequestCoordinator, Resolution, Response};
pub use types::{PlayerId, Position};

pub const WARP_FILE: &str = "warp.json";
pub const HOME_FILE: &str = "home.json";
pub const HUB_FILE: &str = "hub.json";

/// Composition root owning every enabled store.
///
/// Accessors return `None` for features switched off in `[features]`.
pub struct EssentialsPlugin {
    config: EssentialsConfig,
    data_dir: PathBuf,
    warps: Option<NamedLocationRegistry>,
    homes: Option<HomeRegistry>,
    hub: Option<HubStore>,
    requests: Option<RequestCoordinator>,
    deaths: Option<DeathLocationCache>,
}

impl EssentialsPlugin {
    /// Validates `config` and opens the stores of every enabled feature.
    ///
    /// `data_dir` is the directory the location files live in. Missing files
    /// are not created until the first change is saved.
    pub fn enable(config: EssentialsConfig, data_dir: impl Into<PathBuf>) -> Result<Self> {
        config.validate().map_err(EssentialsError::Config)?;
        let data_dir = data_dir.into();
        let mode = config.storage.write_mode;
        let features = &config.features;
        info!("Enabling essentials with data directory {}", data_dir.display());

        let warps = features.warp.then(|| {
            let warps = NamedLocationRegistry::open("warp", DataFile::new(data_dir.join(WARP_FILE), mode));
            info!("Warps enabled ({} loaded)", warps.len());
            warps
        });
        let homes = features.home.then(|| {
            let homes = HomeRegistry::open(DataFile::new(data_dir.join(HOME_FILE), mode));
            info!("Homes enabled ({} player(s))", homes.players().len());
            homes
        });
        let hub = features.hub.then(|| {
            let hub = HubStore::open(DataFile::new(data_dir.join(HUB_FILE), mode));
            info!("Hub enabled (set: {})", hub.is_set());
            hub
        });
        let requests = features.tpa.then(|| {
            let requests = match config.tpa.request_timeout() {
                Some(timeout) => RequestCoordinator::with_timeout(timeout),
                None => RequestCoordinator::new(),
            };
            info!("TPA enabled (timeout: {:?})", requests.timeout());
            requests
        });
        let deaths = features.back.then(|| {
            info!("Back enabled");
            DeathLocationCache::new()
        });
        if features.notice {
            info!("Join notice enabled: '{}'", config.notice.title);
        }

        Ok(Self {
            config,
            data_dir,
            warps,
            homes,
            hub,
            requests,
            deaths,
        })
    }

    /// Releases every store. Persisted data is already on disk.
    pub fn disable(self) {
        info!(
            "Disabling essentials: {} warp(s), {} player(s) with homes, {} pending request(s), {} death location(s)",
            self.warps.as_ref().map_or(0, NamedLocationRegistry::len),
            self.homes.as_ref().map_or(0, |homes| homes.players().len()),
            self.requests.as_ref().map_or(0, RequestCoordinator::len),
            self.deaths.as_ref().map_or(0, DeathLocationCache::len),
        );
    }

    pub fn config(&self) -> &EssentialsConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn warps(&self) -> Option<&NamedLocationRegistry> {
        self.warps.as_ref()
    }

    pub fn homes(&self) -> Option<&HomeRegistry> {
        self.homes.as_ref()
    }

    pub fn hub(&self) -> Option<&HubStore> {
        self.hub.as_ref()
    }

    pub fn requests(&self) -> Option<&RequestCoordinator> {
        self.requests.as_ref()
    }

    pub fn deaths(&self) -> Option<&DeathLocationCache> {
        self.deaths.as_ref()
    }

    /// Routes a named core event to its handler.
    ///
    /// Unknown event names are ignored. A payload that does not match the
    /// event's shape is `InvalidInput`.
    pub fn dispatch_core<H>(&self, event_name: &str, event: serde_json::Value, host: &H) -> Result<()>
    where
        H: PlayerHost + ?Sized,
    {
        match event_name {
            events::PLAYER_JOINED => {
                let event: PlayerJoinedEvent = parse_event(event_name, event)?;
                if let Some(notice) = self.on_player_joined(&event) {
                    host.notify(event.player_id, notice);
                }
            }
            events::PLAYER_DISCONNECTED => {
                let event: PlayerDisconnectedEvent = parse_event(event_name, event)?;
                self.on_player_disconnected(&event);
            }
            events::PLAYER_DIED => {
                let event: PlayerDiedEvent = parse_event(event_name, event)?;
                self.on_player_died(&event);
            }
            other => debug!("Ignoring core event '{}'", other),
        }
        Ok(())
    }

    pub fn on_player_joined(&self, event: &PlayerJoinedEvent) -> Option<Notice> {
        let notice = self.config.features.notice.then_some(&self.config.notice);
        handlers::handle_player_joined(event, notice)
    }

    pub fn on_player_disconnected(&self, event: &PlayerDisconnectedEvent) {
        handlers::handle_player_disconnected(event, self.requests(), self.deaths());
    }

    pub fn on_player_died(&self, event: &PlayerDiedEvent) -> bool {
        handlers::handle_player_died(event, self.deaths())
    }

    /// Registers a `/tpa` request and tells both players about it.
    ///
    /// The target must be online. Errors are those of
    /// [`RequestCoordinator::request`], or `Config` when TPA is disabled.
    pub fn request_teleport<H>(&self, requester: PlayerId, target: PlayerId, host: &H) -> Result<PendingRequest>
    where
        H: PlayerHost + ?Sized,
    {
        let requests = self.requests().ok_or_else(|| disabled("tpa"))?;
        if !host.is_online(target) {
            return Err(EssentialsError::NotFound(format!("player {target} is not online")));
        }

        let request = requests.request(requester, target)?;
        host.notify(
            target,
            Notice::TeleportRequested {
                requester: host.display_name(requester).unwrap_or_else(|| requester.to_string()),
            },
        );
        host.notify(
            requester,
            Notice::TeleportRequestSent {
                target: host.display_name(target).unwrap_or_else(|| target.to_string()),
            },
        );
        Ok(request)
    }

    /// Purges timed-out requests and tells each requester theirs lapsed.
    pub fn expire_stale<H>(&self, now: DateTime<Utc>, host: &H) -> Vec<PendingRequest>
    where
        H: PlayerHost + ?Sized,
    {
        let Some(requests) = self.requests() else {
            return Vec::new();
        };
        let expired = requests.expire_stale(now);
        for request in &expired {
            if host.is_online(request.requester) {
                host.notify(
                    request.requester,
                    Notice::RequestExpired {
                        target: host
                            .display_name(request.target)
                            .unwrap_or_else(|| request.target.to_string()),
                    },
                );
            }
        }
        expired
    }

    /// Teleports `player` to a saved location.
    ///
    /// `StaleReference` when the record's dimension no longer exists,
    /// `TeleportFailed` when the host refuses.
    pub fn teleport_to_record<H>(&self, player: PlayerId, record: &LocationRecord, host: &H) -> Result<()>
    where
        H: PlayerHost + ?Sized,
    {
        let destination = record.resolve(host)?;
        if !host.teleport(player, &destination) {
            return Err(EssentialsError::TeleportFailed(format!(
                "host refused to move {player} to '{}'",
                record.name
            )));
        }
        info!(
            "Teleported {} to '{}' in {} at ({:.2}, {:.2}, {:.2})",
            player, record.name, record.world_name, record.x, record.y, record.z
        );
        Ok(())
    }

    /// Sends `player` back to where they last died. The location is kept.
    pub fn back<H>(&self, player: PlayerId, host: &H) -> Result<LocationRecord>
    where
        H: PlayerHost + ?Sized,
    {
        let deaths = self.deaths().ok_or_else(|| disabled("back"))?;
        let record = deaths
            .get(player)
            .ok_or_else(|| EssentialsError::NotFound("no death location recorded".to_string()))?;
        self.teleport_to_record(player, &record, host)?;
        Ok(record)
    }
}

fn parse_event<T: serde::de::DeserializeOwned>(event_name: &str, event: serde_json::Value) -> Result<T> {
    serde_json::from_value(event)
        .map_err(|e| EssentialsError::InvalidInput(format!("malformed '{event_name}' event: {e}")))
}

fn disabled(feature: &str) -> EssentialsError {
    EssentialsError::Config(format!("feature '{feature}' is disabled"))
}

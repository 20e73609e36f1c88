//! # Core event payloads
//!
//! The host reports player lifecycle changes as named core events carrying a
//! JSON payload. These are the typed forms the plugin deserializes them into.
//!
//! | Event name            | Payload                     |
//! |-----------------------|-----------------------------|
//! | `player_joined`       | [`PlayerJoinedEvent`]       |
//! | `player_disconnected` | [`PlayerDisconnectedEvent`] |
//! | `player_died`         | [`PlayerDiedEvent`]         |
//!
//! Fields other than the ones below are ignored, so hosts may send richer
//! payloads (connection ids, timestamps) without breaking the plugin.
//!
//! ```rust
//! use plugin_essentials::events::PlayerDiedEvent;
//!
//! let event: PlayerDiedEvent = serde_json::from_value(serde_json::json!({
//!     "player_id": "5f1c3c2e-8a53-4d36-86f4-2f1a9a0b6f10",
//!     "location": {
//!         "dimension": { "world_name": "world", "dimension_id": 0 },
//!         "position": { "x": 10.0, "y": 64.0, "z": -5.0 },
//!         "pitch": 0.0,
//!         "yaw": 90.0
//!     }
//! })).unwrap();
//! assert!(event.location.is_some());
//! ```

use crate::location::Location;
use crate::types::PlayerId;
use serde::{Deserialize, Serialize};

pub const PLAYER_JOINED: &str = "player_joined";
pub const PLAYER_DISCONNECTED: &str = "player_disconnected";
pub const PLAYER_DIED: &str = "player_died";

/// A player finished joining and can receive notices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerJoinedEvent {
    pub player_id: PlayerId,
}

/// A player left the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDisconnectedEvent {
    pub player_id: PlayerId,
}

/// A player died.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDiedEvent {
    pub player_id: PlayerId,
    /// Where the player died; absent when the host could not tell.
    #[serde(default)]
    pub location: Option<Location>,
}

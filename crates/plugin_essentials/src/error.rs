//! Error types for the essentials plugin.
//!
//! Every failure a store can produce is returned as an [`EssentialsError`];
//! nothing in the plugin panics on bad input or I/O. The command layer
//! matches on the variant to pick a message for the player.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EssentialsError {
    /// Lookup targeted an absent name, player or request.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Name already taken in the namespace, or a request is already pending.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rejected before any mutation (blank name, location without dimension).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Durable read or write failed.
    #[error("Persistence error at {path:?}: {message}")]
    Persistence {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// A stored record's world or dimension no longer resolves.
    #[error("Location unavailable: world '{world_name}' dimension {dimension_id}")]
    StaleReference { world_name: String, dimension_id: i32 },

    /// The host refused or failed the teleport.
    #[error("Teleport failed: {0}")]
    TeleportFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EssentialsError {
    pub(crate) fn persistence(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Persistence {
            path: path.into(),
            message: message.into(),
            source: Some(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, EssentialsError>;

//! # Host collaborator traits
//!
//! The plugin never talks to the game server directly. Everything it needs
//! from the host (which dimensions exist, who is online, where they stand,
//! moving them, messaging them) goes through the traits in this module, so
//! the stores can be driven from tests or from a different server without
//! change.

use crate::location::{Location, ResolvedLocation};
use crate::types::PlayerId;
use std::fmt;

/// Resolves a world name and dimension id to a live dimension.
pub trait WorldResolver {
    /// Host handle for a loaded dimension.
    type Dimension;

    fn resolve(&self, world_name: &str, dimension_id: i32) -> Option<Self::Dimension>;
}

/// Player-facing operations of the host.
///
/// Implementations are called from whatever thread delivered the event or
/// UI callback that triggered the operation.
pub trait PlayerHost: WorldResolver {
    fn is_online(&self, player: PlayerId) -> bool;

    /// Name shown to other players, if the player is online.
    fn display_name(&self, player: PlayerId) -> Option<String>;

    /// Current location of an online player's controlled entity.
    fn location_of(&self, player: PlayerId) -> Option<Location>;

    /// Moves the player; returns `false` when the host refused.
    fn teleport(&self, player: PlayerId, destination: &ResolvedLocation<Self::Dimension>) -> bool;

    fn notify(&self, player: PlayerId, notice: Notice);
}

/// A message the plugin wants shown to one player.
///
/// The `Display` impl gives the default English text; hosts with their own
/// localisation can match on the variant instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Sent to the target when someone asks to teleport to them.
    TeleportRequested { requester: String },
    /// Sent to the requester once their request is registered.
    TeleportRequestSent { target: String },
    /// The requester went offline before the target answered.
    RequesterOffline,
    /// The target went offline before the request was resolved.
    TargetOffline,
    TeleportingTo { target: String },
    TeleportedToYou { requester: String },
    TeleportFailed,
    /// One side has no entity to teleport to or from.
    LocationUnavailable,
    RequestDenied,
    YouDenied { requester: String },
    RequestExpired { target: String },
    /// Join notice configured by the server operator.
    ServerNotice { title: String, content: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::TeleportRequested { requester } => {
                write!(f, "{requester} wants to teleport to you!")
            }
            Notice::TeleportRequestSent { target } => write!(f, "TPA request sent to {target}!"),
            Notice::RequesterOffline => {
                write!(f, "The player who requested TPA is no longer online.")
            }
            Notice::TargetOffline => write!(f, "The target player is no longer online."),
            Notice::TeleportingTo { target } => write!(f, "Teleporting to {target}!"),
            Notice::TeleportedToYou { requester } => {
                write!(f, "{requester} has been teleported to you!")
            }
            Notice::TeleportFailed => write!(f, "Teleportation failed!"),
            Notice::LocationUnavailable => write!(f, "Cannot teleport: entity not found!"),
            Notice::RequestDenied => write!(f, "Your TPA request was denied."),
            Notice::YouDenied { requester } => {
                write!(f, "You denied the TPA request from {requester}.")
            }
            Notice::RequestExpired { target } => {
                write!(f, "Your TPA request to {target} has expired.")
            }
            Notice::ServerNotice { title, content } => write!(f, "{title}\n{content}"),
        }
    }
}

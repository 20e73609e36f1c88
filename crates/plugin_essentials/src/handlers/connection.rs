//! # Player connection handlers
//!
//! ## Join
//!
//! Builds the configured server notice for the joining player. The caller
//! decides how to show it.
//!
//! ## Disconnect
//!
//! A player who left can neither answer nor be teleported to, so every
//! request they take part in is cancelled, and their death location is
//! dropped. Both steps are idempotent; a player with no state is a no-op.

use crate::config::NoticeSettings;
use crate::death::DeathLocationCache;
use crate::events::{PlayerDisconnectedEvent, PlayerJoinedEvent};
use crate::host::Notice;
use crate::teleport::RequestCoordinator;
use tracing::debug;

/// Notice to show `event.player_id`, when the notice feature is enabled.
pub fn handle_player_joined(event: &PlayerJoinedEvent, notice: Option<&NoticeSettings>) -> Option<Notice> {
    let Some(settings) = notice else {
        debug!("Player {} joined, notice disabled", event.player_id);
        return None;
    };

    debug!("Player {} joined, sending notice '{}'", event.player_id, settings.title);
    Some(Notice::ServerNotice {
        title: settings.title.clone(),
        content: unescape_newlines(&settings.content),
    })
}

/// Turns a literal `\n` written in the config file into a line break.
fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}

/// Drops every piece of session state held for the disconnected player.
pub fn handle_player_disconnected(
    event: &PlayerDisconnectedEvent,
    requests: Option<&RequestCoordinator>,
    deaths: Option<&DeathLocationCache>,
) {
    let cancelled = requests.map_or(0, |requests| requests.cancel_for_disconnect(event.player_id).len());
    let had_death = deaths.is_some_and(|deaths| deaths.clear(event.player_id).is_some());

    debug!(
        "Player {} disconnected: {} request(s) cancelled, death location {}",
        event.player_id,
        cancelled,
        if had_death { "cleared" } else { "not recorded" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{DimensionRef, Location};
    use crate::types::{PlayerId, Position};

    #[test]
    fn test_join_notice_follows_settings() {
        let event = PlayerJoinedEvent { player_id: PlayerId::new() };
        assert!(handle_player_joined(&event, None).is_none());

        let settings = NoticeSettings {
            title: "Rules".to_string(),
            content: "Be nice".to_string(),
        };
        assert_eq!(
            handle_player_joined(&event, Some(&settings)),
            Some(Notice::ServerNotice {
                title: "Rules".to_string(),
                content: "Be nice".to_string(),
            })
        );
    }

    #[test]
    fn test_join_notice_expands_escaped_newlines() {
        let event = PlayerJoinedEvent { player_id: PlayerId::new() };
        let settings = NoticeSettings {
            title: "Rules".to_string(),
            content: r"Welcome!\nNo griefing.\n\nHave fun".to_string(),
        };

        let Some(Notice::ServerNotice { content, .. }) = handle_player_joined(&event, Some(&settings)) else {
            panic!("expected a server notice");
        };
        assert_eq!(content, "Welcome!\nNo griefing.\n\nHave fun");
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn test_disconnect_clears_requests_and_death() {
        let requests = RequestCoordinator::new();
        let deaths = DeathLocationCache::new();
        let (leaving, other) = (PlayerId::new(), PlayerId::new());

        requests.request(leaving, other).unwrap();
        deaths.record_location(
            leaving,
            Some(&Location::new(DimensionRef::new("world", 0), Position::default(), 0.0, 0.0)),
        );

        let event = PlayerDisconnectedEvent { player_id: leaving };
        handle_player_disconnected(&event, Some(&requests), Some(&deaths));
        assert!(requests.is_empty());
        assert!(deaths.get(leaving).is_none());

        // Second delivery and disabled features are both no-ops.
        handle_player_disconnected(&event, Some(&requests), Some(&deaths));
        handle_player_disconnected(&event, None, None);
    }
}

//! Death handler: remembers where a player died so `/back` can return there.

use crate::death::DeathLocationCache;
use crate::events::PlayerDiedEvent;
use tracing::debug;

/// Records the death location; `false` when nothing was recorded.
pub fn handle_player_died(event: &PlayerDiedEvent, deaths: Option<&DeathLocationCache>) -> bool {
    let Some(deaths) = deaths else {
        debug!("Player {} died, back disabled", event.player_id);
        return false;
    };
    deaths.record_location(event.player_id, event.location.as_ref())
}

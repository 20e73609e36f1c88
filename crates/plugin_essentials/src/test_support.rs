//! In-memory host used by the unit and scenario tests.

use crate::host::{Notice, PlayerHost, WorldResolver};
use crate::location::{DimensionRef, Location, ResolvedLocation};
use crate::types::{PlayerId, Position};
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

struct MockPlayer {
    name: String,
    location: Option<Location>,
}

pub(crate) struct MockHost {
    worlds: DashSet<(String, i32)>,
    players: DashMap<PlayerId, MockPlayer>,
    notices: DashMap<PlayerId, Vec<Notice>>,
    teleports: Mutex<Vec<PlayerId>>,
    refuse: AtomicBool,
}

impl MockHost {
    /// Host with the dimensions `world/0`, `nether/-1` and `lobby/0` loaded.
    pub(crate) fn new() -> Self {
        let worlds = DashSet::new();
        worlds.insert(("world".to_string(), 0));
        worlds.insert(("nether".to_string(), -1));
        worlds.insert(("lobby".to_string(), 0));
        Self {
            worlds,
            players: DashMap::new(),
            notices: DashMap::new(),
            teleports: Mutex::new(Vec::new()),
            refuse: AtomicBool::new(false),
        }
    }

    /// Brings a new player online at the origin of `dimension`.
    pub(crate) fn join(&self, name: &str, dimension: Option<(&str, i32)>) -> PlayerId {
        let id = PlayerId::new();
        let location = dimension.map(|(world, dimension_id)| {
            Location::new(DimensionRef::new(world, dimension_id), Position::default(), 0.0, 0.0)
        });
        self.players.insert(
            id,
            MockPlayer {
                name: name.to_string(),
                location,
            },
        );
        id
    }

    pub(crate) fn leave(&self, player: PlayerId) {
        self.players.remove(&player);
    }

    pub(crate) fn move_to(&self, player: PlayerId, location: Location) {
        if let Some(mut entry) = self.players.get_mut(&player) {
            entry.location = Some(location);
        }
    }

    pub(crate) fn unload_world(&self, world: &str, dimension_id: i32) {
        self.worlds.remove(&(world.to_string(), dimension_id));
    }

    pub(crate) fn refuse_teleports(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }

    /// Players teleported so far, in order.
    pub(crate) fn teleports(&self) -> Vec<PlayerId> {
        self.teleports.lock().unwrap().clone()
    }

    pub(crate) fn notices(&self, player: PlayerId) -> Vec<Notice> {
        self.notices
            .get(&player)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}

impl WorldResolver for MockHost {
    type Dimension = DimensionRef;

    fn resolve(&self, world_name: &str, dimension_id: i32) -> Option<Self::Dimension> {
        self.worlds
            .contains(&(world_name.to_string(), dimension_id))
            .then(|| DimensionRef::new(world_name, dimension_id))
    }
}

impl PlayerHost for MockHost {
    fn is_online(&self, player: PlayerId) -> bool {
        self.players.contains_key(&player)
    }

    fn display_name(&self, player: PlayerId) -> Option<String> {
        self.players.get(&player).map(|entry| entry.name.clone())
    }

    fn location_of(&self, player: PlayerId) -> Option<Location> {
        self.players.get(&player)?.location.clone()
    }

    fn teleport(&self, player: PlayerId, destination: &ResolvedLocation<DimensionRef>) -> bool {
        if self.refuse.load(Ordering::SeqCst) || !self.is_online(player) {
            return false;
        }
        self.move_to(
            player,
            Location::new(
                destination.dimension.clone(),
                destination.position,
                destination.pitch,
                destination.yaw,
            ),
        );
        self.teleports.lock().unwrap().push(player);
        true
    }

    fn notify(&self, player: PlayerId, notice: Notice) {
        self.notices.entry(player).or_default().push(notice);
    }
}

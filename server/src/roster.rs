//! Player roster for the two-player match
//!
//! This module tracks which connections own a paddle, including:
//! - Slot assignment in arrival order (slot One at the bottom, slot Two at the top)
//! - Spawn placement derived from the registrant's viewport
//! - Capacity enforcement for the fixed two-player room
//! - Deferred removal of dropped connections, batched per tick
//!
//! The roster is an id-indexed arena. Everything outside it refers to players
//! by their unique id, which is the id of the owning connection.

use log::info;
use shared::{
    PlayerDesc, RegisterRequest, Slot, Vec2, Viewport, INITIAL_LIVES, MAX_PLAYERS, PLAYER_SIZE,
};
use std::collections::HashMap;
use thiserror::Error;

/// Reasons a registration is turned down
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    #[error("server is full")]
    ServerFull,
    #[error("connection {0} already owns a player")]
    AlreadyRegistered(u32),
}

/// A registered player and its match bookkeeping
#[derive(Debug, Clone)]
pub struct RosterEntry {
    /// Authoritative descriptor replicated to every client
    pub desc: PlayerDesc,
    /// Connection dropped; removal happens on the next flush
    pub disconnected: bool,
    /// Player acknowledged the lobby and wants to start
    pub ready: bool,
}

/// Computes where a paddle spawns for the given slot
///
/// Slot One sits centred on the bottom edge of the viewport, slot Two centred
/// on the top edge.
pub fn spawn_position(slot: Slot, viewport: Viewport) -> Vec2 {
    let x = viewport.width / 2.0 - PLAYER_SIZE.x / 2.0;
    match slot {
        Slot::Two => Vec2::new(x, 0.0),
        Slot::One | Slot::None => Vec2::new(x, viewport.height - PLAYER_SIZE.y),
    }
}

/// Manages the players taking part in the match
///
/// The roster enforces the two-slot limit and hands out the lowest free slot,
/// so after a release the next registrant fills the gap that was left.
pub struct Roster {
    /// Players indexed by their unique id
    players: HashMap<u32, RosterEntry>,
    /// Maximum number of concurrent players
    capacity: usize,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new(MAX_PLAYERS)
    }
}

impl Roster {
    /// Creates an empty roster holding at most `capacity` players
    pub fn new(capacity: usize) -> Self {
        Self {
            players: HashMap::new(),
            capacity,
        }
    }

    /// Attempts to register a player for a connection
    ///
    /// The player receives the connection id as its unique id, the lowest free
    /// slot and a spawn position computed from the viewport it reported. The
    /// requested position is not trusted for spawning.
    pub fn register(
        &mut self,
        connection_id: u32,
        request: &RegisterRequest,
    ) -> Result<PlayerDesc, RegisterError> {
        if self.players.contains_key(&connection_id) {
            return Err(RegisterError::AlreadyRegistered(connection_id));
        }
        if self.is_full() {
            return Err(RegisterError::ServerFull);
        }

        let slot = self.free_slot().ok_or(RegisterError::ServerFull)?;
        let mut desc = PlayerDesc::new(
            connection_id,
            spawn_position(slot, request.viewport),
            request.viewport,
        );
        desc.slot = slot;

        info!("Player {} registered in slot {:?}", connection_id, slot);
        self.players.insert(
            connection_id,
            RosterEntry {
                desc: desc.clone(),
                disconnected: false,
                ready: false,
            },
        );
        Ok(desc)
    }

    fn free_slot(&self) -> Option<Slot> {
        [Slot::One, Slot::Two]
            .into_iter()
            .take(self.capacity)
            .find(|slot| self.by_slot(*slot).is_none())
    }

    /// Removes a player right away
    ///
    /// Returns the removed descriptor, or None if the connection never
    /// registered or was already removed.
    pub fn unregister(&mut self, connection_id: u32) -> Option<PlayerDesc> {
        let entry = self.players.remove(&connection_id)?;
        info!("Player {} left slot {:?}", connection_id, entry.desc.slot);
        Some(entry.desc)
    }

    /// Flags a player whose connection dropped
    ///
    /// The player stops counting toward capacity immediately but stays in the
    /// arena until `drain_removals` runs. Returns false for unknown ids.
    pub fn mark_disconnected(&mut self, connection_id: u32) -> bool {
        match self.players.get_mut(&connection_id) {
            Some(entry) => {
                entry.disconnected = true;
                true
            }
            None => false,
        }
    }

    /// Removes every flagged player and returns them in slot order
    pub fn drain_removals(&mut self) -> Vec<PlayerDesc> {
        let ids: Vec<u32> = self
            .players
            .iter()
            .filter(|(_, entry)| entry.disconnected)
            .map(|(id, _)| *id)
            .collect();

        let mut removed: Vec<PlayerDesc> =
            ids.into_iter().filter_map(|id| self.unregister(id)).collect();
        removed.sort_by_key(|desc| desc.slot);
        removed
    }

    /// Whether removals are waiting for the next flush
    pub fn has_pending_removals(&self) -> bool {
        self.players.values().any(|entry| entry.disconnected)
    }

    fn active(&self) -> impl Iterator<Item = &RosterEntry> {
        self.players.values().filter(|entry| !entry.disconnected)
    }

    /// Looks up a live player by id
    pub fn get(&self, id: u32) -> Option<&PlayerDesc> {
        self.players
            .get(&id)
            .filter(|entry| !entry.disconnected)
            .map(|entry| &entry.desc)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut PlayerDesc> {
        self.players
            .get_mut(&id)
            .filter(|entry| !entry.disconnected)
            .map(|entry| &mut entry.desc)
    }

    /// Looks up the live player holding a slot
    pub fn by_slot(&self, slot: Slot) -> Option<&PlayerDesc> {
        self.active()
            .map(|entry| &entry.desc)
            .find(|desc| desc.slot == slot)
    }

    pub fn by_slot_mut(&mut self, slot: Slot) -> Option<&mut PlayerDesc> {
        self.players
            .values_mut()
            .filter(|entry| !entry.disconnected)
            .map(|entry| &mut entry.desc)
            .find(|desc| desc.slot == slot)
    }

    /// Returns the other player of the match, if present
    pub fn opponent_of(&self, id: u32) -> Option<&PlayerDesc> {
        let slot = self.get(id)?.slot;
        self.by_slot(slot.opponent())
    }

    /// All live players ordered by slot
    pub fn players(&self) -> Vec<PlayerDesc> {
        let mut players: Vec<PlayerDesc> = self.active().map(|entry| entry.desc.clone()).collect();
        players.sort_by_key(|desc| desc.slot);
        players
    }

    /// Marks a player ready; returns false for unknown ids
    pub fn set_ready(&mut self, id: u32) -> bool {
        match self.players.get_mut(&id) {
            Some(entry) if !entry.disconnected => {
                entry.ready = true;
                true
            }
            _ => false,
        }
    }

    /// True when the room is full and every player acknowledged
    pub fn all_ready(&self) -> bool {
        self.is_full() && self.active().all(|entry| entry.ready)
    }

    pub fn clear_ready(&mut self) {
        for entry in self.players.values_mut() {
            entry.ready = false;
        }
    }

    /// Gives every player a full set of lives for a new match
    pub fn restore_lives(&mut self) {
        for entry in self.players.values_mut() {
            entry.desc.lives = INITIAL_LIVES;
        }
    }

    /// Returns the number of live players
    pub fn len(&self) -> usize {
        self.active().count()
    }

    /// Returns true if no live players are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }
}

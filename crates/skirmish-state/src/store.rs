//! In-memory storage of player state, partitioned by room.
//!
//! # Concurrency note
//!
//! `RoomStateStore` is NOT thread-safe by itself — it is a plain map with
//! `&mut self` mutations. This is intentional: the store is owned by the
//! session service and guarded by a single mutex there, so that every
//! operation (including the combat resolver's cooldown check-and-set, which
//! spans a read and a write) executes as one atomic unit. Keeping the store
//! lock-free avoids double locking and keeps it trivially unit-testable.

use std::collections::HashMap;

use skirmish_protocol::{PlayerEntry, PlayerId, PlayerState, RoomName, StateUpdate};

use crate::StateError;

/// One room's players, in join order.
///
/// The order vector exists so the aggregate view is deterministic: observers
/// (and tests) see players in the order they joined, not hash order.
#[derive(Debug, Default)]
struct RoomEntries {
    players: HashMap<PlayerId, PlayerState>,
    order: Vec<PlayerId>,
}

/// Owns the `PlayerId -> PlayerState` mapping for every room.
///
/// Rooms are created lazily on first insert and pruned when their last
/// player is removed; an unknown room behaves exactly like an empty one.
#[derive(Debug, Default)]
pub struct RoomStateStore {
    rooms: HashMap<RoomName, RoomEntries>,
}

impl RoomStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or overwrites a player's state. This is the join path —
    /// re-joining simply replaces whatever was there (idempotent, no state
    /// machine beyond absent/present).
    pub fn insert(&mut self, room: &RoomName, id: &PlayerId, state: PlayerState) {
        let entries = self.rooms.entry(room.clone()).or_default();
        if entries.players.insert(id.clone(), state).is_none() {
            entries.order.push(id.clone());
        }
    }

    /// Merges the supplied fields into an existing player's state.
    ///
    /// Never creates state: a late update racing a leave fails with
    /// `PlayerNotFound` instead of resurrecting the player.
    pub fn update(
        &mut self,
        room: &RoomName,
        id: &PlayerId,
        update: &StateUpdate,
    ) -> Result<(), StateError> {
        let state = self
            .rooms
            .get_mut(room)
            .and_then(|entries| entries.players.get_mut(id))
            .ok_or_else(|| StateError::PlayerNotFound(id.clone(), room.clone()))?;
        state.apply(update);
        Ok(())
    }

    /// Returns a copy of one player's state.
    pub fn get(&self, room: &RoomName, id: &PlayerId) -> Result<PlayerState, StateError> {
        self.rooms
            .get(room)
            .and_then(|entries| entries.players.get(id))
            .cloned()
            .ok_or_else(|| StateError::PlayerNotFound(id.clone(), room.clone()))
    }

    /// The aggregate room view, in join order. Empty for unknown rooms.
    pub fn players(&self, room: &RoomName) -> Vec<PlayerEntry> {
        let Some(entries) = self.rooms.get(room) else {
            return Vec::new();
        };
        entries
            .order
            .iter()
            .filter_map(|id| {
                entries.players.get(id).map(|state| PlayerEntry {
                    id: id.clone(),
                    state: state.clone(),
                })
            })
            .collect()
    }

    /// Deletes a player's state. Idempotent: removing an absent player is
    /// not an error and returns `false`.
    pub fn remove(&mut self, room: &RoomName, id: &PlayerId) -> bool {
        let Some(entries) = self.rooms.get_mut(room) else {
            return false;
        };
        let removed = entries.players.remove(id).is_some();
        if removed {
            entries.order.retain(|other| other != id);
            if entries.players.is_empty() {
                self.rooms.remove(room);
                tracing::debug!(%room, "room emptied, pruning");
            }
        }
        removed
    }

    pub fn contains(&self, room: &RoomName, id: &PlayerId) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|entries| entries.players.contains_key(id))
    }

    pub fn player_count(&self, room: &RoomName) -> usize {
        self.rooms.get(room).map_or(0, |entries| entries.players.len())
    }
}

// =========================================================================
// Tests
// =========================================================================

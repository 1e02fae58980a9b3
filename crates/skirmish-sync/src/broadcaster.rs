//! Observer registry and message fan-out for rooms.
//!
//! Two delivery modes, matching what the presentation layer subscribes to:
//! a roster broadcast pushed to every observer after a mutation, and
//! targeted events addressed to exactly one identity. Delivery goes through
//! per-observer unbounded channels; a closed or missing receiver is dropped
//! silently — there is no queuing for absent players.

use std::collections::HashMap;

use skirmish_protocol::{PlayerEntry, PlayerId, RoomName, ServerEvent};
use tokio::sync::mpsc;

/// An outbound message from the sync layer to one observer's connection.
///
/// No ordering is guaranteed between an `Event` and the `Roster` broadcast
/// triggered by the same logical action.
#[derive(Debug, Clone)]
pub enum SyncOutbound {
    /// The aggregate room view after a mutation settled.
    Roster(Vec<PlayerEntry>),
    /// A targeted or room-wide event (e.g. `Hit`).
    Event(ServerEvent),
}

/// Channel sender for delivering outbound messages to one observer.
pub type ObserverSender = mpsc::UnboundedSender<SyncOutbound>;

/// Tracks who is observing each room and fans state changes out to them.
///
/// Like the store, this is a plain struct: the session service guards it
/// together with the store under one lock, so a mutation and its fan-out
/// form a single critical section.
#[derive(Debug, Default)]
pub struct SyncBroadcaster {
    rooms: HashMap<RoomName, HashMap<PlayerId, ObserverSender>>,
}

impl SyncBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer and returns the receiving end of its channel.
    /// A second subscribe for the same identity replaces the first.
    pub fn subscribe(
        &mut self,
        room: &RoomName,
        id: &PlayerId,
    ) -> mpsc::UnboundedReceiver<SyncOutbound> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribe_with(room, id, tx);
        rx
    }

    /// Registers an observer using a caller-provided sender.
    pub fn subscribe_with(&mut self, room: &RoomName, id: &PlayerId, sender: ObserverSender) {
        self.rooms
            .entry(room.clone())
            .or_default()
            .insert(id.clone(), sender);
    }

    /// Removes an observer. Idempotent.
    pub fn unsubscribe(&mut self, room: &RoomName, id: &PlayerId) -> bool {
        let Some(observers) = self.rooms.get_mut(room) else {
            return false;
        };
        let removed = observers.remove(id).is_some();
        if observers.is_empty() {
            self.rooms.remove(room);
        }
        removed
    }

    /// Pushes the aggregate room view to every observer in the room.
    pub fn broadcast_roster(&self, room: &RoomName, roster: Vec<PlayerEntry>) {
        let Some(observers) = self.rooms.get(room) else {
            return;
        };
        for sender in observers.values() {
            let _ = sender.send(SyncOutbound::Roster(roster.clone()));
        }
    }

    /// Pushes an event to every observer in the room.
    pub fn broadcast_event(&self, room: &RoomName, event: ServerEvent) {
        let Some(observers) = self.rooms.get(room) else {
            return;
        };
        for sender in observers.values() {
            let _ = sender.send(SyncOutbound::Event(event.clone()));
        }
    }

    /// Delivers an event to exactly one identity.
    ///
    /// Best-effort: if the recipient is not subscribed, or their channel is
    /// already closed, the event is dropped. Returns whether the send was
    /// accepted by a live channel.
    pub fn send_to(&self, room: &RoomName, id: &PlayerId, event: ServerEvent) -> bool {
        let Some(sender) = self.rooms.get(room).and_then(|observers| observers.get(id)) else {
            tracing::debug!(%room, player = %id, "targeted event for absent observer, dropping");
            return false;
        };
        sender.send(SyncOutbound::Event(event)).is_ok()
    }

    pub fn observer_count(&self, room: &RoomName) -> usize {
        self.rooms.get(room).map_or(0, HashMap::len)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_protocol::{PlayerState, Position};

    fn pid(id: &str) -> PlayerId {
        PlayerId::from(id)
    }

    fn arena() -> RoomName {
        RoomName::combat_arena()
    }

    fn roster_of(ids: &[&str]) -> Vec<PlayerEntry> {
        ids.iter()
            .map(|id| PlayerEntry {
                id: pid(id),
                state: PlayerState::spawned(*id, Position::new(0.0, 0.0)),
            })
            .collect()
    }

    #[test]
    fn test_broadcast_roster_reaches_every_observer() {
        let mut sync = SyncBroadcaster::new();
        let mut rx1 = sync.subscribe(&arena(), &pid("p1"));
        let mut rx2 = sync.subscribe(&arena(), &pid("p2"));

        sync.broadcast_roster(&arena(), roster_of(&["p1", "p2"]));

        for rx in [&mut rx1, &mut rx2] {
            match rx.try_recv().expect("observer should receive roster") {
                SyncOutbound::Roster(players) => assert_eq!(players.len(), 2),
                other => panic!("expected Roster, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_send_to_reaches_only_the_target() {
        let mut sync = SyncBroadcaster::new();
        let mut victim_rx = sync.subscribe(&arena(), &pid("victim"));
        let mut bystander_rx = sync.subscribe(&arena(), &pid("bystander"));

        let delivered = sync.send_to(
            &arena(),
            &pid("victim"),
            ServerEvent::Hit {
                attacker: pid("p1"),
                damage: 12,
            },
        );

        assert!(delivered);
        match victim_rx.try_recv().unwrap() {
            SyncOutbound::Event(ServerEvent::Hit { attacker, damage }) => {
                assert_eq!(attacker, pid("p1"));
                assert_eq!(damage, 12);
            }
            other => panic!("expected Hit, got {other:?}"),
        }
        assert!(bystander_rx.try_recv().is_err(), "bystander must not see the hit");
    }

    #[test]
    fn test_send_to_absent_recipient_drops_silently() {
        let sync = SyncBroadcaster::new();
        let delivered = sync.send_to(
            &arena(),
            &pid("nobody"),
            ServerEvent::Hit {
                attacker: pid("p1"),
                damage: 10,
            },
        );
        assert!(!delivered);
    }

    #[test]
    fn test_send_to_closed_channel_drops_silently() {
        let mut sync = SyncBroadcaster::new();
        let rx = sync.subscribe(&arena(), &pid("gone"));
        drop(rx);

        let delivered = sync.send_to(
            &arena(),
            &pid("gone"),
            ServerEvent::Hit {
                attacker: pid("p1"),
                damage: 10,
            },
        );
        assert!(!delivered);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut sync = SyncBroadcaster::new();
        let mut rx = sync.subscribe(&arena(), &pid("p1"));

        assert!(sync.unsubscribe(&arena(), &pid("p1")));
        sync.broadcast_roster(&arena(), roster_of(&["p1"]));

        assert!(rx.try_recv().is_err());
        assert_eq!(sync.observer_count(&arena()), 0);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let mut sync = SyncBroadcaster::new();
        sync.subscribe(&arena(), &pid("p1"));

        assert!(sync.unsubscribe(&arena(), &pid("p1")));
        assert!(!sync.unsubscribe(&arena(), &pid("p1")));
        assert!(!sync.unsubscribe(&RoomName::new("nowhere"), &pid("p1")));
    }

    #[test]
    fn test_rooms_fan_out_independently() {
        let mut sync = SyncBroadcaster::new();
        let practice = RoomName::new("practice");
        let mut arena_rx = sync.subscribe(&arena(), &pid("p1"));
        let mut practice_rx = sync.subscribe(&practice, &pid("p1"));

        sync.broadcast_roster(&arena(), roster_of(&["p1"]));

        assert!(arena_rx.try_recv().is_ok());
        assert!(practice_rx.try_recv().is_err());
    }

    #[test]
    fn test_resubscribe_replaces_previous_channel() {
        let mut sync = SyncBroadcaster::new();
        let mut old_rx = sync.subscribe(&arena(), &pid("p1"));
        let mut new_rx = sync.subscribe(&arena(), &pid("p1"));

        sync.broadcast_roster(&arena(), roster_of(&["p1"]));

        assert!(old_rx.try_recv().is_err(), "old channel is detached");
        assert!(new_rx.try_recv().is_ok());
        assert_eq!(sync.observer_count(&arena()), 1);
    }
}

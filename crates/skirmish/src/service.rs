//! The session service: the façade every client request goes through.
//!
//! Each operation takes an explicit [`SessionContext`] naming the caller
//! and the room — there is no ambient "current sender" anywhere, which is
//! what makes the service testable without a live connection.
//!
//! Error policy: nothing here returns `Result`. Internal failures become
//! `success: false` replies (with a message where the wire format has one)
//! and never cross the boundary as errors. A failed request affects only
//! that request.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::{Mutex, mpsc};

use skirmish_combat::{CombatConfig, CombatError, CombatResolver};
use skirmish_protocol::{
    AckReply, AttackReply, JoinReply, PlayerId, RespawnReply, RoomName, RosterReply, StateUpdate,
};
use skirmish_state::RoomStateStore;
use skirmish_sync::{SyncBroadcaster, SyncOutbound};

/// Who is calling, and which room they are acting in.
///
/// Built once per connection by the gateway (or by hand in tests) and passed
/// into every operation.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub player: PlayerId,
    pub room: RoomName,
}

impl SessionContext {
    pub fn new(player: PlayerId, room: RoomName) -> Self {
        Self { player, room }
    }

    /// Context targeting the well-known `"combat-arena"` room.
    pub fn for_default_room(player: PlayerId) -> Self {
        Self::new(player, RoomName::combat_arena())
    }
}

/// Store and broadcaster, guarded together: a mutation and its fan-out
/// form one critical section, which also makes the resolver's cooldown
/// check-and-set atomic per attacker.
#[derive(Debug, Default)]
struct Core {
    store: RoomStateStore,
    sync: SyncBroadcaster,
}

/// Translates discrete client requests into store/resolver/broadcaster
/// operations and reports results in the wire reply shapes.
#[derive(Debug)]
pub struct RoomSessionService {
    core: Mutex<Core>,
    resolver: CombatResolver,
}

impl RoomSessionService {
    /// Service with default combat tuning.
    pub fn new() -> Self {
        Self::with_config(CombatConfig::default())
    }

    pub fn with_config(config: CombatConfig) -> Self {
        Self {
            core: Mutex::new(Core::default()),
            resolver: CombatResolver::new(config),
        }
    }

    /// Registers the caller as an observer of their room and returns the
    /// stream of roster broadcasts and targeted events.
    pub async fn subscribe(&self, ctx: &SessionContext) -> mpsc::UnboundedReceiver<SyncOutbound> {
        self.core
            .lock()
            .await
            .sync
            .subscribe(&ctx.room, &ctx.player)
    }

    pub async fn unsubscribe(&self, ctx: &SessionContext) {
        self.core
            .lock()
            .await
            .sync
            .unsubscribe(&ctx.room, &ctx.player);
    }

    /// Joins the caller to their room with fresh state at a random spawn
    /// point. Re-joining overwrites prior state.
    pub async fn join_game(&self, ctx: &SessionContext, nickname: Option<&str>) -> JoinReply {
        let mut core = self.core.lock().await;
        let Core { store, sync } = &mut *core;
        let position = self
            .resolver
            .join(store, &ctx.room, &ctx.player, nickname);
        sync.broadcast_roster(&ctx.room, store.players(&ctx.room));
        JoinReply::ok(ctx.room.clone(), position)
    }

    /// Removes the caller's state and subscription. Succeeds even when the
    /// caller already left — leaving twice is a graceful no-op.
    pub async fn leave_game(&self, ctx: &SessionContext) -> AckReply {
        let mut core = self.core.lock().await;
        let Core { store, sync } = &mut *core;
        let removed = store.remove(&ctx.room, &ctx.player);
        sync.unsubscribe(&ctx.room, &ctx.player);
        if removed {
            sync.broadcast_roster(&ctx.room, store.players(&ctx.room));
            tracing::info!(room = %ctx.room, player = %ctx.player, "player left");
        }
        AckReply::ok()
    }

    /// Merges a client's periodic push of its own state. Rejected when the
    /// payload is missing or the caller has no state in the room (a late
    /// update racing a leave must not recreate the player).
    ///
    /// The server does not enforce a minimum interval between pushes;
    /// clients are expected to self-throttle.
    pub async fn update_player_state(
        &self,
        ctx: &SessionContext,
        state: Option<StateUpdate>,
    ) -> AckReply {
        let Some(update) = state else {
            return AckReply::failed();
        };

        let mut core = self.core.lock().await;
        let Core { store, sync } = &mut *core;
        match store.update(&ctx.room, &ctx.player, &update) {
            Ok(()) => {
                sync.broadcast_roster(&ctx.room, store.players(&ctx.room));
                AckReply::ok()
            }
            Err(err) => {
                tracing::debug!(room = %ctx.room, player = %ctx.player, %err, "state update rejected");
                AckReply::failed()
            }
        }
    }

    /// Resolves an attack by the caller on `target` at the current server
    /// time.
    pub async fn attack_player(&self, ctx: &SessionContext, target: &PlayerId) -> AttackReply {
        let now = epoch_millis();
        let mut core = self.core.lock().await;
        let Core { store, sync } = &mut *core;
        match self
            .resolver
            .resolve_attack(store, sync, &ctx.room, &ctx.player, target, now)
        {
            Ok(outcome) => {
                sync.broadcast_roster(&ctx.room, store.players(&ctx.room));
                AttackReply::ok(outcome.damage, outcome.target_health)
            }
            Err(CombatError::TargetNotFound(_)) => AttackReply::failed("target not found"),
            Err(CombatError::OnCooldown { .. }) => AttackReply::failed("cooldown"),
            Err(err) => {
                tracing::debug!(room = %ctx.room, player = %ctx.player, %err, "attack rejected");
                AttackReply::failed("attacker not in room")
            }
        }
    }

    /// Respawns the caller at a fresh spawn point with full health.
    pub async fn respawn_player(&self, ctx: &SessionContext) -> RespawnReply {
        let mut core = self.core.lock().await;
        let Core { store, sync } = &mut *core;
        match self.resolver.respawn(store, &ctx.room, &ctx.player) {
            Ok(position) => {
                sync.broadcast_roster(&ctx.room, store.players(&ctx.room));
                RespawnReply::ok(position)
            }
            Err(err) => {
                tracing::debug!(room = %ctx.room, player = %ctx.player, %err, "respawn rejected");
                RespawnReply::failed("player not found")
            }
        }
    }

    /// The full room view. Read-only; reports an empty roster rather than
    /// an error on any failure.
    pub async fn get_all_players(&self, ctx: &SessionContext) -> RosterReply {
        let core = self.core.lock().await;
        RosterReply {
            players: core.store.players(&ctx.room),
        }
    }
}

impl Default for RoomSessionService {
    fn default() -> Self {
        Self::new()
    }
}

/// Wall-clock epoch milliseconds, the timebase for cooldown enforcement.
fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

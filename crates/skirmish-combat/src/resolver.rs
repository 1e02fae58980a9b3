//! Attack resolution, spawn placement, and respawn.
//!
//! The resolver is the only code path allowed to stamp `last_attack_time`
//! or subtract health. It decides from what the store holds — the client's
//! own attacking flags and timestamps are never consulted for the cooldown
//! gate. Callers must run each resolver call under the same lock that
//! guards the store, so the cooldown read-check-write is atomic per
//! attacker.

use rand::Rng;

use skirmish_protocol::{
    PlayerId, PlayerState, Position, RoomName, ServerEvent, StateUpdate,
};
use skirmish_state::RoomStateStore;
use skirmish_sync::SyncBroadcaster;

use crate::{CombatConfig, CombatError};

/// What a successful attack did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackOutcome {
    pub damage: u32,
    pub target_health: u32,
}

/// Validates and applies combat operations against a [`RoomStateStore`].
#[derive(Debug, Clone, Default)]
pub struct CombatResolver {
    config: CombatConfig,
}

impl CombatResolver {
    pub fn new(config: CombatConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Places a player into the room with fresh state at a random spawn
    /// point. Re-joining overwrites whatever state was there before.
    ///
    /// An empty or absent nickname derives one from the identity prefix.
    pub fn join(
        &self,
        store: &mut RoomStateStore,
        room: &RoomName,
        id: &PlayerId,
        requested_nickname: Option<&str>,
    ) -> Position {
        let position = self.spawn_position();
        let nickname = match requested_nickname {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Knight-{}", id.short()),
        };

        let mut state = PlayerState::spawned(nickname, position);
        state.health = self.config.max_health;
        store.insert(room, id, state);

        tracing::info!(%room, player = %id, x = position.x, y = position.y, "player joined");
        position
    }

    /// Decides the outcome of an attack request and applies its effects.
    ///
    /// `now` is server-observed epoch milliseconds. On success the
    /// attacker's `last_attack_time` is stamped with it, the attacker's
    /// `is_attacking` flag is raised (and left for the attacker's next
    /// periodic push to overwrite), the rolled damage comes off the
    /// target's health with a floor of zero, and the victim gets a
    /// targeted `Hit` event through `sync`.
    pub fn resolve_attack(
        &self,
        store: &mut RoomStateStore,
        sync: &SyncBroadcaster,
        room: &RoomName,
        attacker: &PlayerId,
        target: &PlayerId,
        now: u64,
    ) -> Result<AttackOutcome, CombatError> {
        let target_state = store
            .get(room, target)
            .map_err(|_| CombatError::TargetNotFound(target.clone()))?;
        let attacker_state = store
            .get(room, attacker)
            .map_err(|_| CombatError::AttackerGone(attacker.clone()))?;

        // last_attack_time == 0 means the player has never attacked.
        if attacker_state.last_attack_time > 0 {
            let elapsed = now.saturating_sub(attacker_state.last_attack_time);
            if elapsed < self.config.attack_cooldown_ms {
                return Err(CombatError::OnCooldown {
                    remaining_ms: self.config.attack_cooldown_ms - elapsed,
                });
            }
        }

        store
            .update(
                room,
                attacker,
                &StateUpdate {
                    last_attack_time: Some(now),
                    is_attacking: Some(true),
                    ..StateUpdate::default()
                },
            )
            .map_err(|_| CombatError::AttackerGone(attacker.clone()))?;

        let damage = rand::rng().random_range(self.config.damage_min..=self.config.damage_max);
        let target_health = target_state.health.saturating_sub(damage);
        store
            .update(
                room,
                target,
                &StateUpdate {
                    health: Some(target_health),
                    ..StateUpdate::default()
                },
            )
            .map_err(|_| CombatError::TargetNotFound(target.clone()))?;

        sync.send_to(
            room,
            target,
            ServerEvent::Hit {
                attacker: attacker.clone(),
                damage,
            },
        );

        tracing::debug!(
            %room,
            attacker = %attacker,
            target = %target,
            damage,
            target_health,
            "attack resolved"
        );
        Ok(AttackOutcome {
            damage,
            target_health,
        })
    }

    /// Moves a player to a new spawn point with full health and the attack
    /// animation flag cleared. Orientation is kept as-is.
    pub fn respawn(
        &self,
        store: &mut RoomStateStore,
        room: &RoomName,
        id: &PlayerId,
    ) -> Result<Position, CombatError> {
        let position = self.spawn_position();
        store
            .update(
                room,
                id,
                &StateUpdate {
                    position: Some(position.into()),
                    health: Some(self.config.max_health),
                    is_attacking: Some(false),
                    ..StateUpdate::default()
                },
            )
            .map_err(|_| CombatError::PlayerNotFound(id.clone()))?;

        tracing::info!(%room, player = %id, x = position.x, y = position.y, "player respawned");
        Ok(position)
    }

    /// A spawn point: each axis lands in
    /// `spawn_center ± spawn_spread` (half-open on the high side).
    fn spawn_position(&self) -> Position {
        let mut rng = rand::rng();
        let spread = self.config.spawn_spread;
        let x = self.config.spawn_center + rng.random_range(-spread..spread);
        let y = self.config.spawn_center + rng.random_range(-spread..spread);
        Position::new(x as f32, y as f32)
    }
}

// =========================================================================
// Tests
// =========================================================================

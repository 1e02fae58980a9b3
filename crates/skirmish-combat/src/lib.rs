//! Combat resolution for Skirmish.
//!
//! [`CombatResolver`] owns the server-authoritative combat rules: spawn
//! placement on join, the attack cooldown gate, damage rolls, health
//! mutation, and respawn. It works directly against a
//! [`RoomStateStore`](skirmish_state::RoomStateStore) and emits targeted
//! hit notifications through a
//! [`SyncBroadcaster`](skirmish_sync::SyncBroadcaster).

mod config;
mod error;
mod resolver;

pub use config::CombatConfig;
pub use error::CombatError;
pub use resolver::{AttackOutcome, CombatResolver};

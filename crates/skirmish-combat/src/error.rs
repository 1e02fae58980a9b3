//! Error types for combat resolution.

use skirmish_protocol::PlayerId;

/// Errors that can occur while resolving combat operations.
#[derive(Debug, thiserror::Error)]
pub enum CombatError {
    /// The attack target has no state in the room.
    #[error("target {0} not found")]
    TargetNotFound(PlayerId),

    /// The attacker left the room before the attack resolved.
    #[error("attacker {0} not in room")]
    AttackerGone(PlayerId),

    /// The player for a respawn (or similar self-operation) is absent.
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    /// The attacker's cooldown window has not elapsed yet.
    #[error("attack on cooldown for another {remaining_ms} ms")]
    OnCooldown { remaining_ms: u64 },
}

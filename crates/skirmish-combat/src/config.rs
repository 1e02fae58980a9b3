//! Combat tuning knobs.

use skirmish_protocol::PlayerState;

/// Configuration for the combat resolver.
///
/// Defaults match the live arena tuning. Override individual fields with
/// struct update syntax:
///
/// ```rust
/// use skirmish_combat::CombatConfig;
///
/// let config = CombatConfig {
///     attack_cooldown_ms: 0, // no cooldown, e.g. for tests
///     ..CombatConfig::default()
/// };
/// assert_eq!(config.damage_max, 19);
/// ```
#[derive(Debug, Clone)]
pub struct CombatConfig {
    /// Minimum gap between two accepted attacks from the same attacker.
    pub attack_cooldown_ms: u64,

    /// Damage per hit is uniform in `damage_min..=damage_max`.
    pub damage_min: u32,
    pub damage_max: u32,

    /// Health on join and respawn.
    pub max_health: u32,

    /// Spawn points land at `spawn_center ± spawn_spread` (half-open on the
    /// high side) per axis.
    pub spawn_center: i32,
    pub spawn_spread: i32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            attack_cooldown_ms: 800,
            damage_min: 10,
            damage_max: 19,
            max_health: PlayerState::MAX_HEALTH,
            spawn_center: 1000,
            spawn_spread: 400,
        }
    }
}

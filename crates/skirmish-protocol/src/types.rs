//! Core types shared between the arena service and its clients.
//!
//! Everything here travels on the wire. Player-state payloads use camelCase
//! field names (`isAttacking`, `lastAttackTime`, …) because the presentation
//! layer consuming them is JavaScript; the serde attributes pin that shape.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The well-known room every client is admitted to by default.
pub const DEFAULT_ROOM: &str = "combat-arena";

/// Protocol version a client must present in its opening `Hello`.
pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque account identity of a player within a room.
///
/// Assigned by the authentication layer and immutable afterwards; used as
/// the map key everywhere player state is stored or routed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Short prefix of the identity, used to derive default nicknames.
    pub fn short(&self) -> String {
        self.0.chars().take(5).collect()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Name of a room: an isolated namespace holding one independent set of
/// player state. Rooms never share state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(pub String);

impl RoomName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The default combat room.
    pub fn combat_arena() -> Self {
        Self(DEFAULT_ROOM.to_string())
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Player state
// ---------------------------------------------------------------------------

/// A player's last-known location. Velocity is advisory — remote clients use
/// it only to pick walk/idle animations, the server never integrates it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub velocity_x: f32,
    #[serde(default)]
    pub velocity_y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            velocity_x: 0.0,
            velocity_y: 0.0,
        }
    }
}

/// One player's synchronized attributes within a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Display name shown above the sprite.
    pub nickname: String,
    pub position: Position,
    /// 0..=100, clamped on every write. 0 means defeated.
    pub health: u32,
    /// True while an attack animation is considered in progress.
    pub is_attacking: bool,
    pub facing_left: bool,
    /// Epoch milliseconds of the last server-accepted attack. Stamped only
    /// by the attack path; the cooldown gate re-reads it from the store at
    /// decision time rather than trusting anything client-submitted.
    pub last_attack_time: u64,
}

impl PlayerState {
    pub const MAX_HEALTH: u32 = 100;

    /// Freshly spawned state: full health, flags cleared, cooldown open.
    pub fn spawned(nickname: impl Into<String>, position: Position) -> Self {
        Self {
            nickname: nickname.into(),
            position,
            health: Self::MAX_HEALTH,
            is_attacking: false,
            facing_left: false,
            last_attack_time: 0,
        }
    }

    /// Merges the supplied fields into this state. Absent fields keep their
    /// current value; the nested position object merges field-wise so a
    /// caller can move without resending velocities. Health clamps to
    /// 0..=MAX_HEALTH.
    pub fn apply(&mut self, update: &StateUpdate) {
        if let Some(nickname) = &update.nickname {
            self.nickname = nickname.clone();
        }
        if let Some(pos) = &update.position {
            if let Some(x) = pos.x {
                self.position.x = x;
            }
            if let Some(y) = pos.y {
                self.position.y = y;
            }
            if let Some(vx) = pos.velocity_x {
                self.position.velocity_x = vx;
            }
            if let Some(vy) = pos.velocity_y {
                self.position.velocity_y = vy;
            }
        }
        if let Some(health) = update.health {
            self.health = health.min(Self::MAX_HEALTH);
        }
        if let Some(is_attacking) = update.is_attacking {
            self.is_attacking = is_attacking;
        }
        if let Some(facing_left) = update.facing_left {
            self.facing_left = facing_left;
        }
        if let Some(last_attack_time) = update.last_attack_time {
            self.last_attack_time = last_attack_time;
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.health == 0
    }
}

/// Partial [`Position`]: only the supplied axes/velocities are written.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionUpdate {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub velocity_x: Option<f32>,
    pub velocity_y: Option<f32>,
}

impl From<Position> for PositionUpdate {
    fn from(p: Position) -> Self {
        Self {
            x: Some(p.x),
            y: Some(p.y),
            velocity_x: Some(p.velocity_x),
            velocity_y: Some(p.velocity_y),
        }
    }
}

/// Partial [`PlayerState`], as pushed periodically by a client for its own
/// player. Every field optional; see [`PlayerState::apply`] for merge rules.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateUpdate {
    pub nickname: Option<String>,
    pub position: Option<PositionUpdate>,
    pub health: Option<u32>,
    pub is_attacking: Option<bool>,
    pub facing_left: Option<bool>,
    pub last_attack_time: Option<u64>,
}

/// One row of the aggregate room view: a player's identity plus state,
/// flattened into a single wire object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub id: PlayerId,
    #[serde(flatten)]
    pub state: PlayerState,
}

// ---------------------------------------------------------------------------
// Request surface
// ---------------------------------------------------------------------------

/// Requests a client can send, internally tagged so the JSON reads
/// `{ "type": "Attack", "target": "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientRequest {
    /// Opening message on a fresh connection: protocol version plus an
    /// auth token for the authenticator.
    Hello {
        version: u32,
        token: Option<String>,
    },

    /// Enter the combat room, optionally with a display name.
    JoinGame {
        #[serde(default)]
        nickname: Option<String>,
    },

    LeaveGame,

    /// Periodic push of the client's own state (position, orientation,
    /// attacking flag). Client-throttled; see the service docs.
    UpdateState {
        #[serde(default)]
        state: Option<StateUpdate>,
    },

    /// Attack another player by identity.
    Attack { target: PlayerId },

    Respawn,

    /// One-shot query for the full room roster.
    GetPlayers,
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// Result of `JoinGame`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JoinReply {
    pub fn ok(room_id: RoomName, position: Position) -> Self {
        Self {
            success: true,
            room_id: Some(room_id),
            position: Some(position),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            room_id: None,
            position: None,
            message: Some(message.into()),
        }
    }
}

/// Bare success/failure result (`LeaveGame`, `UpdateState`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AckReply {
    pub success: bool,
}

impl AckReply {
    pub fn ok() -> Self {
        Self { success: true }
    }

    pub fn failed() -> Self {
        Self { success: false }
    }
}

/// Result of `Attack`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_health: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AttackReply {
    pub fn ok(damage: u32, target_health: u32) -> Self {
        Self {
            success: true,
            damage: Some(damage),
            target_health: Some(target_health),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            damage: None,
            target_health: None,
            message: Some(message.into()),
        }
    }
}

/// Result of `Respawn`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespawnReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RespawnReply {
    pub fn ok(position: Position) -> Self {
        Self {
            success: true,
            position: Some(position),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            position: None,
            message: Some(message.into()),
        }
    }
}

/// Result of `GetPlayers`: the full room view. Empty on internal failure —
/// this query never reports an error to the caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RosterReply {
    pub players: Vec<PlayerEntry>,
}

// ---------------------------------------------------------------------------
// Server events
// ---------------------------------------------------------------------------

/// Everything the server sends: direct replies, the roster broadcast, and
/// targeted events. Internally tagged like [`ClientRequest`].
///
/// No ordering is guaranteed between a targeted `Hit` and the `Roster`
/// broadcast produced by the same attack; consumers must tolerate either
/// arriving first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Handshake accepted; the caller's identity for this connection.
    Welcome {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },

    JoinResult(JoinReply),
    LeaveResult(AckReply),
    UpdateResult(AckReply),
    AttackResult(AttackReply),
    RespawnResult(RespawnReply),
    Players(RosterReply),

    /// Snapshot broadcast: the aggregate room view after a mutation.
    Roster { players: Vec<PlayerEntry> },

    /// Targeted notification delivered to exactly one identity: you were
    /// hit by `attacker` for `damage` points.
    Hit { attacker: PlayerId, damage: u32 },

    /// Request-level failure (bad frame, handshake violation).
    Error { code: u16, message: String },
}

// =========================================================================
// Tests
// =========================================================================

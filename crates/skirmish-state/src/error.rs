//! Error types for the state layer.

use skirmish_protocol::{PlayerId, RoomName};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The player has no state in this room — never joined, or already left.
    #[error("player {0} not found in room {1}")]
    PlayerNotFound(PlayerId, RoomName),
}

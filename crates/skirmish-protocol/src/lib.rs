//! Wire protocol for Skirmish.
//!
//! Defines the language clients and the arena service speak:
//!
//! - **Types** ([`PlayerState`], [`StateUpdate`], [`ClientRequest`],
//!   [`ServerEvent`], …) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how they become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! This layer knows nothing about connections, rooms, or combat rules — it
//! only defines shapes and their serialization.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    AckReply, AttackReply, ClientRequest, DEFAULT_ROOM, JoinReply, PROTOCOL_VERSION, PlayerEntry,
    PlayerId, PlayerState, Position, PositionUpdate, RespawnReply, RoomName, RosterReply,
    ServerEvent, StateUpdate,
};

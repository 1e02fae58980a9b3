//! Per-room player state storage for Skirmish.
//!
//! [`RoomStateStore`] owns the `PlayerId -> PlayerState` mapping for every
//! room. It is the leaf dependency of the combat resolver and the session
//! service; see the concurrency note on the store itself for how atomicity
//! is provided.

mod error;
mod store;

pub use error::StateError;
pub use store::RoomStateStore;

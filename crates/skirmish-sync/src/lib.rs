//! State fan-out for Skirmish rooms.
//!
//! [`SyncBroadcaster`] delivers two kinds of traffic to room observers:
//!
//! - **Roster broadcasts** — the aggregate player-state view, pushed to
//!   every observer after a mutation settles.
//! - **Targeted events** — a message for exactly one identity (e.g. the
//!   `Hit` notification), best-effort, dropped silently if the recipient
//!   is gone.

mod broadcaster;

pub use broadcaster::{ObserverSender, SyncBroadcaster, SyncOutbound};

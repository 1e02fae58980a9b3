//! # Skirmish
//!
//! Authoritative room-state synchronization and combat resolution for a
//! real-time multiplayer arena. Clients roam a shared 2D space, attack one
//! another, and observe each other's position, health, and animation state;
//! the server owns the truth for all of it — cooldowns, damage, and health
//! are never trusted from the client side.
//!
//! This crate is the façade: [`RoomSessionService`] translates client
//! requests into operations on the state store, the combat resolver, and
//! the sync broadcaster, and [`ArenaServer`] exposes that service over
//! WebSocket.
//!
//! ```rust,no_run
//! use skirmish::{ArenaServer, ServerConfig, TokenIdentity};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), skirmish::SkirmishError> {
//!     let config = ServerConfig {
//!         bind_addr: "0.0.0.0:8080".to_string(),
//!         ..ServerConfig::default()
//!     };
//!     ArenaServer::bind(config, TokenIdentity).await?.run().await
//! }
//! ```

mod auth;
mod error;
mod handler;
mod server;
mod service;

pub use auth::{Authenticator, TokenIdentity};
pub use error::{AuthError, SkirmishError};
pub use server::{ArenaServer, ServerConfig};
pub use service::{RoomSessionService, SessionContext};

// Re-exported so embedders and tests need only this crate.
pub use skirmish_combat::{CombatConfig, CombatError, CombatResolver};
pub use skirmish_protocol as protocol;
pub use skirmish_sync::SyncOutbound;

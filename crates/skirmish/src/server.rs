//! `ArenaServer`: the WebSocket entry point for the arena service.
//!
//! Accepts connections, hands each one to a handler task, and shares the
//! session service across all of them.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use skirmish_combat::CombatConfig;
use skirmish_protocol::JsonCodec;

use crate::handler::handle_connection;
use crate::{Authenticator, RoomSessionService, SkirmishError};

/// Gateway settings. Override individual fields with struct update syntax.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,

    /// How long a fresh connection gets to send its `Hello`.
    pub handshake_timeout: Duration,

    /// Connections silent for longer than this are dropped (and the player
    /// implicitly leaves). Clients pushing state every ~100 ms never come
    /// close.
    pub idle_timeout: Duration,

    /// Combat tuning handed to the session service.
    pub combat: CombatConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            handshake_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(30),
            combat: CombatConfig::default(),
        }
    }
}

/// Shared server state, one instance behind an `Arc` for all connection
/// tasks. The service carries its own locking; everything else is
/// read-only after startup.
pub(crate) struct ServerState<A: Authenticator> {
    pub(crate) service: RoomSessionService,
    pub(crate) auth: A,
    pub(crate) codec: JsonCodec,
    pub(crate) config: ServerConfig,
}

/// A running arena gateway.
///
/// ```rust,no_run
/// use skirmish::{ArenaServer, ServerConfig, TokenIdentity};
///
/// # async fn run() -> Result<(), skirmish::SkirmishError> {
/// let server = ArenaServer::bind(ServerConfig::default(), TokenIdentity).await?;
/// server.run().await
/// # }
/// ```
pub struct ArenaServer<A: Authenticator> {
    listener: TcpListener,
    state: Arc<ServerState<A>>,
}

impl<A: Authenticator> ArenaServer<A> {
    /// Binds the listener and wires up a fresh session service.
    pub async fn bind(config: ServerConfig, auth: A) -> Result<Self, SkirmishError> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        tracing::info!(addr = %config.bind_addr, "arena server listening");

        let state = Arc::new(ServerState {
            service: RoomSessionService::with_config(config.combat.clone()),
            auth,
            codec: JsonCodec,
            config,
        });

        Ok(Self { listener, state })
    }

    /// The address the server actually bound to (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Each accepted connection gets its own task; a connection failing
    /// never affects the others or the loop.
    pub async fn run(self) -> Result<(), SkirmishError> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, peer, state).await {
                            tracing::debug!(%peer, error = %err, "connection ended with error");
                        }
                    });
                }
                Err(err) => {
                    tracing::error!(error = %err, "accept failed");
                }
            }
        }
    }
}

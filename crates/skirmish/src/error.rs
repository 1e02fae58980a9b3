//! Error types for the gateway layer.

use skirmish_protocol::ProtocolError;

/// Authentication failed: the token was invalid, expired, or rejected by
/// the [`Authenticator`](crate::Authenticator).
#[derive(Debug, thiserror::Error)]
#[error("authentication failed: {0}")]
pub struct AuthError(pub String);

/// Top-level error for server and connection handling.
///
/// Client-visible failures never surface through this type — the service
/// converts those to `success: false` replies. This enum covers what can go
/// wrong around a connection itself: sockets, frames, handshakes.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// Encoding/decoding or a protocol-rule violation (bad handshake).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// WebSocket-level failure (accept, send, receive).
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Socket-level failure (bind, accept).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection failed authentication.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

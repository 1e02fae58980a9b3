//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed, truncated, or wrongly-typed input.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but violates protocol rules — e.g. a handshake
    /// with the wrong version, or a request sent before `Hello`.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

//! Codec trait and implementations for serializing messages.
//!
//! The rest of the stack doesn't care how requests and events become bytes;
//! it only needs something implementing [`Codec`]. [`JsonCodec`] is the
//! default — human-readable and directly consumable by browser clients. A
//! binary codec can be added behind a feature flag without touching callers.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because a codec is stored in long-lived server
/// state and shared across connection tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientRequest, PROTOCOL_VERSION};

    #[test]
    fn test_json_codec_round_trip() {
        let codec = JsonCodec;
        let req = ClientRequest::Hello {
            version: PROTOCOL_VERSION,
            token: None,
        };

        let bytes = codec.encode(&req).unwrap();
        let decoded: ClientRequest = codec.decode(&bytes).unwrap();
        assert_eq!(req, decoded);
    }

    #[test]
    fn test_json_codec_decode_malformed_fails() {
        let codec = JsonCodec;
        let result: Result<ClientRequest, _> = codec.decode(b"{truncated");
        assert!(result.is_err());
    }
}

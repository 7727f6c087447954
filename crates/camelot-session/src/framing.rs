//! Read-loop framing limits (§4.5).

use std::time::Duration;

use camelot_protocol::{ClientEnvelope, Codec, JsonCodec, ProtocolError};

use crate::error::SessionError;

pub const MAX_MESSAGE_SIZE: usize = 512 * 1024;
pub const PING_INTERVAL: Duration = Duration::from_secs(54);
pub const PONG_TIMEOUT: Duration = Duration::from_secs(60);

/// Decodes one client message, enforcing the size cap before touching the
/// codec. Unknown `type` values and malformed JSON both surface as
/// [`SessionError::Decode`] — the read loop logs and continues rather than
/// closing the connection (§4.5).
pub fn decode_client_message(raw: &str) -> Result<ClientEnvelope, SessionError> {
    if raw.len() > MAX_MESSAGE_SIZE {
        return Err(SessionError::MessageTooLarge);
    }
    JsonCodec.decode(raw.as_bytes()).map_err(|err| match err {
        ProtocolError::Decode(source) => SessionError::Decode(source),
        ProtocolError::Encode(_) | ProtocolError::InvalidMessage(_) => {
            unreachable!("JsonCodec::decode only ever returns ProtocolError::Decode")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_message_is_rejected_before_parsing() {
        let raw = "x".repeat(MAX_MESSAGE_SIZE + 1);
        assert!(matches!(decode_client_message(&raw), Err(SessionError::MessageTooLarge)));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let raw = r#"{"type":"teleport","payload":{}}"#;
        assert!(decode_client_message(raw).is_err());
    }

    #[test]
    fn chat_message_decodes() {
        let raw = r#"{"type":"chat","payload":{"message":"hi"}}"#;
        assert!(decode_client_message(raw).is_ok());
    }
}

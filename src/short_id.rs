//! Short, URL-safe public identifiers for UUID-keyed entities.
//!
//! A short id is the 16 raw bytes of the UUID encoded with the URL-safe
//! base64 alphabet, without `=` padding (22 characters).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShortIdError {
    #[error("short id is not valid base64: {0}")]
    InvalidBase64(String),

    #[error("short id decodes to {0} bytes, expected 16")]
    WrongLength(usize),
}

/// Encode a UUID as a short id.
pub fn encode(uuid: &Uuid) -> String {
    URL_SAFE_NO_PAD.encode(uuid.as_bytes())
}

/// Decode a short id back into a UUID.
///
/// Padded tokens are accepted too. Callers looking up entities should treat
/// any error as "no such entity".
pub fn decode(token: &str) -> Result<Uuid, ShortIdError> {
    let unpadded = token.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(unpadded)
        .map_err(|e| ShortIdError::InvalidBase64(e.to_string()))?;
    let bytes: [u8; 16] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| ShortIdError::WrongLength(bytes.len()))?;
    Ok(Uuid::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_random_uuids() {
        for _ in 0..200 {
            let uuid = Uuid::new_v4();
            let token = encode(&uuid);
            assert_eq!(token.len(), 22);
            assert_eq!(decode(&token).unwrap(), uuid);
        }
    }

    #[test]
    fn encodes_known_uuid() {
        let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let token = encode(&uuid);
        assert_eq!(token, "VQ6EAOKbQdSnFkRmVUQAAA");
        assert!(!token.contains('='));
        assert_eq!(
            decode(&token).unwrap().hyphenated().to_string(),
            "550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn uses_url_safe_alphabet() {
        let uuid = Uuid::from_bytes([0xff; 16]);
        let token = encode(&uuid);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert!(token.contains('_'));
        assert_eq!(decode(&token).unwrap(), uuid);
    }

    #[test]
    fn accepts_padded_tokens() {
        let uuid = Uuid::new_v4();
        let padded = format!("{}==", encode(&uuid));
        assert_eq!(decode(&padded).unwrap(), uuid);
    }

    #[test]
    fn distinct_uuids_give_distinct_tokens() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        assert_ne!(encode(&a), encode(&b));
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(
            decode("not*a*token"),
            Err(ShortIdError::InvalidBase64(_))
        ));
        assert!(matches!(decode("abc$"), Err(ShortIdError::InvalidBase64(_))));
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(decode("AAAA"), Err(ShortIdError::WrongLength(3)));
        assert_eq!(decode(""), Err(ShortIdError::WrongLength(0)));
        let long = URL_SAFE_NO_PAD.encode([7u8; 20]);
        assert_eq!(decode(&long), Err(ShortIdError::WrongLength(20)));
    }
}

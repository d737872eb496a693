//! Opaque pagination cursors.
//!
//! A cursor wraps the store's resume key as hex over
//! `version (1 byte) | JSON key | blake3(version | JSON key)[..8]`.
//! The checksum catches truncated or edited tokens so they fail as malformed
//! input instead of resuming from an arbitrary position.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::store::StoreError;
use crate::value::StoreKey;

const VERSION: u8 = 1;
const CHECKSUM_LEN: usize = 8;

/// Caller-facing pagination token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// The token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Cursor {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Cursor {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode a resume key as a cursor.
pub fn encode(key: &StoreKey) -> Result<Cursor, StoreError> {
    let mut bytes = vec![VERSION];
    serde_json::to_writer(&mut bytes, key).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let checksum = blake3::hash(&bytes);
    bytes.extend_from_slice(&checksum.as_bytes()[..CHECKSUM_LEN]);
    Ok(Cursor(hex::encode(bytes)))
}

/// Decode a cursor back into the resume key it was made from.
pub fn decode(cursor: &Cursor) -> Result<StoreKey, ValidationError> {
    let bytes = hex::decode(cursor.as_str())
        .map_err(|e| ValidationError::MalformedCursor(format!("not a cursor token: {}", e)))?;
    if bytes.len() < 1 + CHECKSUM_LEN {
        return Err(ValidationError::MalformedCursor("token too short".to_string()));
    }

    let (body, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    if blake3::hash(body).as_bytes()[..CHECKSUM_LEN] != *checksum {
        return Err(ValidationError::MalformedCursor("checksum mismatch".to_string()));
    }
    if body[0] != VERSION {
        return Err(ValidationError::MalformedCursor(format!(
            "unsupported cursor version {}",
            body[0]
        )));
    }

    serde_json::from_slice(&body[1..])
        .map_err(|e| ValidationError::MalformedCursor(format!("invalid payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn index_key() -> StoreKey {
        let mut key = StoreKey::new();
        key.insert("PK".into(), Value::from("ATHLETE#7"));
        key.insert("SK".into(), Value::from("PROFILE"));
        key.insert("category".into(), Value::from("Football"));
        key.insert("cohort".into(), Value::Int(2026));
        key.insert("gpa".into(), Value::Float(3.25));
        key
    }

    #[test]
    fn test_roundtrip() {
        let key = index_key();
        assert_eq!(decode(&encode(&key).unwrap()).unwrap(), key);
    }

    #[test]
    fn test_empty_map_roundtrip() {
        let key = StoreKey::new();
        let cursor = encode(&key).unwrap();
        assert!(!cursor.as_str().is_empty());
        assert_eq!(decode(&cursor).unwrap(), key);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        assert_eq!(encode(&index_key()).unwrap(), encode(&index_key()).unwrap());
    }

    #[test]
    fn test_malformed_tokens() {
        for token in ["", "zz", "abcd", "not a cursor"] {
            assert!(matches!(
                decode(&Cursor::from(token)),
                Err(ValidationError::MalformedCursor(_))
            ));
        }
    }

    #[test]
    fn test_tampered_token_rejected() {
        let cursor = encode(&index_key()).unwrap();
        let mut bytes = hex::decode(cursor.as_str()).unwrap();
        bytes[3] ^= 0x01;
        let tampered = Cursor::from(hex::encode(bytes));
        assert_eq!(
            decode(&tampered),
            Err(ValidationError::MalformedCursor("checksum mismatch".to_string()))
        );
    }

    #[test]
    fn test_serde_transparent() {
        let cursor = Cursor::from("00ff");
        assert_eq!(serde_json::to_string(&cursor).unwrap(), "\"00ff\"");
    }
}

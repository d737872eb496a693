//! Record envelope for stored items.

use rkyv::{Archive, Deserialize, Serialize};

use super::StoreError;
use crate::value::{Item, Value, CREATED_AT, UPDATED_AT};

/// A stored item with its write metadata.
///
/// The item body is JSON so that arbitrarily nested attribute values survive
/// unchanged; the envelope itself is archived with rkyv. Integer write stamps
/// are lifted out of the body into the envelope and restored on decode; a stamp
/// of any other type stays in the body untouched.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Record {
    /// JSON-encoded item, without its integer write stamps.
    pub data: Vec<u8>,

    /// Creation timestamp in milliseconds since Unix epoch.
    pub created_at: Option<i64>,

    /// Last write timestamp in milliseconds since Unix epoch.
    pub updated_at: Option<i64>,
}

impl Record {
    /// Wrap an item.
    pub fn from_item(item: &Item) -> Result<Self, StoreError> {
        let mut body = item.clone();
        let created_at = take_stamp(&mut body, CREATED_AT);
        let updated_at = take_stamp(&mut body, UPDATED_AT);

        let data =
            serde_json::to_vec(&body).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self {
            data,
            created_at,
            updated_at,
        })
    }

    /// Decode the wrapped item, stamps included.
    pub fn item(&self) -> Result<Item, StoreError> {
        let mut item: Item = serde_json::from_slice(&self.data)
            .map_err(|e| StoreError::Deserialization(e.to_string()))?;
        for (attr, stamp) in [(CREATED_AT, self.created_at), (UPDATED_AT, self.updated_at)] {
            if let Some(ms) = stamp {
                item.insert(attr.to_string(), Value::Int(ms));
            }
        }
        Ok(item)
    }

    /// Serialize the record to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Deserialize a record from bytes using rkyv.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        // sled values carry no alignment guarantee
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| StoreError::Deserialization(e.to_string()))
    }
}

fn take_stamp(body: &mut Item, attr: &str) -> Option<i64> {
    match body.get(attr) {
        Some(Value::Int(ms)) => {
            let ms = *ms;
            body.remove(attr);
            Some(ms)
        }
        _ => None,
    }
}

//! Primary keys and order-preserving key encoding.
//!
//! Every tree key is a sequence of components. A component is a type tag plus
//! payload, with `0x00` bytes escaped as `0x00 0xFF` and a `0x00 0x01`
//! terminator. Escaping keeps byte order equal to value order and makes an
//! unterminated string component a byte prefix of every longer string that
//! starts with it, which is what `begins_with` range reads rely on.

use std::fmt;

use super::StoreError;
use crate::value::{Item, StoreKey, Value, PARTITION_KEY, SORT_KEY};

const ESCAPE: u8 = 0xFF;
const TERMINATOR: [u8; 2] = [0x00, 0x01];

const TAG_NULL: u8 = 0x01;
const TAG_BOOL: u8 = 0x02;
const TAG_NUMBER: u8 = 0x03;
const TAG_STRING: u8 = 0x04;

/// Primary key of an item: partition (`PK`) and sort (`SK`) strings.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    /// Partition key value.
    pub pk: String,
    /// Sort key value.
    pub sk: String,
}

impl ItemKey {
    /// Create a key from partition and sort values.
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }

    /// Extract the primary key from an item.
    pub fn from_item(item: &Item) -> Result<Self, StoreError> {
        let pk = string_attribute(item, PARTITION_KEY)?;
        let sk = string_attribute(item, SORT_KEY)?;
        Ok(Self::new(pk, sk))
    }

    /// Extract the primary key from a resume key.
    pub fn from_store_key(key: &StoreKey) -> Result<Self, StoreError> {
        Self::from_item(key)
    }

    /// The key as an attribute map.
    pub fn to_item(&self) -> Item {
        let mut item = Item::new();
        item.insert(PARTITION_KEY.to_string(), Value::String(self.pk.clone()));
        item.insert(SORT_KEY.to_string(), Value::String(self.sk.clone()));
        item
    }

    /// Encode as the data tree key.
    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.pk.len() + self.sk.len() + 8);
        push_str(&mut buf, &self.pk);
        push_str(&mut buf, &self.sk);
        buf
    }
}

impl fmt::Debug for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemKey({}/{})", self.pk, self.sk)
    }
}

fn string_attribute(item: &Item, name: &str) -> Result<String, StoreError> {
    match item.get(name) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(other) => Err(StoreError::InvalidKey(format!(
            "key attribute '{}' must be a non-empty string, got {}",
            name,
            other.type_name()
        ))),
        None => Err(StoreError::InvalidKey(format!(
            "missing key attribute '{}'",
            name
        ))),
    }
}

/// Append a string component.
pub(crate) fn push_str(buf: &mut Vec<u8>, s: &str) {
    buf.push(TAG_STRING);
    escape_into(s.as_bytes(), buf);
    buf.extend_from_slice(&TERMINATOR);
}

/// Append a value component. Returns `false` (leaving `buf` untouched) for
/// values that cannot act as key attributes: lists, maps and NaN.
pub(crate) fn push_value(buf: &mut Vec<u8>, value: &Value) -> bool {
    match value {
        Value::Null => {
            buf.push(TAG_NULL);
            buf.extend_from_slice(&TERMINATOR);
        }
        Value::Bool(b) => {
            buf.push(TAG_BOOL);
            escape_into(&[u8::from(*b)], buf);
            buf.extend_from_slice(&TERMINATOR);
        }
        Value::Int(_) | Value::Float(_) => {
            let n = value.as_f64().unwrap_or(f64::NAN);
            if n.is_nan() {
                return false;
            }
            buf.push(TAG_NUMBER);
            escape_into(&sortable_number(n), buf);
            buf.extend_from_slice(&TERMINATOR);
        }
        Value::String(s) => push_str(buf, s),
        Value::List(_) | Value::Map(_) => return false,
    }
    true
}

/// Append an unterminated string component: the byte prefix shared by every
/// string component starting with `prefix`.
pub(crate) fn push_str_prefix(buf: &mut Vec<u8>, prefix: &str) {
    buf.push(TAG_STRING);
    escape_into(prefix.as_bytes(), buf);
}

/// Smallest key greater than every key starting with `prefix`, if one exists.
pub(crate) fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

fn escape_into(bytes: &[u8], buf: &mut Vec<u8>) {
    for &b in bytes {
        buf.push(b);
        if b == 0x00 {
            buf.push(ESCAPE);
        }
    }
}

/// Big-endian bits with the sign handled so byte order matches numeric order.
fn sortable_number(n: f64) -> [u8; 8] {
    // Fold -0.0 into 0.0 so equal numbers encode identically.
    let n = if n == 0.0 { 0.0 } else { n };
    let bits = n.to_bits();
    let sortable = if bits & 0x8000_0000_0000_0000 != 0 {
        !bits
    } else {
        bits ^ 0x8000_0000_0000_0000
    };
    sortable.to_be_bytes()
}

/// Current time in milliseconds since Unix epoch.
pub fn current_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

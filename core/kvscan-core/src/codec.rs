//! Value codec: turns stored payloads into logical values.
//!
//! Records reach the scan either still serialized or already in logical form
//! (e.g. values cached in object format). [`ValueCodec::decode`] handles both
//! with a single match; only the serialized arm touches the deserializer.

use crate::error::ScanResult;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A key or value as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoredValue {
    /// Binary payload produced by a [`ValueCodec`].
    Serialized(Vec<u8>),
    /// Already-decoded value.
    Logical(Value),
}

impl StoredValue {
    pub fn is_serialized(&self) -> bool {
        matches!(self, StoredValue::Serialized(_))
    }
}

impl From<Value> for StoredValue {
    fn from(v: Value) -> Self {
        StoredValue::Logical(v)
    }
}

/// Serialization seam between the store and the scan.
///
/// # Contract
///
/// - `deserialize`: binary payload → logical value; malformed input is a
///   `Decode` error, never a panic.
/// - `serialize`: inverse of `deserialize`, used by writers populating a store.
/// - `decode`: passes logical values through unchanged.
pub trait ValueCodec: Send + Sync {
    fn serialize(&self, value: &Value) -> ScanResult<Vec<u8>>;

    fn deserialize(&self, bytes: &[u8]) -> ScanResult<Value>;

    fn decode(&self, stored: &StoredValue) -> ScanResult<Value> {
        match stored {
            StoredValue::Serialized(bytes) => self.deserialize(bytes),
            StoredValue::Logical(value) => Ok(value.clone()),
        }
    }

    /// Serialize into a [`StoredValue::Serialized`].
    fn encode(&self, value: &Value) -> ScanResult<StoredValue> {
        Ok(StoredValue::Serialized(self.serialize(value)?))
    }
}

/// Compact binary codec (bincode).
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl ValueCodec for BincodeCodec {
    fn serialize(&self, value: &Value) -> ScanResult<Vec<u8>> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize(&self, bytes: &[u8]) -> ScanResult<Value> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Plain JSON documents, e.g. `{"age":30,"tags":["a"]}`.
///
/// Bytes are written as arrays of numbers and read back as lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ValueCodec for JsonCodec {
    fn serialize(&self, value: &Value) -> ScanResult<Vec<u8>> {
        Ok(serde_json::to_vec(&value.to_json())?)
    }

    fn deserialize(&self, bytes: &[u8]) -> ScanResult<Value> {
        let json: serde_json::Value = serde_json::from_slice(bytes)?;
        Ok(Value::from_json(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanStage;

    #[test]
    fn logical_passes_through() {
        let stored = StoredValue::Logical(Value::from("x"));
        assert_eq!(BincodeCodec.decode(&stored).unwrap(), Value::from("x"));
        assert!(!stored.is_serialized());
    }

    #[test]
    fn bincode_decodes_serialized_object() {
        let value = Value::object([("age", Value::from(41)), ("name", Value::from("bo"))]);
        let stored = BincodeCodec.encode(&value).unwrap();
        assert!(stored.is_serialized());
        assert_eq!(BincodeCodec.decode(&stored).unwrap(), value);
    }

    #[test]
    fn json_reads_plain_documents() {
        let stored = StoredValue::Serialized(br#"{"age":30,"tags":["a"]}"#.to_vec());
        let value = JsonCodec.decode(&stored).unwrap();
        assert_eq!(
            value,
            Value::object([
                ("age", Value::from(30)),
                ("tags", Value::List(vec![Value::from("a")])),
            ])
        );

        let written = JsonCodec.serialize(&value).unwrap();
        assert_eq!(written, br#"{"age":30,"tags":["a"]}"#.to_vec());
    }

    #[test]
    fn corrupt_payload_is_decode_error() {
        let err = BincodeCodec
            .decode(&StoredValue::Serialized(vec![0xde, 0xad]))
            .unwrap_err();
        assert_eq!(err.stage(), ScanStage::Decode);

        let err = JsonCodec
            .decode(&StoredValue::Serialized(b"{not json".to_vec()))
            .unwrap_err();
        assert_eq!(err.stage(), ScanStage::Decode);
    }
}

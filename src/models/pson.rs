//! PSON string codec
//!
//! The CA copies text out of X.509 fields byte for byte, so string values in
//! its JSON are ISO-8859-1 rather than UTF-8. [`decode`] and [`encode`] convert
//! between those bytes and Rust strings; the serde adapters in this module
//! apply them to individual fields with `#[serde(with = "pson")]`. Structural
//! JSON (numbers, delimiters, keys of our own types) is left alone.
//!
//! Bytes `0x80..=0x9F` are not assigned a graphic character in ISO/IEC 8859-1
//! and are rejected in both directions, so every accepted string round-trips.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{self, Serialize, SerializeMap, SerializeSeq, Serializer};
use thiserror::Error;

/// Character set conversion failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A byte with no ISO-8859-1 character
    #[error("byte 0x{byte:02X} at offset {offset} has no ISO-8859-1 character")]
    UnmappedByte { byte: u8, offset: usize },

    /// A character outside the ISO-8859-1 repertoire
    #[error("character {ch:?} at offset {offset} cannot be encoded as ISO-8859-1")]
    Unrepresentable { ch: char, offset: usize },
}

fn is_mapped(code: u32) -> bool {
    code <= 0xFF && !(0x80..=0x9F).contains(&code)
}

/// Decode ISO-8859-1 bytes into a string
pub fn decode(bytes: &[u8]) -> Result<String, CodecError> {
    bytes
        .iter()
        .enumerate()
        .map(|(offset, &byte)| {
            if is_mapped(u32::from(byte)) {
                Ok(char::from(byte))
            } else {
                Err(CodecError::UnmappedByte { byte, offset })
            }
        })
        .collect()
}

/// Encode a string as ISO-8859-1 bytes
///
/// Offsets in the returned error are byte offsets into `text`.
pub fn encode(text: &str) -> Result<Vec<u8>, CodecError> {
    text.char_indices()
        .map(|(offset, ch)| {
            u8::try_from(ch)
                .ok()
                .filter(|byte| is_mapped(u32::from(*byte)))
                .ok_or(CodecError::Unrepresentable { ch, offset })
        })
        .collect()
}

/// Check that `text` can be encoded without allocating the encoded form
pub fn validate(text: &str) -> Result<(), CodecError> {
    text.char_indices().try_for_each(|(offset, ch)| {
        if is_mapped(u32::from(ch)) {
            Ok(())
        } else {
            Err(CodecError::Unrepresentable { ch, offset })
        }
    })
}

struct PsonVisitor;

impl<'de> Visitor<'de> for PsonVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an ISO-8859-1 encoded string")
    }

    // serde_json hands string contents here unescaped and without UTF-8 checks
    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<String, E> {
        decode(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        validate(v).map_err(E::custom)?;
        Ok(v.to_owned())
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct Pson(String);

impl<'de> Deserialize<'de> for Pson {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_bytes(PsonVisitor).map(Pson)
    }
}

struct PsonRef<'a>(&'a str);

impl Serialize for PsonRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        validate(self.0).map_err(ser::Error::custom)?;
        serializer.serialize_str(self.0)
    }
}

pub fn serialize<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    PsonRef(value).serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Pson::deserialize(deserializer).map(|s| s.0)
}

/// `Option<String>` fields
pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(text) => serializer.serialize_some(&PsonRef(text)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(Option::<Pson>::deserialize(deserializer)?.map(|s| s.0))
    }
}

/// `Vec<String>` fields; `null` decodes as an empty list
pub mod list {
    use super::*;

    pub fn serialize<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&PsonRef(value))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(Option::<Vec<Pson>>::deserialize(deserializer)?
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.0)
            .collect())
    }
}

/// `BTreeMap<String, String>` fields, keys and values both encoded
pub mod map {
    use super::*;

    pub fn serialize<S: Serializer>(
        values: &BTreeMap<String, String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(values.len()))?;
        for (key, value) in values {
            map.serialize_entry(&PsonRef(key), &PsonRef(value))?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, String>, D::Error> {
        Ok(Option::<BTreeMap<Pson, Pson>>::deserialize(deserializer)?
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k.0, v.0))
            .collect())
    }
}

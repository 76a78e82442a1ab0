//! Dynamically-typed metadata values.
//!
//! Revision metadata is a map from field name to [`Value`], a closed tagged
//! union. Equality is structural and tag-aware: `Integer(1)` never equals
//! `Decimal("1")`, and two maps are equal when they hold the same keys with
//! equal values regardless of insertion order.
//!
//! # Canonical encoding
//!
//! [`Value::write_canonical`] produces the byte form fed into revision
//! hashing. Each value is a one-byte tag followed by its payload; variable
//! length payloads carry a big-endian `u64` length prefix and map entries are
//! emitted in ascending key order. The encoding is injective, so two values
//! share an encoding only if they are equal.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::hash::Hash;

// ---------------------------------------------------------------------------
// Decimal
// ---------------------------------------------------------------------------

/// Error returned when text is not a valid decimal literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid decimal literal: {0:?}")]
pub struct DecimalParseError(pub String);

/// An arbitrary-precision decimal kept in its exact textual form.
///
/// Accepts `-?digits(.digits)?([eE][+-]?digits)?`. The text is stored as
/// given, so `1.50` and `1.5` are distinct values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, std::hash::Hash)]
pub struct Decimal(String);

impl Decimal {
    /// Parse and validate a decimal literal.
    ///
    /// # Errors
    ///
    /// Returns [`DecimalParseError`] if `text` is not a decimal literal.
    pub fn parse(text: &str) -> Result<Self, DecimalParseError> {
        if is_decimal_literal(text) {
            Ok(Self(text.to_string()))
        } else {
            Err(DecimalParseError(text.to_string()))
        }
    }

    /// The literal text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_decimal_literal(text: &str) -> bool {
    fn digits(bytes: &[u8], mut pos: usize) -> (usize, bool) {
        let start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        (pos, pos > start)
    }

    let bytes = text.as_bytes();
    let mut pos = 0;
    if bytes.first() == Some(&b'-') {
        pos += 1;
    }
    let (next, any) = digits(bytes, pos);
    if !any {
        return false;
    }
    pos = next;
    if bytes.get(pos) == Some(&b'.') {
        let (next, any) = digits(bytes, pos + 1);
        if !any {
            return false;
        }
        pos = next;
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let (next, any) = digits(bytes, pos);
        if !any {
            return false;
        }
        pos = next;
    }
    pos == bytes.len()
}

impl FromStr for Decimal {
    type Err = DecimalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// A UTC instant with millisecond precision.
///
/// Sub-millisecond precision is dropped on construction, so equality and the
/// canonical encoding always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, std::hash::Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Milliseconds since the Unix epoch. `None` outside chrono's range.
    #[must_use]
    pub fn from_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Self)
    }

    /// Truncate `instant` to whole milliseconds.
    #[must_use]
    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        Self(instant.trunc_subsecs(3))
    }

    #[must_use]
    pub const fn millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::from_datetime(instant)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.millis())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        Self::from_millis(millis).ok_or_else(|| {
            serde::de::Error::custom(format!("timestamp out of range: {millis}"))
        })
    }
}

// ---------------------------------------------------------------------------
// ValueMap
// ---------------------------------------------------------------------------

/// An insertion-ordered map from string keys to values.
///
/// Keys are unique: inserting an existing key replaces its value in place.
/// Equality and hashing ignore insertion order.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    entries: Vec<(String, Value)>,
}

impl ValueMap {
    /// Create an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or replace a value, returning the previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Remove a key, returning its value. Remaining entries keep their order.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries sorted by key.
    fn sorted(&self) -> Vec<(&str, &Value)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl PartialEq for ValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

impl Eq for ValueMap {}

impl std::hash::Hash for ValueMap {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        let sorted = self.sorted();
        sorted.len().hash(state);
        for (k, v) in sorted {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for ValueMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ValueMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueMapVisitor;

        impl<'de> Visitor<'de> for ValueMapVisitor {
            type Value = ValueMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of string keys to tagged values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ValueMap, A::Error> {
                let mut map = ValueMap::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    if map.insert(key.clone(), value).is_some() {
                        return Err(serde::de::Error::custom(format!("duplicate key {key:?}")));
                    }
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(ValueMapVisitor)
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A metadata value.
#[derive(Debug, Clone, PartialEq, Eq, std::hash::Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// Explicit null. Distinct from an absent key.
    Null,
    /// `true` / `false`.
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// Exact decimal literal.
    Decimal(Decimal),
    /// UTF-8 text.
    String(String),
    /// Instant with millisecond precision.
    Date(Timestamp),
    /// Opaque bytes, hex in JSON.
    Binary(#[serde(with = "hex_bytes")] Vec<u8>),
    /// A content or revision digest.
    Hash(Hash),
    /// A 16-byte globally unique identifier.
    Guid(Uuid),
    /// Ordered sequence.
    Array(Vec<Value>),
    /// Insertion-ordered string-keyed map.
    Map(ValueMap),
}

const TAG_NULL: u8 = 0;
const TAG_BOOLEAN: u8 = 1;
const TAG_INTEGER: u8 = 2;
const TAG_DECIMAL: u8 = 3;
const TAG_STRING: u8 = 4;
const TAG_DATE: u8 = 5;
const TAG_BINARY: u8 = 6;
const TAG_HASH: u8 = 7;
const TAG_GUID: u8 = 8;
const TAG_ARRAY: u8 = 9;
const TAG_MAP: u8 = 10;

impl Value {
    /// Build a date value from milliseconds since the Unix epoch.
    ///
    /// Returns `None` if `millis` is outside chrono's representable range.
    #[must_use]
    pub fn date_millis(millis: i64) -> Option<Self> {
        Timestamp::from_millis(millis).map(Self::Date)
    }

    /// Build a date value, truncating to millisecond precision.
    #[must_use]
    pub fn date(instant: DateTime<Utc>) -> Self {
        Self::Date(Timestamp::from_datetime(instant))
    }

    /// Build a decimal value from its literal text.
    ///
    /// # Errors
    ///
    /// Returns [`DecimalParseError`] if `text` is not a decimal literal.
    pub fn decimal(text: &str) -> Result<Self, DecimalParseError> {
        Decimal::parse(text).map(Self::Decimal)
    }

    /// Lowercase name of the variant, matching the JSON `type` tag.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Decimal(_) => "decimal",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::Binary(_) => "binary",
            Self::Hash(_) => "hash",
            Self::Guid(_) => "guid",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    /// Borrow the string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if this is an integer.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean payload, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Append the canonical encoding of this value to `buf`.
    pub fn write_canonical(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Null => buf.push(TAG_NULL),
            Self::Boolean(b) => {
                buf.push(TAG_BOOLEAN);
                buf.push(u8::from(*b));
            }
            Self::Integer(n) => {
                buf.push(TAG_INTEGER);
                buf.extend_from_slice(&n.to_be_bytes());
            }
            Self::Decimal(d) => {
                buf.push(TAG_DECIMAL);
                write_bytes(buf, d.as_str().as_bytes());
            }
            Self::String(s) => {
                buf.push(TAG_STRING);
                write_bytes(buf, s.as_bytes());
            }
            Self::Date(instant) => {
                buf.push(TAG_DATE);
                buf.extend_from_slice(&instant.millis().to_be_bytes());
            }
            Self::Binary(bytes) => {
                buf.push(TAG_BINARY);
                write_bytes(buf, bytes);
            }
            Self::Hash(hash) => {
                buf.push(TAG_HASH);
                buf.extend_from_slice(hash.as_bytes());
            }
            Self::Guid(guid) => {
                buf.push(TAG_GUID);
                buf.extend_from_slice(guid.as_bytes());
            }
            Self::Array(items) => {
                buf.push(TAG_ARRAY);
                write_len(buf, items.len());
                for item in items {
                    item.write_canonical(buf);
                }
            }
            Self::Map(map) => {
                buf.push(TAG_MAP);
                write_canonical_entries(buf, map.sorted());
            }
        }
    }

    /// The canonical encoding as a fresh buffer.
    #[must_use]
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_canonical(&mut buf);
        buf
    }
}

/// Append a length-prefixed, key-sorted entry list.
///
/// Callers must pass entries already sorted by key.
pub(crate) fn write_canonical_entries<'a>(
    buf: &mut Vec<u8>,
    entries: impl IntoIterator<Item = (&'a str, &'a Value), IntoIter: ExactSizeIterator>,
) {
    let entries = entries.into_iter();
    write_len(buf, entries.len());
    for (key, value) in entries {
        write_bytes(buf, key.as_bytes());
        value.write_canonical(buf);
    }
}

pub(crate) fn write_len(buf: &mut Vec<u8>, len: usize) {
    buf.extend_from_slice(&(len as u64).to_be_bytes());
}

pub(crate) fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_len(buf, bytes.len());
    buf.extend_from_slice(bytes);
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Date(instant) => write!(f, "{instant}"),
            Self::Binary(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            Self::Hash(hash) => write!(f, "{hash}"),
            Self::Guid(guid) => write!(f, "{guid}"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Hash> for Value {
    fn from(hash: Hash) -> Self {
        Self::Hash(hash)
    }
}

impl From<Uuid> for Value {
    fn from(guid: Uuid) -> Self {
        Self::Guid(guid)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Self::Map(map)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample_values() -> Vec<Value> {
        vec![
            Value::Null,
            Value::Boolean(true),
            Value::Integer(-7),
            Value::decimal("3.14159265358979323846264338327950288").unwrap(),
            Value::from("text"),
            Value::date_millis(1_700_000_000_123).unwrap(),
            Value::Binary(vec![0, 1, 2, 255]),
            Value::Hash(Hash::digest(b"blob")),
            Value::Guid(Uuid::from_u128(0x1234_5678_9abc_def0_1234_5678_9abc_def0)),
            Value::Array(vec![Value::Integer(1), Value::from("two")]),
            Value::Map([("k", Value::Integer(1))].into_iter().collect()),
        ]
    }

    #[test]
    fn decimal_accepts_valid_literals() {
        for text in ["0", "-1", "12.50", "1e10", "-3.2E-4", "6.02e+23"] {
            assert_eq!(Decimal::parse(text).unwrap().as_str(), text);
        }
    }

    #[test]
    fn decimal_rejects_garbage() {
        for text in ["", "-", "1.", ".5", "1e", "abc", "1.2.3", "+1", "1 "] {
            assert!(Decimal::parse(text).is_err(), "{text:?} should be rejected");
        }
    }

    #[test]
    fn decimal_keeps_exact_text() {
        let a = Decimal::parse("1.50").unwrap();
        let b = Decimal::parse("1.5").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "1.50");
    }

    #[test]
    fn tags_distinguish_equal_payloads() {
        assert_ne!(Value::Integer(1), Value::decimal("1").unwrap());
        assert_ne!(Value::from("1"), Value::decimal("1").unwrap());
        assert_ne!(
            Value::Binary(Hash::ZERO.as_bytes().to_vec()),
            Value::Hash(Hash::ZERO)
        );
        assert_ne!(
            Value::Integer(1).to_canonical_bytes(),
            Value::Boolean(true).to_canonical_bytes()
        );
    }

    #[test]
    fn map_equality_ignores_insertion_order() {
        let a: ValueMap = [("x", 1), ("y", 2)].into_iter().collect();
        let b: ValueMap = [("y", 2), ("x", 1)].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(
            Value::Map(a.clone()).to_canonical_bytes(),
            Value::Map(b.clone()).to_canonical_bytes()
        );

        let mut set = HashSet::new();
        set.insert(Value::Map(a));
        assert!(set.contains(&Value::Map(b)));
    }

    #[test]
    fn map_preserves_insertion_order_and_replaces_in_place() {
        let mut map = ValueMap::new();
        map.insert("b", 1);
        map.insert("a", 2);
        assert_eq!(map.insert("b", 3), Some(Value::Integer(1)));
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(map.get("b"), Some(&Value::Integer(3)));
        assert_eq!(map.remove("b"), Some(Value::Integer(3)));
        assert!(!map.contains_key("b"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn canonical_encoding_is_injective_over_samples() {
        let values = sample_values();
        let encodings: HashSet<Vec<u8>> = values.iter().map(Value::to_canonical_bytes).collect();
        assert_eq!(encodings.len(), values.len());
    }

    #[test]
    fn nested_strings_do_not_collide() {
        let a = Value::Array(vec![Value::from("ab"), Value::from("c")]);
        let b = Value::Array(vec![Value::from("a"), Value::from("bc")]);
        assert_ne!(a.to_canonical_bytes(), b.to_canonical_bytes());
    }

    #[test]
    fn json_round_trip_preserves_every_variant() {
        for value in sample_values() {
            let json = serde_json::to_string(&value).unwrap();
            let back: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(back, value, "round trip of {json}");
        }
    }

    #[test]
    fn json_shape_is_adjacently_tagged() {
        let json = serde_json::to_value(Value::Integer(42)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "integer", "value": 42}));
        let json = serde_json::to_value(Value::Binary(vec![0xab, 0xcd])).unwrap();
        assert_eq!(json, serde_json::json!({"type": "binary", "value": "abcd"}));
    }

    #[test]
    fn json_rejects_duplicate_map_keys() {
        let json = r#"{"type":"map","value":{"a":{"type":"null"},"a":{"type":"null"}}}"#;
        assert!(serde_json::from_str::<Value>(json).is_err());
    }

    #[test]
    fn date_truncates_to_millis() {
        let instant = DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        let value = Value::date(instant);
        assert_eq!(value, Value::date_millis(1_700_000_000_123).unwrap());
    }

    #[test]
    fn sub_millisecond_dates_are_indistinguishable() {
        let fine = Value::Date(Timestamp::from(
            DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap(),
        ));
        let coarse = Value::date_millis(1_700_000_000_123).unwrap();
        assert_eq!(fine, coarse);
        assert_eq!(fine.to_canonical_bytes(), coarse.to_canonical_bytes());

        let json = serde_json::to_string(&fine).unwrap();
        assert_eq!(json, r#"{"type":"date","value":1700000000123}"#);
        assert_eq!(serde_json::from_str::<Value>(&json).unwrap(), fine);
    }

    #[test]
    fn json_rejects_out_of_range_date() {
        let json = format!(r#"{{"type":"date","value":{}}}"#, i64::MAX);
        assert!(serde_json::from_str::<Value>(&json).is_err());
    }

    #[test]
    fn type_names_match_json_tags() {
        for value in sample_values() {
            let json = serde_json::to_value(&value).unwrap();
            assert_eq!(json["type"], value.type_name());
        }
    }
}

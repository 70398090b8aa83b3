//! Firestore REST value encoding.
//!
//! Firestore wraps every value in a single-key object naming its type:
//!
//! ```text
//! "hello"          <-> { "stringValue": "hello" }
//! 42               <-> { "integerValue": "42" }
//! ["a"]            <-> { "arrayValue": { "values": [ { "stringValue": "a" } ] } }
//! { "k": true }    <-> { "mapValue": { "fields": { "k": { "booleanValue": true } } } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FirestoreValue {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(GeoPoint),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<FirestoreValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, FirestoreValue>,
}

impl From<&Value> for FirestoreValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => FirestoreValue::NullValue(()),
            Value::Bool(b) => FirestoreValue::BooleanValue(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FirestoreValue::IntegerValue(i.to_string()),
                None => FirestoreValue::DoubleValue(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FirestoreValue::StringValue(s.clone()),
            Value::Array(items) => FirestoreValue::ArrayValue(ArrayValue {
                values: items.iter().map(FirestoreValue::from).collect(),
            }),
            Value::Object(map) => FirestoreValue::MapValue(MapValue {
                fields: encode_fields(map),
            }),
        }
    }
}

impl FirestoreValue {
    /// Decode into plain JSON.
    pub fn to_json(&self) -> Result<Value> {
        Ok(match self {
            FirestoreValue::NullValue(()) => Value::Null,
            FirestoreValue::BooleanValue(b) => Value::Bool(*b),
            FirestoreValue::IntegerValue(s) => {
                let i: i64 = s
                    .parse()
                    .map_err(|_| Error::Decode(format!("invalid integerValue '{}'", s)))?;
                Value::Number(i.into())
            }
            // NaN and infinities have no JSON form.
            FirestoreValue::DoubleValue(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            FirestoreValue::TimestampValue(s)
            | FirestoreValue::StringValue(s)
            | FirestoreValue::BytesValue(s)
            | FirestoreValue::ReferenceValue(s) => Value::String(s.clone()),
            FirestoreValue::GeoPointValue(point) => {
                let mut map = Map::new();
                map.insert("latitude".to_string(), json_f64(point.latitude));
                map.insert("longitude".to_string(), json_f64(point.longitude));
                Value::Object(map)
            }
            FirestoreValue::ArrayValue(array) => Value::Array(
                array
                    .values
                    .iter()
                    .map(FirestoreValue::to_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            FirestoreValue::MapValue(map) => Value::Object(decode_fields(&map.fields)?),
        })
    }
}

fn json_f64(f: f64) -> Value {
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}

/// Encode a JSON object as a Firestore `fields` map.
pub fn encode_fields(map: &Map<String, Value>) -> BTreeMap<String, FirestoreValue> {
    map.iter()
        .map(|(k, v)| (k.clone(), FirestoreValue::from(v)))
        .collect()
}

/// Decode a Firestore `fields` map into a JSON object.
pub fn decode_fields(fields: &BTreeMap<String, FirestoreValue>) -> Result<Map<String, Value>> {
    fields
        .iter()
        .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
        .collect()
}

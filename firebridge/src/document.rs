//! Document model shared by the exporter and the importer.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Fields written by the importer, in write order. `id` is never written:
/// it is only the destination key.
pub const PAYLOAD_FIELDS: [&str; 5] = ["name", "description", "keywords", "notes", "steps"];

/// A document as held by the remote store: its key plus every stored field.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl RemoteDocument {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// One `documents` entry read back from an export envelope.
///
/// Payload values are kept as raw JSON so anything the exporter wrote
/// (nulls, nested arrays, numbers in `steps`) replays unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Validate one raw `documents` entry. Unknown fields are ignored; every
    /// payload field must be present but may hold any JSON value.
    ///
    /// `position` is only used to name entries that carry no usable `id`.
    pub fn from_entry(entry: &Value, position: usize) -> Result<Self> {
        let map = match entry {
            Value::Object(map) => map,
            _ => return Err(Error::document(entry_label(position), "entry is not an object")),
        };

        let id = match map.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::String(_)) => {
                return Err(Error::document(entry_label(position), "empty `id`"))
            }
            Some(_) => return Err(Error::document(entry_label(position), "`id` is not a string")),
            None => return Err(Error::document(entry_label(position), "missing field `id`")),
        };

        if id.contains('/') {
            return Err(Error::document(id, "`id` must not contain '/'"));
        }

        let mut fields = Map::new();
        for name in PAYLOAD_FIELDS {
            match map.get(name) {
                Some(value) => {
                    fields.insert(name.to_string(), value.clone());
                }
                None => return Err(Error::document(id, format!("missing field `{}`", name))),
            }
        }

        Ok(Self { id, fields })
    }

    /// Display name for logs. Empty when `name` is not a string.
    pub fn name(&self) -> &str {
        self.fields
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// The merge-write payload: exactly the five payload fields.
    pub fn payload(&self) -> Map<String, Value> {
        self.fields.clone()
    }
}

fn entry_label(position: usize) -> String {
    format!("<entry {}>", position)
}

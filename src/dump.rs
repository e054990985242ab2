//! Typed values back to JSON.
//!
//! Records are emitted in their schema's declared field order so output is
//! byte-stable regardless of how a record was assembled.
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value as Json};

use crate::error::{ErrorKind, StructuringError};
use crate::ir::SchemaSet;
use crate::value::{Record, Value};

const INDENT: &[u8] = b"  ";

/// Converts a typed value to its JSON shape.
///
/// Map keys are rendered as strings, so two keys with the same text (`1` and
/// `"1"`) cannot both be kept; that is an [`ErrorKind::Encode`] error.
pub fn to_json(value: &Value, schemas: &SchemaSet) -> Result<Json, StructuringError> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => Json::from(f.0),
        Value::String(s) => Json::String(s.clone()),
        Value::Enum(e) => Json::String(e.tag.clone()),
        Value::Record(record) => record_to_json(record, schemas)?,
        Value::Seq(items) => Json::Array(
            items
                .iter()
                .map(|item| to_json(item, schemas))
                .collect::<Result<_, _>>()?,
        ),
        Value::Map(entries) => {
            let mut object = Map::with_capacity(entries.len());
            for (key, item) in entries {
                let key = key_string(key, schemas)?;
                if object.contains_key(&key) {
                    return Err(ErrorKind::Encode(format!("map key {key:?} occurs more than once")).into());
                }
                object.insert(key, to_json(item, schemas)?);
            }
            Json::Object(object)
        }
        Value::Json(json) => json.clone(),
    })
}

pub fn record_to_json(record: &Record, schemas: &SchemaSet) -> Result<Json, StructuringError> {
    let mut object = Map::new();
    match schemas.record(record.name()) {
        Some(schema) => {
            for field in &schema.fields {
                if let Some(value) = record.get(&field.name) {
                    object.insert(field.name.clone(), to_json(value, schemas)?);
                }
            }
            for (name, value) in record.fields() {
                if schema.get_field(name).is_none() {
                    object.insert(name.to_string(), to_json(value, schemas)?);
                }
            }
        }
        None => {
            for (name, value) in record.fields() {
                object.insert(name.to_string(), to_json(value, schemas)?);
            }
        }
    }
    Ok(Json::Object(object))
}

/// Pretty-prints with a fixed two-space indent.
pub fn to_pretty_string(json: &Json) -> Result<String, StructuringError> {
    let mut out = Vec::new();
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
    json.serialize(&mut ser).map_err(|err| ErrorKind::Encode(err.to_string()))?;
    String::from_utf8(out).map_err(|err| ErrorKind::Encode(err.to_string()).into())
}

/// Dumps a record as pretty JSON text.
pub fn dump_record(record: &Record, schemas: &SchemaSet) -> Result<String, StructuringError> {
    to_pretty_string(&record_to_json(record, schemas)?)
}

/// JSON object keys must be strings; scalar keys use their JSON text.
fn key_string(key: &Value, schemas: &SchemaSet) -> Result<String, StructuringError> {
    Ok(match key {
        Value::String(s) => s.clone(),
        Value::Enum(e) => e.tag.clone(),
        Value::Json(Json::String(s)) => s.clone(),
        other => to_json(other, schemas)?.to_string(),
    })
}

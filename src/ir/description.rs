//! Schema description documents.
//!
//! ```json
//! {
//!   "enums":   { "RiskLevel": ["low", "medium", "high", "critical"] },
//!   "records": { "Policy": { "fields": [
//!       { "name": "risk_level", "type": "RiskLevel" },
//!       { "name": "note", "type": "Optional[str]", "default": null }
//!   ] } }
//! }
//! ```
//!
//! A `default` key, even one holding `null`, makes the field optional.
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value as Json;

use super::type_expr::{is_builtin_name, parse_type_expr};
use super::{EnumSchema, FieldDescriptor, NameKind, RecordSchema, SchemaSet};
use crate::error::SchemaError;
use crate::path_de::{self, PathError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDocument {
    #[serde(default)]
    enums: IndexMap<String, Vec<String>>,
    #[serde(default)]
    records: IndexMap<String, RecordDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordDocument {
    fields: Vec<FieldDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDocument {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default, deserialize_with = "present")]
    default: Option<Json>,
}

/// Distinguishes `"default": null` (present) from an absent key.
fn present<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Json>, D::Error> {
    Json::deserialize(de).map(Some)
}

impl SchemaSet {
    /// Loads and checks a schema description document.
    pub fn from_description_str(src: &str) -> Result<Self, SchemaError> {
        path_de::from_str_with_path::<SchemaDocument>(src)
            .map_err(description_error)
            .and_then(build)
    }

    pub fn from_description_slice(bytes: &[u8]) -> Result<Self, SchemaError> {
        path_de::from_slice_with_path::<SchemaDocument>(bytes)
            .map_err(description_error)
            .and_then(build)
    }
}

fn description_error(err: PathError) -> SchemaError {
    SchemaError::Description { path: err.path, message: err.message }
}

fn build(document: SchemaDocument) -> Result<SchemaSet, SchemaError> {
    // a declared `Sequence` or `int` could never be referred to
    if let Some(name) = document
        .enums
        .keys()
        .chain(document.records.keys())
        .find(|name| is_builtin_name(name))
    {
        return Err(SchemaError::ReservedName(name.clone()));
    }

    // every name is known before any field type is parsed, so records may
    // refer to each other regardless of declaration order
    let resolve = |name: &str| {
        if document.records.contains_key(name) {
            Some(NameKind::Record)
        } else if document.enums.contains_key(name) {
            Some(NameKind::Enum)
        } else {
            None
        }
    };

    let mut schemas = SchemaSet::new();
    for (name, tags) in &document.enums {
        schemas.add_enum(EnumSchema::new(name.clone(), tags.iter().cloned()))?;
    }
    for (name, record) in &document.records {
        let mut schema = RecordSchema::new(name.clone());
        for field in &record.fields {
            let ty = parse_type_expr(&field.ty, &resolve)?;
            schema.fields.push(FieldDescriptor {
                name: field.name.clone(),
                ty,
                default: field.default.clone(),
            });
        }
        schemas.add_record(schema)?;
    }
    schemas.checked()
}

//! Type-directed structuring: untyped JSON in, typed [`Value`]s out.
//!
//! The walk is top-down and fails fast. Every step either returns a fully
//! structured value or the first error it met, located by the path of the
//! node that caused it. No state survives a call.
use ordered_float::OrderedFloat;
use serde_json::{Map, Value as Json};
use tracing::trace;

use crate::error::{ErrorKind, Segment, StructuringError, json_kind};
use crate::ir::{PrimitiveKind, SchemaSet, TypeExpr};
use crate::value::{EnumValue, Record, Value};

// ------------------------------- Policy ---------------------------------- //

const DEFAULT_MAX_DEPTH: usize = 128;

/// Tunables for a structuring walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructureOptions {
    /// Deepest record/sequence/mapping nesting accepted before giving up with
    /// [`ErrorKind::DepthLimitExceeded`].
    pub max_depth: usize,
}

impl Default for StructureOptions {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

// ------------------------------- Walker ---------------------------------- //

/// Borrowed view of a schema set plus options; cheap to build per call.
#[derive(Debug, Clone, Copy)]
pub struct Structurizer<'s> {
    schemas: &'s SchemaSet,
    options: StructureOptions,
}

impl<'s> Structurizer<'s> {
    pub fn new(schemas: &'s SchemaSet, options: StructureOptions) -> Self {
        Self { schemas, options }
    }

    /// Structures `json` as an instance of the record named `name`.
    pub fn record(&self, name: &str, json: &Json) -> Result<Record, StructuringError> {
        self.record_at(name, json, 0)
    }

    /// Structures `json` against an arbitrary type expression.
    pub fn value(&self, json: &Json, ty: &TypeExpr) -> Result<Value, StructuringError> {
        self.value_at(json, ty, 0)
    }

    fn value_at(&self, json: &Json, ty: &TypeExpr, depth: usize) -> Result<Value, StructuringError> {
        if depth > self.options.max_depth {
            return Err(ErrorKind::DepthLimitExceeded(self.options.max_depth).into());
        }
        match ty {
            TypeExpr::Any => Ok(Value::Json(json.clone())),
            TypeExpr::Null => match json {
                Json::Null => Ok(Value::Null),
                other => Err(type_mismatch("None", other)),
            },
            TypeExpr::Optional(inner) => self.union_at(json, &[inner.as_ref(), &TypeExpr::Null], depth),
            TypeExpr::Union(alternatives) => {
                let alternatives = alternatives.iter().collect::<Vec<_>>();
                self.union_at(json, &alternatives, depth)
            }
            TypeExpr::EnumRef(name) => self.enum_value(json, name),
            TypeExpr::RecordRef(name) => self.record_at(name, json, depth).map(Value::Record),
            TypeExpr::Sequence(element) => self.sequence_at(json, element.as_deref(), depth),
            TypeExpr::Mapping(params) => self.mapping_at(json, params.as_deref(), depth),
            TypeExpr::Primitive(kind) => primitive(json, *kind),
        }
    }

    /// First alternative that structures the value wins. `null` short-circuits
    /// to `Null` when the union admits the none type.
    fn union_at(&self, json: &Json, alternatives: &[&TypeExpr], depth: usize) -> Result<Value, StructuringError> {
        let admits_null = alternatives.iter().any(|alt| matches!(alt, TypeExpr::Null));
        if json.is_null() && admits_null {
            return Ok(Value::Null);
        }
        let mut rejected = Vec::with_capacity(alternatives.len());
        for alternative in alternatives {
            // `null` was handled above, so the none type can only reject here
            if matches!(alternative, TypeExpr::Null) {
                rejected.push(type_mismatch("None", json));
                continue;
            }
            match self.value_at(json, alternative, depth) {
                Ok(value) => return Ok(value),
                Err(err) if err.kind().is_mismatch() => {
                    trace!(alternative = %alternative, error = %err, "union alternative rejected");
                    rejected.push(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(ErrorKind::UnionMismatch {
            value: json.clone(),
            attempted: alternatives.iter().map(|alt| alt.to_string()).collect(),
            rejected,
        }
        .into())
    }

    fn enum_value(&self, json: &Json, name: &str) -> Result<Value, StructuringError> {
        let schema = self
            .schemas
            .enumeration(name)
            .ok_or_else(|| ErrorKind::UnknownSchema(name.to_string()))?;
        match json {
            Json::String(tag) if schema.contains(tag) => Ok(Value::Enum(EnumValue::new(name, tag.as_str()))),
            other => Err(ErrorKind::InvalidEnumValue {
                value: other.clone(),
                enum_name: name.to_string(),
                permitted: schema.tags.clone(),
            }
            .into()),
        }
    }

    fn record_at(&self, name: &str, json: &Json, depth: usize) -> Result<Record, StructuringError> {
        let schema = self
            .schemas
            .record(name)
            .ok_or_else(|| ErrorKind::UnknownSchema(name.to_string()))?;
        let object = expect_object(json)?;

        let mut record = Record::new(name);
        for field in &schema.fields {
            // keys the schema does not declare are never looked at
            let source = match (object.get(&field.name), &field.default) {
                (Some(present), _) => present,
                (None, Some(default)) => default,
                (None, None) => return Err(ErrorKind::MissingRequiredField(field.name.clone()).into()),
            };
            let value = self
                .value_at(source, &field.ty, depth + 1)
                .map_err(|err| err.within(Segment::Field(field.name.clone())))?;
            record.insert(field.name.clone(), value);
        }
        Ok(record)
    }

    fn sequence_at(&self, json: &Json, element: Option<&TypeExpr>, depth: usize) -> Result<Value, StructuringError> {
        let Json::Array(items) = json else {
            return Err(ErrorKind::ExpectedArray { actual: json_kind(json) }.into());
        };
        let Some(element) = element else {
            return Ok(Value::Json(json.clone()));
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.value_at(item, element, depth + 1)
                    .map_err(|err| err.within(Segment::Index(index)))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Seq)
    }

    fn mapping_at(
        &self,
        json: &Json,
        params: Option<&(TypeExpr, TypeExpr)>,
        depth: usize,
    ) -> Result<Value, StructuringError> {
        let object = expect_object(json)?;
        let Some((key_ty, value_ty)) = params else {
            return Ok(Value::Json(json.clone()));
        };
        let mut entries = Vec::with_capacity(object.len());
        for (key, item) in object {
            let within = |err: StructuringError| err.within(Segment::Key(key.clone()));
            let key_value = self
                .value_at(&Json::String(key.clone()), key_ty, depth + 1)
                .map_err(within)?;
            let item_value = self.value_at(item, value_ty, depth + 1).map_err(within)?;
            entries.push((key_value, item_value));
        }
        Ok(Value::Map(entries))
    }
}

// ------------------------------- Leaves ---------------------------------- //

fn primitive(json: &Json, kind: PrimitiveKind) -> Result<Value, StructuringError> {
    let value = match (kind, json) {
        (PrimitiveKind::Bool, Json::Bool(b)) => Some(Value::Bool(*b)),
        // floats and integers outside i64 both fall through to a mismatch
        (PrimitiveKind::Int, Json::Number(n)) => n.as_i64().map(Value::Int),
        // the one permitted coercion: integers widen to float
        (PrimitiveKind::Float, Json::Number(n)) => n.as_f64().map(|f| Value::Float(OrderedFloat(f))),
        (PrimitiveKind::String, Json::String(s)) => Some(Value::String(s.clone())),
        _ => None,
    };
    value.ok_or_else(|| type_mismatch(kind.name(), json))
}

fn expect_object(json: &Json) -> Result<&Map<String, Json>, StructuringError> {
    match json {
        Json::Object(object) => Ok(object),
        other => Err(ErrorKind::ExpectedObject { actual: json_kind(other) }.into()),
    }
}

fn type_mismatch(expected: &str, actual: &Json) -> StructuringError {
    ErrorKind::TypeMismatch { expected: expected.to_string(), actual: actual.clone() }.into()
}

// ------------------------------- Tests ------------------------------------ //

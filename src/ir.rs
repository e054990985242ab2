//! Schema description IR: record and enum shapes the structuring engine walks.
//!
//! A `SchemaSet` is assembled once (in code, or from a description document
//! via [`description`]), checked, and then only read. Nothing in here knows
//! how the description was produced.
pub mod description;
pub mod type_expr;

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value as Json;
use tracing::debug;

use crate::error::SchemaError;
use crate::structure::{StructureOptions, Structurizer};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Int,
    Float,
    String,
}

/// Declared type of a field, sequence element or mapping key/value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// opaque passthrough, never validated
    Any,
    /// the none type; only meaningful as a union member
    Null,
    Primitive(PrimitiveKind),
    EnumRef(String),
    RecordRef(String),
    /// `None` when the element type is unknown (bare `list`)
    Sequence(Option<Box<TypeExpr>>),
    /// `None` when key/value types are unknown (bare `dict`)
    Mapping(Option<Box<(TypeExpr, TypeExpr)>>),
    /// same as `Union[inner, None]`
    Optional(Box<TypeExpr>),
    /// alternatives in declared order; the first that fits wins
    Union(Vec<TypeExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: TypeExpr,
    /// JSON rendering of the declared default; `None` means required
    pub default: Option<Json>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<FieldDescriptor>, // declared order, also the dump order
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSchema {
    pub name: String,
    pub tags: Vec<String>,
}

/// Registry of every record and enum a structuring call may reach.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaSet {
    records: IndexMap<String, RecordSchema>,
    enums: IndexMap<String, EnumSchema>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Record,
    Enum,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl PrimitiveKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "str",
        }
    }
}

impl TypeExpr {
    pub fn bool() -> Self { Self::Primitive(PrimitiveKind::Bool) }
    pub fn int() -> Self { Self::Primitive(PrimitiveKind::Int) }
    pub fn float() -> Self { Self::Primitive(PrimitiveKind::Float) }
    pub fn string() -> Self { Self::Primitive(PrimitiveKind::String) }

    pub fn enum_ref(name: impl Into<String>) -> Self {
        Self::EnumRef(name.into())
    }

    pub fn record(name: impl Into<String>) -> Self {
        Self::RecordRef(name.into())
    }

    pub fn list_of(element: TypeExpr) -> Self {
        Self::Sequence(Some(Box::new(element)))
    }

    pub fn dict_of(key: TypeExpr, value: TypeExpr) -> Self {
        Self::Mapping(Some(Box::new((key, value))))
    }

    pub fn optional(inner: TypeExpr) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn union(alternatives: impl IntoIterator<Item = TypeExpr>) -> Self {
        Self::Union(alternatives.into_iter().collect())
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Null => f.write_str("None"),
            Self::Primitive(kind) => f.write_str(kind.name()),
            Self::EnumRef(name) | Self::RecordRef(name) => f.write_str(name),
            Self::Sequence(None) => f.write_str("list"),
            Self::Sequence(Some(element)) => write!(f, "list[{element}]"),
            Self::Mapping(None) => f.write_str("dict"),
            Self::Mapping(Some(params)) => write!(f, "dict[{}, {}]", params.0, params.1),
            Self::Optional(inner) => write!(f, "Optional[{inner}]"),
            Self::Union(alternatives) => {
                f.write_str("Union[")?;
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{alternative}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl FieldDescriptor {
    pub fn required(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self { name: name.into(), ty, default: None }
    }

    pub fn with_default(name: impl Into<String>, ty: TypeExpr, default: Json) -> Self {
        Self { name: name.into(), ty, default: Some(default) }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

impl RecordSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }

    /// Appends a required field.
    pub fn field(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.fields.push(FieldDescriptor::required(name, ty));
        self
    }

    /// Appends an optional field that falls back to `default` when absent.
    pub fn field_with_default(mut self, name: impl Into<String>, ty: TypeExpr, default: Json) -> Self {
        self.fields.push(FieldDescriptor::with_default(name, ty, default));
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl EnumSchema {
    pub fn new<I>(name: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            name: name.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_enum(&mut self, schema: EnumSchema) -> Result<(), SchemaError> {
        self.ensure_unused(&schema.name)?;
        for (i, tag) in schema.tags.iter().enumerate() {
            if schema.tags[..i].contains(tag) {
                return Err(SchemaError::DuplicateTag {
                    enumeration: schema.name.clone(),
                    tag: tag.clone(),
                });
            }
        }
        self.enums.insert(schema.name.clone(), schema);
        Ok(())
    }

    pub fn add_record(&mut self, schema: RecordSchema) -> Result<(), SchemaError> {
        self.ensure_unused(&schema.name)?;
        for (i, field) in schema.fields.iter().enumerate() {
            if schema.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    record: schema.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        self.records.insert(schema.name.clone(), schema);
        Ok(())
    }

    pub fn with_enum(mut self, schema: EnumSchema) -> Result<Self, SchemaError> {
        self.add_enum(schema)?;
        Ok(self)
    }

    pub fn with_record(mut self, schema: RecordSchema) -> Result<Self, SchemaError> {
        self.add_record(schema)?;
        Ok(self)
    }

    pub fn record(&self, name: &str) -> Option<&RecordSchema> {
        self.records.get(name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumSchema> {
        self.enums.get(name)
    }

    pub fn records(&self) -> impl Iterator<Item = &RecordSchema> {
        self.records.values()
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumSchema> {
        self.enums.values()
    }

    pub fn kind_of(&self, name: &str) -> Option<NameKind> {
        if self.records.contains_key(name) {
            Some(NameKind::Record)
        } else if self.enums.contains_key(name) {
            Some(NameKind::Enum)
        } else {
            None
        }
    }

    /// Verifies that every reference resolves to a schema of the right kind and
    /// that every declared default structures against its field type.
    pub fn check(&self) -> Result<(), SchemaError> {
        for record in self.records.values() {
            for field in &record.fields {
                if let Some(name) = first_unresolved(&field.ty, self) {
                    return Err(SchemaError::UnresolvedReference {
                        record: record.name.clone(),
                        field: field.name.clone(),
                        name,
                    });
                }
            }
        }

        let structurizer = Structurizer::new(self, StructureOptions::default());
        for record in self.records.values() {
            for field in &record.fields {
                let Some(default) = &field.default else { continue };
                structurizer.value(default, &field.ty).map_err(|source| SchemaError::InvalidDefault {
                    record: record.name.clone(),
                    field: field.name.clone(),
                    source,
                })?;
            }
        }

        debug!(records = self.records.len(), enums = self.enums.len(), "schema set checked");
        Ok(())
    }

    /// [`Self::check`], by value.
    pub fn checked(self) -> Result<Self, SchemaError> {
        self.check()?;
        Ok(self)
    }

    fn ensure_unused(&self, name: &str) -> Result<(), SchemaError> {
        if self.kind_of(name).is_some() {
            return Err(SchemaError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// First enum/record name in `ty` that is missing or names the other kind.
fn first_unresolved(ty: &TypeExpr, schemas: &SchemaSet) -> Option<String> {
    match ty {
        TypeExpr::Any | TypeExpr::Null | TypeExpr::Primitive(_) => None,
        TypeExpr::EnumRef(name) => (schemas.kind_of(name) != Some(NameKind::Enum)).then(|| name.clone()),
        TypeExpr::RecordRef(name) => (schemas.kind_of(name) != Some(NameKind::Record)).then(|| name.clone()),
        TypeExpr::Sequence(element) => element.as_deref().and_then(|element| first_unresolved(element, schemas)),
        TypeExpr::Mapping(params) => params
            .as_deref()
            .and_then(|(key, value)| first_unresolved(key, schemas).or_else(|| first_unresolved(value, schemas))),
        TypeExpr::Optional(inner) => first_unresolved(inner, schemas),
        TypeExpr::Union(alternatives) => alternatives.iter().find_map(|alt| first_unresolved(alt, schemas)),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn levels() -> EnumSchema {
        EnumSchema::new("Level", ["low", "high"])
    }

    #[test]
    fn duplicate_field_names_are_rejected() {
        let record = RecordSchema::new("Job")
            .field("name", TypeExpr::string())
            .field("name", TypeExpr::int());
        let err = SchemaSet::new().with_record(record).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { ref field, .. } if field == "name"));
    }

    #[test]
    fn duplicate_enum_tags_are_rejected() {
        let err = SchemaSet::new()
            .with_enum(EnumSchema::new("Level", ["low", "low"]))
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateTag { ref tag, .. } if tag == "low"));
    }

    #[test]
    fn record_and_enum_names_share_one_namespace() {
        let err = SchemaSet::new()
            .with_enum(levels())
            .unwrap()
            .with_record(RecordSchema::new("Level"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateName(ref name) if name == "Level"));
    }

    #[test]
    fn check_finds_unresolved_and_miskinded_references() {
        let missing = SchemaSet::new()
            .with_record(RecordSchema::new("Job").field("tags", TypeExpr::list_of(TypeExpr::enum_ref("Tag"))))
            .unwrap();
        assert!(matches!(
            missing.check(),
            Err(SchemaError::UnresolvedReference { ref name, .. }) if name == "Tag"
        ));

        let wrong_kind = SchemaSet::new()
            .with_enum(levels())
            .unwrap()
            .with_record(RecordSchema::new("Job").field("level", TypeExpr::optional(TypeExpr::record("Level"))))
            .unwrap();
        assert!(matches!(
            wrong_kind.check(),
            Err(SchemaError::UnresolvedReference { ref field, .. }) if field == "level"
        ));
    }

    #[test]
    fn check_structures_defaults() {
        let good = SchemaSet::new()
            .with_enum(levels())
            .unwrap()
            .with_record(
                RecordSchema::new("Job")
                    .field_with_default("level", TypeExpr::enum_ref("Level"), json!("low"))
                    .field_with_default("note", TypeExpr::optional(TypeExpr::string()), json!(null)),
            )
            .unwrap();
        assert!(good.check().is_ok());

        let bad = SchemaSet::new()
            .with_enum(levels())
            .unwrap()
            .with_record(RecordSchema::new("Job").field_with_default("level", TypeExpr::enum_ref("Level"), json!("LOW")))
            .unwrap();
        assert!(matches!(bad.check(), Err(SchemaError::InvalidDefault { ref field, .. }) if field == "level"));
    }

    #[test]
    fn required_flag_follows_default() {
        let record = RecordSchema::new("Job")
            .field("name", TypeExpr::string())
            .field_with_default("retries", TypeExpr::int(), json!(0));
        assert!(record.get_field("name").unwrap().is_required());
        assert!(!record.get_field("retries").unwrap().is_required());
    }

    #[test]
    fn type_expressions_display_in_annotation_syntax() {
        let ty = TypeExpr::union([
            TypeExpr::dict_of(TypeExpr::string(), TypeExpr::Any),
            TypeExpr::list_of(TypeExpr::optional(TypeExpr::enum_ref("Level"))),
            TypeExpr::Sequence(None),
            TypeExpr::Null,
        ]);
        assert_eq!(ty.to_string(), "Union[dict[str, Any], list[Optional[Level]], list, None]");
    }
}

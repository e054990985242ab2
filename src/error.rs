//! Structuring and schema errors.
use std::fmt;

use serde_json::Value as Json;

// ————————————————————————————————————————————————————————————————————————————
// FIELD PATHS
// ————————————————————————————————————————————————————————————————————————————

/// One step from a parent node to a child node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// a record field
    Field(String),
    /// a sequence element
    Index(usize),
    /// a mapping entry, by its JSON key
    Key(String),
}

/// Location of a node inside the input document, rendered as
/// `policy.risk_level`, `items[2].name` or `arguments["city"]`. The document
/// root renders as `.`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Errors are located while unwinding, so segments are added outermost-last.
    fn prepend(&mut self, segment: Segment) {
        self.segments.insert(0, segment);
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str(".");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => f.write_str(name)?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Key(key) => write!(f, "[{key:?}]")?,
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// STRUCTURING ERRORS
// ————————————————————————————————————————————————————————————————————————————

/// Why structuring stopped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("malformed JSON: {0}")]
    MalformedJson(String),
    #[error("expected object, found {actual}")]
    ExpectedObject { actual: &'static str },
    #[error("expected array, found {actual}")]
    ExpectedArray { actual: &'static str },
    #[error("missing required field `{0}`")]
    MissingRequiredField(String),
    #[error("{} is not a valid {enum_name} (expected one of: {})", describe(.value), .permitted.join(", "))]
    InvalidEnumValue {
        value: Json,
        enum_name: String,
        permitted: Vec<String>,
    },
    #[error("{} matches none of: {}", describe(.value), .attempted.join(", "))]
    UnionMismatch {
        value: Json,
        attempted: Vec<String>,
        /// why each alternative rejected the value, parallel to `attempted`
        rejected: Vec<StructuringError>,
    },
    #[error("expected {expected}, found {}", describe(.actual))]
    TypeMismatch { expected: String, actual: Json },
    #[error("no record or enum named `{0}` in the schema set")]
    UnknownSchema(String),
    #[error("input nests deeper than {0} levels")]
    DepthLimitExceeded(usize),
    #[error("failed to encode JSON: {0}")]
    Encode(String),
}

impl ErrorKind {
    /// Stable snake_case identifier, used by conformance fixtures.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedJson(_) => "malformed_json",
            Self::ExpectedObject { .. } => "expected_object",
            Self::ExpectedArray { .. } => "expected_array",
            Self::MissingRequiredField(_) => "missing_required_field",
            Self::InvalidEnumValue { .. } => "invalid_enum_value",
            Self::UnionMismatch { .. } => "union_mismatch",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::UnknownSchema(_) => "unknown_schema",
            Self::DepthLimitExceeded(_) => "depth_limit_exceeded",
            Self::Encode(_) => "encode",
        }
    }

    /// True when the input value itself is at fault. Union resolution only
    /// moves on to the next alternative for these.
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            Self::ExpectedObject { .. }
                | Self::ExpectedArray { .. }
                | Self::MissingRequiredField(_)
                | Self::InvalidEnumValue { .. }
                | Self::UnionMismatch { .. }
                | Self::TypeMismatch { .. }
        )
    }
}

/// A failed `parse` or `dump`: what went wrong and where.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} (at {path})")]
pub struct StructuringError {
    kind: ErrorKind,
    path: FieldPath,
}

impl StructuringError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, path: FieldPath::root() }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    pub(crate) fn within(mut self, segment: Segment) -> Self {
        self.path.prepend(segment);
        self
    }
}

impl From<ErrorKind> for StructuringError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SCHEMA ERRORS
// ————————————————————————————————————————————————————————————————————————————

/// Problems building or loading a [`crate::SchemaSet`].
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("`{0}` is declared more than once")]
    DuplicateName(String),
    #[error("record `{record}` declares field `{field}` more than once")]
    DuplicateField { record: String, field: String },
    #[error("enum `{enumeration}` declares tag `{tag}` more than once")]
    DuplicateTag { enumeration: String, tag: String },
    #[error("field `{record}.{field}` refers to unknown type `{name}`")]
    UnresolvedReference {
        record: String,
        field: String,
        name: String,
    },
    #[error("default of field `{record}.{field}` does not fit its type: {source}")]
    InvalidDefault {
        record: String,
        field: String,
        #[source]
        source: StructuringError,
    },
    #[error("`{0}` is a built-in type name and cannot name a record or enum")]
    ReservedName(String),
    #[error("invalid type expression `{input}`: {reason}")]
    InvalidTypeExpr { input: String, reason: String },
    #[error("invalid schema description at {path}: {message}")]
    Description { path: String, message: String },
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

pub(crate) fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(n) if n.is_f64() => "float",
        Json::Number(_) => "int",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// Scalars are shown with their literal; containers only by kind so that
/// messages stay one line.
fn describe(value: &Json) -> String {
    match value {
        Json::Array(_) | Json::Object(_) | Json::Null => json_kind(value).to_string(),
        _ => format!("{} {value}", json_kind(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn root_path_renders_as_dot() {
        assert_eq!(FieldPath::root().to_string(), ".");
    }

    #[test]
    fn nested_path_renders_fields_indices_and_keys() {
        let err = StructuringError::new(ErrorKind::MissingRequiredField("name".into()))
            .within(Segment::Field("tags".into()))
            .within(Segment::Index(2))
            .within(Segment::Key("by city".into()))
            .within(Segment::Field("arguments".into()));
        assert_eq!(err.path().to_string(), r#"arguments["by city"][2].tags"#);
    }

    #[test]
    fn messages_keep_expected_and_actual() {
        let err = StructuringError::new(ErrorKind::InvalidEnumValue {
            value: json!("LOW"),
            enum_name: "RiskLevel".into(),
            permitted: vec!["low".into(), "high".into()],
        })
        .within(Segment::Field("risk_level".into()))
        .within(Segment::Field("policy".into()));
        assert_eq!(
            err.to_string(),
            r#"string "LOW" is not a valid RiskLevel (expected one of: low, high) (at policy.risk_level)"#
        );

        let mismatch = ErrorKind::TypeMismatch { expected: "int".into(), actual: json!(1.5) };
        assert_eq!(mismatch.to_string(), "expected int, found float 1.5");
    }

    #[test]
    fn only_value_faults_count_as_mismatches() {
        assert!(ErrorKind::ExpectedArray { actual: "object" }.is_mismatch());
        assert!(!ErrorKind::DepthLimitExceeded(4).is_mismatch());
        assert!(!ErrorKind::UnknownSchema("X".into()).is_mismatch());
        assert_eq!(ErrorKind::MalformedJson(String::new()).code(), "malformed_json");
    }
}

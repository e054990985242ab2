//! Schema-directed structuring of untyped JSON into typed record values.
//!
//! A [`SchemaSet`] describes records (named, ordered fields) and enums (closed
//! tag sets). A [`Structurer`] walks an input document against one record of
//! that set and either produces a fully populated [`Record`] or fails with the
//! first mismatch it finds, located by a field path. Dumping is the inverse and
//! emits deterministic, 2-space indented JSON in schema field order.
//!
//! ```
//! use json_strict::{EnumSchema, RecordSchema, SchemaSet, Structurer, TypeExpr};
//!
//! let schemas = SchemaSet::new()
//!     .with_enum(EnumSchema::new("Level", ["low", "high"]))?
//!     .with_record(
//!         RecordSchema::new("Job")
//!             .field("name", TypeExpr::string())
//!             .field("level", TypeExpr::enum_ref("Level")),
//!     )?
//!     .checked()?;
//!
//! let structurer = Structurer::new(schemas);
//! let job = structurer.parse("Job", r#"{"name": "backup", "level": "low", "extra": 1}"#)?;
//! assert_eq!(job.get("name").and_then(|v| v.as_str()), Some("backup"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod backend;
pub mod dump;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod ir;
pub mod path_de;
pub mod structure;
pub mod value;

pub use backend::{Backend, ReferenceBackend};
pub use engine::{Input, Structurer};
pub use error::{ErrorKind, FieldPath, SchemaError, Segment, StructuringError};
pub use ir::{EnumSchema, FieldDescriptor, PrimitiveKind, RecordSchema, SchemaSet, TypeExpr};
pub use structure::StructureOptions;
pub use value::{EnumValue, Record, Value};

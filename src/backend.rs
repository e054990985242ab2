//! Pluggable structuring backends.
//!
//! [`crate::Structurer`] talks to a `Backend` and nothing else, so a richer
//! conversion library can be slotted in without touching call sites. The
//! [`ReferenceBackend`] is the portable default.
use serde_json::Value as Json;

use crate::dump;
use crate::error::StructuringError;
use crate::ir::SchemaSet;
use crate::structure::{StructureOptions, Structurizer};
use crate::value::Record;

pub trait Backend: Send + Sync {
    /// Structures an already-decoded document as the record named `record`.
    fn structure(&self, json: &Json, schemas: &SchemaSet, record: &str) -> Result<Record, StructuringError>;

    /// Renders a record as JSON text.
    fn dump(&self, record: &Record, schemas: &SchemaSet) -> Result<String, StructuringError>;
}

/// The built-in type-directed walk and schema-ordered dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceBackend {
    options: StructureOptions,
}

impl ReferenceBackend {
    pub fn new(options: StructureOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> StructureOptions {
        self.options
    }
}

impl Backend for ReferenceBackend {
    fn structure(&self, json: &Json, schemas: &SchemaSet, record: &str) -> Result<Record, StructuringError> {
        Structurizer::new(schemas, self.options).record(record, json)
    }

    fn dump(&self, record: &Record, schemas: &SchemaSet) -> Result<String, StructuringError> {
        dump::dump_record(record, schemas)
    }
}

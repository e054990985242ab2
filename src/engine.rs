//! The caller-facing entry point: decode, then hand off to a backend.
use std::fmt;
use std::sync::Arc;

use serde_json::Value as Json;
use tracing::debug;

use crate::backend::{Backend, ReferenceBackend};
use crate::error::{ErrorKind, StructuringError};
use crate::ir::SchemaSet;
use crate::structure::StructureOptions;
use crate::value::Record;

/// A document to structure: raw JSON text or bytes, or an already-decoded tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Input<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
    Json(Json),
}

impl Input<'_> {
    /// Decodes text and bytes; a decoded tree is returned as is.
    pub fn decode(self) -> Result<Json, StructuringError> {
        let decoded: Result<Json, serde_json::Error> = match self {
            Self::Json(json) => return Ok(json),
            Self::Text(text) => serde_json::from_str(text),
            Self::Bytes(bytes) => serde_json::from_slice(bytes),
        };
        decoded.map_err(|err| ErrorKind::MalformedJson(err.to_string()).into())
    }
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for Input<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a [u8]> for Input<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Json> for Input<'_> {
    fn from(json: Json) -> Self {
        Self::Json(json)
    }
}

/// Parses documents into records of a fixed schema set, and dumps them back.
///
/// Cloning is cheap and every method takes `&self`; one `Structurer` can be
/// shared by any number of threads.
#[derive(Clone)]
pub struct Structurer {
    schemas: Arc<SchemaSet>,
    backend: Arc<dyn Backend>,
}

impl Structurer {
    /// Uses the [`ReferenceBackend`] with default options.
    pub fn new(schemas: impl Into<Arc<SchemaSet>>) -> Self {
        Self::with_options(schemas, StructureOptions::default())
    }

    pub fn with_options(schemas: impl Into<Arc<SchemaSet>>, options: StructureOptions) -> Self {
        Self {
            schemas: schemas.into(),
            backend: Arc::new(ReferenceBackend::new(options)),
        }
    }

    /// Replaces the backend; every later `parse`/`dump` is forwarded to it.
    pub fn with_backend(mut self, backend: impl Backend + 'static) -> Self {
        self.backend = Arc::new(backend);
        self
    }

    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    /// Decodes `input` and structures it as the record named `record`.
    pub fn parse<'a>(&self, record: &str, input: impl Into<Input<'a>>) -> Result<Record, StructuringError> {
        let json = input.into().decode()?;
        let result = self.backend.structure(&json, &self.schemas, record);
        if let Err(err) = &result {
            debug!(record, error = %err, "structuring failed");
        }
        result
    }

    pub fn dump(&self, record: &Record) -> Result<String, StructuringError> {
        self.backend.dump(record, &self.schemas)
    }
}

impl fmt::Debug for Structurer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Structurer")
            .field("schemas", &self.schemas)
            .finish_non_exhaustive()
    }
}

//! Minimal CLI: structure JSON/NDJSON documents against a schema → (check | dump)
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use tracing::{debug, info};

use json_strict::{SchemaSet, StructureOptions, Structurer, envelope};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// structure JSON documents against a record schema, reporting the first mismatch per document
#[derive(Parser, Debug)]
#[command(name = "json-strict")]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate every document and print one verdict per document
    Check(CheckOut),
    /// validate and print the canonical (schema-ordered, 2-space indented) form
    Dump(DumpOut),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Builtin {
    /// CanonicalToolCall / CanonicalToolResult and their enums
    ToolEnvelope,
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema description document (JSON)
    #[arg(long, conflicts_with = "builtin", required_unless_present = "builtin")]
    schema: Option<PathBuf>,

    /// use a schema set compiled into the binary
    #[arg(long, value_enum)]
    builtin: Option<Builtin>,

    /// record every document is structured as
    #[arg(long, short)]
    record: String,

    /// deepest nesting accepted before a document is rejected
    #[arg(long, default_value_t = StructureOptions::default().max_depth)]
    max_depth: usize,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// only print failing documents
    #[arg(long, short)]
    quiet: bool,
}

#[derive(clap::Parser, Debug)]
struct DumpOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One JSON document pulled from an input file.
struct Document {
    /// `path` for whole files, `path:line` for NDJSON records
    origin: String,
    source: String,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn structurer(&self) -> anyhow::Result<Structurer> {
        let schemas = match (&self.schema, self.builtin) {
            (Some(path), _) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("failed to read schema description {}", path.display()))?;
                SchemaSet::from_description_slice(&bytes)
                    .with_context(|| format!("invalid schema description {}", path.display()))?
            }
            (None, Some(Builtin::ToolEnvelope)) => envelope::tool_envelope_schemas()?,
            (None, None) => bail!("either --schema or --builtin is required"),
        };
        if schemas.record(&self.record).is_none() {
            let known: Vec<_> = schemas.records().map(|r| r.name.as_str()).collect();
            bail!("no record named `{}` (known records: {})", self.record, known.join(", "));
        }
        let options = StructureOptions { max_depth: self.max_depth };
        Ok(Structurer::with_options(schemas, options))
    }
}

impl InputSettings {
    fn load_documents(&self) -> anyhow::Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let origin = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {origin}"))?;
            if self.ndjson {
                for (index, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    documents.push(Document {
                        origin: format!("{origin}:{}", index + 1),
                        source: line.to_string(),
                    });
                }
            } else {
                documents.push(Document { origin, source });
            }
        }
        debug!(documents = documents.len(), "inputs loaded");
        Ok(documents)
    }

    /// Structures one document, honoring `--json-pointer`.
    fn structure(&self, structurer: &Structurer, record: &str, document: &Document) -> anyhow::Result<json_strict::Record> {
        let Some(pointer) = self.json_pointer.as_deref() else {
            return Ok(structurer.parse(record, &document.source)?);
        };
        let mut json = decode_document(&document.source)?;
        let selected = json
            .pointer_mut(pointer)
            .map(std::mem::take)
            .ok_or_else(|| anyhow!("JSON pointer {pointer} selects nothing"))?;
        Ok(structurer.parse(record, selected)?)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<ExitCode> {
        match &self.cmd {
            Command::Check(target) => target.run(),
            Command::Dump(target) => target.run(),
        }
    }
}

impl CheckOut {
    fn run(&self) -> anyhow::Result<ExitCode> {
        let structurer = self.schema_settings.structurer()?;
        let record = self.schema_settings.record.as_str();
        let documents = self.input_settings.load_documents()?;

        // independent documents, so structure them in parallel; collect keeps input order
        let outcomes: Vec<_> = documents
            .par_iter()
            .map(|document| self.input_settings.structure(&structurer, record, document))
            .collect();

        let mut failures = 0usize;
        for (document, outcome) in documents.iter().zip(&outcomes) {
            match outcome {
                Ok(_) if self.quiet => {}
                Ok(_) => println!("{} {}", "ok   ".green(), document.origin),
                Err(error) => {
                    failures += 1;
                    println!("{} {}: {error:#}", "error".red().bold(), document.origin);
                }
            }
        }
        info!(documents = documents.len(), failures, "check finished");
        Ok(if failures == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    }
}

impl DumpOut {
    fn run(&self) -> anyhow::Result<ExitCode> {
        let structurer = self.schema_settings.structurer()?;
        let record = self.schema_settings.record.as_str();
        let documents = self.input_settings.load_documents()?;

        let rendered: Vec<anyhow::Result<String>> = documents
            .par_iter()
            .map(|document| -> anyhow::Result<String> {
                let parsed = self.input_settings.structure(&structurer, record, document)?;
                Ok(structurer.dump(&parsed)?)
            })
            .collect();

        let mut out = String::new();
        let mut failures = 0usize;
        for (document, rendered) in documents.iter().zip(rendered) {
            match rendered {
                Ok(text) => {
                    out.push_str(&text);
                    out.push('\n');
                }
                Err(error) => {
                    failures += 1;
                    eprintln!("{} {}: {error:#}", "error".red().bold(), document.origin);
                }
            }
        }

        if let Some(path) = self.out.as_ref() {
            write_output(path, &out)?;
        } else {
            print!("{out}");
        }
        Ok(if failures == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Decodes through the engine so malformed input reports like any other document.
fn decode_document(source: &str) -> anyhow::Result<serde_json::Value> {
    Ok(json_strict::Input::from(source).decode()?)
}

fn write_output(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        CommandLineInterface::command().debug_assert();
    }

    #[test]
    fn schema_source_is_exclusive() {
        let both = CommandLineInterface::try_parse_from([
            "json-strict", "check", "--schema", "s.json", "--builtin", "tool-envelope", "-r", "X", "-i", "a.json",
        ]);
        assert!(both.is_err());

        let builtin = CommandLineInterface::try_parse_from([
            "json-strict", "check", "--builtin", "tool-envelope", "-r", "CanonicalToolCall", "-i", "a.json",
        ]);
        assert!(builtin.is_ok());
    }

    #[test]
    fn unknown_record_is_a_usage_error() {
        let settings = SchemaSettings {
            schema: None,
            builtin: Some(Builtin::ToolEnvelope),
            record: "Nope".into(),
            max_depth: 8,
        };
        let err = settings.structurer().unwrap_err();
        assert!(err.to_string().contains("CanonicalToolCall"));
    }

    #[test]
    fn json_pointer_selects_the_payload() {
        let settings = InputSettings {
            ndjson: false,
            json_pointer: Some("/envelope".into()),
            input: Vec::new(),
        };
        let structurer = SchemaSettings {
            schema: None,
            builtin: Some(Builtin::ToolEnvelope),
            record: envelope::POLICY.into(),
            max_depth: 8,
        }
        .structurer()
        .unwrap();
        let document = Document {
            origin: "inline".into(),
            source: r#"{"envelope": {"risk_level": "high", "requires_confirmation": true, "timeout_ms": 10}}"#.into(),
        };
        let record = settings.structure(&structurer, envelope::POLICY, &document).unwrap();
        assert_eq!(record.get("timeout_ms").and_then(|v| v.as_i64()), Some(10));

        let missing = Document { origin: "inline".into(), source: "{}".into() };
        assert!(settings.structure(&structurer, envelope::POLICY, &missing).is_err());
    }
}

//! Runs the JSON case corpus against the built-in envelope schemas.
//!
//! ```text
//! cargo run -p dev-test-runner [-- <CASES_DIR>]
//! ```
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, anyhow, bail};
use clap::Parser;
use colored::Colorize;
use serde::Deserialize;
use serde_json::Value as Json;

use json_strict::{Structurer, StructuringError, envelope, path_de};

/// run the case corpus and report one verdict per case
#[derive(Parser, Debug)]
#[command(name = "dev-test-runner")]
struct Cli {
    /// directory of `*.json` case files
    #[arg(default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/cases"))]
    cases_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Case {
    name: String,
    record: String,
    /// decoded document
    #[serde(default)]
    input: Option<Json>,
    /// raw text, for malformed-input cases
    #[serde(default)]
    input_text: Option<String>,
    /// `ok` or an error code
    expect: String,
    /// expected error location, when the case fails
    #[serde(default)]
    path: Option<String>,
}

enum Verdict {
    Pass,
    Fail(String),
}

fn main() -> ExitCode {
    match run(&Cli::parse()) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let dir = &cli.cases_dir;
    let structurer = Structurer::new(envelope::tool_envelope_schemas()?);

    let mut files = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    files.retain(|path| path.extension().is_some_and(|ext| ext == "json"));
    files.sort();
    if files.is_empty() {
        bail!("no case files in {}", dir.display());
    }

    let (mut passed, mut failed) = (0usize, 0usize);
    for file in &files {
        for case in load_cases(file)? {
            match check(&structurer, &case) {
                Verdict::Pass => {
                    passed += 1;
                    println!("{} {}", "pass".green(), case.name);
                }
                Verdict::Fail(reason) => {
                    failed += 1;
                    println!("{} {}: {reason}", "FAIL".red().bold(), case.name);
                }
            }
        }
    }

    println!("\n{passed} passed, {failed} failed");
    Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn load_cases(path: &Path) -> anyhow::Result<Vec<Case>> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    path_de::from_slice_with_path(&bytes)
        .map_err(|err| anyhow!("{}: at {}: {}", path.display(), err.path, err.message))
}

fn check(structurer: &Structurer, case: &Case) -> Verdict {
    let outcome: Result<_, StructuringError> = match (&case.input, &case.input_text) {
        (Some(json), None) => structurer.parse(&case.record, json.clone()),
        (None, Some(text)) => structurer.parse(&case.record, text),
        _ => return Verdict::Fail("exactly one of `input` and `input_text` is required".into()),
    };
    match (outcome, case.expect.as_str()) {
        (Ok(_), "ok") => Verdict::Pass,
        (Ok(_), expected) => Verdict::Fail(format!("expected {expected}, got ok")),
        (Err(err), "ok") => Verdict::Fail(format!("expected ok, got {err}")),
        (Err(err), expected) if err.kind().code() != expected => {
            Verdict::Fail(format!("expected {expected}, got {} ({err})", err.kind().code()))
        }
        (Err(err), _) => match &case.path {
            Some(path) if &err.path().to_string() != path => {
                Verdict::Fail(format!("expected error at {path}, got {}", err.path()))
            }
            _ => Verdict::Pass,
        },
    }
}

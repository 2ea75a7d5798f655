//! CLI tool for extracting and rewriting paragraph-level text in PowerPoint files.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deckpatch_core::{
    plan_modifications, suggestions_from_value, Error, ErrorKind, ModificationRequest, Suggestion,
};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Extract slide text with stable paragraph addresses, and write edits back.
#[derive(Parser, Debug)]
#[command(name = "deckpatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract paragraphs, titles, tables and notes to JSON
    Extract {
        /// Input .pptx file
        input: PathBuf,

        /// Output JSON file, or `-` for stdout (default: <input stem>_extracted.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply a modification payload
    Modify {
        /// Input .pptx file
        input: PathBuf,

        /// Path to a JSON payload, or the JSON payload itself
        modifications: String,

        /// Output .pptx file (default: overwrite the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Turn reviewer suggestions into a modification payload
    Plan {
        /// JSON file with a suggestion array (or an object with a `suggestions` array)
        suggestions: PathBuf,

        /// Output JSON file, or `-` for stdout (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Printed on success.
#[derive(Serialize, Debug)]
struct SuccessRecord {
    success: bool,
    output_file: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skipped: Option<usize>,
}

/// Printed on failure.
#[derive(Serialize, Debug)]
struct ErrorRecord {
    error: String,
    kind: ErrorKind,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let result = match &args.command {
        Command::Extract { input, output } => extract(input, output.as_deref()),
        Command::Modify {
            input,
            modifications,
            output,
        } => modify(input, modifications, output.as_deref()),
        Command::Plan {
            suggestions,
            output,
        } => plan(suggestions, output.as_deref()),
    };

    match result {
        Ok(Some(record)) => {
            print_json(&record);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("Failed: {:?}", e);
            print_json(&ErrorRecord {
                error: format!("{:#}", e),
                kind: classify(&e),
            });
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to render output: {}", e),
    }
}

/// Map a failure onto the externally visible error classes.
fn classify(error: &anyhow::Error) -> ErrorKind {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .map(Error::kind)
        .unwrap_or(ErrorKind::Internal)
}

fn extract(input: &Path, output: Option<&Path>) -> Result<Option<SuccessRecord>> {
    let payload = deckpatch_pptx::extract_path(input)
        .with_context(|| format!("Failed to extract {}", input.display()))?;
    let json = payload.to_json_pretty()?;

    let output_path = match output {
        Some(path) if path == Path::new("-") => {
            println!("{}", json);
            return Ok(None);
        }
        Some(path) => path.to_path_buf(),
        None => default_extract_path(input),
    };
    write_output(&output_path, &json)?;

    Ok(Some(SuccessRecord {
        success: true,
        output_file: output_path.display().to_string(),
        message: format!("Extracted {} slides", payload.total_slides),
        applied: None,
        skipped: None,
    }))
}

fn modify(input: &Path, modifications: &str, output: Option<&Path>) -> Result<Option<SuccessRecord>> {
    let request = load_modifications(modifications)?;
    let output_path = output.unwrap_or(input);

    let report = deckpatch_pptx::modify_path(input, &request, output_path)
        .with_context(|| format!("Failed to modify {}", input.display()))?;

    Ok(Some(SuccessRecord {
        success: true,
        output_file: output_path.display().to_string(),
        message: format!(
            "Applied {} change(s) on {} slide(s)",
            report.applied,
            report.slides_touched.len()
        ),
        applied: Some(report.applied),
        skipped: Some(report.skipped),
    }))
}

fn plan(suggestions: &Path, output: Option<&Path>) -> Result<Option<SuccessRecord>> {
    let text = std::fs::read_to_string(suggestions)
        .map_err(|e| Error::Payload(format!("{}: {}", suggestions.display(), e)))?;
    let parsed = parse_suggestions(&text)?;
    let json = plan_modifications(&parsed).to_json_pretty()?;

    match output {
        Some(path) if path != Path::new("-") => {
            write_output(path, &json)?;
            Ok(Some(SuccessRecord {
                success: true,
                output_file: path.display().to_string(),
                message: format!("Planned {} suggestion(s)", parsed.len()),
                applied: None,
                skipped: None,
            }))
        }
        _ => {
            println!("{}", json);
            Ok(None)
        }
    }
}

/// Accept a bare array or an analysis result wrapping it in `suggestions`.
fn parse_suggestions(text: &str) -> Result<Vec<Suggestion>, Error> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let list = match value {
        serde_json::Value::Object(mut map) => map
            .remove("suggestions")
            .ok_or_else(|| Error::Payload("expected a `suggestions` array".to_string()))?,
        other => other,
    };
    suggestions_from_value(list)
}

/// Read the payload from a file when the argument names one, otherwise
/// parse the argument itself.
fn load_modifications(arg: &str) -> Result<ModificationRequest, Error> {
    let path = Path::new(arg);
    if path.is_file() {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Payload(format!("{}: {}", path.display(), e)))?;
        ModificationRequest::from_json(&text)
    } else {
        ModificationRequest::from_json(arg)
    }
}

/// `<stem>_extracted.json` next to the input.
fn default_extract_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let output_filename = format!("{}_extracted.json", stem);
    match input.parent() {
        Some(parent) => parent.join(output_filename),
        None => PathBuf::from(output_filename),
    }
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}

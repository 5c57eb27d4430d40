//! Checks Matrix JSON payloads for fields their model does not declare.
//!
//! ```text
//! mxevents-drift --model RoomMessageEventContent payload.json
//! mxevents-drift --model Event < event.json
//! mxevents-drift --list
//! ```
//!
//! Prints one `source: path` line per extra field. Exit status is 0 when
//! every payload is clean, 1 when any payload drifts, 2 on errors (unknown
//! model, unreadable or invalid input).

mod logging;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use mxevents::limits::MAX_NESTING_DEPTH;
use mxevents::{SchemaContext, ValidateOptions, ValidationError};
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(name = "mxevents-drift", version, about)]
struct Args {
    /// Model name (e.g. `RoomMessageEventContent`, `Event`) or content wire
    /// type (e.g. `m.room.message`).
    #[arg(long, short, required_unless_present = "list")]
    model: Option<String>,

    /// Print known model names and exit.
    #[arg(long)]
    list: bool,

    /// Maximum nesting depth before a payload is rejected.
    #[arg(long, default_value_t = MAX_NESTING_DEPTH)]
    max_depth: usize,

    /// JSON files to check. Reads stdin when none are given.
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    logging::init();
    match run(Args::parse()) {
        Ok(true) => ExitCode::from(1),
        Ok(false) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns true if any payload carried extra fields.
fn run(args: Args) -> Result<bool> {
    let context = SchemaContext::global().context("building event content registry")?;

    if args.list {
        for name in context.model_names() {
            println!("{name}");
        }
        return Ok(false);
    }

    let model = args.model.context("--model is required")?;
    if context.shape(&model).is_none() {
        return Err(ValidationError::ModelNotFound { name: model }.into());
    }
    let options = ValidateOptions { max_depth: args.max_depth };

    let mut drifted = false;
    for (source, text) in read_inputs(&args.files)? {
        let payload: Value =
            serde_json::from_str(&text).with_context(|| format!("{source}: invalid JSON"))?;
        let report = context
            .check_with_options(&model, &payload, options)
            .with_context(|| format!("{source}: validation failed"))?;

        tracing::info!(source = %source, model = %model, extra = report.extra.len(), "checked payload");
        for path in &report.extra {
            println!("{source}: {path}");
        }
        drifted |= report.has_extra();
    }
    Ok(drifted)
}

fn read_inputs(files: &[PathBuf]) -> Result<Vec<(String, String)>> {
    if files.is_empty() {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
        return Ok(vec![("<stdin>".to_string(), text)]);
    }

    files
        .iter()
        .map(|path| {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Ok((path.display().to_string(), text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_model_required_without_list() {
        assert!(Args::try_parse_from(["mxevents-drift", "a.json"]).is_err());
        let args = Args::try_parse_from(["mxevents-drift", "--list"]).unwrap();
        assert!(args.list);
        let args = Args::try_parse_from(["mxevents-drift", "-m", "Event", "a.json", "b.json"]).unwrap();
        assert_eq!(args.model.as_deref(), Some("Event"));
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.max_depth, MAX_NESTING_DEPTH);
    }

    #[test]
    fn test_unknown_model_is_error() {
        let args = Args::try_parse_from(["mxevents-drift", "-m", "NoSuchModel", "a.json"]).unwrap();
        let err = run(args).unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_some());
    }
}

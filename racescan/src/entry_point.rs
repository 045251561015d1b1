//! Shared entry point for all binaries.
//!
//! The engine returns warnings and diagnostics as data; this module owns the
//! mapping to the CLI contract: exit code 0 = no conflicts found, 1 =
//! conflicts found, 2 = analysis could not complete (blocking diagnostics or
//! interruption).

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use ignore::WalkBuilder;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::analyzer::{AnalysisResult, RaceScan};
use crate::cli::Cli;
use crate::config::Config;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::ir::{self, Unit};

/// Runs the CLI with the given arguments (program name excluded), writing
/// the report to stdout, and returns the exit code.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    run_with_args_to(args, &mut std::io::stdout())
}

/// Runs the CLI with the given arguments, writing the report to `writer`.
pub fn run_with_args_to(args: Vec<String>, writer: &mut impl Write) -> Result<i32> {
    let cli = match Cli::try_parse_from(std::iter::once("racescan".to_owned()).chain(args)) {
        Ok(cli) => cli,
        // clap reports --help and --version as errors; at the CLI boundary
        // they are successful runs.
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            write!(writer, "{err}")?;
            return Ok(0);
        }
        Err(err) => return Err(err.into()),
    };

    let config = match &cli.config {
        Some(path) => Config::load_file(path)?,
        None => cli
            .paths
            .first()
            .map_or_else(Config::load, |p| Config::load_from_path(p)),
    };

    let scan = RaceScan::default().with_config(config);

    // Ctrl-C flips the cooperative cancellation flag; the analyzer stops at
    // the next per-unit or per-resource checkpoint. A second installation
    // attempt (tests, repeated embedding) is harmless.
    let token = scan.cancel_token();
    let interrupt = token.clone();
    let _ = ctrlc::set_handler(move || interrupt.cancel());

    let files = collect_ir_files(&cli.paths);
    let (units, parse_diagnostics) = load_units(&files);

    let mut result = scan.analyze_units(&units);
    if !parse_diagnostics.is_empty() {
        let mut diagnostics = parse_diagnostics;
        diagnostics.append(&mut result.diagnostics);
        result.diagnostics = diagnostics;
    }

    if let Some(path) = &cli.output {
        let mut file = fs::File::create(path)?;
        render(&cli, &result, &mut file)?;
    } else {
        render(&cli, &result, writer)?;
    }

    if token.is_cancelled() {
        return Ok(2);
    }
    Ok(exit_code(&cli, &scan, &result))
}

fn render(cli: &Cli, result: &AnalysisResult, writer: &mut impl Write) -> Result<()> {
    if cli.json {
        crate::output::json::write_json(writer, result)?;
    } else {
        crate::output::reports::print_report(writer, result, cli.quiet)?;
    }
    Ok(())
}

fn exit_code(cli: &Cli, scan: &RaceScan, result: &AnalysisResult) -> i32 {
    if result.has_blocking_diagnostics() {
        return 2;
    }
    if !result.warnings.is_empty() {
        return 1;
    }
    let fail_on_diagnostics = cli.fail_on_diagnostics || scan.config.fail_on_diagnostics();
    if fail_on_diagnostics && !result.diagnostics.is_empty() {
        return 1;
    }
    0
}

/// Collects IR files from the given paths. Explicit files are taken as-is;
/// directories are walked for `.json` files, gitignore-aware.
fn collect_ir_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkBuilder::new(path).build().flatten() {
            let entry_path = entry.path();
            if entry_path.is_file() && entry_path.extension().is_some_and(|e| e == "json") {
                files.push(entry_path.to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    files
}

/// Reads and parses each IR file. A malformed file yields a parse-upstream
/// diagnostic and is skipped; other files continue.
fn load_units(files: &[PathBuf]) -> (Vec<Unit>, Vec<Diagnostic>) {
    let mut units = Vec::new();
    let mut diagnostics = Vec::new();

    for file in files {
        match read_units(file) {
            Ok(parsed) => units.extend(parsed),
            Err(message) => diagnostics.push(Diagnostic::new(
                DiagnosticKind::ParseUpstream,
                format!("{}: {message}", file.display()),
            )),
        }
    }
    (units, diagnostics)
}

fn read_units(file: &Path) -> Result<Vec<Unit>, String> {
    let content = fs::read_to_string(file).map_err(|e| e.to_string())?;
    ir::parse_units(&content).map_err(|e| e.to_string())
}

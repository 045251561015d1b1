//! Human-readable report rendering.

use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use std::io::Write;

use crate::aggregate::{RaceWarning, Severity};
use crate::analyzer::AnalysisResult;
use crate::diagnostics::Diagnostic;

fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);

    if cfg!(test) {
        table.set_width(120);
    }
    table
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
    }
}

/// Print the main header with box-drawing characters.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_header(writer: &mut impl Write) -> std::io::Result<()> {
    writeln!(writer)?;
    writeln!(
        writer,
        "{}",
        "╔════════════════════════════════════════╗".cyan()
    )?;
    writeln!(
        writer,
        "{}",
        "║  Static Race Analysis Results          ║".cyan().bold()
    )?;
    writeln!(
        writer,
        "{}",
        "╚════════════════════════════════════════╝".cyan()
    )?;
    writeln!(writer)?;
    Ok(())
}

/// Print summary with colored "pills".
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_summary_pills(
    writer: &mut impl Write,
    result: &AnalysisResult,
) -> std::io::Result<()> {
    fn pill(label: &str, count: usize) -> String {
        if count == 0 {
            format!("{}: {}", label, count.to_string().green())
        } else {
            format!("{}: {}", label, count.to_string().red().bold())
        }
    }

    writeln!(
        writer,
        "Units: {}  Contexts: {}  Effects: {}  Resources: {}",
        result.summary.total_units,
        result.summary.total_contexts,
        result.summary.total_effects,
        result.summary.total_resources,
    )?;
    writeln!(
        writer,
        "{}  {}",
        pill("Race candidates", result.warnings.len()),
        pill("Diagnostics", result.diagnostics.len()),
    )?;
    writeln!(writer)?;
    Ok(())
}

/// Print the race warnings table.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_warnings(writer: &mut impl Write, warnings: &[RaceWarning]) -> std::io::Result<()> {
    if warnings.is_empty() {
        return Ok(());
    }

    writeln!(writer, "\n{}", "Race Candidates".bold().underline())?;
    let mut table = create_table(vec![
        "Id", "Resource", "Access A", "Access B", "Severity", "Count",
    ]);

    for warning in warnings {
        let access_a = format!(
            "{} {} @ {}",
            warning.site_a.kind, warning.site_a.context, warning.site_a.location
        );
        let access_b = format!(
            "{} {} @ {}",
            warning.site_b.kind, warning.site_b.context, warning.site_b.location
        );
        table.add_row(vec![
            Cell::new(&warning.id).add_attribute(Attribute::Dim),
            Cell::new(warning.resource.as_str()).add_attribute(Attribute::Bold),
            Cell::new(access_a),
            Cell::new(access_b),
            Cell::new(warning.severity.to_string()).fg(severity_color(warning.severity)),
            Cell::new(warning.occurrences),
        ]);
    }

    writeln!(writer, "{table}")?;
    Ok(())
}

/// Print the diagnostics table.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_diagnostics(
    writer: &mut impl Write,
    diagnostics: &[Diagnostic],
) -> std::io::Result<()> {
    if diagnostics.is_empty() {
        return Ok(());
    }

    writeln!(writer, "\n{}", "Diagnostics".bold().underline())?;
    let mut table = create_table(vec!["Kind", "Message", "Context", "Location"]);

    for diagnostic in diagnostics {
        let location = diagnostic
            .location
            .as_ref()
            .map_or_else(String::new, ToString::to_string);
        let kind_cell = if diagnostic.is_blocking() {
            Cell::new(diagnostic.kind.as_str()).fg(Color::Red)
        } else {
            Cell::new(diagnostic.kind.as_str()).fg(Color::Yellow)
        };
        table.add_row(vec![
            kind_cell,
            Cell::new(&diagnostic.message),
            Cell::new(diagnostic.context.as_deref().unwrap_or("")),
            Cell::new(location),
        ]);
    }

    writeln!(writer, "{table}")?;
    Ok(())
}

/// Print the full report.
///
/// # Errors
///
/// Returns an error if writing to the writer fails.
pub fn print_report(
    writer: &mut impl Write,
    result: &AnalysisResult,
    quiet: bool,
) -> std::io::Result<()> {
    if !quiet {
        print_header(writer)?;
        print_summary_pills(writer, result)?;
    }

    if result.is_clean() {
        writeln!(writer, "{}", "✓ No race candidates found.".green())?;
        return Ok(());
    }

    print_warnings(writer, &result.warnings)?;
    print_diagnostics(writer, &result.diagnostics)?;
    Ok(())
}

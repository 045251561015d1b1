//! Command-line interface definition.

use clap::Parser;
use std::path::PathBuf;

/// Help text for configuration file options, shown at the bottom of --help.
const CONFIG_HELP: &str = "\
CONFIGURATION FILE (.racescan.toml):
  Create this file in your project root to set defaults.

  [racescan]
  # Severity mapping
  write_write_severity = \"error\"    # Severity of write/write conflicts
  read_write_severity = \"warning\"   # Severity of read/write conflicts

  # Resource filters (glob patterns matched against resource names)
  ignore_resources = [\"tmp_*\", \"scratch\"]

  # CI/CD
  fail_on_diagnostics = false        # Exit 1 when only diagnostics were found
";

/// Command line interface configuration using `clap`.
/// This struct defines the arguments and flags accepted by the program.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "racescan - Static race-condition detection over concurrency effect logs",
    long_about = None,
    after_help = CONFIG_HELP
)]
pub struct Cli {
    /// Paths to analyze (IR files or directories).
    /// Directories are walked for .json IR files.
    /// When no paths are provided, defaults to the current directory.
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Output raw JSON instead of the human-readable report.
    #[arg(long)]
    pub json: bool,

    /// Write the report to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only print warnings and diagnostics, no header or summary.
    #[arg(short, long)]
    pub quiet: bool,

    /// Use a specific configuration file instead of discovery.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Exit with code 1 when diagnostics were found even without warnings
    /// (overrides the config file).
    #[arg(long)]
    pub fail_on_diagnostics: bool,
}

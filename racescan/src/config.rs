//! Configuration loading.
//!
//! Settings live in a `[racescan]` table inside `.racescan.toml` (or
//! `racescan.toml`), discovered by walking up from the analysis root. All
//! keys are optional; the defaults match [`SeverityPolicy::default`].

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregate::{Severity, SeverityPolicy};

/// Dotfile checked first in each directory.
pub const CONFIG_FILENAME: &str = ".racescan.toml";
/// Fallback filename without the leading dot.
pub const CONFIG_FILENAME_ALT: &str = "racescan.toml";

/// Top-level configuration struct.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// The main configuration section.
    #[serde(default)]
    pub racescan: RacescanConfig,
    /// The path to the configuration file this was loaded from.
    /// Set during `load_from_path`, `None` if using defaults.
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,
}

/// Configuration options for racescan.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RacescanConfig {
    /// Severity reported for write/write conflicts.
    pub write_write_severity: Option<Severity>,
    /// Severity reported for read/write conflicts.
    pub read_write_severity: Option<Severity>,
    /// Resource-name globs whose warnings are suppressed.
    pub ignore_resources: Option<Vec<String>>,
    /// Whether non-blocking diagnostics alone should fail a run.
    pub fail_on_diagnostics: Option<bool>,
}

impl Config {
    /// Loads configuration from default locations in the current directory.
    #[must_use]
    pub fn load() -> Self {
        Self::load_from_path(Path::new("."))
    }

    /// Loads configuration starting from a specific path and traversing up.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        let mut current = path.to_path_buf();
        if current.is_file() {
            current.pop();
        }

        loop {
            for filename in [CONFIG_FILENAME, CONFIG_FILENAME_ALT] {
                let candidate = current.join(filename);
                if candidate.exists() {
                    if let Ok(content) = fs::read_to_string(&candidate) {
                        if let Ok(mut config) = toml::from_str::<Self>(&content) {
                            config.config_file_path = Some(candidate);
                            return config;
                        }
                    }
                }
            }
            if !current.pop() {
                break;
            }
        }

        Self::default()
    }

    /// Reads a specific configuration file, for `--config`.
    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_file_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// The effective severity policy.
    #[must_use]
    pub fn severity_policy(&self) -> SeverityPolicy {
        let defaults = SeverityPolicy::default();
        SeverityPolicy {
            write_write: self
                .racescan
                .write_write_severity
                .unwrap_or(defaults.write_write),
            read_write: self
                .racescan
                .read_write_severity
                .unwrap_or(defaults.read_write),
        }
    }

    /// Compiled resource-ignore globs. Invalid patterns are skipped.
    #[must_use]
    pub fn ignore_globset(&self) -> Option<GlobSet> {
        let patterns = self.racescan.ignore_resources.as_ref()?;
        if patterns.is_empty() {
            return None;
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            if let Ok(glob) = Glob::new(pattern) {
                builder.add(glob);
            }
        }
        builder.build().ok()
    }

    /// Whether non-blocking diagnostics alone should fail a run.
    #[must_use]
    pub fn fail_on_diagnostics(&self) -> bool {
        self.racescan.fail_on_diagnostics.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn defaults_when_no_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_path(dir.path());
        assert!(config.config_file_path.is_none());
        assert_eq!(config.severity_policy().write_write, Severity::Error);
        assert_eq!(config.severity_policy().read_write, Severity::Warning);
        assert!(config.ignore_globset().is_none());
    }

    #[test]
    fn loads_from_dotfile_and_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join(CONFIG_FILENAME)).unwrap();
        writeln!(
            file,
            "[racescan]\nwrite_write_severity = \"warning\"\nignore_resources = [\"tmp_*\"]"
        )
        .unwrap();

        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = Config::load_from_path(&nested);
        assert!(config.config_file_path.is_some());
        assert_eq!(config.severity_policy().write_write, Severity::Warning);
        let globs = config.ignore_globset().unwrap();
        assert!(globs.is_match("tmp_buffer"));
        assert!(!globs.is_match("buffer"));
    }

    #[test]
    fn invalid_glob_patterns_are_skipped() {
        let config = Config {
            racescan: RacescanConfig {
                ignore_resources: Some(vec!["[".into(), "ok_*".into()]),
                ..RacescanConfig::default()
            },
            config_file_path: None,
        };
        let globs = config.ignore_globset().unwrap();
        assert!(globs.is_match("ok_x"));
    }
}

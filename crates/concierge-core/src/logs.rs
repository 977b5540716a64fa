//! Inspection of the application log file.
//!
//! The binaries write plain-text `tracing` output (no ANSI) to
//! `<log_dir>/concierge.log`; this module reads it back for the admin views.

use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const LOG_FILE_NAME: &str = "concierge.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Error,
    Warn,
    Other,
}

/// Level token as written by the fmt layer, e.g. `2025-01-01T10:00:00Z ERROR target: msg`.
fn level_of(line: &str) -> Level {
    for token in line.split_whitespace().take(3) {
        match token {
            "ERROR" => return Level::Error,
            "WARN" => return Level::Warn,
            _ => {}
        }
    }
    Level::Other
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogStats {
    pub exists: bool,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub errors: usize,
    pub warnings: usize,
}

/// Handle on the log file
#[derive(Debug, Clone)]
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log file inside a log directory
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(LOG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lines(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(content.lines().map(str::to_string).collect())
    }

    /// Last `n` lines
    pub fn tail(&self, n: usize) -> Result<Vec<String>> {
        let lines = self.lines()?;
        let start = lines.len().saturating_sub(n);
        Ok(lines[start..].to_vec())
    }

    /// Last `n` error and warning lines
    pub fn errors(&self, n: usize) -> Result<Vec<String>> {
        let matching: Vec<String> = self
            .lines()?
            .into_iter()
            .filter(|line| level_of(line) != Level::Other)
            .collect();
        let start = matching.len().saturating_sub(n);
        Ok(matching[start..].to_vec())
    }

    /// Truncate the file
    pub fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        OpenOptions::new().write(true).truncate(true).open(&self.path)?;
        Ok(())
    }

    pub fn stats(&self) -> Result<LogStats> {
        if !self.path.exists() {
            return Ok(LogStats {
                exists: false,
                path: self.path.clone(),
                size_bytes: 0,
                errors: 0,
                warnings: 0,
            });
        }

        let size_bytes = fs::metadata(&self.path)?.len();
        let (mut errors, mut warnings) = (0, 0);
        for line in self.lines()? {
            match level_of(&line) {
                Level::Error => errors += 1,
                Level::Warn => warnings += 1,
                Level::Other => {}
            }
        }

        Ok(LogStats {
            exists: true,
            path: self.path.clone(),
            size_bytes,
            errors,
            warnings,
        })
    }
}

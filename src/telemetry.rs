//! Local error log for pixelgrid
//!
//! Import and export failures can be appended to a JSONL file for later
//! inspection. Off unless enabled in `pxg.toml` or on the command line.
//! Entries carry no pixel data, only what failed and why.

use crate::clock;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// One line of the error log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// UTC time of the failure, ISO 8601 with milliseconds
    pub timestamp: String,
    /// Subcommand that failed (`export`, `draw`, ...)
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Category from the error's `kind()`, e.g. `json_error`
    pub error_type: String,
    pub context: String,
}

impl ErrorEntry {
    pub fn new(command: impl Into<String>, error_type: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            timestamp: clock::iso_now(),
            command: command.into(),
            file: None,
            error_type: error_type.into(),
            context: context.into(),
        }
    }

    /// Attach the path the command was working on.
    pub fn with_file(self, file: impl Into<String>) -> Self {
        Self { file: Some(file.into()), ..self }
    }
}

/// Appends [`ErrorEntry`] lines to a file, creating it on first use.
#[derive(Debug, Clone)]
pub struct ErrorCollector {
    path: PathBuf,
    enabled: bool,
}

impl ErrorCollector {
    pub fn new(path: impl AsRef<Path>, enabled: bool) -> Self {
        Self { path: path.as_ref().to_path_buf(), enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. Does nothing while disabled.
    pub fn append(&self, entry: &ErrorEntry) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }

        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)?,
            _ => {}
        }
        let mut line = serde_json::to_string(entry).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

// One collector per thread; the CLI installs it once after loading config.
thread_local! {
    static COLLECTOR: RefCell<Option<ErrorCollector>> = const { RefCell::new(None) };
}

/// Install the collector used by [`log_error`] on this thread.
pub fn init_collector(path: impl AsRef<Path>, enabled: bool) {
    COLLECTOR.with(|c| *c.borrow_mut() = Some(ErrorCollector::new(path, enabled)));
}

/// Append to the installed collector. Write failures are reported at warn
/// level and otherwise ignored; a failed log write never fails a command.
pub fn log_error(entry: &ErrorEntry) {
    COLLECTOR.with(|c| {
        let Some(collector) = c.borrow().clone() else {
            return;
        };
        if let Err(e) = collector.append(entry) {
            log::warn!("could not write error log {}: {}", collector.path().display(), e);
        }
    });
}

pub fn is_collection_enabled() -> bool {
    COLLECTOR.with(|c| c.borrow().as_ref().is_some_and(ErrorCollector::is_enabled))
}

/// Log a failure of `command` on `file` when collection is enabled.
pub fn report(command: &str, file: &Path, error_type: &str, error: &dyn std::fmt::Display) {
    if is_collection_enabled() {
        log_error(&ErrorEntry::new(command, error_type, error.to_string()).with_file(file.display().to_string()));
    }
}

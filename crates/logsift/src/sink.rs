//! Sink — persist a run's counts and groups.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::aggregate::LineCount;
use crate::error::SiftError;
use crate::group::LineGroup;

/// Receives the results of one run, named after the folder it covered.
pub trait ResultSink: Send {
    fn write_counts(&mut self, name: &str, counts: &[LineCount]) -> Result<(), SiftError>;
    fn write_groups(&mut self, name: &str, groups: &[LineGroup]) -> Result<(), SiftError>;
}

/// Writes one JSON object per line:
/// `<prefix><name>-<yyyyMMdd-HHmmss>.jsonl` for counts and
/// `<prefix><name>-<yyyyMMdd-HHmmss>-groups.jsonl` for groups.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    directory: PathBuf,
    prefix: String,
    stamp: String,
    written: Vec<PathBuf>,
}

impl JsonLinesSink {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self::at(directory, prefix, Local::now())
    }

    pub fn at(directory: impl Into<PathBuf>, prefix: impl Into<String>, time: DateTime<Local>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
            stamp: time.format("%Y%m%d-%H%M%S").to_string(),
            written: Vec::new(),
        }
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn path_for(&self, name: &str, suffix: &str) -> PathBuf {
        self.directory
            .join(format!("{}{}-{}{}.jsonl", self.prefix, name, self.stamp, suffix))
    }

    fn write_all<T: Serialize>(&mut self, path: PathBuf, items: &[T]) -> Result<(), SiftError> {
        std::fs::create_dir_all(&self.directory)?;
        let mut out = BufWriter::new(File::create(&path)?);
        for item in items {
            serde_json::to_writer(&mut out, item)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;

        tracing::info!(path = %path.display(), records = items.len(), "wrote results");
        self.written.push(path);
        Ok(())
    }
}

impl ResultSink for JsonLinesSink {
    fn write_counts(&mut self, name: &str, counts: &[LineCount]) -> Result<(), SiftError> {
        let path = self.path_for(name, "");
        self.write_all(path, counts)
    }

    fn write_groups(&mut self, name: &str, groups: &[LineGroup]) -> Result<(), SiftError> {
        let path = self.path_for(name, "-groups");
        self.write_all(path, groups)
    }
}

/// Name used for a folder's result files.
pub fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string())
}

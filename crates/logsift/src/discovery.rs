//! Discovery — enumerate candidate log files under a root folder.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::conf::DiscoveryConfig;
use crate::error::SiftError;

/// Compiled discovery settings.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    root: PathBuf,
    recursive: bool,
    pattern: GlobMatcher,
    exclude: Option<Regex>,
}

impl FileDiscovery {
    pub fn new(config: &DiscoveryConfig) -> Result<Self, SiftError> {
        let pattern = GlobBuilder::new(&config.pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| SiftError::InvalidGlob {
                pattern: config.pattern.clone(),
                source,
            })?
            .compile_matcher();

        let exclude = match config.exclude_path_regex.as_deref() {
            Some(p) if !p.is_empty() => Some(
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| SiftError::InvalidRegex {
                        pattern: p.to_string(),
                        source,
                    })?,
            ),
            _ => None,
        };

        Ok(Self {
            root: config.root.clone(),
            recursive: config.recursive,
            pattern,
            exclude,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Same settings, different root. Used for per-folder runs.
    pub fn with_root(&self, root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..self.clone()
        }
    }

    /// Matching files in sorted order. No match is not an error.
    ///
    /// Entries that cannot be visited (permissions, races with deletion) are
    /// logged and skipped.
    pub fn discover(&self) -> Result<Vec<PathBuf>, SiftError> {
        if !self.root.is_dir() {
            return Err(SiftError::Configuration(format!(
                "root folder {} does not exist or is not a directory",
                self.root.display()
            )));
        }

        let mut walker = WalkDir::new(&self.root).follow_links(false);
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if self.accepts(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        debug!(root = %self.root.display(), files = files.len(), "discovered files");
        Ok(files)
    }

    fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        if !self.pattern.is_match(name) {
            return false;
        }
        match &self.exclude {
            Some(re) => !re.is_match(&path.to_string_lossy()),
            None => true,
        }
    }
}

/// Immediate subdirectories of `root`, sorted.
pub fn subfolders(root: &Path) -> Result<Vec<PathBuf>, SiftError> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    dirs.sort();
    Ok(dirs)
}

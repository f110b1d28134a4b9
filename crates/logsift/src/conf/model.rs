//! Model — SiftConfig and related structs.

use std::path::PathBuf;
use serde::{Deserialize, Serialize};

/// 1 MiB read chunks.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    pub discovery: DiscoveryConfig,
    pub pipeline: PipelineConfig,
    pub normalize: NormalizeConfig,
    pub grouping: GroupingConfig,
    pub output: OutputConfig,
}

/// Where to look for log files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub root: PathBuf,
    /// Glob matched against the file name (e.g. `*.log`).
    pub pattern: String,
    pub recursive: bool,
    /// Paths matching this regex (case-insensitive, full path) are skipped.
    pub exclude_path_regex: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub chunk_size: usize,
    pub reader_parallelism: usize,
    pub hash_parallelism: usize,
    pub path_queue_capacity: usize,
    pub line_queue_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Lines whose first `scan_length` characters do not match are dropped.
    pub prefix_filter: Option<String>,
    pub scan_length: usize,
    pub max_line_length: usize,
    /// Applied in order.
    pub substitutions: Vec<SubstitutionRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionRule {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingStrategy {
    Prefix,
    Weighted,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    pub strategy: GroupingStrategy,
    pub min_prefix_length: usize,
    pub weight_threshold: f64,
    /// Groups with fewer members are left out of the report.
    pub min_group_members: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub file_prefix: String,
    /// Treat every immediate subdirectory of the root as its own run.
    pub per_folder: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            pattern: "*".to_string(),
            recursive: true,
            exclude_path_regex: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            reader_parallelism: 8,
            hash_parallelism: default_hash_parallelism(),
            path_queue_capacity: 3,
            line_queue_capacity: 10_000,
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            prefix_filter: None,
            scan_length: 50,
            max_line_length: 300,
            substitutions: Vec::new(),
        }
    }
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            strategy: GroupingStrategy::Prefix,
            min_prefix_length: 40,
            weight_threshold: 5.0,
            min_group_members: 1,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            file_prefix: "results-".to_string(),
            per_folder: false,
        }
    }
}

pub(crate) fn default_hash_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

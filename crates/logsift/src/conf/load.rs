//! Load — config loading from file and environment variables, plus validation.

use std::path::{Path, PathBuf};
use std::fs::File;
use std::io::Read;

use super::model::{
    DiscoveryConfig, GroupingConfig, NormalizeConfig, OutputConfig, PipelineConfig, SiftConfig,
};
use crate::error::SiftError;

impl SiftConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, SiftError> {
        let config_path = std::env::var("LOGSIFT_CONFIG_FILE")
            .unwrap_or_else(|_| "logsift.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!("Config file not found at {}, using environment variables", config_path);
            Self::from_env()
        };

        // Environment variables override file config for the run target
        if let Ok(root) = std::env::var("LOGSIFT_ROOT") {
            config.discovery.root = PathBuf::from(root);
        }
        if let Ok(pattern) = std::env::var("LOGSIFT_PATTERN") {
            config.discovery.pattern = pattern;
        }
        if let Some(readers) = env_parse("LOGSIFT_READERS") {
            config.pipeline.reader_parallelism = readers;
        }
        if let Some(hashers) = env_parse("LOGSIFT_HASHERS") {
            config.pipeline.hash_parallelism = hashers;
        }
        if let Ok(dir) = std::env::var("LOGSIFT_OUTPUT_DIR") {
            config.output.directory = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, SiftError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, SiftError> {
        toml::from_str(contents).map_err(|e| SiftError::Configuration(e.to_string()))
    }

    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        let pipeline = PipelineConfig::default();
        Self {
            discovery: DiscoveryConfig {
                root: std::env::var("LOGSIFT_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(".")),
                pattern: std::env::var("LOGSIFT_PATTERN").unwrap_or_else(|_| "*".to_string()),
                recursive: env_parse("LOGSIFT_RECURSIVE").unwrap_or(true),
                exclude_path_regex: std::env::var("LOGSIFT_EXCLUDE_PATHS").ok(),
            },
            pipeline: PipelineConfig {
                reader_parallelism: env_parse("LOGSIFT_READERS")
                    .unwrap_or(pipeline.reader_parallelism),
                hash_parallelism: env_parse("LOGSIFT_HASHERS")
                    .unwrap_or(pipeline.hash_parallelism),
                chunk_size: env_parse("LOGSIFT_CHUNK_SIZE").unwrap_or(pipeline.chunk_size),
                ..pipeline
            },
            normalize: NormalizeConfig {
                prefix_filter: std::env::var("LOGSIFT_PREFIX_FILTER").ok(),
                ..NormalizeConfig::default()
            },
            grouping: GroupingConfig::default(),
            output: OutputConfig {
                directory: std::env::var("LOGSIFT_OUTPUT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(".")),
                ..OutputConfig::default()
            },
        }
    }

    /// Validate configuration values and the root folder.
    /// Runs before any worker starts.
    pub fn validate(&self) -> Result<(), String> {
        self.pipeline.validate()?;
        self.normalize.validate()?;
        self.grouping.validate()?;
        self.discovery.validate()?;
        Ok(())
    }
}

impl DiscoveryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.pattern.is_empty() {
            return Err("discovery.pattern must not be empty".to_string());
        }
        if self.root.as_os_str().is_empty() {
            return Err("discovery.root is not configured (empty path)".to_string());
        }
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(format!("discovery.root is not a directory: {}", self.root.display())),
            Err(e) => Err(format!(
                "discovery.root is not readable: {} ({})",
                self.root.display(),
                e
            )),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("pipeline.chunk_size must be > 0".to_string());
        }
        if self.reader_parallelism == 0 {
            return Err("pipeline.reader_parallelism must be > 0".to_string());
        }
        if self.hash_parallelism == 0 {
            return Err("pipeline.hash_parallelism must be > 0".to_string());
        }
        if self.path_queue_capacity == 0 {
            return Err("pipeline.path_queue_capacity must be > 0".to_string());
        }
        if self.line_queue_capacity == 0 {
            return Err("pipeline.line_queue_capacity must be > 0".to_string());
        }
        Ok(())
    }
}

impl NormalizeConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_line_length == 0 {
            return Err("normalize.max_line_length must be > 0".to_string());
        }
        if self.prefix_filter.is_some() && self.scan_length == 0 {
            return Err("normalize.scan_length must be > 0 when a prefix filter is set".to_string());
        }
        Ok(())
    }
}

impl GroupingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_prefix_length == 0 {
            return Err("grouping.min_prefix_length must be > 0".to_string());
        }
        if !self.weight_threshold.is_finite() {
            return Err("grouping.weight_threshold must be a finite number".to_string());
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

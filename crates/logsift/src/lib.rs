// Module structure for logsift.

// Core pipeline
pub mod aggregate;
pub mod discovery;
pub mod hash;
pub mod normalize;
pub mod pipeline;
pub mod processor;
pub mod reader;

// Reporting
pub mod group;
pub mod sink;

// Infrastructure
pub mod conf;
pub mod error;
pub mod progress;
pub mod runtime;
pub mod stats;

pub use error::{Result, SiftError};
pub use pipeline::{Pipeline, RunOutcome, RunSummary};

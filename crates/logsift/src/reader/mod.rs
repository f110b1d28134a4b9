//! Reader — chunked, parallel line reading with bounded hand-off.

pub mod decode;
pub mod lines;
pub mod pool;
pub mod producer;

use std::path::PathBuf;

use serde::Serialize;

pub use lines::{LineReader, LogLine};
pub use pool::BufferPool;
pub use producer::LineProducer;

/// A file that could not be opened or failed mid-read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

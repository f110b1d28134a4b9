//! Line processor plugin seam.
//!
//! The dedup core only needs a processor that yields [`HashedLine`]s, but the
//! same trait is what surrounding tooling implements for structured
//! extraction (one raw line in, zero or one value out).

/// A normalized line together with its content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedLine {
    pub hash: u64,
    pub text: String,
}

pub trait LineProcessor: Send + Sync {
    type Output: Send;

    /// Process one raw line. `None` means the line is not of interest.
    fn process_line(&self, raw: &str) -> Option<Self::Output>;
}

impl<P: LineProcessor + ?Sized> LineProcessor for std::sync::Arc<P> {
    type Output = P::Output;

    fn process_line(&self, raw: &str) -> Option<Self::Output> {
        (**self).process_line(raw)
    }
}

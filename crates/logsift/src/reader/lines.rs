//! Lines — chunked, pull-based line reader over a single file.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::decode::Utf8Decoder;
use super::pool::{BufferPool, PooledBuffer};

/// One line of one file. `line_index` is 1-based and contiguous per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub content: String,
    pub line_index: u64,
    pub file_path: Arc<Path>,
}

/// Reads a file in fixed-size chunks and yields its lines in order.
///
/// Owns the file handle, the decoder carry state and the partial line
/// between reads. Finite and not restartable: once [`LineReader::next_line`]
/// returns `Ok(None)` it keeps returning `Ok(None)`.
pub struct LineReader {
    file: File,
    path: Arc<Path>,
    buffer: PooledBuffer,
    decoder: Utf8Decoder,
    decoded: String,
    partial: String,
    ready: VecDeque<LogLine>,
    next_index: u64,
    bytes_read: u64,
    eof: bool,
}

impl LineReader {
    pub async fn open(path: impl Into<PathBuf>, pool: &Arc<BufferPool>) -> std::io::Result<Self> {
        let path: PathBuf = path.into();
        let file = File::open(&path).await?;
        Ok(Self {
            file,
            path: Arc::from(path),
            buffer: pool.rent(),
            decoder: Utf8Decoder::new(),
            decoded: String::new(),
            partial: String::new(),
            ready: VecDeque::new(),
            next_index: 1,
            bytes_read: 0,
            eof: false,
        })
    }

    pub fn path(&self) -> &Arc<Path> {
        &self.path
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Next line, or `None` at end of file.
    pub async fn next_line(&mut self) -> std::io::Result<Option<LogLine>> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Ok(Some(line));
            }
            if self.eof {
                return Ok(None);
            }
            self.read_chunk().await?;
        }
    }

    /// Read one chunk and move every completed line into the ready queue.
    /// Returns the number of bytes read (0 at end of file).
    pub async fn read_chunk(&mut self) -> std::io::Result<usize> {
        if self.eof {
            return Ok(0);
        }

        let n = self.file.read(&mut self.buffer[..]).await?;
        self.decoded.clear();
        if n == 0 {
            self.decoder.finish(&mut self.decoded);
            self.split_decoded();
            if !self.partial.is_empty() {
                let content = std::mem::take(&mut self.partial);
                self.emit(content);
            }
            self.eof = true;
            tracing::trace!(path = %self.path.display(), lines = self.next_index - 1, "end of file");
            return Ok(0);
        }

        self.bytes_read += n as u64;
        self.decoder.decode(&self.buffer[..n], &mut self.decoded);
        self.split_decoded();
        Ok(n)
    }

    fn split_decoded(&mut self) {
        let decoded = std::mem::take(&mut self.decoded);
        let mut rest = decoded.as_str();
        while let Some(pos) = rest.find('\n') {
            self.partial.push_str(&rest[..pos]);
            if self.partial.ends_with('\r') {
                self.partial.pop();
            }
            let content = std::mem::take(&mut self.partial);
            self.emit(content);
            rest = &rest[pos + 1..];
        }
        self.partial.push_str(rest);
        // Keep the allocation for the next chunk
        self.decoded = decoded;
    }

    fn emit(&mut self, content: String) {
        self.ready.push_back(LogLine {
            content,
            line_index: self.next_index,
            file_path: Arc::clone(&self.path),
        });
        self.next_index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    async fn read_all(bytes: &[u8], chunk: usize) -> Vec<LogLine> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();

        let pool = BufferPool::new(chunk, 1);
        let mut reader = LineReader::open(file.path(), &pool).await.unwrap();
        let mut lines = Vec::new();
        while let Some(line) = reader.next_line().await.unwrap() {
            lines.push(line);
        }
        assert!(reader.next_line().await.unwrap().is_none());
        assert_eq!(reader.bytes_read(), bytes.len() as u64);
        lines
    }

    fn contents(lines: &[LogLine]) -> Vec<&str> {
        lines.iter().map(|l| l.content.as_str()).collect()
    }

    #[tokio::test]
    async fn test_lf_lines() {
        let lines = read_all(b"one\ntwo\nthree\n", 4).await;
        assert_eq!(contents(&lines), vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_crlf_lines() {
        for chunk in [1, 2, 3, 64] {
            let lines = read_all(b"one\r\ntwo\r\n", chunk).await;
            assert_eq!(contents(&lines), vec!["one", "two"], "chunk {}", chunk);
        }
    }

    #[tokio::test]
    async fn test_only_cr_before_lf_is_stripped() {
        let lines = read_all(b"a\rb\r\nc\r", 64).await;
        assert_eq!(contents(&lines), vec!["a\rb", "c\r"]);
    }

    #[tokio::test]
    async fn test_final_line_without_newline() {
        let lines = read_all(b"first\nlast", 3).await;
        assert_eq!(contents(&lines), vec!["first", "last"]);
        assert_eq!(lines[1].line_index, 2);
    }

    #[tokio::test]
    async fn test_empty_file_has_no_lines() {
        assert!(read_all(b"", 8).await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_lines_are_kept() {
        let lines = read_all(b"\n\nx\n", 2).await;
        assert_eq!(contents(&lines), vec!["", "", "x"]);
    }

    #[tokio::test]
    async fn test_round_trip_and_contiguous_indices() {
        let inputs: [&[u8]; 4] = [
            b"alpha\nbeta\ngamma\n",
            b"alpha\r\nbeta\r\ngamma",
            "grüße\n日本語\n🚀 launch\nend".as_bytes(),
            b"single line no newline",
        ];

        for input in inputs {
            let original = String::from_utf8(input.to_vec()).unwrap().replace("\r\n", "\n");
            let expected = original.strip_suffix('\n').unwrap_or(&original);

            for chunk in [1, 2, 5, 7, 1024] {
                let lines = read_all(input, chunk).await;
                let joined = contents(&lines).join("\n");
                assert_eq!(joined, expected, "chunk {}", chunk);

                for (i, line) in lines.iter().enumerate() {
                    assert_eq!(line.line_index, i as u64 + 1);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_invalid_bytes_do_not_abort() {
        let lines = read_all(b"ok\nbad \xff byte\nok again\n", 3).await;
        assert_eq!(contents(&lines), vec!["ok", "bad \u{FFFD} byte", "ok again"]);
    }

    #[tokio::test]
    async fn test_lines_carry_file_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"x\n").unwrap();
        let pool = BufferPool::new(16, 1);
        let mut reader = LineReader::open(file.path(), &pool).await.unwrap();
        let line = reader.next_line().await.unwrap().unwrap();
        assert_eq!(&*line.file_path, file.path());
    }

    #[tokio::test]
    async fn test_open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let pool = BufferPool::new(16, 1);
        assert!(LineReader::open(dir.path().join("nope.log"), &pool).await.is_err());
    }
}

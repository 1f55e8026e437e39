//! Fixed-string search across scanned files
//!
//! The search processor reads each file line by line and reports every line
//! containing the needle as `path:lineno:line`, with line numbers starting
//! at zero. Matching is done on raw bytes, so non-UTF-8 content is searched
//! and printed as-is.
//!
//! All matches funnel through a [`MatchSink`], which owns its own lock
//! around the output stream. That lock is independent of the job queue's,
//! so printing never holds up queue traffic, and tests can inject an
//! in-memory writer instead of stdout.

use crate::error::MillError;
use crate::pool::FileProcessor;
use memchr::memmem;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Serialized destination for match lines
pub struct MatchSink {
    out: Mutex<Box<dyn Write + Send>>,
    matches: AtomicU64,
}

impl MatchSink {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            matches: AtomicU64::new(0),
        }
    }

    /// Sink writing to stdout, buffered; call [`flush`](Self::flush) after
    /// the scan.
    pub fn stdout() -> Self {
        Self::new(Box::new(BufWriter::new(io::stdout())))
    }

    /// Matches recorded so far.
    pub fn match_count(&self) -> u64 {
        self.matches.load(Ordering::Relaxed)
    }

    pub fn flush(&self) -> io::Result<()> {
        self.out.lock().flush()
    }

    /// Write one match as `path:lineno:` followed by the line exactly as
    /// read, trailing newline included when the file had one.
    fn record_match(&self, path: &Path, lineno: u64, line: &[u8]) -> io::Result<()> {
        let mut out = self.out.lock();
        write!(out, "{}:{}:", path.display(), lineno)?;
        out.write_all(line)?;
        self.matches.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Per-file worker logic for the `search` subcommand
pub struct SearchProcessor {
    finder: memmem::Finder<'static>,
    sink: Arc<MatchSink>,
}

impl SearchProcessor {
    /// Precompile the needle; every worker shares the same finder.
    pub fn new(needle: &str, sink: Arc<MatchSink>) -> Self {
        Self {
            finder: memmem::Finder::new(needle.as_bytes()).into_owned(),
            sink,
        }
    }
}

impl FileProcessor for SearchProcessor {
    fn process(&self, path: &Path) -> Result<u64, MillError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut line = Vec::new();
        let mut lineno = 0u64;
        let mut bytes = 0u64;
        loop {
            line.clear();
            let n = reader.read_until(b'\n', &mut line)?;
            if n == 0 {
                break;
            }
            bytes += n as u64;

            if self.finder.find(&line).is_some() {
                self.sink.record_match(path, lineno, &line)?;
            }
            lineno += 1;
        }

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    /// Test writer the sink can own while the test keeps a handle.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> Vec<u8> {
            self.0.lock().clone()
        }
    }

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn create_temp_file(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    fn search_file(content: &[u8], needle: &str) -> (Vec<u8>, u64, u64) {
        let file = create_temp_file(content);
        let buf = SharedBuf::default();
        let sink = Arc::new(MatchSink::new(Box::new(buf.clone())));
        let processor = SearchProcessor::new(needle, Arc::clone(&sink));

        let bytes = processor.process(file.path()).unwrap();
        (buf.contents(), sink.match_count(), bytes)
    }

    #[test]
    fn test_matching_lines_are_reported() {
        let content = b"hello world\nthe needle is here\ngoodbye\n";
        let (out, count, bytes) = search_file(content, "needle");

        assert_eq!(count, 1);
        assert_eq!(bytes, content.len() as u64);

        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with(":1:the needle is here\n"));
    }

    #[test]
    fn test_line_numbers_start_at_zero() {
        let (out, count, _) = search_file(b"needle on the first line\nnothing\n", "needle");

        assert_eq!(count, 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(":0:needle on the first line\n"));
    }

    #[test]
    fn test_empty_needle_matches_every_line() {
        let (_, count, _) = search_file(b"one\ntwo\nthree\n", "");
        assert_eq!(count, 3);
    }

    #[test]
    fn test_non_utf8_content_is_searched_bytewise() {
        let content = b"\xff\xfe needle \xff\n";
        let (out, count, _) = search_file(content, "needle");

        assert_eq!(count, 1);
        assert!(out.ends_with(b":0:\xff\xfe needle \xff\n"));
    }

    #[test]
    fn test_unterminated_last_line_kept_as_is() {
        let (out, count, _) = search_file(b"first\nneedle without newline", "needle");

        assert_eq!(count, 1);
        assert!(out.ends_with(b":1:needle without newline"));
    }

    #[test]
    fn test_no_matches_writes_nothing() {
        let (out, count, bytes) = search_file(b"nothing to see\nhere\n", "needle");

        assert_eq!(count, 0);
        assert!(out.is_empty());
        assert_eq!(bytes, 20);
    }

    #[test]
    fn test_unopenable_file_is_an_error() {
        let sink = Arc::new(MatchSink::new(Box::new(SharedBuf::default())));
        let processor = SearchProcessor::new("x", sink);

        assert!(processor.process(Path::new("/nonexistent/path")).is_err());
    }
}

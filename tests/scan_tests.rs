//! End-to-end scan tests over real directory trees
//!
//! Each test drives the full pipeline: traversal feeding the bounded queue,
//! the worker pool draining it, and the drain-to-completion shutdown. Small
//! queue capacities are used on purpose so backpressure is exercised.

use dirmill::config::{RunConfig, ScanMode};
use dirmill::coordinator::ScanCoordinator;
use dirmill::histogram::{HistogramAccumulator, HistogramProcessor};
use dirmill::search::{MatchSink, SearchProcessor};
use parking_lot::Mutex;
use regex::Regex;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Test writer the sink can own while the test keeps a handle.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().clone()).unwrap()
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

fn write_file(path: &Path, content: &[u8]) {
    let mut f = File::create(path).unwrap();
    f.write_all(content).unwrap();
}

/// alpha.log, beta.log, sub/gamma.log, sub/skipme.tmp, sub/deep/delta.log
fn make_tree(root: &Path) {
    fs::create_dir_all(root.join("sub/deep")).unwrap();
    write_file(&root.join("alpha.log"), b"needle one\nplain\n");
    write_file(&root.join("beta.log"), b"no match here\n");
    write_file(&root.join("sub/gamma.log"), b"another needle\nneedle again\n");
    write_file(&root.join("sub/skipme.tmp"), b"needle hidden\n");
    write_file(&root.join("sub/deep/delta.log"), b"deep needle\n");
}

fn search_config(root: &Path, workers: usize, capacity: usize) -> RunConfig {
    RunConfig {
        mode: ScanMode::Search {
            needle: "needle".to_string(),
        },
        paths: vec![root.to_path_buf()],
        worker_count: workers,
        queue_capacity: capacity,
        max_depth: None,
        exclude_patterns: Vec::new(),
        quiet: true,
        verbose: false,
    }
}

/// Run a search scan and return the report plus the sorted output lines.
fn run_search(config: RunConfig) -> (dirmill::ScanReport, Vec<String>, u64) {
    let needle = match &config.mode {
        ScanMode::Search { needle } => needle.clone(),
        ScanMode::Histogram => unreachable!(),
    };

    let buf = SharedBuf::default();
    let sink = Arc::new(MatchSink::new(Box::new(buf.clone())));
    let processor = Arc::new(SearchProcessor::new(&needle, Arc::clone(&sink)));

    let coordinator = ScanCoordinator::new(config);
    let report = coordinator.run(processor).unwrap();
    sink.flush().unwrap();

    let mut lines: Vec<String> = buf.text().lines().map(str::to_string).collect();
    lines.sort();
    (report, lines, sink.match_count())
}

#[test]
fn test_search_scan_finds_matches_across_tree() {
    let temp = TempDir::new().unwrap();
    make_tree(temp.path());
    let root = temp.path();

    // Capacity 2 with 4 workers keeps the walk blocking and unblocking
    let (report, lines, matches) = run_search(search_config(root, 4, 2));

    assert!(report.completed);
    assert_eq!(report.files_enqueued, 5);
    assert_eq!(report.files_processed, 5);
    assert_eq!(report.process_failures, 0);
    assert_eq!(matches, 5);

    let mut expected = vec![
        format!("{}:0:needle one", root.join("alpha.log").display()),
        format!("{}:0:another needle", root.join("sub/gamma.log").display()),
        format!("{}:1:needle again", root.join("sub/gamma.log").display()),
        format!("{}:0:needle hidden", root.join("sub/skipme.tmp").display()),
        format!("{}:0:deep needle", root.join("sub/deep/delta.log").display()),
    ];
    expected.sort();
    assert_eq!(lines, expected);
}

#[test]
fn test_exclude_filter_applies_to_whole_pipeline() {
    let temp = TempDir::new().unwrap();
    make_tree(temp.path());

    let mut config = search_config(temp.path(), 2, 4);
    config.exclude_patterns = vec![Regex::new(r"\.tmp$").unwrap()];

    let (report, _, matches) = run_search(config);

    assert_eq!(report.files_processed, 4);
    assert_eq!(report.skipped, 1);
    assert_eq!(matches, 4);
}

#[test]
fn test_depth_limit_bounds_the_scan() {
    let temp = TempDir::new().unwrap();
    make_tree(temp.path());

    let mut config = search_config(temp.path(), 2, 4);
    config.max_depth = Some(1);

    let (report, lines, _) = run_search(config);

    // sub/ is entered, sub/deep/ is pruned
    assert_eq!(report.files_processed, 4);
    assert_eq!(report.skipped, 1);
    assert!(lines.iter().all(|line| !line.contains("delta.log")));
}

#[test]
fn test_histogram_scan_accumulates_exact_bins() {
    let temp = TempDir::new().unwrap();
    write_file(&temp.path().join("ones.bin"), &[0xFF; 3]);
    write_file(&temp.path().join("low.bin"), &[0x01; 5]);

    let config = RunConfig {
        mode: ScanMode::Histogram,
        paths: vec![temp.path().to_path_buf()],
        worker_count: 2,
        queue_capacity: 2,
        max_depth: None,
        exclude_patterns: Vec::new(),
        quiet: true,
        verbose: false,
    };

    let accumulator = Arc::new(HistogramAccumulator::new());
    let processor = Arc::new(HistogramProcessor::new(Arc::clone(&accumulator), None));

    let report = ScanCoordinator::new(config).run(processor).unwrap();
    let snapshot = accumulator.snapshot();

    assert!(report.completed);
    assert_eq!(report.bytes_processed, 8);
    assert_eq!(snapshot.total_bytes, 8);

    // 0xFF sets every bit, 0x01 only bit zero
    assert_eq!(snapshot.bins, [8, 3, 3, 3, 3, 3, 3, 3]);
}

#[cfg(unix)]
#[test]
fn test_broken_symlink_is_counted_not_fatal() {
    let temp = TempDir::new().unwrap();
    write_file(&temp.path().join("real.log"), b"needle\n");
    std::os::unix::fs::symlink(
        temp.path().join("missing.log"),
        temp.path().join("dangling.log"),
    )
    .unwrap();

    let (report, _, matches) = run_search(search_config(temp.path(), 2, 4));

    assert!(report.completed);
    assert_eq!(report.files_processed, 1);
    assert_eq!(report.walk_errors, 1);
    assert_eq!(matches, 1);
}

#[cfg(unix)]
#[test]
fn test_symlinked_file_is_scanned_through_link() {
    let temp = TempDir::new().unwrap();
    write_file(&temp.path().join("real.log"), b"needle\n");
    std::os::unix::fs::symlink(temp.path().join("real.log"), temp.path().join("link.log"))
        .unwrap();

    let (report, _, matches) = run_search(search_config(temp.path(), 2, 4));

    // The link is followed, so the content is seen twice
    assert_eq!(report.files_processed, 2);
    assert_eq!(matches, 2);
}

#[test]
fn test_multiple_roots_are_all_scanned() {
    let temp_a = TempDir::new().unwrap();
    let temp_b = TempDir::new().unwrap();
    write_file(&temp_a.path().join("a.log"), b"needle a\n");
    write_file(&temp_b.path().join("b.log"), b"needle b\n");

    let mut config = search_config(temp_a.path(), 2, 4);
    config.paths = vec![temp_a.path().to_path_buf(), temp_b.path().to_path_buf()];

    let (report, _, matches) = run_search(config);

    assert_eq!(report.files_processed, 2);
    assert_eq!(matches, 2);
}

#[test]
fn test_file_root_scans_just_that_file() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("only.log");
    write_file(&file, b"needle\nneedle\n");

    let config = RunConfig {
        paths: vec![PathBuf::from(&file)],
        ..search_config(temp.path(), 1, 4)
    };

    let (report, lines, matches) = run_search(config);

    assert_eq!(report.files_enqueued, 1);
    assert_eq!(matches, 2);
    assert_eq!(lines[0], format!("{}:0:needle", file.display()));
    assert_eq!(lines[1], format!("{}:1:needle", file.display()));
}

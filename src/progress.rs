//! Console output for scans
//!
//! Provides the styled header and summary blocks plus the live histogram
//! display. The live view draws to stderr through indicatif; scan results
//! (match lines, the final histogram) go to stdout, so piping output works.

use crate::coordinator::ScanReport;
use crate::histogram::{HistogramSnapshot, BIN_COUNT};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use parking_lot::Mutex;

/// Width of a fully scaled histogram bar, live and final
const BAR_WIDTH: usize = 40;

/// Live histogram display, eight bars plus a byte counter
///
/// Refreshes are monotonic: a snapshot older than the one already on
/// screen is dropped, so racing workers cannot roll the display backwards.
pub struct HistogramView {
    bars: Vec<ProgressBar>,
    bytes_line: ProgressBar,
    last_total: Mutex<u64>,
    multi: MultiProgress,
}

impl HistogramView {
    pub fn new() -> Self {
        let multi = MultiProgress::new();

        let bar_style = ProgressStyle::with_template("  {prefix:.bold} [{bar:40.cyan/blue}] {human_pos}")
            .expect("Invalid histogram bar template");

        let bars: Vec<ProgressBar> = (0..BIN_COUNT)
            .map(|bit| {
                let bar = multi.add(ProgressBar::new(1));
                bar.set_style(bar_style.clone());
                bar.set_prefix(format!("bit {}", bit));
                bar
            })
            .collect();

        let bytes_line = multi.add(ProgressBar::new_spinner());
        bytes_line.set_style(
            ProgressStyle::with_template("  {msg}").expect("Invalid byte counter template"),
        );

        let view = Self {
            bars,
            bytes_line,
            last_total: Mutex::new(0),
            multi,
        };
        view.render(&HistogramSnapshot::default());
        view
    }

    /// Draw a snapshot, scaling every bar against the largest bin.
    pub fn render(&self, snapshot: &HistogramSnapshot) {
        let mut last = self.last_total.lock();
        if snapshot.total_bytes < *last {
            return;
        }
        *last = snapshot.total_bytes;

        let scale = snapshot.max_bin().max(1);
        for (bin, bar) in snapshot.bins.iter().zip(&self.bars) {
            bar.set_length(scale);
            bar.set_position(*bin);
        }
        self.bytes_line
            .set_message(format!("{} processed", format_size(snapshot.total_bytes, BINARY)));
    }

    /// Remove the live display; the final histogram is printed separately.
    pub fn finish_and_clear(&self) {
        for bar in &self.bars {
            bar.finish_and_clear();
        }
        self.bytes_line.finish_and_clear();
        let _ = self.multi.clear();
    }
}

impl Default for HistogramView {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| {
            chunk
                .iter()
                .rev()
                .map(|&b| b as char)
                .collect::<String>()
        })
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Cells of a `width`-wide bar that `value` fills relative to `max`
fn scaled_width(value: u64, max: u64, width: usize) -> usize {
    if max == 0 {
        return 0;
    }
    ((value as u128 * width as u128) / max as u128) as usize
}

/// Print a header at the start of a scan
pub fn print_header(mode: &str, paths: &str, workers: usize, queue_capacity: usize) {
    println!();
    println!(
        "{} {}",
        style("dirmill").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Mode:").bold(), mode);
    println!("  {} {}", style("Paths:").bold(), paths);
    println!("  {} {}", style("Workers:").bold(), workers);
    println!("  {} {}", style("Queue:").bold(), queue_capacity);
    println!();
}

/// Print a summary of the scan results
pub fn print_summary(report: &ScanReport) {
    let duration_secs = report.duration.as_secs_f64();

    println!();
    if report.completed {
        println!("{}", style("Scan Complete").green().bold());
    } else {
        println!("{}", style("Scan Interrupted").yellow().bold());
    }
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Files:").bold(),
        format_number(report.files_processed)
    );
    println!(
        "  {} {}",
        style("Data:").bold(),
        format_size(report.bytes_processed, BINARY)
    );
    println!(
        "  {} {:.1}s ({:.0} files/sec)",
        style("Duration:").bold(),
        duration_secs,
        report.files_per_second()
    );
    if report.process_failures > 0 {
        println!(
            "  {} {}",
            style("Failed files:").yellow().bold(),
            format_number(report.process_failures)
        );
    }
    if report.walk_errors > 0 {
        println!(
            "  {} {}",
            style("Walk errors:").yellow().bold(),
            format_number(report.walk_errors)
        );
    }
    if report.skipped > 0 {
        println!(
            "  {} {}",
            style("Skipped:").bold(),
            format_number(report.skipped)
        );
    }
    println!();
}

/// Print the match total for a search scan
pub fn print_search_total(matches: u64) {
    println!(
        "  {} {}",
        style("Matches:").bold(),
        format_number(matches)
    );
}

/// Print the final histogram to stdout, left visible like the summary
pub fn print_final_histogram(snapshot: &HistogramSnapshot) {
    let scale = snapshot.max_bin();

    println!();
    println!(
        "{} ({} processed)",
        style("Bit Histogram").cyan().bold(),
        format_size(snapshot.total_bytes, BINARY)
    );
    println!("{}", style("─".repeat(50)).dim());
    for (bit, &count) in snapshot.bins.iter().enumerate() {
        let filled = scaled_width(count, scale, BAR_WIDTH);
        let bar: String = "█".repeat(filled) + &" ".repeat(BAR_WIDTH - filled);
        println!(
            "  {} [{}] {}",
            style(format!("bit {}", bit)).bold(),
            style(bar).cyan(),
            format_number(count)
        );
    }
    println!();
}

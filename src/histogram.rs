//! Bit-frequency histogram over scanned file bytes
//!
//! For every payload byte, each of the eight bit positions that is set
//! increments its bin. Workers accumulate into a thread-local histogram and
//! fold it into the shared accumulator only after a batch of unmerged bytes
//! (and once more at end of file), so the shared lock is touched a few
//! times per file instead of once per block.
//!
//! The accumulator also paces the live display: folding a batch in reports
//! back when enough new bytes have arrived since the last refresh, and the
//! worker then hands a consistent snapshot to the view.

use crate::error::MillError;
use crate::pool::FileProcessor;
use crate::progress::HistogramView;
use parking_lot::Mutex;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// One bin per bit position in a byte
pub const BIN_COUNT: usize = 8;

/// Read block size
const READ_BUF_SIZE: usize = 8192;

/// Unmerged local bytes that trigger a fold into the shared accumulator
const MERGE_THRESHOLD: u64 = 32 * 1024;

/// New merged bytes between live display refreshes
const DISPLAY_STEP_BYTES: u64 = 100_000;

/// Consistent copy of the shared totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistogramSnapshot {
    /// Set-bit count per bit position
    pub bins: [u64; BIN_COUNT],

    /// Payload bytes merged so far
    pub total_bytes: u64,
}

impl HistogramSnapshot {
    /// Largest bin value, used to scale the display bars.
    pub fn max_bin(&self) -> u64 {
        self.bins.iter().copied().max().unwrap_or(0)
    }
}

struct HistogramState {
    bins: [u64; BIN_COUNT],
    total_bytes: u64,
    last_display_bytes: u64,
}

/// Shared accumulator, one per scan
///
/// An explicit object with its own lock; nothing here is process-global,
/// so two scans in one process cannot bleed into each other.
pub struct HistogramAccumulator {
    state: Mutex<HistogramState>,
}

impl HistogramAccumulator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HistogramState {
                bins: [0; BIN_COUNT],
                total_bytes: 0,
                last_display_bytes: 0,
            }),
        }
    }

    /// Fold a local batch into the shared totals.
    ///
    /// Returns a snapshot when at least [`DISPLAY_STEP_BYTES`] have been
    /// merged since the last snapshot was handed out, which is the caller's
    /// cue to refresh the live display.
    fn absorb(&self, bins: &[u64; BIN_COUNT], bytes: u64) -> Option<HistogramSnapshot> {
        let mut state = self.state.lock();

        for (total, add) in state.bins.iter_mut().zip(bins) {
            *total += add;
        }
        state.total_bytes += bytes;

        if state.total_bytes - state.last_display_bytes >= DISPLAY_STEP_BYTES {
            state.last_display_bytes = state.total_bytes;
            Some(HistogramSnapshot {
                bins: state.bins,
                total_bytes: state.total_bytes,
            })
        } else {
            None
        }
    }

    /// Consistent copy of the current totals.
    pub fn snapshot(&self) -> HistogramSnapshot {
        let state = self.state.lock();
        HistogramSnapshot {
            bins: state.bins,
            total_bytes: state.total_bytes,
        }
    }
}

impl Default for HistogramAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Count the set bits of every byte in `block` into `bins`.
fn count_bits(block: &[u8], bins: &mut [u64; BIN_COUNT]) {
    for &byte in block {
        for (bit, bin) in bins.iter_mut().enumerate() {
            *bin += u64::from((byte >> bit) & 1);
        }
    }
}

/// Per-file worker logic for the `histogram` subcommand
pub struct HistogramProcessor {
    accumulator: Arc<HistogramAccumulator>,
    view: Option<Arc<HistogramView>>,
}

impl HistogramProcessor {
    /// `view` is `None` in quiet mode; the accumulator still advances its
    /// display cadence, there is just nobody to hand snapshots to.
    pub fn new(accumulator: Arc<HistogramAccumulator>, view: Option<Arc<HistogramView>>) -> Self {
        Self { accumulator, view }
    }

    fn merge_batch(&self, bins: &mut [u64; BIN_COUNT], pending: &mut u64) {
        if let Some(snapshot) = self.accumulator.absorb(bins, *pending) {
            if let Some(view) = &self.view {
                view.render(&snapshot);
            }
        }
        *bins = [0; BIN_COUNT];
        *pending = 0;
    }
}

impl FileProcessor for HistogramProcessor {
    fn process(&self, path: &Path) -> Result<u64, MillError> {
        let mut file = File::open(path)?;

        let mut bins = [0u64; BIN_COUNT];
        let mut pending = 0u64;
        let mut file_bytes = 0u64;

        let mut buf = [0u8; READ_BUF_SIZE];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }

            count_bits(&buf[..n], &mut bins);
            pending += n as u64;
            file_bytes += n as u64;

            if pending >= MERGE_THRESHOLD {
                self.merge_batch(&mut bins, &mut pending);
            }
        }

        // Leftovers below the threshold still count.
        self.merge_batch(&mut bins, &mut pending);

        Ok(file_bytes)
    }
}

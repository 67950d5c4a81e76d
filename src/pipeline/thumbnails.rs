//! Batched hand-off of finished thumbnails from decoder threads.
//!
//! Workers append results under a single mutex; the interaction thread
//! drains them only once a full batch (or the last result of a run) is
//! available. Fewer, larger flushes mean fewer redraw notifications while a
//! folder of a few hundred images loads, at the price of thumbnails
//! appearing in groups rather than one at a time.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::canvas::{Bitmap, ItemId};
use crate::geometry::Size;

/// A finished thumbnail decode.
#[derive(Debug)]
pub struct ThumbnailUpdate {
    pub id: ItemId,
    /// Bitmap and the base size derived from it, or the failure message.
    pub result: Result<(Bitmap, Size), String>,
}

/// Progress of the current thumbnail run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThumbnailProgress {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
}

impl ThumbnailProgress {
    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

#[derive(Debug, Default)]
struct BatchState {
    /// Identifies the current run; results tagged with older epochs are dropped.
    epoch: u64,
    pending: Vec<ThumbnailUpdate>,
    progress: ThumbnailProgress,
}

/// Pending thumbnail results shared between decoder threads and the UI thread.
#[derive(Debug)]
pub struct ThumbnailBatch {
    batch_size: usize,
    state: Mutex<BatchState>,
}

impl ThumbnailBatch {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            state: Mutex::new(BatchState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BatchState> {
        // A panicking worker cannot leave the buffer half-written
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new run of `total` decodes, discarding anything pending.
    ///
    /// Returns the epoch that this run's results must carry.
    pub fn begin(&self, total: usize) -> u64 {
        let mut state = self.lock();
        state.epoch += 1;
        state.pending.clear();
        state.progress = ThumbnailProgress {
            total,
            ..ThumbnailProgress::default()
        };
        state.epoch
    }

    /// Whether `epoch` is still the current run.
    pub fn is_current(&self, epoch: u64) -> bool {
        self.lock().epoch == epoch
    }

    /// Record a finished decode. Results from an older run are dropped.
    pub fn push(&self, epoch: u64, update: ThumbnailUpdate) -> bool {
        let mut state = self.lock();
        if state.epoch != epoch {
            return false;
        }
        state.progress.completed += 1;
        if update.result.is_err() {
            state.progress.failed += 1;
        }
        state.pending.push(update);
        true
    }

    /// Drain pending results if a full batch is ready or the run has finished.
    pub fn take_ready(&self) -> Option<Vec<ThumbnailUpdate>> {
        let mut state = self.lock();
        let ready = state.pending.len() >= self.batch_size
            || (state.progress.is_done() && !state.pending.is_empty());
        ready.then(|| std::mem::take(&mut state.pending))
    }

    pub fn progress(&self) -> ThumbnailProgress {
        self.lock().progress
    }
}

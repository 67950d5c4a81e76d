//! Background threads for image decoding.
//!
//! A fixed number of threads share one request queue, which bounds how many
//! decodes run at once. Results never touch canvas state directly: thumbnails
//! go into the shared [`ThumbnailBatch`], full-resolution images into a
//! channel drained by the interaction thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use super::codec::ImageCodec;
use super::thumbnails::{ThumbnailBatch, ThumbnailUpdate};
use crate::canvas::{Bitmap, ItemId};
use crate::constants::ITEM_LONG_SIDE;
use crate::error::DecodeError;
use crate::project::FileRef;

/// Work item for a decoder thread.
#[derive(Debug, Clone)]
pub enum DecodeJob {
    /// Decode a thumbnail for the run identified by `epoch`.
    Thumbnail {
        epoch: u64,
        id: ItemId,
        file: FileRef,
        max_size: u32,
    },
    /// Decode the full-resolution image.
    Full { id: ItemId, file: FileRef },
}

/// Result of a full-resolution decode.
#[derive(Debug)]
pub struct FullImageResult {
    pub id: ItemId,
    pub result: Result<Bitmap, String>,
}

/// Message sent to the decoder threads.
enum ThreadMessage {
    /// Decode an image
    Decode(DecodeJob),
    /// Stop the receiving thread
    Shutdown,
}

/// Where decoder threads deliver their results.
#[derive(Clone)]
struct DecodeSink {
    codec: Arc<dyn ImageCodec>,
    batch: Arc<ThumbnailBatch>,
    full_tx: Sender<FullImageResult>,
    shutting_down: Arc<AtomicBool>,
}

/// Pool of decoder threads.
pub struct DecoderPool {
    /// Sender for requests to the background threads
    request_tx: Sender<ThreadMessage>,
    /// Handles to the background threads (for joining on drop)
    handles: Vec<JoinHandle<()>>,
    shutting_down: Arc<AtomicBool>,
}

impl DecoderPool {
    /// Spawn `threads` decoder threads (at least one).
    ///
    /// Returns the pool and the receiver for full-resolution results.
    pub fn spawn(
        threads: usize,
        codec: Arc<dyn ImageCodec>,
        batch: Arc<ThumbnailBatch>,
    ) -> std::io::Result<(Self, Receiver<FullImageResult>)> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (full_tx, full_rx) = mpsc::channel::<FullImageResult>();
        let request_rx = Arc::new(Mutex::new(request_rx));
        let shutting_down = Arc::new(AtomicBool::new(false));

        let sink = DecodeSink {
            codec,
            batch,
            full_tx,
            shutting_down: shutting_down.clone(),
        };

        let mut handles = Vec::new();
        for index in 0..threads.max(1) {
            let request_rx = request_rx.clone();
            let sink = sink.clone();
            let handle = thread::Builder::new()
                .name(format!("image-decoder-{index}"))
                .spawn(move || {
                    log::debug!("Decoder thread {} started", index);
                    Self::thread_loop(&request_rx, &sink);
                    log::debug!("Decoder thread {} exiting", index);
                })?;
            handles.push(handle);
        }

        log::info!("Spawned {} decoder threads", handles.len());

        Ok((
            Self {
                request_tx,
                handles,
                shutting_down,
            },
            full_rx,
        ))
    }

    /// Background thread main loop.
    fn thread_loop(request_rx: &Mutex<Receiver<ThreadMessage>>, sink: &DecodeSink) {
        loop {
            // Hold the lock only while waiting for the next message
            let message = request_rx
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .recv();

            match message {
                Ok(ThreadMessage::Decode(job)) => {
                    if sink.shutting_down.load(Ordering::Relaxed) {
                        continue;
                    }
                    if !Self::run_job(job, sink) {
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) | Err(_) => break,
            }
        }
    }

    /// Decode one job and deliver it. Returns `false` if the result channel is gone.
    fn run_job(job: DecodeJob, sink: &DecodeSink) -> bool {
        match job {
            DecodeJob::Thumbnail {
                epoch,
                id,
                file,
                max_size,
            } => {
                if !sink.batch.is_current(epoch) {
                    log::trace!("Skipping stale thumbnail job for {}", file.name());
                    return true;
                }
                let result = sink
                    .codec
                    .decode_thumbnail(&file, (max_size, max_size))
                    .and_then(|bitmap| {
                        let size = bitmap
                            .size()
                            .fit_long_side(ITEM_LONG_SIDE)
                            .ok_or(DecodeError::Empty)?;
                        Ok((bitmap, size))
                    })
                    .map_err(|e| {
                        log::debug!("Thumbnail decode failed for {:?}: {}", file, e);
                        e.to_string()
                    });
                sink.batch.push(epoch, ThumbnailUpdate { id, result });
                true
            }
            DecodeJob::Full { id, file } => {
                let result = sink.codec.decode_full(&file).map_err(|e| {
                    log::debug!("Full decode failed for {:?}: {}", file, e);
                    e.to_string()
                });
                if sink.full_tx.send(FullImageResult { id, result }).is_err() {
                    log::warn!("Result channel closed, decoder thread exiting");
                    return false;
                }
                true
            }
        }
    }

    /// Queue a job. Returns `false` if the threads are gone.
    pub fn submit(&self, job: DecodeJob) -> bool {
        if self.request_tx.send(ThreadMessage::Decode(job)).is_err() {
            log::error!("Failed to send decode request: channel closed");
            return false;
        }
        true
    }

    pub fn thread_count(&self) -> usize {
        self.handles.len()
    }
}

impl Drop for DecoderPool {
    fn drop(&mut self) {
        log::debug!("Shutting down {} decoder threads", self.handles.len());

        // Queued jobs are skipped, running decodes finish
        self.shutting_down.store(true, Ordering::Relaxed);
        for _ in &self.handles {
            let _ = self.request_tx.send(ThreadMessage::Shutdown);
        }

        for handle in self.handles.drain(..) {
            if let Err(e) = handle.join() {
                log::warn!("Decoder thread panicked: {:?}", e);
            }
        }
    }
}

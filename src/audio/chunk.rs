//! Single-producer/single-consumer buffering between the capture callback and
//! the STT worker.
//!
//! The producer side runs inside the audio subsystem's callback and must never
//! block: a full buffer drops the chunk and bumps a counter instead of
//! stalling the stream.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One block of interleaved samples produced by a single capture callback
/// invocation. Ownership transfers to the consumer on pop; a popped chunk is
/// never re-queued.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl AudioChunk {
    /// Number of frames (one sample per channel) in the chunk.
    pub fn frames(&self) -> usize {
        let channels = usize::from(self.channels.max(1));
        self.samples.len() / channels
    }
}

/// FIFO of captured chunks. Push and pop are both non-blocking; the queue
/// itself provides all the synchronization the producer/consumer pair needs.
#[derive(Debug, Clone)]
pub struct ChunkBuffer {
    tx: Sender<AudioChunk>,
    rx: Receiver<AudioChunk>,
    dropped: Arc<AtomicUsize>,
}

impl ChunkBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self {
            tx,
            rx,
            dropped: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle for the capture callback. `Send + Clone`, never blocks.
    pub fn producer(&self) -> ChunkProducer {
        ChunkProducer {
            tx: self.tx.clone(),
            dropped: self.dropped.clone(),
        }
    }

    /// Pop the oldest chunk, or `None` when the buffer is empty.
    pub fn try_pop(&self) -> Option<AudioChunk> {
        self.rx.try_recv().ok()
    }

    /// Remove and discard every queued chunk. Used only during stop; leaves
    /// the buffer empty.
    pub fn drain(&self) -> usize {
        let mut removed = 0;
        while self.rx.try_recv().is_ok() {
            removed += 1;
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Chunks discarded because the buffer was full. A warning condition, not
    /// an error.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Producer half of a [`ChunkBuffer`].
#[derive(Debug, Clone)]
pub struct ChunkProducer {
    tx: Sender<AudioChunk>,
    dropped: Arc<AtomicUsize>,
}

impl ChunkProducer {
    /// Push without blocking. Returns `false` when the chunk was dropped
    /// (buffer full or consumer gone); full-buffer drops increment the shared
    /// drop counter.
    pub fn push(&self, chunk: AudioChunk) -> bool {
        match self.tx.try_send(chunk) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

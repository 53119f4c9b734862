//! Session lifecycle: worker state tracking and the capture-to-text session
//! facade that wires the two workers together.

use crate::audio::capture::{CaptureConfig, CaptureWorker};
use crate::audio::chunk::ChunkBuffer;
use crate::audio::device::{classify_loopback, DeviceCatalog};
use crate::error::PipelineError;
use crate::events::{EventReceiver, EventSender};
use crate::pipeline::{SttConfig, SttWorker};
use crate::stt::TranscriptionEngine;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Lifecycle of a worker thread. `Failed` is absorbing: once a worker fails
/// it never resumes, and stopping a failed worker leaves it `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    Idle = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
    Failed = 4,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Stopping,
            3 => Self::Stopped,
            4 => Self::Failed,
            _ => Self::Idle,
        }
    }
}

/// Worker state shared between the owning handle and the worker thread.
#[derive(Debug, Clone)]
pub(crate) struct SharedState(Arc<AtomicU8>);

impl SharedState {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicU8::new(WorkerState::Idle as u8)))
    }

    pub(crate) fn get(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: WorkerState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Move to `Failed` unconditionally.
    pub(crate) fn fail(&self) {
        self.set(WorkerState::Failed);
    }

    /// Finish a shutdown: `Failed` stays `Failed`, everything else becomes
    /// `Stopped`.
    pub(crate) fn settle(&self) {
        if self.get() != WorkerState::Failed {
            self.set(WorkerState::Stopped);
        }
    }
}

/// Everything a session needs to run: which device, how to capture, and how
/// to transcribe.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Explicit device name. `None` runs loopback classification.
    pub input_device: Option<String>,
    pub capture_sample_rate: u32,
    pub capture_channels: u16,
    pub capture_block_size: u32,
    pub idle_poll: Duration,
    /// Chunk buffer capacity between the workers.
    pub chunk_capacity: usize,
    pub loopback_keywords: Vec<String>,
    pub stt: SttConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            input_device: None,
            capture_sample_rate: 44_100,
            capture_channels: 2,
            capture_block_size: 1_024,
            idle_poll: Duration::from_millis(100),
            chunk_capacity: 256,
            loopback_keywords: Vec::new(),
            stt: SttConfig::default(),
        }
    }
}

/// A running capture-to-text session. Owns both workers; `stop` shuts them
/// down in pipeline order and is idempotent.
pub struct CaptureSession {
    capture: CaptureWorker,
    stt: SttWorker,
}

impl CaptureSession {
    /// Resolve a device, wire the buffer and event channel, and start both
    /// workers. Fails up front when no usable device can be resolved.
    pub fn start(
        config: SessionConfig,
        engine: Arc<dyn TranscriptionEngine>,
    ) -> Result<(Self, EventReceiver), PipelineError> {
        let catalog = DeviceCatalog::enumerate()?;
        let device_index = resolve_device(&catalog, &config)?;
        info!(device_index, "starting capture session");

        let buffer = ChunkBuffer::with_capacity(config.chunk_capacity);
        let (events, receiver) = EventSender::channel();

        let capture = CaptureWorker::start(
            CaptureConfig {
                device_index,
                sample_rate: config.capture_sample_rate,
                channels: config.capture_channels,
                block_size: config.capture_block_size,
                idle_poll: config.idle_poll,
            },
            buffer.clone(),
            events.clone(),
        )?;
        let stt = SttWorker::start(config.stt, buffer, engine, events);

        Ok((Self { capture, stt }, receiver))
    }

    pub fn capture_state(&self) -> WorkerState {
        self.capture.state()
    }

    pub fn stt_state(&self) -> WorkerState {
        self.stt.state()
    }

    /// Audio blocks discarded because the buffer was full.
    pub fn dropped_chunks(&self) -> usize {
        self.capture.dropped_chunks()
    }

    /// Stop the producer first so no new chunks arrive, then the consumer.
    pub fn stop(&mut self) {
        self.capture.stop();
        self.stt.stop();
        debug!("capture session stopped");
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn resolve_device(catalog: &DeviceCatalog, config: &SessionConfig) -> Result<usize, PipelineError> {
    if let Some(name) = &config.input_device {
        return catalog
            .find_by_name(name)
            .map(|d| d.index)
            .ok_or_else(|| {
                PipelineError::DeviceUnavailable(format!("no input device matching '{name}'"))
            });
    }
    classify_loopback(catalog.descriptors(), &config.loopback_keywords).ok_or_else(|| {
        PipelineError::DeviceUnavailable(
            "no loopback capture device found; name one explicitly".to_string(),
        )
    })
}

//! Capture worker: owns the hardware input stream for one session.
//!
//! The cpal callback copies each block into an [`AudioChunk`] and pushes it
//! without blocking; a full buffer drops the block rather than stalling the
//! audio subsystem. The worker thread itself only parks in short sleeps to
//! keep the stream alive; all data movement happens in the callback.

use super::chunk::{AudioChunk, ChunkBuffer, ChunkProducer};
use super::device::open_device;
use crate::error::PipelineError;
use crate::events::{ErrorSource, EventSender};
use crate::session::{SharedState, WorkerState};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Stream parameters for one capture session.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Index into the [`super::DeviceCatalog`] snapshot.
    pub device_index: usize,
    pub sample_rate: u32,
    pub channels: u16,
    /// Frames delivered per callback invocation.
    pub block_size: u32,
    /// Sleep between liveness checks of the parked worker thread.
    pub idle_poll: Duration,
}

/// Producer half of the pipeline. One instance per capture session; `start`
/// opens the stream exactly once and `stop` is idempotent and callable from
/// any thread.
pub struct CaptureWorker {
    state: SharedState,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    buffer: ChunkBuffer,
}

impl CaptureWorker {
    /// Spawn the capture thread. Device-open failures inside the thread are
    /// reported as `Error` events with the `device` source and move the
    /// session to `Failed`; the worker never restarts itself.
    pub fn start(
        config: CaptureConfig,
        buffer: ChunkBuffer,
        events: EventSender,
    ) -> Result<Self, PipelineError> {
        let state = SharedState::new();
        state.set(WorkerState::Running);
        let running = Arc::new(AtomicBool::new(true));

        let thread_state = state.clone();
        let thread_running = running.clone();
        let producer = buffer.producer();
        let handle = thread::spawn(move || {
            run_capture(config, producer, events, thread_state, thread_running);
        });

        Ok(Self {
            state,
            running,
            handle: Some(handle),
            buffer,
        })
    }

    pub fn state(&self) -> WorkerState {
        self.state.get()
    }

    /// Chunks dropped because the buffer was full.
    pub fn dropped_chunks(&self) -> usize {
        self.buffer.dropped()
    }

    /// Close the stream, join the thread, and drain the buffer to empty.
    /// A `Failed` session stays `Failed`; otherwise the state ends `Stopped`.
    pub fn stop(&mut self) {
        if self.state.get() == WorkerState::Running {
            self.state.set(WorkerState::Stopping);
        }
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let drained = self.buffer.drain();
        if drained > 0 {
            debug!(drained, "discarded buffered chunks on stop");
        }
        self.state.settle();
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_capture(
    config: CaptureConfig,
    producer: ChunkProducer,
    events: EventSender,
    state: SharedState,
    running: Arc<AtomicBool>,
) {
    let stream = match open_stream(&config, producer.clone(), events.clone(), state.clone()) {
        Ok(stream) => stream,
        Err(err) => {
            events.error(ErrorSource::Device, err.to_string());
            state.fail();
            return;
        }
    };
    if let Err(err) = stream.play() {
        events.error(
            ErrorSource::Device,
            PipelineError::DeviceUnavailable(err.to_string()).to_string(),
        );
        state.fail();
        return;
    }
    debug!(
        device = config.device_index,
        rate = config.sample_rate,
        channels = config.channels,
        "capture stream running"
    );

    // Park here while the callback does the work; wake up only to check for
    // stop requests and to surface drop-counter growth.
    let mut reported_drops = 0usize;
    while running.load(Ordering::Relaxed) && state.get() == WorkerState::Running {
        thread::sleep(config.idle_poll);
        let dropped = producer.dropped();
        if dropped > reported_drops {
            warn!(dropped, "chunk buffer full; audio blocks dropped");
            reported_drops = dropped;
        }
    }

    if let Err(err) = stream.pause() {
        debug!(%err, "failed to pause capture stream");
    }
    drop(stream);
    debug!("capture stream closed");
}

fn open_stream(
    config: &CaptureConfig,
    producer: ChunkProducer,
    events: EventSender,
    state: SharedState,
) -> Result<cpal::Stream, PipelineError> {
    let device = open_device(config.device_index)?;
    let device_name = device
        .name()
        .unwrap_or_else(|_| "Unknown Device".to_string());
    let format = device
        .default_input_config()
        .map_err(|e| {
            PipelineError::DeviceUnavailable(format!("'{device_name}' has no input config: {e}"))
        })?
        .sample_format();

    let channels = config.channels.max(1);
    let sample_rate = config.sample_rate;
    let stream_config = StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Fixed(config.block_size),
    };

    // Normalize every supported device format to f32 inside the callback so
    // the rest of the pipeline is format-agnostic.
    let built = match format {
        SampleFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                push_block(&producer, data, channels, sample_rate, |s| s);
            },
            stream_err_fn(events, state),
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                push_block(&producer, data, channels, sample_rate, |s| {
                    s as f32 / 32_768.0
                });
            },
            stream_err_fn(events, state),
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            &stream_config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                push_block(&producer, data, channels, sample_rate, |s| {
                    (s as f32 - 32_768.0) / 32_768.0
                });
            },
            stream_err_fn(events, state),
            None,
        ),
        other => {
            return Err(PipelineError::DeviceUnavailable(format!(
                "'{device_name}': unsupported sample format {other:?}"
            )))
        }
    };

    built.map_err(|e| {
        PipelineError::DeviceUnavailable(format!(
            "failed to open input stream on '{device_name}': {e}"
        ))
    })
}

/// Copy one callback block into a chunk and push it. Runs on the audio
/// subsystem's thread; must never block or panic.
fn push_block<T, F>(
    producer: &ChunkProducer,
    data: &[T],
    channels: u16,
    sample_rate: u32,
    convert: F,
) where
    T: Copy,
    F: Fn(T) -> f32,
{
    let mut samples = Vec::with_capacity(data.len());
    samples.extend(data.iter().copied().map(convert));
    let _ = producer.push(AudioChunk {
        samples,
        channels,
        sample_rate,
    });
}

fn stream_err_fn(
    events: EventSender,
    state: SharedState,
) -> impl FnMut(cpal::StreamError) + Send + 'static {
    move |err| {
        events.error(
            ErrorSource::Capture,
            PipelineError::StreamFault(err.to_string()).to_string(),
        );
        state.fail();
    }
}

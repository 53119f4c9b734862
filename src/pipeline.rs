//! Streaming transcription worker.
//!
//! Consumes chunks from the capture buffer, accumulates roughly two seconds
//! of audio, preprocesses the window (downmix, resample), and hands it to the
//! [`TranscriptionEngine`]. Recognized text is published as events; a failed
//! window is reported and the loop moves on to the next one.

use crate::audio::chunk::{AudioChunk, ChunkBuffer};
use crate::audio::downmix::downmix_to_mono;
use crate::audio::resample::resample;
use crate::error::PipelineError;
use crate::events::{ErrorSource, EventSender};
use crate::session::{SharedState, WorkerState};
use crate::stt::{TranscribeOptions, TranscriptionEngine};
use anyhow::Result;
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Tuning for the accumulate/transcribe loop.
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// Rate the capture stream runs at.
    pub capture_sample_rate: u32,
    /// Rate the engine expects; windows are resampled to this.
    pub target_sample_rate: u32,
    /// Seconds of audio per transcription window.
    pub window_secs: f32,
    /// Slack subtracted from the threshold so float accumulation error never
    /// stalls a window at 1.999 seconds.
    pub window_epsilon_secs: f32,
    /// Sleep between buffer polls.
    pub poll_interval: Duration,
    /// Windows shorter than this (after downmix, before resampling) are
    /// discarded instead of transcribed.
    pub min_window_secs: f32,
    pub options: TranscribeOptions,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            capture_sample_rate: 44_100,
            target_sample_rate: 16_000,
            window_secs: 2.0,
            window_epsilon_secs: 0.01,
            poll_interval: Duration::from_millis(10),
            min_window_secs: 0.1,
            options: TranscribeOptions::default(),
        }
    }
}

/// Chunks gathered toward the next transcription window. Duration counts
/// frames, so channel count does not distort it.
struct AccumulationWindow {
    chunks: Vec<AudioChunk>,
    total_frames: usize,
}

impl AccumulationWindow {
    fn new() -> Self {
        Self {
            chunks: Vec::new(),
            total_frames: 0,
        }
    }

    fn push(&mut self, chunk: AudioChunk) {
        self.total_frames += chunk.frames();
        self.chunks.push(chunk);
    }

    fn duration_secs(&self, sample_rate: u32) -> f32 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.total_frames as f32 / sample_rate as f32
    }

    fn take(&mut self) -> Vec<AudioChunk> {
        self.total_frames = 0;
        std::mem::take(&mut self.chunks)
    }
}

/// Consumer half of the pipeline. Owns the polling thread; `stop` joins it.
pub struct SttWorker {
    state: SharedState,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SttWorker {
    pub fn start(
        config: SttConfig,
        buffer: ChunkBuffer,
        engine: Arc<dyn TranscriptionEngine>,
        events: EventSender,
    ) -> Self {
        let state = SharedState::new();
        state.set(WorkerState::Running);
        let running = Arc::new(AtomicBool::new(true));

        let thread_state = state.clone();
        let thread_running = running.clone();
        let handle = thread::spawn(move || {
            run_stt(config, buffer, engine, events, thread_running);
            thread_state.settle();
        });

        Self {
            state,
            running,
            handle: Some(handle),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state.get()
    }

    /// Signal the loop and join. Idempotent.
    pub fn stop(&mut self) {
        if self.state.get() == WorkerState::Running {
            self.state.set(WorkerState::Stopping);
        }
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SttWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_stt(
    config: SttConfig,
    buffer: ChunkBuffer,
    engine: Arc<dyn TranscriptionEngine>,
    events: EventSender,
    running: Arc<AtomicBool>,
) {
    let threshold = config.window_secs - config.window_epsilon_secs;
    let mut window = AccumulationWindow::new();

    while running.load(Ordering::Relaxed) {
        while let Some(chunk) = buffer.try_pop() {
            window.push(chunk);
        }

        if window.duration_secs(config.capture_sample_rate) >= threshold {
            let chunks = window.take();
            match process_window(&chunks, &config, engine.as_ref()) {
                Ok(Some(text)) => events.text_recognized(text),
                Ok(None) => debug!("window produced no usable text"),
                Err(err) => {
                    // One bad window must not take the pipeline down.
                    warn!(%err, "transcription window failed");
                    events.error(
                        ErrorSource::Transcription,
                        PipelineError::TranscriptionFault(err.to_string()).to_string(),
                    );
                }
            }
        }

        thread::sleep(config.poll_interval);
    }
    debug!("stt worker stopped");
}

/// Preprocess and transcribe one window. `Ok(None)` means the window was
/// skipped (too short) or the engine produced nothing worth emitting.
fn process_window(
    chunks: &[AudioChunk],
    config: &SttConfig,
    engine: &dyn TranscriptionEngine,
) -> Result<Option<String>> {
    let total: usize = chunks.iter().map(|c| c.samples.len()).sum();
    let mut interleaved = Vec::with_capacity(total);
    let mut channels = 1usize;
    for chunk in chunks {
        channels = channels.max(usize::from(chunk.channels));
        interleaved.extend_from_slice(&chunk.samples);
    }

    let mono = downmix_to_mono(&interleaved, channels);

    // Degenerate windows (device glitch, shutdown remainder) are judged
    // against the target rate before resampling.
    let min_samples = (config.target_sample_rate as f32 * config.min_window_secs) as usize;
    if mono.len() < min_samples {
        debug!(
            samples = mono.len(),
            min_samples, "discarding degenerate window"
        );
        return Ok(None);
    }

    let audio = if config.capture_sample_rate != config.target_sample_rate {
        resample(&mono, config.capture_sample_rate, config.target_sample_rate)
    } else {
        mono
    };

    let segments = engine.transcribe(&audio, config.target_sample_rate, &config.options)?;
    let mut transcript = String::new();
    for segment in &segments {
        transcript.push_str(&segment.text);
    }

    let cleaned = sanitize_transcript(&transcript);
    if cleaned.is_empty() {
        Ok(None)
    } else {
        Ok(Some(cleaned))
    }
}

/// Strip non-speech markers the model emits on noise and collapse whitespace.
pub fn sanitize_transcript(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    static NON_SPEECH_RE: OnceLock<Regex> = OnceLock::new();
    let re = NON_SPEECH_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\[\s*\]|\(\s*\)|\[(?:\s*(?:silence|noise|inaudible|blank_audio|blank audio|music|laughter|applause|cough|breath(?:ing)?|wind|background)\s*)\]|\((?:\s*(?:silence|noise|inaudible|blank audio|music|laughter|applause|cough|breath(?:ing)?|wind|background|wind blowing)\s*)\)",
        )
        .expect("non-speech regex should compile")
    });
    let without_markers = re.replace_all(trimmed, " ");
    without_markers
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

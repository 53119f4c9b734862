//! End-to-end tests for the capture buffer plus STT worker pairing, using a
//! scripted engine in place of the model.

use anyhow::{anyhow, Result};
use callscribe::audio::{AudioChunk, ChunkBuffer};
use callscribe::events::{ErrorSource, EventSender, PipelineEvent};
use callscribe::pipeline::{SttConfig, SttWorker};
use callscribe::stt::{TranscribeOptions, TranscriptionEngine, TranscriptionSegment};
use callscribe::WorkerState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Returns each scripted response once, in order; errors are part of the
/// script too.
struct ScriptedEngine {
    script: Vec<Result<String, String>>,
    cursor: AtomicUsize,
}

impl ScriptedEngine {
    fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script,
            cursor: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

impl TranscriptionEngine for ScriptedEngine {
    fn transcribe(
        &self,
        _samples: &[f32],
        _sample_rate: u32,
        _options: &TranscribeOptions,
    ) -> Result<Vec<TranscriptionSegment>> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        match self.script.get(index) {
            Some(Ok(text)) => Ok(vec![TranscriptionSegment { text: text.clone() }]),
            Some(Err(message)) => Err(anyhow!("{message}")),
            None => Ok(Vec::new()),
        }
    }
}

fn fast_config() -> SttConfig {
    SttConfig {
        capture_sample_rate: 16_000,
        target_sample_rate: 16_000,
        window_secs: 0.5,
        window_epsilon_secs: 0.01,
        poll_interval: Duration::from_millis(2),
        min_window_secs: 0.1,
        options: TranscribeOptions::default(),
    }
}

/// One second of mono audio at the test rate, split into `pieces` chunks.
fn push_seconds(buffer: &ChunkBuffer, seconds: f32, pieces: usize) {
    let producer = buffer.producer();
    let total = (16_000.0 * seconds) as usize;
    let per_chunk = total / pieces.max(1);
    for _ in 0..pieces {
        producer.push(AudioChunk {
            samples: vec![0.1; per_chunk],
            channels: 1,
            sample_rate: 16_000,
        });
    }
}

fn recv_event(receiver: &callscribe::EventReceiver) -> PipelineEvent {
    receiver
        .recv_timeout(Duration::from_secs(5))
        .expect("expected a pipeline event")
}

#[test]
fn accumulated_window_produces_text_event() {
    let buffer = ChunkBuffer::with_capacity(64);
    let engine = Arc::new(ScriptedEngine::new(vec![Ok("hello from the call".into())]));
    let (events, receiver) = EventSender::channel();

    push_seconds(&buffer, 0.6, 4);
    let mut worker = SttWorker::start(fast_config(), buffer.clone(), engine.clone(), events);

    match recv_event(&receiver) {
        PipelineEvent::TextRecognized(text) => assert_eq!(text, "hello from the call"),
        other => panic!("unexpected event: {other:?}"),
    }
    worker.stop();

    assert_eq!(engine.calls(), 1);
    assert!(buffer.is_empty());
}

#[test]
fn windows_are_transcribed_in_capture_order() {
    let buffer = ChunkBuffer::with_capacity(256);
    let engine = Arc::new(ScriptedEngine::new(vec![
        Ok("first window".into()),
        Ok("second window".into()),
    ]));
    let (events, receiver) = EventSender::channel();

    let mut worker = SttWorker::start(fast_config(), buffer.clone(), engine, events);
    push_seconds(&buffer, 0.6, 3);
    match recv_event(&receiver) {
        PipelineEvent::TextRecognized(text) => assert_eq!(text, "first window"),
        other => panic!("unexpected event: {other:?}"),
    }
    push_seconds(&buffer, 0.6, 3);
    match recv_event(&receiver) {
        PipelineEvent::TextRecognized(text) => assert_eq!(text, "second window"),
        other => panic!("unexpected event: {other:?}"),
    }
    worker.stop();
}

#[test]
fn engine_failure_is_contained_to_one_window() {
    let buffer = ChunkBuffer::with_capacity(256);
    let engine = Arc::new(ScriptedEngine::new(vec![
        Err("model exploded".into()),
        Ok("recovered".into()),
    ]));
    let (events, receiver) = EventSender::channel();

    let mut worker = SttWorker::start(fast_config(), buffer.clone(), engine, events);

    push_seconds(&buffer, 0.6, 2);
    match recv_event(&receiver) {
        PipelineEvent::Error { source, message } => {
            assert_eq!(source, ErrorSource::Transcription);
            assert!(message.starts_with("transcription failed"), "got '{message}'");
            assert!(message.contains("model exploded"));
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // The worker must keep consuming after the failure.
    push_seconds(&buffer, 0.6, 2);
    match recv_event(&receiver) {
        PipelineEvent::TextRecognized(text) => assert_eq!(text, "recovered"),
        other => panic!("unexpected event: {other:?}"),
    }
    worker.stop();
    assert_eq!(worker.state(), WorkerState::Stopped);
}

#[test]
fn short_audio_below_threshold_is_not_transcribed() {
    let buffer = ChunkBuffer::with_capacity(64);
    let engine = Arc::new(ScriptedEngine::new(vec![Ok("should not appear".into())]));
    let (events, receiver) = EventSender::channel();

    // 0.3 seconds never crosses the 0.5 second threshold.
    push_seconds(&buffer, 0.3, 2);
    let mut worker = SttWorker::start(fast_config(), buffer, engine.clone(), events);
    std::thread::sleep(Duration::from_millis(100));
    worker.stop();

    assert_eq!(engine.calls(), 0);
    assert!(receiver.try_recv().is_err());
}

#[test]
fn stop_mid_accumulation_leaves_buffer_empty_and_worker_stopped() {
    let buffer = ChunkBuffer::with_capacity(64);
    let engine = Arc::new(ScriptedEngine::new(vec![Ok("should not appear".into())]));
    let (events, receiver) = EventSender::channel();

    // 0.3 seconds stays below the 0.5 second threshold: the worker pulls the
    // chunks into its window but never transcribes them.
    push_seconds(&buffer, 0.3, 3);
    let mut worker = SttWorker::start(fast_config(), buffer.clone(), engine.clone(), events);
    std::thread::sleep(Duration::from_millis(100));
    worker.stop();

    assert!(buffer.is_empty());
    assert_eq!(worker.state(), WorkerState::Stopped);
    assert_eq!(engine.calls(), 0);
    assert!(receiver.try_recv().is_err());
}

#[test]
fn stop_joins_the_worker_promptly() {
    let buffer = ChunkBuffer::with_capacity(16);
    let engine = Arc::new(ScriptedEngine::new(Vec::new()));
    let (events, _receiver) = EventSender::channel();

    let mut worker = SttWorker::start(fast_config(), buffer, engine, events);
    assert_eq!(worker.state(), WorkerState::Running);
    worker.stop();
    assert_eq!(worker.state(), WorkerState::Stopped);
    // Idempotent.
    worker.stop();
    assert_eq!(worker.state(), WorkerState::Stopped);
}

#[test]
fn capture_worker_reports_unknown_device() {
    use callscribe::audio::{CaptureConfig, CaptureWorker};

    let buffer = ChunkBuffer::with_capacity(16);
    let (events, receiver) = EventSender::channel();
    let mut worker = CaptureWorker::start(
        CaptureConfig {
            device_index: usize::MAX,
            sample_rate: 44_100,
            channels: 2,
            block_size: 1_024,
            idle_poll: Duration::from_millis(10),
        },
        buffer,
        events,
    )
    .expect("worker thread should spawn");

    match recv_event(&receiver) {
        PipelineEvent::Error { source, .. } => assert_eq!(source, ErrorSource::Device),
        other => panic!("unexpected event: {other:?}"),
    }

    // The failure event precedes the state flip; wait for it to land.
    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while worker.state() != WorkerState::Failed && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(worker.state(), WorkerState::Failed);

    // Stopping a failed worker leaves it failed.
    worker.stop();
    assert_eq!(worker.state(), WorkerState::Failed);
}

#[test]
fn resampling_window_reaches_engine_at_target_rate() {
    struct RateCheck {
        seen: AtomicUsize,
    }
    impl TranscriptionEngine for RateCheck {
        fn transcribe(
            &self,
            samples: &[f32],
            sample_rate: u32,
            _options: &TranscribeOptions,
        ) -> Result<Vec<TranscriptionSegment>> {
            assert_eq!(sample_rate, 16_000);
            self.seen.store(samples.len(), Ordering::SeqCst);
            Ok(vec![TranscriptionSegment { text: "ok".into() }])
        }
    }

    let buffer = ChunkBuffer::with_capacity(256);
    let engine = Arc::new(RateCheck {
        seen: AtomicUsize::new(0),
    });
    let (events, receiver) = EventSender::channel();

    let config = SttConfig {
        capture_sample_rate: 44_100,
        target_sample_rate: 16_000,
        window_secs: 2.0,
        window_epsilon_secs: 0.01,
        poll_interval: Duration::from_millis(2),
        min_window_secs: 0.1,
        options: TranscribeOptions::default(),
    };

    // Two seconds of stereo at 44.1 kHz.
    let producer = buffer.producer();
    for _ in 0..4 {
        producer.push(AudioChunk {
            samples: vec![0.1; 44_100],
            channels: 2,
            sample_rate: 44_100,
        });
    }

    let mut worker = SttWorker::start(config, buffer, engine.clone(), events);
    match recv_event(&receiver) {
        PipelineEvent::TextRecognized(text) => assert_eq!(text, "ok"),
        other => panic!("unexpected event: {other:?}"),
    }
    worker.stop();

    // 88_200 mono samples resampled 44.1k -> 16k is about 32_000.
    let seen = engine.seen.load(Ordering::SeqCst);
    assert!(seen.abs_diff(32_000) <= 10, "got {seen}");
}

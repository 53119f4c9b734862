//! Real-time call transcription pipeline.
//!
//! Captures loopback audio from the system, accumulates it into short
//! windows, and streams recognized text as events so a knowledge-base
//! assistant can answer questions as the call happens. The capture and
//! transcription workers run on their own threads and talk through a
//! bounded chunk buffer; consumers read one event channel.

pub mod answer;
pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod session;
pub mod stt;
pub mod telemetry;

pub use answer::{Answer, AnswerBackend};
pub use audio::{AudioChunk, ChunkBuffer, DeviceCatalog};
pub use config::AppConfig;
pub use error::PipelineError;
pub use events::{ErrorSource, EventReceiver, PipelineEvent};
pub use pipeline::{SttConfig, SttWorker};
pub use session::{CaptureSession, SessionConfig, WorkerState};
pub use stt::{TranscribeOptions, TranscriptionEngine, TranscriptionSegment};

//! Notification surface consumed by the orchestrator/UI.
//!
//! Replaces the GUI-framework signal emission of a typical desktop client
//! with an explicit channel: consumers receive `TextRecognized` and `Error`
//! events in the order their underlying audio was captured.

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, error};

/// Which component detected a failure. Severity is conveyed by the source and
/// message content, not a separate field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSource {
    Capture,
    Transcription,
    Device,
}

impl ErrorSource {
    pub fn label(self) -> &'static str {
        match self {
            ErrorSource::Capture => "capture",
            ErrorSource::Transcription => "transcription",
            ErrorSource::Device => "device",
        }
    }
}

/// Events emitted by the pipeline workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// One successfully transcribed accumulation window.
    TextRecognized(String),
    /// A failure converted at the detecting component's boundary.
    Error {
        source: ErrorSource,
        message: String,
    },
}

/// Receiving half handed to the session owner.
pub type EventReceiver = Receiver<PipelineEvent>;

/// Cloneable sending half shared by both workers. Sends never block; the
/// channel is unbounded and the receiver owns backpressure decisions.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<PipelineEvent>,
}

impl EventSender {
    pub fn channel() -> (EventSender, EventReceiver) {
        let (tx, rx) = unbounded();
        (EventSender { tx }, rx)
    }

    pub fn text_recognized(&self, text: String) {
        debug!(chars = text.len(), "text recognized");
        let _ = self.tx.send(PipelineEvent::TextRecognized(text));
    }

    pub fn error(&self, source: ErrorSource, message: String) {
        error!(source = source.label(), %message, "pipeline error");
        let _ = self.tx.send(PipelineEvent::Error { source, message });
    }
}

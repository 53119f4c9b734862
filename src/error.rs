//! Error taxonomy for the capture/STT pipeline.
//!
//! Failures are converted to [`crate::events::PipelineEvent::Error`] events at
//! the boundary of the component that detected them; nothing in this crate
//! terminates the host process.

use thiserror::Error;

/// Errors surfaced by the pipeline, either as `Result` values from the
/// session API or stringified inside `Error` events.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No device could be resolved, or the hardware stream failed to open.
    /// Fatal to the capture session.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A mid-stream hardware or driver error. Fatal to capture; the consumer
    /// keeps draining whatever is already buffered.
    #[error("audio stream fault: {0}")]
    StreamFault(String),

    /// The transcription engine failed for one window. Non-fatal; the STT
    /// worker continues with the next window.
    #[error("transcription failed: {0}")]
    TranscriptionFault(String),
}

//! Speech-to-text backends.
//!
//! [`TranscriptionEngine`] is the seam between the streaming pipeline and the
//! model: the pipeline hands it a mono 16 kHz window and gets back segments.
//! The production implementation is [`whisper::Transcriber`]; tests substitute
//! their own engines.

pub mod gate;
pub mod whisper;

use anyhow::Result;

/// One contiguous stretch of recognized speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionSegment {
    pub text: String,
}

/// Per-request decoding knobs.
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    /// ISO 639-1 code, or "auto" for model-side detection.
    pub language: String,
    /// Beam width; 1 selects greedy decoding.
    pub beam_size: usize,
    /// Skip windows with no detectable speech energy before invoking the model.
    pub vad_filter: bool,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            beam_size: 5,
            vad_filter: true,
        }
    }
}

/// A synchronous transcription backend. Implementations must be shareable
/// across the pipeline's worker threads.
pub trait TranscriptionEngine: Send + Sync {
    /// Transcribe one window of mono samples at `sample_rate`.
    fn transcribe(
        &self,
        samples: &[f32],
        sample_rate: u32,
        options: &TranscribeOptions,
    ) -> Result<Vec<TranscriptionSegment>>;
}

pub use whisper::Transcriber;

//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use crate::pipeline::SttConfig;
use crate::session::SessionConfig;
use crate::stt::TranscribeOptions;
use clap::{ArgAction, Parser};
use std::time::Duration;

pub use defaults::{
    DEFAULT_BEAM_SIZE, DEFAULT_CAPTURE_BLOCK_SIZE, DEFAULT_CAPTURE_CHANNELS,
    DEFAULT_CAPTURE_SAMPLE_RATE, DEFAULT_CHUNK_CAPACITY, DEFAULT_IDLE_POLL_MS,
    DEFAULT_LOOPBACK_KEYWORDS, DEFAULT_MIN_WINDOW_SECS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_RUN_SECONDS, DEFAULT_TARGET_SAMPLE_RATE, DEFAULT_VAD_THRESHOLD_DB,
    DEFAULT_WINDOW_EPSILON_SECS, DEFAULT_WINDOW_SECS,
};

/// CLI options for the callscribe capture pipeline. Validated values keep the
/// audio and STT workers inside safe operating ranges.
#[derive(Debug, Parser, Clone)]
#[command(about = "Streaming call transcription", author, version)]
pub struct AppConfig {
    /// Preferred audio input device name
    #[arg(long)]
    pub input_device: Option<String>,

    /// Print detected audio devices with the loopback verdict and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Capture sample rate (Hz)
    #[arg(long = "capture-sample-rate", default_value_t = DEFAULT_CAPTURE_SAMPLE_RATE)]
    pub capture_sample_rate: u32,

    /// Capture channel count
    #[arg(long = "capture-channels", default_value_t = DEFAULT_CAPTURE_CHANNELS)]
    pub capture_channels: u16,

    /// Frames per capture callback block
    #[arg(long = "capture-block-size", default_value_t = DEFAULT_CAPTURE_BLOCK_SIZE)]
    pub capture_block_size: u32,

    /// Sample rate handed to the STT model (Hz)
    #[arg(long = "stt-sample-rate", default_value_t = DEFAULT_TARGET_SAMPLE_RATE)]
    pub stt_sample_rate: u32,

    /// Seconds of audio accumulated per transcription window
    #[arg(long = "window-secs", default_value_t = DEFAULT_WINDOW_SECS)]
    pub window_secs: f32,

    /// Slack subtracted from the window threshold (seconds)
    #[arg(long = "window-epsilon-secs", default_value_t = DEFAULT_WINDOW_EPSILON_SECS)]
    pub window_epsilon_secs: f32,

    /// STT worker poll interval (milliseconds)
    #[arg(long = "poll-interval-ms", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,

    /// Capture worker idle poll interval (milliseconds)
    #[arg(long = "idle-poll-ms", default_value_t = DEFAULT_IDLE_POLL_MS)]
    pub idle_poll_ms: u64,

    /// Windows shorter than this are discarded instead of transcribed (seconds)
    #[arg(long = "min-window-secs", default_value_t = DEFAULT_MIN_WINDOW_SECS)]
    pub min_window_secs: f32,

    /// Chunk buffer capacity between capture and STT workers
    #[arg(long = "chunk-capacity", default_value_t = DEFAULT_CHUNK_CAPACITY)]
    pub chunk_capacity: usize,

    /// Extra loopback keyword for device classification (repeatable)
    #[arg(long = "loopback-keyword", action = ArgAction::Append, value_name = "KEYWORD")]
    pub loopback_keywords: Vec<String>,

    /// Language passed to Whisper ('auto' enables detection)
    #[arg(long, default_value = "en")]
    pub lang: String,

    /// Whisper beam width (1 selects greedy decoding)
    #[arg(long = "beam-size", default_value_t = DEFAULT_BEAM_SIZE)]
    pub beam_size: usize,

    /// Transcribe every window, even ones with no detectable speech
    #[arg(long = "no-vad-filter", default_value_t = false)]
    pub no_vad_filter: bool,

    /// Energy threshold below which a window counts as silence (decibels)
    #[arg(long = "vad-threshold-db", default_value_t = DEFAULT_VAD_THRESHOLD_DB)]
    pub vad_threshold_db: f32,

    /// Whisper GGML model path
    #[arg(long = "whisper-model-path", env = "CALLSCRIBE_MODEL")]
    pub whisper_model_path: Option<String>,

    /// Run duration in seconds (0 runs until the session fails or is killed)
    #[arg(long, default_value_t = DEFAULT_RUN_SECONDS)]
    pub seconds: u64,

    /// Enable JSON trace logging to a file
    #[arg(long = "logs", env = "CALLSCRIBE_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "CALLSCRIBE_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,
}

impl AppConfig {
    /// Classification keywords, falling back to the built-in set when the
    /// user supplied none.
    pub fn loopback_keywords(&self) -> Vec<String> {
        if self.loopback_keywords.is_empty() {
            DEFAULT_LOOPBACK_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect()
        } else {
            self.loopback_keywords.clone()
        }
    }

    pub fn transcribe_options(&self) -> TranscribeOptions {
        TranscribeOptions {
            language: self.lang.clone(),
            beam_size: self.beam_size,
            vad_filter: !self.no_vad_filter,
        }
    }

    /// Snapshot the CLI-controlled settings for the session.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            input_device: self.input_device.clone(),
            capture_sample_rate: self.capture_sample_rate,
            capture_channels: self.capture_channels,
            capture_block_size: self.capture_block_size,
            idle_poll: Duration::from_millis(self.idle_poll_ms),
            chunk_capacity: self.chunk_capacity,
            loopback_keywords: self.loopback_keywords(),
            stt: SttConfig {
                capture_sample_rate: self.capture_sample_rate,
                target_sample_rate: self.stt_sample_rate,
                window_secs: self.window_secs,
                window_epsilon_secs: self.window_epsilon_secs,
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                min_window_secs: self.min_window_secs,
                options: self.transcribe_options(),
            },
        }
    }
}

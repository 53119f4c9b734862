use super::defaults::ISO_639_1_CODES;
use super::AppConfig;
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::path::Path;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize paths.
    pub fn validate(&mut self) -> Result<()> {
        if !(8_000..=192_000).contains(&self.capture_sample_rate) {
            bail!(
                "--capture-sample-rate must be between 8000 and 192000 Hz, got {}",
                self.capture_sample_rate
            );
        }
        if !(1..=8).contains(&self.capture_channels) {
            bail!(
                "--capture-channels must be between 1 and 8, got {}",
                self.capture_channels
            );
        }
        if !(64..=16_384).contains(&self.capture_block_size) {
            bail!(
                "--capture-block-size must be between 64 and 16384 frames, got {}",
                self.capture_block_size
            );
        }
        if !(8_000..=48_000).contains(&self.stt_sample_rate) {
            bail!(
                "--stt-sample-rate must be between 8000 and 48000 Hz, got {}",
                self.stt_sample_rate
            );
        }
        if !(0.2..=30.0).contains(&self.window_secs) {
            bail!(
                "--window-secs must be between 0.2 and 30.0, got {}",
                self.window_secs
            );
        }
        if self.window_epsilon_secs < 0.0 || self.window_epsilon_secs >= self.window_secs {
            bail!(
                "--window-epsilon-secs must be >= 0 and below --window-secs ({})",
                self.window_secs
            );
        }
        if !(1..=1_000).contains(&self.poll_interval_ms) {
            bail!(
                "--poll-interval-ms must be between 1 and 1000, got {}",
                self.poll_interval_ms
            );
        }
        if !(10..=1_000).contains(&self.idle_poll_ms) {
            bail!(
                "--idle-poll-ms must be between 10 and 1000, got {}",
                self.idle_poll_ms
            );
        }
        if self.min_window_secs < 0.0 || self.min_window_secs >= self.window_secs {
            bail!(
                "--min-window-secs must be >= 0 and below --window-secs ({})",
                self.window_secs
            );
        }
        if !(8..=4_096).contains(&self.chunk_capacity) {
            bail!(
                "--chunk-capacity must be between 8 and 4096, got {}",
                self.chunk_capacity
            );
        }
        if !(1..=10).contains(&self.beam_size) {
            bail!(
                "--beam-size must be between 1 and 10, got {}",
                self.beam_size
            );
        }
        if !(-120.0..=0.0).contains(&self.vad_threshold_db) {
            bail!(
                "--vad-threshold-db must be between -120.0 and 0.0 dB, got {}",
                self.vad_threshold_db
            );
        }

        if self.lang.trim().is_empty() {
            bail!("--lang must not be empty");
        }
        if !self.lang.eq_ignore_ascii_case("auto") {
            if !self
                .lang
                .chars()
                .all(|ch| ch.is_ascii_alphabetic() || ch == '-' || ch == '_')
            {
                bail!("--lang must contain only alphabetic characters or '-'/'_' separators");
            }
            // Allow locale-style values but only check the leading ISO-639-1 code.
            let lang_primary = self
                .lang
                .split(['-', '_'])
                .next()
                .unwrap_or("")
                .to_ascii_lowercase();
            if !ISO_639_1_CODES.contains(&lang_primary.as_str()) {
                bail!(
                    "--lang must start with a valid ISO-639-1 code or be 'auto', got '{}'",
                    self.lang
                );
            }
        }

        if let Some(model) = &self.whisper_model_path {
            let model_path = Path::new(model);
            if !model_path.exists() {
                bail!(
                    "whisper model path '{}' does not exist",
                    model_path.display()
                );
            }
        }
        if let Some(model) = &mut self.whisper_model_path {
            // Store a canonical absolute path.
            let canonical = Path::new(model)
                .canonicalize()
                .with_context(|| format!("failed to canonicalize whisper model path '{model}'"))?;
            *model = canonical
                .to_str()
                .map(|s| s.to_string())
                .ok_or_else(|| anyhow!("whisper model path must be valid UTF-8"))?;
        }

        Ok(())
    }
}

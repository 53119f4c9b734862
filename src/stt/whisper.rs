//! Whisper backend for [`TranscriptionEngine`].
//!
//! The GGML model loads once and is reused for every window. whisper.cpp is
//! chatty on stderr during initialization, so loading happens behind a
//! temporary stderr redirect.

#[cfg(unix)]
mod platform {
    use crate::stt::gate::has_speech;
    use crate::stt::{TranscribeOptions, TranscriptionEngine, TranscriptionSegment};
    use anyhow::{anyhow, bail, Context, Result};
    use std::io;
    use std::os::raw::{c_char, c_uint, c_void};
    use std::os::unix::io::AsRawFd;
    use std::sync::Once;
    use tracing::debug;
    use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

    /// Sample rate the model was trained on; callers resample before handing
    /// windows over.
    pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

    /// Loaded Whisper model. Create once at startup and share behind an `Arc`.
    pub struct Transcriber {
        ctx: WhisperContext,
        vad_threshold_db: f32,
    }

    impl Transcriber {
        /// Loads the model from disk with stderr redirected to `/dev/null`,
        /// since whisper.cpp prints verbose initialization messages there.
        pub fn new(model_path: &str, vad_threshold_db: f32) -> Result<Self> {
            install_whisper_log_silencer();

            let null = std::fs::OpenOptions::new()
                .write(true)
                .open("/dev/null")
                .context("failed to open /dev/null")?;
            let null_fd = null.as_raw_fd();

            // SAFETY: dup(2) duplicates the stderr file descriptor. We restore
            // it after model loading completes and hold the only reference in
            // between.
            let orig_stderr = unsafe { libc::dup(2) };
            if orig_stderr < 0 {
                return Err(anyhow!(
                    "failed to dup stderr: {}",
                    io::Error::last_os_error()
                ));
            }

            let dup_result = unsafe { libc::dup2(null_fd, 2) };
            if dup_result < 0 {
                unsafe {
                    libc::close(orig_stderr);
                }
                return Err(anyhow!(
                    "failed to redirect stderr: {}",
                    io::Error::last_os_error()
                ));
            }

            let ctx_result =
                WhisperContext::new_with_params(model_path, WhisperContextParameters::default());

            let restore_result = unsafe { libc::dup2(orig_stderr, 2) };
            unsafe {
                libc::close(orig_stderr);
            }
            if restore_result < 0 {
                return Err(anyhow!(
                    "failed to restore stderr: {}",
                    io::Error::last_os_error()
                ));
            }

            let ctx = ctx_result.context("failed to load whisper model")?;
            Ok(Self {
                ctx,
                vad_threshold_db,
            })
        }
    }

    impl TranscriptionEngine for Transcriber {
        fn transcribe(
            &self,
            samples: &[f32],
            sample_rate: u32,
            options: &TranscribeOptions,
        ) -> Result<Vec<TranscriptionSegment>> {
            if sample_rate != WHISPER_SAMPLE_RATE {
                bail!("whisper expects {WHISPER_SAMPLE_RATE}Hz audio, got {sample_rate}Hz");
            }
            if options.vad_filter && !has_speech(samples, self.vad_threshold_db) {
                debug!("window below speech threshold; skipping model");
                return Ok(Vec::new());
            }

            let mut state = self
                .ctx
                .create_state()
                .context("failed to create whisper state")?;
            let mut params = if options.beam_size > 1 {
                FullParams::new(SamplingStrategy::BeamSearch {
                    beam_size: options.beam_size as i32,
                    patience: -1.0,
                })
            } else {
                FullParams::new(SamplingStrategy::Greedy { best_of: 1 })
            };
            if options.language.eq_ignore_ascii_case("auto") {
                params.set_language(None);
                params.set_detect_language(true);
            } else {
                params.set_language(Some(&options.language));
                params.set_detect_language(false);
            }
            // Limit CPU usage so laptops don't max out all cores.
            params.set_n_threads(num_cpus::get().min(8) as i32);
            params.set_print_progress(false);
            params.set_print_timestamps(false);
            params.set_print_special(false);
            params.set_print_realtime(false);
            params.set_translate(false);
            params.set_token_timestamps(false);

            state.full(params, samples)?;

            let mut segments = Vec::new();
            let num_segments = match state.full_n_segments() {
                Ok(count) => count,
                Err(err) => {
                    debug!(%err, "whisper failed to report segment count");
                    return Ok(segments);
                }
            };
            if num_segments < 0 {
                debug!("whisper returned a negative segment count");
                return Ok(segments);
            }
            for i in 0..num_segments {
                match state.full_get_segment_text_lossy(i) {
                    Ok(text) => segments.push(TranscriptionSegment { text }),
                    Err(err) => debug!(segment = i, %err, "failed to read whisper segment"),
                }
            }
            Ok(segments)
        }
    }

    fn install_whisper_log_silencer() {
        static INSTALL_LOG_CALLBACK: Once = Once::new();
        INSTALL_LOG_CALLBACK.call_once(|| unsafe {
            whisper_rs::set_log_callback(Some(whisper_log_callback), std::ptr::null_mut());
        });
    }

    #[allow(unused_variables)]
    unsafe extern "C" fn whisper_log_callback(
        _level: c_uint,
        _text: *const c_char,
        _user_data: *mut c_void,
    ) {
        // Silence the default whisper.cpp logger.
    }
}

#[cfg(unix)]
pub use platform::{Transcriber, WHISPER_SAMPLE_RATE};

#[cfg(not(unix))]
mod platform {
    use crate::stt::{TranscribeOptions, TranscriptionEngine, TranscriptionSegment};
    use anyhow::{anyhow, Result};

    pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

    /// Stub implementation for unsupported targets such as Windows.
    pub struct Transcriber;

    impl Transcriber {
        pub fn new(_: &str, _: f32) -> Result<Self> {
            Err(anyhow!(
                "Whisper transcription is currently supported only on Unix-like platforms"
            ))
        }
    }

    impl TranscriptionEngine for Transcriber {
        fn transcribe(
            &self,
            _: &[f32],
            _: u32,
            _: &TranscribeOptions,
        ) -> Result<Vec<TranscriptionSegment>> {
            Err(anyhow!(
                "Whisper transcription is currently supported only on Unix-like platforms"
            ))
        }
    }
}

#[cfg(not(unix))]
pub use platform::{Transcriber, WHISPER_SAMPLE_RATE};

//! Energy gate used as the voice-activity filter.
//!
//! Whisper hallucinates text on silence, so windows whose RMS level sits
//! below the threshold are skipped before the model ever runs.

const SILENCE_FLOOR_DB: f32 = -60.0;

pub(crate) fn rms_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return SILENCE_FLOOR_DB;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    let rms = energy.sqrt().max(1e-6);
    20.0 * rms.log10()
}

/// True when the window carries enough energy to plausibly contain speech.
pub(crate) fn has_speech(samples: &[f32], threshold_db: f32) -> bool {
    rms_db(samples) > threshold_db
}

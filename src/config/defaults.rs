pub const DEFAULT_CAPTURE_SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_CAPTURE_CHANNELS: u16 = 2;
pub const DEFAULT_CAPTURE_BLOCK_SIZE: u32 = 1_024;
pub const DEFAULT_TARGET_SAMPLE_RATE: u32 = 16_000;
pub const DEFAULT_WINDOW_SECS: f32 = 2.0;
pub const DEFAULT_WINDOW_EPSILON_SECS: f32 = 0.01;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;
pub const DEFAULT_IDLE_POLL_MS: u64 = 100;
pub const DEFAULT_MIN_WINDOW_SECS: f32 = 0.1;
pub const DEFAULT_CHUNK_CAPACITY: usize = 256;
pub const DEFAULT_BEAM_SIZE: usize = 5;
pub const DEFAULT_VAD_THRESHOLD_DB: f32 = -55.0;
pub const DEFAULT_RUN_SECONDS: u64 = 30;

/// Names that mark a device as carrying the system's own output.
pub const DEFAULT_LOOPBACK_KEYWORDS: &[&str] =
    &["loopback", "stereo mix", "立体声混音", "cable output", "monitor"];

pub(super) const ISO_639_1_CODES: &[&str] = &[
    "af", "am", "ar", "az", "be", "bg", "bn", "bs", "ca", "cs", "cy", "da", "de", "el", "en", "es",
    "et", "eu", "fa", "fi", "fil", "fr", "ga", "gl", "gu", "he", "hi", "hr", "hu", "hy", "id",
    "is", "it", "ja", "jv", "ka", "kk", "km", "kn", "ko", "lo", "lt", "lv", "mk", "ml", "mn", "mr",
    "ms", "my", "ne", "nl", "no", "pa", "pl", "pt", "ro", "ru", "si", "sk", "sl", "sq", "sr", "sv",
    "sw", "ta", "te", "th", "tr", "uk", "ur", "vi", "zh",
];

//! Central Configuration Constants
//!
//! Single source of truth for all monitoring defaults.
//! The reference policy lives here; presets and env overrides build on it.

/// Default interview backend URL (flag endpoint lives under it)
///
/// For development: http://localhost:8000
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Cumulative weight at which a finished interview is not considered completed
pub const DEFAULT_FLAG_THRESHOLD: f64 = 18.0;

/// Cumulative weight at which an active interview is terminated as flagged
pub const DEFAULT_TERMINATION_THRESHOLD: f64 = 18.0;

/// Sustained absence before FACE_ABSENT is emitted (ms)
pub const DEFAULT_LOOKING_AWAY_MS: u64 = 5_000;

/// Top face confidence below this counts as absence
pub const DEFAULT_FACE_CONFIDENCE: f32 = 0.6;

/// Frame sampling interval (~60 Hz)
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 16;

/// Give up on model load after this long and fall back to degraded monitoring
pub const DEFAULT_MODEL_LOAD_TIMEOUT_MS: u64 = 10_000;

/// Delay before fullscreen is re-requested after an exit
pub const DEFAULT_FULLSCREEN_RESTORE_DELAY_MS: u64 = 1_000;

/// Restoration attempts per fullscreen exit
pub const DEFAULT_FULLSCREEN_RESTORE_ATTEMPTS: u32 = 3;

/// Banner escalates to "warning" at this cumulative weight
pub const DEFAULT_WARNING_WEIGHT: f64 = 3.0;

/// Banner escalates to "critical" at this cumulative weight
pub const DEFAULT_CRITICAL_WEIGHT: f64 = 5.0;

/// Default face model location
pub const DEFAULT_MODEL_PATH: &str = "models/face-detector.onnx";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Interview Proctor";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get backend URL from environment or use default
pub fn get_backend_url() -> String {
    std::env::var("PROCTOR_BACKEND_URL")
        .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string())
}

/// Get model path from environment or use default
pub fn get_model_path() -> String {
    std::env::var("PROCTOR_MODEL_PATH")
        .unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string())
}

/// Get model profile name from environment (`tiny` / `ssd`)
pub fn get_model_profile() -> Option<String> {
    std::env::var("PROCTOR_MODEL_PROFILE").ok()
}

/// Get flag threshold from environment or use default
pub fn get_flag_threshold() -> f64 {
    parse_env("PROCTOR_FLAG_THRESHOLD").unwrap_or(DEFAULT_FLAG_THRESHOLD)
}

/// Get termination threshold from environment or use default
pub fn get_termination_threshold() -> f64 {
    parse_env("PROCTOR_TERMINATION_THRESHOLD").unwrap_or(DEFAULT_TERMINATION_THRESHOLD)
}

/// Get looking-away duration from environment or use default
pub fn get_looking_away_ms() -> u64 {
    parse_env("PROCTOR_LOOKING_AWAY_MS").unwrap_or(DEFAULT_LOOKING_AWAY_MS)
}

/// Get face confidence threshold from environment or use default
pub fn get_face_confidence() -> f32 {
    parse_env("PROCTOR_FACE_CONFIDENCE").unwrap_or(DEFAULT_FACE_CONFIDENCE)
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

//! Face Detector Contract
//!
//! Trait for inference backends (ONNX, scripted replay) and for the video
//! capture collaborator. The analyzer only ever talks to these traits.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::onnx::OnnxFaceDetector;
use super::scripted::ScriptedFaceDetector;
use super::types::{FaceDetection, Frame};
use crate::logic::config::DetectorConfig;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum FaceError {
    #[error("model not found: {0}")]
    ModelNotFound(String),
    #[error("model checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("model load failed: {0}")]
    Load(String),
    #[error("model not loaded")]
    NotLoaded,
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error("video capture failed: {0}")]
    Capture(String),
}

// ============================================================================
// TRAITS
// ============================================================================

/// Progress callback for model loading, 0..=100
pub type LoadProgress<'a> = &'a (dyn Fn(u8) + Send + Sync);

/// Face-inference capability: `detect(frame, minConfidence) -> faces`
#[async_trait]
pub trait FaceDetector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Confidence floor the analyzer passes to every `detect` call
    fn min_confidence(&self) -> f32;

    /// Load the model, reporting progress; must finish before `detect`
    async fn load(&self, progress: LoadProgress<'_>) -> Result<(), FaceError>;

    async fn detect(&self, frame: &Frame, min_confidence: f32) -> Result<Vec<FaceDetection>, FaceError>;
}

/// Live video source from the capture collaborator
#[async_trait]
pub trait FrameSource: Send {
    /// `Ok(None)` means no frame is ready yet; skip this tick
    async fn next_frame(&mut self) -> Result<Option<Frame>, FaceError>;
}

// ============================================================================
// BACKEND SELECTION
// ============================================================================

/// Build the backend named by configuration
pub fn build_detector(config: &DetectorConfig) -> Arc<dyn FaceDetector> {
    match config {
        DetectorConfig::Onnx { model_path, profile, sha256, min_confidence } => Arc::new(
            OnnxFaceDetector::new(model_path.clone(), *profile, sha256.clone()).with_min_confidence(*min_confidence),
        ),
        DetectorConfig::Scripted { timeline } => Arc::new(ScriptedFaceDetector::new(timeline.clone())),
    }
}

// ============================================================================
// MODEL GUARD
// ============================================================================

/// SHA-256 of a file, lowercase hex
pub fn file_sha256(path: &Path) -> Result<String, FaceError> {
    let bytes = std::fs::read(path)
        .map_err(|e| FaceError::Load(format!("cannot read {}: {}", path.display(), e)))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Compare a model file against its pinned checksum
pub fn verify_checksum(path: &Path, expected: &str) -> Result<(), FaceError> {
    let actual = file_sha256(path)?;
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(FaceError::ChecksumMismatch {
            expected: expected.trim().to_lowercase(),
            actual,
        })
    }
}

//! ONNX Face Detector
//!
//! Runs a single-shot face model through ONNX Runtime.
//! Expected model I/O (UltraFace / SSD exports):
//! - input  `[1, 3, H, W]`, RGB normalized as `(p - 127) / 128`
//! - output 0 `scores [1, N, 2]` (background, face)
//! - output 1 `boxes  [1, N, 4]` normalized `x1, y1, x2, y2`

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use super::detector::{verify_checksum, FaceDetector, FaceError, LoadProgress};
use super::types::{BoundingBox, FaceDetection, Frame};
use crate::logic::config::ModelProfile;

/// Overlap above which the weaker of two boxes is dropped
const NMS_IOU_THRESHOLD: f32 = 0.3;

/// Upper bound on faces returned per frame
const MAX_FACES: usize = 16;

pub struct OnnxFaceDetector {
    model_path: String,
    profile: ModelProfile,
    sha256: Option<String>,
    min_confidence: f32,
    session: Arc<Mutex<Option<Session>>>,
}

impl OnnxFaceDetector {
    pub fn new(model_path: String, profile: ModelProfile, sha256: Option<String>) -> Self {
        Self {
            model_path,
            profile,
            sha256,
            min_confidence: profile.default_min_confidence(),
            session: Arc::new(Mutex::new(None)),
        }
    }

    /// Replace the profile's confidence floor when one is configured
    pub fn with_min_confidence(mut self, min_confidence: Option<f32>) -> Self {
        if let Some(c) = min_confidence {
            self.min_confidence = c;
        }
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.session.lock().is_some()
    }
}

#[async_trait]
impl FaceDetector for OnnxFaceDetector {
    fn name(&self) -> &'static str {
        "onnx"
    }

    fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    async fn load(&self, progress: LoadProgress<'_>) -> Result<(), FaceError> {
        progress(0);
        log::info!("Loading face model from: {} ({:?})", self.model_path, self.profile);

        let path = Path::new(&self.model_path);
        if !path.exists() {
            return Err(FaceError::ModelNotFound(self.model_path.clone()));
        }
        progress(25);

        if let Some(expected) = &self.sha256 {
            verify_checksum(path, expected)?;
            log::info!("Face model checksum verified");
        }
        progress(50);

        let model_path = self.model_path.clone();
        let session = tokio::task::spawn_blocking(move || build_session(&model_path))
            .await
            .map_err(|e| FaceError::Load(format!("loader task failed: {}", e)))??;
        progress(75);

        *self.session.lock() = Some(session);
        log::info!("Face model loaded successfully");
        progress(100);
        Ok(())
    }

    async fn detect(&self, frame: &Frame, min_confidence: f32) -> Result<Vec<FaceDetection>, FaceError> {
        let cell = Arc::clone(&self.session);
        let frame = frame.clone();
        let (width, height) = self.profile.input_size();

        tokio::task::spawn_blocking(move || {
            let input = preprocess(&frame, width, height)?;
            let mut guard = cell.lock();
            let session = guard.as_mut().ok_or(FaceError::NotLoaded)?;
            let (scores, boxes) = run_session(session, input)?;
            Ok(decode(&scores, &boxes, min_confidence))
        })
        .await
        .map_err(|e| FaceError::Inference(format!("inference task failed: {}", e)))?
    }
}

// ============================================================================
// SESSION
// ============================================================================

fn build_session(model_path: &str) -> Result<Session, FaceError> {
    Session::builder()
        .map_err(|e| FaceError::Load(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| FaceError::Load(format!("Failed to set optimization: {}", e)))?
        .commit_from_file(model_path)
        .map_err(|e| FaceError::Load(format!("Failed to load model: {}", e)))
}

fn run_session(session: &mut Session, input: Array4<f32>) -> Result<(Vec<f32>, Vec<f32>), FaceError> {
    let scores_name = session.outputs.first()
        .map(|o| o.name.clone())
        .ok_or_else(|| FaceError::Inference("model has no score output".to_string()))?;
    let boxes_name = session.outputs.get(1)
        .map(|o| o.name.clone())
        .ok_or_else(|| FaceError::Inference("model has no box output".to_string()))?;

    let input_tensor = Value::from_array(input)
        .map_err(|e| FaceError::Inference(format!("Tensor error: {}", e)))?;

    let outputs = session.run(ort::inputs![input_tensor])
        .map_err(|e| FaceError::Inference(format!("Inference failed: {}", e)))?;

    let scores = outputs.get(&scores_name)
        .ok_or_else(|| FaceError::Inference("missing score output".to_string()))?
        .try_extract_tensor::<f32>()
        .map_err(|e| FaceError::Inference(format!("Extract error: {}", e)))?
        .1
        .to_vec();
    let boxes = outputs.get(&boxes_name)
        .ok_or_else(|| FaceError::Inference("missing box output".to_string()))?
        .try_extract_tensor::<f32>()
        .map_err(|e| FaceError::Inference(format!("Extract error: {}", e)))?
        .1
        .to_vec();

    Ok((scores, boxes))
}

// ============================================================================
// PRE / POST PROCESSING
// ============================================================================

/// Nearest-neighbour resize into a normalized NCHW tensor
fn preprocess(frame: &Frame, width: usize, height: usize) -> Result<Array4<f32>, FaceError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(FaceError::InvalidFrame("empty frame".to_string()));
    }

    let mut input = Array4::<f32>::zeros((1, 3, height, width));
    for y in 0..height {
        let src_y = ((y as u64 * frame.height as u64) / height as u64) as u32;
        for x in 0..width {
            let src_x = ((x as u64 * frame.width as u64) / width as u64) as u32;
            let rgb = frame.rgb(src_x, src_y);
            for c in 0..3 {
                input[[0, c, y, x]] = (rgb[c] as f32 - 127.0) / 128.0;
            }
        }
    }
    Ok(input)
}

/// Threshold, sort by confidence, then greedy NMS
fn decode(scores: &[f32], boxes: &[f32], min_confidence: f32) -> Vec<FaceDetection> {
    let anchors = (scores.len() / 2).min(boxes.len() / 4);

    let mut candidates: Vec<FaceDetection> = (0..anchors)
        .filter_map(|i| {
            let confidence = scores[i * 2 + 1];
            if confidence < min_confidence {
                return None;
            }
            Some(FaceDetection {
                confidence,
                bbox: BoundingBox {
                    x1: boxes[i * 4].clamp(0.0, 1.0),
                    y1: boxes[i * 4 + 1].clamp(0.0, 1.0),
                    x2: boxes[i * 4 + 2].clamp(0.0, 1.0),
                    y2: boxes[i * 4 + 3].clamp(0.0, 1.0),
                },
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<FaceDetection> = Vec::new();
    for cand in candidates {
        if kept.iter().all(|k| k.bbox.iou(&cand.bbox) <= NMS_IOU_THRESHOLD) {
            kept.push(cand);
            if kept.len() == MAX_FACES {
                break;
            }
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_applies_threshold_and_nms() {
        // anchor 0: face 0.9, anchor 1: overlapping 0.8, anchor 2: low 0.3, anchor 3: separate 0.7
        let scores = vec![0.1, 0.9, 0.2, 0.8, 0.7, 0.3, 0.3, 0.7];
        let boxes = vec![
            0.10, 0.10, 0.40, 0.40,
            0.11, 0.11, 0.41, 0.41,
            0.50, 0.50, 0.60, 0.60,
            0.60, 0.10, 0.90, 0.40,
        ];

        let faces = decode(&scores, &boxes, 0.5);
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].confidence, 0.9);
        assert_eq!(faces[1].confidence, 0.7);
    }

    #[test]
    fn test_decode_empty_when_below_floor() {
        let scores = vec![0.6, 0.4];
        let boxes = vec![0.0, 0.0, 1.0, 1.0];
        assert!(decode(&scores, &boxes, 0.5).is_empty());
    }

    #[test]
    fn test_preprocess_shape_and_range() {
        let frame = Frame::new(2, 1, 0, vec![255, 255, 255, 0, 0, 0]).unwrap();
        let input = preprocess(&frame, 4, 2).unwrap();
        assert_eq!(input.shape(), &[1, 3, 2, 4]);
        assert!((input[[0, 0, 0, 0]] - 1.0).abs() < 0.01);
        assert!((input[[0, 0, 0, 3]] + 127.0 / 128.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_missing_model_fails_load() {
        let detector = OnnxFaceDetector::new("/nonexistent/face.onnx".to_string(), ModelProfile::Tiny, None);
        let err = detector.load(&|_| {}).await.unwrap_err();
        assert!(matches!(err, FaceError::ModelNotFound(_)));
        assert!(!detector.is_loaded());
    }
}

//! Face Types
//!
//! Frames in, detections and observations out. No inference logic here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::detector::FaceError;

// ============================================================================
// FRAME
// ============================================================================

/// One RGB8 video frame, row-major, 3 bytes per pixel
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Milliseconds since the capture started
    pub timestamp_ms: u64,
    pub pixels: Arc<Vec<u8>>,
}

impl Frame {
    pub fn new(width: u32, height: u32, timestamp_ms: u64, pixels: Vec<u8>) -> Result<Self, FaceError> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(FaceError::InvalidFrame(format!(
                "{}x{} frame needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            timestamp_ms,
            pixels: Arc::new(pixels),
        })
    }

    /// Black frame, used by synthetic sources
    pub fn blank(width: u32, height: u32, timestamp_ms: u64) -> Self {
        Self {
            width,
            height,
            timestamp_ms,
            pixels: Arc::new(vec![0; width as usize * height as usize * 3]),
        }
    }

    /// RGB at (x, y); caller keeps coordinates in range
    pub fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]]
    }
}

// ============================================================================
// DETECTIONS
// ============================================================================

/// Normalized box, corners in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let iy = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let inter = ix * iy;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 { 0.0 } else { inter / union }
    }
}

/// One face reported by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub confidence: f32,
    #[serde(default)]
    pub bbox: BoundingBox,
}

impl FaceDetection {
    pub fn with_confidence(confidence: f32) -> Self {
        Self { confidence, bbox: BoundingBox::default() }
    }
}

// ============================================================================
// OBSERVATION
// ============================================================================

/// Per-frame result, consumed immediately by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    pub face_count: usize,
    pub top_confidence: f32,
    pub timestamp_ms: u64,
}

impl FaceObservation {
    pub fn from_detections(detections: &[FaceDetection], timestamp_ms: u64) -> Self {
        let top_confidence = detections
            .iter()
            .map(|d| d.confidence)
            .fold(0.0f32, f32::max);
        Self {
            face_count: detections.len(),
            top_confidence,
            timestamp_ms,
        }
    }
}

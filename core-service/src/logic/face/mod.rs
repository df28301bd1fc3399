//! Face Module - Face Presence Analyzer
//!
//! One analyzer, polymorphic over the inference backend.
//!
//! ## Structure
//! - `types`: Frame, FaceDetection, FaceObservation
//! - `detector`: FaceDetector / FrameSource traits, backend selection, model guard
//! - `onnx`: ONNX Runtime backend
//! - `scripted`: replay backend and synthetic frames
//! - `tracker`: looking-away / multiple-face debouncing
//! - `analyzer`: the sampling loop

pub mod types;
pub mod detector;
pub mod onnx;
pub mod scripted;
pub mod tracker;
pub mod analyzer;

pub use analyzer::{AnalyzerEvent, AnalyzerSink, FacePresenceAnalyzer};
pub use detector::{build_detector, FaceDetector, FaceError, FrameSource};
pub use scripted::{ScriptedFaceDetector, ScriptedFrame, SyntheticFrameSource};
pub use tracker::LookingAwayTracker;
pub use types::{BoundingBox, FaceDetection, FaceObservation, Frame};

//! rollcall-core — Face primitives and attendance decision logic.
//!
//! Uses SCRFD for face detection (via ONNX Runtime) and an LBP-histogram
//! recognizer with nearest-neighbour chi-square matching. The capture and
//! commit state machines live here so they stay testable without a camera.

pub mod detector;
pub mod enrollment;
pub mod gate;
pub mod recognizer;
pub mod sample;
pub mod types;

pub use detector::{Detect, ScrfdDetector};
pub use enrollment::{CaptureOutcome, SampleCollector};
pub use gate::{decide_mark, MarkDecision};
pub use recognizer::{LbphRecognizer, Recognize};
pub use types::{FaceRegion, Prediction, Sample, DISTANCE_THRESHOLD, SAMPLE_SIZE};

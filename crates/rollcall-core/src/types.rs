use serde::{Deserialize, Serialize};

/// Side length of a normalized face sample, in pixels.
///
/// Every sample fed to training or inference is resized to this fixed
/// square; the recognizer computes distances over this representation.
pub const SAMPLE_SIZE: u32 = 200;

/// Fixed acceptance threshold for a recognition distance.
///
/// Distances are non-negative and lower means a better match, so the
/// comparison direction is `distance < threshold`.
pub const DISTANCE_THRESHOLD: f32 = 100.0;

/// Rectangular face region in frame coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Detector confidence in [0, 1].
    pub confidence: f32,
}

/// A normalized grayscale face sample, [`SAMPLE_SIZE`]² pixels.
///
/// Ephemeral — exists only during enrollment capture and recognition
/// inference, never persisted individually.
#[derive(Debug, Clone)]
pub struct Sample {
    data: Vec<u8>,
}

impl Sample {
    /// Wrap pre-normalized pixel data. Returns `None` when the buffer is
    /// not exactly [`SAMPLE_SIZE`]² bytes.
    pub fn from_raw(data: Vec<u8>) -> Option<Self> {
        if data.len() == (SAMPLE_SIZE * SAMPLE_SIZE) as usize {
            Some(Self { data })
        } else {
            None
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }
}

/// Recognizer output: the nearest enrolled identity and its distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub identity: i64,
    /// Non-negative; lower = more confident.
    pub distance: f32,
}

impl Prediction {
    /// Whether this prediction clears the acceptance threshold.
    pub fn accepted(&self, threshold: f32) -> bool {
        self.distance < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_from_raw_exact() {
        let data = vec![0u8; (SAMPLE_SIZE * SAMPLE_SIZE) as usize];
        assert!(Sample::from_raw(data).is_some());
    }

    #[test]
    fn test_sample_from_raw_wrong_size() {
        assert!(Sample::from_raw(vec![0u8; 100]).is_none());
    }

    #[test]
    fn test_prediction_below_threshold_accepted() {
        let p = Prediction { identity: 1, distance: 40.0 };
        assert!(p.accepted(DISTANCE_THRESHOLD));
    }

    #[test]
    fn test_prediction_at_threshold_rejected() {
        // The gate is strict: distance == threshold does not accept.
        let p = Prediction { identity: 1, distance: 100.0 };
        assert!(!p.accepted(DISTANCE_THRESHOLD));
    }

    #[test]
    fn test_prediction_direction_monotone() {
        // A lower distance must never be classified as less confident.
        for (lo, hi) in [(0.0f32, 50.0f32), (40.0, 140.0), (99.0, 100.0)] {
            let near = Prediction { identity: 1, distance: lo };
            let far = Prediction { identity: 1, distance: hi };
            assert!(near.accepted(DISTANCE_THRESHOLD) || !far.accepted(DISTANCE_THRESHOLD));
        }
    }
}

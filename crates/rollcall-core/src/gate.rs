//! Confidence-gated commit decision for the recognition pipeline.
//!
//! Pure and device-free: the frame loop gathers the detected face count
//! and (for a singleton face) a prediction, then asks this gate whether
//! the attendance commit may proceed.

use crate::types::Prediction;

/// Decision for an explicit "mark attendance" signal.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkDecision {
    /// Exactly one face, distance below threshold: commit the event.
    Commit(Prediction),
    /// Exactly one face, but the match does not clear the threshold
    /// (or the model is untrained). Recoverable; the loop continues.
    NotRecognized(Option<Prediction>),
    /// Face count at signal time was not exactly one. Recoverable.
    NeedOneFace { found: usize },
}

/// Gate an attendance commit on the singleton-face and distance rules.
///
/// `prediction` is the recognizer output for the single detected face;
/// it is ignored unless `face_count == 1`.
pub fn decide_mark(
    face_count: usize,
    prediction: Option<Prediction>,
    threshold: f32,
) -> MarkDecision {
    if face_count != 1 {
        return MarkDecision::NeedOneFace { found: face_count };
    }
    match prediction {
        Some(p) if p.accepted(threshold) => MarkDecision::Commit(p),
        other => MarkDecision::NotRecognized(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DISTANCE_THRESHOLD;

    fn prediction(distance: f32) -> Prediction {
        Prediction { identity: 42, distance }
    }

    #[test]
    fn test_commit_on_confident_singleton() {
        let d = decide_mark(1, Some(prediction(40.0)), DISTANCE_THRESHOLD);
        assert_eq!(d, MarkDecision::Commit(prediction(40.0)));
    }

    #[test]
    fn test_reject_above_threshold() {
        let d = decide_mark(1, Some(prediction(140.0)), DISTANCE_THRESHOLD);
        assert_eq!(d, MarkDecision::NotRecognized(Some(prediction(140.0))));
    }

    #[test]
    fn test_reject_at_threshold_boundary() {
        let d = decide_mark(1, Some(prediction(100.0)), DISTANCE_THRESHOLD);
        assert!(matches!(d, MarkDecision::NotRecognized(_)));
    }

    #[test]
    fn test_face_count_gate() {
        for count in [0usize, 2, 5] {
            let d = decide_mark(count, Some(prediction(1.0)), DISTANCE_THRESHOLD);
            assert_eq!(d, MarkDecision::NeedOneFace { found: count });
        }
    }

    #[test]
    fn test_untrained_model_not_recognized() {
        let d = decide_mark(1, None, DISTANCE_THRESHOLD);
        assert_eq!(d, MarkDecision::NotRecognized(None));
    }

    #[test]
    fn test_distance_direction_monotone() {
        // A lower distance is never treated as less confident than a
        // higher one under the fixed threshold rule.
        let mut last_committed = true;
        for distance in [0.0f32, 40.0, 99.9, 100.0, 140.0, 500.0] {
            let committed = matches!(
                decide_mark(1, Some(prediction(distance)), DISTANCE_THRESHOLD),
                MarkDecision::Commit(_)
            );
            assert!(last_committed || !committed, "non-monotone at {distance}");
            last_committed = committed;
        }
    }
}

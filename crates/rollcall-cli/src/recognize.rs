//! Recognition / attendance-marking pipeline.
//!
//! Every frame is annotated with the best prediction per face; nothing is
//! written to the store until the operator sends the mark signal. A mark
//! only commits when exactly one face is visible and its distance clears
//! the acceptance threshold, and the pipeline exits after a single commit.

use crate::error::PipelineError;
use chrono::Utc;
use rollcall_core::{decide_mark, sample, Detect, MarkDecision, Prediction, Recognize};
use rollcall_hw::{FrameSource, KeySignal, SignalSource};
use rollcall_store::{AttendanceStore, IdentityCache, UNKNOWN_NAME};
use std::io::Write;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Terminal state of one marking run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    Committed { user_id: i64, name: String },
    Cancelled,
}

/// Run the attendance-marking loop until a commit or a quit signal.
pub fn run_mark(
    frames: &mut impl FrameSource,
    signals: &mut impl SignalSource,
    detector: &mut impl Detect,
    recognizer: &mut impl Recognize,
    store: &AttendanceStore,
    cache: &IdentityCache,
    threshold: f32,
) -> Result<MarkOutcome, PipelineError> {
    println!("Press 'a' to mark attendance, 'q' to quit");

    loop {
        let frame = frames.next_frame()?;
        let regions = detector.detect(&frame.data, frame.width, frame.height)?;

        let mut labels = Vec::with_capacity(regions.len());
        for region in &regions {
            let prediction = sample::extract(&frame.data, frame.width, frame.height, region)
                .and_then(|s| recognizer.predict(&s));
            labels.push(annotate(prediction, cache, threshold));
        }

        print!("\r\x1b[Kfaces: {}", regions.len());
        for label in &labels {
            print!("  {label}");
        }
        let _ = std::io::stdout().flush();

        match signals.poll_signal() {
            Some(KeySignal::Quit) => {
                println!();
                return Ok(MarkOutcome::Cancelled);
            }
            Some(KeySignal::Mark) => {
                let prediction = if regions.len() == 1 {
                    sample::extract(&frame.data, frame.width, frame.height, &regions[0])
                        .and_then(|s| recognizer.predict(&s))
                } else {
                    None
                };
                match decide_mark(regions.len(), prediction, threshold) {
                    MarkDecision::Commit(prediction) => {
                        let name = cache.lookup(prediction.identity).to_string();
                        store.insert_attendance(prediction.identity, Utc::now())?;
                        println!("\nAttendance marked for {name}");
                        tracing::info!(
                            user_id = prediction.identity,
                            distance = prediction.distance,
                            "attendance committed"
                        );
                        return Ok(MarkOutcome::Committed {
                            user_id: prediction.identity,
                            name,
                        });
                    }
                    MarkDecision::NotRecognized(prediction) => {
                        if let Some(p) = &prediction {
                            tracing::debug!(
                                identity = p.identity,
                                distance = p.distance,
                                "mark rejected, distance above threshold"
                            );
                        }
                        println!("\nFace not recognized with sufficient confidence");
                    }
                    MarkDecision::NeedOneFace { found } => {
                        println!("\nPlease ensure exactly one face is visible (found {found})");
                    }
                }
            }
            Some(KeySignal::Capture) | None => {}
        }
    }
}

/// Render one face annotation: the cache-resolved name and distance, with
/// the color encoding the threshold comparison. The "Unknown" sentinel
/// appears only when the identity is absent from the cache (or the model
/// is untrained), never merely because the match is weak.
fn annotate(prediction: Option<Prediction>, cache: &IdentityCache, threshold: f32) -> String {
    match prediction {
        Some(p) if p.accepted(threshold) => {
            format!("{GREEN}{} ({:.0}){RESET}", cache.lookup(p.identity), p.distance)
        }
        Some(p) => format!("{RED}{} ({:.0}){RESET}", cache.lookup(p.identity), p.distance),
        None => format!("{RED}{UNKNOWN_NAME}{RESET}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with(identity: i64, name: &str) -> IdentityCache {
        let mut cache = IdentityCache::default();
        cache.insert(identity, name.to_string());
        cache
    }

    #[test]
    fn test_annotate_accepted_shows_name_in_green() {
        let cache = cache_with(7, "Alice");
        let label = annotate(Some(Prediction { identity: 7, distance: 40.0 }), &cache, 100.0);
        assert_eq!(label, format!("{GREEN}Alice (40){RESET}"));
    }

    #[test]
    fn test_annotate_weak_match_keeps_resolved_name_in_red() {
        // Above-threshold is "not confident", not "not enrolled": the
        // resolved name stays, only the color flips.
        let cache = cache_with(7, "Alice");
        let label = annotate(Some(Prediction { identity: 7, distance: 140.0 }), &cache, 100.0);
        assert_eq!(label, format!("{RED}Alice (140){RESET}"));
    }

    #[test]
    fn test_annotate_uncached_identity_is_unknown() {
        let cache = IdentityCache::default();
        let label = annotate(Some(Prediction { identity: 42, distance: 40.0 }), &cache, 100.0);
        assert_eq!(label, format!("{GREEN}{UNKNOWN_NAME} (40){RESET}"));
    }

    #[test]
    fn test_annotate_no_prediction_is_unknown() {
        let cache = cache_with(7, "Alice");
        let label = annotate(None, &cache, 100.0);
        assert_eq!(label, format!("{RED}{UNKNOWN_NAME}{RESET}"));
    }
}

//! Enrollment pipeline.
//!
//! Register → Capturing → Training → Completed / Aborted. The identity is
//! committed to the store (and the cache updated) before capture begins,
//! so a recognition in the same session can already resolve the name.
//! Enrollment is not atomic across the store and the model: an abort or a
//! training failure leaves the identity row behind, untrained.

use crate::error::PipelineError;
use chrono::Utc;
use rollcall_core::{CaptureOutcome, Detect, Recognize, SampleCollector};
use rollcall_hw::{frame, FrameSource, KeySignal, SignalSource};
use rollcall_store::{AttendanceStore, IdentityCache};
use std::io::Write;
use std::path::Path;

/// Fraction of low-luma pixels above which a faceless frame is reported
/// as too dark rather than as a detection miss.
const DARK_SCENE_PCT: f32 = 0.9;

/// Terminal state of one enrollment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollOutcome {
    Completed { user_id: i64 },
    /// Aborted before the sample target was reached. The identity row
    /// remains in the store, untrained — the operator must re-enroll or
    /// remove it manually.
    Aborted { user_id: i64, captured: usize },
}

/// Run the enrollment pipeline for a new identity.
///
/// `frames` and `signals` drive the interactive loop; a signal is only
/// observed between frame reads.
#[allow(clippy::too_many_arguments)]
pub fn run_enroll(
    name: &str,
    frames: &mut impl FrameSource,
    signals: &mut impl SignalSource,
    detector: &mut impl Detect,
    recognizer: &mut impl Recognize,
    store: &AttendanceStore,
    cache: &mut IdentityCache,
    sample_target: usize,
    model_path: &Path,
) -> Result<EnrollOutcome, PipelineError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PipelineError::EmptyName);
    }

    // Register: commit the identity and make it resolvable immediately.
    let user_id = store.insert_user(name, Utc::now())?;
    cache.insert(user_id, name.to_string());

    println!("Look straight at the camera; press 'c' to capture ({sample_target} samples needed), 'q' to abort");

    let mut collector = SampleCollector::new(sample_target);

    // Capturing: advance only on an explicit capture signal.
    loop {
        let frame = frames.next_frame()?;
        let regions = detector.detect(&frame.data, frame.width, frame.height)?;

        print!(
            "\r\x1b[Kfaces: {}  captured: {}/{}",
            regions.len(),
            collector.captured(),
            sample_target
        );
        let _ = std::io::stdout().flush();

        match signals.poll_signal() {
            Some(KeySignal::Quit) => {
                println!();
                tracing::warn!(
                    user_id,
                    captured = collector.captured(),
                    "enrollment aborted; identity remains in store untrained"
                );
                println!("Enrollment incomplete - not enough samples");
                return Ok(EnrollOutcome::Aborted { user_id, captured: collector.captured() });
            }
            Some(KeySignal::Capture) => {
                match collector.offer(&frame.data, frame.width, frame.height, &regions) {
                    CaptureOutcome::Accepted { captured, target } => {
                        println!("\nCaptured sample {captured}/{target}");
                    }
                    CaptureOutcome::NeedOneFace { found } => {
                        if found == 0 && frame::is_dark_frame(&frame.data, DARK_SCENE_PCT) {
                            println!("\nScene looks too dark; no face visible");
                        } else {
                            println!("\nPlease ensure exactly one face is visible (found {found})");
                        }
                    }
                    CaptureOutcome::Complete => {}
                }
            }
            Some(KeySignal::Mark) | None => {}
        }

        if collector.is_complete() {
            break;
        }
    }

    // Training: submit the full batch, then persist the model artifact.
    let samples = collector.into_samples();
    recognizer.update(&samples, user_id);
    recognizer.persist(model_path)?;

    println!("Successfully registered {name}");
    Ok(EnrollOutcome::Completed { user_id })
}

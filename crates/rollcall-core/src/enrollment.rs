//! Enrollment sample collection.
//!
//! [`SampleCollector`] is the capture side of the enrollment state
//! machine: it accepts a capture attempt only when detection found
//! exactly one face region, accumulates normalized samples, and reports
//! when the fixed target count is reached. The frame/keystroke loop stays
//! outside; this type sees only detections and pixels.

use crate::sample;
use crate::types::{FaceRegion, Sample};

/// Outcome of one operator capture attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Sample accepted; `captured` of `target` are now buffered.
    Accepted { captured: usize, target: usize },
    /// Zero or multiple faces in the frame; nothing buffered, retry.
    NeedOneFace { found: usize },
    /// Target already reached; no further samples are accepted.
    Complete,
}

/// Accumulates normalized face samples toward a fixed target count.
pub struct SampleCollector {
    target: usize,
    samples: Vec<Sample>,
}

impl SampleCollector {
    pub fn new(target: usize) -> Self {
        Self { target, samples: Vec::with_capacity(target) }
    }

    /// Handle an explicit capture signal against the current frame.
    ///
    /// Advances only when `regions` holds exactly one face; the region is
    /// normalized to the fixed sample dimensions and buffered.
    pub fn offer(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
        regions: &[FaceRegion],
    ) -> CaptureOutcome {
        if self.is_complete() {
            return CaptureOutcome::Complete;
        }
        if regions.len() != 1 {
            return CaptureOutcome::NeedOneFace { found: regions.len() };
        }

        match sample::extract(gray, width, height, &regions[0]) {
            Some(sample) => {
                self.samples.push(sample);
                CaptureOutcome::Accepted {
                    captured: self.samples.len(),
                    target: self.target,
                }
            }
            // Degenerate region out of frame bounds; treat like a miss.
            None => CaptureOutcome::NeedOneFace { found: 0 },
        }
    }

    pub fn is_complete(&self) -> bool {
        self.samples.len() >= self.target
    }

    pub fn captured(&self) -> usize {
        self.samples.len()
    }

    /// Consume the collector, yielding the buffered samples.
    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}

//! LBP-histogram face recognizer.
//!
//! Each training sample is reduced to local-binary-pattern histograms over
//! an 8×8 grid of cells. Prediction is nearest-neighbour over all stored
//! histograms using chi-square distance, scaled so that identical samples
//! score 0 and fully disjoint histograms score 200 — the fixed acceptance
//! threshold of 100 sits mid-range.
//!
//! The trained model is an opaque single-file JSON artifact, loaded at
//! process start and overwritten wholesale after every successful
//! enrollment.

use crate::types::{Prediction, Sample, SAMPLE_SIZE};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

/// Cells per side of the histogram grid.
const GRID: usize = 8;
const CELLS: usize = GRID * GRID;
const BINS: usize = 256;

#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("model artifact io: {0}")]
    Io(#[from] std::io::Error),
    #[error("model artifact malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Incremental face recognizer.
///
/// `update` is safe to call repeatedly for different identities without
/// forgetting earlier ones. `predict` returns `None` while untrained.
pub trait Recognize {
    fn update(&mut self, samples: &[Sample], identity: i64);
    fn predict(&self, sample: &Sample) -> Option<Prediction>;
    fn persist(&self, path: &Path) -> Result<(), RecognizerError>;
}

/// One stored training observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelEntry {
    identity: i64,
    histogram: Vec<f32>,
}

/// LBP-histogram recognizer with nearest-neighbour chi-square matching.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LbphRecognizer {
    entries: Vec<ModelEntry>,
}

impl LbphRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the model artifact, or start empty when none exists yet.
    pub fn load_or_empty(path: &Path) -> Result<Self, RecognizerError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no trained model artifact; starting empty");
            return Ok(Self::new());
        }
        let file = File::open(path)?;
        let model: Self = serde_json::from_reader(BufReader::new(file))?;
        tracing::info!(
            path = %path.display(),
            observations = model.entries.len(),
            "loaded trained model"
        );
        Ok(model)
    }

    /// Number of stored training observations.
    pub fn observations(&self) -> usize {
        self.entries.len()
    }

    /// Distinct identities present in the model.
    pub fn identities(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.entries.iter().map(|e| e.identity).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

impl Recognize for LbphRecognizer {
    fn update(&mut self, samples: &[Sample], identity: i64) {
        for sample in samples {
            self.entries.push(ModelEntry {
                identity,
                histogram: lbp_histogram(sample),
            });
        }
        tracing::debug!(
            identity,
            added = samples.len(),
            total = self.entries.len(),
            "recognizer updated"
        );
    }

    fn predict(&self, sample: &Sample) -> Option<Prediction> {
        let probe = lbp_histogram(sample);
        let mut best: Option<Prediction> = None;

        for entry in &self.entries {
            let distance = chi_square(&probe, &entry.histogram);
            let better = match best {
                None => true,
                Some(p) => distance < p.distance,
            };
            if better {
                best = Some(Prediction { identity: entry.identity, distance });
            }
        }

        best
    }

    fn persist(&self, path: &Path) -> Result<(), RecognizerError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        tracing::info!(
            path = %path.display(),
            observations = self.entries.len(),
            "persisted trained model"
        );
        Ok(())
    }
}

/// Compute per-cell LBP histograms for a sample, normalized within each
/// cell, concatenated into one feature vector.
fn lbp_histogram(sample: &Sample) -> Vec<f32> {
    let size = SAMPLE_SIZE as usize;
    let pixels = sample.pixels();
    let cell = size / GRID;
    let cell_pixels = (cell * cell) as f32;

    let at = |x: i64, y: i64| -> u8 {
        let x = x.clamp(0, size as i64 - 1) as usize;
        let y = y.clamp(0, size as i64 - 1) as usize;
        pixels[y * size + x]
    };

    let mut feature = vec![0.0f32; CELLS * BINS];

    for y in 0..size {
        for x in 0..size {
            let center = pixels[y * size + x];
            let (xi, yi) = (x as i64, y as i64);
            // 8-neighbour pattern, clockwise from top-left.
            let neighbours = [
                at(xi - 1, yi - 1),
                at(xi, yi - 1),
                at(xi + 1, yi - 1),
                at(xi + 1, yi),
                at(xi + 1, yi + 1),
                at(xi, yi + 1),
                at(xi - 1, yi + 1),
                at(xi - 1, yi),
            ];
            let mut code = 0u8;
            for (bit, &n) in neighbours.iter().enumerate() {
                if n >= center {
                    code |= 1 << bit;
                }
            }

            let cell_idx = (y / cell).min(GRID - 1) * GRID + (x / cell).min(GRID - 1);
            feature[cell_idx * BINS + code as usize] += 1.0;
        }
    }

    for v in feature.iter_mut() {
        *v /= cell_pixels;
    }
    feature
}

/// Chi-square distance between two concatenated histograms, scaled by
/// 100 / cell count. Identical histograms score 0; fully disjoint ones
/// score 200.
fn chi_square(a: &[f32], b: &[f32]) -> f32 {
    let mut total = 0.0f32;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let denom = x + y;
        if denom > f32::EPSILON {
            let diff = x - y;
            total += diff * diff / denom;
        }
    }
    100.0 * total / CELLS as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DISTANCE_THRESHOLD;

    fn uniform_sample(value: u8) -> Sample {
        Sample::from_raw(vec![value; (SAMPLE_SIZE * SAMPLE_SIZE) as usize]).unwrap()
    }

    /// Horizontal gradient. Almost no pixel has all neighbours >= itself,
    /// so its LBP codes land far from the uniform sample's.
    fn gradient_sample() -> Sample {
        let size = SAMPLE_SIZE as usize;
        let data: Vec<u8> = (0..size * size).map(|i| (i % size) as u8).collect();
        Sample::from_raw(data).unwrap()
    }

    #[test]
    fn test_histogram_normalized_per_cell() {
        let hist = lbp_histogram(&uniform_sample(100));
        for cell in 0..CELLS {
            let sum: f32 = hist[cell * BINS..(cell + 1) * BINS].iter().sum();
            assert!((sum - 1.0).abs() < 1e-3, "cell {cell} sums to {sum}");
        }
    }

    #[test]
    fn test_chi_square_identical_is_zero() {
        let hist = lbp_histogram(&uniform_sample(100));
        assert!(chi_square(&hist, &hist).abs() < 1e-6);
    }

    #[test]
    fn test_chi_square_disjoint_is_two_hundred() {
        let a = lbp_histogram(&uniform_sample(100));
        let b = lbp_histogram(&gradient_sample());
        let d = chi_square(&a, &b);
        assert!(d > 100.0, "disjoint patterns should exceed the threshold, got {d}");
        assert!(d <= 200.0 + 1e-3);
    }

    #[test]
    fn test_predict_untrained_is_none() {
        let recognizer = LbphRecognizer::new();
        assert!(recognizer.predict(&uniform_sample(50)).is_none());
    }

    #[test]
    fn test_predict_exact_match_accepted() {
        let mut recognizer = LbphRecognizer::new();
        recognizer.update(&[uniform_sample(100)], 7);
        let p = recognizer.predict(&uniform_sample(100)).unwrap();
        assert_eq!(p.identity, 7);
        assert!(p.accepted(DISTANCE_THRESHOLD));
        assert!(p.distance.abs() < 1e-6);
    }

    #[test]
    fn test_predict_dissimilar_rejected() {
        let mut recognizer = LbphRecognizer::new();
        recognizer.update(&[uniform_sample(100)], 7);
        let p = recognizer.predict(&gradient_sample()).unwrap();
        assert!(!p.accepted(DISTANCE_THRESHOLD), "distance {}", p.distance);
    }

    #[test]
    fn test_update_is_incremental() {
        // Enrolling a second identity must not degrade the first.
        let mut recognizer = LbphRecognizer::new();
        recognizer.update(&[uniform_sample(100)], 1);
        recognizer.update(&[gradient_sample()], 2);

        let first = recognizer.predict(&uniform_sample(100)).unwrap();
        assert_eq!(first.identity, 1);
        let second = recognizer.predict(&gradient_sample()).unwrap();
        assert_eq!(second.identity, 2);
        assert_eq!(recognizer.identities(), vec![1, 2]);
    }

    #[test]
    fn test_persist_roundtrip() {
        let dir = std::env::temp_dir().join("rollcall-recognizer-test");
        let path = dir.join("recognizer.json");
        let _ = std::fs::remove_file(&path);

        let mut recognizer = LbphRecognizer::new();
        recognizer.update(&[uniform_sample(100), uniform_sample(101)], 3);
        recognizer.persist(&path).unwrap();

        let loaded = LbphRecognizer::load_or_empty(&path).unwrap();
        assert_eq!(loaded.observations(), 2);
        let p = loaded.predict(&uniform_sample(100)).unwrap();
        assert_eq!(p.identity, 3);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_artifact_is_empty() {
        let path = std::env::temp_dir().join("rollcall-recognizer-missing.json");
        let _ = std::fs::remove_file(&path);
        let recognizer = LbphRecognizer::load_or_empty(&path).unwrap();
        assert_eq!(recognizer.observations(), 0);
    }
}

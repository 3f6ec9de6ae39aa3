//! SCRFD face detector via ONNX Runtime.
//!
//! Anchor-free multi-stride decoding with NMS. Only box outputs are
//! consumed; the recognizer normalizes faces by crop + resize, so
//! landmark tensors (when the model exports them) are ignored.

use crate::types::FaceRegion;
use image::imageops::FilterType;
use image::GrayImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const SCRFD_INPUT_SIZE: usize = 640;
const SCRFD_MEAN: f32 = 127.5;
const SCRFD_STD: f32 = 128.0;
const SCRFD_CONFIDENCE_THRESHOLD: f32 = 0.5;
const SCRFD_NMS_THRESHOLD: f32 = 0.4;
const SCRFD_STRIDES: [usize; 3] = [8, 16, 32];
const SCRFD_ANCHORS_PER_CELL: usize = 2;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0} — download an SCRFD export and place it in the model dir")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("frame buffer malformed: expected {expected} bytes, got {actual}")]
    BadFrame { expected: usize, actual: usize },
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Locates face regions in a grayscale frame.
///
/// Implementations return zero or more regions; no ordering is relied
/// upon beyond "singleton vs. not".
pub trait Detect {
    fn detect(&mut self, gray: &[u8], width: u32, height: u32)
        -> Result<Vec<FaceRegion>, DetectorError>;
}

/// Output tensor indices for one stride: (score, bbox).
type StrideOutputs = (usize, usize);

/// SCRFD-based face detector.
pub struct ScrfdDetector {
    session: Session,
    /// Per-stride (score, bbox) output indices for strides [8, 16, 32].
    stride_outputs: [StrideOutputs; 3],
}

/// A detection candidate in frame coordinates, pre-NMS.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
}

impl ScrfdDetector {
    /// Load an SCRFD ONNX model from the given path.
    pub fn load(model_path: &str) -> Result<Self, DetectorError> {
        if !Path::new(model_path).exists() {
            return Err(DetectorError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> =
            session.outputs().iter().map(|o| o.name().to_string()).collect();

        tracing::info!(
            path = model_path,
            outputs = ?output_names,
            "loaded SCRFD model"
        );

        if output_names.len() < 6 {
            return Err(DetectorError::InferenceFailed(format!(
                "SCRFD model requires at least 6 outputs (3 strides × score/bbox), got {}",
                output_names.len()
            )));
        }

        let stride_outputs = map_outputs(&output_names);
        tracing::debug!(?stride_outputs, "SCRFD output tensor mapping");

        Ok(Self { session, stride_outputs })
    }

    /// Preprocess a grayscale frame into a NCHW float tensor, letterboxed
    /// into the top-left of the model input. Returns the tensor and the
    /// resize scale for mapping detections back to frame coordinates.
    fn preprocess(
        &self,
        gray: &[u8],
        width: u32,
        height: u32,
    ) -> Result<(Array4<f32>, f32), DetectorError> {
        let expected = (width * height) as usize;
        if gray.len() < expected {
            return Err(DetectorError::BadFrame { expected, actual: gray.len() });
        }

        let scale = SCRFD_INPUT_SIZE as f32 / width.max(height) as f32;
        let new_w = ((width as f32 * scale).round() as u32).max(1);
        let new_h = ((height as f32 * scale).round() as u32).max(1);

        let frame = GrayImage::from_raw(width, height, gray[..expected].to_vec())
            .ok_or(DetectorError::BadFrame { expected, actual: gray.len() })?;
        let resized = image::imageops::resize(&frame, new_w, new_h, FilterType::Triangle);

        let size = SCRFD_INPUT_SIZE;
        let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
        for y in 0..size {
            for x in 0..size {
                let pixel = if (x as u32) < new_w && (y as u32) < new_h {
                    resized.get_pixel(x as u32, y as u32)[0] as f32
                } else {
                    SCRFD_MEAN // pad value normalizes to 0.0
                };
                let normalized = (pixel - SCRFD_MEAN) / SCRFD_STD;
                tensor[[0, 0, y, x]] = normalized;
                tensor[[0, 1, y, x]] = normalized;
                tensor[[0, 2, y, x]] = normalized;
            }
        }

        Ok((tensor, scale))
    }
}

impl Detect for ScrfdDetector {
    /// Detect faces, returning integer regions clamped to the frame.
    fn detect(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<FaceRegion>, DetectorError> {
        let (input, scale) = self.preprocess(gray, width, height)?;

        let outputs =
            self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let mut candidates = Vec::new();
        for (pos, &stride) in SCRFD_STRIDES.iter().enumerate() {
            let (score_idx, bbox_idx) = self.stride_outputs[pos];

            let (_, scores) = outputs[score_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("scores stride {stride}: {e}")))?;
            let (_, bboxes) = outputs[bbox_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| DetectorError::InferenceFailed(format!("bboxes stride {stride}: {e}")))?;

            decode_level(scores, bboxes, stride, scale, &mut candidates);
        }

        let kept = suppress(candidates, SCRFD_NMS_THRESHOLD);
        Ok(kept.iter().map(|c| to_region(c, width, height)).collect())
    }
}

/// Map output tensors to (score, bbox) slots per stride.
///
/// Prefers name-based discovery ("score_8", "bbox_16", ...); falls back
/// to the standard positional export ordering ([0-2] scores, [3-5] boxes)
/// when the names are generic.
fn map_outputs(names: &[String]) -> [StrideOutputs; 3] {
    let find = |prefix: &str, stride: usize| -> Option<usize> {
        let target = format!("{prefix}_{stride}");
        names.iter().position(|n| n == &target)
    };

    let named = SCRFD_STRIDES
        .iter()
        .all(|&s| find("score", s).is_some() && find("bbox", s).is_some());

    if named {
        tracing::info!("SCRFD: using name-based output mapping");
        std::array::from_fn(|i| {
            let stride = SCRFD_STRIDES[i];
            (find("score", stride).unwrap(), find("bbox", stride).unwrap())
        })
    } else {
        tracing::info!(?names, "SCRFD: output names not recognized, using positional mapping");
        [(0, 3), (1, 4), (2, 5)]
    }
}

/// Decode one stride level into frame-space candidates.
fn decode_level(
    scores: &[f32],
    bboxes: &[f32],
    stride: usize,
    scale: f32,
    out: &mut Vec<Candidate>,
) {
    let grid = SCRFD_INPUT_SIZE / stride;
    let num_anchors = grid * grid * SCRFD_ANCHORS_PER_CELL;
    let inv_scale = 1.0 / scale;

    for idx in 0..num_anchors {
        let score = scores.get(idx).copied().unwrap_or(0.0);
        if score <= SCRFD_CONFIDENCE_THRESHOLD {
            continue;
        }
        let off = idx * 4;
        if off + 3 >= bboxes.len() {
            continue;
        }

        let cell = idx / SCRFD_ANCHORS_PER_CELL;
        let cx = ((cell % grid) * stride) as f32;
        let cy = ((cell / grid) * stride) as f32;

        // Offsets are distances from the anchor center, in stride units.
        let x1 = (cx - bboxes[off] * stride as f32) * inv_scale;
        let y1 = (cy - bboxes[off + 1] * stride as f32) * inv_scale;
        let x2 = (cx + bboxes[off + 2] * stride as f32) * inv_scale;
        let y2 = (cy + bboxes[off + 3] * stride as f32) * inv_scale;

        if x2 > x1 && y2 > y1 {
            out.push(Candidate { x1, y1, x2, y2, score });
        }
    }
}

/// Non-maximum suppression over candidates, best score first.
fn suppress(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Candidate> = Vec::new();
    for c in candidates {
        if kept.iter().all(|k| overlap(k, &c) <= iou_threshold) {
            kept.push(c);
        }
    }
    kept
}

/// Intersection-over-union of two candidates.
fn overlap(a: &Candidate, b: &Candidate) -> f32 {
    let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let inter = ix * iy;
    let union = (a.x2 - a.x1) * (a.y2 - a.y1) + (b.x2 - b.x1) * (b.y2 - b.y1) - inter;
    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}

/// Clamp a candidate to frame bounds and round to an integer region.
fn to_region(c: &Candidate, width: u32, height: u32) -> FaceRegion {
    let x1 = c.x1.max(0.0).min(width as f32) as u32;
    let y1 = c.y1.max(0.0).min(height as f32) as u32;
    let x2 = c.x2.max(0.0).min(width as f32) as u32;
    let y2 = c.y2.max(0.0).min(height as f32) as u32;
    FaceRegion {
        x: x1,
        y: y1,
        width: x2.saturating_sub(x1),
        height: y2.saturating_sub(y1),
        confidence: c.score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Candidate {
        Candidate { x1, y1, x2, y2, score }
    }

    #[test]
    fn test_overlap_identical() {
        let a = cand(0.0, 0.0, 100.0, 100.0, 1.0);
        assert!((overlap(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_overlap_disjoint() {
        let a = cand(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = cand(20.0, 20.0, 30.0, 30.0, 1.0);
        assert!(overlap(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_overlap_half() {
        let a = cand(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = cand(5.0, 0.0, 15.0, 10.0, 1.0);
        // intersection 50, union 150
        assert!((overlap(&a, &b) - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_suppress_removes_overlapping() {
        let cands = vec![
            cand(0.0, 0.0, 100.0, 100.0, 0.9),
            cand(5.0, 5.0, 105.0, 105.0, 0.8),
            cand(200.0, 200.0, 250.0, 250.0, 0.7),
        ];
        let kept = suppress(cands, 0.4);
        assert_eq!(kept.len(), 2);
        assert!((kept[0].score - 0.9).abs() < 1e-6);
        assert!((kept[1].score - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_suppress_empty() {
        assert!(suppress(vec![], 0.4).is_empty());
    }

    #[test]
    fn test_to_region_clamps_to_frame() {
        let c = cand(-10.0, -5.0, 700.0, 500.0, 0.8);
        let r = to_region(&c, 640, 480);
        assert_eq!((r.x, r.y), (0, 0));
        assert_eq!((r.width, r.height), (640, 480));
    }

    #[test]
    fn test_map_outputs_named() {
        let names: Vec<String> = [
            "score_8", "score_16", "score_32",
            "bbox_8", "bbox_16", "bbox_32",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(map_outputs(&names), [(0, 3), (1, 4), (2, 5)]);
    }

    #[test]
    fn test_map_outputs_shuffled_named() {
        let names: Vec<String> = [
            "bbox_8", "score_8", "bbox_16",
            "score_16", "bbox_32", "score_32",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(map_outputs(&names), [(1, 0), (3, 2), (5, 4)]);
    }

    #[test]
    fn test_map_outputs_positional_fallback() {
        let names: Vec<String> = (0..9).map(|i: usize| i.to_string()).collect();
        assert_eq!(map_outputs(&names), [(0, 3), (1, 4), (2, 5)]);
    }

    #[test]
    fn test_decode_level_thresholds_scores() {
        // One anchor above threshold at stride 32, scale 1.0.
        let grid = SCRFD_INPUT_SIZE / 32;
        let n = grid * grid * SCRFD_ANCHORS_PER_CELL;
        let mut scores = vec![0.0f32; n];
        let mut bboxes = vec![0.0f32; n * 4];
        scores[0] = 0.9;
        // 1 stride-unit in every direction => a 64x64 box around (0, 0).
        bboxes[0..4].copy_from_slice(&[1.0, 1.0, 1.0, 1.0]);

        let mut out = Vec::new();
        decode_level(&scores, &bboxes, 32, 1.0, &mut out);
        assert_eq!(out.len(), 1);
        assert!((out[0].score - 0.9).abs() < 1e-6);
        assert!((out[0].x2 - out[0].x1 - 64.0).abs() < 1e-3);
    }
}

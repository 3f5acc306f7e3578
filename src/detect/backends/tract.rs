#![cfg(feature = "detect-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::detector::{DetectionBox, Detector};

const INPUT_WIDTH: u32 = 320;
const INPUT_HEIGHT: u32 = 240;
const SCORE_THRESHOLD: f32 = 0.7;
const IOU_THRESHOLD: f32 = 0.4;

/// Tract-based face detector for Ultraface RFB-320 style ONNX models.
///
/// The model takes a 320x240 RGB tensor and emits per-anchor face
/// scores plus normalized corner boxes. Frames arrive here as a
/// grayscale plane, so the single channel is replicated; Ultraface
/// tolerates this fine.
pub struct TractFaceDetector {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>,
    score_threshold: f32,
}

impl TractFaceDetector {
    /// Load an ONNX face model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("load ONNX face model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, INPUT_HEIGHT as usize, INPUT_WIDTH as usize),
                ),
            )
            .context("set face model input fact")?
            .into_optimized()
            .context("optimize face model")?
            .into_runnable()
            .context("build runnable face model")?;

        Ok(Self {
            model,
            score_threshold: SCORE_THRESHOLD,
        })
    }

    /// Override the default confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        if width != INPUT_WIDTH || height != INPUT_HEIGHT {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                width,
                height,
                INPUT_WIDTH,
                INPUT_HEIGHT
            ));
        }
        let expected_len = (width as usize) * (height as usize);
        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} grayscale bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }

        let width = width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, height as usize, width),
            |(_, _, y, x)| (pixels[y * width + x] as f32 - 127.0) / 128.0,
        );
        Ok(input.into_tensor())
    }
}

impl Detector for TractFaceDetector {
    fn name(&self) -> &'static str {
        "face"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<DetectionBox>> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("face model inference failed")?;

        let scores = outputs
            .first()
            .ok_or_else(|| anyhow!("face model produced no score output"))?
            .to_array_view::<f32>()
            .context("score output was not f32")?;
        let boxes = outputs
            .get(1)
            .ok_or_else(|| anyhow!("face model produced no box output"))?
            .to_array_view::<f32>()
            .context("box output was not f32")?;

        let anchors = scores.shape().get(1).copied().unwrap_or(0);
        if boxes.shape().get(1).copied().unwrap_or(0) != anchors {
            return Err(anyhow!("score/box anchor counts disagree"));
        }

        let mut candidates: Vec<(f32, DetectionBox)> = Vec::new();
        for i in 0..anchors {
            let score = scores[[0, i, 1]];
            if score < self.score_threshold {
                continue;
            }
            let x1 = boxes[[0, i, 0]] * width as f32;
            let y1 = boxes[[0, i, 1]] * height as f32;
            let x2 = boxes[[0, i, 2]] * width as f32;
            let y2 = boxes[[0, i, 3]] * height as f32;
            candidates.push((
                score,
                DetectionBox {
                    x: x1 as i32,
                    y: y1 as i32,
                    w: (x2 - x1) as i32,
                    h: (y2 - y1) as i32,
                },
            ));
        }

        Ok(suppress_overlaps(candidates))
    }
}

/// Greedy non-maximum suppression, highest score first.
fn suppress_overlaps(mut candidates: Vec<(f32, DetectionBox)>) -> Vec<DetectionBox> {
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
    let mut kept: Vec<DetectionBox> = Vec::new();
    for (_, candidate) in candidates {
        if kept.iter().all(|k| iou(k, &candidate) < IOU_THRESHOLD) {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &DetectionBox, b: &DetectionBox) -> f32 {
    let left = a.x.max(b.x);
    let top = a.y.max(b.y);
    let right = (a.x + a.w).min(b.x + b.w);
    let bottom = (a.y + a.h).min(b.y + b.h);
    if right <= left || bottom <= top {
        return 0.0;
    }
    let intersection = ((right - left) as f32) * ((bottom - top) as f32);
    let union = (a.w as f32) * (a.h as f32) + (b.w as f32) * (b.h as f32) - intersection;
    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bx(x: i32, y: i32, w: i32, h: i32) -> DetectionBox {
        DetectionBox { x, y, w, h }
    }

    #[test]
    fn disjoint_boxes_both_survive_suppression() {
        let kept = suppress_overlaps(vec![(0.9, bx(0, 0, 50, 50)), (0.8, bx(200, 0, 50, 50))]);
        assert_eq!(kept, vec![bx(0, 0, 50, 50), bx(200, 0, 50, 50)]);
    }

    #[test]
    fn overlapping_box_with_lower_score_is_dropped() {
        let kept = suppress_overlaps(vec![(0.8, bx(2, 2, 50, 50)), (0.9, bx(0, 0, 50, 50))]);
        assert_eq!(kept, vec![bx(0, 0, 50, 50)]);
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = bx(10, 10, 40, 40);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
        assert_eq!(iou(&a, &bx(100, 100, 10, 10)), 0.0);
    }
}

//! YOLOv8-pose output decoding.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PoseError;
use crate::pose::anchor_grid::{Anchor, AnchorGrid};
use crate::pose::detection::{Detection, Keypoint, NUM_KEYPOINTS};
use crate::pose::nms::suppress_detections;
use crate::pose::quant::{DFL_BINS, dfl_expectation, sigmoid};
use crate::pose::rect::Rect;
use crate::pose::tensor::{DetectionOutputs, QuantTensor};

/// Configuration for the pose decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub input_width: u32,
    pub input_height: u32,
    /// Detection head strides, finest first.
    pub strides: Vec<u32>,
    pub score_threshold: f32,
    /// IoU above which the weaker of two boxes is suppressed.
    pub nms_threshold: f32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            input_width: 256,
            input_height: 256,
            strides: vec![8, 16, 32],
            score_threshold: 0.25,
            nms_threshold: 0.6,
        }
    }
}

impl DecoderConfig {
    pub fn validate(&self) -> Result<(), PoseError> {
        for (name, value) in [
            ("score_threshold", self.score_threshold),
            ("nms_threshold", self.nms_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PoseError::config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Decodes raw pose-model tensors into detections in model input pixels.
///
/// The anchor grid is built once here and shared by every frame.
#[derive(Debug, Clone)]
pub struct PoseDecoder {
    grid: AnchorGrid,
    config: DecoderConfig,
}

impl PoseDecoder {
    pub fn new(config: DecoderConfig) -> Result<Self, PoseError> {
        config.validate()?;
        let grid = AnchorGrid::new(config.input_width, config.input_height, &config.strides)?;
        Ok(Self { grid, config })
    }

    pub fn grid(&self) -> &AnchorGrid {
        &self.grid
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode every anchor whose objectness passes the score threshold.
    ///
    /// Returns the raw candidate set in flat anchor order; overlapping
    /// duplicates are expected and left for [`suppress`](crate::pose::suppress).
    pub fn decode(&self, outputs: &DetectionOutputs) -> Vec<Detection> {
        let width = self.config.input_width as f32;
        let height = self.config.input_height as f32;
        let mut candidates = Vec::new();

        let per_scale = outputs.boxes.iter().zip(&outputs.scores);
        for (scale, (boxes, scores)) in per_scale.enumerate() {
            let Some(range) = self.grid.scale_range(scale) else {
                break;
            };

            for (local, flat) in range.enumerate() {
                let confidence = sigmoid(scores.value(local, 0));
                if confidence < self.config.score_threshold {
                    continue;
                }

                let anchor = &self.grid.anchors()[flat];
                let bbox = decode_box(boxes, local, anchor);
                if !bbox.is_inside(width, height) {
                    continue;
                }

                let keypoints = decode_keypoints(outputs.keypoints(), flat, anchor, width, height);
                candidates.push(Detection::new(bbox, confidence, keypoints));
            }
        }

        candidates
    }

    /// Decode and suppress overlapping candidates.
    pub fn detect(&self, outputs: &DetectionOutputs) -> Vec<Detection> {
        let candidates = self.decode(outputs);
        let before = candidates.len();
        let detections = suppress_detections(
            candidates,
            self.config.score_threshold,
            self.config.nms_threshold,
        );
        debug!(before, after = detections.len(), "non-max suppression");
        detections
    }

    /// Validate an engine's raw outputs against the contract, then [`detect`](Self::detect).
    pub fn detect_tensors(&self, tensors: Vec<QuantTensor>) -> Result<Vec<Detection>, PoseError> {
        let outputs = DetectionOutputs::from_tensors(tensors, &self.grid)?;
        Ok(self.detect(&outputs))
    }
}

/// Distribution-focal decode of one anchor's box, scaled to pixels.
fn decode_box(tensor: &QuantTensor, row: usize, anchor: &Anchor) -> Rect {
    let mut dist = [0.0f32; 4];
    for (k, d) in dist.iter_mut().enumerate() {
        let mut logits = [0.0f32; DFL_BINS];
        for (i, logit) in logits.iter_mut().enumerate() {
            *logit = tensor.value(row, k * DFL_BINS + i);
        }
        *d = dfl_expectation(&logits);
    }

    let [l, t, r, b] = dist;
    let s = anchor.stride;
    Rect::from_tlbr(
        (anchor.center_x - l) * s,
        (anchor.center_y - t) * s,
        (anchor.center_x + r) * s,
        (anchor.center_y + b) * s,
    )
}

fn decode_keypoints(
    tensor: &QuantTensor,
    row: usize,
    anchor: &Anchor,
    width: f32,
    height: f32,
) -> [Keypoint; NUM_KEYPOINTS] {
    let s = anchor.stride;
    let mut keypoints = [Keypoint::default(); NUM_KEYPOINTS];
    for (k, kp) in keypoints.iter_mut().enumerate() {
        let x = (tensor.value(row, k * 3) * 2.0 + (anchor.center_x - 0.5)) * s;
        let y = (tensor.value(row, k * 3 + 1) * 2.0 + (anchor.center_y - 0.5)) * s;
        *kp = Keypoint {
            x: x.clamp(0.0, width - 1.0),
            y: y.clamp(0.0, height - 1.0),
            score: sigmoid(tensor.value(row, k * 3 + 2)),
        };
    }
    keypoints
}

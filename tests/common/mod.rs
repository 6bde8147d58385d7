#![allow(dead_code)]

use std::collections::VecDeque;

use ndarray::Array2;
use posereid::integration::CropRect;
use posereid::pose::{BOX_CHANNELS, DFL_BINS, KEYPOINT_CHANNELS};
use posereid::{AnchorGrid, EmbeddingEngine, PoseEngine, QuantParams, QuantTensor};

pub const Q: QuantParams = QuantParams {
    scale: 0.1,
    zero_point: 0,
};

/// A person planted at one anchor of the reference 256x256 grid.
#[derive(Debug, Clone, Copy)]
pub struct Planted {
    pub scale: usize,
    pub local: usize,
    /// Objectness logit as stored (dequantized with `Q`)
    pub score_q: i8,
    /// Peak bin for each of left, top, right, bottom
    pub bins: [usize; 4],
}

/// Raw detection outputs in the exported model's order:
/// box/16, box/8, score/32, keypoints, score/8, box/32, score/16.
pub fn engine_outputs(grid: &AnchorGrid, people: &[Planted]) -> Vec<QuantTensor> {
    let mut boxes: Vec<Array2<i8>> = (0..3)
        .map(|s| Array2::zeros((grid.scale_len(s), BOX_CHANNELS)))
        .collect();
    let mut scores: Vec<Array2<i8>> = (0..3)
        .map(|s| Array2::from_elem((grid.scale_len(s), 1), i8::MIN))
        .collect();
    let keypoints = Array2::zeros((grid.len(), KEYPOINT_CHANNELS));

    for p in people {
        scores[p.scale][[p.local, 0]] = p.score_q;
        for (k, &bin) in p.bins.iter().enumerate() {
            boxes[p.scale][[p.local, k * DFL_BINS + bin]] = 127;
        }
    }

    let mut boxes = boxes.into_iter().map(|a| QuantTensor::from_array(a, Q));
    let mut scores = scores.into_iter().map(|a| QuantTensor::from_array(a, Q));
    let (b8, b16, b32) = (boxes.next().unwrap(), boxes.next().unwrap(), boxes.next().unwrap());
    let (s8, s16, s32) = (scores.next().unwrap(), scores.next().unwrap(), scores.next().unwrap());
    vec![b16, b8, s32, QuantTensor::from_array(keypoints, Q), s8, b32, s16]
}

/// Stride-16 anchor at column 8, row 8 with a 64x128 box:
/// x 104..168, y 72..200 in model pixels.
pub fn standing_person(score_q: i8) -> Planted {
    Planted {
        scale: 1,
        local: 8 * 16 + 8,
        score_q,
        bins: [2, 4, 2, 4],
    }
}

/// Pose engine replaying one scripted result per frame.
pub struct ScriptedPose {
    pub frames: VecDeque<Result<Vec<QuantTensor>, String>>,
}

impl PoseEngine for ScriptedPose {
    type Error = String;

    fn infer(&mut self, _: &[u8], _: u32, _: u32) -> Result<Vec<QuantTensor>, Self::Error> {
        self.frames
            .pop_front()
            .unwrap_or_else(|| Err("script exhausted".to_string()))
    }
}

/// Embedding engine replaying one scripted feature vector per call.
#[derive(Default)]
pub struct ScriptedEmbedder {
    pub features: VecDeque<Result<Vec<i8>, String>>,
    pub crops: Vec<CropRect>,
}

impl EmbeddingEngine for ScriptedEmbedder {
    type Error = String;

    fn embed(
        &mut self,
        _: &[u8],
        _: u32,
        _: u32,
        crop: CropRect,
    ) -> Result<QuantTensor, Self::Error> {
        self.crops.push(crop);
        let data = self
            .features
            .pop_front()
            .unwrap_or_else(|| Err("script exhausted".to_string()))?;
        let len = data.len();
        QuantTensor::new(&[1, len], data, QuantParams::new(0.02, 0)).map_err(|e| e.to_string())
    }
}

/// Two appearance vectors with zero cosine similarity.
pub fn appearance_a() -> Vec<i8> {
    (0..512).map(|i| if i % 2 == 0 { 50 } else { -50 }).collect()
}

pub fn appearance_b() -> Vec<i8> {
    (0..512).map(|i| if i < 256 { 50 } else { -50 }).collect()
}

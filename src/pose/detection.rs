//! Per-frame detection output.

use crate::pose::rect::Rect;

/// Keypoints per person, COCO layout.
pub const NUM_KEYPOINTS: usize = 17;

pub const KEYPOINT_NAMES: [&str; NUM_KEYPOINTS] = [
    "nose",
    "left_eye",
    "right_eye",
    "left_ear",
    "right_ear",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
];

/// Pose keypoint in model input pixels with a visibility score in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub score: f32,
}

/// One detected person.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box in model input pixels (TLWH)
    pub bbox: Rect,
    /// Objectness after sigmoid
    pub confidence: f32,
    pub keypoints: [Keypoint; NUM_KEYPOINTS],
}

impl Detection {
    pub fn new(bbox: Rect, confidence: f32, keypoints: [Keypoint; NUM_KEYPOINTS]) -> Self {
        Self {
            bbox,
            confidence,
            keypoints,
        }
    }

    /// A detection with all keypoints zeroed.
    pub fn from_rect(bbox: Rect, confidence: f32) -> Self {
        Self::new(bbox, confidence, [Keypoint::default(); NUM_KEYPOINTS])
    }

    /// Keypoints scoring strictly above `threshold`, paired with their COCO name.
    pub fn visible_keypoints(
        &self,
        threshold: f32,
    ) -> impl Iterator<Item = (&'static str, &Keypoint)> + '_ {
        KEYPOINT_NAMES
            .iter()
            .zip(self.keypoints.iter())
            .filter(move |(_, k)| k.score > threshold)
            .map(|(name, k)| (*name, k))
    }
}

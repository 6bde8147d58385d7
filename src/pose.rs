mod anchor_grid;
mod decoder;
mod detection;
mod nms;
mod quant;
mod rect;
mod tensor;

pub use anchor_grid::{Anchor, AnchorGrid};
pub use decoder::{DecoderConfig, PoseDecoder};
pub use detection::{Detection, KEYPOINT_NAMES, Keypoint, NUM_KEYPOINTS};
pub use nms::{suppress, suppress_detections};
pub use quant::{DFL_BINS, QuantParams, dfl_expectation, sigmoid, softmax};
pub use rect::Rect;
pub use tensor::{BOX_CHANNELS, DetectionOutputs, KEYPOINT_CHANNELS, QuantTensor};

//! Traits for the inference engines the pipeline depends on.

use std::fmt::Display;

use crate::pose::QuantTensor;

/// Integer crop rectangle in source-frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Runs the pose model on one frame.
///
/// # Example
///
/// ```ignore
/// use posereid::{PoseEngine, QuantTensor};
///
/// struct NpuPose {
///     // Interpreter handle here
/// }
///
/// impl PoseEngine for NpuPose {
///     type Error = std::io::Error;
///
///     fn infer(
///         &mut self,
///         frame: &[u8],
///         width: u32,
///         height: u32,
///     ) -> Result<Vec<QuantTensor>, Self::Error> {
///         // Resize to the model input, invoke, and wrap every output tensor
///         Ok(vec![])
///     }
/// }
/// ```
pub trait PoseEngine {
    /// Error type for inference failures.
    type Error: Display;

    /// Run inference on an RGB frame.
    ///
    /// Resizing to the model input and pixel encoding are the engine's job.
    /// Returns every output tensor, in whatever order the model emits them.
    fn infer(
        &mut self,
        frame: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<QuantTensor>, Self::Error>;
}

/// Runs the re-identification model on one person crop.
pub trait EmbeddingEngine {
    /// Error type for inference failures.
    type Error: Display;

    /// Crop `crop` out of the RGB frame, run the model, and return its single
    /// 512-value output tensor.
    fn embed(
        &mut self,
        frame: &[u8],
        width: u32,
        height: u32,
        crop: CropRect,
    ) -> Result<QuantTensor, Self::Error>;
}

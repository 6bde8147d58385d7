use crate::integration::engine::CropRect;
use crate::pose::Rect;

/// Maps boxes from model input pixels to source-frame pixels.
///
/// The decoder only ever works in model space; this is the single place a
/// box is rescaled for the source frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMapping {
    pub scale_x: f32,
    pub scale_y: f32,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl FrameMapping {
    pub fn new(model_width: u32, model_height: u32, frame_width: u32, frame_height: u32) -> Self {
        Self {
            scale_x: frame_width as f32 / model_width as f32,
            scale_y: frame_height as f32 / model_height as f32,
            frame_width,
            frame_height,
        }
    }

    pub fn to_frame(&self, bbox: &Rect) -> Rect {
        bbox.scaled(self.scale_x, self.scale_y)
    }

    /// Integer crop of `bbox` in the frame, clamped to the frame bounds.
    pub fn crop(&self, bbox: &Rect) -> CropRect {
        let [x1, y1, x2, y2] = self.to_frame(bbox).to_tlbr();
        let max_x = self.frame_width.saturating_sub(1) as f32;
        let max_y = self.frame_height.saturating_sub(1) as f32;

        let x1 = x1.floor().clamp(0.0, max_x) as u32;
        let y1 = y1.floor().clamp(0.0, max_y) as u32;
        let x2 = x2.floor().clamp(0.0, max_x) as u32;
        let y2 = y2.floor().clamp(0.0, max_y) as u32;

        CropRect {
            x: x1,
            y: y1,
            width: x2.saturating_sub(x1),
            height: y2.saturating_sub(y1),
        }
    }
}

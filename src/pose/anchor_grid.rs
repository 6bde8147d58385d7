//! Precomputed anchor centers and strides for every detection scale.

use std::ops::Range;

use tracing::debug;

use crate::error::PoseError;

/// A single candidate slot: grid-cell center in stride units plus its stride.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub center_x: f32,
    pub center_y: f32,
    pub stride: f32,
}

/// Flat, immutable table of anchors for all scales, finest stride first.
#[derive(Debug, Clone)]
pub struct AnchorGrid {
    anchors: Vec<Anchor>,
    strides: Vec<u32>,
    /// Cumulative anchor count after each scale.
    boundaries: Vec<usize>,
    input_width: u32,
    input_height: u32,
}

impl AnchorGrid {
    /// Build the grid for an input of `width` x `height` and the given strides.
    ///
    /// Strides must be strictly increasing. Each scale contributes
    /// `(width / stride) * (height / stride)` anchors laid out row-major, and
    /// no two scales may contribute the same count, since output tensors are
    /// told apart by their row count.
    pub fn new(width: u32, height: u32, strides: &[u32]) -> Result<Self, PoseError> {
        if width == 0 || height == 0 {
            return Err(PoseError::config(format!(
                "input dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        if strides.is_empty() {
            return Err(PoseError::config("at least one stride is required"));
        }
        if let Some(pair) = strides.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(PoseError::config(format!(
                "strides must be strictly increasing, got {} before {}",
                pair[0], pair[1]
            )));
        }

        let mut anchors = Vec::new();
        let mut boundaries = Vec::with_capacity(strides.len());
        let mut scale_counts = Vec::with_capacity(strides.len());

        for &stride in strides {
            if stride == 0 {
                return Err(PoseError::config("stride must be non-zero"));
            }
            let grid_w = width / stride;
            let grid_h = height / stride;
            if grid_w == 0 || grid_h == 0 {
                return Err(PoseError::config(format!(
                    "stride {} is larger than the {}x{} input",
                    stride, width, height
                )));
            }

            let count = (grid_w * grid_h) as usize;
            if scale_counts.contains(&count) {
                return Err(PoseError::config(format!(
                    "stride {} yields {} anchors, the same as a finer scale",
                    stride, count
                )));
            }
            scale_counts.push(count);

            anchors.reserve(count);
            for row in 0..grid_h {
                for col in 0..grid_w {
                    anchors.push(Anchor {
                        center_x: col as f32 + 0.5,
                        center_y: row as f32 + 0.5,
                        stride: stride as f32,
                    });
                }
            }
            boundaries.push(anchors.len());
        }

        debug!(
            total = anchors.len(),
            ?boundaries,
            "anchor grid initialized"
        );

        Ok(Self {
            anchors,
            strides: strides.to_vec(),
            boundaries,
            input_width: width,
            input_height: height,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Anchor> {
        self.anchors.get(index)
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn strides(&self) -> &[u32] {
        &self.strides
    }

    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    pub fn num_scales(&self) -> usize {
        self.strides.len()
    }

    pub fn input_width(&self) -> u32 {
        self.input_width
    }

    pub fn input_height(&self) -> u32 {
        self.input_height
    }

    /// Number of anchors contributed by scale `scale`, zero past the last scale.
    pub fn scale_len(&self, scale: usize) -> usize {
        self.scale_range(scale).map_or(0, |range| range.len())
    }

    /// Flat index range occupied by scale `scale`.
    pub fn scale_range(&self, scale: usize) -> Option<Range<usize>> {
        let end = *self.boundaries.get(scale)?;
        let start = scale.checked_sub(1).map_or(0, |prev| self.boundaries[prev]);
        Some(start..end)
    }

    /// Map a flat anchor index to `(scale, index within that scale)`.
    pub fn locate(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.anchors.len() {
            return None;
        }
        let scale = self.boundaries.partition_point(|&b| b <= index);
        let range = self.scale_range(scale)?;
        Some((scale, index - range.start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_counts() {
        let grid = AnchorGrid::new(256, 256, &[8, 16, 32]).unwrap();
        assert_eq!(grid.len(), 1344);
        assert_eq!(grid.boundaries(), &[1024, 1280, 1344]);
        assert_eq!(grid.scale_len(0), 1024);
        assert_eq!(grid.scale_len(1), 256);
        assert_eq!(grid.scale_len(2), 64);
    }

    #[test]
    fn test_anchor_centers() {
        let grid = AnchorGrid::new(256, 256, &[8, 16, 32]).unwrap();

        let first = grid.get(0).unwrap();
        assert_eq!((first.center_x, first.center_y, first.stride), (0.5, 0.5, 8.0));

        // Row 1, column 2 of the stride-8 grid (32 columns wide).
        let a = grid.get(32 + 2).unwrap();
        assert_eq!((a.center_x, a.center_y), (2.5, 1.5));

        let coarse = grid.get(1280).unwrap();
        assert_eq!((coarse.center_x, coarse.center_y, coarse.stride), (0.5, 0.5, 32.0));

        let last = grid.get(1343).unwrap();
        assert_eq!((last.center_x, last.center_y, last.stride), (7.5, 7.5, 32.0));
    }

    #[test]
    fn test_locate() {
        let grid = AnchorGrid::new(256, 256, &[8, 16, 32]).unwrap();
        assert_eq!(grid.locate(0), Some((0, 0)));
        assert_eq!(grid.locate(1023), Some((0, 1023)));
        assert_eq!(grid.locate(1024), Some((1, 0)));
        assert_eq!(grid.locate(1279), Some((1, 255)));
        assert_eq!(grid.locate(1280), Some((2, 0)));
        assert_eq!(grid.locate(1344), None);
    }

    #[test]
    fn test_non_square_input() {
        let grid = AnchorGrid::new(320, 192, &[8, 16, 32]).unwrap();
        assert_eq!(grid.scale_len(0), 40 * 24);
        assert_eq!(grid.scale_len(1), 20 * 12);
        assert_eq!(grid.scale_len(2), 10 * 6);
        let a = grid.get(40).unwrap();
        assert_eq!((a.center_x, a.center_y), (0.5, 1.5));
    }

    #[test]
    fn test_invalid_config() {
        assert!(AnchorGrid::new(0, 256, &[8]).is_err());
        assert!(AnchorGrid::new(256, 256, &[]).is_err());
        assert!(AnchorGrid::new(256, 256, &[8, 0]).is_err());
        assert!(AnchorGrid::new(16, 16, &[8, 32]).is_err());
    }

    #[test]
    fn test_stride_order_and_unique_counts() {
        assert!(AnchorGrid::new(256, 256, &[8, 8]).is_err());
        assert!(AnchorGrid::new(256, 256, &[32, 16, 8]).is_err());
        assert!(AnchorGrid::new(256, 256, &[8, 32, 16]).is_err());
        // 24x24 gives a single cell at both stride 16 and stride 24.
        assert!(AnchorGrid::new(24, 24, &[16, 24]).is_err());
        assert!(AnchorGrid::new(24, 24, &[8, 16]).is_ok());
    }

    #[test]
    fn test_out_of_range_scale() {
        let grid = AnchorGrid::new(256, 256, &[8, 16, 32]).unwrap();
        assert_eq!(grid.scale_range(1), Some(1024..1280));
        assert_eq!(grid.scale_range(3), None);
        assert_eq!(grid.scale_len(3), 0);
    }
}

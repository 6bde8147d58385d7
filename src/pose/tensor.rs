//! Raw quantized model outputs and the detection output contract.

use ndarray::{Array2, ArrayView1, ArrayView2};
use tracing::debug;

use crate::error::PoseError;
use crate::pose::anchor_grid::AnchorGrid;
use crate::pose::detection::NUM_KEYPOINTS;
use crate::pose::quant::{DFL_BINS, QuantParams};

/// Box-distribution channels per anchor: 4 distances x 16 bins.
pub const BOX_CHANNELS: usize = 4 * DFL_BINS;

/// Keypoint channels per anchor: x, y and visibility for each keypoint.
pub const KEYPOINT_CHANNELS: usize = NUM_KEYPOINTS * 3;

/// An int8 output tensor viewed as `rows x cols` with its quantization.
#[derive(Debug, Clone)]
pub struct QuantTensor {
    data: Array2<i8>,
    quant: QuantParams,
}

impl QuantTensor {
    /// Wrap a flat buffer as reported by an inference engine.
    ///
    /// Leading batch dimensions of 1 are dropped, so `[1, 1344, 51]` and
    /// `[1344, 51]` are equivalent. A 1-D shape is read as a single column.
    pub fn new(shape: &[usize], data: Vec<i8>, quant: QuantParams) -> Result<Self, PoseError> {
        let mut dims = shape;
        while dims.len() > 2 && dims[0] == 1 {
            dims = &dims[1..];
        }
        let (rows, cols) = match *dims {
            [n] => (n, 1),
            [r, c] => (r, c),
            _ => return Err(PoseError::shape(shape, "expected at most two non-batch dimensions")),
        };

        let data = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| PoseError::shape(shape, e.to_string()))?;
        Ok(Self { data, quant })
    }

    pub fn from_array(data: Array2<i8>, quant: QuantParams) -> Self {
        Self { data, quant }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> [usize; 2] {
        [self.rows(), self.cols()]
    }

    pub fn quant(&self) -> QuantParams {
        self.quant
    }

    pub fn view(&self) -> ArrayView2<'_, i8> {
        self.data.view()
    }

    pub fn row(&self, row: usize) -> ArrayView1<'_, i8> {
        self.data.row(row)
    }

    /// Dequantized value at `(row, col)`.
    #[inline]
    pub fn value(&self, row: usize, col: usize) -> f32 {
        self.quant.dequantize(self.data[[row, col]])
    }

    /// All values dequantized, in row-major order.
    pub fn dequantized(&self) -> Vec<f32> {
        self.data.iter().map(|&q| self.quant.dequantize(q)).collect()
    }
}

/// The detection model's outputs, sorted into the slots the decoder reads.
///
/// Holds one box-distribution tensor (`anchors x 64`) and one objectness
/// tensor (`anchors x 1`) per scale, in grid stride order, plus a single
/// keypoint tensor covering every anchor (`total x 51`).
#[derive(Debug, Clone)]
pub struct DetectionOutputs {
    pub(crate) boxes: Vec<QuantTensor>,
    pub(crate) scores: Vec<QuantTensor>,
    pub(crate) keypoints: QuantTensor,
}

impl DetectionOutputs {
    /// Accept tensors that are already ordered by scale.
    pub fn new(
        boxes: Vec<QuantTensor>,
        scores: Vec<QuantTensor>,
        keypoints: QuantTensor,
        grid: &AnchorGrid,
    ) -> Result<Self, PoseError> {
        let scales = grid.num_scales();
        if boxes.len() != scales || scores.len() != scales {
            return Err(PoseError::TensorCount {
                expected: 2 * scales + 1,
                got: boxes.len() + scores.len() + 1,
            });
        }

        for (scale, (b, s)) in boxes.iter().zip(scores.iter()).enumerate() {
            let anchors = grid.scale_len(scale);
            if b.shape() != [anchors, BOX_CHANNELS] {
                return Err(PoseError::shape(
                    &b.shape(),
                    format!("box tensor of scale {} must be {}x{}", scale, anchors, BOX_CHANNELS),
                ));
            }
            if s.shape() != [anchors, 1] {
                return Err(PoseError::shape(
                    &s.shape(),
                    format!("objectness tensor of scale {} must be {}x1", scale, anchors),
                ));
            }
        }
        if keypoints.shape() != [grid.len(), KEYPOINT_CHANNELS] {
            return Err(PoseError::shape(
                &keypoints.shape(),
                format!("keypoint tensor must be {}x{}", grid.len(), KEYPOINT_CHANNELS),
            ));
        }

        Ok(Self {
            boxes,
            scores,
            keypoints,
        })
    }

    /// Sort an engine's output tensors into slots by their shape.
    ///
    /// Engines do not report outputs in stride order, so each tensor is
    /// identified by its row count (anchors of one scale, or all anchors) and
    /// its channel count. Anything that does not fit exactly one empty slot
    /// is a configuration error.
    pub fn from_tensors(tensors: Vec<QuantTensor>, grid: &AnchorGrid) -> Result<Self, PoseError> {
        let scales = grid.num_scales();
        let expected = 2 * scales + 1;
        if tensors.len() != expected {
            return Err(PoseError::TensorCount {
                expected,
                got: tensors.len(),
            });
        }

        let mut boxes: Vec<Option<QuantTensor>> = vec![None; scales];
        let mut scores: Vec<Option<QuantTensor>> = vec![None; scales];
        let mut keypoints = None;

        for (idx, tensor) in tensors.into_iter().enumerate() {
            let [rows, cols] = tensor.shape();
            let scale = (0..scales).find(|&s| grid.scale_len(s) == rows);

            let slot = match (cols, scale) {
                (BOX_CHANNELS, Some(s)) => {
                    debug!(output = idx, scale = s, "box distribution tensor");
                    &mut boxes[s]
                }
                (1, Some(s)) => {
                    debug!(output = idx, scale = s, "objectness tensor");
                    &mut scores[s]
                }
                (KEYPOINT_CHANNELS, _) if rows == grid.len() => {
                    debug!(output = idx, "keypoint tensor");
                    &mut keypoints
                }
                _ => {
                    return Err(PoseError::shape(
                        &[rows, cols],
                        format!("output {} matches no slot of the detection contract", idx),
                    ));
                }
            };

            if slot.is_some() {
                return Err(PoseError::shape(
                    &[rows, cols],
                    format!("output {} duplicates an already filled slot", idx),
                ));
            }
            *slot = Some(tensor);
        }

        let missing = |what: &str| PoseError::shape(&[], format!("missing {} tensor", what));
        let boxes = boxes
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| missing("box"))?;
        let scores = scores
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| missing("objectness"))?;
        let keypoints = keypoints.ok_or_else(|| missing("keypoint"))?;

        Ok(Self {
            boxes,
            scores,
            keypoints,
        })
    }

    pub fn boxes(&self, scale: usize) -> Option<&QuantTensor> {
        self.boxes.get(scale)
    }

    pub fn scores(&self, scale: usize) -> Option<&QuantTensor> {
        self.scores.get(scale)
    }

    pub fn keypoints(&self) -> &QuantTensor {
        &self.keypoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeros(rows: usize, cols: usize) -> QuantTensor {
        QuantTensor::from_array(Array2::zeros((rows, cols)), QuantParams::default())
    }

    #[test]
    fn test_new_squeezes_batch() {
        let t = QuantTensor::new(&[1, 4, 3], vec![0; 12], QuantParams::default()).unwrap();
        assert_eq!(t.shape(), [4, 3]);

        let col = QuantTensor::new(&[5], vec![1; 5], QuantParams::new(0.5, 0)).unwrap();
        assert_eq!(col.shape(), [5, 1]);
        assert_eq!(col.value(4, 0), 0.5);
    }

    #[test]
    fn test_new_rejects_bad_buffer() {
        assert!(QuantTensor::new(&[4, 3], vec![0; 11], QuantParams::default()).is_err());
        assert!(QuantTensor::new(&[2, 4, 3], vec![0; 24], QuantParams::default()).is_err());
    }

    #[test]
    fn test_from_tensors_engine_order() {
        let grid = AnchorGrid::new(256, 256, &[8, 16, 32]).unwrap();
        // Output order of the exported pose model.
        let tensors = vec![
            zeros(256, 64),
            zeros(1024, 64),
            zeros(64, 1),
            zeros(1344, 51),
            zeros(1024, 1),
            zeros(64, 64),
            zeros(256, 1),
        ];
        let outputs = DetectionOutputs::from_tensors(tensors, &grid).unwrap();
        assert_eq!(outputs.boxes(0).map(QuantTensor::rows), Some(1024));
        assert_eq!(outputs.boxes(1).map(QuantTensor::rows), Some(256));
        assert_eq!(outputs.boxes(2).map(QuantTensor::rows), Some(64));
        assert_eq!(outputs.scores(0).map(QuantTensor::rows), Some(1024));
        assert_eq!(outputs.scores(2).map(QuantTensor::rows), Some(64));
        assert!(outputs.boxes(3).is_none());
        assert!(outputs.scores(3).is_none());
        assert_eq!(outputs.keypoints().shape(), [1344, 51]);
    }

    #[test]
    fn test_from_tensors_wrong_count() {
        let grid = AnchorGrid::new(256, 256, &[8, 16, 32]).unwrap();
        let err = DetectionOutputs::from_tensors(vec![zeros(1344, 51)], &grid).unwrap_err();
        assert!(matches!(err, PoseError::TensorCount { expected: 7, got: 1 }));
    }

    #[test]
    fn test_from_tensors_duplicate_slot() {
        let grid = AnchorGrid::new(256, 256, &[8, 16, 32]).unwrap();
        let tensors = vec![
            zeros(1024, 64),
            zeros(1024, 64),
            zeros(64, 1),
            zeros(1344, 51),
            zeros(1024, 1),
            zeros(64, 64),
            zeros(256, 1),
        ];
        let err = DetectionOutputs::from_tensors(tensors, &grid).unwrap_err();
        assert!(matches!(err, PoseError::TensorShape { .. }));
    }

    #[test]
    fn test_from_tensors_unknown_shape() {
        let grid = AnchorGrid::new(256, 256, &[8, 16, 32]).unwrap();
        let tensors = vec![
            zeros(256, 64),
            zeros(1024, 64),
            zeros(64, 1),
            zeros(1344, 50),
            zeros(1024, 1),
            zeros(64, 64),
            zeros(256, 1),
        ];
        assert!(DetectionOutputs::from_tensors(tensors, &grid).is_err());
    }

    #[test]
    fn test_new_validates_shapes() {
        let grid = AnchorGrid::new(64, 64, &[8, 16]).unwrap();
        let ok = DetectionOutputs::new(
            vec![zeros(64, 64), zeros(16, 64)],
            vec![zeros(64, 1), zeros(16, 1)],
            zeros(80, 51),
            &grid,
        );
        assert!(ok.is_ok());

        let swapped = DetectionOutputs::new(
            vec![zeros(16, 64), zeros(64, 64)],
            vec![zeros(64, 1), zeros(16, 1)],
            zeros(80, 51),
            &grid,
        );
        assert!(swapped.is_err());
    }
}

//! Affine int8 quantization and the small numeric kernels used by the decoder.

use serde::{Deserialize, Serialize};

/// Number of bins in each distribution-focal box distance.
pub const DFL_BINS: usize = 16;

/// Per-tensor affine quantization: `value = (q - zero_point) * scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantParams {
    pub scale: f32,
    pub zero_point: i32,
}

impl Default for QuantParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            zero_point: 0,
        }
    }
}

impl QuantParams {
    pub fn new(scale: f32, zero_point: i32) -> Self {
        Self { scale, zero_point }
    }

    #[inline]
    pub fn dequantize(&self, q: i8) -> f32 {
        (q as i32 - self.zero_point) as f32 * self.scale
    }

    /// Inverse of [`dequantize`](Self::dequantize), rounding to nearest and
    /// saturating to the i8 range.
    #[inline]
    pub fn quantize(&self, value: f32) -> i8 {
        let q = (value / self.scale).round() as i64 + self.zero_point as i64;
        q.clamp(i8::MIN as i64, i8::MAX as i64) as i8
    }
}

#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// In-place softmax; subtracts the maximum before exponentiating.
pub fn softmax(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 {
        for v in values.iter_mut() {
            *v /= sum;
        }
    }
}

/// Expected offset `sum(i * p(i))` of a softmax over the bin logits.
pub fn dfl_expectation(logits: &[f32; DFL_BINS]) -> f32 {
    let mut probs = *logits;
    softmax(&mut probs);
    probs
        .iter()
        .enumerate()
        .map(|(i, p)| i as f32 * p)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dequantize() {
        let q = QuantParams::new(0.5, -3);
        assert_eq!(q.dequantize(-3), 0.0);
        assert_eq!(q.dequantize(7), 5.0);
        assert_eq!(q.dequantize(-128), -62.5);
    }

    #[test]
    fn test_quantize_inverts_dequantize() {
        for params in [
            QuantParams::new(0.0471, -12),
            QuantParams::new(0.1, 0),
            QuantParams::new(0.0039, 127),
        ] {
            for q in i8::MIN..=i8::MAX {
                assert_eq!(params.quantize(params.dequantize(q)), q, "{params:?} q={q}");
            }
        }
    }

    #[test]
    fn test_quantize_saturates() {
        let q = QuantParams::new(0.1, 0);
        assert_eq!(q.quantize(1000.0), 127);
        assert_eq!(q.quantize(-1000.0), -128);
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.9999);
        assert!(sigmoid(-10.0) < 1e-4);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let mut v = [
            0.3, -1.2, 4.0, 2.2, 0.0, 0.0, 1.0, -3.0, 0.5, 0.7, 0.1, 9.0, 2.0, 3.0, -0.4, 1.1,
        ];
        softmax(&mut v);
        let sum: f32 = v.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(v.iter().all(|&p| p > 0.0));
    }

    #[test]
    fn test_softmax_shift_invariant() {
        let base = [
            0.3, -1.2, 4.0, 2.2, 0.0, 0.0, 1.0, -3.0, 0.5, 0.7, 0.1, 9.0, 2.0, 3.0, -0.4, 1.1,
        ];
        let mut a = base;
        let mut b = base.map(|x| x + 37.5);
        softmax(&mut a);
        softmax(&mut b);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_dfl_uniform() {
        // Equal logits give p = 1/16 for every bin, mean offset 7.5.
        assert_eq!(dfl_expectation(&[2.0; DFL_BINS]), 7.5);
    }

    #[test]
    fn test_dfl_weighted_sum() {
        let mut logits = [0.0f32; DFL_BINS];
        logits[2] = 1.0;
        logits[5] = 2.0;

        let e0 = 1.0f32;
        let e1 = 1.0f32.exp();
        let e2 = 2.0f32.exp();
        let sum = 14.0 * e0 + e1 + e2;
        let mut expected = 0.0;
        for i in 0..DFL_BINS {
            let w = match i {
                2 => e1,
                5 => e2,
                _ => e0,
            };
            expected += i as f32 * w / sum;
        }

        assert!((dfl_expectation(&logits) - expected).abs() < 1e-5);
    }
}

//! L2-normalized appearance embeddings.

use nalgebra::SVector;

use crate::error::PoseError;
use crate::pose::{QuantParams, QuantTensor};

/// Length of a re-identification feature vector.
pub const EMBEDDING_DIM: usize = 512;

pub type FeatureVector = SVector<f32, EMBEDDING_DIM>;

/// Appearance embedding with unit L2 norm.
///
/// An all-zero input stays zero, since it has no direction to normalize.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    vector: FeatureVector,
}

impl Embedding {
    /// Normalize a float feature vector.
    pub fn from_slice(values: &[f32]) -> Result<Self, PoseError> {
        if values.len() != EMBEDDING_DIM {
            return Err(PoseError::EmbeddingDim {
                expected: EMBEDDING_DIM,
                got: values.len(),
            });
        }
        Ok(Self::normalized(FeatureVector::from_column_slice(values)))
    }

    /// Dequantize raw model output, then normalize.
    pub fn from_quantized(data: &[i8], quant: QuantParams) -> Result<Self, PoseError> {
        if data.len() != EMBEDDING_DIM {
            return Err(PoseError::EmbeddingDim {
                expected: EMBEDDING_DIM,
                got: data.len(),
            });
        }
        let vector = FeatureVector::from_iterator(data.iter().map(|&q| quant.dequantize(q)));
        Ok(Self::normalized(vector))
    }

    /// Read the single output tensor of a re-identification model.
    pub fn from_tensor(tensor: &QuantTensor) -> Result<Self, PoseError> {
        let values = tensor.dequantized();
        if values.len() != EMBEDDING_DIM {
            return Err(PoseError::EmbeddingDim {
                expected: EMBEDDING_DIM,
                got: values.len(),
            });
        }
        Ok(Self::normalized(FeatureVector::from_column_slice(&values)))
    }

    fn normalized(mut vector: FeatureVector) -> Self {
        let norm = vector.norm();
        if norm > 0.0 {
            vector /= norm;
        }
        Self { vector }
    }

    pub fn vector(&self) -> &FeatureVector {
        &self.vector
    }

    pub fn as_slice(&self) -> &[f32] {
        self.vector.as_slice()
    }

    /// Cosine similarity; a plain dot product since both sides are unit length.
    #[inline]
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        self.vector.dot(&other.vector)
    }
}

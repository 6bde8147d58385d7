//! Error type shared by the decoder, the gallery and the pipeline.

use thiserror::Error;

/// Errors reported by the detection and re-identification core.
///
/// Everything here is a configuration problem: the model output does not
/// match the contract the decoder was built for, or the configuration itself
/// is unusable. Inference failures belong to the engine's own error type and
/// never surface as a `PoseError`.
#[derive(Error, Debug)]
pub enum PoseError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("expected {expected} output tensors, got {got}")]
    TensorCount { expected: usize, got: usize },

    #[error("unexpected tensor shape {shape:?}: {reason}")]
    TensorShape { shape: Vec<usize>, reason: String },

    #[error("embedding has {got} values, expected {expected}")]
    EmbeddingDim { expected: usize, got: usize },

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl PoseError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        PoseError::InvalidConfig(msg.into())
    }

    pub(crate) fn shape(shape: &[usize], reason: impl Into<String>) -> Self {
        PoseError::TensorShape {
            shape: shape.to_vec(),
            reason: reason.into(),
        }
    }
}

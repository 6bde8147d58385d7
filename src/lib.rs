//! Person detection and re-identification for quantized YOLOv8-pose models.
//!
//! The crate turns the raw int8 output tensors of a pose model into a list of
//! people with boxes and COCO keypoints, removes duplicates with greedy
//! non-max suppression, and assigns stable identities by matching appearance
//! embeddings against a bounded gallery.
//!
//! Running the networks is left to the caller through the
//! [`PoseEngine`] and [`EmbeddingEngine`] traits.

pub mod config;
pub mod error;
pub mod integration;
pub mod pose;
pub mod reid;

pub use config::PipelineConfig;
pub use error::PoseError;
pub use integration::{
    CropRect, EmbeddingEngine, FrameMapping, IdentifiedPerson, PersonPipeline, PipelineBuilder,
    PipelineStats, PoseEngine,
};
pub use pose::{
    Anchor, AnchorGrid, DecoderConfig, Detection, DetectionOutputs, Keypoint, PoseDecoder,
    QuantParams, QuantTensor, Rect, suppress,
};
pub use reid::{Embedding, GalleryConfig, GalleryEntry, GalleryMatcher, IdentityOutcome};

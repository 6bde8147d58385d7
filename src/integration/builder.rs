//! Builder for assembling a PersonPipeline.

use crate::config::PipelineConfig;
use crate::error::PoseError;
use crate::integration::engine::{EmbeddingEngine, PoseEngine};
use crate::integration::pipeline::PersonPipeline;

/// Fluent setters over [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// Create a builder holding the reference configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration, e.g. one loaded from JSON.
    pub fn from_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Set the pose model input size in pixels.
    pub fn input_size(mut self, width: u32, height: u32) -> Self {
        self.config.decoder.input_width = width;
        self.config.decoder.input_height = height;
        self
    }

    /// Set the detection head strides, finest first.
    pub fn strides(mut self, strides: &[u32]) -> Self {
        self.config.decoder.strides = strides.to_vec();
        self
    }

    /// Set the objectness threshold.
    pub fn score_threshold(mut self, threshold: f32) -> Self {
        self.config.decoder.score_threshold = threshold;
        self
    }

    /// Set the IoU threshold for non-max suppression.
    pub fn nms_threshold(mut self, threshold: f32) -> Self {
        self.config.decoder.nms_threshold = threshold;
        self
    }

    /// Set the similarity a gallery match must exceed.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.gallery.similarity_threshold = threshold;
        self
    }

    /// Set the number of identities the gallery remembers.
    pub fn gallery_capacity(mut self, capacity: usize) -> Self {
        self.config.gallery.capacity = capacity;
        self
    }

    /// Set the smallest source-frame crop that is re-identified.
    pub fn min_crop(mut self, width: u32, height: u32) -> Self {
        self.config.crop.min_width = width;
        self.config.crop.min_height = height;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate the configuration and build the pipeline.
    pub fn build<D: PoseEngine, E: EmbeddingEngine>(
        self,
        detector: D,
        embedder: E,
    ) -> Result<PersonPipeline<D, E>, PoseError> {
        PersonPipeline::new(detector, embedder, self.config)
    }
}

//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::error::PoseError;
use crate::pose::DecoderConfig;
use crate::reid::GalleryConfig;

/// Complete configuration for a [`PersonPipeline`](crate::PersonPipeline).
///
/// Defaults are the reference values for a 256x256 YOLOv8-pose model paired
/// with a 512-dimensional re-identification model. Missing JSON fields fall
/// back to these defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub decoder: DecoderConfig,
    pub gallery: GalleryConfig,
    pub crop: CropConfig,
}

/// Smallest source-frame crop worth re-identifying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            min_width: 20,
            min_height: 40,
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self, PoseError> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, PoseError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), PoseError> {
        self.decoder.validate()?;
        self.gallery.validate()
    }
}

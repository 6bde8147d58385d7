//! Integration module for connecting inference engines with the decoder and gallery.
//!
//! The core never runs a network itself. Engines implement [`PoseEngine`] and
//! [`EmbeddingEngine`], and [`PersonPipeline`] drives them frame by frame.

mod builder;
mod engine;
mod frame;
mod pipeline;

pub use builder::PipelineBuilder;
pub use engine::{CropRect, EmbeddingEngine, PoseEngine};
pub use frame::FrameMapping;
pub use pipeline::{IdentifiedPerson, PersonPipeline, PipelineStats};

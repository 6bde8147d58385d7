//! PersonPipeline for combining pose detection with re-identification.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::error::PoseError;
use crate::integration::engine::{EmbeddingEngine, PoseEngine};
use crate::integration::frame::FrameMapping;
use crate::pose::{Detection, PoseDecoder, Rect};
use crate::reid::{Embedding, GalleryMatcher, IdentityOutcome};

/// A detection with its source-frame box and, when re-identified, its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifiedPerson {
    /// Detection in model input pixels, as decoded
    pub detection: Detection,
    /// The same box in source-frame pixels
    pub frame_box: Rect,
    /// `None` when the crop was too small or the embedding engine failed
    pub identity_id: Option<u64>,
}

/// Running counters over all processed frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    pub frames: u64,
    pub inference_failures: u64,
    pub embedding_failures: u64,
    pub detections: u64,
    pub skipped_crops: u64,
    pub matches: u64,
    pub enrollments: u64,
    /// Calls made to the embedding engine, failed ones included
    pub embeddings: u64,
    /// Total wall time spent inside the pose engine
    pub inference_time: Duration,
    /// Total wall time spent inside the embedding engine
    pub embedding_time: Duration,
}

impl PipelineStats {
    pub fn average_inference_time(&self) -> Option<Duration> {
        average(self.inference_time, self.frames)
    }

    pub fn average_embedding_time(&self) -> Option<Duration> {
        average(self.embedding_time, self.embeddings)
    }
}

fn average(total: Duration, runs: u64) -> Option<Duration> {
    let runs = u32::try_from(runs).ok().filter(|&n| n > 0)?;
    Some(total / runs)
}

/// Frame-at-a-time detection and re-identification.
///
/// Owns the decoder (and with it the anchor grid) and the gallery, so
/// independent pipelines never share state. Each call to
/// [`process_frame`](Self::process_frame) runs to completion before the next.
pub struct PersonPipeline<D: PoseEngine, E: EmbeddingEngine> {
    detector: D,
    embedder: E,
    decoder: PoseDecoder,
    gallery: GalleryMatcher,
    config: PipelineConfig,
    frame_id: u32,
    stats: PipelineStats,
}

impl<D: PoseEngine, E: EmbeddingEngine> PersonPipeline<D, E> {
    pub fn new(detector: D, embedder: E, config: PipelineConfig) -> Result<Self, PoseError> {
        config.validate()?;
        let decoder = PoseDecoder::new(config.decoder.clone())?;
        let gallery = GalleryMatcher::new(config.gallery.clone())?;
        Ok(Self {
            detector,
            embedder,
            decoder,
            gallery,
            config,
            frame_id: 0,
            stats: PipelineStats::default(),
        })
    }

    pub fn with_default_config(detector: D, embedder: E) -> Result<Self, PoseError> {
        Self::new(detector, embedder, PipelineConfig::default())
    }

    /// Detect and identify every person in one RGB frame.
    ///
    /// A failing pose engine yields an empty result for this frame and leaves
    /// the gallery untouched. Output tensors or embeddings that break the
    /// model contract are reported as an error and should not be retried; the
    /// gallery is left untouched in that case too.
    pub fn process_frame(
        &mut self,
        frame: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<IdentifiedPerson>, PoseError> {
        self.frame_id += 1;
        self.stats.frames += 1;

        let start = Instant::now();
        let inferred = self.detector.infer(frame, width, height);
        self.stats.inference_time += start.elapsed();

        let tensors = match inferred {
            Ok(tensors) => tensors,
            Err(e) => {
                warn!(frame = self.frame_id, error = %e, "pose inference failed");
                self.stats.inference_failures += 1;
                return Ok(Vec::new());
            }
        };

        let detections = self.decoder.detect_tensors(tensors)?;
        self.stats.detections += detections.len() as u64;

        let grid = self.decoder.grid();
        let mapping = FrameMapping::new(grid.input_width(), grid.input_height(), width, height);

        // Every embedding is extracted and validated before the gallery changes.
        let mut pending = Vec::with_capacity(detections.len());
        for detection in detections {
            let embedding = self.extract(frame, width, height, &mapping, &detection)?;
            pending.push((detection, embedding));
        }

        let mut people = Vec::with_capacity(pending.len());
        for (detection, embedding) in pending {
            people.push(IdentifiedPerson {
                frame_box: mapping.to_frame(&detection.bbox),
                identity_id: embedding.map(|e| self.assign(e)),
                detection,
            });
        }

        debug!(frame = self.frame_id, people = people.len(), "frame processed");
        Ok(people)
    }

    fn extract(
        &mut self,
        frame: &[u8],
        width: u32,
        height: u32,
        mapping: &FrameMapping,
        detection: &Detection,
    ) -> Result<Option<Embedding>, PoseError> {
        let crop = mapping.crop(&detection.bbox);
        if crop.width < self.config.crop.min_width || crop.height < self.config.crop.min_height {
            debug!(?crop, "person too small, skipping re-identification");
            self.stats.skipped_crops += 1;
            return Ok(None);
        }

        let start = Instant::now();
        let embedded = self.embedder.embed(frame, width, height, crop);
        self.stats.embedding_time += start.elapsed();
        self.stats.embeddings += 1;

        match embedded {
            Ok(tensor) => Embedding::from_tensor(&tensor).map(Some),
            Err(e) => {
                warn!(frame = self.frame_id, error = %e, "embedding extraction failed");
                self.stats.embedding_failures += 1;
                Ok(None)
            }
        }
    }

    fn assign(&mut self, embedding: Embedding) -> u64 {
        let (id, outcome) = self.gallery.identify(embedding, self.frame_id);
        match outcome {
            IdentityOutcome::Matched => self.stats.matches += 1,
            IdentityOutcome::Enrolled => self.stats.enrollments += 1,
        }
        id
    }

    /// Number of frames processed so far; also the gallery's current frame.
    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn decoder(&self) -> &PoseDecoder {
        &self.decoder
    }

    pub fn gallery(&self) -> &GalleryMatcher {
        &self.gallery
    }

    /// Get a reference to the underlying pose engine.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying pose engine.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a mutable reference to the underlying embedding engine.
    pub fn embedder_mut(&mut self) -> &mut E {
        &mut self.embedder
    }
}

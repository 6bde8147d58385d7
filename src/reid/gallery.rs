//! Bounded identity gallery for re-identification.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PoseError;
use crate::reid::embedding::Embedding;

/// Configuration for the gallery matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Maximum number of identities remembered at once.
    pub capacity: usize,
    /// Similarity a match must strictly exceed.
    pub similarity_threshold: f32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            similarity_threshold: 0.6,
        }
    }
}

impl GalleryConfig {
    pub fn validate(&self) -> Result<(), PoseError> {
        if self.capacity == 0 {
            return Err(PoseError::config("gallery capacity must be non-zero"));
        }
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(PoseError::config(format!(
                "similarity_threshold must be within [-1, 1], got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

/// A remembered identity.
#[derive(Debug, Clone)]
pub struct GalleryEntry {
    pub embedding: Embedding,
    pub identity_id: u64,
    pub last_seen_frame: u32,
}

/// How [`GalleryMatcher::identify`] resolved an embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityOutcome {
    Matched,
    Enrolled,
}

/// Matches embeddings against a bounded set of known identities.
///
/// Identity ids come from a per-instance counter and are never reused, even
/// after the entry holding them is evicted.
#[derive(Debug, Clone)]
pub struct GalleryMatcher {
    entries: Vec<GalleryEntry>,
    next_id: u64,
    config: GalleryConfig,
}

impl GalleryMatcher {
    pub fn new(config: GalleryConfig) -> Result<Self, PoseError> {
        config.validate()?;
        Ok(Self {
            entries: Vec::with_capacity(config.capacity),
            next_id: 0,
            config,
        })
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    /// Find the most similar identity above the threshold and mark it seen.
    ///
    /// Equal similarities resolve to the earlier entry.
    pub fn match_embedding(&mut self, embedding: &Embedding, current_frame: u32) -> Option<u64> {
        let mut best: Option<(usize, f32)> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            let similarity = embedding.cosine_similarity(&entry.embedding);
            let floor = best.map_or(self.config.similarity_threshold, |(_, s)| s);
            if similarity > floor {
                best = Some((idx, similarity));
            }
        }

        let (idx, similarity) = best?;
        let entry = &mut self.entries[idx];
        entry.last_seen_frame = current_frame;
        debug!(identity = entry.identity_id, similarity, "gallery match");
        Some(entry.identity_id)
    }

    /// Store a new identity, evicting the least recently seen one when full.
    ///
    /// Eviction overwrites the oldest slot (lowest index on ties) with a fresh
    /// id; the old id is retired for good.
    pub fn enroll(&mut self, embedding: Embedding, current_frame: u32) -> u64 {
        let identity_id = self.next_id;
        self.next_id += 1;

        let entry = GalleryEntry {
            embedding,
            identity_id,
            last_seen_frame: current_frame,
        };

        if self.entries.len() < self.config.capacity {
            self.entries.push(entry);
            info!(identity = identity_id, size = self.entries.len(), "enrolled new identity");
            return identity_id;
        }

        let oldest = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.last_seen_frame)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        let retired = std::mem::replace(&mut self.entries[oldest], entry);
        info!(
            retired = retired.identity_id,
            identity = identity_id,
            slot = oldest,
            "gallery full, evicted least recently seen identity"
        );
        identity_id
    }

    /// Match first, enroll only when nothing matches.
    pub fn identify(&mut self, embedding: Embedding, current_frame: u32) -> (u64, IdentityOutcome) {
        match self.match_embedding(&embedding, current_frame) {
            Some(id) => (id, IdentityOutcome::Matched),
            None => (self.enroll(embedding, current_frame), IdentityOutcome::Enrolled),
        }
    }
}

mod embedding;
mod gallery;

pub use embedding::{EMBEDDING_DIM, Embedding, FeatureVector};
pub use gallery::{GalleryConfig, GalleryEntry, GalleryMatcher, IdentityOutcome};

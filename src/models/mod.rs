//! # Embedding Extraction
//!
//! The `Embedder` seam plus its ONNX-backed implementation.

pub mod context;
pub mod vision;

pub use context::InferenceContext;
pub use vision::VisionExtractor;

use image::DynamicImage;

use crate::core::Embedding;
use crate::error::ExtractError;

/// Maps a decoded image to a unit-length feature vector.
///
/// Implementations are shared across worker threads for a whole pass.
pub trait Embedder: Send + Sync {
	fn embed(&self, image: &DynamicImage) -> Result<Embedding, ExtractError>;

	/// Identifies the model in cached embeddings
	fn model_id(&self) -> &str;
}

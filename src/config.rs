//! Application configuration and constants

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// === Model Files ===
pub const VISION_MODEL: &str = "resnet50_features.onnx";
pub const VISION_INPUT: &str = "input";
pub const VISION_OUTPUT: &str = "features";

// === Model Parameters ===
pub const INPUT_SIZE: u32 = 224;
pub const EMBEDDING_DIM: usize = 2048;

/// Per-channel RGB statistics of the ImageNet training set
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

// === Detection ===
pub const DEFAULT_THRESHOLD: f32 = 0.85;
pub const HASH_BUFFER_SIZE: usize = 8192;

// === Storage ===
pub const LIBRARY_META_DIR: &str = ".sift";
pub const REGISTRY_FILE: &str = "library.db";
pub const EMBEDDING_CACHE_DIR: &str = "embeddings";
pub const SIDECAR_EXT: &str = "msgpack";
pub const DEFAULT_RESULTS_FILE: &str = "sift-results.json";
pub const DEFAULT_WORKSPACE: &str = ".sift-workspace";

// === File Extensions ===
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp"];

/// Tunables for one detection pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
	/// Lowercase extensions (without the dot) eligible for scanning
	pub extensions: Vec<String>,
	/// Minimum cosine similarity counted as a near-duplicate (inclusive)
	pub threshold: f32,
	/// Square edge length the extractor resizes to
	pub input_size: u32,
	pub mean: [f32; 3],
	pub std: [f32; 3],
	/// Reuse library embeddings stored under `.sift/embeddings`
	pub cache_embeddings: bool,
}

impl Default for DetectionConfig {
	fn default() -> Self {
		Self {
			extensions: IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
			threshold: DEFAULT_THRESHOLD,
			input_size: INPUT_SIZE,
			mean: IMAGENET_MEAN,
			std: IMAGENET_STD,
			cache_embeddings: true,
		}
	}
}

impl DetectionConfig {
	pub fn with_threshold(mut self, threshold: f32) -> Self {
		self.threshold = threshold;
		self
	}

	/// Case-insensitive extension check
	pub fn accepts(&self, path: &Path) -> bool {
		let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
			return false;
		};
		self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
	}
}

/// Get models directory (SIFT_MODELS_DIR env var, or `models/` next to the executable)
pub fn models_dir() -> Option<PathBuf> {
	if let Ok(env_path) = std::env::var("SIFT_MODELS_DIR") {
		let path = PathBuf::from(&env_path);
		if path.is_dir() {
			crate::ui::debug(&format!("Using SIFT_MODELS_DIR: {}", env_path));
			return Some(path);
		}
	}

	if let Ok(exe) = std::env::current_exe() {
		if let Some(dir) = exe.parent() {
			let models = dir.join("models");
			if models.is_dir() {
				crate::ui::debug(&format!("Found models at: {}", models.display()));
				return Some(models);
			}
		}
	}

	None
}

/// Resolve the vision model, preferring an explicit path
pub fn vision_model_path(explicit: Option<&Path>) -> Option<PathBuf> {
	if let Some(path) = explicit {
		return Some(path.to_path_buf());
	}
	models_dir().map(|d| d.join(VISION_MODEL))
}

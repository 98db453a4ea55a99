//! Cached library embeddings (MessagePack sidecars)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SIDECAR_EXT;
use crate::core::{ContentDigest, Embedding};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbeddingSidecar {
	version: String,
	model: String,
	digest: String,
	embedding: Vec<f32>,
}

impl EmbeddingSidecar {
	pub fn new(model: &str, digest: &ContentDigest, embedding: &Embedding) -> Self {
		Self {
			version: VERSION.to_string(),
			model: model.to_string(),
			digest: digest.as_str().to_string(),
			embedding: embedding.as_slice().to_vec(),
		}
	}

	pub fn embedding(&self) -> Embedding {
		Embedding::raw(self.embedding.clone())
	}

	/// Usable only if written by this version with the same model
	pub fn is_current(&self, model: &str) -> bool {
		self.version == VERSION && self.model == model
	}
}

/// Save sidecar under the cache directory
pub fn save(cache_dir: &Path, sidecar: &EmbeddingSidecar) -> Result<()> {
	fs::create_dir_all(cache_dir).context("Failed to create embedding cache directory")?;

	let path = build_path(cache_dir, &ContentDigest::from_hex(sidecar.digest.clone()));
	let bytes = rmp_serde::to_vec(sidecar).context("Failed to serialize sidecar")?;
	fs::write(&path, bytes).context("Failed to write sidecar")?;

	Ok(())
}

/// Load sidecar for `digest`, if one exists
pub fn load(cache_dir: &Path, digest: &ContentDigest) -> Result<Option<EmbeddingSidecar>> {
	let path = build_path(cache_dir, digest);
	if !path.exists() {
		return Ok(None);
	}
	let bytes = fs::read(&path).context("Failed to read sidecar")?;
	let sidecar = rmp_serde::from_slice(&bytes).context("Failed to deserialize sidecar")?;
	Ok(Some(sidecar))
}

pub fn build_path(cache_dir: &Path, digest: &ContentDigest) -> PathBuf {
	cache_dir.join(format!("{}.{}", digest.as_str(), SIDECAR_EXT))
}

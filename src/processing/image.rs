//! Image loading, validation and encoding

use image::{DynamicImage, ImageReader, ImageResult};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::core::Embedding;
use crate::error::{ExtractError, ScanError};
use crate::models::Embedder;

/// Cheap structural check: parse the header and report dimensions without decoding pixels
pub fn validate(path: &Path) -> Result<(u32, u32), ScanError> {
	let invalid = |reason: String| ScanError::InvalidImage {
		path: path.to_path_buf(),
		reason,
	};

	let reader = sniffed(path).map_err(|e| invalid(e.to_string()))?;

	if reader.format().is_none() {
		return Err(invalid("unrecognized image format".into()));
	}

	let (width, height) = reader.into_dimensions().map_err(|e| invalid(e.to_string()))?;
	if width == 0 || height == 0 {
		return Err(invalid(format!("empty image ({}x{})", width, height)));
	}

	Ok((width, height))
}

/// Reader whose format comes from the file's leading bytes, not its extension
fn sniffed(path: &Path) -> ImageResult<ImageReader<BufReader<File>>> {
	Ok(ImageReader::open(path)?.with_guessed_format()?)
}

/// Header dimensions, format detected from content
pub fn dimensions(path: &Path) -> ImageResult<(u32, u32)> {
	sniffed(path)?.into_dimensions()
}

/// Fully decode an image for embedding
pub fn load(path: &Path) -> Result<DynamicImage, ExtractError> {
	crate::ui::debug(&format!("Decoding image: {}", path.display()));
	sniffed(path)
		.and_then(|reader| reader.decode())
		.map_err(|e| ExtractError::Decode {
			path: path.to_path_buf(),
			message: e.to_string(),
		})
}

/// Decode and embed an image file
pub fn encode(embedder: &dyn Embedder, path: &Path) -> Result<Embedding, ExtractError> {
	let img = load(path)?;
	embedder.embed(&img)
}

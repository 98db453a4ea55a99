// Shared fixtures for integration tests

use image::{DynamicImage, Rgb, RgbImage};
use std::fs;
use std::path::Path;

use sift::core::Embedding;
use sift::error::ExtractError;
use sift::models::Embedder;

/// Mean RGB as the feature vector: deterministic and cheap
pub struct MeanColor;

impl Embedder for MeanColor {
	fn embed(&self, image: &DynamicImage) -> Result<Embedding, ExtractError> {
		let rgb = image.to_rgb8();
		let n = (rgb.width() * rgb.height()) as f32;
		let mut sum = [0.0f32; 3];
		for px in rgb.pixels() {
			for c in 0..3 {
				sum[c] += px[c] as f32;
			}
		}
		Ok(Embedding::new(sum.iter().map(|s| s / n).collect()))
	}

	fn model_id(&self) -> &str {
		"mean-color"
	}
}

pub fn solid(path: &Path, w: u32, h: u32, color: [u8; 3]) {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).unwrap();
	}
	RgbImage::from_pixel(w, h, Rgb(color)).save(path).unwrap();
}

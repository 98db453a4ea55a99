//! CNN feature extractor (ResNet-50 with the classifier head removed)

use image::imageops::FilterType;
use image::DynamicImage;

use super::{Embedder, InferenceContext};
use crate::config::{DetectionConfig, EMBEDDING_DIM, VISION_INPUT, VISION_OUTPUT};
use crate::core::Embedding;
use crate::error::ExtractError;

pub struct VisionExtractor {
	context: InferenceContext,
	input_size: u32,
	mean: [f32; 3],
	std: [f32; 3],
	model_id: String,
}

impl VisionExtractor {
	pub fn new(context: InferenceContext, config: &DetectionConfig) -> Self {
		let model_id = context
			.model_path()
			.file_stem()
			.and_then(|s| s.to_str())
			.unwrap_or("vision")
			.to_string();

		Self {
			context,
			input_size: config.input_size,
			mean: config.mean,
			std: config.std,
			model_id,
		}
	}

	/// Release the session; dropping has the same effect
	pub fn into_context(self) -> InferenceContext {
		self.context
	}
}

impl Embedder for VisionExtractor {
	fn embed(&self, image: &DynamicImage) -> Result<Embedding, ExtractError> {
		let pixels = preprocess(image, self.input_size, self.mean, self.std);
		let input = ort::value::Value::from_array(pixels).map_err(inference)?;

		let mut session = self.context.session()?;
		let outputs = session.run(ort::inputs![VISION_INPUT => input]).map_err(inference)?;
		let features = extract_features(&outputs)?;

		Ok(Embedding::new(features))
	}

	fn model_id(&self) -> &str {
		&self.model_id
	}
}

fn inference(e: ort::Error) -> ExtractError {
	ExtractError::Inference(e.to_string())
}

/// RGB, exact square resize, per-channel standardization, NCHW layout
pub fn preprocess(img: &DynamicImage, size: u32, mean: [f32; 3], std: [f32; 3]) -> (Vec<usize>, Vec<f32>) {
	let resized = img.resize_exact(size, size, FilterType::Triangle);
	let rgb = resized.to_rgb8();
	let size = size as usize;
	let plane = size * size;

	let shape = vec![1, 3, size, size];
	let mut data = vec![0.0f32; 3 * plane];

	for (x, y, px) in rgb.enumerate_pixels() {
		let idx = y as usize * size + x as usize;
		for c in 0..3 {
			data[c * plane + idx] = (px[c] as f32 / 255.0 - mean[c]) / std[c];
		}
	}

	(shape, data)
}

fn extract_features(outputs: &ort::session::SessionOutputs) -> Result<Vec<f32>, ExtractError> {
	let pooled = outputs
		.get(VISION_OUTPUT)
		.ok_or_else(|| ExtractError::Inference(format!("No '{}' output found", VISION_OUTPUT)))?;

	let (shape, data) = pooled.try_extract_tensor::<f32>().map_err(inference)?;
	let dims: Vec<usize> = shape.iter().map(|&x| x as usize).collect();

	let features = match dims.as_slice() {
		[1, _] | [1, _, 1, 1] => data.to_vec(),
		// Unpooled feature map: global average pool
		[1, channels, h, w] => {
			let area = h * w;
			(0..*channels)
				.map(|c| data[c * area..(c + 1) * area].iter().sum::<f32>() / area as f32)
				.collect()
		}
		_ => {
			return Err(ExtractError::Inference(format!(
				"Unexpected feature shape {:?}",
				dims
			)))
		}
	};

	if features.len() != EMBEDDING_DIM {
		crate::ui::debug(&format!(
			"Feature dimension {} differs from expected {}",
			features.len(),
			EMBEDDING_DIM
		));
	}

	Ok(features)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{IMAGENET_MEAN, IMAGENET_STD};
	use image::{Rgb, RgbImage};

	#[test]
	fn preprocess_layout_and_normalization() {
		let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 6, Rgb([255, 0, 128])));
		let (shape, data) = preprocess(&img, 4, IMAGENET_MEAN, IMAGENET_STD);

		assert_eq!(shape, vec![1, 3, 4, 4]);
		assert_eq!(data.len(), 48);

		let red = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
		let green = (0.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
		let blue = (128.0 / 255.0 - IMAGENET_MEAN[2]) / IMAGENET_STD[2];
		assert!((data[0] - red).abs() < 1e-5);
		assert!((data[16] - green).abs() < 1e-5);
		assert!((data[47] - blue).abs() < 1e-5);
	}

	#[test]
	fn preprocess_is_deterministic() {
		let img = DynamicImage::ImageRgb8(RgbImage::from_fn(32, 20, |x, y| Rgb([x as u8 * 7, y as u8 * 11, 90])));
		let a = preprocess(&img, 16, IMAGENET_MEAN, IMAGENET_STD);
		let b = preprocess(&img, 16, IMAGENET_MEAN, IMAGENET_STD);
		assert_eq!(a, b);
	}

	#[test]
	fn grayscale_input_becomes_three_channels() {
		let img = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(8, 8, image::Luma([200])));
		let (shape, data) = preprocess(&img, 8, [0.0; 3], [1.0; 3]);
		assert_eq!(shape[1], 3);
		assert!((data[0] - data[64]).abs() < 1e-6);
		assert!((data[64] - data[128]).abs() < 1e-6);
	}
}

//! Execution provider negotiation for the feature extractor

use anyhow::{Context, Result};
use ort::ep::ExecutionProvider;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use std::path::Path;

use crate::ui;

pub use crate::cli::Provider;

/// Accelerators tried, in order, for a requested provider. CPU is always the
/// last resort and never appears in the chain.
pub fn fallback_chain(requested: Provider) -> Vec<Provider> {
	match requested {
		Provider::Auto => {
			let mut chain = vec![Provider::Tensorrt, Provider::Cuda];
			if cfg!(target_os = "macos") {
				chain.push(Provider::Coreml);
			}
			chain.push(Provider::Xnnpack);
			chain
		}
		Provider::Cpu => Vec::new(),
		explicit => vec![explicit],
	}
}

/// Load `model_path` on the first usable provider of the chain.
///
/// Returns the session and the provider it is actually bound to.
pub fn create_session(model_path: &Path, requested: Provider, intra_threads: usize) -> Result<(Session, Provider)> {
	let mut builder = Session::builder().context("Failed to create session builder")?;

	let bound = fallback_chain(requested)
		.into_iter()
		.find(|&provider| register(&mut builder, provider))
		.unwrap_or(Provider::Cpu);

	match (requested, bound) {
		(Provider::Auto | Provider::Cpu, Provider::Cpu) => ui::info("Using CPU execution provider"),
		(_, Provider::Cpu) => ui::warn(&format!("{:?} requested but unavailable, falling back to CPU", requested)),
		(_, provider) => ui::success(&format!("Using {:?} execution provider", provider)),
	}

	let session = builder
		.with_optimization_level(GraphOptimizationLevel::Level3)?
		.with_intra_threads(intra_threads)?
		.commit_from_file(model_path)
		.context("Failed to load model")?;

	Ok((session, bound))
}

fn register(builder: &mut SessionBuilder, provider: Provider) -> bool {
	match provider {
		Provider::Tensorrt => bind(builder, ort::ep::TensorRT::default(), "TensorRT"),
		Provider::Cuda => bind(builder, ort::ep::CUDA::default(), "CUDA"),
		#[cfg(target_os = "macos")]
		Provider::Coreml => bind(builder, ort::ep::CoreML::default(), "CoreML"),
		Provider::Xnnpack => bind(builder, ort::ep::XNNPACK::default(), "XNNPACK"),
		_ => false,
	}
}

fn bind<P: ExecutionProvider>(builder: &mut SessionBuilder, provider: P, name: &str) -> bool {
	ui::debug(&format!("Trying provider: {}", name));

	if !provider.is_available().unwrap_or(false) {
		ui::debug(&format!("{} not available", name));
		return false;
	}

	match provider.register(builder) {
		Ok(_) => true,
		Err(e) => {
			ui::debug(&format!("{} registration failed: {}", name, e));
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn auto_prefers_gpu_then_xnnpack() {
		let chain = fallback_chain(Provider::Auto);
		assert_eq!(&chain[..2], &[Provider::Tensorrt, Provider::Cuda]);
		assert_eq!(chain.last(), Some(&Provider::Xnnpack));
		assert_eq!(chain.contains(&Provider::Coreml), cfg!(target_os = "macos"));
	}

	#[test]
	fn explicit_requests_try_only_themselves() {
		assert!(fallback_chain(Provider::Cpu).is_empty());
		assert_eq!(fallback_chain(Provider::Cuda), vec![Provider::Cuda]);
		assert!(!fallback_chain(Provider::Xnnpack).contains(&Provider::Cpu));
	}
}

//! Owned ONNX inference context

use anyhow::{Context, Result};
use ort::session::Session;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::ExtractError;
use crate::runtime::{create_session, Provider};

/// A loaded model session plus its accelerator binding.
///
/// Created once per process and shared read-only by every extraction call.
/// `Session::run` needs exclusive access, so calls are serialized here.
pub struct InferenceContext {
	session: Mutex<Session>,
	model_path: PathBuf,
	provider: Provider,
}

impl InferenceContext {
	pub fn initialize(model_path: &Path, provider: Provider) -> Result<Self> {
		if !model_path.exists() {
			anyhow::bail!("Vision model file does not exist: {}", model_path.display());
		}

		let threads = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
		let (session, provider) = create_session(model_path, provider, threads)
			.with_context(|| format!("Failed to load vision model {}", model_path.display()))?;

		Ok(Self {
			session: Mutex::new(session),
			model_path: model_path.to_path_buf(),
			provider,
		})
	}

	pub(crate) fn session(&self) -> Result<MutexGuard<'_, Session>, ExtractError> {
		self.session
			.lock()
			.map_err(|_| ExtractError::Inference("inference session lock poisoned".into()))
	}

	pub fn model_path(&self) -> &Path {
		&self.model_path
	}

	/// Provider the session ended up on, after any fallback
	pub fn provider(&self) -> Provider {
		self.provider
	}
}

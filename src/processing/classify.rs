//! Classification: exact match first, then visual similarity

use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::similarity::LibrarySnapshot;
use crate::config::DetectionConfig;
use crate::core::{
	Candidate, ContentDigest, DetectionResultSet, LibraryRef, Rejected, ScannedFile, SimilarityCheck,
};
use crate::error::{ExtractError, PipelineError};
use crate::library::Library;
use crate::models::Embedder;
use crate::storage::Registry;
use crate::ui;

/// Caller-imposed limits for one pass
#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
	pub timeout: Option<Duration>,
	pub cancel: Option<Arc<AtomicBool>>,
}

struct Guard {
	started: Instant,
	timeout: Option<Duration>,
	cancel: Option<Arc<AtomicBool>>,
}

impl Guard {
	fn new(options: &ClassifyOptions) -> Self {
		Self {
			started: Instant::now(),
			timeout: options.timeout,
			cancel: options.cancel.clone(),
		}
	}

	fn check(&self) -> Result<(), PipelineError> {
		if let Some(cancel) = &self.cancel {
			if cancel.load(Ordering::Relaxed) {
				return Err(PipelineError::Cancelled);
			}
		}
		if let Some(limit) = self.timeout {
			if self.started.elapsed() > limit {
				return Err(PipelineError::Timeout(limit));
			}
		}
		Ok(())
	}
}

pub struct Classifier<'a> {
	embedder: &'a dyn Embedder,
	config: &'a DetectionConfig,
}

impl<'a> Classifier<'a> {
	pub fn new(embedder: &'a dyn Embedder, config: &'a DetectionConfig) -> Self {
		Self { embedder, config }
	}

	/// Classify scanned files against a fixed library snapshot.
	///
	/// Registry failures, model failures, timeout and cancellation abort the
	/// whole pass. Per-file decode failures leave that file Normal with a
	/// `Skipped` similarity check; undecodable library images turn a miss
	/// into `Partial`.
	pub fn classify<R: Registry>(
		&self,
		root: &Path,
		files: Vec<ScannedFile>,
		mut rejected: Vec<Rejected>,
		library: &Library<R>,
		options: &ClassifyOptions,
	) -> Result<DetectionResultSet, PipelineError> {
		let guard = Guard::new(options);
		guard.check()?;

		let hashed: Vec<(ScannedFile, std::io::Result<ContentDigest>)> = files
			.into_par_iter()
			.map(|file| {
				let digest = ContentDigest::compute(&file.path);
				(file, digest)
			})
			.collect();

		let mut candidates = Vec::with_capacity(hashed.len());
		let mut pending = Vec::new();

		for (file, digest) in hashed {
			guard.check()?;

			let digest = match digest {
				Ok(digest) => digest,
				Err(e) => {
					ui::warn(&format!("Failed to hash {}: {}", file.path.display(), e));
					rejected.push(Rejected {
						path: file.path,
						reason: format!("IoError: {}", e),
					});
					continue;
				}
			};

			match library.find_by_digest(&digest)? {
				Some(record) => {
					ui::debug(&format!("{} duplicates {}", file.relative_path.display(), record.display_name));
					candidates.push(Candidate::duplicate(file, digest, LibraryRef::from(&record)));
				}
				None => pending.push((file, digest)),
			}
		}

		if !pending.is_empty() {
			let cache_dir = self.config.cache_embeddings.then(|| library.embedding_cache_dir());
			let snapshot = LibrarySnapshot::new(library.records()?, self.embedder, cache_dir);
			ui::debug(&format!(
				"Comparing {} candidates against {} library images",
				pending.len(),
				snapshot.len()
			));

			let compared = pending
				.into_par_iter()
				.map(|(file, digest)| {
					guard.check()?;
					self.compare(file, digest, &snapshot)
				})
				.collect::<Result<Vec<_>, PipelineError>>()?;

			candidates.extend(compared);
		}

		guard.check()?;
		Ok(DetectionResultSet::new(
			root.to_path_buf(),
			self.config.threshold,
			candidates,
			rejected,
		))
	}

	fn compare(
		&self,
		file: ScannedFile,
		digest: ContentDigest,
		snapshot: &LibrarySnapshot<'_>,
	) -> Result<Candidate, PipelineError> {
		let embedding = match super::image::encode(self.embedder, &file.path) {
			Ok(embedding) => embedding,
			Err(ExtractError::Decode { message, .. }) => {
				ui::warn(&format!(
					"No similarity verdict for {}: {}",
					file.relative_path.display(),
					message
				));
				return Ok(Candidate::normal(file, digest, SimilarityCheck::Skipped(message), 0));
			}
			Err(ExtractError::Inference(msg)) => return Err(PipelineError::Inference(msg)),
		};

		let outcome = snapshot.best_match(&embedding, self.config.threshold)?;

		Ok(match outcome.matched {
			Some((record, score)) => {
				ui::debug(&format!(
					"{} resembles {} ({:.0}%)",
					file.relative_path.display(),
					record.display_name,
					score * 100.0
				));
				Candidate::similar(file, digest, LibraryRef::from(record), score, outcome.skipped)
			}
			None if outcome.skipped > 0 => {
				Candidate::normal(file, digest, SimilarityCheck::Partial, outcome.skipped)
			}
			None => Candidate::normal(file, digest, SimilarityCheck::NoMatch, 0),
		})
	}
}

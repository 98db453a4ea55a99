//! Cosine-similarity matching against a library snapshot

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::core::{Embedding, LibraryId, LibraryRecord};
use crate::error::{ExtractError, PipelineError};
use crate::models::Embedder;
use crate::storage::sidecar::{self, EmbeddingSidecar};
use crate::ui;

/// First library item, in iteration order, whose score reaches `threshold`.
///
/// A score exactly equal to the threshold matches. Later items are not
/// examined once a match is found, even if they would score higher.
pub fn best_match<'a, I>(candidate: &Embedding, library: I, threshold: f32) -> Option<(LibraryId, f32)>
where
	I: IntoIterator<Item = (LibraryId, &'a Embedding)>,
{
	library
		.into_iter()
		.map(|(id, embedding)| (id, candidate.similarity(embedding)))
		.find(|&(_, score)| score >= threshold)
}

enum LibraryEmbedding {
	Ready(Embedding),
	/// The library file no longer decodes; comparisons against it are skipped
	Undecodable,
	Failed(String),
}

struct Entry {
	record: LibraryRecord,
	embedding: OnceLock<LibraryEmbedding>,
}

pub struct MatchOutcome<'s> {
	pub matched: Option<(&'s LibraryRecord, f32)>,
	/// Library images passed over because they could not be embedded
	pub skipped: usize,
}

/// Library records fixed for one pass, embedded on first use
pub struct LibrarySnapshot<'a> {
	entries: Vec<Entry>,
	embedder: &'a dyn Embedder,
	cache_dir: Option<PathBuf>,
}

impl<'a> LibrarySnapshot<'a> {
	pub fn new(records: Vec<LibraryRecord>, embedder: &'a dyn Embedder, cache_dir: Option<PathBuf>) -> Self {
		let entries = records
			.into_iter()
			.map(|record| Entry {
				record,
				embedding: OnceLock::new(),
			})
			.collect();

		Self {
			entries,
			embedder,
			cache_dir,
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Compare a candidate against every library image in registry order
	pub fn best_match(&self, candidate: &Embedding, threshold: f32) -> Result<MatchOutcome<'_>, PipelineError> {
		let mut skipped = 0;
		let mut failure = None;

		let library = self
			.entries
			.iter()
			.map_while(|entry| match self.embedding(entry) {
				LibraryEmbedding::Ready(e) => Some(Some((entry.record.id, e))),
				LibraryEmbedding::Undecodable => {
					skipped += 1;
					Some(None)
				}
				LibraryEmbedding::Failed(msg) => {
					failure = Some(msg.clone());
					None
				}
			})
			.flatten();

		let found = best_match(candidate, library, threshold);

		if let Some(msg) = failure {
			return Err(PipelineError::Inference(msg));
		}

		let matched = found.and_then(|(id, score)| {
			self.entries
				.iter()
				.find(|e| e.record.id == id)
				.map(|e| (&e.record, score))
		});

		Ok(MatchOutcome { matched, skipped })
	}

	fn embedding<'s>(&'s self, entry: &'s Entry) -> &'s LibraryEmbedding {
		entry.embedding.get_or_init(|| self.compute(&entry.record))
	}

	fn compute(&self, record: &LibraryRecord) -> LibraryEmbedding {
		let model = self.embedder.model_id();

		if let Some(dir) = &self.cache_dir {
			match sidecar::load(dir, &record.content_digest) {
				Ok(Some(cached)) if cached.is_current(model) => return LibraryEmbedding::Ready(cached.embedding()),
				Ok(_) => {}
				Err(e) => ui::debug(&format!("Ignoring cached embedding for {}: {}", record.display_name, e)),
			}
		}

		match super::image::encode(self.embedder, Path::new(&record.storage_path)) {
			Ok(embedding) => {
				if let Some(dir) = &self.cache_dir {
					let entry = EmbeddingSidecar::new(model, &record.content_digest, &embedding);
					if let Err(e) = sidecar::save(dir, &entry) {
						ui::warn(&format!("Could not cache embedding for {}: {}", record.display_name, e));
					}
				}
				LibraryEmbedding::Ready(embedding)
			}
			Err(ExtractError::Decode { message, .. }) => {
				ui::warn(&format!("Skipping library image {}: {}", record.display_name, message));
				LibraryEmbedding::Undecodable
			}
			Err(e @ ExtractError::Inference(_)) => LibraryEmbedding::Failed(e.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn unit(v: &[f32]) -> Embedding {
		Embedding::new(v.to_vec())
	}

	#[test]
	fn score_equal_to_threshold_matches() {
		let candidate = unit(&[1.0, 0.0]);
		let lib = unit(&[0.6, 0.8]);
		let score = candidate.similarity(&lib);

		let found = best_match(&candidate, [(7, &lib)], score);
		assert_eq!(found, Some((7, score)));
	}

	#[test]
	fn score_one_ulp_below_threshold_does_not_match() {
		let candidate = unit(&[1.0, 0.0]);
		let lib = unit(&[0.6, 0.8]);
		let score = candidate.similarity(&lib);
		let threshold = f32::from_bits(score.to_bits() + 1);

		assert!(score < threshold);
		assert_eq!(best_match(&candidate, [(7, &lib)], threshold), None);
	}

	#[test]
	fn first_qualifying_item_wins_over_better_later_item() {
		let candidate = unit(&[1.0, 0.0]);
		let good = unit(&[0.9, 0.436]);
		let perfect = unit(&[1.0, 0.0]);
		let poor = unit(&[0.0, 1.0]);

		let found = best_match(&candidate, [(1, &poor), (2, &good), (3, &perfect)], 0.85).unwrap();
		assert_eq!(found.0, 2);
		assert!(found.1 < 1.0);
	}

	#[test]
	fn empty_library_has_no_match() {
		let candidate = unit(&[1.0, 0.0]);
		assert_eq!(best_match(&candidate, std::iter::empty(), 0.0), None);
	}
}

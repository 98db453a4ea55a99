//! Pipeline entry points used by front ends

use std::path::Path;

use crate::config::DetectionConfig;
use crate::core::DetectionResultSet;
use crate::error::{CommitError, OverrideError, PipelineError};
use crate::library::Library;
use crate::models::Embedder;
use crate::processing::{self, ClassifyOptions, Classifier, CommitReport, Scanner};
use crate::storage::Registry;

/// Owns the embedder for the life of the process and runs detection passes with it
pub struct Detector<E: Embedder> {
	embedder: E,
	config: DetectionConfig,
}

impl<E: Embedder> Detector<E> {
	pub fn new(embedder: E, config: DetectionConfig) -> Self {
		Self { embedder, config }
	}

	pub fn config(&self) -> &DetectionConfig {
		&self.config
	}

	pub fn embedder(&self) -> &E {
		&self.embedder
	}

	/// Scan `root` and classify every image found against `library`.
	///
	/// Borrowing the library shared keeps commits out while a pass is running.
	pub fn scan_and_classify<R: Registry>(
		&self,
		root: &Path,
		library: &Library<R>,
		options: &ClassifyOptions,
	) -> Result<DetectionResultSet, PipelineError> {
		if !root.is_dir() {
			return Err(PipelineError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("scan root {} is not a directory", root.display()),
			)));
		}

		let scan = Scanner::new(root, &self.config).scan();
		Classifier::new(&self.embedder, &self.config).classify(root, scan.files, scan.rejected, library, options)
	}
}

/// Admit the Normal candidates of `results` into `library`
pub fn commit_normal<R: Registry>(
	results: &DetectionResultSet,
	library: &mut Library<R>,
) -> Result<CommitReport, CommitError> {
	processing::commit_normal(results, library)
}

/// Curator override Similar → Normal, returning the updated set
pub fn override_to_normal(results: &DetectionResultSet, index: usize) -> Result<DetectionResultSet, OverrideError> {
	results.override_to_normal(index)
}

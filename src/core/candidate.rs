//! Candidate images and the ordered result of a detection pass

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use super::{ContentDigest, LibraryRef};
use crate::error::{OverrideError, ResultsError};

/// Terminal classification of a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
	Similar,
	Duplicate,
	Normal,
}

impl Status {
	/// Sort priority: Similar first, then Duplicate, then Normal
	pub fn priority(self) -> u8 {
		match self {
			Status::Similar => 0,
			Status::Duplicate => 1,
			Status::Normal => 2,
		}
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			Status::Similar => "Similar",
			Status::Duplicate => "Duplicate",
			Status::Normal => "Normal",
		};
		f.write_str(label)
	}
}

/// Outcome of the embedding comparison for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason")]
pub enum SimilarityCheck {
	/// Short-circuited by an exact match
	NotRun,
	Matched,
	NoMatch,
	/// No match among the library images that could be compared; some could not
	Partial,
	/// The candidate itself could not be embedded
	Skipped(String),
	/// Cleared by the curator after a Similar verdict
	Overridden,
}

/// A file that passed the scanner, in scan order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
	pub scan_index: usize,
	pub path: PathBuf,
	pub relative_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
	pub scan_index: usize,
	pub path: PathBuf,
	/// Path relative to the scan root, for display
	pub relative_path: PathBuf,
	pub digest: ContentDigest,
	pub status: Status,
	/// Present only when Similar
	pub score: Option<f32>,
	/// Present only when Similar or Duplicate
	pub matched: Option<LibraryRef>,
	pub similarity_check: SimilarityCheck,
	/// Library images that could not be embedded while comparing this candidate
	#[serde(default)]
	pub skipped_comparisons: usize,
}

impl Candidate {
	pub fn duplicate(file: ScannedFile, digest: ContentDigest, matched: LibraryRef) -> Self {
		Self::build(file, digest, Status::Duplicate, None, Some(matched), SimilarityCheck::NotRun, 0)
	}

	pub fn similar(
		file: ScannedFile,
		digest: ContentDigest,
		matched: LibraryRef,
		score: f32,
		skipped_comparisons: usize,
	) -> Self {
		Self::build(
			file,
			digest,
			Status::Similar,
			Some(score),
			Some(matched),
			SimilarityCheck::Matched,
			skipped_comparisons,
		)
	}

	pub fn normal(
		file: ScannedFile,
		digest: ContentDigest,
		check: SimilarityCheck,
		skipped_comparisons: usize,
	) -> Self {
		Self::build(file, digest, Status::Normal, None, None, check, skipped_comparisons)
	}

	fn build(
		file: ScannedFile,
		digest: ContentDigest,
		status: Status,
		score: Option<f32>,
		matched: Option<LibraryRef>,
		similarity_check: SimilarityCheck,
		skipped_comparisons: usize,
	) -> Self {
		Self {
			scan_index: file.scan_index,
			path: file.path,
			relative_path: file.relative_path,
			digest,
			status,
			score,
			matched,
			similarity_check,
			skipped_comparisons,
		}
	}

	pub fn file_name(&self) -> &str {
		self.path
			.file_name()
			.and_then(|n| n.to_str())
			.unwrap_or("unknown")
	}
}

/// A file the scanner refused
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejected {
	pub path: PathBuf,
	pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
	pub total: usize,
	pub similar: usize,
	pub duplicate: usize,
	pub normal: usize,
	pub rejected: usize,
}

/// Classified candidates, ordered Similar, Duplicate, Normal with scan order preserved within each status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResultSet {
	pub root: PathBuf,
	pub threshold: f32,
	pub created_at: DateTime<Utc>,
	candidates: Vec<Candidate>,
	rejected: Vec<Rejected>,
}

impl DetectionResultSet {
	pub fn new(root: PathBuf, threshold: f32, candidates: Vec<Candidate>, rejected: Vec<Rejected>) -> Self {
		let mut set = Self {
			root,
			threshold,
			created_at: Utc::now(),
			candidates,
			rejected,
		};
		set.sort();
		set
	}

	fn sort(&mut self) {
		self.candidates.sort_by_key(|c| (c.status.priority(), c.scan_index));
	}

	pub fn candidates(&self) -> &[Candidate] {
		&self.candidates
	}

	pub fn rejected(&self) -> &[Rejected] {
		&self.rejected
	}

	pub fn len(&self) -> usize {
		self.candidates.len()
	}

	pub fn is_empty(&self) -> bool {
		self.candidates.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&Candidate> {
		self.candidates.get(index)
	}

	pub fn normal(&self) -> impl Iterator<Item = &Candidate> {
		self.candidates.iter().filter(|c| c.status == Status::Normal)
	}

	pub fn stats(&self) -> Stats {
		let mut stats = Stats {
			total: self.candidates.len(),
			rejected: self.rejected.len(),
			..Stats::default()
		};
		for c in &self.candidates {
			match c.status {
				Status::Similar => stats.similar += 1,
				Status::Duplicate => stats.duplicate += 1,
				Status::Normal => stats.normal += 1,
			}
		}
		stats
	}

	/// Relative paths of Duplicate and Similar candidates, in result order
	pub fn problem_paths(&self) -> Vec<&Path> {
		self.candidates
			.iter()
			.filter(|c| c.status != Status::Normal)
			.map(|c| c.relative_path.as_path())
			.collect()
	}

	/// Curator override: Similar becomes Normal, clearing score and match.
	/// Returns a new set; `self` is left untouched.
	pub fn override_to_normal(&self, index: usize) -> Result<Self, OverrideError> {
		let candidate = self.candidates.get(index).ok_or(OverrideError::OutOfRange {
			index,
			len: self.candidates.len(),
		})?;

		if candidate.status != Status::Similar {
			return Err(OverrideError::NotSimilar {
				index,
				status: candidate.status,
			});
		}

		let mut next = self.clone();
		let target = &mut next.candidates[index];
		target.status = Status::Normal;
		target.score = None;
		target.matched = None;
		target.similarity_check = SimilarityCheck::Overridden;
		next.sort();
		Ok(next)
	}

	pub fn save(&self, path: &Path) -> Result<(), ResultsError> {
		let json = serde_json::to_string_pretty(self).map_err(|source| ResultsError::Format {
			path: path.to_path_buf(),
			source,
		})?;
		fs::write(path, json).map_err(|source| ResultsError::Io {
			path: path.to_path_buf(),
			source,
		})
	}

	pub fn load(path: &Path) -> Result<Self, ResultsError> {
		let json = fs::read_to_string(path).map_err(|source| ResultsError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		serde_json::from_str(&json).map_err(|source| ResultsError::Format {
			path: path.to_path_buf(),
			source,
		})
	}
}

//! Error types for the detection pipeline

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::core::Status;

/// Stable error names shown to the curator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	InvalidImage,
	DecodeError,
	RegistryError,
	ArchiveError,
	InferenceError,
	Timeout,
	Cancelled,
	IoError,
	InvalidOverride,
	InvalidResults,
}

impl ErrorKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorKind::InvalidImage => "InvalidImage",
			ErrorKind::DecodeError => "DecodeError",
			ErrorKind::RegistryError => "RegistryError",
			ErrorKind::ArchiveError => "ArchiveError",
			ErrorKind::InferenceError => "InferenceError",
			ErrorKind::Timeout => "Timeout",
			ErrorKind::Cancelled => "Cancelled",
			ErrorKind::IoError => "IoError",
			ErrorKind::InvalidOverride => "InvalidOverride",
			ErrorKind::InvalidResults => "InvalidResults",
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Error)]
pub enum ScanError {
	#[error("Invalid image {}: {reason}", path.display())]
	InvalidImage { path: PathBuf, reason: String },

	#[error("Failed to walk {}: {source}", path.display())]
	Walk {
		path: PathBuf,
		#[source]
		source: walkdir::Error,
	},
}

impl ScanError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			ScanError::InvalidImage { .. } => ErrorKind::InvalidImage,
			ScanError::Walk { .. } => ErrorKind::IoError,
		}
	}
}

#[derive(Debug, Error)]
pub enum ExtractError {
	#[error("Failed to decode {}: {message}", path.display())]
	Decode { path: PathBuf, message: String },

	#[error("Inference failed: {0}")]
	Inference(String),
}

impl ExtractError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			ExtractError::Decode { .. } => ErrorKind::DecodeError,
			ExtractError::Inference(_) => ErrorKind::InferenceError,
		}
	}
}

#[derive(Debug, Error)]
pub enum RegistryError {
	#[error("Database error: {0}")]
	Database(#[from] rusqlite::Error),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("{0}")]
	Other(String),
}

impl RegistryError {
	pub fn kind(&self) -> ErrorKind {
		ErrorKind::RegistryError
	}
}

#[derive(Debug, Error)]
pub enum ArchiveError {
	#[error("Failed to open archive {}: {source}", path.display())]
	Open {
		path: PathBuf,
		#[source]
		source: zip::result::ZipError,
	},

	#[error("Failed to extract entry {name}: {message}")]
	Entry { name: String, message: String },

	#[error("Workspace error: {0}")]
	Io(#[from] std::io::Error),
}

impl ArchiveError {
	pub fn kind(&self) -> ErrorKind {
		ErrorKind::ArchiveError
	}
}

/// Batch-level failures that abort a detection pass
#[derive(Debug, Error)]
pub enum PipelineError {
	#[error("Registry lookup failed: {0}")]
	Registry(#[from] RegistryError),

	#[error("Embedding model failed: {0}")]
	Inference(String),

	#[error("Detection exceeded its {}s budget", .0.as_secs_f32())]
	Timeout(Duration),

	#[error("Detection cancelled")]
	Cancelled,

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

impl PipelineError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			PipelineError::Registry(_) => ErrorKind::RegistryError,
			PipelineError::Inference(_) => ErrorKind::InferenceError,
			PipelineError::Timeout(_) => ErrorKind::Timeout,
			PipelineError::Cancelled => ErrorKind::Cancelled,
			PipelineError::Io(_) => ErrorKind::IoError,
		}
	}
}

/// A failed commit batch; nothing from the batch was admitted
#[derive(Debug, Error)]
pub enum CommitError {
	#[error("Registry insert failed, batch rolled back: {0}")]
	Registry(#[from] RegistryError),

	#[error("Failed to copy {} into library: {source}", path.display())]
	Copy {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to read dimensions of {}: {message}", path.display())]
	Dimensions { path: PathBuf, message: String },

	#[error("Could not find a free library name for {0}")]
	NameExhausted(String),
}

impl CommitError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			CommitError::Registry(_) => ErrorKind::RegistryError,
			CommitError::Copy { .. } | CommitError::NameExhausted(_) => ErrorKind::IoError,
			CommitError::Dimensions { .. } => ErrorKind::DecodeError,
		}
	}

	/// Images admitted by a failed batch
	pub fn inserted(&self) -> usize {
		0
	}
}

#[derive(Debug, Error)]
pub enum OverrideError {
	#[error("Candidate index {index} out of range ({len} results)")]
	OutOfRange { index: usize, len: usize },

	#[error("Only Similar candidates can be marked Normal (candidate {index} is {status})")]
	NotSimilar { index: usize, status: Status },
}

impl OverrideError {
	pub fn kind(&self) -> ErrorKind {
		ErrorKind::InvalidOverride
	}
}

/// Reading or writing a saved results file
#[derive(Debug, Error)]
pub enum ResultsError {
	#[error("Failed to access results file {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Malformed results file {}: {source}", path.display())]
	Format {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
}

impl ResultsError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			ResultsError::Io { .. } => ErrorKind::IoError,
			ResultsError::Format { .. } => ErrorKind::InvalidResults,
		}
	}
}

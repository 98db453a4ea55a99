//! Core domain types

pub mod candidate;
pub mod embedding;
pub mod hash;
pub mod record;

pub use candidate::{Candidate, DetectionResultSet, Rejected, ScannedFile, SimilarityCheck, Stats, Status};
pub use embedding::Embedding;
pub use hash::ContentDigest;
pub use record::{LibraryId, LibraryRecord, LibraryRef, NewLibraryRecord};

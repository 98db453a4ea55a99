//! Registry records for accepted library images

use serde::{Deserialize, Serialize};

use super::ContentDigest;

pub type LibraryId = i64;

/// A committed library image as stored in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRecord {
	pub id: LibraryId,
	pub display_name: String,
	pub storage_path: String,
	pub content_digest: ContentDigest,
	pub width: u32,
	pub height: u32,
}

/// Row to insert; the registry assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLibraryRecord {
	pub display_name: String,
	pub storage_path: String,
	pub content_digest: ContentDigest,
	pub width: u32,
	pub height: u32,
}

/// What a candidate matched against, kept with the result for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRef {
	pub id: LibraryId,
	pub display_name: String,
	pub storage_path: String,
}

impl From<&LibraryRecord> for LibraryRef {
	fn from(record: &LibraryRecord) -> Self {
		Self {
			id: record.id,
			display_name: record.display_name.clone(),
			storage_path: record.storage_path.clone(),
		}
	}
}

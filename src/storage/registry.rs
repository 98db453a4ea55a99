//! Registry interface for library records

use crate::core::{ContentDigest, LibraryId, LibraryRecord, NewLibraryRecord};
use crate::error::RegistryError;

/// Durable store of accepted library images.
///
/// Lookups are single round trips; `insert_batch` is all-or-nothing.
pub trait Registry {
	/// First record (lowest id) with this digest
	fn lookup_by_digest(&self, digest: &ContentDigest) -> Result<Option<LibraryRecord>, RegistryError>;

	/// All records in ascending id order
	fn records(&self) -> Result<Vec<LibraryRecord>, RegistryError>;

	/// Insert every record in one transaction, returning ids in input order
	fn insert_batch(&mut self, records: &[NewLibraryRecord]) -> Result<Vec<LibraryId>, RegistryError>;
}

//! Reference library: storage directory plus registry

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{EMBEDDING_CACHE_DIR, LIBRARY_META_DIR, REGISTRY_FILE};
use crate::core::{ContentDigest, LibraryRecord};
use crate::error::RegistryError;
use crate::storage::{Registry, SqliteRegistry};

pub struct Library<R: Registry = SqliteRegistry> {
	root: PathBuf,
	registry: R,
}

impl Library<SqliteRegistry> {
	/// Open (or create) a library rooted at `root`, with its registry under `.sift/`
	pub fn open(root: &Path) -> Result<Self, RegistryError> {
		let meta = root.join(LIBRARY_META_DIR);
		fs::create_dir_all(&meta)?;
		let registry = SqliteRegistry::open(&meta.join(REGISTRY_FILE))?;
		Self::with_registry(root, registry)
	}
}

impl<R: Registry> Library<R> {
	/// Wrap `registry` for the library at `root`.
	///
	/// The root is made absolute so stored image paths resolve from any working directory.
	pub fn with_registry(root: &Path, registry: R) -> Result<Self, RegistryError> {
		fs::create_dir_all(root)?;
		let root = fs::canonicalize(root)?;
		Ok(Self { root, registry })
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn embedding_cache_dir(&self) -> PathBuf {
		self.root.join(LIBRARY_META_DIR).join(EMBEDDING_CACHE_DIR)
	}

	pub fn registry(&self) -> &R {
		&self.registry
	}

	pub fn registry_mut(&mut self) -> &mut R {
		&mut self.registry
	}

	/// Exact-duplicate lookup: the first library record holding these bytes
	pub fn find_by_digest(&self, digest: &ContentDigest) -> Result<Option<LibraryRecord>, RegistryError> {
		self.registry.lookup_by_digest(digest)
	}

	pub fn records(&self) -> Result<Vec<LibraryRecord>, RegistryError> {
		self.registry.records()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::NewLibraryRecord;
	use tempfile::TempDir;

	#[test]
	fn open_creates_layout_and_resolves_digests() {
		let dir = TempDir::new().unwrap();
		let root = dir.path().join("library");
		let mut library = Library::open(&root).unwrap();

		assert!(root.join(LIBRARY_META_DIR).join(REGISTRY_FILE).exists());

		let digest = ContentDigest::from_hex("a".repeat(64));
		assert!(library.find_by_digest(&digest).unwrap().is_none());

		library
			.registry_mut()
			.insert_batch(&[NewLibraryRecord {
				display_name: "l.png".into(),
				storage_path: root.join("l.png").to_string_lossy().into_owned(),
				content_digest: digest.clone(),
				width: 2,
				height: 3,
			}])
			.unwrap();

		let found = library.find_by_digest(&digest).unwrap().unwrap();
		assert_eq!(found.display_name, "l.png");
	}

	#[cfg(unix)]
	#[test]
	fn relative_root_becomes_absolute() {
		let dir = TempDir::new().unwrap();
		let cwd = std::env::current_dir().unwrap();

		let mut relative = PathBuf::new();
		for _ in cwd.components().skip(1) {
			relative.push("..");
		}
		relative.push(dir.path().strip_prefix("/").unwrap());
		relative.push("library");
		assert!(relative.is_relative());

		let library = Library::open(&relative).unwrap();
		assert!(library.root().is_absolute());
		assert_eq!(library.root(), dir.path().join("library").canonicalize().unwrap());
	}
}

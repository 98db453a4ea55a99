//! Admitting Normal candidates into the library

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{Candidate, ContentDigest, DetectionResultSet, LibraryId, NewLibraryRecord};
use crate::error::CommitError;
use crate::library::Library;
use crate::storage::Registry;
use crate::ui;

#[derive(Debug, Default)]
pub struct CommitReport {
	pub inserted: usize,
	pub ids: Vec<LibraryId>,
	/// Library paths written, in commit order
	pub stored: Vec<PathBuf>,
	/// Normal candidates left out, with the reason
	pub skipped: Vec<(PathBuf, String)>,
}

/// Copy every Normal candidate into the library and register it.
///
/// All-or-nothing: on any failure the registry transaction is rolled back,
/// files copied by this batch are removed, and the error is returned.
pub fn commit_normal<R: Registry>(
	results: &DetectionResultSet,
	library: &mut Library<R>,
) -> Result<CommitReport, CommitError> {
	let mut report = CommitReport::default();
	let mut records = Vec::new();
	let mut seen: HashSet<&ContentDigest> = HashSet::new();

	for candidate in results.normal() {
		if !seen.insert(&candidate.digest) {
			report
				.skipped
				.push((candidate.path.clone(), "same content as an earlier candidate".into()));
			continue;
		}

		if let Some(existing) = library.find_by_digest(&candidate.digest).inspect_err(|_| {
			rollback_files(&report.stored);
		})? {
			report
				.skipped
				.push((candidate.path.clone(), format!("already in library as {}", existing.display_name)));
			continue;
		}

		match admit(candidate, library.root()) {
			Ok((dest, record)) => {
				report.stored.push(dest);
				records.push(record);
			}
			Err((dest, e)) => {
				if let Some(dest) = dest {
					report.stored.push(dest);
				}
				rollback_files(&report.stored);
				return Err(e);
			}
		}
	}

	if records.is_empty() {
		return Ok(report);
	}

	match library.registry_mut().insert_batch(&records) {
		Ok(ids) => {
			report.inserted = ids.len();
			report.ids = ids;
			for (path, _) in &report.skipped {
				ui::debug(&format!("Not admitted: {}", path.display()));
			}
			Ok(report)
		}
		Err(e) => {
			rollback_files(&report.stored);
			Err(CommitError::Registry(e))
		}
	}
}

/// Copy one candidate and read back its dimensions.
/// On failure, returns the destination if a file was already written there.
fn admit(
	candidate: &Candidate,
	library_root: &Path,
) -> Result<(PathBuf, NewLibraryRecord), (Option<PathBuf>, CommitError)> {
	let dest = destination(library_root, candidate.file_name(), &candidate.digest).map_err(|e| (None, e))?;

	fs::copy(&candidate.path, &dest).map_err(|source| {
		(
			dest.exists().then(|| dest.clone()),
			CommitError::Copy {
				path: candidate.path.clone(),
				source,
			},
		)
	})?;

	let (width, height) = super::image::dimensions(&dest).map_err(|e| {
		(
			Some(dest.clone()),
			CommitError::Dimensions {
				path: dest.clone(),
				message: e.to_string(),
			},
		)
	})?;

	let display_name = dest
		.file_name()
		.map(|n| n.to_string_lossy().into_owned())
		.unwrap_or_default();

	ui::debug(&format!("Copied {} -> {}", candidate.relative_path.display(), display_name));

	let record = NewLibraryRecord {
		display_name,
		storage_path: dest.to_string_lossy().into_owned(),
		content_digest: candidate.digest.clone(),
		width,
		height,
	};
	Ok((dest, record))
}

/// Free library path for `name`: the name itself, else `<digest>_<name>`,
/// else that with a numeric suffix
pub fn destination(library_root: &Path, name: &str, digest: &ContentDigest) -> Result<PathBuf, CommitError> {
	let plain = library_root.join(name);
	if !plain.exists() {
		return Ok(plain);
	}

	let prefixed = library_root.join(format!("{}_{}", digest.as_str(), name));
	if !prefixed.exists() {
		return Ok(prefixed);
	}

	let stem = prefixed
		.file_stem()
		.and_then(|s| s.to_str())
		.unwrap_or("image")
		.to_string();
	let ext = prefixed.extension().and_then(|e| e.to_str()).unwrap_or("");

	for i in 1..1000 {
		let candidate = if ext.is_empty() {
			library_root.join(format!("{}_{}", stem, i))
		} else {
			library_root.join(format!("{}_{}.{}", stem, i, ext))
		};
		if !candidate.exists() {
			return Ok(candidate);
		}
	}

	Err(CommitError::NameExhausted(name.to_string()))
}

fn rollback_files(paths: &[PathBuf]) {
	for path in paths {
		if let Err(e) = fs::remove_file(path) {
			ui::warn(&format!("Could not remove {} during rollback: {}", path.display(), e));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::{LibraryRecord, ScannedFile, SimilarityCheck};
	use crate::error::RegistryError;
	use crate::storage::SqliteRegistry;
	use image::{Rgb, RgbImage};
	use tempfile::TempDir;

	fn normal(index: usize, path: &Path, root: &Path) -> Candidate {
		Candidate::normal(
			ScannedFile {
				scan_index: index,
				path: path.to_path_buf(),
				relative_path: path.strip_prefix(root).unwrap().to_path_buf(),
			},
			ContentDigest::compute(path).unwrap(),
			SimilarityCheck::NoMatch,
			0,
		)
	}

	fn image(path: &Path, w: u32, h: u32, shade: u8) {
		fs::create_dir_all(path.parent().unwrap()).unwrap();
		RgbImage::from_pixel(w, h, Rgb([shade, shade, shade])).save(path).unwrap();
	}

	/// Accepts lookups, refuses every insert
	struct ReadOnly;

	impl Registry for ReadOnly {
		fn lookup_by_digest(&self, _: &ContentDigest) -> Result<Option<LibraryRecord>, RegistryError> {
			Ok(None)
		}

		fn records(&self) -> Result<Vec<LibraryRecord>, RegistryError> {
			Ok(Vec::new())
		}

		fn insert_batch(&mut self, _: &[NewLibraryRecord]) -> Result<Vec<LibraryId>, RegistryError> {
			Err(RegistryError::Other("database is locked".into()))
		}
	}

	#[test]
	fn colliding_names_get_digest_prefixes() {
		let dir = TempDir::new().unwrap();
		let batch = dir.path().join("batch");
		let lib_root = dir.path().join("library");

		image(&lib_root.join("photo.png"), 3, 3, 0);
		let first = batch.join("x/photo.png");
		let second = batch.join("y/photo.png");
		image(&first, 10, 20, 50);
		image(&second, 30, 40, 90);

		let results = DetectionResultSet::new(
			batch.clone(),
			0.85,
			vec![normal(0, &first, &batch), normal(1, &second, &batch)],
			Vec::new(),
		);
		let mut library = Library::with_registry(&lib_root, SqliteRegistry::in_memory().unwrap()).unwrap();
		let report = commit_normal(&results, &mut library).unwrap();

		assert_eq!(report.inserted, 2);
		let rows = library.records().unwrap();
		assert_eq!(rows.len(), 2);

		let d1 = ContentDigest::compute(&first).unwrap();
		let d2 = ContentDigest::compute(&second).unwrap();
		assert_eq!(rows[0].display_name, format!("{}_photo.png", d1));
		assert_eq!((rows[0].width, rows[0].height), (10, 20));
		assert_eq!(rows[1].display_name, format!("{}_photo.png", d2));
		assert_eq!((rows[1].width, rows[1].height), (30, 40));
		assert_ne!(rows[0].storage_path, rows[1].storage_path);
		assert!(Path::new(&rows[0].storage_path).exists());
		assert!(Path::new(&rows[1].storage_path).exists());
	}

	#[test]
	fn free_name_is_kept() {
		let dir = TempDir::new().unwrap();
		let batch = dir.path().join("batch");
		let lib_root = dir.path().join("library");
		let src = batch.join("new.png");
		image(&src, 5, 6, 10);

		let results = DetectionResultSet::new(batch.clone(), 0.85, vec![normal(0, &src, &batch)], Vec::new());
		let mut library = Library::with_registry(&lib_root, SqliteRegistry::in_memory().unwrap()).unwrap();
		commit_normal(&results, &mut library).unwrap();

		let rows = library.records().unwrap();
		assert_eq!(rows[0].display_name, "new.png");
		assert_eq!(rows[0].storage_path, library.root().join("new.png").to_string_lossy());
		assert!(Path::new(&rows[0].storage_path).is_absolute());
	}

	#[test]
	fn identical_content_in_batch_is_admitted_once() {
		let dir = TempDir::new().unwrap();
		let batch = dir.path().join("batch");
		let a = batch.join("a.png");
		let b = batch.join("b.png");
		image(&a, 4, 4, 77);
		fs::copy(&a, &b).unwrap();

		let results = DetectionResultSet::new(
			batch.clone(),
			0.85,
			vec![normal(0, &a, &batch), normal(1, &b, &batch)],
			Vec::new(),
		);
		let mut library =
			Library::with_registry(&dir.path().join("library"), SqliteRegistry::in_memory().unwrap()).unwrap();
		let report = commit_normal(&results, &mut library).unwrap();

		assert_eq!(report.inserted, 1);
		assert_eq!(report.skipped.len(), 1);

		// committing the same results again admits nothing new
		let again = commit_normal(&results, &mut library).unwrap();
		assert_eq!(again.inserted, 0);
		assert_eq!(library.records().unwrap().len(), 1);
	}

	#[test]
	fn insert_failure_rolls_back_copies() {
		let dir = TempDir::new().unwrap();
		let batch = dir.path().join("batch");
		let lib_root = dir.path().join("library");
		let a = batch.join("a.png");
		let b = batch.join("b.png");
		image(&a, 4, 4, 1);
		image(&b, 4, 4, 2);

		let results = DetectionResultSet::new(
			batch.clone(),
			0.85,
			vec![normal(0, &a, &batch), normal(1, &b, &batch)],
			Vec::new(),
		);
		let mut library = Library::with_registry(&lib_root, ReadOnly).unwrap();
		let err = commit_normal(&results, &mut library).unwrap_err();

		assert!(matches!(err, CommitError::Registry(_)));
		assert_eq!(err.inserted(), 0);
		assert!(!lib_root.join("a.png").exists());
		assert!(!lib_root.join("b.png").exists());
	}

	#[test]
	fn mislabeled_png_is_admitted_with_dimensions() {
		let dir = TempDir::new().unwrap();
		let batch = dir.path().join("batch");
		let src = batch.join("photo.jpg");
		image(&batch.join("photo.png"), 7, 3, 40);
		fs::rename(batch.join("photo.png"), &src).unwrap();

		let results = DetectionResultSet::new(batch.clone(), 0.85, vec![normal(0, &src, &batch)], Vec::new());
		let mut library =
			Library::with_registry(&dir.path().join("library"), SqliteRegistry::in_memory().unwrap()).unwrap();
		let report = commit_normal(&results, &mut library).unwrap();

		assert_eq!(report.inserted, 1);
		let rows = library.records().unwrap();
		assert_eq!((rows[0].width, rows[0].height), (7, 3));
	}

	#[test]
	fn failed_copy_removes_earlier_copies_only() {
		let dir = TempDir::new().unwrap();
		let batch = dir.path().join("batch");
		let lib_root = dir.path().join("library");
		let a = batch.join("a.png");
		let gone = batch.join("gone.png");
		image(&a, 4, 4, 5);
		image(&gone, 4, 4, 6);

		let results = DetectionResultSet::new(
			batch.clone(),
			0.85,
			vec![normal(0, &a, &batch), normal(1, &gone, &batch)],
			Vec::new(),
		);
		fs::remove_file(&gone).unwrap();

		let mut library = Library::with_registry(&lib_root, SqliteRegistry::in_memory().unwrap()).unwrap();
		let err = commit_normal(&results, &mut library).unwrap_err();

		assert!(matches!(err, CommitError::Copy { .. }));
		assert!(!lib_root.join("a.png").exists());
		assert!(!lib_root.join("gone.png").exists());
		assert!(library.records().unwrap().is_empty());
	}

	#[test]
	fn numeric_suffix_when_prefixed_name_taken() {
		let dir = TempDir::new().unwrap();
		let digest = ContentDigest::from_hex("e".repeat(64));
		fs::write(dir.path().join("p.png"), b"x").unwrap();
		fs::write(dir.path().join(format!("{}_p.png", digest)), b"x").unwrap();

		let dest = destination(dir.path(), "p.png", &digest).unwrap();
		assert_eq!(dest, dir.path().join(format!("{}_p_1.png", digest)));
	}
}

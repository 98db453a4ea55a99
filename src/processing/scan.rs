//! Directory scanning for candidate images

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{DetectionConfig, LIBRARY_META_DIR};
use crate::core::{Rejected, ScannedFile};
use crate::error::ScanError;
use crate::ui;

/// Walks a directory tree for decodable images with an accepted extension.
///
/// `iter` can be called any number of times; each call walks afresh in file-name order.
pub struct Scanner {
	root: PathBuf,
	config: DetectionConfig,
}

pub struct ScanResult {
	pub files: Vec<ScannedFile>,
	pub rejected: Vec<Rejected>,
}

impl Scanner {
	pub fn new(root: &Path, config: &DetectionConfig) -> Self {
		Self {
			root: root.to_path_buf(),
			config: config.clone(),
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Lazily yields accepted paths, or the reason a path was refused
	pub fn iter(&self) -> impl Iterator<Item = Result<PathBuf, ScanError>> + '_ {
		WalkDir::new(&self.root)
			.sort_by_file_name()
			.into_iter()
			.filter_entry(|e| e.file_name() != LIBRARY_META_DIR)
			.filter_map(move |entry| {
				let entry = match entry {
					Ok(entry) => entry,
					Err(e) => {
						let path = e.path().unwrap_or(self.root.as_path()).to_path_buf();
						return Some(Err(ScanError::Walk { path, source: e }));
					}
				};

				if !entry.file_type().is_file() || !self.config.accepts(entry.path()) {
					return None;
				}

				let path = entry.into_path();
				Some(super::image::validate(&path).map(|_| path))
			})
	}

	/// Drain the walk, numbering accepted files in scan order
	pub fn scan(&self) -> ScanResult {
		let mut files = Vec::new();
		let mut rejected = Vec::new();

		for item in self.iter() {
			match item {
				Ok(path) => {
					let relative_path = path.strip_prefix(&self.root).unwrap_or(&path).to_path_buf();
					files.push(ScannedFile {
						scan_index: files.len(),
						path,
						relative_path,
					});
				}
				Err(e) => {
					ui::warn(&format!("Skipped: {}", e));
					let path = match &e {
						ScanError::InvalidImage { path, .. } | ScanError::Walk { path, .. } => path.clone(),
					};
					rejected.push(Rejected {
						path,
						reason: format!("{}: {}", e.kind(), e),
					});
				}
			}
		}

		ui::debug(&format!(
			"Scanned {}: {} images, {} rejected",
			self.root.display(),
			files.len(),
			rejected.len()
		));

		ScanResult { files, rejected }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::{Rgb, RgbImage};
	use std::fs;
	use tempfile::TempDir;

	fn png(path: &Path) {
		RgbImage::from_pixel(4, 4, Rgb([9, 9, 9])).save_with_format(path, image::ImageFormat::Png).unwrap();
	}

	#[test]
	fn filters_by_extension_and_content() {
		let dir = TempDir::new().unwrap();
		let root = dir.path();
		fs::create_dir_all(root.join("nested/deeper")).unwrap();
		png(&root.join("b.png"));
		png(&root.join("nested/a.PNG"));
		png(&root.join("nested/deeper/c.jpg.png"));
		fs::write(root.join("readme.txt"), "text").unwrap();
		fs::write(root.join("fake.jpg"), "not an image").unwrap();

		let result = Scanner::new(root, &DetectionConfig::default()).scan();

		let relative: Vec<_> = result.files.iter().map(|f| f.relative_path.clone()).collect();
		assert_eq!(
			relative,
			vec![
				PathBuf::from("b.png"),
				PathBuf::from("nested/a.PNG"),
				PathBuf::from("nested/deeper/c.jpg.png"),
			]
		);
		assert_eq!(result.files.iter().map(|f| f.scan_index).collect::<Vec<_>>(), vec![0, 1, 2]);
		assert_eq!(result.rejected.len(), 1);
		assert!(result.rejected[0].path.ends_with("fake.jpg"));
		assert!(result.rejected[0].reason.starts_with("InvalidImage"));
	}

	#[test]
	fn iteration_is_restartable() {
		let dir = TempDir::new().unwrap();
		png(&dir.path().join("one.png"));
		png(&dir.path().join("two.png"));

		let scanner = Scanner::new(dir.path(), &DetectionConfig::default());
		let first: Vec<_> = scanner.iter().filter_map(Result::ok).collect();
		let second: Vec<_> = scanner.iter().filter_map(Result::ok).collect();
		assert_eq!(first.len(), 2);
		assert_eq!(first, second);
	}

	#[test]
	fn skips_library_metadata_dir() {
		let dir = TempDir::new().unwrap();
		fs::create_dir_all(dir.path().join(LIBRARY_META_DIR)).unwrap();
		png(&dir.path().join(LIBRARY_META_DIR).join("hidden.png"));
		png(&dir.path().join("visible.png"));

		let result = Scanner::new(dir.path(), &DetectionConfig::default()).scan();
		assert_eq!(result.files.len(), 1);
	}
}

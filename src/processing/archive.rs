//! Zip archive extraction into a scratch workspace

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::ArchiveError;
use crate::ui;

#[derive(Debug, Default)]
pub struct ExtractReport {
	pub extracted: Vec<PathBuf>,
	/// Entries that could not be extracted; the rest of the archive still was
	pub failed: Vec<ArchiveError>,
}

/// Clear `workspace` and unpack `archive` into it.
///
/// Only failing to open the archive is fatal; bad entries are collected in the report.
pub fn extract(archive: &Path, workspace: &Path) -> Result<ExtractReport, ArchiveError> {
	let file = File::open(archive).map_err(|e| ArchiveError::Open {
		path: archive.to_path_buf(),
		source: zip::result::ZipError::Io(e),
	})?;
	let mut zip = zip::ZipArchive::new(file).map_err(|source| ArchiveError::Open {
		path: archive.to_path_buf(),
		source,
	})?;

	if workspace.exists() {
		fs::remove_dir_all(workspace)?;
	}
	fs::create_dir_all(workspace)?;

	let mut report = ExtractReport::default();

	for i in 0..zip.len() {
		let mut entry = match zip.by_index(i) {
			Ok(entry) => entry,
			Err(e) => {
				report.failed.push(ArchiveError::Entry {
					name: format!("#{}", i),
					message: e.to_string(),
				});
				continue;
			}
		};

		let name = entry_name(entry.name_raw(), entry.name());

		let Some(relative) = sanitize(&name) else {
			ui::warn(&format!("Refusing unsafe archive entry: {}", name));
			report.failed.push(ArchiveError::Entry {
				name,
				message: "path escapes the workspace".into(),
			});
			continue;
		};
		let dest = workspace.join(&relative);

		let written = if entry.is_dir() {
			fs::create_dir_all(&dest)
		} else {
			write_entry(&mut entry, &dest)
		};

		match written {
			Ok(()) if entry.is_dir() => {}
			Ok(()) => {
				ui::debug(&format!("Extracted {}", relative.display()));
				report.extracted.push(dest);
			}
			Err(e) => {
				ui::warn(&format!("Failed to extract {}: {}", name, e));
				report.failed.push(ArchiveError::Entry {
					name,
					message: e.to_string(),
				});
			}
		}
	}

	Ok(report)
}

/// Entry names written without the UTF-8 flag are decoded as CP437 by the
/// zip format; many tools still store UTF-8 bytes there, so prefer the raw
/// bytes when they form valid UTF-8.
fn entry_name(raw: &[u8], decoded: &str) -> String {
	match std::str::from_utf8(raw) {
		Ok(name) => name.to_string(),
		Err(_) => decoded.to_string(),
	}
}

/// Relative path with only normal components, or None if it would leave the workspace
fn sanitize(name: &str) -> Option<PathBuf> {
	let normalized = name.replace('\\', "/");
	let mut out = PathBuf::new();

	for component in Path::new(&normalized).components() {
		match component {
			Component::Normal(part) => out.push(part),
			Component::CurDir => {}
			Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
		}
	}

	if out.as_os_str().is_empty() {
		None
	} else {
		Some(out)
	}
}

fn write_entry<R: io::Read>(entry: &mut R, dest: &Path) -> io::Result<()> {
	if let Some(parent) = dest.parent() {
		fs::create_dir_all(parent)?;
	}
	let mut out = File::create(dest)?;
	io::copy(entry, &mut out)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::TempDir;
	use zip::write::SimpleFileOptions;

	fn build_zip(path: &Path, entries: &[(&str, &[u8])]) {
		let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
		for (name, data) in entries {
			writer.start_file(*name, SimpleFileOptions::default()).unwrap();
			writer.write_all(data).unwrap();
		}
		writer.finish().unwrap();
	}

	#[test]
	fn extracts_nested_and_non_ascii_names() {
		let dir = TempDir::new().unwrap();
		let archive = dir.path().join("batch.zip");
		build_zip(&archive, &[("相册/猫.png", b"cat"), ("top.jpg", b"top")]);

		let workspace = dir.path().join("ws");
		let report = extract(&archive, &workspace).unwrap();

		assert!(report.failed.is_empty());
		assert_eq!(report.extracted.len(), 2);
		assert_eq!(fs::read(workspace.join("相册").join("猫.png")).unwrap(), b"cat");
	}

	#[test]
	fn workspace_is_cleared_first() {
		let dir = TempDir::new().unwrap();
		let archive = dir.path().join("batch.zip");
		build_zip(&archive, &[("a.png", b"a")]);

		let workspace = dir.path().join("ws");
		fs::create_dir_all(&workspace).unwrap();
		fs::write(workspace.join("stale.png"), b"old").unwrap();

		extract(&archive, &workspace).unwrap();
		assert!(!workspace.join("stale.png").exists());
		assert!(workspace.join("a.png").exists());
	}

	#[test]
	fn unreadable_archive_is_fatal() {
		let dir = TempDir::new().unwrap();
		let archive = dir.path().join("broken.zip");
		fs::write(&archive, b"not a zip").unwrap();

		let err = extract(&archive, &dir.path().join("ws")).unwrap_err();
		assert!(matches!(err, ArchiveError::Open { .. }));
	}

	#[test]
	fn raw_utf8_bytes_win_over_cp437() {
		let raw = "照片.png".as_bytes();
		assert_eq!(entry_name(raw, "garbled"), "照片.png");
		assert_eq!(entry_name(&[0x82, 0xA0], "éá"), "éá");
	}

	#[test]
	fn escaping_paths_are_refused() {
		assert_eq!(sanitize("a/./b.png"), Some(PathBuf::from("a/b.png")));
		assert_eq!(sanitize("dir\\file.png"), Some(PathBuf::from("dir/file.png")));
		assert_eq!(sanitize("../evil.png"), None);
		assert_eq!(sanitize("/etc/passwd"), None);
		assert_eq!(sanitize("./"), None);
	}
}

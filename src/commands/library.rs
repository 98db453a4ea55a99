//! Library command - list registered images

use anyhow::{Context, Result};
use colored::*;
use std::path::Path;

use crate::library::Library;
use crate::ui;

pub fn run(library_dir: &Path) -> Result<()> {
	let library = Library::open(library_dir)
		.with_context(|| format!("Failed to open library {}", library_dir.display()))?;
	let records = library.records()?;

	if records.is_empty() {
		ui::info("Library is empty");
		return Ok(());
	}

	ui::header(&format!("─── {} library images ───", records.len()));
	for record in records {
		println!(
			"  {} {} {} {}",
			format!("#{}", record.id).bright_blue().bold(),
			ui::path_link(Path::new(&record.storage_path), 60),
			format!("{}x{}", record.width, record.height).dimmed(),
			record.content_digest.short().dimmed()
		);
	}

	Ok(())
}

//! Commit command - admit Normal images into the library

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::DetectionResultSet;
use crate::library::Library;
use crate::pipeline;
use crate::ui;

pub fn run(results_path: &Path, library_dir: &Path) -> Result<()> {
	let results = DetectionResultSet::load(results_path).map_err(|e| anyhow::anyhow!("{}: {}", e.kind(), e))?;
	let mut library = Library::open(library_dir)
		.with_context(|| format!("Failed to open library {}", library_dir.display()))?;

	let pending = results.normal().count();
	if pending == 0 {
		ui::info("No Normal images to commit");
		return Ok(());
	}

	ui::info(&format!("Committing {} images to {}", pending, library_dir.display()));

	match pipeline::commit_normal(&results, &mut library) {
		Ok(report) => {
			for (path, reason) in &report.skipped {
				ui::warn(&format!("Skipped {}: {}", path.display(), reason));
			}
			ui::success(&format!("Admitted {} images", report.inserted));
			Ok(())
		}
		Err(e) => {
			ui::error(&format!("Commit failed, admitted {} images", e.inserted()));
			Err(anyhow::anyhow!("{}: {}", e.kind(), e))
		}
	}
}

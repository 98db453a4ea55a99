//! Accept command - curator override of a Similar verdict

use anyhow::Result;
use std::path::Path;

use crate::core::DetectionResultSet;
use crate::ui;

pub fn run(results_path: &Path, index: usize) -> Result<()> {
	let results = DetectionResultSet::load(results_path).map_err(|e| anyhow::anyhow!("{}: {}", e.kind(), e))?;
	let name = results.get(index).map(|c| c.relative_path.display().to_string());

	let updated = results
		.override_to_normal(index)
		.map_err(|e| anyhow::anyhow!("{}: {}", e.kind(), e))?;
	updated.save(results_path).map_err(|e| anyhow::anyhow!("{}: {}", e.kind(), e))?;

	ui::success(&format!("Marked {} as Normal", name.unwrap_or_default()));
	Ok(())
}

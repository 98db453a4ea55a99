//! Report command - print a saved detection result

use anyhow::Result;
use colored::*;
use std::path::Path;

use crate::core::{DetectionResultSet, SimilarityCheck, Status};
use crate::ui;

pub fn run(results_path: &Path) -> Result<()> {
	let results = DetectionResultSet::load(results_path).map_err(|e| anyhow::anyhow!("{}: {}", e.kind(), e))?;
	print(&results);
	Ok(())
}

/// Statistics, copyable problem paths, then one line per candidate
pub fn print(results: &DetectionResultSet) {
	let stats = results.stats();

	ui::header("─── Detection Statistics ───");
	println!("  Images:     {}", stats.total.to_string().bold());
	println!("  {} Similar:   {}", "●".bright_yellow(), stats.similar);
	println!("  {} Duplicate: {}", "●".bright_red(), stats.duplicate);
	println!("  {} Normal:    {}", "●".bright_green(), stats.normal);
	let unverified = results
		.normal()
		.filter(|c| matches!(c.similarity_check, SimilarityCheck::Skipped(_) | SimilarityCheck::Partial))
		.count();
	if unverified > 0 {
		println!("    {} unverified", unverified.to_string().bright_yellow());
	}
	if stats.rejected > 0 {
		println!("  {} Rejected:  {}", "●".bright_black(), stats.rejected);
	}

	let problems = results.problem_paths();
	ui::header("─── Duplicate / Similar Paths ───");
	if problems.is_empty() {
		ui::success("No duplicate or similar images");
	} else {
		for path in problems {
			println!("{}", path.display());
		}
	}

	if results.is_empty() {
		return;
	}

	ui::header("─── Results ───");
	for (i, c) in results.candidates().iter().enumerate() {
		let index = format!("[{}]", i).bright_blue().bold();
		let link = ui::path_link(&c.path, 60);

		let verdict = match c.status {
			Status::Duplicate => {
				let target = c.matched.as_ref().map(|m| m.display_name.as_str()).unwrap_or("?");
				format!("{} of {}", "Duplicate".bright_red(), target)
			}
			Status::Similar => {
				let target = c.matched.as_ref().map(|m| m.display_name.as_str()).unwrap_or("?");
				let score = c.score.map(|s| format!("{:.0}%", s * 100.0)).unwrap_or_default();
				format!("{} {} to {}", "Similar".bright_yellow(), score, target)
			}
			Status::Normal => match &c.similarity_check {
				SimilarityCheck::Skipped(reason) => {
					format!("{} {}", "Normal".bright_green(), format!("(unverified: {})", reason).dimmed())
				}
				SimilarityCheck::Partial => format!(
					"{} {}",
					"Normal".bright_green(),
					format!("(unverified: {} library images not compared)", c.skipped_comparisons).dimmed()
				),
				SimilarityCheck::Overridden => format!("{} {}", "Normal".bright_green(), "(accepted)".dimmed()),
				_ => "Normal".bright_green().to_string(),
			},
		};

		println!("  {} {} {}", index, link, verdict);
	}

	for rejected in results.rejected() {
		ui::debug(&format!("Rejected {}: {}", rejected.path.display(), rejected.reason));
	}
}

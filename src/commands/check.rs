//! Check command - classify a batch against the library

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::{self, DetectionConfig};
use crate::library::Library;
use crate::models::{InferenceContext, VisionExtractor};
use crate::pipeline::Detector;
use crate::processing::{self, ClassifyOptions};
use crate::runtime::Provider;
use crate::ui;

pub struct CheckArgs {
	pub directory: Option<PathBuf>,
	pub archive: Option<PathBuf>,
	pub library: PathBuf,
	pub threshold: f32,
	pub output: PathBuf,
	pub workspace: PathBuf,
	pub timeout: Option<u64>,
	pub model: Option<PathBuf>,
	pub no_cache: bool,
}

pub fn run(args: CheckArgs, provider: Provider) -> Result<()> {
	let start = Instant::now();

	let root = match (&args.archive, &args.directory) {
		(Some(archive), _) => unpack(archive, &args.workspace)?,
		(None, Some(dir)) => dir.clone(),
		(None, None) => anyhow::bail!("Provide --dir or --archive"),
	};
	let root = root.canonicalize().unwrap_or(root);

	let library = Library::open(&args.library)
		.with_context(|| format!("Failed to open library {}", args.library.display()))?;

	let mut detection = DetectionConfig::default().with_threshold(args.threshold);
	detection.cache_embeddings = !args.no_cache;

	let model_path = config::vision_model_path(args.model.as_deref()).context(format!(
		"Vision model not found. Pass --model or place {} in models/",
		config::VISION_MODEL
	))?;

	ui::info("Loading vision model...");
	let load_start = Instant::now();
	let context = InferenceContext::initialize(&model_path, provider)?;
	ui::success(&format!(
		"Model ready on {:?} in {:.2}s",
		context.provider(),
		load_start.elapsed().as_secs_f32()
	));

	let detector = Detector::new(VisionExtractor::new(context, &detection), detection);
	let options = ClassifyOptions {
		timeout: args.timeout.map(Duration::from_secs),
		cancel: None,
	};

	ui::info(&format!("Scanning: {}", root.display()));
	let results = detector
		.scan_and_classify(&root, &library, &options)
		.map_err(|e| anyhow::anyhow!("{}: {}", e.kind(), e))?;

	if results.is_empty() {
		ui::warn("No valid images found");
	}

	super::report::print(&results);
	results
		.save(&args.output)
		.map_err(|e| anyhow::anyhow!("{}: {}", e.kind(), e))?;

	println!();
	ui::success(&format!(
		"Checked {} images in {:.1}s, results saved to {}",
		results.len(),
		start.elapsed().as_secs_f32(),
		args.output.display()
	));

	Ok(())
}

fn unpack(archive: &Path, workspace: &Path) -> Result<PathBuf> {
	ui::info(&format!("Extracting {}", archive.display()));
	let report = processing::extract(archive, workspace).map_err(|e| anyhow::anyhow!("{}: {}", e.kind(), e))?;

	ui::success(&format!("Extracted {} files", report.extracted.len()));
	if !report.failed.is_empty() {
		ui::warn(&format!("{} archive entries could not be extracted", report.failed.len()));
		for failure in &report.failed {
			ui::debug(&failure.to_string());
		}
	}

	Ok(workspace.to_path_buf())
}

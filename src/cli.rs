use clap::builder::styling::{AnsiColor, Style, Styles};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{DEFAULT_RESULTS_FILE, DEFAULT_THRESHOLD, DEFAULT_WORKSPACE};

/// Execution provider for ONNX Runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Provider {
	/// Auto-detect best available (TensorRT → CUDA → CoreML → XNNPACK → CPU)
	#[default]
	Auto,
	/// CPU only
	Cpu,
	/// NVIDIA CUDA GPU
	Cuda,
	/// NVIDIA TensorRT (optimized inference)
	Tensorrt,
	/// Apple CoreML (macOS only)
	Coreml,
	/// XNNPACK CPU kernels
	Xnnpack,
}

fn parse_threshold(s: &str) -> Result<f32, String> {
	let val: f32 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
	if !(0.0..=1.0).contains(&val) {
		Err(format!("threshold must be between 0.0 and 1.0, got {}", val))
	} else {
		Ok(val)
	}
}

fn styles() -> Styles {
	let blue = Style::new().fg_color(Some(AnsiColor::Blue.into()));
	Styles::styled()
		.header(blue.bold())
		.usage(blue.bold())
		.literal(blue)
		.placeholder(Style::new().fg_color(Some(AnsiColor::Yellow.into())))
		.valid(blue)
		.invalid(Style::new().fg_color(Some(AnsiColor::Red.into())))
}

#[derive(Parser, Debug)]
#[command(
	name = "sift",
	author,
	version,
	about = "Duplicate and near-duplicate detection for image libraries",
	styles = styles(),
	after_help = format!(
		"{title}
  {sift} {check}   {check_args}   {check_desc}
  {sift} {check}   {archive_args}          {archive_desc}
  {sift} {accept}  {accept_args}        {accept_desc}
  {sift} {commit}  {commit_args}     {commit_desc}",
		title = "Examples:".bright_blue().bold(),
		sift = "sift".bright_blue(),
		check = "check".yellow(),
		check_args = "-d ./incoming/ -l ./library/",
		check_desc = "Classify a folder".dimmed(),
		archive_args = "-a batch.zip -l ./library/",
		archive_desc = "Classify an uploaded archive".dimmed(),
		accept = "accept".yellow(),
		accept_args = "sift-results.json 0",
		accept_desc = "Mark a Similar result as Normal".dimmed(),
		commit = "commit".yellow(),
		commit_args = "sift-results.json -l ./library/",
		commit_desc = "Admit Normal images".dimmed(),
	),
)]
pub struct Cli {
	/// Enable verbose debug output
	#[arg(short = 'v', long = "verbose", global = true)]
	pub verbose: bool,

	/// Execution provider: auto, cpu, cuda, tensorrt, coreml, xnnpack
	#[arg(short = 'p', long = "provider", global = true, default_value = "auto")]
	pub provider: Provider,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Classify candidate images as Duplicate, Similar or Normal
	Check {
		/// Directory of candidate images
		#[arg(short = 'd', long = "dir", conflicts_with = "archive", required_unless_present = "archive")]
		directory: Option<PathBuf>,

		/// Zip archive of candidate images
		#[arg(short = 'a', long = "archive")]
		archive: Option<PathBuf>,

		/// Library directory
		#[arg(short = 'l', long = "library")]
		library: PathBuf,

		/// Minimum similarity counted as near-duplicate (0.0-1.0)
		#[arg(short = 't', long = "threshold", default_value_t = DEFAULT_THRESHOLD, value_parser = parse_threshold)]
		threshold: f32,

		/// Where to write the results
		#[arg(short = 'o', long = "output", default_value = DEFAULT_RESULTS_FILE)]
		output: PathBuf,

		/// Scratch directory archives are unpacked into (cleared first)
		#[arg(long = "workspace", default_value = DEFAULT_WORKSPACE)]
		workspace: PathBuf,

		/// Abort if detection takes longer than this many seconds
		#[arg(long = "timeout")]
		timeout: Option<u64>,

		/// Vision model file (defaults to models/ next to the binary or SIFT_MODELS_DIR)
		#[arg(short = 'm', long = "model")]
		model: Option<PathBuf>,

		/// Do not read or write cached library embeddings
		#[arg(long = "no-cache")]
		no_cache: bool,
	},

	/// Mark a Similar result as Normal
	Accept {
		/// Results file from `check`
		results: PathBuf,

		/// Result index as shown by `check` or `report`
		index: usize,
	},

	/// Copy Normal images into the library and register them
	Commit {
		/// Results file from `check`
		results: PathBuf,

		/// Library directory
		#[arg(short = 'l', long = "library")]
		library: PathBuf,
	},

	/// Print a saved results file
	Report {
		/// Results file from `check`
		results: PathBuf,
	},

	/// List images registered in a library
	Library {
		/// Library directory
		#[arg(short = 'l', long = "library")]
		library: PathBuf,
	},
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn threshold_bounds() {
		assert_eq!(parse_threshold("0.85"), Ok(0.85));
		assert_eq!(parse_threshold("1"), Ok(1.0));
		assert!(parse_threshold("1.2").is_err());
		assert!(parse_threshold("abc").is_err());
	}

	#[test]
	fn check_requires_a_source() {
		assert!(Cli::try_parse_from(["sift", "check", "-l", "lib"]).is_err());
		assert!(Cli::try_parse_from(["sift", "check", "-d", "in", "-a", "x.zip", "-l", "lib"]).is_err());

		let cli = Cli::try_parse_from(["sift", "-p", "cpu", "check", "-a", "x.zip", "-l", "lib"]).unwrap();
		assert_eq!(cli.provider, Provider::Cpu);
		match cli.command {
			Command::Check { archive, threshold, .. } => {
				assert_eq!(archive, Some(PathBuf::from("x.zip")));
				assert_eq!(threshold, DEFAULT_THRESHOLD);
			}
			other => panic!("unexpected command {:?}", other),
		}
	}
}

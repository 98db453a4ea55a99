//! Sift - duplicate and near-duplicate detection for image libraries
//!
//! Classifies a batch of candidate images against a reference library,
//! lets the curator review near-duplicates, and commits accepted images.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use sift::cli::{Cli, Command};
use sift::commands::{self, check::CheckArgs};
use sift::ui::{self, Log};

fn main() {
	let cli = Cli::parse();
	Log::set_verbose(cli.verbose);

	if let Err(e) = run(cli) {
		ui::error(&format!("{:#}", e));
		std::process::exit(1);
	}
}

fn run(cli: Cli) -> Result<()> {
	match cli.command {
		Command::Check {
			directory,
			archive,
			library,
			threshold,
			output,
			workspace,
			timeout,
			model,
			no_cache,
		} => {
			print_header();
			let args = CheckArgs {
				directory,
				archive,
				library,
				threshold,
				output,
				workspace,
				timeout,
				model,
				no_cache,
			};
			commands::check::run(args, cli.provider)
		}
		Command::Accept { results, index } => commands::accept::run(&results, index),
		Command::Commit { results, library } => {
			print_header();
			commands::commit::run(&results, &library)
		}
		Command::Report { results } => commands::report::run(&results),
		Command::Library { library } => commands::library::run(&library),
	}
}

fn print_header() {
	println!();
	println!(
		"{}",
		format!("─── Sift v{} ───", env!("CARGO_PKG_VERSION"))
			.bright_blue()
			.bold()
	);
}

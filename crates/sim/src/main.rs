//! Paged inventory simulator.
//!
//! Builds a paged inventory from a TOML layout, runs the layout's event
//! script against the in-memory host and prints what happened.

mod config;
mod sim;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use crate::config::LayoutConfig;
use crate::sim::Simulation;

/// Simulator command line arguments.
#[derive(Parser, Debug)]
#[command(name = "pinv-sim")]
#[command(about = "Run a scripted paged inventory session")]
struct Args {
	/// Layout file; the built-in shop layout when omitted
	#[arg(short, long, value_name = "PATH")]
	layout: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,

	/// Print the resolved layout and exit
	#[arg(long)]
	print_layout: bool,
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let layout = match &args.layout {
		Some(path) => LayoutConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
		None => LayoutConfig::default_layout().context("loading built-in layout")?,
	};

	if args.print_layout {
		print!("{}", toml::to_string(&layout)?);
		return Ok(());
	}

	info!(title = %layout.title, pages = layout.pages.len(), steps = layout.script.len(), "starting simulation");

	let mut sim = Simulation::new(&layout)?;
	sim.run(&layout.script)?;
	info!(online = sim.host().online(), pages = sim.inventory().pages().len(), "simulation finished");

	for line in sim.transcript() {
		println!("{line}");
	}
	println!();
	for (name, page) in sim.sessions() {
		match page {
			Some(page) => println!("{name}: page {page}"),
			None => println!("{name}: closed"),
		}
	}

	Ok(())
}

/// Directives used when `RUST_LOG` is unset.
fn default_filter(verbose: bool) -> &'static str {
	if verbose {
		"pinv_sim=debug,pinv_inventory=debug,pinv_host=debug,pinv_worker=debug,info"
	} else {
		"pinv_sim=info,pinv_inventory=info,pinv_host=info,pinv_worker=info,warn"
	}
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(true))
		.init();
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn args_are_consistent() {
		Args::command().debug_assert();
	}

	#[test]
	fn parses_flags() {
		let args = Args::try_parse_from(["pinv-sim", "-v", "--layout", "shop.toml", "--print-layout"]).unwrap();
		assert!(args.verbose);
		assert!(args.print_layout);
		assert_eq!(args.layout, Some(PathBuf::from("shop.toml")));
	}

	#[test]
	fn default_filter_covers_workspace_crates() {
		for (verbose, level) in [(false, "info"), (true, "debug")] {
			let directives = default_filter(verbose);
			for target in ["pinv_sim", "pinv_inventory", "pinv_host", "pinv_worker"] {
				assert!(directives.contains(&format!("{target}={level}")), "{target} missing from {directives}");
			}
			assert!(tracing_subscriber::EnvFilter::try_new(directives).is_ok());
		}
	}
}

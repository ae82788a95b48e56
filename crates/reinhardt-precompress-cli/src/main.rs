//! Reinhardt Precompress CLI
//!
//! Writes `.gz` and `.br` siblings for the files of a finished build.
//!
//! ## Usage
//!
//! ```bash
//! reinhardt-precompress dist/
//! reinhardt-precompress dist/ --threshold 1024 --test '\.(js|css|html|svg)$'
//! reinhardt-precompress dist/ --bundle-manifest dist/bundles.json --no-gzip
//! ```
//!
//! Without `--bundle-manifest` the whole output directory is walked.
//! Configuration is read from the nearest `.compressrc`, `.compressrc.json`,
//! `.compressrc.toml`, `compress.config.toml` or `package.json` (`compress`
//! key) above the current directory; flags take precedence over it.

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use reinhardt_precompress::config::{PartialBrotliConfig, PartialGzipConfig};
use reinhardt_precompress::{
	BuildEvent, Bundle, ConfigSource, ExecutionMode, FileConfigSource, PartialConfig,
	PrecompressError, on_build_complete,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reinhardt-precompress")]
#[command(about = "Pre-compress build output with gzip and brotli", long_about = None)]
#[command(version)]
struct Cli {
	/// Build output directory
	#[arg(value_name = "OUT_DIR")]
	out_dir: PathBuf,

	/// Configuration file (skips the upward search)
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Only compress paths matching this regular expression
	#[arg(short, long, value_name = "REGEX")]
	test: Option<String>,

	/// Skip files smaller than this many bytes
	#[arg(long, value_name = "BYTES")]
	threshold: Option<u64>,

	/// Maximum number of files compressed at once
	#[arg(short = 'j', long, value_name = "N")]
	concurrency: Option<usize>,

	/// Walk the output directory even when the configuration says otherwise
	#[arg(long, conflicts_with = "bundle_manifest")]
	compress_output: bool,

	/// JSON bundle tree (`{ "name": ..., "childBundles": [...] }`) to compress
	#[arg(long, value_name = "PATH")]
	bundle_manifest: Option<PathBuf>,

	/// Do not write `.gz` files
	#[arg(long)]
	no_gzip: bool,

	/// Do not write `.br` files
	#[arg(long)]
	no_brotli: bool,

	/// Build mode; development builds are left untouched.
	/// Defaults to `PRECOMPRESS_ENV`, or production when that is unset or unrecognised
	#[arg(long, default_value_t = ExecutionMode::from_env())]
	mode: ExecutionMode,

	/// Verbosity level (can be repeated)
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbosity: u8,
}

impl Cli {
	/// Flags as the top configuration layer
	fn overrides(&self) -> PartialConfig {
		let compress_output = (self.bundle_manifest.is_none() || self.compress_output).then_some(true);

		PartialConfig {
			test: self.test.clone(),
			threshold: self.threshold,
			concurrency: self.concurrency,
			compress_output,
			gzip: self.no_gzip.then(|| PartialGzipConfig {
				enabled: Some(false),
				..Default::default()
			}),
			brotli: self.no_brotli.then(|| PartialBrotliConfig {
				enabled: Some(false),
				..Default::default()
			}),
		}
	}

	fn config_source(&self) -> anyhow::Result<FileConfigSource> {
		match &self.config {
			Some(path) => Ok(FileConfigSource::explicit(path)),
			None => {
				let cwd = std::env::current_dir().context("failed to read current directory")?;
				Ok(FileConfigSource::search_from(cwd))
			}
		}
	}

	fn log_filter(&self) -> &'static str {
		match self.verbosity {
			0 => "warn",
			1 => "info",
			2 => "debug",
			_ => "trace",
		}
	}
}

/// Loads a bundle tree; relative names are resolved against `out_dir`
fn load_bundle(manifest: &Path, out_dir: &Path) -> anyhow::Result<Bundle> {
	let content = std::fs::read_to_string(manifest)
		.with_context(|| format!("failed to read bundle manifest {}", manifest.display()))?;
	let mut bundle: Bundle = serde_json::from_str(&content)
		.with_context(|| format!("failed to parse bundle manifest {}", manifest.display()))?;
	bundle.resolve_names(out_dir);
	Ok(bundle)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
	let root = match &cli.bundle_manifest {
		Some(manifest) => load_bundle(manifest, &cli.out_dir)?,
		None => Bundle::unnamed(),
	};
	let event = BuildEvent::new(&cli.out_dir, root).with_mode(cli.mode);
	let source = cli.config_source()?;
	tracing::debug!("Configuration source: {}", source.description());

	let Some(summary) = on_build_complete(&event, &source, cli.overrides()).await? else {
		println!(
			"{} {} build, nothing to compress",
			"Skipped".yellow(),
			event.mode
		);
		return Ok(());
	};

	println!("{}", summary.report(Some(&event.out_dir)));
	if summary.failed > 0 {
		eprintln!(
			"{} {} of {} tasks failed",
			"Warning".yellow().bold(),
			summary.failed,
			summary.scheduled
		);
	}
	Ok(())
}

#[tokio::main]
async fn main() {
	let cli = Cli::parse();

	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
		)
		.with_writer(std::io::stderr)
		.init();

	if let Err(e) = run(cli).await {
		match e.downcast_ref::<PrecompressError>() {
			Some(PrecompressError::Config(config_error)) => {
				eprintln!("{} {}", "Configuration error:".red().bold(), config_error);
			}
			_ => eprintln!("{} {:#}", "Error:".red().bold(), e),
		}
		process::exit(1);
	}
}

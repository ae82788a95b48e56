//! Run coordinator
//!
//! A run starts from a [`BuildEvent`], resolves configuration, discovers
//! candidate files and schedules one gzip and one brotli task per file on a
//! single [`TaskQueue`]. The run finishes only after every task has settled;
//! task failures are logged and counted, never raised.

use crate::codec::{Codec, CodecSettings};
use crate::config::{CompressionConfig, ConfigSource, PartialConfig};
use crate::discovery::{Bundle, discover};
use crate::error::{PrecompressResult, TaskResult};
use crate::fs::{FileSystem, LocalFileSystem};
use crate::outcome::{CompressionOutcome, OutcomeCollector};
use crate::report::Report;
use crate::scheduler::TaskQueue;
use crate::task::{CompressionTask, TaskStatus};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Environment variable consulted by [`ExecutionMode::from_env`]
pub const MODE_ENV_VAR: &str = "PRECOMPRESS_ENV";

/// Whether the finished build is a production build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
	/// Compression runs
	#[default]
	Production,
	/// Compression is skipped
	Development,
}

impl ExecutionMode {
	/// Reads [`MODE_ENV_VAR`]; unset or unrecognised values mean production
	pub fn from_env() -> Self {
		Self::from_env_value(std::env::var(MODE_ENV_VAR).ok().as_deref())
	}

	/// Mode for a raw environment value
	pub fn from_env_value(value: Option<&str>) -> Self {
		value.and_then(|v| v.parse().ok()).unwrap_or_default()
	}

	/// Whether a run should compress anything
	pub fn is_production(&self) -> bool {
		matches!(self, ExecutionMode::Production)
	}
}

impl FromStr for ExecutionMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"production" | "prod" => Ok(ExecutionMode::Production),
			"development" | "dev" => Ok(ExecutionMode::Development),
			other => Err(format!(
				"unknown execution mode '{}', expected 'production' or 'development'",
				other
			)),
		}
	}
}

impl fmt::Display for ExecutionMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ExecutionMode::Production => f.write_str("production"),
			ExecutionMode::Development => f.write_str("development"),
		}
	}
}

/// Signal that the host build has finished
#[derive(Debug, Clone)]
pub struct BuildEvent {
	/// Production or development build
	pub mode: ExecutionMode,
	/// Root of the bundle graph
	pub root: Bundle,
	/// Build output directory
	pub out_dir: PathBuf,
}

impl BuildEvent {
	/// A production build event
	pub fn new(out_dir: impl Into<PathBuf>, root: Bundle) -> Self {
		Self {
			mode: ExecutionMode::Production,
			root,
			out_dir: out_dir.into(),
		}
	}

	/// Sets the execution mode
	pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
		self.mode = mode;
		self
	}
}

/// What one run did
#[derive(Debug, Clone)]
pub struct RunSummary {
	/// Files that matched discovery
	pub candidates: usize,
	/// Tasks handed to the queue (always twice `candidates`)
	pub scheduled: usize,
	/// Tasks that ended in an error or panic
	pub failed: usize,
	/// Kept outcomes, sorted by source path then codec
	pub outcomes: Vec<CompressionOutcome>,
	/// Wall-clock time of the whole run
	pub elapsed: Duration,
}

impl RunSummary {
	/// Report view of this run; paths are shown relative to `base_dir`
	pub fn report(&self, base_dir: Option<&Path>) -> Report {
		Report::new(&self.outcomes, self.elapsed, base_dir)
	}
}

/// Compression pipeline bound to a resolved configuration
pub struct Pipeline {
	config: CompressionConfig,
	fs: Arc<dyn FileSystem>,
}

impl Pipeline {
	/// Creates a pipeline
	pub fn new(config: CompressionConfig, fs: Arc<dyn FileSystem>) -> Self {
		Self { config, fs }
	}

	/// Creates a pipeline on the local file system
	pub fn local(config: CompressionConfig) -> Self {
		Self::new(config, Arc::new(LocalFileSystem::new()))
	}

	/// Resolved configuration
	pub fn config(&self) -> &CompressionConfig {
		&self.config
	}

	/// Compresses every candidate of `event`, regardless of its mode.
	///
	/// Candidates are collected before the first task starts, so artifacts
	/// written by this run are never picked up again.
	pub async fn run(&self, event: &BuildEvent) -> RunSummary {
		let started = Instant::now();
		let candidates: Vec<PathBuf> = discover(&self.config, &event.root, &event.out_dir).collect();

		tracing::info!(
			"Compressing {} files from {} (concurrency {})",
			candidates.len(),
			event.out_dir.display(),
			self.config.concurrency
		);

		let collector = OutcomeCollector::new();
		let mut queue: TaskQueue<TaskResult<TaskStatus>> = TaskQueue::new(self.config.concurrency);

		for path in &candidates {
			for codec in Codec::ALL {
				let task = CompressionTask::new(
					path.clone(),
					CodecSettings::from_config(codec, &self.config),
					self.config.threshold,
				);
				let fs = Arc::clone(&self.fs);
				let collector = collector.clone();
				queue
					.submit(async move { task.run(fs.as_ref(), &collector).await })
					.await;
			}
		}

		let drained = queue.await_idle().await;
		let mut failed = drained.panicked;
		for result in &drained.completed {
			if let Err(e) = result {
				tracing::warn!("{}", e);
				failed += 1;
			}
		}

		let summary = RunSummary {
			candidates: candidates.len(),
			scheduled: queue.submitted(),
			failed,
			outcomes: collector.drain_sorted(),
			elapsed: started.elapsed(),
		};

		tracing::info!(
			"Wrote {} artifacts for {} files in {:.2}s ({} failed)",
			summary.outcomes.len(),
			summary.candidates,
			summary.elapsed.as_secs_f64(),
			summary.failed
		);

		summary
	}
}

/// Build-completion hook.
///
/// Development builds return `Ok(None)` without touching anything.
/// Otherwise configuration is loaded from `source`, `overrides` is layered on
/// top, and the pipeline runs on the local file system.
///
/// # Errors
///
/// Returns [`crate::error::PrecompressError::Config`] if the configuration
/// cannot be loaded or resolved. No file is processed in that case.
pub async fn on_build_complete(
	event: &BuildEvent,
	source: &dyn ConfigSource,
	overrides: PartialConfig,
) -> PrecompressResult<Option<RunSummary>> {
	if !event.mode.is_production() {
		tracing::info!("Skipping compression for {} build", event.mode);
		return Ok(None);
	}

	tracing::debug!("Loading compression config from {}", source.description());
	let discovered = source.load()?;
	let config = CompressionConfig::resolve(discovered, overrides)?;

	Ok(Some(Pipeline::local(config).run(event).await))
}

//! A single (file, codec) compression task
//!
//! The task walks through its gates in order and stops at the first one
//! that does not pass:
//!
//! 1. codec disabled
//! 2. file missing or not a regular file
//! 3. file smaller than `threshold` (`size < threshold` skips)
//! 4. compressed output not strictly smaller than the input
//!
//! Only a task that passes every gate writes an artifact and records a
//! [`CompressionOutcome`].

use crate::codec::{Codec, CodecSettings, Encoder};
use crate::error::{TaskError, TaskResult};
use crate::fs::{CandidateFile, FileSystem};
use crate::outcome::{CompressionOutcome, OutcomeCollector};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Whether an artifact of `compressed` bytes replaces a source of
/// `original` bytes. Equal sizes are discarded.
pub fn keeps(original: u64, compressed: u64) -> bool {
	compressed < original
}

/// How a task finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
	/// The codec is disabled in configuration
	Disabled,
	/// The file vanished or is not a regular file
	Missing,
	/// The file is smaller than the configured threshold
	BelowThreshold {
		/// File size in bytes
		size: u64,
		/// Configured threshold
		threshold: u64,
	},
	/// Compression did not shrink the file; nothing was written
	NotSmaller(CompressionOutcome),
	/// The artifact was written and the outcome recorded
	Written(CompressionOutcome),
}

impl TaskStatus {
	/// The outcome, if the task got as far as compressing
	pub fn outcome(&self) -> Option<&CompressionOutcome> {
		match self {
			TaskStatus::NotSmaller(outcome) | TaskStatus::Written(outcome) => Some(outcome),
			_ => None,
		}
	}
}

/// One file compressed with one codec
#[derive(Debug, Clone)]
pub struct CompressionTask {
	path: PathBuf,
	settings: CodecSettings,
	threshold: Option<u64>,
}

impl CompressionTask {
	/// Creates a task for `path`
	pub fn new(path: impl Into<PathBuf>, settings: CodecSettings, threshold: Option<u64>) -> Self {
		Self {
			path: path.into(),
			settings,
			threshold,
		}
	}

	/// Source file
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Codec this task runs
	pub fn codec(&self) -> Codec {
		self.settings.codec()
	}

	/// Runs the task.
	///
	/// A kept outcome is appended to `collector` after the artifact has been
	/// written.
	///
	/// # Errors
	///
	/// Read, codec and write failures end the task with a [`TaskError`]. A
	/// missing file is not an error.
	pub async fn run(
		self,
		fs: &dyn FileSystem,
		collector: &OutcomeCollector,
	) -> TaskResult<TaskStatus> {
		let started = Instant::now();
		let codec = self.codec();

		if !self.settings.enabled() {
			return Ok(TaskStatus::Disabled);
		}

		let Some(candidate) = CandidateFile::inspect(fs, &self.path).await else {
			return Ok(TaskStatus::Missing);
		};

		if let Some(threshold) = self.threshold
			&& candidate.size() < threshold
		{
			tracing::debug!(
				"Skipping {} for {}: {} bytes is below threshold {}",
				codec,
				self.path.display(),
				candidate.size(),
				threshold
			);
			return Ok(TaskStatus::BelowThreshold {
				size: candidate.size(),
				threshold,
			});
		}

		let contents = fs.read(&self.path).await.map_err(|source| TaskError::Read {
			path: self.path.clone(),
			source,
		})?;
		let original_size = contents.len() as u64;

		let settings = self.settings;
		let compressed = tokio::task::spawn_blocking(move || settings.encode(&contents))
			.await
			.map_err(|e| TaskError::Join {
				path: self.path.clone(),
				message: e.to_string(),
			})?
			.map_err(|source| TaskError::Codec {
				path: self.path.clone(),
				source,
			})?;

		let output_path = codec.output_path(&self.path);
		let mut outcome = CompressionOutcome {
			source_path: self.path,
			codec,
			output_path,
			original_size,
			compressed_size: compressed.len() as u64,
			elapsed: started.elapsed(),
			kept: false,
		};

		if !keeps(outcome.original_size, outcome.compressed_size) {
			tracing::debug!(
				"Discarding {} for {}: {} bytes is not smaller than {}",
				codec,
				outcome.source_path.display(),
				outcome.compressed_size,
				outcome.original_size
			);
			return Ok(TaskStatus::NotSmaller(outcome));
		}

		fs.write(&outcome.output_path, &compressed)
			.await
			.map_err(|source| TaskError::Write {
				path: outcome.output_path.clone(),
				source,
			})?;

		outcome.kept = true;
		outcome.elapsed = started.elapsed();
		collector.record(outcome.clone());
		Ok(TaskStatus::Written(outcome))
	}
}

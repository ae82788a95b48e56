//! Per-task results and the run-scoped accumulator

use crate::codec::Codec;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Result of one (file, codec) attempt that reached the size gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionOutcome {
	/// File that was compressed
	pub source_path: PathBuf,
	/// Codec used
	pub codec: Codec,
	/// Artifact location (`source_path` plus the codec suffix)
	pub output_path: PathBuf,
	/// Size of the source in bytes
	pub original_size: u64,
	/// Size of the compressed data in bytes
	pub compressed_size: u64,
	/// Wall-clock time from task start to completion
	pub elapsed: Duration,
	/// Whether the artifact was written
	pub kept: bool,
}

impl CompressionOutcome {
	/// Deterministic report ordering: source path, then codec
	pub fn sort_key(&self) -> (&PathBuf, Codec) {
		(&self.source_path, self.codec)
	}
}

/// Accumulates kept outcomes for a single run
///
/// Cloning shares the same storage, so every task of a run can hold a
/// handle. Each run creates its own collector.
#[derive(Debug, Clone, Default)]
pub struct OutcomeCollector {
	outcomes: Arc<Mutex<Vec<CompressionOutcome>>>,
}

impl OutcomeCollector {
	/// Creates an empty collector
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends one outcome
	pub fn record(&self, outcome: CompressionOutcome) {
		self.outcomes.lock().push(outcome);
	}

	/// Number of recorded outcomes
	pub fn len(&self) -> usize {
		self.outcomes.lock().len()
	}

	/// Whether nothing was recorded
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Takes every recorded outcome, sorted by [`CompressionOutcome::sort_key`]
	pub fn drain_sorted(&self) -> Vec<CompressionOutcome> {
		let mut outcomes = std::mem::take(&mut *self.outcomes.lock());
		sort_outcomes(&mut outcomes);
		outcomes
	}
}

/// Sorts outcomes by source path, then gzip before brotli
pub fn sort_outcomes(outcomes: &mut [CompressionOutcome]) {
	outcomes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn outcome(path: &str, codec: Codec) -> CompressionOutcome {
		CompressionOutcome {
			source_path: PathBuf::from(path),
			codec,
			output_path: codec.output_path(std::path::Path::new(path)),
			original_size: 100,
			compressed_size: 40,
			elapsed: Duration::from_millis(3),
			kept: true,
		}
	}

	#[rstest]
	fn test_drain_sorted_orders_by_path_then_codec() {
		// Arrange
		let collector = OutcomeCollector::new();
		collector.record(outcome("/b.js", Codec::Brotli));
		collector.record(outcome("/a.js", Codec::Brotli));
		collector.record(outcome("/b.js", Codec::Gzip));
		collector.record(outcome("/a.js", Codec::Gzip));

		// Act
		let sorted = collector.drain_sorted();

		// Assert
		let keys: Vec<(String, Codec)> = sorted
			.iter()
			.map(|o| (o.source_path.display().to_string(), o.codec))
			.collect();
		assert_eq!(
			keys,
			vec![
				("/a.js".to_string(), Codec::Gzip),
				("/a.js".to_string(), Codec::Brotli),
				("/b.js".to_string(), Codec::Gzip),
				("/b.js".to_string(), Codec::Brotli),
			]
		);
		assert!(collector.is_empty());
	}

	#[rstest]
	fn test_clones_share_storage() {
		let collector = OutcomeCollector::new();
		let handle = collector.clone();

		handle.record(outcome("/a.js", Codec::Gzip));

		assert_eq!(collector.len(), 1);
	}

	#[rstest]
	fn test_separate_collectors_are_isolated() {
		let first = OutcomeCollector::new();
		let second = OutcomeCollector::new();

		first.record(outcome("/a.js", Codec::Gzip));

		assert_eq!(first.len(), 1);
		assert!(second.is_empty());
	}
}

//! Run report rendering.
//!
//! Projects the outcomes of a run into display rows and renders them as a
//! terminal table followed by a one-line total. Rendering does no I/O; the
//! caller decides where the text goes.

use crate::codec::Codec;
use crate::outcome::{CompressionOutcome, sort_outcomes};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{CellAlignment, Table};
use std::fmt;
use std::path::Path;
use std::time::Duration;

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;

/// One table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
	/// Source path, relative to the output directory when possible
	pub path: String,
	/// Codec of the artifact
	pub codec: Codec,
	/// Source size in bytes
	pub original_size: u64,
	/// Artifact size in bytes
	pub compressed_size: u64,
	/// Task wall-clock time
	pub elapsed: Duration,
}

/// Deterministically ordered report of one run
#[derive(Debug, Clone)]
pub struct Report {
	rows: Vec<ReportRow>,
	total: Duration,
}

impl Report {
	/// Builds a report from kept outcomes.
	///
	/// Rows are sorted by source path, then gzip before brotli, whatever
	/// order the outcomes arrive in. Outcomes that were not kept are left out.
	pub fn new(outcomes: &[CompressionOutcome], total: Duration, base_dir: Option<&Path>) -> Self {
		let mut kept: Vec<CompressionOutcome> =
			outcomes.iter().filter(|o| o.kept).cloned().collect();
		sort_outcomes(&mut kept);

		let rows = kept
			.into_iter()
			.map(|outcome| ReportRow {
				path: display_path(&outcome.source_path, base_dir),
				codec: outcome.codec,
				original_size: outcome.original_size,
				compressed_size: outcome.compressed_size,
				elapsed: outcome.elapsed,
			})
			.collect();

		Self { rows, total }
	}

	/// Rows in report order
	pub fn rows(&self) -> &[ReportRow] {
		&self.rows
	}

	/// Total elapsed time of the run
	pub fn total(&self) -> Duration {
		self.total
	}

	/// Number of distinct source files with at least one artifact
	pub fn file_count(&self) -> usize {
		let mut paths: Vec<&str> = self.rows.iter().map(|row| row.path.as_str()).collect();
		paths.dedup();
		paths.len()
	}

	/// The uncoloured totals line
	pub fn summary_line(&self) -> String {
		format!(
			"Compressed {} files ({} artifacts) in {:.2}s",
			self.file_count(),
			self.rows.len(),
			self.total.as_secs_f64()
		)
	}

	/// The table alone
	pub fn table(&self) -> Table {
		let mut table = Table::new();
		table
			.load_preset(UTF8_FULL)
			.set_header(vec!["File", "Codec", "Original", "Compressed", "Saved", "Time"]);

		for row in &self.rows {
			table.add_row(vec![
				row.path.clone(),
				row.codec.to_string(),
				format_size(row.original_size),
				format_size(row.compressed_size),
				format_savings(row.original_size, row.compressed_size),
				format_duration(row.elapsed),
			]);
		}

		for index in 2..6 {
			if let Some(column) = table.column_mut(index) {
				column.set_cell_alignment(CellAlignment::Right);
			}
		}

		table
	}

	/// Table plus coloured totals line
	pub fn render(&self) -> String {
		if self.rows.is_empty() {
			return format!("{}", self.summary_line().yellow());
		}
		format!("{}\n{}", self.table(), self.summary_line().green().bold())
	}
}

impl fmt::Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.render())
	}
}

fn display_path(path: &Path, base_dir: Option<&Path>) -> String {
	let Some(base) = base_dir else {
		return path.display().to_string();
	};
	let absolute = |p: &Path| std::path::absolute(p).unwrap_or_else(|_| p.to_path_buf());
	match absolute(path).strip_prefix(absolute(base)) {
		Ok(relative) => relative.display().to_string(),
		Err(_) => path.display().to_string(),
	}
}

/// Formats a byte count as `B`, `KB` or `MB`
pub fn format_size(bytes: u64) -> String {
	let value = bytes as f64;
	if value < KIB {
		format!("{} B", bytes)
	} else if value < MIB {
		format!("{:.2} KB", value / KIB)
	} else {
		format!("{:.2} MB", value / MIB)
	}
}

/// Formats a duration as milliseconds below one second, seconds above
pub fn format_duration(duration: Duration) -> String {
	if duration < Duration::from_secs(1) {
		format!("{}ms", duration.as_millis())
	} else {
		format!("{:.2}s", duration.as_secs_f64())
	}
}

fn format_savings(original: u64, compressed: u64) -> String {
	if original == 0 {
		return "0.0%".to_string();
	}
	let saved = 1.0 - compressed as f64 / original as f64;
	format!("{:.1}%", saved * 100.0)
}

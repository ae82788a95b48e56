//! Error types for the pre-compression pipeline.
//!
//! Configuration errors are fatal to a run. Task errors are contained at the
//! task boundary: they are logged and counted, but never stop sibling tasks.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating, parsing or resolving configuration.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
	/// A configuration file could not be read.
	#[error("failed to read config file {path}: {source}")]
	Io {
		/// File that failed.
		path: PathBuf,
		/// Underlying I/O error.
		#[source]
		source: std::io::Error,
	},

	/// A JSON configuration file (or `package.json`) failed to parse.
	#[error("invalid JSON in {path}: {source}")]
	Json {
		/// File that failed.
		path: PathBuf,
		/// Underlying parse error.
		#[source]
		source: serde_json::Error,
	},

	/// A TOML configuration file failed to parse.
	#[error("invalid TOML in {path}: {source}")]
	Toml {
		/// File that failed.
		path: PathBuf,
		/// Underlying parse error.
		#[source]
		source: toml::de::Error,
	},

	/// The `test` pattern is not a valid regular expression.
	#[error("invalid test pattern {pattern:?}: {source}")]
	InvalidPattern {
		/// Pattern as written in the configuration.
		pattern: String,
		/// Underlying regex error.
		#[source]
		source: regex::Error,
	},

	/// An explicitly requested configuration file does not exist.
	#[error("config file not found: {0}")]
	NotFound(PathBuf),
}

/// Errors raised by a codec while encoding.
#[derive(Debug, Error)]
pub enum CodecError {
	/// The standard DEFLATE gzip encoder failed.
	#[error("gzip encoding failed: {0}")]
	Gzip(#[source] std::io::Error),

	/// The Zopfli encoder failed.
	#[error("zopfli encoding failed: {0}")]
	Zopfli(#[source] std::io::Error),

	/// The Brotli encoder failed.
	#[error("brotli encoding failed: {0}")]
	Brotli(#[source] std::io::Error),
}

/// Errors that terminate a single compression task.
#[derive(Debug, Error)]
pub enum TaskError {
	/// The source file could not be read after a successful stat.
	#[error("failed to read {path}: {source}")]
	Read {
		/// Source file.
		path: PathBuf,
		/// Underlying I/O error.
		#[source]
		source: std::io::Error,
	},

	/// The codec rejected the input.
	#[error("failed to compress {path}: {source}")]
	Codec {
		/// Source file.
		path: PathBuf,
		/// Underlying codec error.
		#[source]
		source: CodecError,
	},

	/// The compressed artifact could not be written.
	#[error("failed to write {path}: {source}")]
	Write {
		/// Artifact path.
		path: PathBuf,
		/// Underlying I/O error.
		#[source]
		source: std::io::Error,
	},

	/// The blocking encoder thread panicked or was cancelled.
	#[error("encoder for {path} did not complete: {message}")]
	Join {
		/// Source file.
		path: PathBuf,
		/// Join error rendered as text.
		message: String,
	},
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum PrecompressError {
	/// Configuration could not be resolved; the run was aborted.
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	/// A single task failed.
	#[error("task error: {0}")]
	Task(#[from] TaskError),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Result type alias for task execution.
pub type TaskResult<T> = Result<T, TaskError>;

/// Result type alias for pipeline operations.
pub type PrecompressResult<T> = Result<T, PrecompressError>;

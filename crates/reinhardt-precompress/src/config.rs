//! Configuration for the pre-compression pipeline
//!
//! Configuration is resolved once per run from three layers, lowest
//! precedence first:
//!
//! 1. built-in defaults
//! 2. a discovered configuration file (see [`sources`])
//! 3. call-site overrides (command-line flags, host tool settings)
//!
//! Each layer is a [`PartialConfig`]; unset fields fall through to the layer
//! below. [`CompressionConfig::resolve`] merges the layers and compiles the
//! `test` pattern.
//!
//! ## Example
//!
//! ```rust
//! use reinhardt_precompress::config::{CompressionConfig, PartialConfig};
//!
//! let discovered: PartialConfig = serde_json::from_str(
//!     r#"{ "threshold": 1024, "brotli": { "quality": 9 } }"#,
//! ).unwrap();
//! let overrides = PartialConfig {
//!     concurrency: Some(4),
//!     ..Default::default()
//! };
//!
//! let config = CompressionConfig::resolve(Some(discovered), overrides).unwrap();
//! assert_eq!(config.threshold, Some(1024));
//! assert_eq!(config.concurrency, 4);
//! assert_eq!(config.brotli.quality, 9);
//! assert_eq!(config.gzip.iterations, 15);
//! ```

pub mod sources;

use crate::error::{ConfigError, ConfigResult};
use regex::Regex;
use serde::Deserialize;

pub use sources::{ConfigSource, FileConfigSource, StaticConfigSource};

/// Default `test` pattern: every path matches
pub const DEFAULT_TEST_PATTERN: &str = ".";
/// Default number of simultaneously running tasks
pub const DEFAULT_CONCURRENCY: usize = 2;

const DEFAULT_GZIP_ITERATIONS: u64 = 15;
const DEFAULT_GZIP_BLOCK_SPLITTING_MAX: u16 = 15;
const DEFAULT_ZLIB_LEVEL: u32 = 9;
const DEFAULT_ZLIB_MEM_LEVEL: u32 = 9;
const DEFAULT_BROTLI_QUALITY: u32 = 11;
const DEFAULT_BROTLI_WINDOW: u32 = 24;

/// Brotli encoder mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrotliMode {
	/// No assumptions about the input
	#[default]
	Generic,
	/// UTF-8 text
	Text,
	/// WOFF 2.0 font data
	Font,
}

impl BrotliMode {
	/// Maps the numeric mode used in configuration files.
	///
	/// `1` is text, `2` is font; every other value is generic.
	///
	/// # Examples
	///
	/// ```rust
	/// use reinhardt_precompress::config::BrotliMode;
	///
	/// assert_eq!(BrotliMode::from_code(1), BrotliMode::Text);
	/// assert_eq!(BrotliMode::from_code(2), BrotliMode::Font);
	/// assert_eq!(BrotliMode::from_code(7), BrotliMode::Generic);
	/// ```
	pub fn from_code(code: i64) -> Self {
		match code {
			1 => BrotliMode::Text,
			2 => BrotliMode::Font,
			_ => BrotliMode::Generic,
		}
	}
}

/// Resolved gzip settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GzipConfig {
	/// Whether gzip artifacts are produced at all
	pub enabled: bool,
	/// Zopfli iteration count
	pub iterations: u64,
	/// Whether Zopfli may split the input into several deflate blocks
	pub block_splitting: bool,
	/// Split after compressing instead of before
	pub block_splitting_last: bool,
	/// Maximum number of block splits (0 means unlimited)
	pub block_splitting_max: u16,
	/// Use the standard DEFLATE encoder instead of Zopfli
	pub zlib: bool,
	/// Compression level for the standard encoder (0-9)
	pub zlib_level: u32,
	/// Memory level for the standard encoder (1-9)
	pub zlib_mem_level: u32,
}

impl Default for GzipConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			iterations: DEFAULT_GZIP_ITERATIONS,
			block_splitting: true,
			block_splitting_last: false,
			block_splitting_max: DEFAULT_GZIP_BLOCK_SPLITTING_MAX,
			zlib: false,
			zlib_level: DEFAULT_ZLIB_LEVEL,
			zlib_mem_level: DEFAULT_ZLIB_MEM_LEVEL,
		}
	}
}

/// Resolved brotli settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrotliConfig {
	/// Whether brotli artifacts are produced at all
	pub enabled: bool,
	/// Encoder mode
	pub mode: BrotliMode,
	/// Quality, 0-11
	pub quality: u32,
	/// Base-2 logarithm of the sliding window size
	pub window: u32,
	/// Whether literal context modeling is used
	pub enable_context_modeling: bool,
	/// Base-2 logarithm of the input block size, if set explicitly
	pub block_size: Option<u32>,
	/// Number of distance postfix bits, if set explicitly
	pub postfix_bits: Option<u32>,
	/// Number of direct distance codes, if set explicitly
	pub direct_distance_codes: Option<u32>,
}

impl Default for BrotliConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			mode: BrotliMode::Generic,
			quality: DEFAULT_BROTLI_QUALITY,
			window: DEFAULT_BROTLI_WINDOW,
			enable_context_modeling: true,
			block_size: None,
			postfix_bits: None,
			direct_distance_codes: None,
		}
	}
}

/// Fully resolved configuration for one run
#[derive(Debug, Clone)]
pub struct CompressionConfig {
	/// Paths must match this pattern to be compressed
	pub test_pattern: Regex,
	/// Walk the output directory instead of the bundle tree
	pub compress_output: bool,
	/// Files smaller than this many bytes are skipped
	pub threshold: Option<u64>,
	/// Maximum number of tasks running at once
	pub concurrency: usize,
	/// Gzip settings
	pub gzip: GzipConfig,
	/// Brotli settings
	pub brotli: BrotliConfig,
}

impl CompressionConfig {
	/// Merges `defaults < discovered < overrides` into a resolved configuration.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::InvalidPattern`] if the merged `test` value is
	/// not a valid regular expression.
	pub fn resolve(
		discovered: Option<PartialConfig>,
		overrides: PartialConfig,
	) -> ConfigResult<Self> {
		let merged = PartialConfig::default()
			.layer(discovered.unwrap_or_default())
			.layer(overrides);
		Self::from_partial(merged)
	}

	/// Resolves a single layer over the built-in defaults.
	pub fn from_partial(partial: PartialConfig) -> ConfigResult<Self> {
		let pattern = partial
			.test
			.unwrap_or_else(|| DEFAULT_TEST_PATTERN.to_string());
		let test_pattern = Regex::new(&pattern)
			.map_err(|source| ConfigError::InvalidPattern { pattern, source })?;

		let concurrency = match partial.concurrency {
			Some(0) => {
				tracing::warn!("concurrency must be at least 1, using 1");
				1
			}
			Some(n) => n,
			None => DEFAULT_CONCURRENCY,
		};

		Ok(Self {
			test_pattern,
			compress_output: partial.compress_output.unwrap_or(false),
			threshold: partial.threshold,
			concurrency,
			gzip: partial.gzip.unwrap_or_default().resolve(),
			brotli: partial.brotli.unwrap_or_default().resolve(),
		})
	}

	/// Sets the concurrency limit (clamped to at least 1)
	pub fn with_concurrency(mut self, concurrency: usize) -> Self {
		self.concurrency = concurrency.max(1);
		self
	}

	/// Selects directory-walk (`true`) or bundle-tree (`false`) discovery
	pub fn with_compress_output(mut self, compress_output: bool) -> Self {
		self.compress_output = compress_output;
		self
	}
}

/// One configuration layer, as written in a config file
///
/// Field names follow the established `compress` configuration keys.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PartialConfig {
	/// Regular expression over file paths
	pub test: Option<String>,
	/// Minimum file size in bytes
	pub threshold: Option<u64>,
	/// Maximum number of simultaneously running tasks
	pub concurrency: Option<usize>,
	/// Walk the output directory instead of the bundle tree
	#[serde(rename = "compressOutput")]
	pub compress_output: Option<bool>,
	/// Gzip layer
	pub gzip: Option<PartialGzipConfig>,
	/// Brotli layer
	pub brotli: Option<PartialBrotliConfig>,
}

impl PartialConfig {
	/// Returns `self` overlaid with every field set in `upper`.
	pub fn layer(self, upper: PartialConfig) -> Self {
		Self {
			test: upper.test.or(self.test),
			threshold: upper.threshold.or(self.threshold),
			concurrency: upper.concurrency.or(self.concurrency),
			compress_output: upper.compress_output.or(self.compress_output),
			gzip: merge_nested(self.gzip, upper.gzip, PartialGzipConfig::layer),
			brotli: merge_nested(self.brotli, upper.brotli, PartialBrotliConfig::layer),
		}
	}
}

fn merge_nested<T>(lower: Option<T>, upper: Option<T>, layer: fn(T, T) -> T) -> Option<T> {
	match (lower, upper) {
		(Some(lower), Some(upper)) => Some(layer(lower, upper)),
		(lower, upper) => upper.or(lower),
	}
}

/// Gzip configuration layer
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PartialGzipConfig {
	/// Whether gzip is enabled
	pub enabled: Option<bool>,
	/// Zopfli iteration count
	pub numiterations: Option<u64>,
	/// Zopfli block splitting
	pub blocksplitting: Option<bool>,
	/// Zopfli split-last mode
	pub blocksplittinglast: Option<bool>,
	/// Zopfli maximum block splits
	pub blocksplittingmax: Option<u16>,
	/// Use the standard DEFLATE encoder
	pub zlib: Option<bool>,
	/// Standard encoder level
	#[serde(rename = "zlibLevel")]
	pub zlib_level: Option<u32>,
	/// Standard encoder memory level
	#[serde(rename = "zlibMemLevel")]
	pub zlib_mem_level: Option<u32>,
}

impl PartialGzipConfig {
	fn layer(self, upper: Self) -> Self {
		Self {
			enabled: upper.enabled.or(self.enabled),
			numiterations: upper.numiterations.or(self.numiterations),
			blocksplitting: upper.blocksplitting.or(self.blocksplitting),
			blocksplittinglast: upper.blocksplittinglast.or(self.blocksplittinglast),
			blocksplittingmax: upper.blocksplittingmax.or(self.blocksplittingmax),
			zlib: upper.zlib.or(self.zlib),
			zlib_level: upper.zlib_level.or(self.zlib_level),
			zlib_mem_level: upper.zlib_mem_level.or(self.zlib_mem_level),
		}
	}

	fn resolve(self) -> GzipConfig {
		let defaults = GzipConfig::default();
		GzipConfig {
			enabled: self.enabled.unwrap_or(defaults.enabled),
			iterations: self.numiterations.unwrap_or(defaults.iterations),
			block_splitting: self.blocksplitting.unwrap_or(defaults.block_splitting),
			block_splitting_last: self
				.blocksplittinglast
				.unwrap_or(defaults.block_splitting_last),
			block_splitting_max: self
				.blocksplittingmax
				.unwrap_or(defaults.block_splitting_max),
			zlib: self.zlib.unwrap_or(defaults.zlib),
			zlib_level: self.zlib_level.unwrap_or(defaults.zlib_level),
			zlib_mem_level: self.zlib_mem_level.unwrap_or(defaults.zlib_mem_level),
		}
	}
}

/// Brotli configuration layer
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PartialBrotliConfig {
	/// Whether brotli is enabled
	pub enabled: Option<bool>,
	/// Numeric mode: 0 generic, 1 text, 2 font
	pub mode: Option<i64>,
	/// Quality, 0-11
	pub quality: Option<u32>,
	/// Window size exponent
	pub lgwin: Option<u32>,
	/// Block size exponent
	pub lgblock: Option<u32>,
	/// Literal context modeling
	pub enable_context_modeling: Option<bool>,
	/// Distance postfix bits
	pub npostfix: Option<u32>,
	/// Direct distance codes
	pub ndirect: Option<u32>,
}

impl PartialBrotliConfig {
	fn layer(self, upper: Self) -> Self {
		Self {
			enabled: upper.enabled.or(self.enabled),
			mode: upper.mode.or(self.mode),
			quality: upper.quality.or(self.quality),
			lgwin: upper.lgwin.or(self.lgwin),
			lgblock: upper.lgblock.or(self.lgblock),
			enable_context_modeling: upper
				.enable_context_modeling
				.or(self.enable_context_modeling),
			npostfix: upper.npostfix.or(self.npostfix),
			ndirect: upper.ndirect.or(self.ndirect),
		}
	}

	fn resolve(self) -> BrotliConfig {
		let defaults = BrotliConfig::default();
		BrotliConfig {
			enabled: self.enabled.unwrap_or(defaults.enabled),
			mode: self.mode.map(BrotliMode::from_code).unwrap_or(defaults.mode),
			quality: self.quality.unwrap_or(defaults.quality),
			window: self.lgwin.unwrap_or(defaults.window),
			enable_context_modeling: self
				.enable_context_modeling
				.unwrap_or(defaults.enable_context_modeling),
			block_size: self.lgblock,
			postfix_bits: self.npostfix,
			direct_distance_codes: self.ndirect,
		}
	}
}

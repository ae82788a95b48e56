//! Codec adapters
//!
//! Both codecs are exposed as pure `bytes -> bytes` functions behind the
//! [`Encoder`] trait. [`CodecSettings`] pairs a codec kind with its resolved
//! parameters so a task can carry exactly one of them.
//!
//! - **gzip**: Zopfli by default, or the standard DEFLATE encoder when
//!   `gzip.zlib` is set
//! - **brotli**: the pure-Rust brotli encoder with parameters translated
//!   from [`BrotliConfig`]

mod br;
mod gzip;

use crate::config::{BrotliConfig, CompressionConfig, GzipConfig};
use crate::error::CodecResult;
use std::fmt;
use std::path::{Path, PathBuf};

/// Compression algorithm of an artifact
///
/// Ordering puts gzip before brotli; reports rely on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Codec {
	/// gzip (`.gz`)
	Gzip,
	/// Brotli (`.br`)
	Brotli,
}

impl Codec {
	/// Both codecs, in scheduling order
	pub const ALL: [Codec; 2] = [Codec::Gzip, Codec::Brotli];

	/// File suffix appended to the source path
	pub fn suffix(&self) -> &'static str {
		match self {
			Codec::Gzip => ".gz",
			Codec::Brotli => ".br",
		}
	}

	/// Short display name
	pub fn name(&self) -> &'static str {
		match self {
			Codec::Gzip => "gzip",
			Codec::Brotli => "brotli",
		}
	}

	/// Path of the artifact produced for `source`
	///
	/// # Examples
	///
	/// ```rust
	/// use reinhardt_precompress::codec::Codec;
	/// use std::path::{Path, PathBuf};
	///
	/// assert_eq!(
	///     Codec::Brotli.output_path(Path::new("dist/app.js")),
	///     PathBuf::from("dist/app.js.br"),
	/// );
	/// ```
	pub fn output_path(&self, source: &Path) -> PathBuf {
		let mut path = source.as_os_str().to_os_string();
		path.push(self.suffix());
		PathBuf::from(path)
	}
}

impl fmt::Display for Codec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// A bytes-in/bytes-out encoder
pub trait Encoder {
	/// Compress `input` in one shot
	fn encode(&self, input: &[u8]) -> CodecResult<Vec<u8>>;
}

/// One codec together with its resolved parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecSettings {
	/// gzip family
	Gzip(GzipConfig),
	/// Brotli
	Brotli(BrotliConfig),
}

impl CodecSettings {
	/// Settings for `codec` taken from a resolved configuration
	pub fn from_config(codec: Codec, config: &CompressionConfig) -> Self {
		match codec {
			Codec::Gzip => CodecSettings::Gzip(config.gzip.clone()),
			Codec::Brotli => CodecSettings::Brotli(config.brotli.clone()),
		}
	}

	/// Which codec these settings drive
	pub fn codec(&self) -> Codec {
		match self {
			CodecSettings::Gzip(_) => Codec::Gzip,
			CodecSettings::Brotli(_) => Codec::Brotli,
		}
	}

	/// Whether the codec is enabled
	pub fn enabled(&self) -> bool {
		match self {
			CodecSettings::Gzip(config) => config.enabled,
			CodecSettings::Brotli(config) => config.enabled,
		}
	}
}

impl Encoder for CodecSettings {
	fn encode(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
		match self {
			CodecSettings::Gzip(config) => config.encode(input),
			CodecSettings::Brotli(config) => config.encode(input),
		}
	}
}

//! gzip encoders: Zopfli, or standard DEFLATE as a fallback

use super::Encoder;
use crate::config::GzipConfig;
use crate::error::{CodecError, CodecResult};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::num::NonZeroU64;

impl Encoder for GzipConfig {
	fn encode(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
		if self.zlib {
			deflate(input, self.zlib_level)
		} else {
			zopfli_gzip(input, zopfli_options(self))
		}
	}
}

// flate2 has no memory-level knob, so `zlib_mem_level` only documents intent.
fn deflate(input: &[u8], level: u32) -> CodecResult<Vec<u8>> {
	let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level.min(9)));
	encoder.write_all(input).map_err(CodecError::Gzip)?;
	encoder.finish().map_err(CodecError::Gzip)
}

fn zopfli_gzip(input: &[u8], options: zopfli::Options) -> CodecResult<Vec<u8>> {
	let mut output = Vec::new();
	zopfli::compress(options, zopfli::Format::Gzip, input, &mut output)
		.map_err(CodecError::Zopfli)?;
	Ok(output)
}

/// Translates gzip settings into Zopfli options.
///
/// Disabling block splitting caps the encoder at a single block. The
/// encoder always splits before compressing, so `block_splitting_last` has
/// no counterpart.
pub(crate) fn zopfli_options(config: &GzipConfig) -> zopfli::Options {
	let mut options = zopfli::Options::default();
	options.iteration_count = NonZeroU64::new(config.iterations).unwrap_or(NonZeroU64::MIN);
	options.maximum_block_splits = if config.block_splitting {
		config.block_splitting_max
	} else {
		1
	};
	options
}

#[cfg(test)]
mod tests {
	use super::*;
	use flate2::read::GzDecoder;
	use rstest::rstest;
	use std::io::Read;

	fn gunzip(data: &[u8]) -> Vec<u8> {
		let mut decoded = Vec::new();
		GzDecoder::new(data).read_to_end(&mut decoded).unwrap();
		decoded
	}

	#[rstest]
	#[case(false)]
	#[case(true)]
	fn test_output_is_valid_gzip(#[case] zlib: bool) {
		let config = GzipConfig {
			zlib,
			iterations: 1,
			..Default::default()
		};
		let input = "body { color: red; }\n".repeat(200);

		let compressed = config.encode(input.as_bytes()).unwrap();

		assert!(compressed.len() < input.len());
		assert_eq!(gunzip(&compressed), input.as_bytes());
	}

	#[rstest]
	fn test_zopfli_options_pass_through() {
		let config = GzipConfig {
			iterations: 7,
			block_splitting_max: 3,
			..Default::default()
		};

		let options = zopfli_options(&config);

		assert_eq!(options.iteration_count.get(), 7);
		assert_eq!(options.maximum_block_splits, 3);
	}

	#[rstest]
	fn test_disabled_block_splitting_limits_to_one_block() {
		let config = GzipConfig {
			block_splitting: false,
			..Default::default()
		};

		assert_eq!(zopfli_options(&config).maximum_block_splits, 1);
	}

	#[rstest]
	fn test_zero_iterations_are_raised_to_one() {
		let config = GzipConfig {
			iterations: 0,
			..Default::default()
		};

		assert_eq!(zopfli_options(&config).iteration_count.get(), 1);
	}
}

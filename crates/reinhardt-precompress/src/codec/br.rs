//! Brotli encoder

use super::Encoder;
use crate::config::{BrotliConfig, BrotliMode};
use crate::error::{CodecError, CodecResult};
use brotli::enc::BrotliEncoderParams;
use brotli::enc::backward_references::BrotliEncoderMode;

impl Encoder for BrotliConfig {
	fn encode(&self, input: &[u8]) -> CodecResult<Vec<u8>> {
		let params = encoder_params(self, input.len());
		let mut reader = std::io::Cursor::new(input);
		let mut output = Vec::new();
		brotli::BrotliCompress(&mut reader, &mut output, &params).map_err(CodecError::Brotli)?;
		Ok(output)
	}
}

/// Builds native encoder parameters for an input of `input_len` bytes.
///
/// `enable_context_modeling = false` becomes
/// `disable_literal_context_modeling = 1`. Block size, postfix bits and
/// direct distance codes are only touched when configured.
pub(crate) fn encoder_params(config: &BrotliConfig, input_len: usize) -> BrotliEncoderParams {
	let mut params = BrotliEncoderParams::default();
	params.mode = match config.mode {
		BrotliMode::Generic => BrotliEncoderMode::BROTLI_MODE_GENERIC,
		BrotliMode::Text => BrotliEncoderMode::BROTLI_MODE_TEXT,
		BrotliMode::Font => BrotliEncoderMode::BROTLI_MODE_FONT,
	};
	params.quality = config.quality.min(11) as i32;
	params.lgwin = config.window as i32;
	params.size_hint = input_len;
	params.disable_literal_context_modeling = i32::from(!config.enable_context_modeling);

	if let Some(lgblock) = config.block_size {
		params.lgblock = lgblock as i32;
	}
	if let Some(npostfix) = config.postfix_bits {
		params.dist.distance_postfix_bits = npostfix;
	}
	if let Some(ndirect) = config.direct_distance_codes {
		params.dist.num_direct_distance_codes = ndirect;
	}
	params
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::io::Read;

	#[rstest]
	fn test_mode_mapping() {
		let text = BrotliConfig {
			mode: BrotliMode::Text,
			..Default::default()
		};
		let font = BrotliConfig {
			mode: BrotliMode::Font,
			..Default::default()
		};

		assert!(matches!(
			encoder_params(&BrotliConfig::default(), 0).mode,
			BrotliEncoderMode::BROTLI_MODE_GENERIC
		));
		assert!(matches!(
			encoder_params(&text, 0).mode,
			BrotliEncoderMode::BROTLI_MODE_TEXT
		));
		assert!(matches!(
			encoder_params(&font, 0).mode,
			BrotliEncoderMode::BROTLI_MODE_FONT
		));
	}

	#[rstest]
	#[case(true, 0)]
	#[case(false, 1)]
	fn test_context_modeling_is_inverted(#[case] enabled: bool, #[case] expected: i32) {
		let config = BrotliConfig {
			enable_context_modeling: enabled,
			..Default::default()
		};

		assert_eq!(
			encoder_params(&config, 0).disable_literal_context_modeling,
			expected
		);
	}

	#[rstest]
	fn test_scalar_parameters_pass_through() {
		let config = BrotliConfig {
			quality: 5,
			window: 20,
			..Default::default()
		};

		let params = encoder_params(&config, 4096);

		assert_eq!(params.quality, 5);
		assert_eq!(params.lgwin, 20);
		assert_eq!(params.size_hint, 4096);
	}

	#[rstest]
	fn test_optional_knobs_only_when_set() {
		// Arrange
		let defaults = BrotliEncoderParams::default();
		let configured = BrotliConfig {
			block_size: Some(18),
			postfix_bits: Some(2),
			direct_distance_codes: Some(12),
			..Default::default()
		};

		// Act
		let untouched = encoder_params(&BrotliConfig::default(), 10);
		let params = encoder_params(&configured, 10);

		// Assert
		assert_eq!(untouched.lgblock, defaults.lgblock);
		assert_eq!(
			untouched.dist.distance_postfix_bits,
			defaults.dist.distance_postfix_bits
		);
		assert_eq!(
			untouched.dist.num_direct_distance_codes,
			defaults.dist.num_direct_distance_codes
		);
		assert_eq!(params.lgblock, 18);
		assert_eq!(params.dist.distance_postfix_bits, 2);
		assert_eq!(params.dist.num_direct_distance_codes, 12);
	}

	#[rstest]
	fn test_output_decodes() {
		let config = BrotliConfig {
			quality: 4,
			..Default::default()
		};
		let input = "console.log('hello');\n".repeat(100);

		let compressed = config.encode(input.as_bytes()).unwrap();

		let mut decoded = Vec::new();
		brotli::Decompressor::new(compressed.as_slice(), 4096)
			.read_to_end(&mut decoded)
			.unwrap();
		assert!(compressed.len() < input.len());
		assert_eq!(decoded, input.as_bytes());
	}
}

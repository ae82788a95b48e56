//! Configuration sources
//!
//! A source supplies at most one [`PartialConfig`] layer. Finding nothing is
//! not an error: the pipeline then runs on built-in defaults.

use super::PartialConfig;
use crate::error::{ConfigError, ConfigResult};
use std::fs;
use std::path::{Path, PathBuf};

/// File names probed in each directory, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
	"package.json",
	".compressrc",
	".compressrc.json",
	".compressrc.toml",
	"compress.config.toml",
];

/// Key holding the configuration inside `package.json`
const PACKAGE_JSON_KEY: &str = "compress";

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync {
	/// Load the configuration layer, or `None` if this source has nothing
	fn load(&self) -> ConfigResult<Option<PartialConfig>>;

	/// Get a description of this source
	fn description(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
	PackageJson,
	Json,
	Toml,
}

impl FileFormat {
	fn from_path(path: &Path) -> Self {
		let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
		if file_name == "package.json" {
			FileFormat::PackageJson
		} else if path.extension().is_some_and(|ext| ext == "toml") {
			FileFormat::Toml
		} else {
			FileFormat::Json
		}
	}
}

/// Configuration loaded from the file system
///
/// Either searches upward from a directory for the first recognised config
/// file, or reads one explicitly named file.
///
/// # Examples
///
/// ```rust
/// use reinhardt_precompress::config::{ConfigSource, FileConfigSource};
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join(".compressrc.toml"), "threshold = 2048\n").unwrap();
///
/// let source = FileConfigSource::search_from(dir.path());
/// let layer = source.load().unwrap().unwrap();
/// assert_eq!(layer.threshold, Some(2048));
/// ```
#[derive(Debug, Clone)]
pub struct FileConfigSource {
	location: Location,
}

#[derive(Debug, Clone)]
enum Location {
	Search(PathBuf),
	Explicit(PathBuf),
}

impl FileConfigSource {
	/// Search `dir` and its ancestors
	pub fn search_from(dir: impl Into<PathBuf>) -> Self {
		Self {
			location: Location::Search(dir.into()),
		}
	}

	/// Read exactly this file; its absence is an error
	pub fn explicit(path: impl Into<PathBuf>) -> Self {
		Self {
			location: Location::Explicit(path.into()),
		}
	}

	fn search(start: &Path) -> ConfigResult<Option<PartialConfig>> {
		for dir in start.ancestors() {
			for name in CONFIG_FILE_NAMES {
				let candidate = dir.join(name);
				if !candidate.is_file() {
					continue;
				}
				// package.json without a `compress` key does not end the search
				if let Some(layer) = read_file(&candidate)? {
					tracing::debug!("Loaded compress config from {}", candidate.display());
					return Ok(Some(layer));
				}
			}
		}
		Ok(None)
	}
}

impl ConfigSource for FileConfigSource {
	fn load(&self) -> ConfigResult<Option<PartialConfig>> {
		match &self.location {
			Location::Search(start) => Self::search(start),
			Location::Explicit(path) => {
				if !path.is_file() {
					return Err(ConfigError::NotFound(path.clone()));
				}
				read_file(path)
			}
		}
	}

	fn description(&self) -> String {
		match &self.location {
			Location::Search(start) => format!("config search from {}", start.display()),
			Location::Explicit(path) => format!("config file {}", path.display()),
		}
	}
}

fn read_file(path: &Path) -> ConfigResult<Option<PartialConfig>> {
	let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
		path: path.to_path_buf(),
		source,
	})?;
	let json_error = |source| ConfigError::Json {
		path: path.to_path_buf(),
		source,
	};

	match FileFormat::from_path(path) {
		FileFormat::PackageJson => {
			let manifest: serde_json::Value = serde_json::from_str(&content).map_err(json_error)?;
			match manifest.get(PACKAGE_JSON_KEY) {
				Some(section) => serde_json::from_value(section.clone())
					.map(Some)
					.map_err(json_error),
				None => Ok(None),
			}
		}
		FileFormat::Json => serde_json::from_str(&content).map(Some).map_err(json_error),
		FileFormat::Toml => toml::from_str(&content)
			.map(Some)
			.map_err(|source| ConfigError::Toml {
				path: path.to_path_buf(),
				source,
			}),
	}
}

/// In-memory configuration source
///
/// Used by host tools that already hold their settings, and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource {
	layer: Option<PartialConfig>,
}

impl StaticConfigSource {
	/// Source yielding `layer`
	pub fn new(layer: PartialConfig) -> Self {
		Self { layer: Some(layer) }
	}

	/// Source yielding nothing, so defaults apply
	pub fn empty() -> Self {
		Self::default()
	}
}

impl ConfigSource for StaticConfigSource {
	fn load(&self) -> ConfigResult<Option<PartialConfig>> {
		Ok(self.layer.clone())
	}

	fn description(&self) -> String {
		"in-memory config".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use tempfile::TempDir;

	#[rstest]
	fn test_package_json_section() {
		let dir = TempDir::new().unwrap();
		fs::write(
			dir.path().join("package.json"),
			r#"{ "name": "app", "compress": { "concurrency": 6, "compressOutput": true } }"#,
		)
		.unwrap();

		let layer = FileConfigSource::search_from(dir.path())
			.load()
			.unwrap()
			.unwrap();

		assert_eq!(layer.concurrency, Some(6));
		assert_eq!(layer.compress_output, Some(true));
	}

	#[rstest]
	fn test_package_json_without_section_falls_through() {
		// Arrange
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("package.json"), r#"{ "name": "app" }"#).unwrap();
		fs::write(dir.path().join(".compressrc"), r#"{ "test": "\\.js$" }"#).unwrap();

		// Act
		let layer = FileConfigSource::search_from(dir.path())
			.load()
			.unwrap()
			.unwrap();

		// Assert
		assert_eq!(layer.test.as_deref(), Some("\\.js$"));
	}

	#[rstest]
	fn test_search_walks_up_to_parent() {
		let dir = TempDir::new().unwrap();
		let nested = dir.path().join("dist").join("assets");
		fs::create_dir_all(&nested).unwrap();
		fs::write(
			dir.path().join("compress.config.toml"),
			"[brotli]\nquality = 5\n",
		)
		.unwrap();

		let layer = FileConfigSource::search_from(&nested).load().unwrap().unwrap();

		assert_eq!(layer.brotli.unwrap().quality, Some(5));
	}

	#[rstest]
	fn test_nearest_directory_wins() {
		let dir = TempDir::new().unwrap();
		let nested = dir.path().join("web");
		fs::create_dir_all(&nested).unwrap();
		fs::write(dir.path().join(".compressrc.json"), r#"{ "threshold": 1 }"#).unwrap();
		fs::write(nested.join(".compressrc.json"), r#"{ "threshold": 2 }"#).unwrap();

		let layer = FileConfigSource::search_from(&nested).load().unwrap().unwrap();

		assert_eq!(layer.threshold, Some(2));
	}

	#[rstest]
	fn test_malformed_file_is_error() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join(".compressrc.json"), "{ not json").unwrap();

		let result = FileConfigSource::search_from(dir.path()).load();

		assert!(matches!(result, Err(ConfigError::Json { .. })));
	}

	#[rstest]
	fn test_malformed_toml_is_error() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join(".compressrc.toml"), "threshold = [").unwrap();

		let result = FileConfigSource::search_from(dir.path()).load();

		assert!(matches!(result, Err(ConfigError::Toml { .. })));
	}

	#[rstest]
	fn test_explicit_missing_file_is_error() {
		let dir = TempDir::new().unwrap();

		let result = FileConfigSource::explicit(dir.path().join("nope.toml")).load();

		assert!(matches!(result, Err(ConfigError::NotFound(_))));
	}

	#[rstest]
	fn test_static_source() {
		let layer = PartialConfig {
			threshold: Some(10),
			..Default::default()
		};

		assert_eq!(StaticConfigSource::new(layer.clone()).load().unwrap(), Some(layer));
		assert_eq!(StaticConfigSource::empty().load().unwrap(), None);
	}
}

//! Candidate file discovery
//!
//! Two traversal modes, selected by [`CompressionConfig::compress_output`]:
//!
//! - **bundle tree**: pre-order walk of the host build's [`Bundle`] graph
//! - **output directory**: recursive walk of the build output directory
//!
//! Both are lazy iterators that yield paths matching the configured `test`
//! pattern. Nothing is cached; calling [`discover`] again restarts the walk.
//! Duplicates are not removed.

use crate::config::CompressionConfig;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A node of the host build tool's bundle graph
///
/// Only the fields the pipeline reads are modelled. Deserializes from the
/// JSON shape `{ "name": "...", "childBundles": [ ... ] }`.
///
/// # Examples
///
/// ```rust
/// use reinhardt_precompress::discovery::Bundle;
///
/// let root = Bundle::new("dist/index.html")
///     .with_child(Bundle::new("dist/app.js"))
///     .with_child(Bundle::new("dist/app.css"));
/// assert_eq!(root.child_bundles.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
	/// Output file of this bundle; absent for virtual grouping nodes
	#[serde(default)]
	pub name: Option<PathBuf>,
	/// Bundles referenced by this one
	#[serde(default, alias = "children")]
	pub child_bundles: Vec<Bundle>,
}

impl Bundle {
	/// A bundle with an output file and no children
	pub fn new(name: impl Into<PathBuf>) -> Self {
		Self {
			name: Some(name.into()),
			child_bundles: Vec::new(),
		}
	}

	/// A bundle without an output file
	pub fn unnamed() -> Self {
		Self::default()
	}

	/// Appends a child bundle
	pub fn with_child(mut self, child: Bundle) -> Self {
		self.child_bundles.push(child);
		self
	}

	/// Rewrites relative bundle names against `base`, recursively.
	///
	/// A relative `base` is made absolute first, so resolved names compare
	/// equal to the paths an output directory walk produces.
	pub fn resolve_names(&mut self, base: &Path) {
		let base = std::path::absolute(base).unwrap_or_else(|_| base.to_path_buf());
		self.resolve_names_against(&base);
	}

	fn resolve_names_against(&mut self, base: &Path) {
		if let Some(name) = &self.name
			&& name.is_relative()
		{
			self.name = Some(base.join(name));
		}
		for child in &mut self.child_bundles {
			child.resolve_names_against(base);
		}
	}

	/// Matching file names of this bundle and all descendants, pre-order
	pub fn files<'a>(&'a self, pattern: &'a Regex) -> BundleFiles<'a> {
		BundleFiles {
			stack: vec![self],
			pattern,
		}
	}
}

/// Pre-order iterator over a bundle tree
pub struct BundleFiles<'a> {
	stack: Vec<&'a Bundle>,
	pattern: &'a Regex,
}

impl Iterator for BundleFiles<'_> {
	type Item = PathBuf;

	fn next(&mut self) -> Option<PathBuf> {
		loop {
			let bundle = self.stack.pop()?;
			// Reversed so the first child is visited first
			self.stack.extend(bundle.child_bundles.iter().rev());

			if let Some(name) = &bundle.name
				&& self.pattern.is_match(&name.to_string_lossy())
			{
				return Some(name.clone());
			}
		}
	}
}

/// Recursive iterator over regular files below an output directory
///
/// Symlinks are followed. Entries that cannot be read, including whole
/// subtrees, are skipped and logged at debug level.
pub struct OutputDirFiles<'a> {
	walker: walkdir::IntoIter,
	pattern: &'a Regex,
}

impl<'a> OutputDirFiles<'a> {
	/// Walks `dir`, yielding absolute paths of files matching `pattern`
	pub fn new(dir: &Path, pattern: &'a Regex) -> Self {
		let root = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
		Self {
			walker: WalkDir::new(root).follow_links(true).into_iter(),
			pattern,
		}
	}
}

impl Iterator for OutputDirFiles<'_> {
	type Item = PathBuf;

	fn next(&mut self) -> Option<PathBuf> {
		loop {
			match self.walker.next()? {
				Ok(entry) => {
					if entry.file_type().is_file()
						&& self.pattern.is_match(&entry.path().to_string_lossy())
					{
						return Some(entry.into_path());
					}
				}
				Err(e) => {
					let location = e
						.path()
						.map(|p| p.display().to_string())
						.unwrap_or_default();
					tracing::debug!("Skipping unreadable entry {}: {}", location, e);
				}
			}
		}
	}
}

/// Candidate paths for one run, in discovery order
pub enum Discovered<'a> {
	/// Bundle tree walk
	Bundle(BundleFiles<'a>),
	/// Output directory walk
	OutputDir(OutputDirFiles<'a>),
}

impl Iterator for Discovered<'_> {
	type Item = PathBuf;

	fn next(&mut self) -> Option<PathBuf> {
		match self {
			Discovered::Bundle(files) => files.next(),
			Discovered::OutputDir(files) => files.next(),
		}
	}
}

/// Starts discovery in the mode selected by `config`
pub fn discover<'a>(
	config: &'a CompressionConfig,
	root: &'a Bundle,
	out_dir: &'a Path,
) -> Discovered<'a> {
	if config.compress_output {
		Discovered::OutputDir(OutputDirFiles::new(out_dir, &config.test_pattern))
	} else {
		Discovered::Bundle(root.files(&config.test_pattern))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::fs;
	use tempfile::TempDir;

	fn any() -> Regex {
		Regex::new(".").unwrap()
	}

	#[rstest]
	fn test_bundle_tree_is_pre_order() {
		// Arrange
		let root = Bundle::new("/out/index.html")
			.with_child(
				Bundle::new("/out/a.js")
					.with_child(Bundle::new("/out/a1.js"))
					.with_child(Bundle::new("/out/a2.js")),
			)
			.with_child(Bundle::new("/out/b.css"));
		let pattern = any();

		// Act
		let files: Vec<PathBuf> = root.files(&pattern).collect();

		// Assert
		let expected: Vec<PathBuf> = [
			"/out/index.html",
			"/out/a.js",
			"/out/a1.js",
			"/out/a2.js",
			"/out/b.css",
		]
		.iter()
		.map(PathBuf::from)
		.collect();
		assert_eq!(files, expected);
	}

	#[rstest]
	fn test_unnamed_bundles_are_traversed() {
		let root = Bundle::unnamed().with_child(Bundle::unnamed().with_child(Bundle::new("/x.js")));
		let pattern = any();

		let files: Vec<PathBuf> = root.files(&pattern).collect();

		assert_eq!(files, vec![PathBuf::from("/x.js")]);
	}

	#[rstest]
	fn test_bundle_filter_still_descends() {
		let root = Bundle::new("/out/index.html").with_child(Bundle::new("/out/app.js"));
		let pattern = Regex::new(r"\.js$").unwrap();

		let files: Vec<PathBuf> = root.files(&pattern).collect();

		assert_eq!(files, vec![PathBuf::from("/out/app.js")]);
	}

	#[rstest]
	fn test_bundle_from_json() {
		let root: Bundle = serde_json::from_str(
			r#"{ "name": "index.html", "childBundles": [ { "name": "app.js" }, { "children": [] } ] }"#,
		)
		.unwrap();

		assert_eq!(root.name, Some(PathBuf::from("index.html")));
		assert_eq!(root.child_bundles.len(), 2);
		assert_eq!(root.child_bundles[1].name, None);
	}

	#[rstest]
	fn test_resolve_names() {
		let mut root = Bundle::new("index.html").with_child(Bundle::new("/abs/app.js"));

		root.resolve_names(Path::new("/dist"));

		assert_eq!(root.name, Some(PathBuf::from("/dist/index.html")));
		assert_eq!(root.child_bundles[0].name, Some(PathBuf::from("/abs/app.js")));
	}

	#[rstest]
	fn test_resolve_names_against_relative_base() {
		let mut root = Bundle::unnamed().with_child(Bundle::new("index.html"));

		root.resolve_names(Path::new("dist"));

		let name = root.child_bundles[0].name.clone().unwrap();
		assert!(name.is_absolute());
		assert_eq!(name, std::env::current_dir().unwrap().join("dist").join("index.html"));
	}

	#[rstest]
	fn test_output_dir_walk_filters_by_pattern() {
		let dir = TempDir::new().unwrap();
		fs::create_dir_all(dir.path().join("assets/js")).unwrap();
		fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
		fs::write(dir.path().join("assets/js/app.js"), "let a;").unwrap();
		fs::write(dir.path().join("assets/logo.png"), [0u8; 4]).unwrap();
		let pattern = Regex::new(r"\.(js|html)$").unwrap();

		let mut files: Vec<PathBuf> = OutputDirFiles::new(dir.path(), &pattern).collect();
		files.sort();

		assert_eq!(files.len(), 2);
		assert!(files.iter().all(|p| p.is_absolute()));
		assert!(files.iter().all(|p| pattern.is_match(&p.to_string_lossy())));
		assert!(files.iter().any(|p| p.ends_with("assets/js/app.js")));
		assert!(!files.iter().any(|p| p.ends_with("assets/js")));
	}

	#[rstest]
	fn test_missing_output_dir_yields_nothing() {
		let dir = TempDir::new().unwrap();
		let pattern = any();

		let files: Vec<PathBuf> = OutputDirFiles::new(&dir.path().join("missing"), &pattern).collect();

		assert!(files.is_empty());
	}

	#[cfg(unix)]
	#[rstest]
	fn test_unreadable_subdirectory_does_not_abort() {
		use std::os::unix::fs::PermissionsExt;

		// Arrange
		let dir = TempDir::new().unwrap();
		let locked = dir.path().join("locked");
		fs::create_dir(&locked).unwrap();
		fs::write(locked.join("secret.js"), "x").unwrap();
		fs::write(dir.path().join("visible.js"), "y").unwrap();
		fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
		let pattern = any();

		// Act
		let files: Vec<PathBuf> = OutputDirFiles::new(dir.path(), &pattern).collect();
		fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

		// Assert
		assert!(files.iter().any(|p| p.ends_with("visible.js")));
	}

	#[rstest]
	#[case(true)]
	#[case(false)]
	fn test_discover_selects_mode(#[case] compress_output: bool) {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("on-disk.js"), "x").unwrap();
		let root = Bundle::new("/bundle/only.js");
		let config = CompressionConfig::resolve(None, Default::default())
			.unwrap()
			.with_compress_output(compress_output);

		let files: Vec<PathBuf> = discover(&config, &root, dir.path()).collect();

		assert_eq!(files.len(), 1);
		if compress_output {
			assert!(files[0].ends_with("on-disk.js"));
		} else {
			assert_eq!(files[0], PathBuf::from("/bundle/only.js"));
		}
	}
}

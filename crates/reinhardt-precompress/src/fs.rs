//! File system capability used by compression tasks
//!
//! Tasks never touch `std::fs` directly; they go through [`FileSystem`] so
//! that hosts can substitute their own storage and tests can inject
//! failures.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Stat snapshot of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
	/// Size in bytes
	pub size: u64,
	/// Modification time, when the platform reports one
	pub modified: Option<SystemTime>,
	/// Whether the path is a regular file (after following symlinks)
	pub is_file: bool,
}

/// Fallible file system operations needed by the pipeline
#[async_trait]
pub trait FileSystem: Send + Sync {
	/// Stat `path`, following symlinks
	async fn stat(&self, path: &Path) -> io::Result<FileStat>;

	/// Read the full contents of `path`
	async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

	/// Create or replace `path` with `contents`
	async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// [`FileSystem`] backed by `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
	/// Creates a new local file system handle
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl FileSystem for LocalFileSystem {
	async fn stat(&self, path: &Path) -> io::Result<FileStat> {
		let metadata = tokio::fs::metadata(path).await?;
		Ok(FileStat {
			size: metadata.len(),
			modified: metadata.modified().ok(),
			is_file: metadata.is_file(),
		})
	}

	async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
		tokio::fs::read(path).await
	}

	async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
		tokio::fs::write(path, contents).await
	}
}

/// A discovered path together with its stat snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
	/// Path as produced by discovery
	pub path: PathBuf,
	/// Stat taken when the task started
	pub stat: FileStat,
}

impl CandidateFile {
	/// Stats `path` and keeps it only if it is still a regular file.
	///
	/// Returns `None` if the file vanished, cannot be stat'ed, or is not a
	/// regular file. None of these are errors for the pipeline.
	pub async fn inspect(fs: &dyn FileSystem, path: &Path) -> Option<Self> {
		match fs.stat(path).await {
			Ok(stat) if stat.is_file => Some(Self {
				path: path.to_path_buf(),
				stat,
			}),
			Ok(_) => {
				tracing::debug!("Skipping {}: not a regular file", path.display());
				None
			}
			Err(e) => {
				tracing::debug!("Skipping {}: {}", path.display(), e);
				None
			}
		}
	}

	/// Size in bytes at stat time
	pub fn size(&self) -> u64 {
		self.stat.size
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use tempfile::TempDir;

	#[rstest]
	#[tokio::test]
	async fn test_local_round_trip() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("app.js");
		let fs = LocalFileSystem::new();

		fs.write(&path, b"let a = 1;").await.unwrap();
		let stat = fs.stat(&path).await.unwrap();
		let contents = fs.read(&path).await.unwrap();

		assert!(stat.is_file);
		assert_eq!(stat.size, 10);
		assert_eq!(contents, b"let a = 1;");
	}

	#[rstest]
	#[tokio::test]
	async fn test_inspect_missing_file() {
		let dir = TempDir::new().unwrap();

		let candidate = CandidateFile::inspect(&LocalFileSystem, &dir.path().join("gone.js")).await;

		assert!(candidate.is_none());
	}

	#[rstest]
	#[tokio::test]
	async fn test_inspect_directory() {
		let dir = TempDir::new().unwrap();

		let candidate = CandidateFile::inspect(&LocalFileSystem, dir.path()).await;

		assert!(candidate.is_none());
	}
}

//! # Reinhardt Precompress
//!
//! Post-build pre-compression of static assets. After a production build
//! finishes, every matching output file gets a gzip (`.gz`) and a Brotli
//! (`.br`) sibling so that a static file server can hand out compressed
//! variants without compressing on the fly.
//!
//! ## Features
//!
//! - **Two codecs**: Zopfli-based gzip (or standard DEFLATE) and Brotli, each
//!   fully configurable
//! - **Two discovery modes**: walk the host build's bundle tree, or the whole
//!   output directory
//! - **Size gates**: files below `threshold` are skipped, and artifacts that
//!   are not strictly smaller than their source are never written
//! - **Bounded concurrency**: one shared limiter for both codecs
//! - **Layered configuration**: defaults, a discovered `.compressrc` or
//!   `package.json` `compress` key, then call-site overrides
//! - **Report**: a sorted table of every artifact plus a total time
//!
//! ## Example
//!
//! ```rust,no_run
//! use reinhardt_precompress::{
//!     BuildEvent, Bundle, FileConfigSource, PartialConfig, on_build_complete,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let event = BuildEvent::new("dist", Bundle::unnamed());
//! let overrides = PartialConfig {
//!     compress_output: Some(true),
//!     ..Default::default()
//! };
//!
//! if let Some(summary) =
//!     on_build_complete(&event, &FileConfigSource::search_from("."), overrides).await?
//! {
//!     println!("{}", summary.report(Some(&event.out_dir)));
//! }
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fs;
pub mod outcome;
pub mod pipeline;
pub mod report;
pub mod scheduler;
pub mod task;

pub use codec::{Codec, CodecSettings, Encoder};
pub use config::{
	BrotliConfig, BrotliMode, CompressionConfig, ConfigSource, FileConfigSource, GzipConfig,
	PartialConfig, StaticConfigSource,
};
pub use discovery::{Bundle, discover};
pub use error::{
	CodecError, ConfigError, PrecompressError, PrecompressResult, TaskError, TaskResult,
};
pub use fs::{FileSystem, LocalFileSystem};
pub use outcome::{CompressionOutcome, OutcomeCollector};
pub use pipeline::{BuildEvent, ExecutionMode, Pipeline, RunSummary, on_build_complete};
pub use report::Report;
pub use scheduler::TaskQueue;
pub use task::{CompressionTask, TaskStatus};

//! Live Photo Sort Library
//!
//! Detects Live Photo pairs (HEIC/JPG still + MOV companion) linked by
//! Apple's ContentIdentifier UUID, renames them with rich sortable names,
//! and moves them together into a destination folder with copy-verify-delete
//! integrity checking.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`core`] - Core functionality: configuration, errors, record
//!   classification, indexing/matching, naming, verified relocation, the
//!   run manifest, and the orchestration pipeline
//! - [`exif`] - Batch metadata extraction via an exiftool subprocess
//! - [`scan`] - Recursive source directory scanning
//! - [`cli`] - Command-line interface (only used by the binary)
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use live_photo_sort::core::pipeline::{SortOptions, SortRun};
//! use live_photo_sort::exif::ExifBatchReader;
//! use std::path::PathBuf;
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//!
//! fn main() -> anyhow::Result<()> {
//!     let options = SortOptions {
//!         sources: vec![PathBuf::from("/Volumes/Archive/Photos")],
//!         dest_dir: PathBuf::from("/Volumes/Archive/LivePhotoPairs"),
//!         batch_size: 500,
//!         dry_run: true,
//!     };
//!
//!     // Set up shutdown flag for graceful termination
//!     let shutdown_flag = Arc::new(AtomicBool::new(false));
//!
//!     let run = SortRun::new(options, ExifBatchReader::default(), shutdown_flag);
//!     let stats = run.execute()?;
//!     println!("{} pairs moved", stats.pairs_moved);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Live Photo Detection
//!
//! - An image is a Live Photo still when its MakerNotes carry a
//!   `LivePhotoVideoIndex` field *and* a `ContentIdentifier` UUID.
//! - A companion video is any MOV whose `ContentIdentifier` matches.
//! - exiftool must not be run with `-fast2`; that flag skips the
//!   MakerNotes block where `ContentIdentifier` lives.
//!
//! # Apple Photos Re-import
//!
//! For Apple Photos to recognise a pair as a Live Photo on import, both
//! files must share the same base name and the ContentIdentifier metadata
//! must survive the copy. Byte-identical verified copies guarantee both.

pub mod cli;
pub mod core;
pub mod exif;
pub mod scan;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

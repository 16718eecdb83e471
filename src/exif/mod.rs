//! Batch metadata extraction via exiftool
//!
//! exiftool is treated as an opaque external collaborator: one subprocess
//! per batch of files, JSON output, bounded by a timeout. Every failure
//! mode degrades to an empty batch instead of aborting the run.

pub mod reader;

pub use reader::{BatchError, ExifBatchReader, RawMetadata};

//! Source directory scanning
//!
//! Enumerates candidate media files under the configured source roots.

pub mod walker;

pub use walker::collect_candidate_files;

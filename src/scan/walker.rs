//! Recursive candidate file enumeration
//!
//! Walks a source root and keeps every file whose lowercase extension is in
//! the combined image/video allow-list. A missing root is a warning, not an
//! error: source volumes come and go across runs and one disconnected
//! volume must not abort the whole pass.

use crate::core::record::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collect all candidate media files under `root`, sorted for deterministic
/// batching.
pub fn collect_candidate_files(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        warn!("Source folder does not exist: {}", root.display());
        return Vec::new();
    }

    let mut candidates: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                debug!("Skipping unreadable entry under {}: {}", root.display(), err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| has_candidate_extension(e.path()))
        .map(|e| e.into_path())
        .collect();

    candidates.sort();
    debug!(
        "Found {} candidate files under {}",
        candidates.len(),
        root.display()
    );
    candidates
}

fn has_candidate_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .map(|e| {
            IMAGE_EXTENSIONS.contains(&e.as_str()) || VIDEO_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

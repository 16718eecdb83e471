//! Run manifest for audit
//!
//! One JSON document per non-dry run, written to the destination directory
//! and overwritten on each execution. It records every attempted pair with
//! per-half success flags plus the orphans that had no counterpart.

use crate::core::error::{Result, SortError};
use chrono::Local;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Manifest file name inside the destination directory
pub const MANIFEST_FILE_NAME: &str = "live_photo_manifest.json";

/// Full audit record of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// RFC 3339 generation timestamp
    pub generated: String,

    /// Destination directory of the run
    pub dest_dir: PathBuf,

    /// Schema / tool version
    pub version: String,

    /// One entry per attempted pair
    pub pairs: Vec<PairEntry>,

    /// Stills whose identifier had no companion video
    pub orphan_images: Vec<OrphanEntry>,

    /// Videos whose identifier had no still
    pub orphan_videos: Vec<OrphanEntry>,
}

/// Audit record of one attempted pair relocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairEntry {
    /// ContentIdentifier shared by both halves
    pub uuid: String,

    /// Base name assigned to both halves
    pub base_name: String,

    /// The still image half
    pub image: RoleEntry,

    /// The companion video half
    pub video: RoleEntry,
}

/// Per-half relocation outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleEntry {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub success: bool,
}

/// An identifier present in exactly one index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrphanEntry {
    pub uuid: String,
    pub path: PathBuf,
}

impl Manifest {
    /// Create an empty manifest stamped with the current time.
    pub fn new(dest_dir: &Path) -> Self {
        Self {
            generated: Local::now().to_rfc3339(),
            dest_dir: dest_dir.to_path_buf(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            pairs: Vec::new(),
            orphan_images: Vec::new(),
            orphan_videos: Vec::new(),
        }
    }

    /// Path of the manifest file for a given destination directory.
    pub fn path_for(dest_dir: &Path) -> PathBuf {
        dest_dir.join(MANIFEST_FILE_NAME)
    }

    /// Write the manifest to the destination directory, overwriting any
    /// previous run's manifest.
    pub fn write(&self) -> Result<PathBuf> {
        let path = Self::path_for(&self.dest_dir);
        let file = File::create(&path)
            .map_err(|e| SortError::ManifestError(format!("create {}: {}", path.display(), e)))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SortError::ManifestError(format!("write {}: {}", path.display(), e)))?;

        debug!("Manifest written to {}", path.display());
        Ok(path)
    }
}

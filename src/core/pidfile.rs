//! Process liveness marker
//!
//! Writes the process id to a small file so external tooling can find and
//! signal an unattended run (`kill $(cat logs/live_photo_sort.pid)`). The
//! file is removed when the guard drops, including on unwind.

use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// RAII guard around the pid file
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Write the current process id to `path`, creating parent directories
    /// as needed.
    pub fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, std::process::id().to_string())?;
        debug!("Wrote pid file {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove pid file {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pid_file_lifecycle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("tool.pid");

        {
            let guard = PidFile::create(&path).unwrap();
            assert_eq!(guard.path(), path);
            let contents = fs::read_to_string(&path).unwrap();
            assert_eq!(contents, std::process::id().to_string());
        }

        assert!(!path.exists(), "pid file removed on drop");
    }

    #[test]
    fn test_drop_tolerates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tool.pid");
        let guard = PidFile::create(&path).unwrap();
        fs::remove_file(&path).unwrap();
        drop(guard); // must not panic
    }
}

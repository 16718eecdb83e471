//! Batch exiftool invocation
//!
//! One `exiftool -json -n` subprocess per batch of up to a few hundred
//! files. Output order is not guaranteed to match input order; records are
//! correlated through the echoed `SourceFile` field.
//!
//! The reader never propagates an error across the batch boundary as a
//! panic or abort: every failure mode (spawn, timeout, malformed output)
//! is a [`BatchError`] value and the caller decides to log it and move on.

use log::{debug, warn};
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default number of files per exiftool call, balancing subprocess
/// overhead against per-call memory and time
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default per-batch timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Polling interval while waiting for the subprocess
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Tags requested from exiftool.
///
/// exiftool's `-fast2` flag must never be added to the invocation: it skips
/// the MakerNotes block, which is where ContentIdentifier lives.
const TAGS: &[&str] = &[
    "SourceFile",
    "ContentIdentifier",
    "LivePhotoVideoIndex",
    "DateTimeOriginal",
    "GPSLatitude",
    "GPSLongitude",
    "Make",
    "Model",
    "Description",
    "FileTypeExtension",
    "MIMEType",
];

/// One file's raw metadata as exiftool reports it
#[derive(Debug, Clone, Deserialize)]
pub struct RawMetadata {
    #[serde(rename = "SourceFile")]
    pub source_file: Option<String>,

    #[serde(rename = "ContentIdentifier")]
    pub content_identifier: Option<String>,

    /// Present only on the image half of a Live Photo; the value itself is
    /// irrelevant, only its presence matters
    #[serde(rename = "LivePhotoVideoIndex")]
    pub live_photo_video_index: Option<serde_json::Value>,

    #[serde(rename = "DateTimeOriginal")]
    pub date_time_original: Option<String>,

    #[serde(rename = "GPSLatitude")]
    pub gps_latitude: Option<f64>,

    #[serde(rename = "GPSLongitude")]
    pub gps_longitude: Option<f64>,

    #[serde(rename = "Make")]
    pub make: Option<String>,

    #[serde(rename = "Model")]
    pub model: Option<String>,

    #[serde(rename = "Description")]
    pub description: Option<String>,

    #[serde(rename = "FileTypeExtension")]
    pub file_type_extension: Option<String>,

    #[serde(rename = "MIMEType")]
    pub mime_type: Option<String>,
}

/// Typed failure reasons for one batch
#[derive(Error, Debug)]
pub enum BatchError {
    /// The exiftool binary could not be started
    #[error("failed to spawn '{binary}': {message}")]
    Spawn { binary: String, message: String },

    /// The subprocess exceeded the per-batch deadline and was killed
    #[error("exiftool timed out after {timeout_secs}s on a batch of {files} files")]
    Timeout { files: usize, timeout_secs: u64 },

    /// stdout was not valid JSON
    #[error("exiftool JSON parse error: {0}")]
    Malformed(String),

    /// Reading the subprocess output failed
    #[error("IO error reading exiftool output: {0}")]
    Io(String),
}

/// Invokes exiftool on batches of file paths
#[derive(Debug, Clone)]
pub struct ExifBatchReader {
    /// Binary name or path (normally just "exiftool")
    binary: String,

    /// Deadline per subprocess invocation
    timeout: Duration,
}

impl ExifBatchReader {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Run exiftool on one batch of files and return its records.
    ///
    /// Returns fewer records than inputs when exiftool could not read some
    /// files; returns an empty list for an empty batch without spawning.
    pub fn read_batch(&self, paths: &[PathBuf]) -> Result<Vec<RawMetadata>, BatchError> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }

        let mut cmd = Command::new(&self.binary);
        cmd.arg("-json").arg("-n");
        for tag in TAGS {
            cmd.arg(format!("-{}", tag));
        }
        cmd.args(paths);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| BatchError::Spawn {
            binary: self.binary.clone(),
            message: e.to_string(),
        })?;

        // Drain both pipes on threads so a large batch cannot deadlock on a
        // full pipe buffer while we poll for exit.
        let stdout_drain = drain_pipe(child.stdout.take());
        let stderr_drain = drain_pipe(child.stderr.take());

        let status = match self.wait_with_deadline(&mut child) {
            Some(status) => status,
            None => {
                if let Err(e) = child.kill() {
                    warn!("Failed to kill timed-out exiftool: {}", e);
                }
                let _ = child.wait();
                let _ = join_drain(stdout_drain);
                let _ = join_drain(stderr_drain);
                return Err(BatchError::Timeout {
                    files: paths.len(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let stdout = join_drain(stdout_drain)?;
        let stderr = join_drain(stderr_drain).unwrap_or_default();

        // exiftool exits 1 when some files produced warnings but output is
        // still usable
        if !matches!(status.code(), Some(0) | Some(1)) {
            let stderr_text = String::from_utf8_lossy(&stderr);
            warn!(
                "exiftool returned {:?}: {}",
                status.code(),
                stderr_text.chars().take(200).collect::<String>()
            );
        }

        parse_records(&stdout)
    }

    /// Poll for exit until the deadline. `None` means the deadline passed.
    fn wait_with_deadline(&self, child: &mut Child) -> Option<std::process::ExitStatus> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Some(status),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        return None;
                    }
                    thread::sleep(WAIT_POLL_INTERVAL);
                }
                Err(e) => {
                    warn!("try_wait on exiftool failed: {}", e);
                    return None;
                }
            }
        }
    }
}

impl Default for ExifBatchReader {
    fn default() -> Self {
        Self::new("exiftool", DEFAULT_TIMEOUT)
    }
}

/// Read a child pipe to completion on a background thread.
fn drain_pipe<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<std::io::Result<Vec<u8>>>> {
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn join_drain(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<Vec<u8>, BatchError> {
    match handle {
        Some(h) => match h.join() {
            Ok(Ok(buf)) => Ok(buf),
            Ok(Err(e)) => Err(BatchError::Io(e.to_string())),
            Err(_) => Err(BatchError::Io("output reader thread panicked".to_string())),
        },
        None => Ok(Vec::new()),
    }
}

/// Parse exiftool's JSON array output into raw records.
///
/// Whole-output parse failure is a batch error; an individual array element
/// that does not fit the expected shape is dropped with a debug log rather
/// than poisoning the batch.
fn parse_records(stdout: &[u8]) -> Result<Vec<RawMetadata>, BatchError> {
    let text = String::from_utf8_lossy(stdout);
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let values: Vec<serde_json::Value> =
        serde_json::from_str(&text).map_err(|e| BatchError::Malformed(e.to_string()))?;

    let mut records = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value::<RawMetadata>(value) {
            Ok(record) => records.push(record),
            Err(e) => debug!("Dropping unparseable exiftool record: {}", e),
        }
    }
    Ok(records)
}

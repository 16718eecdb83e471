//! Media records and Live Photo role classification
//!
//! A [`MediaRecord`] captures the facts extracted from one physical file that
//! the matcher and namer care about. Classification rules:
//!
//! - **Image half**: extension is one of [`IMAGE_EXTENSIONS`] *and* the
//!   `LivePhotoVideoIndex` maker-note field is present. A plain photo that
//!   happens to carry a ContentIdentifier is not a Live Photo still.
//! - **Video half**: extension is one of [`VIDEO_EXTENSIONS`]. The identifier
//!   alone suffices here; companion MOVs carry no index marker.
//!
//! The asymmetry is intentional and matches how Apple writes the metadata.

use crate::exif::RawMetadata;
use chrono::NaiveDateTime;
use std::path::PathBuf;

/// Image extensions that can be Live Photo stills
pub const IMAGE_EXTENSIONS: &[&str] = &["heic", "jpg", "jpeg", "png"];

/// Video extensions that can be Live Photo companions
pub const VIDEO_EXTENSIONS: &[&str] = &["mov"];

/// Timestamp pattern exiftool emits for DateTimeOriginal with `-n`
const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Role a record plays inside a Live Photo pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaRole {
    /// The still image half
    Image,
    /// The companion video half
    Video,
}

/// One physical file's extracted metadata facts
#[derive(Debug, Clone)]
pub struct MediaRecord {
    /// Absolute path to the file
    pub path: PathBuf,

    /// Lowercase extension without the dot
    pub extension: String,

    /// ContentIdentifier UUID shared by both halves of a pair
    pub identifier: String,

    /// Whether the LivePhotoVideoIndex maker-note field was present
    pub has_video_index: bool,

    /// Capture timestamp, if present and parseable
    pub captured_at: Option<NaiveDateTime>,

    /// Device model string (e.g. "iPhone 15 Pro")
    pub device_model: Option<String>,

    /// GPS coordinates, retained for audit only
    pub gps: Option<(f64, f64)>,

    /// User description, retained for audit only
    pub description: Option<String>,

    /// MIME type, retained for audit only
    pub mime_type: Option<String>,
}

impl MediaRecord {
    /// Build a record from one exiftool output entry.
    ///
    /// Returns `None` when the entry lacks a source path or a
    /// ContentIdentifier; such files can never participate in matching.
    pub fn from_raw(raw: &RawMetadata) -> Option<Self> {
        let source = raw.source_file.as_deref()?;
        if source.is_empty() {
            return None;
        }
        let identifier = raw.content_identifier.clone()?;
        if identifier.is_empty() {
            return None;
        }

        let path = PathBuf::from(source);
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let captured_at = raw
            .date_time_original
            .as_deref()
            .and_then(parse_exif_datetime);

        let gps = match (raw.gps_latitude, raw.gps_longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        };

        Some(Self {
            path,
            extension,
            identifier,
            has_video_index: raw.live_photo_video_index.is_some(),
            captured_at,
            device_model: raw.model.clone().filter(|m| !m.is_empty()),
            gps,
            description: raw.description.clone(),
            mime_type: raw.mime_type.clone(),
        })
    }

    /// Classify this record's role, if it has one.
    ///
    /// Records that are neither a marked still nor a candidate companion
    /// video return `None` and are dropped from indexing.
    pub fn role(&self) -> Option<MediaRole> {
        let ext = self.extension.as_str();
        if IMAGE_EXTENSIONS.contains(&ext) && self.has_video_index {
            Some(MediaRole::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Some(MediaRole::Video)
        } else {
            None
        }
    }
}

/// Parse exiftool's fixed "YYYY:MM:DD HH:MM:SS" timestamp format.
///
/// Returns `None` on any parse failure; the namer substitutes a sentinel.
pub fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), EXIF_DATETIME_FORMAT).ok()
}

//! Deterministic, sortable pair naming
//!
//! Both halves of a matched pair receive the same base name so downstream
//! re-import tooling (Apple Photos) can recognize them as a Live Photo
//! again. Format: `YYYY-MM-DD_HHMMSS_LivePhoto_<Model>_<ID8>`.

use crate::core::record::MediaRecord;
use std::path::{Path, PathBuf};

/// Substituted when the capture timestamp is missing or unparseable
const DATE_SENTINEL: &str = "0000-00-00_000000";

/// Substituted when the device model is missing or empty after stripping
const MODEL_FALLBACK: &str = "iPhone";

/// Build the shared base name (no extension) for a matched pair.
///
/// Derived from the image half's record: capture date, device model with
/// spaces and commas stripped, and the first 8 hex characters of the
/// identifier (separators removed, uppercased).
pub fn base_name(record: &MediaRecord) -> String {
    let date_str = match record.captured_at {
        Some(ts) => ts.format("%Y-%m-%d_%H%M%S").to_string(),
        None => DATE_SENTINEL.to_string(),
    };

    let model: String = record
        .device_model
        .as_deref()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    let model = if model.is_empty() {
        MODEL_FALLBACK.to_string()
    } else {
        model
    };

    let id8: String = record
        .identifier
        .chars()
        .filter(|c| *c != '-')
        .take(8)
        .collect::<String>()
        .to_uppercase();

    format!("{}_LivePhoto_{}_{}", date_str, model, id8)
}

/// Return a destination path for `base` + `ext` that does not collide.
///
/// If `<base><ext>` already exists, a zero-padded two-digit counter is
/// appended before the extension (`_01`, `_02`, ...) until a free name is
/// found. The check runs per extension, so the image and video halves of a
/// pair each resolve their own suffix against files of their own type.
pub fn available_dest_path(dest_dir: &Path, base: &str, ext: &str) -> PathBuf {
    let mut candidate = dest_dir.join(format!("{}{}", base, ext));
    let mut counter = 1;
    while candidate.exists() {
        candidate = dest_dir.join(format!("{}_{:02}{}", base, counter, ext));
        counter += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::parse_exif_datetime;
    use std::fs::File;
    use tempfile::TempDir;

    fn image_record(uuid: &str, date: Option<&str>, model: Option<&str>) -> MediaRecord {
        MediaRecord {
            path: PathBuf::from("/photos/IMG_0001.HEIC"),
            extension: "heic".to_string(),
            identifier: uuid.to_string(),
            has_video_index: true,
            captured_at: date.and_then(parse_exif_datetime),
            device_model: model.map(|m| m.to_string()),
            gps: None,
            description: None,
            mime_type: None,
        }
    }

    #[test]
    fn test_base_name_full() {
        let rec = image_record(
            "ABCD1234-5678-90AB-CDEF-112233445566",
            Some("2024:03:01 10:15:22"),
            Some("iPhone 15 Pro"),
        );
        assert_eq!(
            base_name(&rec),
            "2024-03-01_101522_LivePhoto_iPhone15Pro_ABCD1234"
        );
    }

    #[test]
    fn test_base_name_date_sentinel() {
        let rec = image_record("ABCD1234-5678", None, Some("iPhone 12"));
        assert_eq!(
            base_name(&rec),
            "0000-00-00_000000_LivePhoto_iPhone12_ABCD1234"
        );
    }

    #[test]
    fn test_base_name_model_fallback() {
        let rec = image_record("ABCD1234-5678", Some("2024:03:01 10:15:22"), None);
        assert!(base_name(&rec).contains("_LivePhoto_iPhone_"));

        // Whitespace-and-comma-only model also falls back
        let rec = image_record("ABCD1234-5678", Some("2024:03:01 10:15:22"), Some(" , "));
        assert!(base_name(&rec).contains("_LivePhoto_iPhone_"));
    }

    #[test]
    fn test_base_name_id8_uppercased_and_stripped() {
        let rec = image_record("ab-cd-12-34-extra", Some("2024:03:01 10:15:22"), Some("X"));
        assert!(base_name(&rec).ends_with("_ABCD1234"));
    }

    #[test]
    fn test_dest_path_no_collision() {
        let dir = TempDir::new().unwrap();
        let path = available_dest_path(dir.path(), "base", ".heic");
        assert_eq!(path, dir.path().join("base.heic"));
    }

    #[test]
    fn test_dest_path_counter_suffix() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("base.heic")).unwrap();
        let path = available_dest_path(dir.path(), "base", ".heic");
        assert_eq!(path, dir.path().join("base_01.heic"));

        File::create(&path).unwrap();
        let path = available_dest_path(dir.path(), "base", ".heic");
        assert_eq!(path, dir.path().join("base_02.heic"));
    }

    #[test]
    fn test_dest_path_collisions_independent_per_extension() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("base.heic")).unwrap();

        // The video half still gets the unsuffixed name
        let mov = available_dest_path(dir.path(), "base", ".mov");
        assert_eq!(mov, dir.path().join("base.mov"));
    }
}

//! Identifier indexes, cross-source merging, and pair matching
//!
//! Each source directory yields one [`SourceIndexes`] pair (images and
//! videos keyed by ContentIdentifier). Index insertion is first-seen-wins:
//! a later file carrying an already-seen identifier is silently dropped,
//! within a batch and across batches alike. The same rule applies when
//! per-source indexes are merged into the global pair, with sources taking
//! priority in the order the caller scanned them.

use crate::core::record::{MediaRecord, MediaRole};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

/// Mapping from ContentIdentifier to exactly one record of a given role
pub type IdentifierIndex = HashMap<String, MediaRecord>;

/// The (images, videos) index pair produced by scanning one source
#[derive(Debug, Default)]
pub struct SourceIndexes {
    /// Live Photo stills by identifier
    pub images: IdentifierIndex,

    /// Companion videos by identifier
    pub videos: IdentifierIndex,
}

impl SourceIndexes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify and insert one batch of records, first occurrence winning.
    ///
    /// Records without a role (wrong extension, or an image lacking the
    /// video-index marker) are dropped here.
    pub fn insert_batch(&mut self, records: impl IntoIterator<Item = MediaRecord>) {
        for record in records {
            match record.role() {
                Some(MediaRole::Image) => {
                    self.images
                        .entry(record.identifier.clone())
                        .or_insert(record);
                }
                Some(MediaRole::Video) => {
                    self.videos
                        .entry(record.identifier.clone())
                        .or_insert(record);
                }
                None => {}
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.videos.is_empty()
    }
}

/// Per-source contribution recorded while merging, for logging only
#[derive(Debug, Clone)]
pub struct MergeStats {
    /// Source directory this contribution came from
    pub source: PathBuf,

    /// Images whose identifier was not yet known
    pub new_images: usize,

    /// Videos whose identifier was not yet known
    pub new_videos: usize,

    /// Running totals after this source was merged
    pub total_images: usize,
    pub total_videos: usize,
}

/// Merge per-source index pairs into one global pair.
///
/// Sources are folded in the given order; on identifier collision the
/// earlier source wins. The returned stats have no effect on correctness.
pub fn merge_sources(
    sources: Vec<(PathBuf, SourceIndexes)>,
) -> (SourceIndexes, Vec<MergeStats>) {
    let mut global = SourceIndexes::new();
    let mut stats = Vec::with_capacity(sources.len());

    for (source, indexes) in sources {
        let mut new_images = 0;
        let mut new_videos = 0;

        for (uuid, record) in indexes.images {
            if let std::collections::hash_map::Entry::Vacant(e) = global.images.entry(uuid) {
                e.insert(record);
                new_images += 1;
            }
        }
        for (uuid, record) in indexes.videos {
            if let std::collections::hash_map::Entry::Vacant(e) = global.videos.entry(uuid) {
                e.insert(record);
                new_videos += 1;
            }
        }

        stats.push(MergeStats {
            source,
            new_images,
            new_videos,
            total_images: global.images.len(),
            total_videos: global.videos.len(),
        });
    }

    (global, stats)
}

/// Matched and orphan identifier sets computed from the global indexes
///
/// All three lists are lexicographically sorted so repeated runs over the
/// same inputs produce identical logs and manifests.
#[derive(Debug, Default)]
pub struct MatchReport {
    /// Identifiers present in both indexes
    pub matched: Vec<String>,

    /// Identifiers with a still but no companion video
    pub orphan_images: Vec<String>,

    /// Identifiers with a companion video but no still
    pub orphan_videos: Vec<String>,
}

impl MatchReport {
    /// Pure set algebra over the index key sets.
    pub fn compute(indexes: &SourceIndexes) -> Self {
        let image_ids: BTreeSet<&String> = indexes.images.keys().collect();
        let video_ids: BTreeSet<&String> = indexes.videos.keys().collect();

        let matched = image_ids
            .intersection(&video_ids)
            .map(|s| s.to_string())
            .collect();
        let orphan_images = image_ids
            .difference(&video_ids)
            .map(|s| s.to_string())
            .collect();
        let orphan_videos = video_ids
            .difference(&image_ids)
            .map(|s| s.to_string())
            .collect();

        Self {
            matched,
            orphan_images,
            orphan_videos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn record(path: &str, uuid: &str, video_index: bool) -> MediaRecord {
        let path = PathBuf::from(path);
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        MediaRecord {
            path,
            extension,
            identifier: uuid.to_string(),
            has_video_index: video_index,
            captured_at: None,
            device_model: None,
            gps: None,
            description: None,
            mime_type: None,
        }
    }

    #[test]
    fn test_insert_batch_first_seen_wins() {
        let mut idx = SourceIndexes::new();
        idx.insert_batch(vec![
            record("/a/first.heic", "UUID-1", true),
            record("/a/second.heic", "UUID-1", true),
        ]);
        assert_eq!(idx.images.len(), 1);
        assert_eq!(idx.images["UUID-1"].path, Path::new("/a/first.heic"));
    }

    #[test]
    fn test_insert_batch_routes_roles() {
        let mut idx = SourceIndexes::new();
        idx.insert_batch(vec![
            record("/a/img.heic", "UUID-1", true),
            record("/a/img.mov", "UUID-1", false),
            // unmarked image: dropped entirely
            record("/a/plain.jpg", "UUID-2", false),
        ]);
        assert_eq!(idx.images.len(), 1);
        assert_eq!(idx.videos.len(), 1);
        assert!(!idx.images.contains_key("UUID-2"));
    }

    #[test]
    fn test_merge_earlier_source_wins() {
        let mut a = SourceIndexes::new();
        a.insert_batch(vec![record("/a/img.heic", "SHARED", true)]);
        let mut b = SourceIndexes::new();
        b.insert_batch(vec![
            record("/b/img.heic", "SHARED", true),
            record("/b/only.mov", "B-ONLY", false),
        ]);

        let (global, stats) = merge_sources(vec![
            (PathBuf::from("/a"), a),
            (PathBuf::from("/b"), b),
        ]);

        assert_eq!(global.images["SHARED"].path, Path::new("/a/img.heic"));
        assert_eq!(stats[0].new_images, 1);
        assert_eq!(stats[1].new_images, 0);
        assert_eq!(stats[1].new_videos, 1);
        assert_eq!(stats[1].total_images, 1);
        assert_eq!(stats[1].total_videos, 1);
    }

    #[test]
    fn test_match_report_set_algebra() {
        let mut idx = SourceIndexes::new();
        idx.insert_batch(vec![
            record("/s/a.heic", "A", true),
            record("/s/a.mov", "A", false),
            record("/s/b.heic", "B", true),
            record("/s/c.mov", "C", false),
        ]);

        let report = MatchReport::compute(&idx);
        assert_eq!(report.matched, vec!["A".to_string()]);
        assert_eq!(report.orphan_images, vec!["B".to_string()]);
        assert_eq!(report.orphan_videos, vec!["C".to_string()]);

        // matched ∪ orphan_images reconstructs the image key set
        let mut reconstructed: Vec<&String> =
            report.matched.iter().chain(&report.orphan_images).collect();
        reconstructed.sort();
        let mut image_ids: Vec<&String> = idx.images.keys().collect();
        image_ids.sort();
        assert_eq!(reconstructed, image_ids);
    }

    #[test]
    fn test_match_report_is_sorted() {
        let mut idx = SourceIndexes::new();
        for uuid in ["ZZ", "AA", "MM"] {
            idx.insert_batch(vec![
                record("/s/x.heic", uuid, true),
                record("/s/x.mov", uuid, false),
            ]);
        }
        let report = MatchReport::compute(&idx);
        assert_eq!(report.matched, vec!["AA", "MM", "ZZ"]);
    }
}

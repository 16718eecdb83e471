//! Run orchestration
//!
//! One run is a single sequential pass: scan every source (batched exiftool
//! calls), merge per-source indexes first-seen-wins, compute matched and
//! orphan sets, then relocate each matched pair with copy-verify-delete and
//! write the audit manifest. Dry-run stops after reporting what would move.
//!
//! All mutable state is owned here and passed down explicitly; the only
//! shared state is the cooperative shutdown flag, checked between metadata
//! batches and between pairs — never mid-copy or mid-hash, so an
//! interrupted run can never leave a half-verified move behind.

use crate::core::error::{Result, SortError};
use crate::core::index::{merge_sources, MatchReport, SourceIndexes};
use crate::core::manifest::{Manifest, OrphanEntry, PairEntry, RoleEntry};
use crate::core::naming::{available_dest_path, base_name};
use crate::core::record::MediaRecord;
use crate::core::relocate::verified_move;
use crate::exif::ExifBatchReader;
use crate::scan::collect_candidate_files;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Resolved settings for one run (config plus CLI overrides)
#[derive(Debug, Clone)]
pub struct SortOptions {
    /// Ordered source roots; earlier roots win identifier collisions
    pub sources: Vec<PathBuf>,

    /// Destination directory for matched pairs and the manifest
    pub dest_dir: PathBuf,

    /// Files per exiftool batch
    pub batch_size: usize,

    /// Scan, match and report only; no filesystem mutation, no manifest
    pub dry_run: bool,
}

/// Summary of one run
#[derive(Debug, Default)]
pub struct RunStats {
    /// Candidate files enumerated across all sources
    pub candidates_scanned: usize,

    /// Metadata batches that contributed nothing due to tool failure
    pub batches_lost: usize,

    /// Pairs where both halves moved and verified
    pub pairs_moved: usize,

    /// Pairs where at least one half failed
    pub pairs_failed: usize,

    /// Stills without a companion video
    pub orphan_images: usize,

    /// Videos without a still
    pub orphan_videos: usize,

    /// Whether a shutdown request cut the run short
    pub interrupted: bool,
}

/// One sorting run: owns the options, the batch reader, and the shutdown
/// flag. No ambient state.
pub struct SortRun {
    options: SortOptions,
    reader: ExifBatchReader,
    shutdown: Arc<AtomicBool>,
}

impl SortRun {
    pub fn new(options: SortOptions, reader: ExifBatchReader, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            options,
            reader,
            shutdown,
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Execute the full pipeline and return run statistics.
    pub fn execute(&self) -> Result<RunStats> {
        let mut stats = RunStats::default();

        // Scan all sources, one index pair each
        let mut per_source: Vec<(PathBuf, SourceIndexes)> = Vec::new();
        for root in &self.options.sources {
            if self.shutdown_requested() {
                warn!("Shutdown requested, skipping remaining sources");
                stats.interrupted = true;
                break;
            }
            let indexes = self.scan_source(root, &mut stats);
            per_source.push((root.clone(), indexes));
        }

        // Merge across sources, first-seen-wins
        let (global, merge_stats) = merge_sources(per_source);
        for ms in &merge_stats {
            info!(
                "After merging {}: +{} images, +{} videos (totals: {} images, {} videos)",
                ms.source.display(),
                ms.new_images,
                ms.new_videos,
                ms.total_images,
                ms.total_videos
            );
        }

        let report = MatchReport::compute(&global);
        stats.orphan_images = report.orphan_images.len();
        stats.orphan_videos = report.orphan_videos.len();

        info!(
            "RESULTS: {} matched pairs | {} orphan images | {} orphan videos",
            report.matched.len(),
            report.orphan_images.len(),
            report.orphan_videos.len()
        );

        if self.options.dry_run {
            self.report_dry_run(&global, &report);
            return Ok(stats);
        }

        std::fs::create_dir_all(&self.options.dest_dir).map_err(|e| {
            SortError::DestinationError {
                path: self.options.dest_dir.clone(),
                message: e.to_string(),
            }
        })?;

        let mut manifest = Manifest::new(&self.options.dest_dir);
        self.relocate_pairs(&global, &report, &mut manifest, &mut stats);
        append_orphans(&mut manifest, &global, &report);

        match manifest.write() {
            Ok(path) => info!("Manifest written to {}", path.display()),
            // Data safety over audit completeness: moves already verified
            Err(e) => error!("Could not write manifest: {}", e),
        }

        info!(
            "DONE: {} pairs moved OK | {} failed | {} orphan images | {} orphan videos",
            stats.pairs_moved, stats.pairs_failed, stats.orphan_images, stats.orphan_videos
        );

        Ok(stats)
    }

    /// Scan one source root into an index pair, batch by batch.
    fn scan_source(&self, root: &Path, stats: &mut RunStats) -> SourceIndexes {
        let mut indexes = SourceIndexes::new();

        let candidates = collect_candidate_files(root);
        if candidates.is_empty() {
            info!("No candidate files found in {}", root.display());
            return indexes;
        }

        info!(
            "Scanning {} — {} candidate files...",
            root.display(),
            candidates.len()
        );

        let batch_size = self.options.batch_size.max(1);
        let total_batches = candidates.len().div_ceil(batch_size);

        for (batch_num, batch) in candidates.chunks(batch_size).enumerate() {
            if self.shutdown_requested() {
                warn!("Shutdown requested, scan of {} interrupted", root.display());
                stats.interrupted = true;
                break;
            }

            info!(
                "  Batch {}/{} ({} files)...",
                batch_num + 1,
                total_batches,
                batch.len()
            );

            match self.reader.read_batch(batch) {
                Ok(records) => {
                    indexes.insert_batch(records.iter().filter_map(MediaRecord::from_raw));
                }
                Err(e) => {
                    // The batch contributes nothing; later batches still run
                    error!("Metadata batch lost ({} files): {}", batch.len(), e);
                    stats.batches_lost += 1;
                }
            }
        }

        stats.candidates_scanned += candidates.len();
        info!(
            "Scan complete in {}: {} LP images, {} companion videos found",
            root.display(),
            indexes.images.len(),
            indexes.videos.len()
        );
        indexes
    }

    /// Move every matched pair, both halves independently verified.
    fn relocate_pairs(
        &self,
        global: &SourceIndexes,
        report: &MatchReport,
        manifest: &mut Manifest,
        stats: &mut RunStats,
    ) {
        if report.matched.is_empty() {
            return;
        }

        let progress = ProgressBar::new(report.matched.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress template")
                .progress_chars("#>-"),
        );

        for (i, uuid) in report.matched.iter().enumerate() {
            if self.shutdown_requested() {
                warn!(
                    "Shutdown requested at pair {}/{} — stopping",
                    i,
                    report.matched.len()
                );
                stats.interrupted = true;
                break;
            }

            progress.set_position(i as u64);

            // Matched identifiers exist in both indexes by construction
            let image = &global.images[uuid];
            let video = &global.videos[uuid];

            let base = base_name(image);
            progress.set_message(base.clone());

            let image_ext = format!(".{}", image.extension);
            let video_ext = format!(".{}", video.extension);
            let dest_image = available_dest_path(&self.options.dest_dir, &base, &image_ext);
            let dest_video = available_dest_path(&self.options.dest_dir, &base, &video_ext);

            info!(
                "[{}/{}] Moving pair -> {}",
                i + 1,
                report.matched.len(),
                base
            );

            let image_ok = self.move_half("image", &image.path, &dest_image, &progress);
            let video_ok = self.move_half("video", &video.path, &dest_video, &progress);

            manifest.pairs.push(PairEntry {
                uuid: uuid.clone(),
                base_name: base,
                image: RoleEntry {
                    source: image.path.clone(),
                    dest: dest_image,
                    success: image_ok,
                },
                video: RoleEntry {
                    source: video.path.clone(),
                    dest: dest_video,
                    success: video_ok,
                },
            });

            if image_ok && video_ok {
                stats.pairs_moved += 1;
            } else {
                stats.pairs_failed += 1;
            }
        }

        progress.finish_and_clear();
    }

    /// Relocate one half of a pair; failure is isolated to this file.
    fn move_half(&self, role: &str, src: &Path, dst: &Path, progress: &ProgressBar) -> bool {
        match verified_move(src, dst) {
            Ok(()) => true,
            Err(e) => {
                progress.suspend(|| {
                    error!("{} move failed {} -> {}: {}", role, src.display(), dst.display(), e);
                });
                false
            }
        }
    }

    /// Log what a real run would do, mutating nothing.
    fn report_dry_run(&self, global: &SourceIndexes, report: &MatchReport) {
        for uuid in &report.matched {
            let image = &global.images[uuid];
            let video = &global.videos[uuid];
            let base = base_name(image);
            info!("[DRY RUN PAIR] {}.{} + {}.{}", base, image.extension, base, video.extension);
            info!("  IMG src: {}", image.path.display());
            info!("  VID src: {}", video.path.display());
        }
        for uuid in &report.orphan_images {
            let rec = &global.images[uuid];
            info!("[DRY RUN ORPHAN IMG] {} [uuid={}]", rec.path.display(), short_uuid(uuid));
        }
        for uuid in &report.orphan_videos {
            let rec = &global.videos[uuid];
            info!("[DRY RUN ORPHAN VID] {} [uuid={}]", rec.path.display(), short_uuid(uuid));
        }
    }
}

/// Record orphans in the manifest (and the log, one warning each).
fn append_orphans(manifest: &mut Manifest, global: &SourceIndexes, report: &MatchReport) {
    for uuid in &report.orphan_images {
        let rec = &global.images[uuid];
        warn!(
            "[ORPHAN IMG] No matching video: {} [uuid={}]",
            rec.path.display(),
            short_uuid(uuid)
        );
        manifest.orphan_images.push(OrphanEntry {
            uuid: uuid.clone(),
            path: rec.path.clone(),
        });
    }
    for uuid in &report.orphan_videos {
        let rec = &global.videos[uuid];
        warn!(
            "[ORPHAN VID] No matching image: {} [uuid={}]",
            rec.path.display(),
            short_uuid(uuid)
        );
        manifest.orphan_videos.push(OrphanEntry {
            uuid: uuid.clone(),
            path: rec.path.clone(),
        });
    }
}

// Identifiers are opaque strings, so truncate by character, not byte
fn short_uuid(uuid: &str) -> String {
    uuid.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::MANIFEST_FILE_NAME;
    use crate::core::record::parse_exif_datetime;
    use crate::exif::reader::DEFAULT_TIMEOUT;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn record(path: &Path, uuid: &str, video_index: bool) -> MediaRecord {
        MediaRecord {
            path: path.to_path_buf(),
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase())
                .unwrap_or_default(),
            identifier: uuid.to_string(),
            has_video_index: video_index,
            captured_at: parse_exif_datetime("2024:03:01 10:15:22"),
            device_model: Some("iPhone 15 Pro".to_string()),
            gps: None,
            description: None,
            mime_type: None,
        }
    }

    fn write_file(path: &Path, contents: &[u8]) {
        File::create(path).unwrap().write_all(contents).unwrap();
    }

    fn test_run(dest: &Path, dry_run: bool) -> SortRun {
        SortRun::new(
            SortOptions {
                sources: Vec::new(),
                dest_dir: dest.to_path_buf(),
                batch_size: 500,
                dry_run,
            },
            ExifBatchReader::default(),
            Arc::new(AtomicBool::new(false)),
        )
    }

    /// Build a global index over real files for one matched pair plus one
    /// orphan of each role.
    fn fixture(src_dir: &Path) -> (SourceIndexes, MatchReport) {
        let img = src_dir.join("IMG_0001.heic");
        let vid = src_dir.join("IMG_0001.mov");
        let orphan_img = src_dir.join("IMG_0002.heic");
        let orphan_vid = src_dir.join("IMG_0003.mov");
        write_file(&img, b"image-bytes");
        write_file(&vid, b"video-bytes");
        write_file(&orphan_img, b"lonely-image");
        write_file(&orphan_vid, b"lonely-video");

        let mut global = SourceIndexes::new();
        global.insert_batch(vec![
            record(&img, "ABCD1234-5678-90AB-CDEF-112233445566", true),
            record(&vid, "ABCD1234-5678-90AB-CDEF-112233445566", false),
            record(&orphan_img, "IMG-ONLY-0000", true),
            record(&orphan_vid, "VID-ONLY-0000", false),
        ]);
        let report = MatchReport::compute(&global);
        (global, report)
    }

    #[test]
    fn test_relocate_pairs_moves_both_halves_same_base() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let (global, report) = fixture(src.path());

        let run = test_run(dest.path(), false);
        let mut manifest = Manifest::new(dest.path());
        let mut stats = RunStats::default();
        run.relocate_pairs(&global, &report, &mut manifest, &mut stats);

        assert_eq!(stats.pairs_moved, 1);
        assert_eq!(stats.pairs_failed, 0);

        let expected = "2024-03-01_101522_LivePhoto_iPhone15Pro_ABCD1234";
        assert!(dest.path().join(format!("{}.heic", expected)).exists());
        assert!(dest.path().join(format!("{}.mov", expected)).exists());

        // Sources of the matched pair are gone, orphans untouched
        assert!(!src.path().join("IMG_0001.heic").exists());
        assert!(!src.path().join("IMG_0001.mov").exists());
        assert!(src.path().join("IMG_0002.heic").exists());
        assert!(src.path().join("IMG_0003.mov").exists());

        // Manifest pair entry has one shared base and two successes
        assert_eq!(manifest.pairs.len(), 1);
        let pair = &manifest.pairs[0];
        assert_eq!(pair.base_name, expected);
        assert!(pair.image.success && pair.video.success);
    }

    #[test]
    fn test_half_failure_is_isolated() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let (mut global, report) = fixture(src.path());

        // Sabotage the video half: its source file vanishes before the run
        let vid_path = src.path().join("IMG_0001.mov");
        fs::remove_file(&vid_path).unwrap();
        global
            .videos
            .get_mut("ABCD1234-5678-90AB-CDEF-112233445566")
            .unwrap()
            .path = vid_path.clone();

        let run = test_run(dest.path(), false);
        let mut manifest = Manifest::new(dest.path());
        let mut stats = RunStats::default();
        run.relocate_pairs(&global, &report, &mut manifest, &mut stats);

        assert_eq!(stats.pairs_moved, 0);
        assert_eq!(stats.pairs_failed, 1);

        let pair = &manifest.pairs[0];
        assert!(pair.image.success);
        assert!(!pair.video.success);

        // The image half still moved; its source is deleted
        assert!(pair.image.dest.exists());
        assert!(!src.path().join("IMG_0001.heic").exists());
    }

    #[test]
    fn test_collision_gets_counter_suffix() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let (global, report) = fixture(src.path());

        let base = "2024-03-01_101522_LivePhoto_iPhone15Pro_ABCD1234";
        write_file(&dest.path().join(format!("{}.heic", base)), b"earlier run");

        let run = test_run(dest.path(), false);
        let mut manifest = Manifest::new(dest.path());
        let mut stats = RunStats::default();
        run.relocate_pairs(&global, &report, &mut manifest, &mut stats);

        assert!(dest.path().join(format!("{}_01.heic", base)).exists());
        // Video had no collision, so it keeps the unsuffixed name
        assert!(dest.path().join(format!("{}.mov", base)).exists());
    }

    #[test]
    fn test_short_uuid_truncates_by_character() {
        assert_eq!(short_uuid("ABCD1234-5678-90AB"), "ABCD1234");
        assert_eq!(short_uuid("ab"), "ab");
        // A multi-byte character at the cut must not split
        assert_eq!(short_uuid("aaaaaaaé-extra"), "aaaaaaaé");
    }

    #[test]
    fn test_append_orphans_tolerates_multibyte_identifiers() {
        let mut global = SourceIndexes::new();
        global.insert_batch(vec![record(
            Path::new("/s/weird.heic"),
            "aaaaaaaé-0000",
            true,
        )]);
        let report = MatchReport::compute(&global);

        let mut manifest = Manifest::new(Path::new("/dest"));
        append_orphans(&mut manifest, &global, &report);
        assert_eq!(manifest.orphan_images[0].uuid, "aaaaaaaé-0000");
    }

    #[test]
    fn test_append_orphans() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let (global, report) = fixture(src.path());

        let mut manifest = Manifest::new(dest.path());
        append_orphans(&mut manifest, &global, &report);

        assert_eq!(manifest.orphan_images.len(), 1);
        assert_eq!(manifest.orphan_images[0].uuid, "IMG-ONLY-0000");
        assert_eq!(manifest.orphan_videos.len(), 1);
        assert_eq!(manifest.orphan_videos[0].uuid, "VID-ONLY-0000");
    }

    #[test]
    fn test_shutdown_stops_between_pairs() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let (global, report) = fixture(src.path());

        let shutdown = Arc::new(AtomicBool::new(true));
        let run = SortRun::new(
            SortOptions {
                sources: Vec::new(),
                dest_dir: dest.path().to_path_buf(),
                batch_size: 500,
                dry_run: false,
            },
            ExifBatchReader::default(),
            shutdown,
        );

        let mut manifest = Manifest::new(dest.path());
        let mut stats = RunStats::default();
        run.relocate_pairs(&global, &report, &mut manifest, &mut stats);

        assert!(stats.interrupted);
        assert_eq!(stats.pairs_moved + stats.pairs_failed, 0);
        assert!(src.path().join("IMG_0001.heic").exists());
    }

    #[test]
    fn test_dry_run_mutates_nothing() {
        let src = TempDir::new().unwrap();
        let dest_parent = TempDir::new().unwrap();
        let dest = dest_parent.path().join("pairs");
        write_file(&src.path().join("IMG_0001.heic"), b"image");

        // A reader pointed at a non-JSON producer loses the batch; the run
        // still completes and, in dry-run, touches nothing.
        let run = SortRun::new(
            SortOptions {
                sources: vec![src.path().to_path_buf()],
                dest_dir: dest.clone(),
                batch_size: 500,
                dry_run: true,
            },
            ExifBatchReader::new("echo", DEFAULT_TIMEOUT),
            Arc::new(AtomicBool::new(false)),
        );

        let stats = run.execute().unwrap();
        assert_eq!(stats.candidates_scanned, 1);
        assert_eq!(stats.batches_lost, 1);
        assert!(!dest.exists(), "dry-run must not create the destination");
        assert!(src.path().join("IMG_0001.heic").exists());
    }

    #[test]
    fn test_real_run_writes_manifest_even_when_empty() {
        let dest = TempDir::new().unwrap();
        let run = test_run(dest.path(), false);

        let stats = run.execute().unwrap();
        assert_eq!(stats.pairs_moved, 0);
        assert!(dest.path().join(MANIFEST_FILE_NAME).exists());
    }

    #[test]
    fn test_missing_source_root_degrades_to_empty() {
        let dest = TempDir::new().unwrap();
        let run = SortRun::new(
            SortOptions {
                sources: vec![PathBuf::from("/volume/not/mounted")],
                dest_dir: dest.path().to_path_buf(),
                batch_size: 500,
                dry_run: true,
            },
            ExifBatchReader::default(),
            Arc::new(AtomicBool::new(false)),
        );

        let stats = run.execute().unwrap();
        assert_eq!(stats.candidates_scanned, 0);
        assert_eq!(stats.batches_lost, 0);
    }
}

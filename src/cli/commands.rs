//! Command handler implementations
//!
//! This module contains the implementation of all CLI commands.

use crate::cli::progress::{format_duration, print_header, print_info, print_success, print_warning};
use crate::cli::{Args, Commands};
use crate::core::config::{get_config_path, init_config, Config};
use crate::core::pidfile::PidFile;
use crate::core::pipeline::{RunStats, SortOptions, SortRun};
use crate::exif::ExifBatchReader;
use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Run the appropriate command based on CLI arguments
pub fn run_command(args: &Args, config: &Config, shutdown_flag: Arc<AtomicBool>) -> Result<()> {
    match &args.command {
        Some(Commands::Config { path, reset }) => {
            handle_config_command(*path, *reset)?;
        }
        Some(Commands::GenerateConfig { output }) => {
            generate_config_file(output.clone())?;
        }
        Some(Commands::ShowConfig) => {
            show_config(config)?;
        }
        None => {
            run_sort(args, config, shutdown_flag)?;
        }
    }

    Ok(())
}

/// Execute the sorting pipeline with a pid-file liveness marker held for
/// the duration of the run.
fn run_sort(args: &Args, config: &Config, shutdown_flag: Arc<AtomicBool>) -> Result<()> {
    if config.sources.directories.is_empty() {
        bail!(
            "No source directories configured. Pass --source or set [sources].directories \
             in the config file (see `live-photo-sort config --path`)."
        );
    }

    let options = SortOptions {
        sources: config.sources.directories.clone(),
        dest_dir: config.output.directory.clone(),
        batch_size: config.exiftool.batch_size,
        dry_run: args.dry_run,
    };
    let reader = ExifBatchReader::new(
        config.exiftool.binary.clone(),
        Duration::from_secs(config.exiftool.timeout_secs),
    );

    info!("live_photo_sort v{} started (PID {})", env!("CARGO_PKG_VERSION"), std::process::id());
    for source in &options.sources {
        info!("Source: {}", source.display());
    }
    info!("Dest:    {}", options.dest_dir.display());
    info!("DryRun:  {}", options.dry_run);
    info!("Batch size: {} files per exiftool call", options.batch_size);

    let _pid_guard = match PidFile::create(&config.process.pid_file) {
        Ok(guard) => Some(guard),
        Err(e) => {
            // The run is more important than the marker
            warn!(
                "Could not write pid file {}: {}",
                config.process.pid_file.display(),
                e
            );
            None
        }
    };

    let started = Instant::now();
    let run = SortRun::new(options, reader, shutdown_flag);
    let stats = run.execute().context("sorting run failed")?;

    print_summary(&stats, started.elapsed(), args.dry_run);
    Ok(())
}

fn print_summary(stats: &RunStats, elapsed: std::time::Duration, dry_run: bool) {
    print_header(if dry_run {
        "Dry Run Complete"
    } else {
        "Run Complete"
    });
    print_info(&format!("Candidate files scanned: {}", stats.candidates_scanned));
    if stats.batches_lost > 0 {
        print_warning(&format!(
            "{} metadata batches lost (see log for details)",
            stats.batches_lost
        ));
    }
    if !dry_run {
        print_success(&format!("Pairs moved: {}", stats.pairs_moved));
        if stats.pairs_failed > 0 {
            print_warning(&format!("Pairs with failures: {}", stats.pairs_failed));
        }
    }
    print_info(&format!(
        "Orphans: {} images, {} videos",
        stats.orphan_images, stats.orphan_videos
    ));
    if stats.interrupted {
        print_warning("Run was interrupted by a shutdown request");
    }
    print_info(&format!("Elapsed: {}", format_duration(elapsed)));
}

/// Handle the `config` subcommand.
fn handle_config_command(show_path: bool, reset: bool) -> Result<()> {
    if reset {
        let path = get_config_path().context("could not determine config location")?;
        fs::create_dir_all(path.parent().context("config path has no parent")?)?;
        fs::write(&path, Config::generate_default_config())?;
        print_success(&format!("Config reset to defaults: {}", path.display()));
        return Ok(());
    }

    let path = init_config().context("could not initialize config file")?;
    if show_path {
        println!("{}", path.display());
    } else {
        print_info(&format!("Config file: {}", path.display()));
    }
    Ok(())
}

/// Generate a default config file at the given or standard location.
fn generate_config_file(output: Option<PathBuf>) -> Result<()> {
    let path = match output {
        Some(path) => path,
        None => get_config_path().context("could not determine config location")?,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, Config::generate_default_config())
        .with_context(|| format!("writing {}", path.display()))?;

    print_success(&format!("Config file generated: {}", path.display()));
    Ok(())
}

/// Print the effective configuration as TOML.
fn show_config(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("serializing config")?;
    println!("{}", rendered);
    Ok(())
}

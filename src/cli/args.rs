//! Command-line argument definitions
//!
//! This module defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Detect Live Photo pairs (still + companion video) by ContentIdentifier and move them together
#[derive(Parser, Debug)]
#[command(name = "live_photo_sort")]
#[command(version)]
#[command(about = "Detect and move Live Photo pairs with verified, sortable names", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Scan and report only — no files are moved, no manifest is written
    #[arg(long)]
    pub dry_run: bool,

    /// Source directories to scan (overrides config; earlier wins collisions)
    #[arg(short, long = "source", value_name = "DIR")]
    pub sources: Vec<PathBuf>,

    /// Destination directory for matched pairs (overrides config)
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// Files per exiftool batch (overrides config)
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Log level: error, warn, info, debug, trace (overrides config)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the configuration file path, or reset it to defaults
    ///
    /// The config file is stored at:
    /// - Windows: %APPDATA%\live_photo_sort\config.toml
    /// - Linux/macOS: ~/.config/live_photo_sort/config.toml
    Config {
        /// Show the config file path without touching it
        #[arg(long)]
        path: bool,

        /// Reset config to defaults (creates a fresh config file)
        #[arg(long)]
        reset: bool,
    },

    /// Generate a configuration file at a specific location
    GenerateConfig {
        /// Output path for the config file (defaults to standard location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show current configuration
    ShowConfig,
}

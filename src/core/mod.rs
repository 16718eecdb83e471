//! Core functionality module
//!
//! This module contains the core business logic for the Live Photo sorter:
//! configuration management, error handling, record classification,
//! indexing and matching, naming, verified relocation, the run manifest,
//! and the orchestration pipeline.
//!
//! # Submodules
//!
//! - `config` - Configuration loading, saving, and management
//! - `error` - Error types and result aliases
//! - `record` - Media records and Live Photo role classification
//! - `index` - Identifier indexes, merging, and pair matching
//! - `naming` - Sortable pair naming and collision avoidance
//! - `relocate` - Copy-verify-delete relocation
//! - `manifest` - Run manifest serialization
//! - `pipeline` - Run orchestration
//! - `pidfile` - Process liveness marker

pub mod config;
pub mod error;
pub mod index;
pub mod manifest;
pub mod naming;
pub mod pidfile;
pub mod pipeline;
pub mod record;
pub mod relocate;

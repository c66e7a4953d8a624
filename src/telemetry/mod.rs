//! # Telemetry Module
//!
//! Handles frame logging to JSONL files with rotation.
//!
//! This module handles:
//! - Snapshotting the transmitted frame together with mode, trim and rate
//! - Formatting as JSONL (JSON Lines)
//! - Writing to rotating log files
//! - Managing file rotation (max N records per file)
//! - Retaining only last M files

pub mod logger;

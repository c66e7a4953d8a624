//! # Frame Logger
//!
//! Appends one JSON object per line describing what was sent and why:
//!
//! ```text
//! {"timestamp":"2026-10-18T12:00:00.000Z","mode":"trim","channels":{"throttle":1500,"yaw":1500,"pitch":1500,"roll":1500},"trim":[0,5,0,0],"rate_pct":[100,100,100,100]}
//! ```
//!
//! A new file is started after `max_records_per_file` records; only the
//! newest `max_files_to_keep` files are retained.
//!
//! Records are buffered. The buffer is flushed on rotation, on
//! [`FrameLogger::flush`] and when the logger is dropped, so a control tick
//! only ever copies a line into memory.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::channels::NUM_CHANNELS;
use crate::error::{Result, TransmitterError};
use crate::link::frame::ChannelFrame;

const FILE_PREFIX: &str = "frames_";
const FILE_SUFFIX: &str = ".jsonl";

/// One logged line.
#[derive(Debug, Clone, Serialize)]
pub struct FrameRecord {
    pub timestamp: String,
    pub mode: &'static str,
    pub channels: ChannelFrame,
    pub trim: [i32; NUM_CHANNELS],
    pub rate_pct: [i32; NUM_CHANNELS],
}

impl FrameRecord {
    /// Creates a record stamped with the current UTC time.
    #[must_use]
    pub fn now(
        mode: &'static str,
        channels: ChannelFrame,
        trim: [i32; NUM_CHANNELS],
        rate_pct: [i32; NUM_CHANNELS],
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            mode,
            channels,
            trim,
            rate_pct,
        }
    }
}

/// Rotating JSONL writer.
#[derive(Debug)]
pub struct FrameLogger {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    files_created: u64,
}

impl FrameLogger {
    /// Creates the log directory (if needed) and a logger writing into it.
    ///
    /// # Errors
    ///
    /// Returns `Telemetry` error if the directory cannot be created.
    pub fn new<P: AsRef<Path>>(
        dir: P,
        max_records_per_file: usize,
        max_files_to_keep: usize,
    ) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            TransmitterError::Telemetry(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        info!("Frame log directory: {}", dir.display());

        Ok(Self {
            dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            records_in_file: 0,
            files_created: 0,
        })
    }

    /// Appends one record, rotating files as needed.
    ///
    /// # Errors
    ///
    /// Returns error if the record cannot be serialized or written.
    pub fn log(&mut self, record: &FrameRecord) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let line = serde_json::to_string(record)?;
        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}", line)?;
        }
        self.records_in_file += 1;
        Ok(())
    }

    /// Writes buffered records to the current file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Log files currently on disk, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be listed.
    pub fn log_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name().is_some_and(|name| {
                    let name = name.to_string_lossy();
                    name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX)
                })
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let path = self.dir.join(format!(
            "{}{}_{:04}{}",
            FILE_PREFIX, stamp, self.files_created, FILE_SUFFIX
        ));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                TransmitterError::Telemetry(format!("Failed to open {}: {}", path.display(), e))
            })?;
        debug!("Started frame log {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.records_in_file = 0;
        self.files_created += 1;

        self.prune()
    }

    fn prune(&self) -> Result<()> {
        let files = self.log_files()?;
        let excess = files.len().saturating_sub(self.max_files_to_keep);
        for path in files.into_iter().take(excess) {
            if let Err(e) = fs::remove_file(&path) {
                warn!("Failed to remove old frame log {}: {}", path.display(), e);
            } else {
                debug!("Removed old frame log {}", path.display());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(throttle: i16) -> FrameRecord {
        FrameRecord::now(
            "normal",
            ChannelFrame {
                throttle,
                yaw: 1500,
                pitch: 1500,
                roll: 1500,
            },
            [0, 5, 0, -5],
            [100, 100, 80, 100],
        )
    }

    #[test]
    fn test_record_json_shape() {
        let json: serde_json::Value = serde_json::to_value(record(1234)).unwrap();
        assert_eq!(json["mode"], "normal");
        assert_eq!(json["channels"]["throttle"], 1234);
        assert_eq!(json["channels"]["roll"], 1500);
        assert_eq!(json["trim"][1], 5);
        assert_eq!(json["rate_pct"][2], 80);
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_log_writes_lines() {
        let dir = TempDir::new().unwrap();
        let mut logger = FrameLogger::new(dir.path(), 100, 5).unwrap();

        logger.log(&record(1000)).unwrap();
        logger.log(&record(2000)).unwrap();
        logger.flush().unwrap();

        let files = logger.log_files().unwrap();
        assert_eq!(files.len(), 1);
        let contents = fs::read_to_string(&files[0]).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["channels"]["throttle"], 2000);
    }

    #[test]
    fn test_rotation_after_max_records() {
        let dir = TempDir::new().unwrap();
        let mut logger = FrameLogger::new(dir.path(), 3, 10).unwrap();

        for i in 0..7 {
            logger.log(&record(1000 + i)).unwrap();
        }
        logger.flush().unwrap();

        let files = logger.log_files().unwrap();
        assert_eq!(files.len(), 3);
        let counts: Vec<usize> = files
            .iter()
            .map(|f| fs::read_to_string(f).unwrap().lines().count())
            .collect();
        assert_eq!(counts, vec![3, 3, 1]);
    }

    #[test]
    fn test_retention_keeps_newest_files() {
        let dir = TempDir::new().unwrap();
        let mut logger = FrameLogger::new(dir.path(), 1, 2).unwrap();

        for i in 0..5 {
            logger.log(&record(1000 + i)).unwrap();
        }
        logger.flush().unwrap();

        let files = logger.log_files().unwrap();
        assert_eq!(files.len(), 2);
        let last = fs::read_to_string(&files[1]).unwrap();
        assert!(last.contains("1004"));
    }

    #[test]
    fn test_records_buffered_until_flush() {
        let dir = TempDir::new().unwrap();
        let mut logger = FrameLogger::new(dir.path(), 100, 5).unwrap();

        logger.log(&record(1500)).unwrap();
        let file = logger.log_files().unwrap().remove(0);
        assert_eq!(fs::read_to_string(&file).unwrap(), "");

        logger.flush().unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_drop_flushes_buffer() {
        let dir = TempDir::new().unwrap();
        let mut logger = FrameLogger::new(dir.path(), 100, 5).unwrap();
        logger.log(&record(1500)).unwrap();
        let file = logger.log_files().unwrap().remove(0);

        drop(logger);
        assert!(fs::read_to_string(&file).unwrap().contains("\"throttle\":1500"));
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let logger = FrameLogger::new(&nested, 10, 1).unwrap();
        assert!(nested.is_dir());
        assert!(logger.log_files().unwrap().is_empty());
    }

    #[test]
    fn test_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        let mut logger = FrameLogger::new(dir.path(), 1, 1).unwrap();
        logger.log(&record(1500)).unwrap();
        logger.log(&record(1500)).unwrap();

        assert!(dir.path().join("notes.txt").exists());
        assert_eq!(logger.log_files().unwrap().len(), 1);
    }
}

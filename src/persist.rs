//! Atomic JSON file writes
//!
//! Checkpoints and batch files are written to `<path>.tmp`, flushed to disk,
//! and renamed over the destination, so a crash mid-write leaves either the
//! previous file or the new one, never a truncated mix.

use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Path of the scratch file used while writing `path`
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serializes `value` as pretty JSON and atomically replaces `path`
///
/// Parent directories are created as needed.
///
/// # Arguments
///
/// * `path` - Final destination of the file
/// * `value` - Value to serialize
///
/// # Returns
///
/// * `Ok(())` - `path` now holds the complete new content
/// * `Err(io::Error)` - Directory creation, serialization, sync, or rename failed;
///   any previous file at `path` is left untouched
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    let file = File::create(&tmp)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)
}

//! Filesystem utilities.
//!
//! Documents and settings are written through a temp file and swapped into
//! place, so an interrupted save never leaves a half-written file behind.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::core::{CoreError, CoreResult};

/// Writes `bytes` to `path` atomically, creating parent directories.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let staging = sibling_path(path, "tmp");
    {
        let mut writer = BufWriter::new(File::create(&staging)?);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    swap_into_place(path, &staging)
}

/// Serializes `value` as pretty JSON and writes it atomically.
pub fn atomic_write_json_pretty<T: serde::Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    atomic_write_bytes(path, &bytes)
}

/// Reads and deserializes a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> CoreResult<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// `<name>.<suffix>` next to `path`
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("file"));
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Moves `staging` onto `dest`. The staging file never outlives a failure.
fn swap_into_place(dest: &Path, staging: &Path) -> CoreResult<()> {
    let direct = match std::fs::rename(staging, dest) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    if !dest.is_file() {
        let _ = std::fs::remove_file(staging);
        return Err(CoreError::IoError(direct));
    }

    // Some platforms refuse to rename over an existing file.
    let parked = sibling_path(dest, "bak");
    let retried = std::fs::rename(dest, &parked).and_then(|()| {
        std::fs::rename(staging, dest).inspect_err(|_| {
            let _ = std::fs::rename(&parked, dest);
        })
    });
    match retried {
        Ok(()) => {
            let _ = std::fs::remove_file(&parked);
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::remove_file(staging);
            Err(CoreError::IoError(e))
        }
    }
}

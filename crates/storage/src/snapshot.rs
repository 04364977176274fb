// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! zstd-compressed JSON snapshots written with tmp + fsync + rename.
//!
//! ```text
//! serialize → compress → write .tmp → fsync .tmp → rename → fsync dir
//! ```
//!
//! All file operations go through [`SnapshotWriter`] so tests can inject
//! failures and check the ordering of fsyncs.

use crate::state::StoreState;
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

const COMPRESSION_LEVEL: i32 = 3;

const MAX_BAK_FILES: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "v")]
    pub version: u32,
    pub state: StoreState,
    pub created_at: DateTime<Utc>,
}

pub trait SnapshotWriter: Send + Sync + 'static {
    fn write_tmp(&self, path: &Path, data: &[u8]) -> Result<(), StoreError>;

    fn fsync_file(&self, path: &Path) -> Result<(), StoreError>;

    fn rename(&self, from: &Path, to: &Path) -> Result<(), StoreError>;

    fn fsync_dir(&self, path: &Path) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsSnapshotWriter;

impl SnapshotWriter for FsSnapshotWriter {
    fn write_tmp(&self, path: &Path, data: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(data)?;
        Ok(())
    }

    fn fsync_file(&self, path: &Path) -> Result<(), StoreError> {
        File::open(path)?.sync_all()?;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), StoreError> {
        fs::rename(from, to)?;
        Ok(())
    }

    fn fsync_dir(&self, path: &Path) -> Result<(), StoreError> {
        File::open(path)?.sync_all()?;
        Ok(())
    }
}

/// Durably replace the snapshot at `path` with `state`. Returns the
/// compressed size in bytes.
pub fn write_snapshot<W: SnapshotWriter + ?Sized>(
    writer: &W,
    state: &StoreState,
    path: &Path,
) -> Result<u64, StoreError> {
    let tmp_path = path.with_extension("tmp");
    let snapshot = Snapshot {
        version: CURRENT_SNAPSHOT_VERSION,
        state: state.clone(),
        created_at: Utc::now(),
    };
    let json = serde_json::to_vec(&snapshot)?;
    let compressed = zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)
        .map_err(|e| StoreError::Compress(e.to_string()))?;

    writer.write_tmp(&tmp_path, &compressed)?;
    writer.fsync_file(&tmp_path)?;
    writer.rename(&tmp_path, path)?;
    if let Some(parent) = path.parent() {
        writer.fsync_dir(parent)?;
    }
    Ok(compressed.len() as u64)
}

/// Load the snapshot at `path`.
///
/// Returns `Ok(None)` when there is no snapshot. An unreadable snapshot is
/// moved aside to a `.bak` file and treated as absent.
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    match decode(path) {
        Ok(snapshot) => Ok(Some(snapshot)),
        Err(e) => {
            let bak_path = rotate_bak_path(path);
            warn!(
                error = %e,
                path = %path.display(),
                bak = %bak_path.display(),
                "corrupt snapshot, moving to .bak and starting fresh",
            );
            fs::rename(path, &bak_path)?;
            Ok(None)
        }
    }
}

fn decode(path: &Path) -> Result<Snapshot, StoreError> {
    let file = File::open(path)?;
    let decoder = zstd::stream::read::Decoder::new(file)
        .map_err(|e| StoreError::Compress(e.to_string()))?;
    Ok(serde_json::from_reader(decoder)?)
}

/// Pick the next `.bak` / `.bak.N` path, shifting older backups up and
/// dropping the oldest beyond [`MAX_BAK_FILES`].
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;

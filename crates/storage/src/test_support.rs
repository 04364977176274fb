// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::snapshot::SnapshotWriter;
use crate::store::StoreError;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Records I/O calls in order; writes and renames can be made to fail.
#[derive(Clone, Default)]
pub(crate) struct FakeSnapshotWriter {
    pub ops: Arc<Mutex<Vec<String>>>,
    pub fail_rename: Arc<AtomicBool>,
    pub fail_write: Arc<AtomicBool>,
}

impl FakeSnapshotWriter {
    fn record(&self, op: &str, path: &Path) {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        self.ops.lock().push(format!("{op} {name}"));
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().clone()
    }
}

impl SnapshotWriter for FakeSnapshotWriter {
    fn write_tmp(&self, path: &Path, _data: &[u8]) -> Result<(), StoreError> {
        if self.fail_write.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("disk full").into());
        }
        self.record("write", path);
        Ok(())
    }

    fn fsync_file(&self, path: &Path) -> Result<(), StoreError> {
        self.record("fsync", path);
        Ok(())
    }

    fn rename(&self, from: &Path, _to: &Path) -> Result<(), StoreError> {
        if self.fail_rename.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("rename failed").into());
        }
        self.record("rename", from);
        Ok(())
    }

    fn fsync_dir(&self, path: &Path) -> Result<(), StoreError> {
        self.record("fsync_dir", path);
        Ok(())
    }
}

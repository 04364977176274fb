// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cv-storage: persistence of workflow task records
//!
//! The engine talks to a [`TaskStore`]. Two implementations exist: an
//! in-memory store for tests and single-shot runs, and a file store that
//! keeps a zstd-compressed snapshot of every record on disk.

mod file;
mod memory;
mod snapshot;
mod state;
mod store;

#[cfg(test)]
mod test_support;

pub use file::FileTaskStore;
pub use memory::MemoryTaskStore;
pub use snapshot::{
    load_snapshot, write_snapshot, FsSnapshotWriter, Snapshot, SnapshotWriter,
    CURRENT_SNAPSHOT_VERSION,
};
pub use state::StoreState;
pub use store::{StoreError, TaskStore};

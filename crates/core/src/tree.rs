// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File tree abstraction mounted into a namespace.

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

use crate::{Chan, Dir, Error};

/// Offset for [`Tree::put`] meaning "append at the end".
pub const APPEND: i64 = -1;

/// A hierarchical file tree.
///
/// Paths handed to a tree are rooted at the tree itself (`"/"` is its root)
/// and already cleaned. Returned [`Dir`]s carry `path` relative to the same
/// root; the namespace rebases them onto the mount point.
#[async_trait]
pub trait Tree: Send + Sync + fmt::Debug {
    /// Name used in debug output and mount listings.
    fn name(&self) -> &str;

    async fn stat(&self, path: &str) -> Result<Dir, Error>;

    /// Entries of a directory, sorted by name.
    async fn read_dir(&self, path: &str) -> Result<Vec<Dir>, Error>;

    /// Stream `count` bytes (all when `None`) starting at `off` as `Bytes`
    /// messages on `out`. The caller closes `out`.
    async fn get(&self, path: &str, off: u64, count: Option<u64>, out: &Chan)
        -> Result<(), Error>;

    /// Write the `Bytes` messages received from `data` at `off` ([`APPEND`]
    /// appends; `0` truncates). `dir` may carry a `mode` for created files.
    /// Returns the resulting metadata.
    async fn put(&self, path: &str, dir: &Dir, off: i64, data: &Chan) -> Result<Dir, Error>;

    async fn mkdir(&self, path: &str, dir: &Dir) -> Result<(), Error>;

    async fn remove(&self, path: &str) -> Result<(), Error>;

    async fn rename(&self, from: &str, to: &str) -> Result<(), Error>;

    /// Host file system path backing `path`, for trees that have one.
    fn host_path(&self, _path: &str) -> Option<PathBuf> {
        None
    }
}

#[async_trait]
impl<T: Tree + ?Sized> Tree for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn stat(&self, path: &str) -> Result<Dir, Error> {
        (**self).stat(path).await
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<Dir>, Error> {
        (**self).read_dir(path).await
    }

    async fn get(&self, path: &str, off: u64, count: Option<u64>, out: &Chan)
        -> Result<(), Error> {
        (**self).get(path, off, count, out).await
    }

    async fn put(&self, path: &str, dir: &Dir, off: i64, data: &Chan) -> Result<Dir, Error> {
        (**self).put(path, dir, off, data).await
    }

    async fn mkdir(&self, path: &str, dir: &Dir) -> Result<(), Error> {
        (**self).mkdir(path, dir).await
    }

    async fn remove(&self, path: &str) -> Result<(), Error> {
        (**self).remove(path).await
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), Error> {
        (**self).rename(from, to).await
    }

    fn host_path(&self, path: &str) -> Option<PathBuf> {
        (**self).host_path(path)
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced tree wrapper for namespace debugging

use async_trait::async_trait;
use ql_core::{Chan, Dir, Error, Tree};
use std::path::PathBuf;
use tracing::Instrument;

/// Wrapper that adds tracing to any [`Tree`].
#[derive(Debug, Clone)]
pub struct TracedTree<T> {
    inner: T,
}

impl<T> TracedTree<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: Tree> Tree for TracedTree<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn stat(&self, path: &str) -> Result<Dir, Error> {
        let result = self.inner.stat(path).await;
        match &result {
            Ok(d) => tracing::debug!(tree = self.name(), path, typ = d.typ(), "stat"),
            Err(e) => tracing::debug!(tree = self.name(), path, error = %e, "stat failed"),
        }
        result
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<Dir>, Error> {
        let result = self.inner.read_dir(path).await;
        tracing::debug!(
            tree = self.name(),
            path,
            entries = result.as_ref().map(Vec::len).ok(),
            "read_dir"
        );
        result
    }

    async fn get(
        &self,
        path: &str,
        off: u64,
        count: Option<u64>,
        out: &Chan,
    ) -> Result<(), Error> {
        let span = tracing::debug_span!("tree.get", tree = self.name(), path, off, ?count);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.get(path, off, count, out).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::debug!(elapsed_ms, "read"),
                Err(e) => tracing::debug!(elapsed_ms, error = %e, "read failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn put(&self, path: &str, dir: &Dir, off: i64, data: &Chan) -> Result<Dir, Error> {
        let span = tracing::debug_span!("tree.put", tree = self.name(), path, off);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.put(path, dir, off, data).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(d) => tracing::debug!(elapsed_ms, size = d.get("size"), "written"),
                Err(e) => tracing::debug!(elapsed_ms, error = %e, "write failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn mkdir(&self, path: &str, dir: &Dir) -> Result<(), Error> {
        let result = self.inner.mkdir(path, dir).await;
        if let Err(ref e) = result {
            tracing::debug!(tree = self.name(), path, error = %e, "mkdir failed");
        }
        result
    }

    async fn remove(&self, path: &str) -> Result<(), Error> {
        let result = self.inner.remove(path).await;
        if let Err(ref e) = result {
            tracing::debug!(tree = self.name(), path, error = %e, "remove failed");
        }
        result
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), Error> {
        let result = self.inner.rename(from, to).await;
        tracing::debug!(tree = self.name(), from, to, ok = result.is_ok(), "rename");
        result
    }

    fn host_path(&self, path: &str) -> Option<PathBuf> {
        self.inner.host_path(path)
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;

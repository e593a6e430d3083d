// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background jobs, grouped by tag.

use parking_lot::Mutex;
use ql_core::{Status, WaitHandle};
use std::collections::HashMap;
use std::sync::Arc;

/// Tag used for `cmd &`.
pub const DEFAULT_TAG: &str = "&";

/// Running background pipes. Finished handles drop out on their own.
#[derive(Clone, Default)]
pub struct Jobs {
    inner: Arc<Mutex<HashMap<String, Vec<WaitHandle>>>>,
}

impl Jobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `handles` under `tag` until each finishes.
    pub fn add(&self, tag: &str, handles: Vec<WaitHandle>) {
        for h in handles {
            let id = h.id();
            self.inner
                .lock()
                .entry(tag.to_string())
                .or_default()
                .push(h.clone());
            let jobs = self.clone();
            let tag = tag.to_string();
            tokio::spawn(async move {
                let _ = h.wait().await;
                jobs.remove(&tag, id);
            });
        }
    }

    fn remove(&self, tag: &str, id: u64) {
        let mut map = self.inner.lock();
        if let Some(hs) = map.get_mut(tag) {
            hs.retain(|h| h.id() != id);
            if hs.is_empty() {
                map.remove(tag);
            }
        }
    }

    /// Wait for every job under `tag`; the first failure is the status.
    pub async fn wait(&self, tag: &str) -> Status {
        let handles = self.inner.lock().remove(tag).unwrap_or_default();
        tracing::debug!(tag, count = handles.len(), "waiting for jobs");
        let mut sts = Ok(());
        for h in handles {
            if let (Ok(()), Err(e)) = (&sts, h.wait().await) {
                sts = Err(e);
            }
        }
        sts
    }

    /// Tags with jobs still running.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.inner.lock().keys().cloned().collect();
        tags.sort();
        tags
    }

    pub fn len(&self, tag: &str) -> usize {
        self.inner.lock().get(tag).map_or(0, Vec::len)
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;

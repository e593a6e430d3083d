// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::tree::{Tree, APPEND};
use crate::{paths, Chan, Dir, Error, Msg};

// ── In-memory tree ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Node {
    dir: Dir,
    data: Vec<u8>,
}

/// A [`Tree`] kept in memory, keyed by tree path.
#[derive(Debug)]
pub struct MemTree {
    name: String,
    nodes: Mutex<BTreeMap<String, Node>>,
}

impl MemTree {
    /// An empty tree holding only its root directory.
    pub fn new(name: &str) -> Arc<Self> {
        let t = MemTree {
            name: name.to_string(),
            nodes: Mutex::new(BTreeMap::new()),
        };
        t.insert("/", "d", b"");
        Arc::new(t)
    }

    /// Add a directory (parents must already exist).
    pub fn add_dir(self: &Arc<Self>, path: &str) -> Arc<Self> {
        self.insert(path, "d", b"");
        Arc::clone(self)
    }

    /// Add a regular file with contents.
    pub fn add_file(self: &Arc<Self>, path: &str, data: &str) -> Arc<Self> {
        self.insert(path, "-", data.as_bytes());
        Arc::clone(self)
    }

    /// Contents of a file, if present.
    pub fn contents(&self, path: &str) -> Option<String> {
        self.nodes
            .lock()
            .get(&paths::clean(path))
            .map(|n| String::from_utf8_lossy(&n.data).into_owned())
    }

    fn insert(&self, path: &str, typ: &str, data: &[u8]) {
        let path = paths::clean(path);
        let dir = Dir::new()
            .with("path", path.clone())
            .with("name", paths::base(&path))
            .with("type", typ)
            .with("mode", if typ == "d" { "755" } else { "644" })
            .with("size", data.len().to_string());
        self.nodes.lock().insert(
            path,
            Node {
                dir,
                data: data.to_vec(),
            },
        );
    }

    fn node(&self, path: &str) -> Result<Node, Error> {
        self.nodes
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotExist(path.to_string()))
    }
}

#[async_trait]
impl Tree for MemTree {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stat(&self, path: &str) -> Result<Dir, Error> {
        Ok(self.node(path)?.dir)
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<Dir>, Error> {
        let n = self.node(path)?;
        if !n.dir.is_dir() {
            return Err(Error::NotDir(path.to_string()));
        }
        let nodes = self.nodes.lock();
        let mut children: Vec<Dir> = nodes
            .iter()
            .filter(|(p, _)| {
                p.as_str() != path
                    && paths::has_prefix(p, path)
                    && !p[path.len()..].trim_start_matches('/').contains('/')
            })
            .map(|(_, n)| n.dir.clone())
            .collect();
        children.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(children)
    }

    async fn get(
        &self,
        path: &str,
        off: u64,
        count: Option<u64>,
        out: &Chan,
    ) -> Result<(), Error> {
        let n = self.node(path)?;
        let start = (off as usize).min(n.data.len());
        let end = match count {
            Some(c) => (start + c as usize).min(n.data.len()),
            None => n.data.len(),
        };
        for line in n.data[start..end].split_inclusive(|b| *b == b'\n') {
            if !out.send(Msg::Bytes(line.to_vec())).await {
                return Err(out.cause().unwrap_or(Error::BrokenPipe));
            }
        }
        Ok(())
    }

    async fn put(&self, path: &str, _dir: &Dir, off: i64, data: &Chan) -> Result<Dir, Error> {
        let mut buf = match self.node(path) {
            Ok(n) if off == APPEND => n.data,
            _ => Vec::new(),
        };
        while let Some(m) = data.recv().await {
            if let Msg::Bytes(b) = m {
                buf.extend_from_slice(&b);
            }
        }
        self.insert(path, "-", &buf);
        if let Some(e) = data.cause() {
            return Err(e);
        }
        self.stat(path).await
    }

    async fn mkdir(&self, path: &str, _dir: &Dir) -> Result<(), Error> {
        self.insert(path, "d", b"");
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), Error> {
        self.nodes
            .lock()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| Error::NotExist(path.to_string()))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), Error> {
        let n = self.node(from)?;
        self.nodes.lock().remove(from);
        self.insert(to, n.dir.typ(), &n.data);
        Ok(())
    }
}

// ── Channel helpers ─────────────────────────────────────────────────────────

/// Receive everything from `c` until it is closed.
pub async fn drain(c: &Chan) -> Vec<Msg> {
    let mut msgs = Vec::new();
    while let Some(m) = c.recv().await {
        msgs.push(m);
    }
    msgs
}

/// Concatenated `Bytes` payloads received from `c`, as text.
pub async fn drain_text(c: &Chan) -> String {
    let mut s = String::new();
    for m in drain(c).await {
        if let Msg::Bytes(b) = m {
            s.push_str(&String::from_utf8_lossy(&b));
        }
    }
    s
}

/// Paths of the `Dir` messages in `msgs`.
pub fn dir_paths(msgs: &[Msg]) -> Vec<String> {
    msgs.iter()
        .filter_map(|m| match m {
            Msg::Dir(d) => Some(d.path().to_string()),
            _ => None,
        })
        .collect()
}

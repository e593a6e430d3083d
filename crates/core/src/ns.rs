// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Namespace: a mount table mapping path prefixes to file trees.
//!
//! Paths given to [`Ns`] are absolute namespace paths. Each is resolved to
//! the tree mounted at its longest matching prefix plus the remaining
//! sub-path. Streaming operations ([`Ns::get`], [`Ns::put`], [`Ns::find`])
//! run in their own task and report through channels.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::pred::Pred;
use crate::tree::Tree;
use crate::{paths, Chan, Dir, Error, Msg};

#[derive(Debug, Clone)]
pub struct Mount {
    pub prefix: String,
    pub tree: Arc<dyn Tree>,
}

/// Result of resolving a namespace path.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Mount point that matched.
    pub prefix: String,
    pub tree: Arc<dyn Tree>,
    /// Path inside the tree, rooted at `/`.
    pub sub: String,
}

impl Resolved {
    /// Namespace path for a path inside the resolved tree.
    fn ns_path(&self, sub: &str) -> String {
        if self.prefix == "/" {
            paths::clean(sub)
        } else {
            paths::join(&self.prefix, sub)
        }
    }

    /// Rebase a tree-relative entry onto the namespace.
    fn rebase(&self, mut d: Dir) -> Dir {
        let p = self.ns_path(d.path());
        d.set("name", paths::base(&p).to_string());
        d.set("path", p);
        d
    }
}

/// Mount table; longest prefixes are kept first.
#[derive(Debug, Default)]
pub struct Ns {
    mounts: RwLock<Vec<Mount>>,
}

impl Ns {
    pub fn new() -> Self {
        Self::default()
    }

    /// A namespace with a single tree mounted at `/`.
    pub fn with_root(tree: Arc<dyn Tree>) -> Self {
        let ns = Self::new();
        ns.mount("/", tree);
        ns
    }

    /// Mount `tree` at `prefix`, replacing any tree already there.
    pub fn mount(&self, prefix: &str, tree: Arc<dyn Tree>) {
        let prefix = paths::clean(prefix);
        tracing::debug!(prefix, tree = tree.name(), "mount");
        let mut mounts = self.mounts.write();
        mounts.retain(|m| m.prefix != prefix);
        mounts.push(Mount { prefix, tree });
        mounts.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
    }

    pub fn unmount(&self, prefix: &str) -> bool {
        let prefix = paths::clean(prefix);
        let mut mounts = self.mounts.write();
        let before = mounts.len();
        mounts.retain(|m| m.prefix != prefix);
        mounts.len() != before
    }

    /// Mount points and tree names, longest prefix first.
    pub fn mounts(&self) -> Vec<(String, String)> {
        self.mounts
            .read()
            .iter()
            .map(|m| (m.prefix.clone(), m.tree.name().to_string()))
            .collect()
    }

    /// Independent copy of the mount table sharing the same trees.
    pub fn dup(&self) -> Ns {
        Ns {
            mounts: RwLock::new(self.mounts.read().clone()),
        }
    }

    pub fn resolve(&self, path: &str) -> Result<Resolved, Error> {
        if !path.starts_with('/') {
            return Err(Error::Status(format!("{path}: not an absolute path")));
        }
        let path = paths::clean(path);
        let mounts = self.mounts.read();
        let m = mounts
            .iter()
            .find(|m| paths::has_prefix(&path, &m.prefix))
            .ok_or_else(|| Error::NotExist(path.clone()))?;
        let sub = paths::suffix(&path, &m.prefix).unwrap_or_else(|| "/".to_string());
        Ok(Resolved {
            prefix: m.prefix.clone(),
            tree: m.tree.clone(),
            sub,
        })
    }

    pub async fn stat(&self, path: &str) -> Result<Dir, Error> {
        let r = self.resolve(path)?;
        let d = r.tree.stat(&r.sub).await?;
        Ok(r.rebase(d))
    }

    pub async fn read_dir(&self, path: &str) -> Result<Vec<Dir>, Error> {
        let r = self.resolve(path)?;
        let ds = r.tree.read_dir(&r.sub).await?;
        Ok(ds.into_iter().map(|d| r.rebase(d)).collect())
    }

    pub async fn mkdir(&self, path: &str, dir: &Dir) -> Result<(), Error> {
        let r = self.resolve(path)?;
        r.tree.mkdir(&r.sub, dir).await
    }

    pub async fn remove(&self, path: &str) -> Result<(), Error> {
        let r = self.resolve(path)?;
        r.tree.remove(&r.sub).await
    }

    /// Move `from` to `to`; both must live in the same tree.
    pub async fn rename(&self, from: &str, to: &str) -> Result<(), Error> {
        let rf = self.resolve(from)?;
        let rt = self.resolve(to)?;
        if rf.prefix != rt.prefix {
            return Err(Error::Status(format!("{from}: can't move across trees")));
        }
        rf.tree.rename(&rf.sub, &rt.sub).await
    }

    /// Host path backing a namespace path, when its tree has one.
    pub fn host_path(&self, path: &str) -> Option<std::path::PathBuf> {
        let r = self.resolve(path).ok()?;
        r.tree.host_path(&r.sub)
    }

    /// Stream the contents of `path` as `Bytes`.
    ///
    /// The returned channel is closed with the read status.
    pub fn get(self: &Arc<Self>, path: &str, off: u64, count: Option<u64>) -> Chan {
        let out = Chan::new();
        let ns = Arc::clone(self);
        let path = path.to_string();
        let tx = out.clone();
        tokio::spawn(async move {
            let res = match ns.resolve(&path) {
                Ok(r) => r.tree.get(&r.sub, off, count, &tx).await,
                Err(e) => Err(e),
            };
            tx.close(res.err());
        });
        out
    }

    /// Write the `Bytes` received on `data` to `path`.
    ///
    /// The returned channel yields one `Dir` with the resulting metadata and
    /// is closed with the write status. On failure `data` is closed too, so
    /// writers stop.
    pub fn put(self: &Arc<Self>, path: &str, dir: Dir, off: i64, data: Chan) -> Chan {
        let reply = Chan::with_capacity(1);
        let ns = Arc::clone(self);
        let path = path.to_string();
        let tx = reply.clone();
        tokio::spawn(async move {
            let res = match ns.resolve(&path) {
                Ok(r) => r.tree.put(&r.sub, &dir, off, &data).await.map(|d| r.rebase(d)),
                Err(e) => Err(e),
            };
            match res {
                Ok(d) => {
                    tx.send(Msg::Dir(d)).await;
                    tx.close(None);
                }
                Err(e) => {
                    tracing::debug!(path, error = %e, "put failed");
                    data.close(Some(e.clone()));
                    tx.close(Some(e));
                }
            }
        });
        reply
    }

    /// Walk the tree at `path`, sending a `Dir` for every entry that
    /// satisfies `pred`.
    ///
    /// Traversal is depth-first, parents before children, siblings by name.
    /// Entries that can't be read are reported as a `Dir` with an `err`
    /// attribute; the channel is closed with the last such error.
    pub fn find(self: &Arc<Self>, path: &str, pred: Pred) -> Chan {
        let out = Chan::new();
        let ns = Arc::clone(self);
        let path = paths::clean(path);
        let tx = out.clone();
        tokio::spawn(async move {
            let res = ns.walk(&path, &pred, &tx).await;
            tx.close(res.err());
        });
        out
    }

    async fn walk(&self, root: &str, pred: &Pred, out: &Chan) -> Result<(), Error> {
        let first = match self.stat(root).await {
            Ok(d) => d,
            Err(e) => {
                out.send(Msg::Dir(err_dir(root, &e))).await;
                return Err(e);
            }
        };
        let mut sts = Ok(());
        let mut stack = vec![(first, 0usize)];
        while let Some((d, depth)) = stack.pop() {
            let v = pred.eval(&d, depth);
            let is_dir = d.is_dir();
            let path = d.path().to_string();
            if v.matches && !out.send(Msg::Dir(d)).await {
                return Err(out.cause().unwrap_or(Error::BrokenPipe));
            }
            if !is_dir || v.prune {
                continue;
            }
            match self.read_dir(&path).await {
                Ok(children) => {
                    stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
                }
                Err(e) => {
                    if !out.send(Msg::Dir(err_dir(&path, &e))).await {
                        return Err(out.cause().unwrap_or(Error::BrokenPipe));
                    }
                    sts = Err(e);
                }
            }
        }
        sts
    }
}

/// An entry standing for a failed lookup.
pub fn err_dir(path: &str, err: &Error) -> Dir {
    Dir::new()
        .with("path", path)
        .with("name", paths::base(path))
        .with("err", err.to_string())
}

#[cfg(test)]
#[path = "ns_tests.rs"]
mod tests;

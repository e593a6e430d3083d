// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host file system tree

use async_trait::async_trait;
use ql_core::tree::{Tree, APPEND};
use ql_core::{paths, Chan, Dir, Error, Msg};
use std::fs::Metadata;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

/// Bytes per message when streaming file contents.
pub const READ_CHUNK: usize = 8 * 1024;

/// A [`Tree`] backed by a directory of the host file system.
#[derive(Debug, Clone)]
pub struct LocalTree {
    name: String,
    root: PathBuf,
}

impl LocalTree {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// Host path for a tree path.
    pub fn host(&self, path: &str) -> PathBuf {
        let rel = paths::clean(path);
        let rel = rel.trim_start_matches('/');
        if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel)
        }
    }

    async fn metadata(&self, path: &str) -> Result<Metadata, Error> {
        let host = self.host(path);
        match tokio::fs::metadata(&host).await {
            Ok(m) => Ok(m),
            // dangling symlinks are still entries
            Err(_) => tokio::fs::symlink_metadata(&host)
                .await
                .map_err(|e| Error::io(path, &e)),
        }
    }
}

/// Build the `Dir` for an entry at tree path `path`.
fn dir_of(path: &str, meta: &Metadata) -> Dir {
    let typ = if meta.is_dir() { "d" } else { "-" };
    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut d = Dir::new()
        .with("path", path)
        .with("name", paths::base(path))
        .with("type", typ)
        .with("mode", format!("{:o}", mode_of(meta)))
        .with("size", meta.len().to_string())
        .with("mtime", mtime.to_string());
    owner_of(meta, &mut d);
    d
}

#[cfg(unix)]
fn mode_of(meta: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn mode_of(meta: &Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

#[cfg(unix)]
fn owner_of(meta: &Metadata, d: &mut Dir) {
    use std::os::unix::fs::MetadataExt;
    d.set("uid", meta.uid().to_string());
    d.set("gid", meta.gid().to_string());
}

#[cfg(not(unix))]
fn owner_of(_meta: &Metadata, _d: &mut Dir) {}

#[cfg(unix)]
fn create_mode(opts: &mut tokio::fs::OpenOptions, dir: &Dir) {
    if let Ok(mode) = u32::from_str_radix(dir.get("mode"), 8) {
        opts.mode(mode & 0o777);
    }
}

#[cfg(not(unix))]
fn create_mode(_opts: &mut tokio::fs::OpenOptions, _dir: &Dir) {}

#[async_trait]
impl Tree for LocalTree {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stat(&self, path: &str) -> Result<Dir, Error> {
        let meta = self.metadata(path).await?;
        Ok(dir_of(path, &meta))
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<Dir>, Error> {
        let meta = self.metadata(path).await?;
        if !meta.is_dir() {
            return Err(Error::NotDir(path.to_string()));
        }
        let mut rd = tokio::fs::read_dir(self.host(path))
            .await
            .map_err(|e| Error::io(path, &e))?;
        let mut names = Vec::new();
        while let Some(ent) = rd.next_entry().await.map_err(|e| Error::io(path, &e))? {
            names.push(ent.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        let mut ds = Vec::with_capacity(names.len());
        for name in names {
            let child = paths::join(path, &name);
            match self.metadata(&child).await {
                Ok(m) => ds.push(dir_of(&child, &m)),
                Err(e) => tracing::debug!(path = child, error = %e, "skipping entry"),
            }
        }
        Ok(ds)
    }

    async fn get(
        &self,
        path: &str,
        off: u64,
        count: Option<u64>,
        out: &Chan,
    ) -> Result<(), Error> {
        let meta = self.metadata(path).await?;
        if meta.is_dir() {
            return Err(Error::Io(format!("{path}: is a directory")));
        }
        let mut f = tokio::fs::File::open(self.host(path))
            .await
            .map_err(|e| Error::io(path, &e))?;
        if off > 0 {
            f.seek(SeekFrom::Start(off))
                .await
                .map_err(|e| Error::io(path, &e))?;
        }
        let mut left = count;
        loop {
            let want = match left {
                Some(0) => break,
                Some(n) => (n as usize).min(READ_CHUNK),
                None => READ_CHUNK,
            };
            let mut buf = vec![0u8; want];
            let n = f.read(&mut buf).await.map_err(|e| Error::io(path, &e))?;
            if n == 0 {
                break;
            }
            buf.truncate(n);
            if !out.send(Msg::Bytes(buf)).await {
                return Err(out.cause().unwrap_or(Error::BrokenPipe));
            }
            left = left.map(|l| l.saturating_sub(n as u64));
        }
        Ok(())
    }

    async fn put(&self, path: &str, dir: &Dir, off: i64, data: &Chan) -> Result<Dir, Error> {
        let mut opts = tokio::fs::OpenOptions::new();
        opts.write(true).create(true);
        match off {
            APPEND => opts.append(true),
            0 => opts.truncate(true),
            _ => &mut opts,
        };
        create_mode(&mut opts, dir);
        let mut f = match opts.open(self.host(path)).await {
            Ok(f) => f,
            Err(e) => {
                let e = Error::io(path, &e);
                data.close(Some(e.clone()));
                return Err(e);
            }
        };
        if off > 0 {
            if let Err(e) = f.seek(SeekFrom::Start(off as u64)).await {
                let e = Error::io(path, &e);
                data.close(Some(e.clone()));
                return Err(e);
            }
        }
        while let Some(m) = data.recv().await {
            let Msg::Bytes(b) = m else { continue };
            if let Err(e) = f.write_all(&b).await {
                let e = Error::io(path, &e);
                data.close(Some(e.clone()));
                return Err(e);
            }
        }
        f.flush().await.map_err(|e| Error::io(path, &e))?;
        if let Some(e) = data.cause() {
            return Err(e);
        }
        self.stat(path).await
    }

    async fn mkdir(&self, path: &str, _dir: &Dir) -> Result<(), Error> {
        tokio::fs::create_dir(self.host(path))
            .await
            .map_err(|e| Error::io(path, &e))
    }

    async fn remove(&self, path: &str) -> Result<(), Error> {
        let host = self.host(path);
        let meta = self.metadata(path).await?;
        let res = if meta.is_dir() {
            tokio::fs::remove_dir(&host).await
        } else {
            tokio::fs::remove_file(&host).await
        };
        res.map_err(|e| Error::io(path, &e))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), Error> {
        tokio::fs::rename(self.host(from), self.host(to))
            .await
            .map_err(|e| Error::io(from, &e))
    }

    fn host_path(&self, path: &str) -> Option<PathBuf> {
        Some(self.host(path))
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expansion of `path,predicate` names into `Dir` (and data) streams.

use super::Ctx;
use crate::pred::Pred;
use crate::{paths, Chan, Dir, Error, Msg, Status};

/// Predicate used when a name carries none.
const STAT_ONLY: &str = "0";
/// Predicate used for a bare `dir/` name.
const ENTRIES_ONLY: &str = "depth=1";

/// Split a `path,pred` name into a clean path (relative names stay
/// relative) and its predicate, applying the defaults.
pub fn split_name(name: &str) -> (String, String) {
    let (path, pred) = match name.split_once(',') {
        Some((p, pred)) => (p, pred),
        None if name.ends_with('/') => (name, ENTRIES_ONLY),
        None => (name, STAT_ONLY),
    };
    let path = if path.is_empty() { "." } else { path };
    (paths::clean(path), pred.to_string())
}

/// Send `m`, turning a refused send into the output's cause.
async fn emit(out: &Chan, m: Msg) -> Status {
    if out.send(m).await {
        Ok(())
    } else {
        Err(out.cause().unwrap_or(Error::BrokenPipe))
    }
}

impl Ctx {
    /// Stream one `Dir` for every entry named by `names`.
    ///
    /// Each name is `path[,pred]`. A name without a predicate yields just
    /// that entry; `dir/` yields the entries inside `dir`; `#N` yields an
    /// entry of type `c` for that descriptor. `upath` mimics the name as
    /// given and `rpath` is relative to it. Entries that fail (other than
    /// `pruned` ones) are reported as `Err` messages and the channel is
    /// closed with the last such error.
    pub fn dirs(&self, names: &[String]) -> Chan {
        self.expand_names(names, false)
    }

    /// Like [`Ctx::dirs`], but every regular file's `Dir` is followed by
    /// its contents as `Bytes`, and `#N` names stream that descriptor.
    pub fn files(&self, names: &[String]) -> Chan {
        self.expand_names(names, true)
    }

    fn expand_names(&self, names: &[String], data: bool) -> Chan {
        let out = Chan::new();
        let ctx = self.clone();
        let names = names.to_vec();
        let tx = out.clone();
        tokio::spawn(async move {
            let mut last = Ok(());
            for name in &names {
                let res = if name.starts_with('#') {
                    ctx.expand_fd(name, data, &tx).await
                } else {
                    ctx.expand_path(name, data, &tx).await
                };
                match res {
                    Ok(Some(e)) => last = Err(e),
                    Ok(None) => {}
                    Err(e) => {
                        tx.close(Some(e));
                        return;
                    }
                }
            }
            tx.close(last.err());
        });
        out
    }

    /// Returns the entry error to remember, or fails when `out` refused.
    async fn expand_fd(&self, name: &str, data: bool, out: &Chan) -> Result<Option<Error>, Error> {
        let fd = name[1..].parse::<usize>().ok();
        let src = fd.and_then(|fd| self.io_set().get(fd));
        let mut d = Dir::new()
            .with("path", name)
            .with("upath", name)
            .with("name", name)
            .with("type", "c");
        let Some(src) = src else {
            let e = Error::BadIo(name.to_string());
            d.set("err", e.to_string());
            emit(out, Msg::Dir(d)).await?;
            emit(out, Msg::Err(e.clone())).await?;
            return Ok(Some(e));
        };
        emit(out, Msg::Dir(d)).await?;
        if !data {
            return Ok(None);
        }
        while let Some(m) = self.recv(&src).await? {
            if let Msg::Bytes(_) = m {
                if let Err(e) = emit(out, m).await {
                    src.close(Some(e.clone()));
                    return Err(e);
                }
            }
        }
        match src.cause() {
            Some(e) => {
                emit(out, Msg::Err(e.clone())).await?;
                Ok(Some(e))
            }
            None => Ok(None),
        }
    }

    async fn expand_path(&self, name: &str, data: bool, out: &Chan) -> Result<Option<Error>, Error> {
        let (upath, pred_src) = split_name(name);
        let root = self.abs_path(&upath);
        let pred = match Pred::parse(&pred_src) {
            Ok(p) => p,
            Err(e) => {
                emit(out, Msg::Err(e.clone())).await?;
                return Ok(Some(e));
            }
        };
        tracing::trace!(root, pred = %pred, "find");
        let ns = self.ns();
        let found = ns.find(&root, pred);
        let mut last = None;
        while let Some(m) = self.recv(&found).await? {
            let Msg::Dir(mut d) = m else { continue };
            let rpath = paths::suffix(d.path(), &root);
            let shown = match &rpath {
                Some(r) if upath != root => paths::join(&upath, r),
                _ => d.path().to_string(),
            };
            d.set("upath", shown);
            d.set("rpath", rpath.unwrap_or_default());
            if !d.err().is_empty() {
                if d.err() != "pruned" {
                    let e = Error::from_status(d.err());
                    emit(out, Msg::Err(e.clone())).await?;
                    last = Some(e);
                }
                continue;
            }
            let is_file = d.typ() == "-";
            let path = d.path().to_string();
            if let Err(e) = emit(out, Msg::Dir(d)).await {
                found.close(Some(e.clone()));
                return Err(e);
            }
            if data && is_file {
                if let Some(e) = self.send_data(&path, out, &found).await? {
                    last = Some(e);
                }
            }
        }
        if let Some(e) = found.cause() {
            if last.is_none() {
                emit(out, Msg::Err(e.clone())).await?;
            }
            last = Some(e);
        }
        Ok(last)
    }

    /// Stream a file's contents to `out`.
    async fn send_data(&self, path: &str, out: &Chan, found: &Chan) -> Result<Option<Error>, Error> {
        let body = self.ns().get(path, 0, None);
        while let Some(m) = self.recv(&body).await? {
            if let Err(e) = emit(out, m).await {
                body.close(Some(e.clone()));
                found.close(Some(e.clone()));
                return Err(e);
            }
        }
        match body.cause() {
            Some(e) => {
                emit(out, Msg::Err(e.clone())).await?;
                Ok(Some(e))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "find_tests.rs"]
mod tests;

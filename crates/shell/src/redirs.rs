// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Installing a stage's redirections in its I/O table.

use crate::ast::{Redir, RedirTarget};
use ql_core::{Chan, Ctx, Dir, Error, Status, APPEND};

/// Mode for files created by `>`.
const CREATE_MODE: &str = "664";

enum Opened {
    Chan(Chan),
    /// A `#N` name: alias that descriptor.
    Fd(usize),
}

/// Open every file the redirections name, then install all of them in
/// order: pipes take the stage's `pi` (fd 0) or `po` ends, dups alias
/// another descriptor and files their channel.
///
/// Output files are written by the namespace as the stage sends; the
/// stage's exit waits for those writes.
pub(crate) async fn apply_redirs(ctx: &Ctx, redirs: &[Redir], pi: &Chan, po: &Chan) -> Status {
    let mut opened = Vec::with_capacity(redirs.len());
    for r in redirs {
        let RedirTarget::File(name) = &r.target else {
            opened.push(None);
            continue;
        };
        let f = match open(ctx, r, name).await {
            Ok(f) => f,
            Err(e) => {
                for c in opened.iter().flatten() {
                    if let Opened::Chan(c) = c {
                        c.close(Some(e.clone()));
                    }
                }
                ctx.warn(&e.to_string()).await;
                return Err(e);
            }
        };
        opened.push(Some(f));
    }
    let mut sts = Ok(());
    for (r, f) in redirs.iter().zip(opened) {
        let res = match (&r.target, f) {
            (RedirTarget::Pipe, _) => {
                let end = if r.from == 0 { pi } else { po };
                ctx.set_io(r.from, end.clone());
                Ok(())
            }
            (RedirTarget::Dup(to), _) => ctx.copy_io(r.from, *to),
            (RedirTarget::File(_), Some(Opened::Chan(c))) => {
                ctx.set_io(r.from, c);
                Ok(())
            }
            (RedirTarget::File(_), Some(Opened::Fd(fd))) => ctx.copy_io(r.from, fd),
            (RedirTarget::File(_), None) => Ok(()),
        };
        tracing::trace!(ctx = ctx.id(), redir = %r, "redirected");
        if let (Ok(()), Err(e)) = (&sts, res) {
            ctx.warn(&e.to_string()).await;
            sts = Err(e);
        }
    }
    sts
}

async fn open(ctx: &Ctx, r: &Redir, name: &str) -> Result<Opened, Error> {
    if let Some(n) = name.strip_prefix('#') {
        let fd: usize = n.parse().map_err(|_| Error::BadIo(name.to_string()))?;
        if ctx.io(fd).is_null() {
            return Err(Error::BadIo(name.to_string()));
        }
        return Ok(Opened::Fd(fd));
    }
    let path = ctx.abs_path(name);
    let ns = ctx.ns();
    if r.from == 0 {
        let d = ns.stat(&path).await?;
        if d.is_dir() {
            return Err(Error::Status(format!("{name}: is a directory")));
        }
        return Ok(Opened::Chan(ns.get(&path, 0, None)));
    }
    let data = Chan::new();
    let off = if r.append { APPEND } else { 0 };
    let reply = ns.put(&path, Dir::new().with("mode", CREATE_MODE), off, data.clone());
    ctx.defer_exit_until(reply);
    Ok(Opened::Chan(data))
}

#[cfg(test)]
#[path = "redirs_tests.rs"]
mod tests;

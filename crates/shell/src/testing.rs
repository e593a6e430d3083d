// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helpers for running ql text against an in-memory tree.

use crate::exec::{Flags, Shell};
use crate::parser::{Item, Parser};
use ql_core::test_support::MemTree;
use ql_core::{Chan, Ctx, Msg, Ns, Status};
use std::sync::Arc;

/// Buffer deep enough that tests never block on unread output.
const OUT_CAP: usize = 4096;

/// `/tmp` with two files and a sub-directory.
pub(crate) fn fixture() -> Arc<MemTree> {
    MemTree::new("mem")
        .add_dir("/tmp")
        .add_file("/tmp/a", "hello\n")
        .add_file("/tmp/b", "two\nlines\n")
        .add_dir("/tmp/d")
        .add_file("/tmp/d/c", "c\n")
}

/// A shell context over a [`MemTree`] with captured stdout and stderr.
pub(crate) struct Sh {
    pub ctx: Ctx,
    pub shell: Shell,
    pub tree: Arc<MemTree>,
    out: Chan,
    err: Chan,
}

impl Sh {
    pub fn new() -> Self {
        Self::with_tree(fixture())
    }

    pub fn with_tree(tree: Arc<MemTree>) -> Self {
        let out = Chan::with_capacity(OUT_CAP);
        let err = Chan::with_capacity(OUT_CAP);
        let ns = Arc::new(Ns::with_root(tree.clone()));
        let ctx = Ctx::builder()
            .stdout(out.clone())
            .stderr(err.clone())
            .ns(ns)
            .args(vec!["ql".into()])
            .build();
        let shell = Shell::new(&ctx, Flags::default());
        Self {
            ctx,
            shell,
            tree,
            out,
            err,
        }
    }

    /// Run every item of `src` in the shell's context; the status is the
    /// last command's.
    pub async fn run(&self, src: &str) -> Status {
        let items = match Parser::parse_text("t", src) {
            Ok(items) => items,
            Err(e) => panic!("parse {src:?}: {e}"),
        };
        let mut sts = Ok(());
        for item in items {
            match item {
                Item::Cmd(c) => sts = self.shell.run_cmd(&self.ctx, &c).await,
                Item::Func { name, body, .. } => self.shell.define(&name, body),
                Item::Source { path, .. } => panic!("unexpected source of {path}"),
            }
        }
        sts
    }

    /// Output written so far; `Dir`s show as their paths.
    pub async fn out(&self) -> String {
        take(&self.out).await
    }

    /// Diagnostics written so far.
    pub async fn err(&self) -> String {
        take(&self.err).await
    }
}

async fn take(c: &Chan) -> String {
    let mut s = String::new();
    while !c.is_empty() {
        match c.recv().await {
            Some(Msg::Bytes(b)) => s.push_str(&String::from_utf8_lossy(&b)),
            Some(Msg::Dir(d)) => {
                s.push_str(d.path());
                s.push('\n');
            }
            Some(_) => {}
            None => break,
        }
    }
    s
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Building the initial namespace from a textual description.
//!
//! A description is a list of entries separated by newlines or `;`. Each
//! entry is `prefix hostdir` and mounts the host directory `hostdir` at the
//! namespace path `prefix`. Blank entries and `#` comments are skipped.

use ql_core::{Error, Ns, Tree};
use std::sync::Arc;

use crate::local::LocalTree;
use crate::traced::TracedTree;

/// Parse a namespace description.
///
/// With `traced`, every mounted tree logs its operations.
pub fn parse_ns(desc: &str, traced: bool) -> Result<Ns, Error> {
    let ns = Ns::new();
    for entry in desc.split(['\n', ';']) {
        let entry = entry.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }
        let mut toks = entry.split_whitespace();
        let (Some(prefix), Some(host), None) = (toks.next(), toks.next(), toks.next()) else {
            return Err(Error::Status(format!("ns: bad entry '{entry}'")));
        };
        if !prefix.starts_with('/') {
            return Err(Error::Status(format!("ns: '{prefix}': not an absolute path")));
        }
        ns.mount(prefix, mount_tree(prefix, host, traced));
    }
    if ns.resolve("/").is_err() {
        return Err(Error::Status("ns: nothing mounted at /".to_string()));
    }
    Ok(ns)
}

/// The namespace used when no description is given: the host root at `/`.
pub fn host_ns(traced: bool) -> Ns {
    Ns::with_root(mount_tree("/", "/", traced))
}

/// Namespace from `NS`, falling back to [`host_ns`].
pub fn ns_from_env(traced: bool) -> Result<Ns, Error> {
    match crate::env::ns_desc() {
        Some(desc) => parse_ns(&desc, traced),
        None => Ok(host_ns(traced)),
    }
}

fn mount_tree(prefix: &str, host: &str, traced: bool) -> Arc<dyn Tree> {
    let tree = LocalTree::new(format!("lfs:{host}"), host);
    if traced {
        tracing::debug!(prefix, host, "mounting traced tree");
        Arc::new(TracedTree::new(tree))
    } else {
        Arc::new(tree)
    }
}

#[cfg(test)]
#[path = "namespace_tests.rs"]
mod tests;

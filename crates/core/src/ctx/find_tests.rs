// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{dir_paths, drain, MemTree};
use crate::Ns;
use std::sync::Arc;
use yare::parameterized;

fn ctx() -> Ctx {
    let root = MemTree::new("root")
        .add_dir("/tmp")
        .add_file("/tmp/b", "bee\n")
        .add_file("/tmp/a", "one\ntwo\n")
        .add_dir("/tmp/c")
        .add_file("/tmp/c/d", "deep\n");
    Ctx::builder()
        .ns(Arc::new(Ns::with_root(root)))
        .dot("/tmp")
        .build()
}

fn names(ns: &[&str]) -> Vec<String> {
    ns.iter().map(|s| s.to_string()).collect()
}

#[parameterized(
    plain = { "/tmp", "/tmp", "0" },
    trailing_slash = { "/tmp/", "/tmp", "depth=1" },
    with_pred = { "/tmp,type=-", "/tmp", "type=-" },
    empty_path = { ",1", ".", "1" },
    relative = { "c/../a", "a", "0" },
)]
fn split_name_defaults(name: &str, path: &str, pred: &str) {
    assert_eq!(split_name(name), (path.to_string(), pred.to_string()));
}

#[tokio::test]
async fn plain_name_yields_only_the_entry() {
    let msgs = drain(&ctx().dirs(&names(&["/tmp"]))).await;
    assert_eq!(dir_paths(&msgs), vec!["/tmp"]);
}

#[tokio::test]
async fn trailing_slash_lists_entries_by_name() {
    let msgs = drain(&ctx().dirs(&names(&["/tmp/"]))).await;
    assert_eq!(dir_paths(&msgs), vec!["/tmp/a", "/tmp/b", "/tmp/c"]);
}

#[tokio::test]
async fn upath_mimics_relative_names() {
    let out = ctx().dirs(&names(&["c,"]));
    let msgs = drain(&out).await;
    let ups: Vec<String> = msgs
        .iter()
        .filter_map(|m| match m {
            Msg::Dir(d) => Some(format!("{} {}", d.upath(), d.get("rpath"))),
            _ => None,
        })
        .collect();
    assert_eq!(ups, vec!["c /", "c/d /d"]);
    assert_eq!(out.cause(), None);
}

#[tokio::test]
async fn missing_entry_reports_error_and_cause() {
    let out = ctx().dirs(&names(&["/nope", "/tmp/a"]));
    let msgs = drain(&out).await;
    assert!(matches!(msgs[0], Msg::Err(_)));
    assert_eq!(dir_paths(&msgs), vec!["/tmp/a"]);
    assert!(out.cause().is_some());
}

#[tokio::test]
async fn files_interleaves_entries_and_data() {
    let msgs = drain(&ctx().files(&names(&["/tmp,type=-"]))).await;
    let kinds: Vec<String> = msgs
        .iter()
        .map(|m| match m {
            Msg::Dir(d) => d.path().to_string(),
            Msg::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            other => other.kind().to_string(),
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["/tmp/a", "one\n", "two\n", "/tmp/b", "bee\n", "/tmp/c/d", "deep\n"]
    );
}

#[tokio::test]
async fn descriptor_names_stream_the_channel() {
    let c = ctx();
    let src = Chan::new();
    let name = c.add_io(src.clone());
    src.send(Msg::from("via fd\n")).await;
    src.send(Msg::Text("skipped".into())).await;
    src.close(None);

    let msgs = drain(&c.files(&names(&[&name]))).await;
    assert_eq!(msgs.len(), 2);
    match &msgs[0] {
        Msg::Dir(d) => assert_eq!((d.path(), d.typ()), (name.as_str(), "c")),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(msgs[1], Msg::from("via fd\n"));
}

#[tokio::test]
async fn unknown_descriptor_fails() {
    let out = ctx().dirs(&names(&["#9"]));
    let msgs = drain(&out).await;
    assert_eq!(msgs.len(), 2);
    assert_eq!(out.cause(), Some(Error::BadIo("#9".into())));
}

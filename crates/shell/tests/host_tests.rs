// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripts run against the host file tree and host programs.

use ql_core::{Chan, Ctx, Error, Msg, Status};
use ql_shell::{Flags, Interp, Script};
use std::sync::Arc;
use tempfile::TempDir;

struct Run {
    sts: Status,
    out: String,
    err: String,
}

fn test_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "alpha\n").unwrap();
    std::fs::write(dir.path().join("b.txt"), "beta\ngamma\n").unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("sub/c.txt"), "c\n").unwrap();
    dir
}

fn root(dir: &TempDir) -> String {
    dir.path().display().to_string()
}

async fn run(dir: &TempDir, src: &str) -> Run {
    let out = Chan::with_capacity(1024);
    let err = Chan::with_capacity(1024);
    let ctx = Ctx::builder()
        .stdout(out.clone())
        .stderr(err.clone())
        .ns(Arc::new(ql_adapters::host_ns(false)))
        .dot(root(dir))
        .args(vec!["ql".into()])
        .build();
    let script = Script::Text {
        name: "host".into(),
        text: src.to_string(),
    };
    let sts = Interp::new(ctx, Flags::default()).run(script).await;
    out.close(None);
    err.close(None);
    Run {
        sts,
        out: drain(&out).await,
        err: drain(&err).await,
    }
}

async fn drain(c: &Chan) -> String {
    let mut s = String::new();
    while let Some(m) = c.recv().await {
        if let Msg::Bytes(b) = m {
            s.push_str(&String::from_utf8_lossy(&b));
        }
    }
    s
}

#[tokio::test(flavor = "multi_thread")]
async fn listing_a_directory() {
    let dir = test_dir();
    let r = run(&dir, &format!("{}/\n", root(&dir))).await;
    assert_eq!(r.sts, Ok(()));
    let d = root(&dir);
    assert_eq!(r.out, format!("{d}/a.txt\n{d}/b.txt\n{d}/sub\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn listing_with_a_predicate() {
    let dir = test_dir();
    let r = run(&dir, "lf .,type=- | pf -p\n").await;
    assert_eq!(r.out, "a.txt\nb.txt\nc.txt\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_path_fails() {
    let dir = test_dir();
    let r = run(&dir, "/does/not/exist\n").await;
    assert_eq!(
        r.sts,
        Err(Error::Status("/does/not/exist: file does not exist".into()))
    );
    assert_eq!(r.err, "lf: /does/not/exist: file does not exist\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn files_feed_host_programs() {
    let dir = test_dir();
    let r = run(&dir, "gf b.txt | pf -f | wc -l\n").await;
    assert_eq!(r.sts, Ok(()));
    assert_eq!(r.out.trim(), "2");
}

#[tokio::test(flavor = "multi_thread")]
async fn output_redirection_writes_host_files() {
    let dir = test_dir();
    let r = run(&dir, "echo one > out.txt\necho two >> out.txt\n").await;
    assert_eq!(r.sts, Ok(()));
    let got = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
    assert_eq!(got, "one\ntwo\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn input_redirection_into_a_program() {
    let dir = test_dir();
    let r = run(&dir, "| tr a-z A-Z < a.txt\n").await;
    assert_eq!(r.sts, Ok(()));
    assert_eq!(r.out, "ALPHA\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn program_exit_status_is_kept() {
    let dir = test_dir();
    let r = run(&dir, "| sh -c 'exit 3'\necho $status\n").await;
    assert_eq!(r.out, "exit status: 3\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn here_block_over_a_program() {
    let dir = test_dir();
    let r = run(&dir, "n = <{ gf a.txt b.txt | pf -f | wc -l }\necho lines $n\n").await;
    assert_eq!(r.out, "lines 3\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn tee_into_programs() {
    let dir = test_dir();
    let r = run(&dir, "gf a.txt | pf -f | >{ tr a-z A-Z ; pf }\n").await;
    let mut lines: Vec<&str> = r.out.lines().collect();
    lines.sort();
    assert_eq!(lines, vec!["ALPHA", "alpha"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn background_jobs_are_waited_for() {
    let dir = test_dir();
    let r = run(&dir, "| sleep 0.05 &j\n| sh -c 'exit 1' &j\nwait j\necho $status\n").await;
    assert_eq!(r.out, "exit status: 1\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn for_binds_each_line_of_program_output() {
    let dir = test_dir();
    let r = run(&dir, "| cat b.txt | for x { echo item $x }\n").await;
    assert_eq!(r.sts, Ok(()), "{}", r.err);
    assert_eq!(r.out, "item beta\nitem gamma\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn line_here_block_splits_program_output() {
    let dir = test_dir();
    let r = run(&dir, "x = <<{ | cat b.txt }\n| echo $#x $x[1]\n").await;
    assert_eq!(r.out, "2 gamma\n");
}

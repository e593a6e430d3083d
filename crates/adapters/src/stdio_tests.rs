// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ql_core::test_support::drain;
use tokio::io::AsyncReadExt;

#[tokio::test(flavor = "multi_thread")]
async fn reader_thread_chunks_input_and_closes_clean() {
    let input = vec![b'x'; STDIN_CHUNK + 10];
    let c = reader_thread(std::io::Cursor::new(input), Handle::current());
    let msgs = drain(&c).await;
    let sizes: Vec<usize> = msgs
        .iter()
        .map(|m| match m {
            Msg::Bytes(b) => b.len(),
            _ => 0,
        })
        .collect();
    assert_eq!(sizes, vec![STDIN_CHUNK, 10]);
    assert_eq!(c.cause(), None);
}

#[tokio::test]
async fn writer_chan_writes_only_bytes() {
    let (w, mut r) = tokio::io::duplex(1024);
    let (c, done) = writer_chan(w);
    c.send(Msg::from("hello ")).await;
    c.send(Msg::Text("dropped".into())).await;
    c.send(Msg::from("world\n")).await;
    c.close(None);
    done.await.unwrap();

    let mut got = String::new();
    r.read_to_string(&mut got).await.unwrap();
    assert_eq!(got, "hello world\n");
}

#[tokio::test]
async fn writer_chan_refuses_after_write_error() {
    let (w, r) = tokio::io::duplex(8);
    drop(r);
    let (c, done) = writer_chan(w);
    c.send(Msg::from("lost")).await;
    done.await.unwrap();
    assert!(c.is_closed());
    assert!(!c.send(Msg::from("late")).await);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS stdin/stdout/stderr as message channels.
//!
//! Only `Bytes` messages reach the OS outputs; every other kind is dropped
//! there.

use ql_core::{Chan, Error, Msg};
use std::io::Read;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Bytes per message read from the OS stdin.
pub const STDIN_CHUNK: usize = 4096;

/// The process standard streams, adapted to channels.
#[derive(Debug)]
pub struct OsStdio {
    pub stdin: Chan,
    pub stdout: Chan,
    pub stderr: Chan,
    writers: Vec<JoinHandle<()>>,
}

impl OsStdio {
    /// Start the adapters. Must be called within a tokio runtime.
    pub fn start() -> Self {
        let (stdout, out_done) = writer_chan(tokio::io::stdout());
        let (stderr, err_done) = writer_chan(tokio::io::stderr());
        Self {
            stdin: reader_thread(std::io::stdin(), Handle::current()),
            stdout,
            stderr,
            writers: vec![out_done, err_done],
        }
    }

    /// Close the outputs and wait until everything sent was written.
    pub async fn finish(self) {
        self.stdout.close(None);
        self.stderr.close(None);
        for w in self.writers {
            let _ = w.await;
        }
    }
}

/// A channel fed by a blocking reader on its own thread.
///
/// The channel is closed at end of input (with the read error, if any) or
/// when a send is refused.
pub fn reader_thread<R: Read + Send + 'static>(mut r: R, rt: Handle) -> Chan {
    let c = Chan::new();
    let tx = c.clone();
    let spawned = std::thread::Builder::new()
        .name("ql-stdin".into())
        .spawn(move || {
            let mut buf = vec![0u8; STDIN_CHUNK];
            loop {
                match r.read(&mut buf) {
                    Ok(0) => {
                        tx.close(None);
                        return;
                    }
                    Ok(n) => {
                        if !rt.block_on(tx.send(Msg::Bytes(buf[..n].to_vec()))) {
                            return;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        tx.close(Some(Error::io("stdin", &e)));
                        return;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        c.close(Some(Error::io("stdin", &e)));
    }
    c
}

/// A channel whose `Bytes` are written to `w` by a background task.
///
/// A write error closes the channel with that error, refusing later sends.
pub fn writer_chan<W: AsyncWrite + Unpin + Send + 'static>(mut w: W) -> (Chan, JoinHandle<()>) {
    let c = Chan::new();
    let rx = c.clone();
    let done = tokio::spawn(async move {
        while let Some(m) = rx.recv().await {
            let Msg::Bytes(b) = m else { continue };
            let res = match w.write_all(&b).await {
                Ok(()) => w.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = res {
                tracing::debug!(error = %e, "output adapter stopped");
                rx.close(Some(Error::Io(e.to_string())));
                return;
            }
        }
    });
    (c, done)
}

#[cfg(test)]
#[path = "stdio_tests.rs"]
mod tests;

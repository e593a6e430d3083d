// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Running host programs as pipe stages.
//!
//! The stage's stdin channel feeds the child's stdin (only `Bytes`), and the
//! child's stdout and stderr are read in fixed-size chunks and sent as
//! `Bytes` on the stage's fd 1 and 2. Signals posted to the stage's context
//! are forwarded to the child.

use ql_core::{Chan, Ctx, Error, Msg, Signal, Status};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};

/// Bytes per message read from a child's stdout or stderr.
pub const EXEC_CHUNK: usize = 8 * 1024;

/// Run the host program at `path` with `argv` (argv[0] included) in `ctx`.
///
/// The child runs in the host directory backing the context's dot (when
/// the namespace maps it to one) with the context's environment. Returns
/// the child's exit status.
pub async fn run_external(ctx: &Ctx, path: &str, argv: &[String]) -> Status {
    let mut cmd = Command::new(path);
    cmd.args(argv.iter().skip(1))
        .env_clear()
        .envs(ctx.env().vars())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = work_dir(ctx) {
        cmd.current_dir(dir);
    }
    let stdin = ctx.stdin();
    cmd.stdin(if stdin.is_null() {
        Stdio::null()
    } else {
        Stdio::piped()
    });

    let mut child = cmd.spawn().map_err(|e| Error::io(path, &e))?;
    tracing::debug!(path, pid = child.id(), "started");

    let feeder = child
        .stdin
        .take()
        .map(|w| tokio::spawn(feed(stdin, w)));
    let mut pumps = Vec::new();
    if let Some(r) = child.stdout.take() {
        pumps.push(tokio::spawn(pump(r, ctx.stdout())));
    }
    if let Some(r) = child.stderr.take() {
        pumps.push(tokio::spawn(pump(r, ctx.stderr())));
    }

    let status = wait_child(ctx, &mut child).await;
    if let Some(f) = feeder {
        f.abort();
    }
    for p in pumps {
        let _ = p.await;
    }
    let status = status.map_err(|e| Error::io(path, &e))?;
    tracing::debug!(path, %status, "exited");
    exit_status(status)
}

fn work_dir(ctx: &Ctx) -> Option<PathBuf> {
    let dot = ctx.dot();
    ctx.ns().host_path(&dot).filter(|p| p.is_dir())
}

/// Wait for the child, forwarding signals posted to `ctx`.
async fn wait_child(ctx: &Ctx, child: &mut Child) -> std::io::Result<ExitStatus> {
    loop {
        tokio::select! {
            status = child.wait() => return status,
            sig = ctx.sig() => match sig {
                Signal::Kill => {
                    tracing::debug!(pid = child.id(), "killing");
                    let _ = child.start_kill();
                }
                Signal::Intr | Signal::Hup => {
                    if let Some(pid) = child.id() {
                        signal_pid(pid, &sig).await;
                    }
                }
                Signal::Other(name) => tracing::debug!(name, "signal not forwarded"),
            },
        }
    }
}

/// Deliver `sig` to a host process through `kill(1)`.
async fn signal_pid(pid: u32, sig: &Signal) {
    let name = match sig {
        Signal::Hup => "-HUP",
        _ => "-INT",
    };
    let res = Command::new("kill")
        .arg(name)
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = res {
        tracing::warn!(pid, error = %e, "failed to signal child");
    }
}

/// Copy the stage's `Bytes` input into the child's stdin.
///
/// Signals are left to [`wait_child`]; the feeder is aborted once the child
/// exits.
async fn feed(input: Chan, mut w: ChildStdin) {
    while let Some(m) = input.recv().await {
        let Msg::Bytes(b) = m else { continue };
        if let Err(e) = w.write_all(&b).await {
            tracing::debug!(error = %e, "child stopped reading");
            input.close(Some(Error::BrokenPipe));
            break;
        }
    }
    let _ = w.shutdown().await;
}

/// Send everything read from `r` as `Bytes` chunks on `out`.
async fn pump<R: AsyncRead + Unpin>(mut r: R, out: Chan) {
    let mut buf = vec![0u8; EXEC_CHUNK];
    loop {
        match r.read(&mut buf).await {
            Ok(0) => return,
            Ok(n) => {
                if !out.send(Msg::Bytes(buf[..n].to_vec())).await {
                    return;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "child output read failed");
                return;
            }
        }
    }
}

/// Map a host exit status to a stage status.
pub fn exit_status(status: ExitStatus) -> Status {
    if status.success() {
        Ok(())
    } else {
        Err(Error::Status(status.to_string()))
    }
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;

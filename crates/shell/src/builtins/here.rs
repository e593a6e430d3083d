// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-ins that change the shell: `cd`, `flag`, `exit`, `wait`, `dup`
//! and `new`.

use super::parse_args;
use crate::exec::{eprint, Shell};
use crate::jobs::DEFAULT_TAG;
use clap::Parser;
use ql_core::{Ctx, Dir, Error, Msg, Status};

#[derive(Parser)]
#[command(name = "cd", disable_help_flag = true)]
struct CdArgs {
    /// Directory; read from the input when missing
    dir: Option<String>,
}

/// `cd [dir]`: the directory is the argument or the first `Dir` (or path
/// text) read from the input. The new directory is sent to the output.
pub(super) async fn cd(ctx: &Ctx, argv: &[String]) -> Status {
    let args: CdArgs = parse_args(ctx, argv).await?;
    let d = match args.dir {
        Some(p) => stat(ctx, &p).await?,
        None => {
            let input = ctx.stdin();
            match ctx.recv(&input).await? {
                Some(Msg::Dir(d)) => d,
                Some(Msg::Bytes(b)) => stat(ctx, String::from_utf8_lossy(&b).trim()).await?,
                Some(m) => {
                    let e = Error::NotDir(m.kind().to_string());
                    ctx.warn(&e.to_string()).await;
                    return Err(e);
                }
                None => {
                    let e = input
                        .cause()
                        .unwrap_or_else(|| Error::Status("no directory".to_string()));
                    ctx.warn(&e.to_string()).await;
                    return Err(e);
                }
            }
        }
    };
    if !d.is_dir() {
        let e = Error::NotDir(d.path().to_string());
        ctx.warn(&e.to_string()).await;
        return Err(e);
    }
    ctx.cd(d.path());
    tracing::debug!(dot = %ctx.dot(), "cd");
    let out = ctx.stdout();
    if !out.is_null() {
        let _ = ctx.send(&out, Msg::Dir(d)).await;
    }
    Ok(())
}

async fn stat(ctx: &Ctx, path: &str) -> Result<Dir, Error> {
    match ctx.ns().stat(&ctx.abs_path(path)).await {
        Ok(d) => Ok(d),
        Err(e) => {
            ctx.warn(&e.to_string()).await;
            Err(e)
        }
    }
}

/// `flag [+-]flags`: show or change the shell flags.
pub(super) async fn flag(sh: &Shell, ctx: &Ctx, argv: &[String]) -> Status {
    match argv {
        [_] => {
            let f = sh.flags();
            let mut s = String::new();
            for (on, c) in [
                (ctx.debug(), 'D'),
                (f.debug_x, 'X'),
                (f.debug_l, 'L'),
                (f.interactive, 'i'),
            ] {
                if on {
                    s.push(c);
                }
            }
            ctx.print(&format!("flags {s}\n")).await
        }
        [_, spec] => {
            let (on, letters) = match spec.strip_prefix('+') {
                Some(rest) => (true, rest),
                None => match spec.strip_prefix('-') {
                    Some(rest) => (false, rest),
                    None => {
                        ctx.set_debug(false);
                        sh.update_flags(|f| {
                            f.debug_x = false;
                            f.debug_l = false;
                        });
                        (true, spec.as_str())
                    }
                },
            };
            for c in letters.chars() {
                match c {
                    'D' => ctx.set_debug(on),
                    'X' => sh.update_flags(|f| f.debug_x = on),
                    'L' => sh.update_flags(|f| f.debug_l = on),
                    'i' => ctx.warn("'-i' cannot be changed").await,
                    other => ctx.warn(&format!("unknown flag '{other}'")).await,
                }
            }
            Ok(())
        }
        _ => {
            eprint(ctx, "usage: flag [+-]flags\n").await;
            Err(Error::Usage)
        }
    }
}

#[derive(Parser)]
#[command(name = "exit", disable_help_flag = true)]
struct ExitArgs {
    status: Option<String>,
}

/// `exit [status]`: in the shell's own context this ends the shell.
pub(super) async fn exit(sh: &Shell, ctx: &Ctx, argv: &[String]) -> Status {
    let args: ExitArgs = parse_args(ctx, argv).await?;
    let sts = match args.status.as_deref() {
        None | Some("") => Ok(()),
        Some(s) => Err(Error::from_status(s)),
    };
    if sh.is_main(ctx) {
        sh.request_exit(sts.clone());
    }
    sts
}

#[derive(Parser)]
#[command(name = "wait", disable_help_flag = true)]
struct WaitArgs {
    #[arg(default_value = DEFAULT_TAG)]
    tag: String,
}

/// `wait [tag]`: wait for the jobs started with that tag.
pub(super) async fn wait(sh: &Shell, ctx: &Ctx, argv: &[String]) -> Status {
    let args: WaitArgs = parse_args(ctx, argv).await?;
    sh.jobs().wait(&args.tag).await
}

#[derive(Parser)]
#[command(disable_help_flag = true)]
struct ResourceArgs {
    /// ns, io, env or dot
    #[arg(required = true)]
    names: Vec<String>,
}

/// `dup res...` and `new res...`: give the shell a private copy, or a
/// fresh one, of each named resource.
pub(super) async fn resources(ctx: &Ctx, argv: &[String], fresh: bool) -> Status {
    let args: ResourceArgs = parse_args(ctx, argv).await?;
    let mut sts = Ok(());
    for name in &args.names {
        match (name.as_str(), fresh) {
            ("ns", false) => ctx.dup_ns(),
            ("ns", true) => ctx.new_ns(),
            ("io", false) => ctx.dup_io(),
            ("io", true) => ctx.new_io(),
            ("env", false) => ctx.dup_env(),
            ("env", true) => ctx.new_env(),
            ("dot", false) => ctx.dup_dot(),
            ("dot", true) => ctx.new_dot(),
            (other, _) => {
                ctx.warn(&format!("unknown resource '{other}'")).await;
                sts = Err(Error::Usage);
            }
        }
    }
    sts
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in filters: `lf`/`gf`, `pf`, `echo`, `pwd`, `sleep` and `type`.

use super::{parse_args, Builtin};
use crate::exec::Shell;
use clap::Parser;
use ql_core::{paths, Chan, Ctx, Dir, Error, Msg, Status};
use std::time::Duration;

/// Name `lf` lists when given none.
const DEFAULT_NAME: &str = ".,1";

#[derive(Parser)]
#[command(name = "lf", disable_help_flag = true)]
struct LfArgs {
    /// Debug this command
    #[arg(short = 'D')]
    debug: bool,
    /// Stream file contents after each file entry
    #[arg(short = 'g')]
    get: bool,
    names: Vec<String>,
}

/// `lf [-g] [name...]` and `gf [name...]`: list entries (and contents)
/// for `path,pred` names.
pub(super) async fn lf(ctx: &Ctx, argv: &[String]) -> Status {
    let mut args: LfArgs = parse_args(ctx, argv).await?;
    if argv.first().is_some_and(|a| a == "gf") {
        args.get = true;
    }
    if args.debug {
        ctx.set_debug(true);
    }
    if args.names.is_empty() {
        args.names.push(DEFAULT_NAME.to_string());
    }
    let found = if args.get {
        ctx.files(&args.names)
    } else {
        ctx.dirs(&args.names)
    };
    let out = ctx.stdout();
    let mut sts = Ok(());
    loop {
        let m = match ctx.recv(&found).await {
            Ok(Some(m)) => m,
            Ok(None) => break,
            Err(e) => {
                found.close(Some(e.clone()));
                return Err(e);
            }
        };
        match m {
            Msg::Err(e) => {
                ctx.warn(&e.to_string()).await;
                sts = Err(e);
            }
            // Failed entries are followed by their error.
            Msg::Dir(d) if !d.err().is_empty() => {}
            m => {
                if let Err(e) = ctx.send(&out, m).await {
                    found.close(Some(e.clone()));
                    return Err(e);
                }
            }
        }
    }
    sts
}

#[derive(Parser)]
#[command(name = "pf", disable_help_flag = true)]
struct PfArgs {
    #[arg(short = 'D')]
    debug: bool,
    /// Long listing
    #[arg(short = 'l')]
    long: bool,
    /// Print base names only
    #[arg(short = 'p')]
    base: bool,
    /// Print every attribute as JSON
    #[arg(short = 'v')]
    verbose: bool,
    /// Drop file data
    #[arg(short = 'd')]
    no_data: bool,
    /// Drop directory entries
    #[arg(short = 'f')]
    no_dirs: bool,
    /// Print addresses
    #[arg(short = 'x')]
    addrs: bool,
    /// Print strings
    #[arg(short = 's')]
    strings: bool,
    /// Print strings within brackets
    #[arg(short = 'S')]
    quoted: bool,
    names: Vec<String>,
}

impl PfArgs {
    fn format_dir(&self, d: &Dir) -> String {
        let mut line = if self.verbose {
            serde_json::to_string(d).unwrap_or_else(|_| d.path().to_string())
        } else if self.long {
            d.long()
        } else if self.base {
            paths::base(d.path()).to_string()
        } else if d.upath().is_empty() {
            d.path().to_string()
        } else {
            d.upath().to_string()
        };
        line.push('\n');
        line
    }

    /// The message to print for `m`, or `None` to drop it.
    fn format(&self, m: Msg) -> Option<Msg> {
        let text = match m {
            Msg::Bytes(b) => return (!self.no_data).then_some(Msg::Bytes(b)),
            Msg::Dir(_) if self.no_dirs => return None,
            Msg::Dir(d) => self.format_dir(&d),
            Msg::Addr(a) if self.addrs => format!("{a}:\n"),
            Msg::Addr(_) => return None,
            Msg::Text(s) if self.quoted => format!("[{s}]"),
            Msg::Text(s) if self.strings => s,
            Msg::Text(_) => return None,
            other => return Some(other),
        };
        Some(Msg::Bytes(text.into_bytes()))
    }
}

/// `pf [flags] [name...]`: print the input stream, then the named files,
/// as text.
pub(super) async fn pf(ctx: &Ctx, argv: &[String]) -> Status {
    let args: PfArgs = parse_args(ctx, argv).await?;
    if args.debug {
        ctx.set_debug(true);
    }
    let out = ctx.stdout();
    let mut sts = print_stream(ctx, &args, &ctx.stdin(), &out).await;
    if !args.names.is_empty() {
        let files = ctx.files(&args.names);
        if let Err(e) = print_stream(ctx, &args, &files, &out).await {
            sts = Err(e);
        }
    }
    sts
}

async fn print_stream(ctx: &Ctx, args: &PfArgs, input: &Chan, out: &Chan) -> Status {
    while let Some(m) = ctx.recv(input).await? {
        if let Msg::Err(e) = &m {
            ctx.warn(&e.to_string()).await;
            continue;
        }
        if let Some(m) = args.format(m) {
            if let Err(e) = ctx.send(out, m).await {
                input.close(Some(e.clone()));
                return Err(e);
            }
        }
    }
    input.status()
}

#[derive(Parser)]
#[command(name = "echo", disable_help_flag = true)]
struct EchoArgs {
    #[arg(short = 'D')]
    debug: bool,
    /// No final newline
    #[arg(short = 'g')]
    no_newline: bool,
    #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
    words: Vec<String>,
}

/// `echo [-g] word...`: the words joined by spaces, as one message.
pub(super) async fn echo(ctx: &Ctx, argv: &[String]) -> Status {
    let args: EchoArgs = parse_args(ctx, argv).await?;
    if args.debug {
        ctx.set_debug(true);
    }
    let mut line = args.words.join(" ");
    if !args.no_newline {
        line.push('\n');
    }
    if let Err(e) = ctx.print(&line).await {
        ctx.warn(&format!("stdout: {e}")).await;
        return Err(e);
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "pwd", disable_help_flag = true)]
struct PwdArgs {}

pub(super) async fn pwd(ctx: &Ctx, argv: &[String]) -> Status {
    let _: PwdArgs = parse_args(ctx, argv).await?;
    ctx.print(&format!("{}\n", ctx.dot())).await
}

#[derive(Parser)]
#[command(name = "sleep", disable_help_flag = true)]
struct SleepArgs {
    /// Seconds, or a duration such as 500ms or 1m30s
    ival: String,
}

/// `sleep ival`: wait, giving up on any signal.
pub(super) async fn sleep(ctx: &Ctx, argv: &[String]) -> Status {
    let args: SleepArgs = parse_args(ctx, argv).await?;
    let Some(d) = parse_duration(&args.ival) else {
        ctx.warn(&format!("bad interval '{}'", args.ival)).await;
        return Err(Error::Usage);
    };
    tokio::select! {
        _ = tokio::time::sleep(d) => Ok(()),
        sig = ctx.sig() => {
            tracing::debug!(%sig, "sleep interrupted");
            Err(Error::Intr)
        }
    }
}

/// Parse `10`, `1.5s`, `300ms` or `1h2m3s`. A bare number is seconds.
pub(crate) fn parse_duration(s: &str) -> Option<Duration> {
    if s.is_empty() {
        return None;
    }
    if s.ends_with(|c: char| c.is_ascii_digit()) {
        return s.parse::<f64>().ok().and_then(secs);
    }
    let mut total = 0.0;
    let mut rest = s;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        let unit_end = rest[num_end..]
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .map_or(rest.len(), |i| i + num_end);
        let n: f64 = rest[..num_end].parse().ok()?;
        let scale = match &rest[num_end..unit_end] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return None,
        };
        total += n * scale;
        rest = &rest[unit_end..];
    }
    secs(total)
}

/// Rounded to the nanosecond.
fn secs(n: f64) -> Option<Duration> {
    let ns = (n * 1e9).round();
    (ns.is_finite() && ns >= 0.0 && ns < u64::MAX as f64).then(|| Duration::from_nanos(ns as u64))
}

#[derive(Parser)]
#[command(name = "type", disable_help_flag = true)]
struct TypeArgs {
    names: Vec<String>,
}

/// `type name...`: say what each name runs.
pub(super) async fn type_of(sh: &Shell, ctx: &Ctx, argv: &[String]) -> Status {
    let args: TypeArgs = parse_args(ctx, argv).await?;
    for name in &args.names {
        let what = if Builtin::from_name(name).is_some() {
            "builtin".to_string()
        } else if sh.func(name).is_some() {
            "func".to_string()
        } else if !ctx.get_env(name).is_empty() {
            "env".to_string()
        } else {
            match sh.look_cmd(ctx, name).await {
                Some(path) => format!("external: {path}"),
                None => "external".to_string(),
            }
        };
        ctx.print(&format!("{name}: {what}\n")).await?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "filters_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ql - a shell for structured streams

mod env;

use anyhow::{Context, Result};
use clap::Parser;
use ql_adapters::OsStdio;
use ql_core::value::encode_list;
use ql_core::{post_all, Ctx, Signal};
use ql_shell::{Flags, Interp, Script};
use std::io::IsTerminal;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "ql",
    version,
    about = "ql - a shell for structured streams",
    disable_help_flag = true
)]
struct Cli {
    /// Debug
    #[arg(short = 'D')]
    debug: bool,
    /// Debug the lexer
    #[arg(short = 'L')]
    debug_lex: bool,
    /// Debug the executor
    #[arg(short = 'X')]
    debug_exec: bool,
    /// Dry run: parse and print commands
    #[arg(short = 'n')]
    dry: bool,
    /// Interactive
    #[arg(short = 'i')]
    interactive: bool,
    /// Run CMD without pipe rewrites
    #[arg(short = 'c', value_name = "CMD", conflicts_with = "rewrite_cmd")]
    cmd: Option<String>,
    /// Run CMD with pipe rewrites
    #[arg(short = 'x', value_name = "CMD")]
    rewrite_cmd: Option<String>,
    /// Script file and its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Cli {
    fn flags(&self, interactive: bool) -> Flags {
        Flags {
            debug_x: self.debug_exec,
            debug_l: self.debug_lex,
            interactive,
            dry: self.dry,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(&cli);
    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("ql: {e:#}");
            std::process::exit(1);
        }
    }
}

fn setup_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let mut filter = EnvFilter::new(env::log_filter().as_deref().unwrap_or("warn"));
    for (on, target) in [
        (cli.debug, "ql"),
        (cli.debug_lex, "ql_shell::lexer"),
        (cli.debug_exec, "ql_shell::exec"),
    ] {
        if !on {
            continue;
        }
        match format!("{target}=debug").parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("ql: bad log target {target}: {e}"),
        }
    }
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// The script to run and the arguments it sees, `argv[0]` first.
fn script_for(cli: &Cli) -> Result<(Script, Vec<String>)> {
    let with_ql = |rest: &[String]| {
        let mut argv = vec!["ql".to_string()];
        argv.extend_from_slice(rest);
        argv
    };
    if let Some(cmd) = &cli.cmd {
        return Ok((Script::command(cmd, false), with_ql(&cli.args)));
    }
    if let Some(cmd) = &cli.rewrite_cmd {
        return Ok((Script::command(cmd, true), with_ql(&cli.args)));
    }
    match cli.args.first() {
        Some(file) => {
            let text =
                std::fs::read_to_string(file).with_context(|| format!("can't read {file}"))?;
            let script = Script::Text {
                name: file.clone(),
                text,
            };
            Ok((script, cli.args.clone()))
        }
        None => Ok((Script::Stdin, with_ql(&[]))),
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let (script, argv) = script_for(&cli)?;
    let interactive =
        cli.interactive || (matches!(script, Script::Stdin) && std::io::stdin().is_terminal());
    let ns = ql_adapters::ns_from_env(cli.debug).context("bad namespace")?;
    let dot = std::env::current_dir().context("no working directory")?;

    let stdio = OsStdio::start();
    let ctx = Ctx::builder()
        .stdin(stdio.stdin.clone())
        .stdout(stdio.stdout.clone())
        .stderr(stdio.stderr.clone())
        .envs(env::vars())
        .dot(dot.display().to_string())
        .ns(Arc::new(ns))
        .args(argv.clone())
        .build();
    if let Some(arg0) = argv.first() {
        ctx.set_env("argv0", arg0);
    }
    ctx.set_env("argv", &encode_list(&argv));
    ctx.set_debug(cli.debug);

    tokio::spawn(async {
        while tokio::signal::ctrl_c().await.is_ok() {
            let n = post_all(Signal::Intr);
            tracing::debug!(contexts = n, "interrupt");
        }
    });

    tracing::debug!(interactive, args = argv.len(), "starting");
    let sts = Interp::new(ctx, cli.flags(interactive)).run(script).await;
    stdio.finish().await;
    match sts {
        Ok(()) => Ok(0),
        Err(e) => {
            tracing::debug!(status = %e, "exit");
            Ok(1)
        }
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in commands.
//!
//! "Here" built-ins act on the shell itself and run in its own context
//! when used as a plain command. The rest are filters that run as pipe
//! stages like any external command.

mod filters;
mod here;

use crate::exec::{eprint, Shell};
use ql_core::{Ctx, Error, Status};

/// Built-ins that must run in the shell's own context.
pub const HERE_BUILTINS: &[&str] = &["cd", "flag", "exit", "wait", "dup", "new"];

/// Commands a bare top-level pipe is never rewritten into a listing for.
pub const NO_REWRITES: &[&str] = &["type", "echo", ":", "lf", "gf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Flag,
    Exit,
    Wait,
    Dup,
    New,
    Type,
    Lf,
    Pf,
    Echo,
    Pwd,
    Sleep,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        let b = match name {
            "cd" => Builtin::Cd,
            "flag" => Builtin::Flag,
            "exit" => Builtin::Exit,
            "wait" => Builtin::Wait,
            "dup" => Builtin::Dup,
            "new" => Builtin::New,
            "type" => Builtin::Type,
            "lf" | "gf" => Builtin::Lf,
            "pf" => Builtin::Pf,
            "echo" => Builtin::Echo,
            "pwd" => Builtin::Pwd,
            "sleep" => Builtin::Sleep,
            _ => return None,
        };
        Some(b)
    }

    pub fn is_here(self) -> bool {
        matches!(
            self,
            Builtin::Cd
                | Builtin::Flag
                | Builtin::Exit
                | Builtin::Wait
                | Builtin::Dup
                | Builtin::New
        )
    }

    /// Run with `argv` (including the command name) in `ctx`.
    pub async fn run(self, sh: &Shell, ctx: &Ctx, argv: &[String]) -> Status {
        tracing::debug!(builtin = ?self, args = argv.len(), "running builtin");
        match self {
            Builtin::Cd => here::cd(ctx, argv).await,
            Builtin::Flag => here::flag(sh, ctx, argv).await,
            Builtin::Exit => here::exit(sh, ctx, argv).await,
            Builtin::Wait => here::wait(sh, ctx, argv).await,
            Builtin::Dup => here::resources(ctx, argv, false).await,
            Builtin::New => here::resources(ctx, argv, true).await,
            Builtin::Type => filters::type_of(sh, ctx, argv).await,
            Builtin::Lf => filters::lf(ctx, argv).await,
            Builtin::Pf => filters::pf(ctx, argv).await,
            Builtin::Echo => filters::echo(ctx, argv).await,
            Builtin::Pwd => filters::pwd(ctx, argv).await,
            Builtin::Sleep => filters::sleep(ctx, argv).await,
        }
    }
}

/// Parse built-in flags with clap, reporting failures the shell way.
async fn parse_args<T: clap::Parser>(ctx: &Ctx, argv: &[String]) -> Result<T, Error> {
    match T::try_parse_from(argv) {
        Ok(args) => Ok(args),
        Err(e) => {
            let text = e.to_string();
            let first = text.lines().next().unwrap_or_default();
            ctx.warn(first.trim_start_matches("error: ")).await;
            let usage = T::command().render_usage().to_string();
            eprint(ctx, &format!("{}\n", usage.replacen("Usage:", "usage:", 1))).await;
            Err(Error::Usage)
        }
    }
}

#[cfg(test)]
#[path = "builtins_tests.rs"]
mod tests;

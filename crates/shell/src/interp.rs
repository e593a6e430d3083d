// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The interpreter: reads top-level items and runs them one at a time.
//!
//! Parsing is synchronous, so the loop runs on a blocking thread and
//! drives each command to completion with [`Handle::block_on`] before
//! reading the next one. Prompts therefore show up only once the
//! previous command is done.

use crate::ast::Cmd;
use crate::env;
use crate::exec::{eprint, Flags, Shell};
use crate::input::{ChanInput, Input, TextInput};
use crate::lexer::{Console, Lexer};
use crate::parser::{Item, Parser};
use ql_core::{Ctx, Error, Msg, Status};
use tokio::runtime::Handle;

/// Status of a run that saw parse errors.
pub const ERRORS_STATUS: &str = "errors";

/// Where the commands come from.
pub enum Script {
    /// Text given on the command line or read from a file.
    Text { name: String, text: String },
    /// The context's standard input.
    Stdin,
}

impl Script {
    /// A `-c`/`-x` command. Without rewrites it runs as one block.
    pub fn command(cmd: &str, rewrite: bool) -> Self {
        let text = if rewrite {
            cmd.to_string()
        } else {
            format!("{{{cmd}\n}}")
        };
        Script::Text {
            name: "flag-c".to_string(),
            text,
        }
    }
}

/// Runs scripts in one context with one shell.
pub struct Interp {
    ctx: Ctx,
    shell: Shell,
}

impl Interp {
    pub fn new(ctx: Ctx, flags: Flags) -> Self {
        let shell = Shell::new(&ctx, flags);
        Self { ctx, shell }
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn ctx(&self) -> &Ctx {
        &self.ctx
    }

    /// Run `script` to its end, or until `exit`.
    ///
    /// The status is the one given to `exit`, else `"errors"` after parse
    /// errors, else the last pipe's `$status`.
    pub async fn run(self, script: Script) -> Status {
        let rt = Handle::current();
        let res = tokio::task::spawn_blocking(move || self.run_blocking(&rt, script)).await;
        match res {
            Ok(sts) => sts,
            Err(e) if e.is_panic() => Err(Error::Status("panic".to_string())),
            Err(_) => Err(Error::Intr),
        }
    }

    fn run_blocking(&self, rt: &Handle, script: Script) -> Status {
        let interactive = self.shell.flags().interactive;
        let mut lex = match script {
            Script::Text { name, text } => Lexer::from_text(&name, &text),
            Script::Stdin => {
                let input = ChanInput::new(self.ctx.clone(), self.ctx.stdin(), rt.clone());
                Lexer::new("stdin", Box::new(input))
            }
        };
        lex.set_interactive(interactive);
        lex.set_console(Box::new(Prompter {
            ctx: self.ctx.clone(),
            shell: self.shell.clone(),
            rt: rt.clone(),
        }));
        if interactive {
            if let Some(rc) = env::rc_file().filter(|p| p.is_file()) {
                match std::fs::read(&rc) {
                    Ok(data) => lex.push_source(
                        &format!("included:{}", rc.display()),
                        Box::new(TextInput::from_bytes(&data)),
                    ),
                    Err(e) => tracing::warn!(path = %rc.display(), error = %e, "can't read init file"),
                }
            }
        }
        let errors = self.run_items(rt, Parser::new(lex), interactive)?;
        self.final_status(errors)
    }

    /// Run every item; returns how many parse errors were seen.
    fn run_items(&self, rt: &Handle, mut parser: Parser, interactive: bool) -> Result<usize, Error> {
        let mut errors = 0;
        loop {
            let item = match parser.next_item() {
                Ok(Some(item)) => item,
                Ok(None) => break,
                Err(e) if e.is_interrupt() => {
                    if !interactive {
                        return Err(Error::Intr);
                    }
                    rt.block_on(eprint(&self.ctx, "\n"));
                    continue;
                }
                Err(e) => {
                    rt.block_on(self.ctx.warn(&e.to_string()));
                    errors += 1;
                    if interactive {
                        continue;
                    }
                    break;
                }
            };
            match item {
                Item::Func { name, body, .. } => self.shell.define(&name, body),
                Item::Source { path, .. } => match rt.block_on(self.read_source(&path)) {
                    Ok(data) => parser.lexer_mut().push_source(
                        &format!("included:{path}"),
                        Box::new(TextInput::from_bytes(&data)),
                    ),
                    Err(e) => {
                        rt.block_on(self.ctx.warn(&e.to_string()));
                        errors += 1;
                    }
                },
                Item::Cmd(cmd) => {
                    let sts = rt.block_on(self.run_top(&cmd));
                    if matches!(sts, Err(Error::Intr)) && !interactive {
                        return Err(Error::Intr);
                    }
                }
            }
            if self.shell.exit_status().is_some() {
                break;
            }
        }
        Ok(errors)
    }

    async fn run_top(&self, cmd: &Cmd) -> Status {
        let flags = self.shell.flags();
        if flags.dry {
            return self.ctx.print(&cmd.to_string()).await;
        }
        if flags.debug_x {
            eprint(&self.ctx, &cmd.to_string()).await;
        }
        self.shell.run_cmd(&self.ctx, cmd).await
    }

    /// Contents of a sourced file.
    async fn read_source(&self, path: &str) -> Result<Vec<u8>, Error> {
        let data = self.ctx.ns().get(&self.ctx.abs_path(path), 0, None);
        let mut out = Vec::new();
        while let Some(m) = self.ctx.recv(&data).await? {
            if let Msg::Bytes(b) = m {
                out.extend_from_slice(&b);
            }
        }
        data.status()?;
        Ok(out)
    }

    fn final_status(&self, errors: usize) -> Status {
        if let Some(sts) = self.shell.exit_status() {
            return sts;
        }
        if errors > 0 {
            return Err(Error::Status(ERRORS_STATUS.to_string()));
        }
        if self.shell.flags().dry {
            return Ok(());
        }
        match self.ctx.get_env("status") {
            s if s.is_empty() => Ok(()),
            s => Err(Error::from_status(&s)),
        }
    }
}

/// Prompts and lexer traces, written through the shell's context.
struct Prompter {
    ctx: Ctx,
    shell: Shell,
    rt: Handle,
}

impl Console for Prompter {
    fn prompt(&mut self, nest: usize) {
        let ps = self.shell.prompt(nest);
        let _ = self.rt.block_on(self.ctx.print(&ps));
    }

    fn tracing(&self) -> bool {
        self.shell.flags().debug_l
    }

    fn trace(&mut self, line: &str) {
        self.rt
            .block_on(eprint(&self.ctx, &format!("{line}\n")));
    }
}

#[cfg(test)]
#[path = "interp_tests.rs"]
mod tests;

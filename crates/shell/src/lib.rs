// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The ql shell language: lexer, parser, expander and executor.
//!
//! # Quick Start
//!
//! ```ignore
//! use ql_shell::{Flags, Interp, Script};
//!
//! let interp = Interp::new(ctx, Flags::default());
//! interp.run(Script::command("lf /tmp/ | pf -l", true)).await?;
//! ```
//!
//! # Pipeline
//!
//! ```text
//! source text
//! └── Lexer      tokens, prompts, sourced files
//!     └── Parser     Item (Cmd, func, source) with top-level rewrites
//!         └── Shell      expansion, redirections, stages as tasks
//! ```
//!
//! A top-level pipe whose first command is not a built-in filter is
//! rewritten into a listing: `/tmp/ | wc` runs as `lf /tmp/ | wc` and a
//! bare `/tmp/` as `lf /tmp/ | pf`.

mod ast;
mod builtins;
mod env;
mod exec;
mod expand;
mod input;
mod interp;
mod jobs;
mod lexer;
mod lines;
mod parse_error;
mod parser;
mod redirs;
mod span;
#[cfg(test)]
mod testing;
mod token;

pub use ast::{
    summary, Cmd, Cond, HereKind, Pipe, Redir, RedirTarget, Set, SetValue, Stage, StageKind, Word,
};
pub use builtins::{Builtin, HERE_BUILTINS, NO_REWRITES};
pub use env::{rc_file, search_path, DEFAULT_PATH, DEFAULT_PROMPTS};
pub use exec::{Flags, Shell};
pub use input::{ChanInput, Input, TextInput};
pub use interp::{Interp, Script, ERRORS_STATUS};
pub use jobs::{Jobs, DEFAULT_TAG};
pub use lexer::{Console, Lexer};
pub use parse_error::{LexError, ParseError};
pub use parser::{Item, Parser};
pub use span::Span;
pub use token::{Token, TokenKind};

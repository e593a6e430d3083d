// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Character sources for the lexer.

use super::parse_error::LexError;
use ql_core::{Chan, Ctx, Error, Msg};
use std::collections::VecDeque;
use tokio::runtime::Handle;

/// A source of characters.
///
/// Implementations may block; the lexer runs on a blocking thread.
pub trait Input: Send {
    /// The next character, or `None` at end of input.
    fn next_char(&mut self) -> Result<Option<char>, LexError>;
}

/// Input from an in-memory string (scripts, `-c` commands, sourced files).
#[derive(Debug, Clone)]
pub struct TextInput {
    chars: Vec<char>,
    pos: usize,
}

impl TextInput {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    /// Decode file contents, replacing invalid UTF-8.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self::new(&String::from_utf8_lossy(data))
    }
}

impl Input for TextInput {
    fn next_char(&mut self) -> Result<Option<char>, LexError> {
        let c = self.chars.get(self.pos).copied();
        if c.is_some() {
            self.pos += 1;
        }
        Ok(c)
    }
}

/// Input read from a channel of `Bytes` messages (the shell's stdin).
///
/// Receives go through the context so an interrupt while waiting for
/// input surfaces as [`LexError::Interrupted`]. Multi-byte characters
/// split across messages are carried over to the next message.
pub struct ChanInput {
    ctx: Ctx,
    chan: Chan,
    rt: Handle,
    pending: VecDeque<char>,
    carry: Vec<u8>,
    done: bool,
}

impl ChanInput {
    pub fn new(ctx: Ctx, chan: Chan, rt: Handle) -> Self {
        Self {
            ctx,
            chan,
            rt,
            pending: VecDeque::new(),
            carry: Vec::new(),
            done: false,
        }
    }

    fn fill(&mut self) -> Result<(), LexError> {
        while self.pending.is_empty() && !self.done {
            let got = self.rt.block_on(self.ctx.recv(&self.chan));
            match got {
                Ok(Some(Msg::Bytes(b))) => self.decode(&b),
                Ok(Some(Msg::Text(s))) => self.pending.extend(s.chars()),
                Ok(Some(_)) => {}
                Ok(None) => {
                    self.done = true;
                    if !self.carry.is_empty() {
                        let rest = std::mem::take(&mut self.carry);
                        self.pending.extend(String::from_utf8_lossy(&rest).chars());
                    }
                    if let Some(e) = self.chan.cause() {
                        if !self.pending.is_empty() {
                            return Ok(());
                        }
                        return Err(LexError::Input(e));
                    }
                }
                Err(Error::Intr) => return Err(LexError::Interrupted),
                Err(e) => return Err(LexError::Input(e)),
            }
        }
        Ok(())
    }

    fn decode(&mut self, b: &[u8]) {
        self.carry.extend_from_slice(b);
        let valid = match std::str::from_utf8(&self.carry) {
            Ok(s) => s.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => {
                let all = std::mem::take(&mut self.carry);
                self.pending.extend(String::from_utf8_lossy(&all).chars());
                return;
            }
        };
        let rest = self.carry.split_off(valid);
        let text = std::mem::replace(&mut self.carry, rest);
        self.pending.extend(String::from_utf8_lossy(&text).chars());
    }
}

impl Input for ChanInput {
    fn next_char(&mut self) -> Result<Option<char>, LexError> {
        self.fill()?;
        Ok(self.pending.pop_front())
    }
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;

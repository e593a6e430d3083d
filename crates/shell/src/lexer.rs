// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lexer for ql source.
//!
//! Reads characters from a stack of [`Input`]s: sourcing a file pushes it
//! on top and its end pops back to the includer. Sourced files and
//! non-interactive input get a final newline so the last command is
//! always terminated.
//!
//! Words are maximal runs of characters that are neither white space nor
//! one of `` '←`<>{}&;[]|#^ ``, so `=`, `$` and `,` inside a word do not
//! break it. Quoting uses `'` (or `` ` ``); a doubled quote inside a quoted
//! word is a literal quote.

use super::input::Input;
use super::parse_error::LexError;
use super::span::Span;
use super::token::{Token, TokenKind};

/// Runes that end a word.
const PUNCT: &str = "'←`<>{}&;[]|#^";

fn is_punct(c: char) -> bool {
    c.is_whitespace() || PUNCT.contains(c)
}

/// The interactive side of the lexer: prompts and token tracing.
pub trait Console: Send {
    /// Show the prompt; `nest` is the number of open blocks.
    fn prompt(&mut self, nest: usize);

    /// True when tokens should be traced through [`Console::trace`].
    fn tracing(&self) -> bool {
        false
    }

    fn trace(&mut self, _line: &str) {}
}

struct Source {
    input: Box<dyn Input>,
    span: Span,
    eof: bool,
    /// Last char read was a newline, or nothing was read yet.
    at_nl: bool,
}

pub struct Lexer {
    sources: Vec<Source>,
    saved: Option<char>,
    wasnl: bool,
    interactive: bool,
    nest: usize,
    console: Option<Box<dyn Console>>,
}

impl Lexer {
    pub fn new(name: &str, input: Box<dyn Input>) -> Self {
        Self {
            sources: vec![Source {
                input,
                span: Span::start(name),
                eof: false,
                at_nl: true,
            }],
            saved: None,
            wasnl: true,
            interactive: false,
            nest: 0,
            console: None,
        }
    }

    /// Lex a string with no console; mostly for tests.
    pub fn from_text(name: &str, text: &str) -> Self {
        Self::new(name, Box::new(super::input::TextInput::new(text)))
    }

    pub fn set_interactive(&mut self, on: bool) {
        self.interactive = on;
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn set_console(&mut self, console: Box<dyn Console>) {
        self.console = Some(console);
    }

    /// Read `input` before the rest of the current source.
    pub fn push_source(&mut self, name: &str, input: Box<dyn Input>) {
        tracing::debug!(name, "source");
        self.saved = None;
        self.sources.push(Source {
            input,
            span: Span::start(name),
            eof: false,
            at_nl: true,
        });
    }

    /// Position of the next token.
    pub fn span(&self) -> Span {
        self.sources
            .last()
            .map(|s| s.span.clone())
            .unwrap_or_default()
    }

    /// True once the outermost source is exhausted.
    pub fn at_eof(&self) -> bool {
        self.sources.len() == 1 && self.sources.first().is_some_and(|s| s.eof)
    }

    /// Forget open blocks; used when a statement is discarded.
    pub fn reset(&mut self) {
        self.nest = 0;
        self.saved = None;
        self.wasnl = true;
    }

    fn bump_line(&mut self) {
        if let Some(s) = self.sources.last_mut() {
            s.span.line += 1;
        }
    }

    fn get(&mut self) -> Result<Option<char>, LexError> {
        if let Some(c) = self.saved.take() {
            return Ok(Some(c));
        }
        loop {
            let depth = self.sources.len();
            let Some(src) = self.sources.last_mut() else {
                return Ok(None);
            };
            let res = src.input.next_char();
            match res {
                Ok(Some(c)) => {
                    src.at_nl = c == '\n';
                    return Ok(Some(c));
                }
                Ok(None) => {
                    // Close an unterminated last line.
                    if !src.eof && !src.at_nl && (!self.interactive || depth > 1) {
                        src.eof = true;
                        return Ok(Some('\n'));
                    }
                    src.eof = true;
                    if depth > 1 {
                        self.sources.pop();
                        continue;
                    }
                    return Ok(None);
                }
                Err(LexError::Interrupted) => {
                    self.reset();
                    return Err(LexError::Interrupted);
                }
                Err(e) => {
                    src.eof = true;
                    return Err(e);
                }
            }
        }
    }

    fn unget(&mut self, c: Option<char>) {
        self.saved = c;
    }

    /// The next token.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let kind = self.lex()?;
        match &kind {
            TokenKind::LBrace
            | TokenKind::TeeBlk
            | TokenKind::InBlk
            | TokenKind::RawInBlk
            | TokenKind::SingleInBlk
            | TokenKind::PipeBlk => self.nest += 1,
            TokenKind::RBrace => self.nest = self.nest.saturating_sub(1),
            _ => {}
        }
        let mut span = self.span();
        if kind == TokenKind::Nl {
            span.line = span.line.saturating_sub(1).max(1);
        }
        tracing::trace!(%span, tok = %kind, "tok");
        if let Some(con) = self.console.as_mut() {
            if con.tracing() {
                con.trace(&format!("{span}: tok {kind}"));
            }
        }
        Ok(Token::new(kind, span))
    }

    fn lex(&mut self) -> Result<TokenKind, LexError> {
        let mut prompted = false;
        let c = loop {
            if self.interactive && self.wasnl && !prompted && self.sources.len() == 1 {
                if let Some(con) = self.console.as_mut() {
                    con.prompt(self.nest);
                }
                prompted = true;
            }
            let mut c = self.get()?;
            if c == Some('#') {
                c = self.skip_comment()?;
            }
            match c {
                None => {
                    self.wasnl = true;
                    return Ok(TokenKind::Eof);
                }
                Some('\n') => {
                    self.bump_line();
                    self.wasnl = true;
                    return Ok(TokenKind::Nl);
                }
                Some('%') if self.wasnl => continue,
                Some(c) if c.is_whitespace() => continue,
                Some(c) => break c,
            }
        };
        self.wasnl = false;
        let kind = match c {
            '\'' | '`' => return self.scan_quote(c),
            '←' | '=' => TokenKind::Eq,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ';' => TokenKind::Semi,
            '[' => TokenKind::LBrack,
            ']' => TokenKind::RBrack,
            '^' => TokenKind::Caret,
            '|' => match self.get()? {
                Some('|') => TokenKind::Or,
                Some('>') => TokenKind::GfPipe,
                other => {
                    self.unget(other);
                    TokenKind::Pipe
                }
            },
            '&' => match self.get()? {
                Some('&') => TokenKind::And,
                other => {
                    self.unget(other);
                    TokenKind::Amp
                }
            },
            '$' => match self.get()? {
                Some('#') => TokenKind::Len,
                Some('"') => return self.scan_join(),
                other => {
                    self.unget(other);
                    TokenKind::Dollar
                }
            },
            '<' => return self.scan_in(),
            '>' => match self.get()? {
                Some('>') => TokenKind::App,
                Some('{') => TokenKind::TeeBlk,
                other => {
                    self.unget(other);
                    TokenKind::Gt
                }
            },
            '-' => match self.get()? {
                Some('|') => TokenKind::InPipe,
                other => {
                    self.unget(other);
                    return self.scan_name('-');
                }
            },
            c => return self.scan_name(c),
        };
        Ok(kind)
    }

    fn skip_comment(&mut self) -> Result<Option<char>, LexError> {
        loop {
            match self.get()? {
                None => return Ok(None),
                Some('\n') => return Ok(Some('\n')),
                Some(_) => {}
            }
        }
    }

    /// After `<`: `<{`, `<<{`, `<<<{`, `<|{` or a plain `<`.
    fn scan_in(&mut self) -> Result<TokenKind, LexError> {
        let c = self.get()?;
        match c {
            Some('{') => Ok(TokenKind::InBlk),
            Some(k @ ('<' | '|')) => match self.get()? {
                Some('{') if k == '|' => Ok(TokenKind::PipeBlk),
                Some('{') => Ok(TokenKind::RawInBlk),
                Some('<') if k == '<' => match self.get()? {
                    Some('{') => Ok(TokenKind::SingleInBlk),
                    _ => Err(LexError::BadToken {
                        text: "<<<".to_string(),
                    }),
                },
                other => {
                    self.unget(other);
                    Err(LexError::BadToken {
                        text: format!("<{k}"),
                    })
                }
            },
            other => {
                self.unget(other);
                Ok(TokenKind::Lt)
            }
        }
    }

    fn scan_quote(&mut self, q: char) -> Result<TokenKind, LexError> {
        let open = self.span();
        let mut s = String::new();
        loop {
            match self.get()? {
                Some(c) if c == q => match self.get()? {
                    Some(c2) if c2 == q => s.push(q),
                    other => {
                        self.unget(other);
                        return Ok(TokenKind::Name(s));
                    }
                },
                Some(c) => {
                    if c == '\n' {
                        self.bump_line();
                    }
                    s.push(c);
                }
                None => return Err(LexError::UnclosedQuote { open }),
            }
        }
    }

    /// `$"name"`
    fn scan_join(&mut self) -> Result<TokenKind, LexError> {
        let open = self.span();
        let mut s = String::new();
        loop {
            match self.get()? {
                Some('"') => return Ok(TokenKind::Join(s)),
                Some('\n') | None => return Err(LexError::UnclosedQuote { open }),
                Some(c) => s.push(c),
            }
        }
    }

    fn scan_name(&mut self, first: char) -> Result<TokenKind, LexError> {
        let mut s = String::from(first);
        loop {
            match self.get()? {
                Some(c) if !is_punct(c) => s.push(c),
                other => {
                    self.unget(other);
                    break;
                }
            }
        }
        Ok(match s.as_str() {
            "for" => TokenKind::For,
            "while" => TokenKind::While,
            "func" => TokenKind::Func,
            _ => TokenKind::Name(s),
        })
    }
}

#[cfg(test)]
#[path = "lexer_tests.rs"]
mod tests;

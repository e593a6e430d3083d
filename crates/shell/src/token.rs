// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token types produced by the lexer.

use super::span::Span;
use std::fmt;

/// The kind of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A word, quoted or not.
    Name(String),
    /// `$"name"`: join a variable's elements.
    Join(String),
    /// End of line (also ends a command).
    Nl,
    /// End of input.
    Eof,
    /// `for`
    For,
    /// `while`
    While,
    /// `func`
    Func,
    /// `|`
    Pipe,
    /// `|>`: a pipe whose first stage gets file data.
    GfPipe,
    /// `-|`: a pipe with a null stdin.
    InPipe,
    /// `||`
    Or,
    /// `&&`
    And,
    /// `&`
    Amp,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBrack,
    /// `]`
    RBrack,
    /// `;`
    Semi,
    /// `^`
    Caret,
    /// `=` (or `←`)
    Eq,
    /// `$`
    Dollar,
    /// `$#`
    Len,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `>>`
    App,
    /// `>{`
    TeeBlk,
    /// `<{`
    InBlk,
    /// `<<{`
    RawInBlk,
    /// `<<<{`
    SingleInBlk,
    /// `<|{`
    PipeBlk,
}

impl TokenKind {
    /// True for tokens that end a command.
    pub fn is_sep(&self) -> bool {
        matches!(self, TokenKind::Nl | TokenKind::Semi)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Name(n) => return write!(f, "name<{n}>"),
            TokenKind::Join(n) => return write!(f, "$\"{n}\""),
            TokenKind::Nl => "newline",
            TokenKind::Eof => "EOF",
            TokenKind::For => "for",
            TokenKind::While => "while",
            TokenKind::Func => "func",
            TokenKind::Pipe => "|",
            TokenKind::GfPipe => "|>",
            TokenKind::InPipe => "-|",
            TokenKind::Or => "||",
            TokenKind::And => "&&",
            TokenKind::Amp => "&",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBrack => "[",
            TokenKind::RBrack => "]",
            TokenKind::Semi => ";",
            TokenKind::Caret => "^",
            TokenKind::Eq => "=",
            TokenKind::Dollar => "$",
            TokenKind::Len => "$#",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::App => ">>",
            TokenKind::TeeBlk => ">{",
            TokenKind::InBlk => "<{",
            TokenKind::RawInBlk => "<<{",
            TokenKind::SingleInBlk => "<<<{",
            TokenKind::PipeBlk => "<|{",
        };
        f.write_str(s)
    }
}

/// A token and the line it ended on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

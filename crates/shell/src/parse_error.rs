// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lexer and parser error types.

use super::span::Span;
use thiserror::Error;

/// Lexer errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A quote was opened and input ended before it was closed.
    ///
    /// ```ignore
    /// echo 'unterminated
    /// ```
    #[error("unclosed quote open at {open}")]
    UnclosedQuote { open: Span },

    /// A `<<` or `<|` that does not start a here-block.
    #[error("bad token '{text}'")]
    BadToken { text: String },

    /// An interrupt arrived while reading input.
    #[error("interrupted")]
    Interrupted,

    /// The input source failed.
    #[error("input: {0}")]
    Input(ql_core::Error),
}

/// Parser errors, each tied to the source line where it was found.
///
/// The `Display` form starts with `file:line`, which is what the shell
/// prints for the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{span}: {source}")]
    Lex {
        span: Span,
        #[source]
        source: LexError,
    },

    /// A token that doesn't fit the grammar.
    ///
    /// ```ignore
    /// echo a }
    /// ```
    #[error("{span}: syntax error near {found}")]
    Unexpected { span: Span, found: String },

    /// Input ended inside a construct.
    #[error("{span}: unexpected end of input, expected {expected}")]
    Eof { span: Span, expected: String },

    /// The syntax is fine but the construct is not valid, e.g. a bad
    /// redirection (`>[0] file`) or `|>` after the first pipe component.
    #[error("{span}: {message}")]
    Invalid { span: Span, message: String },
}

impl ParseError {
    pub fn span(&self) -> &Span {
        match self {
            ParseError::Lex { span, .. }
            | ParseError::Unexpected { span, .. }
            | ParseError::Eof { span, .. }
            | ParseError::Invalid { span, .. } => span,
        }
    }

    /// True when the error is an interrupt rather than bad input.
    pub fn is_interrupt(&self) -> bool {
        matches!(
            self,
            ParseError::Lex {
                source: LexError::Interrupted,
                ..
            }
        )
    }
}

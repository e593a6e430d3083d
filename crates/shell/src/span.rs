// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source positions for scripts.

use std::fmt;
use std::sync::Arc;

/// A position in a script: the source name and a 1-based line.
///
/// Source names are the script path, or a synthetic name such as `stdin`,
/// `flag-c` or `included:FILE` for sourced files.
///
/// ```ignore
/// use ql_shell::Span;
///
/// let span = Span::new("stdin", 3);
/// assert_eq!(span.to_string(), "stdin:3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    file: Arc<str>,
    pub line: usize,
}

impl Span {
    pub fn new(file: &str, line: usize) -> Self {
        Self {
            file: Arc::from(file),
            line,
        }
    }

    /// Start of the named source.
    pub fn start(file: &str) -> Self {
        Self::new(file, 1)
    }

    pub fn file(&self) -> &str {
        &self.file
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::start("")
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

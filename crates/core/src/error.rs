// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status values shared by channels, contexts and commands.

use thiserror::Error;

/// A task or channel status.
///
/// The `Display` text is what ends up in the `status` variable, so variants
/// render as short, lowercase, user-facing strings. Errors are `Clone`
/// because one close cause is observed by every receiver and sender of a
/// channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The task received an `"intr"` signal.
    #[error("interrupted")]
    Intr,

    /// Bad flags or arguments.
    #[error("usage")]
    Usage,

    /// A send failed because the consumer went away.
    #[error("broken pipe")]
    BrokenPipe,

    #[error("{0}: not a directory")]
    NotDir(String),

    #[error("{0}: file does not exist")]
    NotExist(String),

    /// A `#N` name that does not address an entry of the I/O table.
    #[error("no such io channel: {0}")]
    BadIo(String),

    /// A predicate expression that failed to parse.
    #[error("bad predicate: {0}")]
    BadPred(String),

    /// Host I/O failure, kept as text so the error stays `Clone`.
    #[error("{0}")]
    Io(String),

    /// Free-form status string (external exit status, assigned `$status`).
    #[error("{0}")]
    Status(String),
}

/// Result of running a task: `Ok(())` is a clean exit.
pub type Status = Result<(), Error>;

impl Error {
    /// Build an error from a status string.
    ///
    /// The well-known strings map back to their variants so that a status
    /// that round-trips through the environment keeps its meaning.
    pub fn from_status(s: &str) -> Self {
        match s {
            "interrupted" => Error::Intr,
            "usage" => Error::Usage,
            "broken pipe" => Error::BrokenPipe,
            other => Error::Status(other.to_string()),
        }
    }

    /// Wrap a host I/O error, naming the path involved.
    pub fn io(path: &str, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::NotExist(path.to_string()),
            _ => Error::Io(format!("{path}: {err}")),
        }
    }

    pub fn is_intr(&self) -> bool {
        matches!(self, Error::Intr)
    }
}

/// Convert a status into the string stored in the `status` variable.
pub fn status_string(sts: &Status) -> String {
    match sts {
        Ok(()) => String::new(),
        Err(e) => e.to_string(),
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

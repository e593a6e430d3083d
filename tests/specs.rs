//! Behavioral specifications for the ql binary.
//!
//! These tests are black-box: they run `ql` on scripts and verify
//! stdout, stderr, and exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// cli/
#[path = "specs/cli/flags.rs"]
mod cli_flags;
#[path = "specs/cli/errors.rs"]
mod cli_errors;

// shell/
#[path = "specs/shell/listing.rs"]
mod shell_listing;
#[path = "specs/shell/pipes.rs"]
mod shell_pipes;
#[path = "specs/shell/jobs.rs"]
mod shell_jobs;
#[path = "specs/shell/redirs.rs"]
mod shell_redirs;

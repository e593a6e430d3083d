// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

/// Log filter directives, `QL_LOG`.
pub fn log_filter() -> Option<String> {
    std::env::var("QL_LOG").ok().filter(|s| !s.is_empty())
}

/// The process environment, handed to the root context.
pub fn vars() -> Vec<(String, String)> {
    std::env::vars().collect()
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

/// Namespace description (`prefix hostdir` entries), if set.
pub fn ns_desc() -> Option<String> {
    std::env::var("NS").ok().filter(|s| !s.trim().is_empty())
}

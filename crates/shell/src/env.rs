// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell settings read from the environment.

use ql_core::Ctx;
use std::path::PathBuf;

/// Search path used when neither `path` nor `PATH` is set.
pub const DEFAULT_PATH: &str = "/bin:/usr/bin";

/// Prompts for the top level and for continuation lines.
pub const DEFAULT_PROMPTS: [&str; 2] = ["% ", "%     "];

/// Per-user init file, relative to the home directory.
pub const RC_FILE: &str = ".qlrc";

/// Command search directories: the `path` list, else `PATH` split at
/// colons, else [`DEFAULT_PATH`].
pub fn search_path(ctx: &Ctx) -> Vec<String> {
    let path = ctx.value("path").items();
    if !path.is_empty() {
        return path
            .iter()
            .flat_map(|p| p.split_whitespace())
            .map(str::to_string)
            .collect();
    }
    let unix = ctx.get_env("PATH");
    let unix = if unix.is_empty() {
        DEFAULT_PATH.to_string()
    } else {
        unix
    };
    unix.split(':')
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// The two `prompt` values, or the defaults.
pub fn prompts(ctx: &Ctx) -> [String; 2] {
    match ctx.value("prompt").items().as_slice() {
        [ps1, ps2] => [ps1.clone(), ps2.clone()],
        _ => DEFAULT_PROMPTS.map(str::to_string),
    }
}

/// Host path of the per-user init file.
pub fn rc_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(RC_FILE))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;

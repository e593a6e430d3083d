// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slash-separated namespace path helpers.

/// Lexically clean a path: collapse `//`, drop `.`, resolve `..`.
///
/// Rooted paths stay rooted; an empty result becomes `"."` (or `"/"`).
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for elem in path.split('/') {
        match elem {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            e => parts.push(e),
        }
    }
    let body = parts.join("/");
    match (rooted, body.is_empty()) {
        (true, _) => format!("/{body}"),
        (false, true) => ".".to_string(),
        (false, false) => body,
    }
}

/// Join two paths and clean the result.
pub fn join(a: &str, b: &str) -> String {
    if a.is_empty() {
        return clean(b);
    }
    clean(&format!("{a}/{b}"))
}

/// Make `path` absolute relative to the directory `dot`.
pub fn abs(dot: &str, path: &str) -> String {
    if path.starts_with('/') {
        clean(path)
    } else {
        join(dot, path)
    }
}

/// Last element of a path.
pub fn base(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { "." } else { "/" };
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Whether `path` is `prefix` or lies below it.
pub fn has_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return path.starts_with('/');
    }
    path == prefix
        || (path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'/'))
}

/// The part of `path` below `prefix`, as a rooted path (`"/"` for `prefix` itself).
///
/// Returns `None` when `path` is not under `prefix`.
pub fn suffix(path: &str, prefix: &str) -> Option<String> {
    if !has_prefix(path, prefix) {
        return None;
    }
    if prefix == "/" {
        return Some(path.to_string());
    }
    let rest = &path[prefix.len()..];
    if rest.is_empty() {
        Some("/".to_string())
    } else {
        Some(rest.to_string())
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;

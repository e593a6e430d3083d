// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    root = { "/", "/" },
    empty = { "", "." },
    dots = { "/a/./b/../c", "/a/c" },
    double_slash = { "a//b/", "a/b" },
    above_root = { "/../x", "/x" },
    relative_up = { "../x/..", ".." },
    trailing_slash = { "/tmp/", "/tmp" },
)]
fn clean_cases(input: &str, expected: &str) {
    assert_eq!(clean(input), expected);
}

#[test]
fn abs_joins_relative_paths_with_dot() {
    assert_eq!(abs("/home/u", "src/../lib"), "/home/u/lib");
    assert_eq!(abs("/home/u", "/etc"), "/etc");
    assert_eq!(abs("/home/u", "."), "/home/u");
}

#[yare::parameterized(
    file = { "/a/b.txt", "b.txt" },
    dir_slash = { "/a/b/", "b" },
    root = { "/", "/" },
    bare = { "x", "x" },
)]
fn base_cases(input: &str, expected: &str) {
    assert_eq!(base(input), expected);
}

#[test]
fn prefix_respects_element_boundaries() {
    assert!(has_prefix("/a/b", "/a"));
    assert!(has_prefix("/a", "/a"));
    assert!(!has_prefix("/ab", "/a"));
    assert!(has_prefix("/anything", "/"));
}

#[test]
fn suffix_is_rooted() {
    assert_eq!(suffix("/a/b/c", "/a").as_deref(), Some("/b/c"));
    assert_eq!(suffix("/a", "/a").as_deref(), Some("/"));
    assert_eq!(suffix("/x", "/").as_deref(), Some("/x"));
    assert_eq!(suffix("/ab", "/a"), None);
}

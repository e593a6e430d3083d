// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn entry(name: &str, typ: &str, size: &str) -> Dir {
    Dir::new()
        .with("path", format!("/t/{name}"))
        .with("name", name)
        .with("type", typ)
        .with("size", size)
}

fn verdict(pred: &str, d: &Dir, depth: usize) -> (bool, bool) {
    let v = Pred::parse(pred).unwrap().eval(d, depth);
    (v.matches, v.prune)
}

#[test]
fn empty_predicate_matches_everything() {
    let d = entry("a", "-", "1");
    assert_eq!(verdict("", &d, 7), (true, false));
    assert!(Pred::all().eval(&d, 0).matches);
}

#[yare::parameterized(
    at_root = { 0, (true, true) },
    below = { 1, (false, true) },
)]
fn zero_depth_stats_only_the_start(depth: usize, expected: (bool, bool)) {
    assert_eq!(verdict("0", &entry("a", "d", "0"), depth), expected);
}

#[test]
fn depth_bound_prunes_at_the_limit() {
    let d = entry("a", "d", "0");
    assert_eq!(verdict("1", &d, 0), (true, false));
    assert_eq!(verdict("1", &d, 1), (true, true));
}

#[test]
fn depth_equality_skips_the_start() {
    let d = entry("a", "d", "0");
    assert_eq!(verdict("depth=1", &d, 0), (false, false));
    assert_eq!(verdict("depth=1", &d, 1), (true, true));
}

#[yare::parameterized(
    file_type = { "-", "a.rs", "-", true },
    dir_type = { "d", "a.rs", "-", false },
    typed_attr = { "type=-", "a.rs", "-", true },
    glob = { "name~*.rs", "a.rs", "-", true },
    glob_miss = { "name~*.go", "a.rs", "-", false },
    not_equal = { "name!=a.rs", "a.rs", "-", false },
    not_equal_rune = { "name≠b", "a.rs", "-", true },
    both = { "-,name~a*", "a.rs", "-", true },
)]
fn attribute_clauses(pred: &str, name: &str, typ: &str, expected: bool) {
    assert_eq!(verdict(pred, &entry(name, typ, "0"), 1).0, expected);
}

#[yare::parameterized(
    lt = { "size<10", "9", true },
    lt_numeric_not_lexical = { "size<10", "100", false },
    le_rune = { "size≤10", "10", true },
    ge = { "size>=10", "10", true },
    gt = { "size>10", "10", false },
)]
fn numeric_comparisons(pred: &str, size: &str, expected: bool) {
    assert_eq!(verdict(pred, &entry("f", "-", size), 1).0, expected);
}

#[test]
fn prune_stops_descent_below_matches() {
    let git = entry(".git", "d", "0");
    let src = entry("src", "d", "0");
    assert_eq!(verdict("name=.git,prune", &git, 1), (true, true));
    assert_eq!(verdict("name=.git,prune", &src, 1), (false, false));
}

#[yare::parameterized(
    no_operator = { "bogus" },
    no_attribute = { "=x" },
    bad_glob = { "name~[" },
)]
fn bad_clauses_are_rejected(pred: &str) {
    assert!(matches!(Pred::parse(pred), Err(Error::BadPred(_))));
}

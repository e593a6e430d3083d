//! Redirection specs

use crate::prelude::*;

#[test]
fn redirection_append() {
    let f = Fixture::new();
    f.ql()
        .script("echo a > x ; echo b >> x ; | cat x")
        .passes()
        .stdout_eq("a\nb\n");
    similar_asserts::assert_eq!(f.read("x"), "a\nb\n");
}

#[test]
fn input_from_a_file() {
    let f = Fixture::new();
    f.ql()
        .script("| tr a-z A-Z < a")
        .passes()
        .stdout_eq("ALPHA\n");
}

#[test]
fn stderr_into_a_file() {
    let f = Fixture::new();
    f.ql().script("lf nope >[2] err").fails();
    let err = f.read("err");
    assert!(err.starts_with("lf: "), "{err}");
    assert!(err.contains("nope: file does not exist"), "{err}");
}

#[test]
fn directories_are_not_input() {
    let f = Fixture::new();
    f.ql()
        .script("| cat < sub")
        .fails()
        .stderr_has("sub: is a directory");
}

//! Pipe, tee and here-block specs

use crate::prelude::*;

#[test]
fn here_block_value() {
    ql().script("v = <{ echo a b c }; echo $v[1]")
        .passes()
        .stdout_eq("b\n");
}

#[test]
fn tee_copies_to_every_branch() {
    let out = ql().script("echo hi | >{ pf ; pf }").passes().stdout();
    assert_eq!(out.matches("hi").count(), 2, "{out}");
}

#[test]
fn host_programs_in_pipes() {
    ql().script("echo b a | tr ' ' '\\n' | sort")
        .passes()
        .stdout_eq("a\nb\n");
}

#[test]
fn functions_and_loops() {
    ql().script("func twice { for w $argv[1] $argv[1] { echo $w } }; | twice x")
        .passes()
        .stdout_eq("x\nx\n");
}

#[test]
fn conditions_use_status() {
    ql().script("/does/not/exist || echo fallback")
        .passes()
        .stdout_eq("fallback\n");
}

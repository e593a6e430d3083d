//! Command-line flag specs
//!
//! Verify how the script is chosen and what -n prints.

use crate::prelude::*;

#[test]
fn command_runs_without_rewrites() {
    let f = Fixture::new();
    f.ql()
        .args(&["-c", "pwd"])
        .passes()
        .stdout_eq(&format!("{}\n", f.path().display()));
}

#[test]
fn rewrite_command_lists() {
    let f = Fixture::new();
    f.ql()
        .script("sub/")
        .passes()
        .stdout_eq("sub/c\n");
}

#[test]
fn command_args_become_argv() {
    ql().args(&["-c", "echo $argv0 $#argv $argv[1]", "one", "two"])
        .passes()
        .stdout_eq("ql 3 one\n");
}

#[test]
fn script_file_with_args() {
    let f = Fixture::new();
    f.file("s.ql", "echo $argv[1] $argv[2]\n");
    f.ql()
        .args(&["s.ql", "x", "y"])
        .passes()
        .stdout_eq("x y\n");
}

#[test]
fn script_from_stdin() {
    ql().stdin("echo one\necho two\n")
        .passes()
        .stdout_eq("one\ntwo\n");
}

#[test]
fn dry_run_prints_without_running() {
    let f = Fixture::new();
    f.ql()
        .args(&["-n", "-x", "echo x > out"])
        .passes()
        .stdout_has("flag-c:1: pipe");
    assert!(!f.path().join("out").exists());
}

#[test]
fn executor_trace_goes_to_stderr() {
    ql().args(&["-X", "-x", "echo hi"])
        .passes()
        .stdout_eq("hi\n")
        .stderr_has("builtin echo hi");
}

//! CLI error handling specs
//!
//! Verify exit codes and messages for failing scripts.

use crate::prelude::*;

#[test]
fn unreadable_script_file() {
    ql().args(&["/does/not/exist.ql"])
        .fails()
        .stderr_has("can't read /does/not/exist.ql");
}

#[test]
fn syntax_error_fails_with_location() {
    ql().script("{ echo a")
        .fails()
        .stderr_has("flag-c:");
}

#[test]
fn unknown_command() {
    ql().args(&["-c", "no-such-command-here"])
        .fails()
        .stderr_has("no-such-command-here: command not found");
}

#[test]
fn exit_status_is_the_exit_code_source() {
    ql().script("exit oops").fails();
    ql().script("exit").passes();
    ql().script("exit ''").passes();
}

#[test]
fn conflicting_commands_are_rejected() {
    ql().args(&["-c", "a", "-x", "b"]).fails();
}

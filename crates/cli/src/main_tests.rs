// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[yare::parameterized(
    plain = { &["ql"], Flags::default() },
    dry = { &["ql", "-n"], Flags { dry: true, ..Flags::default() } },
    grouped = { &["ql", "-XL"], Flags { debug_x: true, debug_l: true, ..Flags::default() } },
)]
fn flags(args: &[&str], want: Flags) {
    assert_eq!(parse(args).flags(false), want);
}

#[test]
fn command_and_rewrite_conflict() {
    assert!(Cli::try_parse_from(["ql", "-c", "a", "-x", "b"]).is_err());
}

#[test]
fn command_keeps_the_remaining_args() {
    let cli = parse(&["ql", "-c", "echo $argv", "one", "-two"]);
    let (script, argv) = script_for(&cli).unwrap();
    let Script::Text { name, text } = script else {
        panic!("not text");
    };
    assert_eq!(name, "flag-c");
    assert_eq!(text, "{echo $argv\n}");
    assert_eq!(argv, vec!["ql", "one", "-two"]);
}

#[test]
fn rewrite_command_is_run_as_written() {
    let cli = parse(&["ql", "-x", "/tmp/"]);
    let (script, _) = script_for(&cli).unwrap();
    assert!(matches!(script, Script::Text { text, .. } if text == "/tmp/"));
}

#[test]
fn script_file_is_argv0() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("s.ql");
    std::fs::write(&file, "echo hi\n").unwrap();
    let file = file.display().to_string();

    let cli = parse(&["ql", file.as_str(), "a"]);
    let (script, argv) = script_for(&cli).unwrap();
    assert!(matches!(&script, Script::Text { name, text } if *name == file && text == "echo hi\n"));
    assert_eq!(argv, vec![file.clone(), "a".to_string()]);
}

#[test]
fn missing_script_file() {
    let cli = parse(&["ql", "/does/not/exist.ql"]);
    let err = script_for(&cli).err().unwrap();
    assert_eq!(err.to_string(), "can't read /does/not/exist.ql");
}

#[test]
fn no_args_reads_stdin() {
    let (script, argv) = script_for(&parse(&["ql"])).unwrap();
    assert!(matches!(script, Script::Stdin));
    assert_eq!(argv, vec!["ql"]);
}

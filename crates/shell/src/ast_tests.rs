// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    input = { Redir::file(0, "f", false), "<[0] f" },
    output = { Redir::file(1, "f", false), ">[1] f" },
    append = { Redir::file(2, "log", true), ">>[2] log" },
    pipe = { Redir::pipe(1), "|[1]" },
    dup = { Redir::dup(2, 1), ">[2=1]" },
)]
fn redir_display(r: Redir, want: &str) {
    assert_eq!(r.to_string(), want);
}

fn exec(words: &[&str]) -> Stage {
    Stage::new(
        StageKind::Exec(words.iter().map(|w| Word::lit(*w)).collect()),
        Span::new("t", 1),
    )
}

#[test]
fn prints_indented_tree_with_address() {
    let mut lf = exec(&["lf", "/tmp/"]);
    lf.redirs.push(Redir::pipe(1));
    let mut pf = exec(&["pf"]);
    pf.redirs.push(Redir::pipe(0));
    let cmd = Cmd::Pipe(Pipe {
        stages: vec![lf, pf],
        tag: String::new(),
        is_get: false,
        span: Span::new("t", 1),
    });
    let want = "\
t:1: pipe {
    exec {
        name(lf)
        name(/tmp/)
        |[1]
    }
    exec {
        name(pf)
        |[0]
    }
}
";
    assert_eq!(cmd.to_string(), want);
}

#[test]
fn async_tag_and_gf_are_shown() {
    let cmd = Cmd::Pipe(Pipe {
        stages: vec![exec(&["x"])],
        tag: "j".into(),
        is_get: true,
        span: Span::new("t", 2),
    });
    assert!(cmd.to_string().starts_with("t:2: pipe:gf(j) {"));
}

#[test]
fn summary_is_one_short_line() {
    let words: Vec<String> = (0..40).map(|i| format!("w{i}")).collect();
    let refs: Vec<&str> = words.iter().map(String::as_str).collect();
    let cmd = Cmd::Pipe(Pipe {
        stages: vec![exec(&refs)],
        tag: String::new(),
        is_get: false,
        span: Span::default(),
    });
    let s = summary(&cmd);
    assert!(!s.contains('\n'));
    assert!(s.ends_with("..."));
}

#[test]
fn in_out_redirs_ignore_output_pipes() {
    let mut s = exec(&["a"]);
    s.redirs.push(Redir::pipe(1));
    assert!(!s.has_in_out_redirs());
    s.redirs.push(Redir::file(0, "/dev/null", false));
    assert!(s.has_in_out_redirs());
}

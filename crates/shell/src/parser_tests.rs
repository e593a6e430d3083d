// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

fn items(src: &str) -> Vec<Item> {
    Parser::parse_text("t", src).unwrap()
}

fn cmd(src: &str) -> Cmd {
    match items(src).into_iter().next() {
        Some(Item::Cmd(c)) => c,
        other => panic!("expected a command, got {other:?}"),
    }
}

fn pipe(src: &str) -> Pipe {
    match cmd(src) {
        Cmd::Pipe(p) => p,
        other => panic!("expected a pipe, got {other:?}"),
    }
}

fn err(src: &str) -> String {
    Parser::parse_text("t", src).unwrap_err().to_string()
}

/// Literal words of each stage, `{..}` for compound stages.
fn shape(p: &Pipe) -> Vec<String> {
    p.stages
        .iter()
        .map(|s| match &s.kind {
            StageKind::Exec(ws) => ws
                .iter()
                .map(|w| match w {
                    Word::Lit(s) => s.clone(),
                    _ => "?".to_string(),
                })
                .collect::<Vec<_>>()
                .join(" "),
            StageKind::For { .. } => "for".to_string(),
            _ => "{..}".to_string(),
        })
        .collect()
}

#[test]
fn bare_path_becomes_list_and_print() {
    let p = pipe("/tmp/\n");
    assert_eq!(shape(&p), vec!["lf /tmp/", "pf"]);
    assert_eq!(p.stages[0].redirs, vec![Redir::pipe(1)]);
    assert_eq!(p.stages[1].redirs, vec![Redir::pipe(0)]);
}

#[test]
fn rewritten_pipe_prints_like_a_hand_written_one() {
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
    assert_eq!(cmd("/tmp/").to_string(), want);
}

#[yare::parameterized(
    echo = { "echo a b" },
    type_ = { "type x" },
    lf = { "lf x" },
    gf = { "gf x" },
    calc = { ": 1+2" },
    here_builtin = { "wait j" },
    cd = { "cd" },
    input_redir = { "cat < f" },
    output_redir = { "x > f" },
    leading_pipe = { "| x" },
)]
fn no_rewrite(src: &str) {
    let p = pipe(src);
    assert_eq!(p.stages.len(), 1, "{src}");
    let first = shape(&p)[0].clone();
    let name = src.trim_start_matches("| ").split(' ').next();
    assert_eq!(first.split(' ').next(), name, "{src}");
}

#[test]
fn rewrite_only_at_top_level() {
    let Cmd::Pipe(p) = cmd("{ x }") else {
        panic!("not a pipe")
    };
    let StageKind::Block(body) = &p.stages[0].kind else {
        panic!("not a block")
    };
    let Cmd::Pipe(inner) = &body[0] else {
        panic!("not a pipe")
    };
    assert_eq!(shape(inner), vec!["x"]);
}

#[test]
fn multi_stage_pipe_only_gets_lf() {
    let p = pipe("a b | cnt");
    assert_eq!(shape(&p), vec!["lf a b", "cnt"]);
}

#[test]
fn pf_goes_before_a_reading_for() {
    let p = pipe("/tmp | for f { echo $f }");
    assert_eq!(shape(&p), vec!["lf /tmp", "pf", "for"]);
    assert_eq!(p.stages[1].redirs, vec![Redir::pipe(0), Redir::pipe(1)]);
}

#[test]
fn gf_pipe_uses_get_files() {
    let p = pipe("x |> y");
    assert!(p.is_get);
    assert_eq!(shape(&p), vec!["gf x", "y"]);
    assert_eq!(
        err("a |> b |> c"),
        "t:1: '|>' valid only in the first component of a pipe"
    );
}

#[test]
fn in_pipe_reads_dev_null() {
    let p = pipe("-| x");
    assert_eq!(shape(&p), vec!["x"]);
    assert_eq!(
        p.stages[0].redirs,
        vec![Redir::file(0, "/dev/null", false)]
    );
}

#[test]
fn pipe_on_other_descriptors() {
    let p = pipe("| a |[2] b");
    assert_eq!(p.stages[0].redirs, vec![Redir::pipe(2)]);
    let p = pipe("| a |[21] b");
    assert_eq!(p.stages[0].redirs, vec![Redir::pipe(2), Redir::dup(1, 2)]);
    assert_eq!(err("| a |[0] b"), "t:1: bad redirect for pipe");
}

#[yare::parameterized(
    plain = { "| x > f", vec![Redir::file(1, "f", false)] },
    append = { "| x >> f", vec![Redir::file(1, "f", true)] },
    stderr = { "| x >[2] f", vec![Redir::file(2, "f", false)] },
    both = { "| x >[21] f", vec![Redir::file(2, "f", false), Redir::dup(1, 2)] },
    dup = { "| x >[2=1]", vec![Redir::dup(2, 1)] },
    spaced_dup = { "| x >[2 = 1]", vec![Redir::dup(2, 1)] },
    input = { "| x < f", vec![Redir::file(0, "f", false)] },
    bare_input = { "| x <", vec![Redir::file(0, "/dev/null", false)] },
    indexed_input = { "| x <[0] f", vec![Redir::file(0, "f", false)] },
)]
fn redirections(src: &str, want: Vec<Redir>) {
    assert_eq!(pipe(src).stages[0].redirs, want);
}

#[yare::parameterized(
    out_zero = { "x >[0] f", "t:1: bad redirect for '>'" },
    unknown = { "x >[3] f", "t:1: unknown redirect 3" },
    stupid = { "x >[1=1]", "t:1: stupid dup 1 1" },
    unknown_dup = { "x >[2=5]", "t:1: unknown dup 5" },
    bad_brackets = { "x >[1=2=3]", "t:1: bad [] redirection" },
    twice = { "x > a > b", "t:1: dup redir 1" },
    input_fd = { "x <[1] f", "t:1: bad redirect for '<'" },
)]
fn bad_redirections(src: &str, want: &str) {
    assert_eq!(err(src), want);
}

#[yare::parameterized(
    amp = { "x &", "&" },
    named = { "x &j", "j" },
    spaced = { "x & j", "j" },
    none = { "x", "" },
)]
fn job_tags(src: &str, tag: &str) {
    assert_eq!(pipe(src).tag, tag);
}

#[test]
fn conditions_group_and_lists_under_or() {
    let Cmd::Cond(c) = cmd("a && b || c") else {
        panic!("not a cond")
    };
    let sizes: Vec<usize> = c.ors.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 1]);
}

#[test]
fn single_pipe_is_not_a_condition() {
    assert!(matches!(cmd("| a"), Cmd::Pipe(_)));
}

#[test]
fn assignment_forms() {
    let Cmd::Set(s) = cmd("x = a b") else {
        panic!("not a set")
    };
    assert_eq!(s.name, "x");
    assert_eq!(
        s.value,
        SetValue::Words(vec![Word::lit("a"), Word::lit("b")])
    );

    let Cmd::Set(s) = cmd("x[1] = v") else {
        panic!("not a set")
    };
    assert_eq!(s.idx.as_deref(), Some("1"));

    let Cmd::Set(s) = cmd("x ← { a b }") else {
        panic!("not a set")
    };
    assert_eq!(
        s.value,
        SetValue::Words(vec![Word::lit("a"), Word::lit("b")])
    );
}

#[yare::parameterized(
    brackets = { "m = { [a] 1 [b] 2 }" },
    equals = { "m = { a = 1 b = 2 }" },
    joined = { "m = { a=1 b=2 }" },
)]
fn map_literals(src: &str) {
    let Cmd::Set(s) = cmd(src) else {
        panic!("not a set")
    };
    assert_eq!(
        s.value,
        SetValue::Map(vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string())
        ])
    );
}

#[test]
fn variable_words() {
    let p = pipe("echo $x $y[2] $#z $\"w\" a^$x");
    let StageKind::Exec(words) = &p.stages[0].kind else {
        panic!("not exec")
    };
    assert_eq!(
        words[1..],
        [
            Word::Var {
                name: "x".into(),
                idx: None
            },
            Word::Var {
                name: "y".into(),
                idx: Some("2".into())
            },
            Word::Len("z".into()),
            Word::Join("w".into()),
            Word::Concat(
                Box::new(Word::lit("a")),
                Box::new(Word::Var {
                    name: "x".into(),
                    idx: None
                })
            ),
        ]
    );
}

#[test]
fn here_block_output_goes_to_a_pipe() {
    let Cmd::Set(s) = cmd("v = <{ echo a b c }") else {
        panic!("not a set")
    };
    let SetValue::Words(words) = s.value else {
        panic!("not words")
    };
    let Word::Here { kind, pipe } = &words[0] else {
        panic!("not a here block")
    };
    assert_eq!(*kind, HereKind::Words);
    assert_eq!(shape(pipe), vec!["echo a b c"]);
    assert_eq!(pipe.stages[0].redirs, vec![Redir::pipe(1)]);
}

#[test]
fn here_block_listing_is_rewritten_at_top_level() {
    let Cmd::Set(s) = cmd("v = <<{ /tmp }") else {
        panic!("not a set")
    };
    let SetValue::Words(words) = s.value else {
        panic!("not words")
    };
    let Word::Here { pipe, .. } = &words[0] else {
        panic!("not a here block")
    };
    assert_eq!(shape(pipe), vec!["lf /tmp", "pf"]);
    assert_eq!(pipe.stages[1].redirs, vec![Redir::pipe(0), Redir::pipe(1)]);
}

#[test]
fn for_and_while_stages() {
    let p = pipe("for x a b { echo $x }");
    let StageKind::For {
        names, from_input, ..
    } = &p.stages[0].kind
    else {
        panic!("not for")
    };
    assert_eq!(names.len(), 3);
    assert!(!from_input);

    let p = pipe("| x | for l {\n echo $l\n}");
    assert!(matches!(
        p.stages[1].kind,
        StageKind::For {
            from_input: true,
            ..
        }
    ));

    let p = pipe("while test -f x { sleep 1 }");
    assert!(matches!(p.stages[0].kind, StageKind::While { .. }));
}

#[test]
fn tee_block() {
    let p = pipe("echo hi | >{ pf ; pf }");
    let StageKind::Tee(body) = &p.stages[1].kind else {
        panic!("not a tee")
    };
    assert_eq!(body.len(), 2);
}

#[test]
fn functions_and_sourcing_are_items() {
    let all = items("func f {\n echo $argv\n}\n< lib.ql\nf x\n");
    assert!(matches!(&all[0], Item::Func { name, body, .. } if name == "f" && body.len() == 1));
    assert!(matches!(&all[1], Item::Source { path, .. } if path == "lib.ql"));
    assert!(matches!(&all[2], Item::Cmd(_)));
}

#[test]
fn semicolons_separate_top_level_commands() {
    assert_eq!(items("a ; b ; c").len(), 3);
}

#[test]
fn errors_skip_to_the_next_line() {
    let mut p = Parser::new(Lexer::from_text("t", "a }\nb\n"));
    let e = p.next_item().unwrap_err();
    assert_eq!(e.span().line, 1);
    match p.next_item().unwrap() {
        Some(Item::Cmd(Cmd::Pipe(p))) => assert_eq!(shape(&p), vec!["lf b", "pf"]),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(p.next_item().unwrap(), None);
}

#[test]
fn invalid_command_is_dropped_but_parsing_goes_on() {
    let mut p = Parser::new(Lexer::from_text("t", "x >[0] f ; y\n"));
    assert!(matches!(p.next_item(), Err(ParseError::Invalid { .. })));
    assert!(matches!(p.next_item(), Ok(Some(Item::Cmd(_)))));
}

#[test]
fn unclosed_block_reports_eof() {
    assert!(err("{ a\n").contains("unexpected end of input"));
}

proptest! {
    #[test]
    fn parsing_is_deterministic(
        words in proptest::collection::vec("[a-z/]{1,6}", 1..4),
        piped in any::<bool>(),
        redir in any::<bool>(),
    ) {
        let mut src = words.join(" ");
        if redir {
            src.push_str(" > out");
        }
        if piped {
            src.push_str(" | cnt");
        }
        let a = Parser::parse_text("p", &src);
        let b = Parser::parse_text("p", &src);
        prop_assert_eq!(a, b);
    }
}

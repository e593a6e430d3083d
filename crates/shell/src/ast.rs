// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Abstract syntax tree for ql commands.
//!
//! ```text
//! Cmd
//! ├── Set      name[idx] = words | { [k] v ... }
//! ├── Cond     or-list of and-lists of pipes
//! └── Pipe     stages, async tag, gf flag
//!     └── Stage (with redirections)
//!         ├── Exec   words
//!         ├── Block  { cmds }
//!         ├── Tee    >{ cmds }
//!         ├── For    for words { cmds }
//!         └── While  while pipe { cmds }
//! ```
//!
//! `Display` renders the indented tree printed by dry runs and `-X`.

use super::span::Span;
use std::fmt::{self, Write};

const TAB: &str = "    ";

/// A top-level or block-level command.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    Set(Set),
    Pipe(Pipe),
    Cond(Cond),
}

impl Cmd {
    pub fn span(&self) -> &Span {
        match self {
            Cmd::Set(s) => &s.span,
            Cmd::Pipe(p) => &p.span,
            Cmd::Cond(c) => &c.span,
        }
    }
}

/// `a && b || c`: alternatives tried in order until one and-list succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct Cond {
    pub ors: Vec<Vec<Pipe>>,
    pub span: Span,
}

/// Variable assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    pub name: String,
    /// `name[idx] = ...`
    pub idx: Option<String>,
    pub value: SetValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    Words(Vec<Word>),
    /// Map literal entries; an empty value deletes the key.
    Map(Vec<(String, String)>),
}

/// A pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    pub stages: Vec<Stage>,
    /// Job tag; empty for foreground pipes.
    pub tag: String,
    /// Introduced with `|>`: the rewrite lists with `gf`.
    pub is_get: bool,
    pub span: Span,
}

impl Pipe {
    pub fn is_async(&self) -> bool {
        !self.tag.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub kind: StageKind,
    pub redirs: Vec<Redir>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageKind {
    /// A command with its words.
    Exec(Vec<Word>),
    Block(Vec<Cmd>),
    /// Every command gets a copy of the stage input.
    Tee(Vec<Cmd>),
    For {
        names: Vec<Word>,
        /// A single name: bind it to each input line instead.
        from_input: bool,
        body: Vec<Cmd>,
    },
    While {
        cond: Box<Pipe>,
        body: Vec<Cmd>,
    },
}

impl Stage {
    pub fn new(kind: StageKind, span: Span) -> Self {
        Self {
            kind,
            redirs: Vec::new(),
            span,
        }
    }

    /// The literal command name of an exec stage.
    pub fn cmd_name(&self) -> Option<&str> {
        match &self.kind {
            StageKind::Exec(words) => match words.first() {
                Some(Word::Lit(s)) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_cmd(&self, names: &[&str]) -> bool {
        self.cmd_name().is_some_and(|n| names.contains(&n))
    }

    /// Redirects stdin, or stdout to something other than a pipe.
    pub fn has_in_out_redirs(&self) -> bool {
        self.redirs.iter().any(|r| {
            r.from == 0 || (r.from == 1 && r.target != RedirTarget::Pipe)
        })
    }
}

/// Which way a here-block presents its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HereKind {
    /// `<{ }`: white-space separated words.
    Words,
    /// `<<{ }`: one word per output message.
    Lines,
    /// `<<<{ }`: all output as one word.
    Single,
    /// `<|{ }`: an `#N` descriptor name for the output stream.
    Fd,
}

impl HereKind {
    fn label(self) -> &'static str {
        match self {
            HereKind::Words => "inblk",
            HereKind::Lines => "rawinblk",
            HereKind::Single => "singleinblk",
            HereKind::Fd => "pipeblk",
        }
    }
}

/// A word that expands to zero or more strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Word {
    Lit(String),
    /// `$name` or `$name[idx]`
    Var { name: String, idx: Option<String> },
    /// `$#name`
    Len(String),
    /// `$"name"`
    Join(String),
    /// `a^b`
    Concat(Box<Word>, Box<Word>),
    Here { kind: HereKind, pipe: Box<Pipe> },
}

impl Word {
    pub fn lit(s: impl Into<String>) -> Self {
        Word::Lit(s.into())
    }
}

/// What a redirection connects its descriptor to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirTarget {
    /// The stage's end of the pipe.
    Pipe,
    /// Another descriptor (`>[N=M]`).
    Dup(usize),
    File(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redir {
    pub from: usize,
    pub target: RedirTarget,
    pub append: bool,
}

impl Redir {
    pub fn pipe(from: usize) -> Self {
        Self {
            from,
            target: RedirTarget::Pipe,
            append: false,
        }
    }

    pub fn file(from: usize, name: impl Into<String>, append: bool) -> Self {
        Self {
            from,
            target: RedirTarget::File(name.into()),
            append,
        }
    }

    pub fn dup(from: usize, to: usize) -> Self {
        Self {
            from,
            target: RedirTarget::Dup(to),
            append: false,
        }
    }
}

impl fmt::Display for Redir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            RedirTarget::Pipe => write!(f, "|[{}]", self.from),
            RedirTarget::Dup(to) => write!(f, ">[{}={}]", self.from, to),
            RedirTarget::File(name) => {
                let op = match (self.from, self.append) {
                    (0, _) => "<",
                    (_, true) => ">>",
                    _ => ">",
                };
                write!(f, "{op}[{}] {name}", self.from)
            }
        }
    }
}

// --- Tree printer ---

/// One printed node: kind, args, children and redirections.
struct Node<'a> {
    kind: &'a str,
    gf: bool,
    args: Vec<String>,
    children: Vec<Node<'a>>,
    redirs: &'a [Redir],
}

impl<'a> Node<'a> {
    fn leaf(kind: &'a str, args: Vec<String>) -> Self {
        Node {
            kind,
            gf: false,
            args,
            children: Vec::new(),
            redirs: &[],
        }
    }

    fn list(kind: &'a str, children: Vec<Node<'a>>) -> Self {
        Node {
            kind,
            gf: false,
            args: Vec::new(),
            children,
            redirs: &[],
        }
    }

    fn write(&self, out: &mut String, lvl: usize) -> fmt::Result {
        let pref = TAB.repeat(lvl);
        write!(out, "{pref}{}", self.kind)?;
        if self.gf {
            out.push_str(":gf");
        }
        for a in &self.args {
            write!(out, "({a})")?;
        }
        let open = !self.children.is_empty() || !self.redirs.is_empty();
        if open {
            out.push_str(" {\n");
        }
        for c in &self.children {
            c.write(out, lvl + 1)?;
        }
        for r in self.redirs {
            writeln!(out, "{pref}{TAB}{r}")?;
        }
        if open {
            write!(out, "{pref}}}")?;
        }
        out.push('\n');
        Ok(())
    }
}

fn cmds_node<'a>(kind: &'a str, cmds: &'a [Cmd]) -> Node<'a> {
    Node::list(kind, cmds.iter().map(cmd_node).collect())
}

fn cmd_node(cmd: &Cmd) -> Node<'_> {
    match cmd {
        Cmd::Pipe(p) => pipe_node(p),
        Cmd::Cond(c) => Node::list(
            "cond",
            c.ors
                .iter()
                .map(|ands| Node::list("cond", ands.iter().map(pipe_node).collect()))
                .collect(),
        ),
        Cmd::Set(s) => {
            let mut args = vec![s.name.clone()];
            args.extend(s.idx.clone());
            let children = match &s.value {
                SetValue::Words(ws) => ws.iter().map(word_node).collect(),
                SetValue::Map(kvs) => kvs
                    .iter()
                    .map(|(k, v)| Node::leaf("set", vec![k.clone(), v.clone()]))
                    .collect(),
            };
            Node {
                kind: "set",
                gf: false,
                args,
                children,
                redirs: &[],
            }
        }
    }
}

fn pipe_node(p: &Pipe) -> Node<'_> {
    let mut n = Node::list("pipe", p.stages.iter().map(stage_node).collect());
    n.gf = p.is_get;
    if p.is_async() {
        n.args.push(p.tag.clone());
    }
    n
}

fn stage_node(s: &Stage) -> Node<'_> {
    let mut n = match &s.kind {
        StageKind::Exec(words) => Node::list("exec", words.iter().map(word_node).collect()),
        StageKind::Block(cmds) => cmds_node("blk", cmds),
        StageKind::Tee(cmds) => cmds_node("teeblk", cmds),
        StageKind::For {
            names,
            from_input,
            body,
        } => {
            let mut head = Node::list("names", names.iter().map(word_node).collect());
            head.gf = *from_input;
            let mut n = Node::list("for", vec![head, cmds_node("blk", body)]);
            n.gf = *from_input;
            n
        }
        StageKind::While { cond, body } => {
            Node::list("while", vec![pipe_node(cond), cmds_node("blk", body)])
        }
    };
    n.redirs = &s.redirs;
    n
}

fn word_node(w: &Word) -> Node<'_> {
    match w {
        Word::Lit(s) => Node::leaf("name", vec![s.clone()]),
        Word::Var { name, idx } => {
            let mut args = vec![name.clone()];
            args.extend(idx.clone());
            Node::leaf("val", args)
        }
        Word::Len(name) => Node::leaf("len", vec![name.clone()]),
        Word::Join(name) => Node::leaf("join", vec![name.clone()]),
        Word::Concat(a, b) => Node::list("app", vec![word_node(a), word_node(b)]),
        Word::Here { kind, pipe } => Node::list(kind.label(), vec![pipe_node(pipe)]),
    }
}

impl fmt::Display for Cmd {
    /// `file:line: ` followed by the indented tree.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        cmd_node(self).write(&mut out, 0)?;
        write!(f, "{}: {}", self.span(), out)
    }
}

impl fmt::Display for Pipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        pipe_node(self).write(&mut out, 0)?;
        f.write_str(&out)
    }
}

/// One-line summary of a command, for traces.
pub fn summary(cmd: &Cmd) -> String {
    let mut out = String::new();
    if cmd_node(cmd).write(&mut out, 0).is_err() {
        return String::new();
    }
    let s = out.split_whitespace().collect::<Vec<_>>().join(" ");
    match s.char_indices().nth(50) {
        Some((i, _)) => format!("{}...", &s[..i]),
        None => s,
    }
}

#[cfg(test)]
#[path = "ast_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parser that turns tokens into top-level [`Item`]s.
//!
//! Items are produced one at a time so the interpreter can run each
//! command before the next one is read; this is what makes interactive
//! prompts, `func` definitions and sourcing behave in order.
//!
//! # Pipe rewrite
//!
//! A top-level pipe whose first stage is a plain command (no input or
//! output redirection, not a here built-in, not one of
//! [`NO_REWRITES`](crate::builtins::NO_REWRITES)) is rewritten so its
//! words are listed as files:
//!
//! ```text
//! /tmp/           =>  lf /tmp/ | pf
//! /tmp/ | for f { ... }  =>  lf /tmp/ | pf | for f { ... }
//! |> a b | x      =>  gf a b | x
//! ```
//!
//! Pipes that start with `|` or `-|`, and pipes nested in blocks, are
//! left alone.

use super::ast::*;
use super::builtins::{HERE_BUILTINS, NO_REWRITES};
use super::lexer::Lexer;
use super::parse_error::ParseError;
use super::span::Span;
use super::token::{Token, TokenKind};
use std::collections::VecDeque;

/// A top-level element of a script.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Cmd(Cmd),
    /// `func name { body }`
    Func {
        name: String,
        body: Vec<Cmd>,
        span: Span,
    },
    /// `< file`: read commands from the file before continuing.
    Source { path: String, span: Span },
}

pub struct Parser {
    lex: Lexer,
    ahead: VecDeque<Token>,
    /// Blocks enclosing the current position; rewrites only happen at 0.
    plvl: usize,
    /// First semantic error of the current command.
    invalid: Option<ParseError>,
}

impl Parser {
    pub fn new(lex: Lexer) -> Self {
        Self {
            lex,
            ahead: VecDeque::new(),
            plvl: 0,
            invalid: None,
        }
    }

    pub fn lexer_mut(&mut self) -> &mut Lexer {
        &mut self.lex
    }

    /// Parse a whole text, stopping at the first error.
    pub fn parse_text(name: &str, text: &str) -> Result<Vec<Item>, ParseError> {
        let mut p = Parser::new(Lexer::from_text(name, text));
        let mut items = Vec::new();
        while let Some(item) = p.next_item()? {
            items.push(item);
        }
        Ok(items)
    }

    /// The next top-level item, or `None` at end of input.
    ///
    /// After an error the rest of the line is discarded, so parsing can
    /// continue with the next line.
    pub fn next_item(&mut self) -> Result<Option<Item>, ParseError> {
        self.invalid = None;
        match self.item() {
            Ok(item) => match self.invalid.take() {
                Some(e) => Err(e),
                None => Ok(item),
            },
            Err(e) => {
                self.recover(e.is_interrupt());
                Err(e)
            }
        }
    }

    fn recover(&mut self, interrupted: bool) {
        self.plvl = 0;
        if !interrupted {
            loop {
                let kind = match self.ahead.pop_front() {
                    Some(t) => t.kind,
                    None => match self.lex.next_token() {
                        Ok(t) => t.kind,
                        Err(_) => break,
                    },
                };
                if matches!(kind, TokenKind::Nl | TokenKind::Eof) {
                    break;
                }
            }
        }
        self.ahead.clear();
        self.lex.reset();
    }

    fn item(&mut self) -> Result<Option<Item>, ParseError> {
        loop {
            let tok = self.peek()?.clone();
            match tok.kind {
                TokenKind::Eof => return Ok(None),
                TokenKind::Nl | TokenKind::Semi => {
                    self.next()?;
                }
                TokenKind::Func => {
                    self.next()?;
                    let name = self.expect_name("function name")?;
                    self.expect(&TokenKind::LBrace, "'{'")?;
                    self.plvl += 1;
                    let body = self.block_body()?;
                    self.plvl -= 1;
                    self.end_of_cmd()?;
                    return Ok(Some(Item::Func {
                        name,
                        body,
                        span: tok.span,
                    }));
                }
                TokenKind::Lt => {
                    self.next()?;
                    let path = self.expect_name("file name")?;
                    self.end_of_cmd()?;
                    return Ok(Some(Item::Source {
                        path,
                        span: tok.span,
                    }));
                }
                _ => {
                    let cmd = self.cond()?;
                    self.end_of_cmd()?;
                    return Ok(Some(Item::Cmd(cmd)));
                }
            }
        }
    }

    // --- Token access ---

    fn fill(&mut self, n: usize) -> Result<(), ParseError> {
        while self.ahead.len() <= n {
            let t = self
                .lex
                .next_token()
                .map_err(|source| ParseError::Lex {
                    span: self.lex.span(),
                    source,
                })?;
            let eof = t.kind == TokenKind::Eof;
            self.ahead.push_back(t);
            if eof {
                break;
            }
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<&Token, ParseError> {
        self.peek_at(0)
    }

    /// Token `n` positions ahead; past end of input this is the `Eof` token.
    fn peek_at(&mut self, n: usize) -> Result<&Token, ParseError> {
        self.fill(n)?;
        let idx = n.min(self.ahead.len().saturating_sub(1));
        self.ahead.get(idx).ok_or_else(|| ParseError::Eof {
            span: self.lex.span(),
            expected: "input".to_string(),
        })
    }

    fn peek_kind(&mut self) -> Result<&TokenKind, ParseError> {
        Ok(&self.peek()?.kind)
    }

    fn next(&mut self) -> Result<Token, ParseError> {
        self.fill(0)?;
        match self.ahead.front() {
            Some(t) if t.kind == TokenKind::Eof => Ok(t.clone()),
            _ => self.ahead.pop_front().ok_or_else(|| ParseError::Eof {
                span: self.lex.span(),
                expected: "input".to_string(),
            }),
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> Result<bool, ParseError> {
        if self.peek_kind()? == kind {
            self.next()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Consume a token of `kind`; a mismatch is left in place for recovery.
    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, ParseError> {
        let tok = self.peek()?.clone();
        if &tok.kind != kind {
            return Err(unexpected(&tok, what));
        }
        self.next()
    }

    fn expect_name(&mut self, what: &str) -> Result<String, ParseError> {
        let tok = self.peek()?.clone();
        match tok.kind {
            TokenKind::Name(s) => {
                self.next()?;
                Ok(s)
            }
            _ => Err(unexpected(&tok, what)),
        }
    }

    fn end_of_cmd(&mut self) -> Result<(), ParseError> {
        let tok = self.peek()?.clone();
        match tok.kind {
            TokenKind::Nl | TokenKind::Semi => {
                self.next()?;
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(unexpected(&tok, "newline or ';'")),
        }
    }

    /// Record a semantic error; the command is dropped once fully parsed.
    fn invalid(&mut self, span: &Span, message: impl Into<String>) {
        if self.invalid.is_none() {
            self.invalid = Some(ParseError::Invalid {
                span: span.clone(),
                message: message.into(),
            });
        }
    }

    // --- Commands ---

    /// `cmd (&& cmd)* (|| cmd (&& cmd)*)*`
    fn cond(&mut self) -> Result<Cmd, ParseError> {
        let span = self.peek()?.span.clone();
        let mut ors = Vec::new();
        let mut ands = vec![self.cmd()?];
        loop {
            if self.eat(&TokenKind::And)? {
                self.eat(&TokenKind::Nl)?;
                ands.push(self.cmd()?);
            } else if self.eat(&TokenKind::Or)? {
                self.eat(&TokenKind::Nl)?;
                ors.push(std::mem::replace(&mut ands, vec![self.cmd()?]));
            } else {
                break;
            }
        }
        ors.push(ands);
        if ors.len() == 1 && ors[0].len() == 1 {
            if let Some(cmd) = ors.pop().and_then(|mut a| a.pop()) {
                return Ok(cmd);
            }
        }
        let mut pipes = Vec::with_capacity(ors.len());
        for ands in ors {
            let mut list = Vec::with_capacity(ands.len());
            for c in ands {
                match c {
                    Cmd::Pipe(p) => list.push(p),
                    other => self.invalid(other.span(), "only pipes can be used in conditions"),
                }
            }
            pipes.push(list);
        }
        Ok(Cmd::Cond(Cond { ors: pipes, span }))
    }

    /// An assignment or a (possibly async) pipe.
    fn cmd(&mut self) -> Result<Cmd, ParseError> {
        let is_set = matches!(self.peek_kind()?, TokenKind::Name(_))
            && matches!(
                self.peek_at(1)?.kind,
                TokenKind::Eq | TokenKind::LBrack
            );
        if is_set {
            return Ok(Cmd::Set(self.set()?));
        }
        let mut pipe = self.pipeline()?;
        if self.eat(&TokenKind::Amp)? {
            pipe.tag = match self.peek_kind()? {
                TokenKind::Name(_) => self.expect_name("job tag")?,
                _ => "&".to_string(),
            };
        }
        Ok(Cmd::Pipe(pipe))
    }

    /// `-| pipe`, `| pipe` or a pipe subject to the rewrite.
    fn pipeline(&mut self) -> Result<Pipe, ParseError> {
        if self.eat(&TokenKind::InPipe)? {
            let mut p = self.pipe()?;
            if let Some(first) = p.stages.first_mut() {
                first.redirs.push(Redir::file(0, "/dev/null", false));
                let span = first.span.clone();
                self.no_dups(&span, &first.redirs.clone());
            }
            return Ok(p);
        }
        if self.eat(&TokenKind::Pipe)? {
            return self.pipe();
        }
        let mut p = self.pipe()?;
        self.rewrite(&mut p);
        Ok(p)
    }

    /// `stage ((| or |>) [N] stage)*`
    fn pipe(&mut self) -> Result<Pipe, ParseError> {
        let span = self.peek()?.span.clone();
        let mut stages = vec![self.stage()?];
        let mut is_get = false;
        loop {
            let gf = match self.peek_kind()? {
                TokenKind::Pipe => false,
                TokenKind::GfPipe => true,
                _ => break,
            };
            let op = self.next()?;
            let fds = if self.eat(&TokenKind::LBrack)? {
                let fds = self.expect_name("descriptor")?;
                self.expect(&TokenKind::RBrack, "']'")?;
                fds
            } else {
                "1".to_string()
            };
            if fds.contains('0') {
                self.invalid(&op.span, "bad redirect for pipe");
            }
            if gf {
                if is_get {
                    self.invalid(&op.span, "'|>' valid only in the first component of a pipe");
                }
                is_get = true;
            }
            self.eat(&TokenKind::Nl)?;
            let mut next = self.stage()?;
            let out = self.new_redir(&op.span, &fds, &RedirTarget::Pipe, false);
            if let Some(last) = stages.last_mut() {
                last.redirs.extend(out);
                let (s, r) = (last.span.clone(), last.redirs.clone());
                self.no_dups(&s, &r);
            }
            next.redirs.push(Redir::pipe(0));
            let (s, r) = (next.span.clone(), next.redirs.clone());
            self.no_dups(&s, &r);
            stages.push(next);
        }
        Ok(Pipe {
            stages,
            tag: String::new(),
            is_get,
            span,
        })
    }

    fn stage(&mut self) -> Result<Stage, ParseError> {
        let tok = self.peek()?.clone();
        let kind = match &tok.kind {
            TokenKind::LBrace | TokenKind::TeeBlk => {
                self.next()?;
                self.plvl += 1;
                let body = self.block_body()?;
                self.plvl -= 1;
                if tok.kind == TokenKind::LBrace {
                    StageKind::Block(body)
                } else {
                    StageKind::Tee(body)
                }
            }
            TokenKind::For => {
                self.next()?;
                self.plvl += 1;
                let names = self.names()?;
                self.expect(&TokenKind::LBrace, "'{'")?;
                let body = self.block_body()?;
                self.plvl -= 1;
                StageKind::For {
                    from_input: names.len() == 1,
                    names,
                    body,
                }
            }
            TokenKind::While => {
                self.next()?;
                self.plvl += 1;
                let cond = self.pipe()?;
                self.expect(&TokenKind::LBrace, "'{'")?;
                let body = self.block_body()?;
                self.plvl -= 1;
                StageKind::While {
                    cond: Box::new(cond),
                    body,
                }
            }
            k if is_word_start(k) => StageKind::Exec(self.names()?),
            _ => return Err(unexpected(&tok, "command")),
        };
        let mut stage = Stage::new(kind, tok.span);
        stage.redirs = self.redirs()?;
        let (s, r) = (stage.span.clone(), stage.redirs.clone());
        self.no_dups(&s, &r);
        Ok(stage)
    }

    /// Commands up to and including the closing `}`.
    fn block_body(&mut self) -> Result<Vec<Cmd>, ParseError> {
        let mut cmds = Vec::new();
        loop {
            let tok = self.peek()?.clone();
            match tok.kind {
                TokenKind::Nl | TokenKind::Semi => {
                    self.next()?;
                }
                TokenKind::RBrace => {
                    self.next()?;
                    return Ok(cmds);
                }
                TokenKind::Eof => {
                    return Err(ParseError::Eof {
                        span: tok.span,
                        expected: "'}'".to_string(),
                    })
                }
                _ => {
                    cmds.push(self.cond()?);
                    let tok = self.peek()?.clone();
                    if !matches!(
                        tok.kind,
                        TokenKind::Nl | TokenKind::Semi | TokenKind::RBrace
                    ) {
                        return Err(unexpected(&tok, "newline, ';' or '}'"));
                    }
                }
            }
        }
    }

    // --- Redirections ---

    fn redirs(&mut self) -> Result<Vec<Redir>, ParseError> {
        let mut redirs = Vec::new();
        loop {
            let op = self.peek()?.clone();
            match op.kind {
                TokenKind::Lt => {
                    self.next()?;
                    if self.eat(&TokenKind::LBrack)? {
                        let fds = self.expect_name("descriptor")?;
                        self.expect(&TokenKind::RBrack, "']'")?;
                        if fds != "0" {
                            self.invalid(&op.span, "bad redirect for '<'");
                        }
                    }
                    let name = match self.peek_kind()? {
                        TokenKind::Name(_) => self.expect_name("file name")?,
                        _ => "/dev/null".to_string(),
                    };
                    redirs.push(Redir::file(0, name, false));
                }
                TokenKind::Gt | TokenKind::App => {
                    self.next()?;
                    let append = op.kind == TokenKind::App;
                    let mut fds = "1".to_string();
                    if self.eat(&TokenKind::LBrack)? {
                        let a = self.expect_name("descriptor")?;
                        if self.eat(&TokenKind::Eq)? {
                            let b = self.expect_name("descriptor")?;
                            self.expect(&TokenKind::RBrack, "']'")?;
                            redirs.extend(self.new_dup(&op.span, &a, &b));
                            continue;
                        }
                        self.expect(&TokenKind::RBrack, "']'")?;
                        if a.contains('=') {
                            let parts: Vec<&str> = a.split('=').collect();
                            match parts.as_slice() {
                                [from, to] => redirs.extend(self.new_dup(&op.span, from, to)),
                                _ => self.invalid(&op.span, "bad [] redirection"),
                            }
                            continue;
                        }
                        fds = a;
                    }
                    if fds.contains('0') {
                        self.invalid(&op.span, "bad redirect for '>'");
                    }
                    let name = self.expect_name("file name")?;
                    redirs.extend(self.new_redir(
                        &op.span,
                        &fds,
                        &RedirTarget::File(name),
                        append,
                    ));
                }
                _ => return Ok(redirs),
            }
        }
    }

    /// Redirect the first descriptor in `fds` and dup the others into it.
    fn new_redir(
        &mut self,
        span: &Span,
        fds: &str,
        target: &RedirTarget,
        append: bool,
    ) -> Vec<Redir> {
        let mut digits = fds.chars();
        let Some(first) = digits.next() else {
            return Vec::new();
        };
        let from = match first {
            '0' => 0,
            '1' => 1,
            '2' => 2,
            c => {
                self.invalid(span, format!("unknown redirect {c}"));
                return Vec::new();
            }
        };
        let mut out = vec![Redir {
            from,
            target: target.clone(),
            append,
        }];
        for d in digits {
            out.extend(self.new_dup(span, &d.to_string(), &first.to_string()));
        }
        out
    }

    fn new_dup(&mut self, span: &Span, from: &str, to: &str) -> Vec<Redir> {
        let fd = |s: &str| match s {
            "1" => Some(1),
            "2" => Some(2),
            _ => None,
        };
        match (fd(from), fd(to)) {
            (None, _) => self.invalid(span, format!("unknown dup {from}")),
            (_, None) => self.invalid(span, format!("unknown dup {to}")),
            (Some(f), Some(t)) if f == t => {
                self.invalid(span, format!("stupid dup {from} {to}"))
            }
            (Some(f), Some(t)) => return vec![Redir::dup(f, t)],
        }
        Vec::new()
    }

    fn no_dups(&mut self, span: &Span, redirs: &[Redir]) {
        let mut seen = [false; 3];
        for r in redirs {
            if let Some(s) = seen.get_mut(r.from) {
                if *s {
                    self.invalid(span, format!("dup redir {}", r.from));
                    return;
                }
                *s = true;
            }
        }
    }

    // --- Words ---

    fn names(&mut self) -> Result<Vec<Word>, ParseError> {
        let mut words = Vec::new();
        while is_word_start(self.peek_kind()?) {
            words.push(self.word()?);
        }
        if words.is_empty() {
            let tok = self.peek()?.clone();
            return Err(unexpected(&tok, "name"));
        }
        Ok(words)
    }

    /// `atom (^ atom)*`
    fn word(&mut self) -> Result<Word, ParseError> {
        let mut w = self.atom()?;
        while self.eat(&TokenKind::Caret)? {
            let rhs = self.atom()?;
            w = Word::Concat(Box::new(w), Box::new(rhs));
        }
        Ok(w)
    }

    fn atom(&mut self) -> Result<Word, ParseError> {
        let tok = self.peek()?.clone();
        if !is_word_start(&tok.kind) {
            return Err(unexpected(&tok, "name"));
        }
        self.next()?;
        let here = match tok.kind {
            TokenKind::Name(s) => return Ok(Word::Lit(s)),
            TokenKind::Join(s) => return Ok(Word::Join(s)),
            TokenKind::Len => return Ok(Word::Len(self.expect_name("variable name")?)),
            TokenKind::Dollar => {
                let name = self.expect_name("variable name")?;
                let idx = if self.eat(&TokenKind::LBrack)? {
                    let idx = self.expect_name("index")?;
                    self.expect(&TokenKind::RBrack, "']'")?;
                    Some(idx)
                } else {
                    None
                };
                return Ok(Word::Var { name, idx });
            }
            TokenKind::InBlk => HereKind::Words,
            TokenKind::RawInBlk => HereKind::Lines,
            TokenKind::SingleInBlk => HereKind::Single,
            TokenKind::PipeBlk => HereKind::Fd,
            _ => return Err(unexpected(&tok, "name")),
        };
        self.eat(&TokenKind::Nl)?;
        let mut pipe = self.pipeline()?;
        self.eat(&TokenKind::Nl)?;
        self.expect(&TokenKind::RBrace, "'}'")?;
        if let Some(last) = pipe.stages.last_mut() {
            last.redirs.push(Redir::pipe(1));
            let (s, r) = (last.span.clone(), last.redirs.clone());
            self.no_dups(&s, &r);
        }
        Ok(Word::Here {
            kind: here,
            pipe: Box::new(pipe),
        })
    }

    // --- Assignments ---

    fn set(&mut self) -> Result<Set, ParseError> {
        let span = self.peek()?.span.clone();
        let name = self.expect_name("variable name")?;
        let idx = if self.eat(&TokenKind::LBrack)? {
            let idx = self.expect_name("index")?;
            self.expect(&TokenKind::RBrack, "']'")?;
            Some(idx)
        } else {
            None
        };
        self.expect(&TokenKind::Eq, "'='")?;
        let value = if self.eat(&TokenKind::LBrace)? {
            self.set_body(&span)?
        } else {
            let mut words = Vec::new();
            while is_word_start(self.peek_kind()?) {
                words.push(self.word()?);
            }
            SetValue::Words(words)
        };
        if idx.is_some() && matches!(value, SetValue::Map(_)) {
            self.invalid(&span, "can't assign a map to an element");
        }
        Ok(Set {
            name,
            idx,
            value,
            span,
        })
    }

    /// After `= {`: a list of words, or map entries (`[k] v` or `k = v`).
    fn set_body(&mut self, span: &Span) -> Result<SetValue, ParseError> {
        let mut words = Vec::new();
        let mut map = Vec::new();
        loop {
            let tok = self.peek()?.clone();
            match &tok.kind {
                TokenKind::RBrace => {
                    self.next()?;
                    break;
                }
                TokenKind::Nl => {
                    self.next()?;
                }
                TokenKind::LBrack => {
                    self.next()?;
                    let k = self.expect_name("key")?;
                    self.expect(&TokenKind::RBrack, "']'")?;
                    let v = self.expect_name("value")?;
                    map.push((k, v));
                }
                k if is_word_start(k) => {
                    let w = self.word()?;
                    match w {
                        Word::Lit(k) if self.peek_kind()? == &TokenKind::Eq => {
                            self.next()?;
                            let v = self.expect_name("value")?;
                            map.push((k, v));
                        }
                        w => words.push(w),
                    }
                }
                _ => return Err(unexpected(&tok, "'}'")),
            }
        }
        if !map.is_empty() {
            if !words.is_empty() {
                self.invalid(span, "can't mix map entries and words");
            }
            return Ok(SetValue::Map(map));
        }
        let pairs: Option<Vec<(String, String)>> = words
            .iter()
            .map(|w| match w {
                Word::Lit(s) => s.split_once('=').map(|(k, v)| (k.to_string(), v.to_string())),
                _ => None,
            })
            .collect();
        match pairs {
            Some(pairs) if !pairs.is_empty() => Ok(SetValue::Map(pairs)),
            _ => Ok(SetValue::Words(words)),
        }
    }

    // --- Rewrite ---

    fn rewrite(&mut self, p: &mut Pipe) {
        if self.plvl > 0 {
            return;
        }
        let is_get = p.is_get;
        let span = p.span.clone();
        let n = p.stages.len();
        let Some(first) = p.stages.first_mut() else {
            return;
        };
        if first.has_in_out_redirs()
            || first.is_cmd(HERE_BUILTINS)
            || first.is_cmd(NO_REWRITES)
        {
            return;
        }
        let StageKind::Exec(words) = &mut first.kind else {
            return;
        };
        words.insert(0, Word::lit(if is_get { "gf" } else { "lf" }));
        let pf = |redirs: Vec<Redir>| {
            let mut s = Stage::new(StageKind::Exec(vec![Word::lit("pf")]), span.clone());
            s.redirs = redirs;
            s
        };
        if n > 1 {
            let to_for = matches!(
                &p.stages[1].kind,
                StageKind::For { names, .. } if names.len() == 1
            );
            if !is_get && to_for {
                p.stages.insert(1, pf(vec![Redir::pipe(0), Redir::pipe(1)]));
            }
            return;
        }
        first.redirs.push(Redir::pipe(1));
        let (s, r) = (first.span.clone(), first.redirs.clone());
        self.no_dups(&s, &r);
        p.stages.push(pf(vec![Redir::pipe(0)]));
    }
}

fn is_word_start(k: &TokenKind) -> bool {
    matches!(
        k,
        TokenKind::Name(_)
            | TokenKind::Dollar
            | TokenKind::Len
            | TokenKind::Join(_)
            | TokenKind::InBlk
            | TokenKind::RawInBlk
            | TokenKind::SingleInBlk
            | TokenKind::PipeBlk
    )
}

fn unexpected(tok: &Token, expected: &str) -> ParseError {
    match tok.kind {
        TokenKind::Eof => ParseError::Eof {
            span: tok.span.clone(),
            expected: expected.to_string(),
        },
        _ => ParseError::Unexpected {
            span: tok.span.clone(),
            found: tok.kind.to_string(),
        },
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;

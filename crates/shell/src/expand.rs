// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Word expansion: variables, lengths, joins, concatenation and
//! here-blocks.

use crate::ast::{HereKind, Pipe, Word};
use crate::exec::{BoxFut, Shell};
use crate::lines::LineBuf;
use ql_core::{Chan, Ctx, Error, Msg};

impl Shell {
    /// Expand `words` into argument strings.
    pub(crate) async fn expand(&self, ctx: &Ctx, words: &[Word]) -> Result<Vec<String>, Error> {
        let mut out = Vec::with_capacity(words.len());
        for w in words {
            out.extend(self.expand_word(ctx, w).await?);
        }
        Ok(out)
    }

    fn expand_word<'a>(
        &'a self,
        ctx: &'a Ctx,
        word: &'a Word,
    ) -> BoxFut<'a, Result<Vec<String>, Error>> {
        Box::pin(async move {
            match word {
                Word::Lit(s) => Ok(vec![s.clone()]),
                Word::Var { name, idx: None } => Ok(ctx.value(name).items()),
                Word::Var {
                    name,
                    idx: Some(idx),
                } => Ok(ctx.value(name).at(idx).into_iter().collect()),
                Word::Len(name) => Ok(vec![ctx.value(name).len().to_string()]),
                Word::Join(name) => Ok(vec![ctx.value(name).items().join(" ")]),
                Word::Concat(a, b) => {
                    let a = self.expand_word(ctx, a).await?;
                    let b = self.expand_word(ctx, b).await?;
                    Ok(concat(a, b))
                }
                Word::Here { kind, pipe } => self.here(ctx, *kind, pipe).await,
            }
        })
    }

    /// Run a here-block and collect its output.
    async fn here(&self, ctx: &Ctx, kind: HereKind, pipe: &Pipe) -> Result<Vec<String>, Error> {
        let outc = Chan::new();
        if kind == HereKind::Fd {
            let name = ctx.add_io(outc.clone());
            if let Err(e) = self.run_pipe(ctx, pipe, Some(outc.clone())).await {
                outc.close(Some(e));
            }
            return Ok(vec![name]);
        }
        if let Err(e) = self.run_pipe(ctx, pipe, Some(outc.clone())).await {
            outc.close(Some(e));
        }
        let mut words = Vec::new();
        let mut lines = LineBuf::default();
        let mut all = String::new();
        while let Some(m) = ctx.recv(&outc).await? {
            let text = match m {
                Msg::Dir(d) => format!("{}\n", d.path()),
                m => match LineBuf::text(m) {
                    Some(text) => text,
                    None => continue,
                },
            };
            match kind {
                HereKind::Words => words.extend(text.split_whitespace().map(str::to_string)),
                HereKind::Lines => words.extend(lines.push(&text)),
                HereKind::Single | HereKind::Fd => all.push_str(&text),
            }
        }
        outc.status()?;
        match kind {
            HereKind::Lines => words.extend(lines.finish()),
            HereKind::Single => words.push(all),
            _ => {}
        }
        Ok(words)
    }
}

/// `a^b`: pairwise for equal lengths, distributed over a single word,
/// appended otherwise. An empty side yields the other.
pub(crate) fn concat(a: Vec<String>, b: Vec<String>) -> Vec<String> {
    if a.is_empty() {
        return b;
    }
    if b.is_empty() {
        return a;
    }
    if a.len() == b.len() {
        return a.into_iter().zip(b).map(|(x, y)| x + &y).collect();
    }
    if let [x] = a.as_slice() {
        return b.iter().map(|y| format!("{x}{y}")).collect();
    }
    if let [y] = b.as_slice() {
        return a.into_iter().map(|x| x + y).collect();
    }
    let mut out = a;
    out.extend(b);
    out
}

#[cfg(test)]
#[path = "expand_tests.rs"]
mod tests;

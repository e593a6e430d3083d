// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Predicates attached to paths (`path,1`, `path,type=-,name~*.rs`).
//!
//! A predicate is a comma-separated conjunction of clauses:
//!
//! - `N` (a number): entries at depth at most `N`; deeper ones are not visited
//! - `d`, `-`, `c`: entries of that type
//! - `attr=v`, `attr!=v` (`≠`), `attr~glob`, `attr<v`, `attr<=v` (`≤`),
//!   `attr>v`, `attr>=v` (`≥`): attribute comparisons; `depth` is the entry
//!   depth below the starting path. Values compare numerically when both
//!   sides are numbers.
//! - `prune`: do not descend below entries matching the other clauses
//!
//! The empty predicate matches everything.

use std::cmp::Ordering;
use std::fmt;

use crate::{Dir, Error};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Match,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Operators in match order: two-rune forms first.
const OPS: [(&str, Op); 10] = [
    ("!=", Op::Ne),
    ("<=", Op::Le),
    (">=", Op::Ge),
    ("≠", Op::Ne),
    ("≤", Op::Le),
    ("≥", Op::Ge),
    ("~", Op::Match),
    ("=", Op::Eq),
    ("<", Op::Lt),
    (">", Op::Gt),
];

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Depth(usize),
    Type(String),
    Prune,
    Cmp {
        attr: String,
        op: Op,
        value: String,
        glob: Option<glob::Pattern>,
    },
}

/// A parsed predicate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pred {
    src: String,
    clauses: Vec<Clause>,
}

/// Outcome of evaluating a predicate on one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// The entry satisfies the predicate.
    pub matches: bool,
    /// Entries below this one need not be visited.
    pub prune: bool,
}

impl Pred {
    pub fn parse(src: &str) -> Result<Pred, Error> {
        let mut clauses = Vec::new();
        for raw in src.split(',') {
            let c = raw.trim();
            if c.is_empty() {
                continue;
            }
            clauses.push(parse_clause(c)?);
        }
        Ok(Pred {
            src: src.to_string(),
            clauses,
        })
    }

    /// The predicate that matches everything.
    pub fn all() -> Pred {
        Pred::default()
    }

    pub fn eval(&self, d: &Dir, depth: usize) -> Verdict {
        let mut matches = true;
        let mut prune = false;
        let mut wants_prune = false;
        for c in &self.clauses {
            match c {
                Clause::Depth(n) => {
                    matches &= depth <= *n;
                    prune |= depth >= *n;
                }
                Clause::Type(t) => matches &= d.typ() == t,
                Clause::Prune => wants_prune = true,
                Clause::Cmp {
                    attr,
                    op,
                    value,
                    glob,
                } => {
                    let depth_str;
                    let have = if attr == "depth" {
                        depth_str = depth.to_string();
                        prune |= depth_exhausted(op, value, depth);
                        depth_str.as_str()
                    } else {
                        d.get(attr)
                    };
                    matches &= compare(have, op, value, glob.as_ref());
                }
            }
        }
        Verdict {
            matches,
            prune: prune || (wants_prune && matches),
        }
    }
}

impl fmt::Display for Pred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.src)
    }
}

fn parse_clause(c: &str) -> Result<Clause, Error> {
    if let Ok(n) = c.parse::<usize>() {
        return Ok(Clause::Depth(n));
    }
    match c {
        "d" | "-" | "c" => return Ok(Clause::Type(c.to_string())),
        "prune" => return Ok(Clause::Prune),
        _ => {}
    }
    let (pos, sym, op) = OPS
        .iter()
        .filter_map(|(sym, op)| c.find(sym).map(|pos| (pos, *sym, op.clone())))
        .min_by_key(|(pos, _, _)| *pos)
        .ok_or_else(|| Error::BadPred(c.to_string()))?;
    let attr = c[..pos].trim();
    if attr.is_empty() {
        return Err(Error::BadPred(c.to_string()));
    }
    let value = c[pos + sym.len()..].trim().to_string();
    let glob = match op {
        Op::Match => Some(
            glob::Pattern::new(&value).map_err(|e| Error::BadPred(format!("{c}: {e}")))?,
        ),
        _ => None,
    };
    Ok(Clause::Cmp {
        attr: attr.to_string(),
        op,
        value,
        glob,
    })
}

fn compare(have: &str, op: &Op, want: &str, glob: Option<&glob::Pattern>) -> bool {
    if *op == Op::Match {
        return glob.is_some_and(|g| g.matches(have));
    }
    let ord = match (have.parse::<f64>(), want.parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => have.cmp(want),
    };
    match op {
        Op::Eq => ord == Ordering::Equal,
        Op::Ne => ord != Ordering::Equal,
        Op::Lt => ord == Ordering::Less,
        Op::Le => ord != Ordering::Greater,
        Op::Gt => ord == Ordering::Greater,
        Op::Ge => ord != Ordering::Less,
        Op::Match => false,
    }
}

/// A depth bound that no entry below this one can satisfy.
fn depth_exhausted(op: &Op, value: &str, depth: usize) -> bool {
    let Ok(bound) = value.parse::<usize>() else {
        return false;
    };
    match op {
        Op::Eq | Op::Le => depth >= bound,
        Op::Lt => depth + 1 >= bound,
        _ => false,
    }
}

#[cfg(test)]
#[path = "pred_tests.rs"]
mod tests;

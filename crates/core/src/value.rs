// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured values stored in environment strings.
//!
//! Lists are joined with `\b`; maps are `key\avalue\a` pairs. Any `\a` marks a
//! map, otherwise any `\b` marks a list, otherwise the string is a scalar.

use indexmap::IndexMap;

/// Separator between list elements.
pub const LIST_SEP: char = '\u{8}';
/// Terminator after each map key and each map value.
pub const MAP_SEP: char = '\u{7}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(String),
    List(Vec<String>),
    Map(IndexMap<String, String>),
}

impl Value {
    pub fn decode(s: &str) -> Value {
        if s.contains(MAP_SEP) {
            let mut fields = s.split(MAP_SEP);
            let mut map = IndexMap::new();
            while let (Some(k), Some(v)) = (fields.next(), fields.next()) {
                map.insert(k.to_string(), v.to_string());
            }
            return Value::Map(map);
        }
        if s.contains(LIST_SEP) {
            return Value::List(s.split(LIST_SEP).map(str::to_string).collect());
        }
        Value::Scalar(s.to_string())
    }

    pub fn encode(&self) -> String {
        match self {
            Value::Scalar(s) => s.clone(),
            Value::List(l) => encode_list(l),
            Value::Map(m) => {
                let mut s = String::new();
                for (k, v) in m {
                    s.push_str(k);
                    s.push(MAP_SEP);
                    s.push_str(v);
                    s.push(MAP_SEP);
                }
                s
            }
        }
    }

    /// Elements of a list, the single element of a non-empty scalar, or the
    /// keys of a map.
    pub fn items(&self) -> Vec<String> {
        match self {
            Value::Scalar(s) if s.is_empty() => Vec::new(),
            Value::Scalar(s) => vec![s.clone()],
            Value::List(l) => l.clone(),
            Value::Map(m) => m.keys().cloned().collect(),
        }
    }

    /// Number of list elements or map keys.
    pub fn len(&self) -> usize {
        match self {
            Value::Map(m) => m.len(),
            other => other.items().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `$v[idx]`: the map value for key `idx`, or list element number `idx`.
    pub fn at(&self, idx: &str) -> Option<String> {
        match self {
            Value::Map(m) => m.get(idx).cloned(),
            other => {
                let n: usize = idx.parse().ok()?;
                other.items().into_iter().nth(n)
            }
        }
    }

    /// `v[idx] = val`: replace (or append at `len`) a list element, or set a map key.
    ///
    /// Returns `None` when the index is not valid for a list.
    pub fn set_at(self, idx: &str, val: &str) -> Option<Value> {
        match self {
            Value::Map(mut m) => {
                if val.is_empty() {
                    m.shift_remove(idx);
                } else {
                    m.insert(idx.to_string(), val.to_string());
                }
                Some(Value::Map(m))
            }
            other => {
                let n: usize = idx.parse().ok()?;
                let mut items = other.items();
                match n.cmp(&items.len()) {
                    std::cmp::Ordering::Less => items[n] = val.to_string(),
                    std::cmp::Ordering::Equal => items.push(val.to_string()),
                    std::cmp::Ordering::Greater => return None,
                }
                Some(Value::from_items(items))
            }
        }
    }

    /// A value holding these words: scalar for zero or one word, list otherwise.
    pub fn from_items(items: Vec<String>) -> Value {
        match items.len() {
            0 => Value::Scalar(String::new()),
            1 => Value::Scalar(items.into_iter().next().unwrap_or_default()),
            _ => Value::List(items),
        }
    }
}

/// Join list elements with the list separator.
pub fn encode_list<S: AsRef<str>>(items: &[S]) -> String {
    let mut s = String::new();
    for (i, it) in items.iter().enumerate() {
        if i > 0 {
            s.push(LIST_SEP);
        }
        s.push_str(it.as_ref());
    }
    s
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;

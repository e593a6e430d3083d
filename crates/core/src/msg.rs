// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream messages carried by channels.
//!
//! Every value sent on a [`Chan`](crate::Chan) is a [`Msg`]. Filters match on
//! the variants they understand and forward the rest unchanged.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Error;

/// One element of a message stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Metadata for a file tree entry.
    Dir(Dir),
    /// An opaque block of bytes (a line, a file chunk, ...).
    Bytes(Vec<u8>),
    /// A string, forwarded rather than written out by byte consumers.
    Text(String),
    /// A text editor address.
    Addr(Addr),
    /// An error value travelling in-band.
    Err(Error),
    /// Anything else; passed through untouched.
    Opaque(Opaque),
}

impl Msg {
    /// Short variant name, used in debug output.
    pub fn kind(&self) -> &'static str {
        match self {
            Msg::Dir(_) => "dir",
            Msg::Bytes(_) => "bytes",
            Msg::Text(_) => "text",
            Msg::Addr(_) => "addr",
            Msg::Err(_) => "err",
            Msg::Opaque(_) => "opaque",
        }
    }
}

impl From<Dir> for Msg {
    fn from(d: Dir) -> Self {
        Msg::Dir(d)
    }
}

impl From<Vec<u8>> for Msg {
    fn from(b: Vec<u8>) -> Self {
        Msg::Bytes(b)
    }
}

impl From<&str> for Msg {
    fn from(s: &str) -> Self {
        Msg::Bytes(s.as_bytes().to_vec())
    }
}

impl From<Addr> for Msg {
    fn from(a: Addr) -> Self {
        Msg::Addr(a)
    }
}

/// Payload of a message kind the core does not interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opaque {
    pub kind: String,
    pub data: Vec<u8>,
}

/// Attributes printed first, in this order; the rest follow sorted.
const STD_ATTR_ORDER: [&str; 11] = [
    "path", "upath", "rpath", "name", "type", "mode", "size", "mtime", "uid", "gid", "err",
];

/// Metadata for a file tree entry: string keys to string values.
///
/// Keys starting with an uppercase letter are user attributes; the rest are
/// system attributes. Missing keys read as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dir(IndexMap<String, String>);

impl Dir {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of an attribute, or `""` when absent.
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.0.insert(key.into(), val.into());
    }

    /// Builder-style [`set`](Dir::set).
    pub fn with(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.set(key, val);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn path(&self) -> &str {
        self.get("path")
    }

    pub fn upath(&self) -> &str {
        self.get("upath")
    }

    pub fn name(&self) -> &str {
        self.get("name")
    }

    pub fn typ(&self) -> &str {
        self.get("type")
    }

    pub fn err(&self) -> &str {
        self.get("err")
    }

    pub fn is_dir(&self) -> bool {
        self.typ() == "d"
    }

    /// Attribute names in display order: standard ones first, then the rest sorted.
    pub fn attrs(&self) -> Vec<&str> {
        let mut attrs: Vec<&str> = STD_ATTR_ORDER
            .iter()
            .copied()
            .filter(|k| self.0.contains_key(*k))
            .collect();
        let mut rest: Vec<&str> = self
            .0
            .keys()
            .map(String::as_str)
            .filter(|k| !STD_ATTR_ORDER.contains(k))
            .collect();
        rest.sort_unstable();
        attrs.extend(rest);
        attrs
    }

    /// One-line listing: mode, size, mtime and the user path.
    pub fn long(&self) -> String {
        let size = self.get("size").parse::<u64>().unwrap_or(0);
        let path = if self.upath().is_empty() {
            self.path()
        } else {
            self.upath()
        };
        format!(
            "{} {:>8} {:>12} {}",
            self.mode_string(),
            size,
            self.get("mtime"),
            path
        )
    }

    /// `ls`-style type and permission string, e.g. `drwxr-xr-x`.
    pub fn mode_string(&self) -> String {
        let typ = match self.typ() {
            "" => '-',
            t => t.chars().next().unwrap_or('-'),
        };
        let mode = u32::from_str_radix(self.get("mode"), 8).unwrap_or(0) & 0o777;
        let mut s = String::with_capacity(10);
        s.push(typ);
        for (i, c) in "rwxrwxrwx".chars().enumerate() {
            if mode & (1 << (8 - i)) != 0 {
                s.push(c);
            } else {
                s.push('-');
            }
        }
        s
    }
}

/// True for user attribute names (leading uppercase letter).
pub fn is_user_attr(key: &str) -> bool {
    key.chars().next().is_some_and(char::is_uppercase)
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Dir {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Dir(iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect())
    }
}

impl fmt::Display for Dir {
    /// All attributes as `key:"value"`, in display order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, k) in self.attrs().into_iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}:{:?}", k, self.get(k))?;
        }
        Ok(())
    }
}

/// Range part of an editor address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    Lines(usize, usize),
    Runes(usize, usize),
}

/// A text editor address: a file name plus a line or rune range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addr {
    pub name: String,
    pub range: Range,
}

impl Addr {
    pub fn lines(name: impl Into<String>, from: usize, to: usize) -> Self {
        Self {
            name: name.into(),
            range: Range::Lines(from, to),
        }
    }

    pub fn runes(name: impl Into<String>, from: usize, to: usize) -> Self {
        Self {
            name: name.into(),
            range: Range::Runes(from, to),
        }
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range {
            Range::Lines(a, b) => write!(f, "{}:{},{}", self.name, a, b),
            Range::Runes(a, b) => write!(f, "{}:#{},#{}", self.name, a, b),
        }
    }
}

#[cfg(test)]
#[path = "msg_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line framing over data messages, whatever their chunk size.

use ql_core::Msg;

#[derive(Debug, Default)]
pub(crate) struct LineBuf {
    partial: String,
}

impl LineBuf {
    /// Text carried by a data message, or `None` for other messages.
    pub(crate) fn text(m: Msg) -> Option<String> {
        match m {
            Msg::Bytes(b) => Some(String::from_utf8_lossy(&b).into_owned()),
            Msg::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Add `text` and take the lines it completes, without their newline.
    pub(crate) fn push(&mut self, text: &str) -> Vec<String> {
        self.partial.push_str(text);
        let Some(end) = self.partial.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.partial.split_off(end + 1);
        let done = std::mem::replace(&mut self.partial, rest);
        done[..end].split('\n').map(str::to_string).collect()
    }

    /// An unterminated last line, if any.
    pub(crate) fn finish(&mut self) -> Option<String> {
        (!self.partial.is_empty()).then(|| std::mem::take(&mut self.partial))
    }
}

#[cfg(test)]
#[path = "lines_tests.rs"]
mod tests;

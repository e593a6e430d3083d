// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded message channel with an end-of-stream cause.
//!
//! A [`Chan`] is a FIFO of [`Msg`] values shared by any number of senders
//! and receivers. Closing it records an optional cause that every later
//! `send` (which fails) and every `recv` past the buffered messages can
//! observe through [`Chan::cause`].

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::sync::Notify;

use crate::{Error, Msg};

/// Messages buffered before `send` starts waiting for a receiver.
pub const DEFAULT_CAPACITY: usize = 16;

#[derive(Clone)]
pub struct Chan {
    inner: Arc<Inner>,
}

struct Inner {
    cap: usize,
    state: Mutex<State>,
    changed: Notify,
}

#[derive(Default)]
struct State {
    buf: VecDeque<Msg>,
    closed: bool,
    cause: Option<Error>,
}

impl Chan {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                cap: cap.max(1),
                state: Mutex::new(State::default()),
                changed: Notify::new(),
            }),
        }
    }

    /// The shared null channel: closed, empty, no cause.
    ///
    /// Reads return end-of-stream immediately and writes are refused.
    pub fn null() -> Self {
        static NULL: OnceLock<Chan> = OnceLock::new();
        NULL.get_or_init(|| {
            let c = Chan::with_capacity(1);
            c.close(None);
            c
        })
        .clone()
    }

    pub fn is_null(&self) -> bool {
        self.same(&Self::null())
    }

    /// True when both handles refer to the same channel.
    pub fn same(&self, other: &Chan) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Send a message, waiting while the buffer is full.
    ///
    /// Returns `false` if the channel is (or becomes) closed; the message is
    /// then dropped.
    pub async fn send(&self, msg: Msg) -> bool {
        loop {
            let notified = self.inner.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut st = self.inner.state.lock();
                if st.closed {
                    return false;
                }
                if st.buf.len() < self.inner.cap {
                    st.buf.push_back(msg);
                    drop(st);
                    self.inner.changed.notify_waiters();
                    return true;
                }
            }
            notified.await;
        }
    }

    /// Receive the next message.
    ///
    /// Buffered messages are delivered even after close; `None` means the
    /// channel is closed and drained, see [`Chan::cause`].
    pub async fn recv(&self) -> Option<Msg> {
        loop {
            let notified = self.inner.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut st = self.inner.state.lock();
                if let Some(msg) = st.buf.pop_front() {
                    drop(st);
                    self.inner.changed.notify_waiters();
                    return Some(msg);
                }
                if st.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Close the channel with an optional cause.
    ///
    /// Only the first close has an effect. Returns whether this call closed it.
    pub fn close(&self, cause: Option<Error>) -> bool {
        let mut st = self.inner.state.lock();
        if st.closed {
            return false;
        }
        st.closed = true;
        st.cause = cause;
        drop(st);
        self.inner.changed.notify_waiters();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// The close cause, if the channel was closed with one.
    pub fn cause(&self) -> Option<Error> {
        self.inner.state.lock().cause.clone()
    }

    /// The close cause as a status.
    pub fn status(&self) -> Result<(), Error> {
        match self.cause() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Number of buffered messages.
    pub fn len(&self) -> usize {
        self.inner.state.lock().buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Chan {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Chan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.inner.state.lock();
        f.debug_struct("Chan")
            .field("buffered", &st.buf.len())
            .field("closed", &st.closed)
            .field("cause", &st.cause)
            .finish()
    }
}

#[cfg(test)]
#[path = "chan_tests.rs"]
mod tests;

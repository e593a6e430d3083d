// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! I/O descriptor tables.
//!
//! An [`IoSet`] maps small integers to channels. Entries are reference
//! counted across the sets that share them: a channel is closed when the
//! last set referring to it lets go. Entries installed with
//! [`IoSet::with_std`] are pinned and never closed by the table.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Arc;

use crate::{Chan, Error};

/// First slot handed out by [`IoSet::add`].
pub const FIRST_EXTRA_FD: usize = 3;

const PINNED: isize = -1;

#[derive(Debug)]
struct IoRef {
    chan: Chan,
    refs: AtomicIsize,
}

impl IoRef {
    fn owned(chan: Chan) -> Arc<Self> {
        Arc::new(Self {
            chan,
            refs: AtomicIsize::new(1),
        })
    }

    fn pinned(chan: Chan) -> Arc<Self> {
        Arc::new(Self {
            chan,
            refs: AtomicIsize::new(PINNED),
        })
    }

    fn retain(&self) {
        if self.refs.load(Ordering::Acquire) != PINNED {
            self.refs.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn release(&self, cause: Option<Error>) {
        if self.refs.load(Ordering::Acquire) == PINNED {
            return;
        }
        if self.refs.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.chan.close(cause);
        }
    }
}

#[derive(Debug, Default)]
struct Slots {
    /// Contexts currently using this table.
    users: usize,
    slots: Vec<Option<Arc<IoRef>>>,
}

/// A per-context descriptor table.
#[derive(Debug)]
pub struct IoSet {
    inner: Mutex<Slots>,
}

impl IoSet {
    /// An empty table with one user.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Slots {
                users: 1,
                slots: Vec::new(),
            }),
        }
    }

    /// A table whose 0, 1 and 2 are the given pinned channels.
    pub fn with_std(stdio: [Chan; 3]) -> Self {
        Self {
            inner: Mutex::new(Slots {
                users: 1,
                slots: stdio.into_iter().map(|c| Some(IoRef::pinned(c))).collect(),
            }),
        }
    }

    /// A new table aliasing the same channels.
    pub fn dup(&self) -> IoSet {
        let st = self.inner.lock();
        let slots = st
            .slots
            .iter()
            .map(|s| {
                s.as_ref().map(|r| {
                    r.retain();
                    Arc::clone(r)
                })
            })
            .collect();
        IoSet {
            inner: Mutex::new(Slots { users: 1, slots }),
        }
    }

    /// Register one more context sharing this table.
    pub fn attach(&self) {
        self.inner.lock().users += 1;
    }

    pub fn get(&self, fd: usize) -> Option<Chan> {
        self.inner
            .lock()
            .slots
            .get(fd)
            .and_then(|s| s.as_ref().map(|r| r.chan.clone()))
    }

    /// Install `chan` at `fd`, letting go of whatever was there.
    pub fn set(&self, fd: usize, chan: Chan) {
        let old = {
            let mut st = self.inner.lock();
            if st.slots.len() <= fd {
                st.slots.resize(fd + 1, None);
            }
            st.slots[fd].replace(IoRef::owned(chan))
        };
        if let Some(r) = old {
            r.release(None);
        }
    }

    /// Install `chan` at the first free slot at or above 3 and return it.
    pub fn add(&self, chan: Chan) -> usize {
        let mut st = self.inner.lock();
        if st.slots.len() < FIRST_EXTRA_FD {
            st.slots.resize(FIRST_EXTRA_FD, None);
        }
        let fd = st.slots[FIRST_EXTRA_FD..]
            .iter()
            .position(Option::is_none)
            .map(|i| i + FIRST_EXTRA_FD)
            .unwrap_or(st.slots.len());
        if fd == st.slots.len() {
            st.slots.push(None);
        }
        st.slots[fd] = Some(IoRef::owned(chan));
        fd
    }

    /// Make `to` refer to the same channel as `from`.
    pub fn copy(&self, to: usize, from: usize) -> Result<(), Error> {
        let old = {
            let mut st = self.inner.lock();
            let r = st
                .slots
                .get(from)
                .and_then(|s| s.clone())
                .ok_or_else(|| Error::BadIo(format!("#{from}")))?;
            r.retain();
            if st.slots.len() <= to {
                st.slots.resize(to + 1, None);
            }
            st.slots[to].replace(r)
        };
        if let Some(r) = old {
            r.release(None);
        }
        Ok(())
    }

    /// Drop the entry at `fd`.
    pub fn close_fd(&self, fd: usize) {
        let old = self.inner.lock().slots.get_mut(fd).and_then(Option::take);
        if let Some(r) = old {
            r.release(None);
        }
    }

    /// A context stops using this table.
    ///
    /// When the last user leaves, every entry is released and channels no
    /// longer referenced anywhere are closed with `cause`. Returns whether
    /// the table was torn down.
    pub fn release(&self, cause: Option<Error>) -> bool {
        let slots = {
            let mut st = self.inner.lock();
            st.users = st.users.saturating_sub(1);
            if st.users > 0 {
                return false;
            }
            std::mem::take(&mut st.slots)
        };
        for r in slots.into_iter().flatten() {
            r.release(cause.clone());
        }
        true
    }

    /// Descriptors currently in use.
    pub fn fds(&self) -> Vec<usize> {
        self.inner
            .lock()
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| i))
            .collect()
    }
}

impl Default for IoSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "io_tests.rs"]
mod tests;

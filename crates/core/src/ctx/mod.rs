// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process contexts.
//!
//! A [`Ctx`] is the per-task bundle a command runs in: its argument list, an
//! I/O descriptor table, environment, working directory ("dot"), namespace,
//! signal inbox and wait handle. A child made with [`Ctx::child`] shares
//! every dimension with its parent; `dup_*` gives the child its own copy of
//! one dimension and `new_*` replaces it with a fresh one.
//!
//! Tasks are started with [`Ctx::spawn`] (or [`Ctx::go`]) and finish through
//! [`Ctx::exits`], which releases the descriptor table (closing channels
//! with the exit status) and fires the wait handle.

mod find;
mod io;
mod signal;

pub use io::{IoSet, FIRST_EXTRA_FD};
pub use signal::{Signal, WaitHandle, SIG_INBOX};

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Weak};
use tokio::sync::{mpsc, watch};

use crate::{paths, Chan, Error, Msg, Ns, Status, Value};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Every live context, so OS interrupts can reach them.
static REGISTRY: LazyLock<Mutex<HashMap<u64, Weak<Inner>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Environment variables; an empty value means "unset".
#[derive(Debug, Default)]
pub struct Env {
    vars: Mutex<BTreeMap<String, String>>,
}

impl Env {
    pub fn get(&self, key: &str) -> Option<String> {
        self.vars.lock().get(key).cloned()
    }

    pub fn set(&self, key: &str, val: &str) {
        let mut vars = self.vars.lock();
        if val.is_empty() {
            vars.remove(key);
        } else {
            vars.insert(key.to_string(), val.to_string());
        }
    }

    pub fn vars(&self) -> Vec<(String, String)> {
        self.vars
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn copy(&self) -> Env {
        Env {
            vars: Mutex::new(self.vars.lock().clone()),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Env {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Env {
            vars: Mutex::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .filter(|(_, v): &(String, String)| !v.is_empty())
                    .collect(),
            ),
        }
    }
}

/// Working directory shared by the contexts that did not dup it.
#[derive(Debug)]
struct Dot(Mutex<String>);

/// The dimensions a root context started with; `new_*` restores them.
#[derive(Debug)]
struct Origin {
    stdio: [Chan; 3],
    env: Vec<(String, String)>,
    dot: String,
    ns: Arc<Ns>,
}

#[derive(Debug)]
struct Inner {
    id: u64,
    origin: Arc<Origin>,
    args: Mutex<Vec<String>>,
    io: Mutex<Arc<IoSet>>,
    env: Mutex<Arc<Env>>,
    dot: Mutex<Arc<Dot>>,
    ns: Mutex<Arc<Ns>>,
    bg: AtomicBool,
    debug: AtomicBool,
    sig_tx: mpsc::Sender<Signal>,
    sig_rx: tokio::sync::Mutex<mpsc::Receiver<Signal>>,
    wait_tx: watch::Sender<Option<Status>>,
    exited: AtomicBool,
    /// Channels to drain before the wait handle fires (file writers).
    pending: Mutex<Vec<Chan>>,
}

/// A process context; cloning yields another handle to the same context.
#[derive(Debug, Clone)]
pub struct Ctx {
    inner: Arc<Inner>,
}

/// Builder for a root [`Ctx`].
#[derive(Debug, Default)]
pub struct CtxBuilder {
    stdio: [Option<Chan>; 3],
    env: Vec<(String, String)>,
    dot: Option<String>,
    ns: Option<Arc<Ns>>,
    args: Vec<String>,
}

impl CtxBuilder {
    pub fn stdin(mut self, c: Chan) -> Self {
        self.stdio[0] = Some(c);
        self
    }

    pub fn stdout(mut self, c: Chan) -> Self {
        self.stdio[1] = Some(c);
        self
    }

    pub fn stderr(mut self, c: Chan) -> Self {
        self.stdio[2] = Some(c);
        self
    }

    pub fn env(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.env.push((key.into(), val.into()));
        self
    }

    pub fn envs(
        mut self,
        vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn dot(mut self, dir: impl Into<String>) -> Self {
        self.dot = Some(dir.into());
        self
    }

    pub fn ns(mut self, ns: Arc<Ns>) -> Self {
        self.ns = Some(ns);
        self
    }

    pub fn args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn build(self) -> Ctx {
        let [i, o, e] = self.stdio;
        let stdio = [
            i.unwrap_or_else(Chan::null),
            o.unwrap_or_else(Chan::null),
            e.unwrap_or_else(Chan::null),
        ];
        let dot = paths::clean(&self.dot.unwrap_or_else(|| "/".to_string()));
        let ns = self.ns.unwrap_or_default();
        let origin = Arc::new(Origin {
            stdio: stdio.clone(),
            env: self.env.clone(),
            dot: dot.clone(),
            ns: Arc::new(ns.dup()),
        });
        Ctx::assemble(
            origin,
            self.args,
            Arc::new(IoSet::with_std(stdio)),
            Arc::new(self.env.into_iter().collect()),
            Arc::new(Dot(Mutex::new(dot))),
            ns,
            false,
        )
    }
}

impl Ctx {
    pub fn builder() -> CtxBuilder {
        CtxBuilder::default()
    }

    fn assemble(
        origin: Arc<Origin>,
        args: Vec<String>,
        io: Arc<IoSet>,
        env: Arc<Env>,
        dot: Arc<Dot>,
        ns: Arc<Ns>,
        bg: bool,
    ) -> Ctx {
        let (sig_tx, sig_rx) = mpsc::channel(SIG_INBOX);
        let (wait_tx, _) = watch::channel(None);
        let inner = Arc::new(Inner {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            origin,
            args: Mutex::new(args),
            io: Mutex::new(io),
            env: Mutex::new(env),
            dot: Mutex::new(dot),
            ns: Mutex::new(ns),
            bg: AtomicBool::new(bg),
            debug: AtomicBool::new(false),
            sig_tx,
            sig_rx: tokio::sync::Mutex::new(sig_rx),
            wait_tx,
            exited: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
        });
        REGISTRY.lock().insert(inner.id, Arc::downgrade(&inner));
        Ctx { inner }
    }

    /// A new context sharing every dimension with this one.
    pub fn child(&self) -> Ctx {
        let io = self.io_set();
        io.attach();
        let ctx = Ctx::assemble(
            Arc::clone(&self.inner.origin),
            self.args(),
            io,
            Arc::clone(&self.inner.env.lock()),
            Arc::clone(&self.inner.dot.lock()),
            Arc::clone(&self.inner.ns.lock()),
            self.is_bg(),
        );
        ctx.set_debug(self.debug());
        ctx
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    // --- Tasks ---

    /// Run `f` in a new task bound to this context.
    ///
    /// The task ends with [`Ctx::exits`] carrying `f`'s status; a panic
    /// becomes the status `"panic"`.
    pub fn spawn<F, Fut>(&self, f: F) -> WaitHandle
    where
        F: FnOnce(Ctx) -> Fut + Send + 'static,
        Fut: Future<Output = Status> + Send + 'static,
    {
        let handle = self.wait_handle();
        let ctx = self.clone();
        tokio::spawn(async move {
            let body = tokio::spawn(f(ctx.clone()));
            let sts = match body.await {
                Ok(sts) => sts,
                Err(e) if e.is_panic() => Err(Error::Status("panic".to_string())),
                Err(_) => Err(Error::Intr),
            };
            ctx.exits(sts).await;
        });
        handle
    }

    /// Run `f` in a new task with a child context.
    pub fn go<F, Fut>(&self, f: F) -> WaitHandle
    where
        F: FnOnce(Ctx) -> Fut + Send + 'static,
        Fut: Future<Output = Status> + Send + 'static,
    {
        self.child().spawn(f)
    }

    pub fn wait_handle(&self) -> WaitHandle {
        WaitHandle::new(self.inner.id, self.inner.wait_tx.subscribe())
    }

    /// Finish this context: release the descriptor table (closing channels
    /// nobody else holds with the status), wait for pending file writers,
    /// and fire the wait handle. Only the first call has an effect.
    pub async fn exits(&self, sts: Status) {
        if self.inner.exited.swap(true, Ordering::AcqRel) {
            return;
        }
        self.io_set().release(sts.clone().err());
        let mut sts = sts;
        let pending = std::mem::take(&mut *self.inner.pending.lock());
        for c in pending {
            while c.recv().await.is_some() {}
            if let (Ok(()), Some(e)) = (&sts, c.cause()) {
                sts = Err(e);
            }
        }
        REGISTRY.lock().remove(&self.inner.id);
        tracing::trace!(ctx = self.inner.id, status = ?sts, "exits");
        self.inner.wait_tx.send_replace(Some(sts));
    }

    /// Keep the wait handle from firing until `reply` is closed.
    pub fn defer_exit_until(&self, reply: Chan) {
        self.inner.pending.lock().push(reply);
    }

    // --- Signals ---

    /// Mark this context as background: it ignores `"intr"`.
    pub fn bg(&self) {
        self.inner.bg.store(true, Ordering::Release);
    }

    pub fn is_bg(&self) -> bool {
        self.inner.bg.load(Ordering::Acquire)
    }

    /// Post a signal without blocking. Returns whether it was queued.
    pub fn post(&self, sig: Signal) -> bool {
        if sig == Signal::Intr && self.is_bg() {
            return false;
        }
        self.inner.sig_tx.try_send(sig).is_ok()
    }

    /// Wait for the next signal.
    pub async fn sig(&self) -> Signal {
        let mut rx = self.inner.sig_rx.lock().await;
        match rx.recv().await {
            Some(s) => s,
            None => std::future::pending().await,
        }
    }

    /// Drop queued signals; returns how many. A signal being waited for
    /// elsewhere is left alone.
    pub fn drain_sigs(&self) -> usize {
        let Ok(mut rx) = self.inner.sig_rx.try_lock() else {
            return 0;
        };
        let mut n = 0;
        while rx.try_recv().is_ok() {
            n += 1;
        }
        n
    }

    /// Receive from `c`, giving up with [`Error::Intr`] on any signal.
    pub async fn recv(&self, c: &Chan) -> Result<Option<Msg>, Error> {
        tokio::select! {
            biased;
            s = self.sig() => {
                tracing::debug!(ctx = self.inner.id, sig = %s, "recv interrupted");
                Err(Error::Intr)
            }
            m = c.recv() => Ok(m),
        }
    }

    /// Send on `c`, giving up with [`Error::Intr`] on any signal. A refused
    /// send fails with the channel's cause (or [`Error::BrokenPipe`]).
    pub async fn send(&self, c: &Chan, m: Msg) -> Status {
        tokio::select! {
            biased;
            s = self.sig() => {
                tracing::debug!(ctx = self.inner.id, sig = %s, "send interrupted");
                Err(Error::Intr)
            }
            ok = c.send(m) => {
                if ok {
                    Ok(())
                } else {
                    Err(c.cause().unwrap_or(Error::BrokenPipe))
                }
            }
        }
    }

    // --- Arguments and flags ---

    pub fn args(&self) -> Vec<String> {
        self.inner.args.lock().clone()
    }

    pub fn set_args(&self, args: Vec<String>) {
        *self.inner.args.lock() = args;
    }

    /// Name used to prefix warnings.
    pub fn arg0(&self) -> String {
        self.inner.args.lock().first().cloned().unwrap_or_default()
    }

    pub fn debug(&self) -> bool {
        self.inner.debug.load(Ordering::Relaxed)
    }

    pub fn set_debug(&self, on: bool) {
        self.inner.debug.store(on, Ordering::Relaxed);
    }

    // --- I/O ---

    fn io_set(&self) -> Arc<IoSet> {
        Arc::clone(&self.inner.io.lock())
    }

    /// Channel at `fd`, or the null channel.
    pub fn io(&self, fd: usize) -> Chan {
        self.io_set().get(fd).unwrap_or_else(Chan::null)
    }

    pub fn stdin(&self) -> Chan {
        self.io(0)
    }

    pub fn stdout(&self) -> Chan {
        self.io(1)
    }

    pub fn stderr(&self) -> Chan {
        self.io(2)
    }

    pub fn set_io(&self, fd: usize, c: Chan) {
        self.io_set().set(fd, c);
    }

    /// Install `c` at a fresh descriptor and return its `#N` name.
    pub fn add_io(&self, c: Chan) -> String {
        format!("#{}", self.io_set().add(c))
    }

    pub fn copy_io(&self, to: usize, from: usize) -> Status {
        self.io_set().copy(to, from)
    }

    pub fn close_io(&self, fd: usize) {
        self.io_set().close_fd(fd);
    }

    pub fn fds(&self) -> Vec<usize> {
        self.io_set().fds()
    }

    /// Give this context its own descriptor table aliasing the same channels.
    pub fn dup_io(&self) {
        let mut io = self.inner.io.lock();
        let copy = Arc::new(io.dup());
        let old = std::mem::replace(&mut *io, copy);
        drop(io);
        old.release(None);
    }

    /// Replace the descriptor table with one holding the root's stdio.
    pub fn new_io(&self) {
        let fresh = Arc::new(IoSet::with_std(self.inner.origin.stdio.clone()));
        let old = std::mem::replace(&mut *self.inner.io.lock(), fresh);
        old.release(None);
    }

    /// Write `s` to stdout as one `Bytes` message.
    pub async fn print(&self, s: &str) -> Status {
        self.send(&self.stdout(), Msg::Bytes(s.as_bytes().to_vec()))
            .await
    }

    /// Report `msg` on stderr prefixed with the command name.
    pub async fn warn(&self, msg: &str) {
        let line = match self.arg0() {
            a if a.is_empty() => format!("{msg}\n"),
            a => format!("{a}: {msg}\n"),
        };
        tracing::debug!(ctx = self.inner.id, "{}", line.trim_end());
        let _ = self.stderr().send(Msg::Bytes(line.into_bytes())).await;
    }

    // --- Environment ---

    pub fn env(&self) -> Arc<Env> {
        Arc::clone(&self.inner.env.lock())
    }

    /// Value of a variable, `""` when unset.
    pub fn get_env(&self, key: &str) -> String {
        self.env().get(key).unwrap_or_default()
    }

    /// Set a variable; an empty value unsets it.
    pub fn set_env(&self, key: &str, val: &str) {
        self.env().set(key, val);
    }

    pub fn value(&self, key: &str) -> Value {
        Value::decode(&self.get_env(key))
    }

    pub fn set_value(&self, key: &str, v: &Value) {
        self.set_env(key, &v.encode());
    }

    pub fn dup_env(&self) {
        let mut env = self.inner.env.lock();
        *env = Arc::new(env.copy());
    }

    pub fn new_env(&self) {
        let fresh: Env = self.inner.origin.env.iter().cloned().collect();
        *self.inner.env.lock() = Arc::new(fresh);
    }

    // --- Working directory ---

    pub fn dot(&self) -> String {
        self.inner.dot.lock().0.lock().clone()
    }

    /// Change the working directory, for every context sharing it.
    pub fn cd(&self, dir: &str) {
        let dot = Arc::clone(&self.inner.dot.lock());
        let abs = paths::abs(&dot.0.lock(), dir);
        *dot.0.lock() = abs;
    }

    /// Absolute, clean form of `path` relative to dot.
    pub fn abs_path(&self, path: &str) -> String {
        paths::abs(&self.dot(), path)
    }

    pub fn dup_dot(&self) {
        let mut dot = self.inner.dot.lock();
        let cur = dot.0.lock().clone();
        *dot = Arc::new(Dot(Mutex::new(cur)));
    }

    pub fn new_dot(&self) {
        let fresh = Arc::new(Dot(Mutex::new(self.inner.origin.dot.clone())));
        *self.inner.dot.lock() = fresh;
    }

    // --- Namespace ---

    pub fn ns(&self) -> Arc<Ns> {
        Arc::clone(&self.inner.ns.lock())
    }

    pub fn dup_ns(&self) {
        let mut ns = self.inner.ns.lock();
        *ns = Arc::new(ns.dup());
    }

    pub fn new_ns(&self) {
        let fresh = Arc::new(self.inner.origin.ns.dup());
        *self.inner.ns.lock() = fresh;
    }
}

/// Post `sig` to every live context; `"intr"` skips background ones.
/// Returns how many contexts accepted it.
pub fn post_all(sig: Signal) -> usize {
    let live: Vec<Ctx> = REGISTRY
        .lock()
        .values()
        .filter_map(Weak::upgrade)
        .map(|inner| Ctx { inner })
        .collect();
    live.iter().filter(|c| c.post(sig.clone())).count()
}

impl Drop for Inner {
    fn drop(&mut self) {
        REGISTRY.lock().remove(&self.id);
    }
}

#[cfg(test)]
#[path = "ctx_tests.rs"]
mod tests;

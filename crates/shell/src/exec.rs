// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The executor: runs parsed commands in a context.
//!
//! Every pipe stage runs in its own task with a child context holding
//! private copies of the I/O table, environment and dot. Stages that
//! change the shell itself (blocks, loops and here built-ins without
//! redirections) run in the caller's context instead, but only for
//! foreground pipes.

use crate::ast::{Cmd, Cond, Pipe, Set, SetValue, Stage, StageKind, Word};
use crate::builtins::Builtin;
use crate::env;
use crate::jobs::Jobs;
use crate::lines::LineBuf;
use crate::redirs::apply_redirs;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use ql_core::value::encode_list;
use ql_core::{paths, status_string, Chan, Ctx, Error, Msg, Status, Value, WaitHandle};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub(crate) type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Shell-wide switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Trace the executor (`-X`).
    pub debug_x: bool,
    /// Trace the lexer (`-L`).
    pub debug_l: bool,
    /// Prompt and keep going after errors (`-i`).
    pub interactive: bool,
    /// Parse and print only (`-n`).
    pub dry: bool,
}

struct State {
    funcs: RwLock<HashMap<String, Arc<[Cmd]>>>,
    jobs: Jobs,
    flags: Mutex<Flags>,
    exit: Mutex<Option<Status>>,
    path: RwLock<Vec<String>>,
    prompts: Mutex<[String; 2]>,
    /// Context the shell reads and runs top-level commands in.
    main: u64,
}

/// The shell: functions, jobs and settings shared by every task it runs.
#[derive(Clone)]
pub struct Shell {
    inner: Arc<State>,
}

impl Shell {
    /// A shell whose top-level commands run in `ctx`.
    pub fn new(ctx: &Ctx, flags: Flags) -> Self {
        Self {
            inner: Arc::new(State {
                funcs: RwLock::new(HashMap::new()),
                jobs: Jobs::new(),
                flags: Mutex::new(flags),
                exit: Mutex::new(None),
                path: RwLock::new(env::search_path(ctx)),
                prompts: Mutex::new(env::prompts(ctx)),
                main: ctx.id(),
            }),
        }
    }

    pub fn flags(&self) -> Flags {
        *self.inner.flags.lock()
    }

    pub fn update_flags(&self, f: impl FnOnce(&mut Flags)) {
        f(&mut self.inner.flags.lock());
    }

    pub fn jobs(&self) -> &Jobs {
        &self.inner.jobs
    }

    pub fn is_main(&self, ctx: &Ctx) -> bool {
        ctx.id() == self.inner.main
    }

    /// Ask the shell to stop after the running command.
    pub fn request_exit(&self, sts: Status) {
        *self.inner.exit.lock() = Some(sts);
    }

    /// Status given to `exit`, once it was called.
    pub fn exit_status(&self) -> Option<Status> {
        self.inner.exit.lock().clone()
    }

    fn exiting(&self) -> bool {
        self.inner.exit.lock().is_some()
    }

    pub fn define(&self, name: &str, body: Vec<Cmd>) {
        tracing::debug!(name, "define func");
        self.inner
            .funcs
            .write()
            .insert(name.to_string(), Arc::from(body));
    }

    pub fn func(&self, name: &str) -> Option<Arc<[Cmd]>> {
        self.inner.funcs.read().get(name).cloned()
    }

    /// Directories searched for commands.
    pub fn search_path(&self) -> Vec<String> {
        self.inner.path.read().clone()
    }

    /// Prompt for `nest` open blocks.
    pub fn prompt(&self, nest: usize) -> String {
        self.inner.prompts.lock()[nest.min(1)].clone()
    }

    /// Trace an executor step: always to `tracing`, and to the context's
    /// stderr under `-X`.
    async fn xprint(&self, ctx: &Ctx, what: impl FnOnce() -> String) {
        let on = self.flags().debug_x;
        if !on && !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        let msg = what();
        tracing::debug!(ctx = ctx.id(), "{msg}");
        if on {
            eprint(ctx, &format!("{msg}\n")).await;
        }
    }

    // --- Commands ---

    pub fn run_cmd<'a>(&'a self, ctx: &'a Ctx, cmd: &'a Cmd) -> BoxFut<'a, Status> {
        Box::pin(async move {
            match cmd {
                Cmd::Set(s) => self.set_var(ctx, s).await,
                Cmd::Pipe(p) => self.run_pipe(ctx, p, None).await,
                Cmd::Cond(c) => self.run_cond(ctx, c).await,
            }
        })
    }

    /// Run `cmds` in order; the status is the last one. An interrupt or
    /// `exit` stops the block.
    pub(crate) fn run_block<'a>(&'a self, ctx: &'a Ctx, cmds: &'a [Cmd]) -> BoxFut<'a, Status> {
        Box::pin(async move {
            let mut sts = Ok(());
            for cmd in cmds {
                if self.exiting() {
                    break;
                }
                sts = self.run_cmd(ctx, cmd).await;
                if matches!(sts, Err(Error::Intr)) {
                    break;
                }
            }
            sts
        })
    }

    /// Run a pipe. With `outc` the last stage writes there and the call
    /// returns without waiting, as it does for tagged pipes.
    pub(crate) fn run_pipe<'a>(
        &'a self,
        ctx: &'a Ctx,
        pipe: &'a Pipe,
        outc: Option<Chan>,
    ) -> BoxFut<'a, Status> {
        Box::pin(async move {
            self.xprint(ctx, || format!("pipe {}", pipe.span)).await;
            let is_async = pipe.is_async() || outc.is_some();
            let chans = pipe_chans(pipe.stages.len(), outc.clone());
            let (handles, here_sts) = self.start_pipe(ctx, pipe, chans, is_async).await;
            if is_async {
                if outc.is_none() {
                    tracing::debug!(tag = %pipe.tag, stages = handles.len(), "background pipe");
                    self.jobs().add(&pipe.tag, handles);
                }
                return Ok(());
            }
            let mut sts = here_sts;
            for h in handles {
                let s = h.wait().await;
                if s.is_err() {
                    sts = s;
                }
            }
            if self.is_main(ctx) {
                let n = ctx.drain_sigs();
                if n > 0 {
                    tracing::debug!(signals = n, "dropped signals posted during the pipe");
                }
            }
            ctx.set_env("status", &status_string(&sts));
            sts
        })
    }

    /// Start every stage of `pipe` on its `(input, output)` pair. Stages
    /// that run here are done on return; their status comes back with the
    /// handles of the others.
    pub(crate) async fn start_pipe(
        &self,
        ctx: &Ctx,
        pipe: &Pipe,
        chans: Vec<(Chan, Chan)>,
        is_async: bool,
    ) -> (Vec<WaitHandle>, Status) {
        let mut handles = Vec::with_capacity(chans.len());
        let mut here_sts = Ok(());
        for (i, (stage, (stage_in, stage_out))) in pipe.stages.iter().zip(chans).enumerate() {
            if !is_async && runs_here(stage) {
                here_sts = self.run_stage(ctx, stage).await;
                continue;
            }
            let c = ctx.child();
            c.dup_io();
            if is_async && i == 0 {
                c.set_io(0, Chan::null());
            }
            c.dup_env();
            if !stage.is_cmd(&["cd"]) {
                c.dup_dot();
            }
            if is_async {
                c.bg();
            }
            let sh = self.clone();
            let stage = stage.clone();
            handles.push(c.spawn(move |c| async move {
                if let Err(e) = apply_redirs(&c, &stage.redirs, &stage_in, &stage_out).await {
                    stage_in.close(Some(e.clone()));
                    stage_out.close(Some(e.clone()));
                    return Err(e);
                }
                sh.run_stage(&c, &stage).await
            }));
        }
        (handles, here_sts)
    }

    async fn run_stage(&self, ctx: &Ctx, stage: &Stage) -> Status {
        match &stage.kind {
            StageKind::Exec(words) => self.run_names(ctx, words).await,
            StageKind::Block(cmds) => self.run_block(ctx, cmds).await,
            StageKind::Tee(cmds) => self.run_tee(ctx, cmds).await,
            StageKind::For {
                names,
                from_input,
                body,
            } => self.run_for(ctx, names, *from_input, body).await,
            StageKind::While { cond, body } => self.run_while(ctx, cond, body).await,
        }
    }

    /// Expand the words and run the command they name: a built-in, a
    /// function or an external program, in that order.
    async fn run_names(&self, ctx: &Ctx, words: &[Word]) -> Status {
        let argv = match self.expand(ctx, words).await {
            Ok(argv) => argv,
            Err(e) => {
                self.xprint(ctx, || format!("expand: {e}")).await;
                return Err(e);
            }
        };
        let Some(name) = argv.first().filter(|n| !n.is_empty()).cloned() else {
            return Ok(());
        };
        let builtin = Builtin::from_name(&name);
        if !builtin.is_some_and(Builtin::is_here) {
            ctx.set_args(argv.clone());
            ctx.set_env("argv", &encode_list(&argv));
            ctx.set_debug(false);
        }
        if let Some(b) = builtin {
            self.xprint(ctx, || format!("builtin {}", argv.join(" "))).await;
            return b.run(self, ctx, &argv).await;
        }
        if let Some(body) = self.func(&name) {
            self.xprint(ctx, || format!("func {}", argv.join(" "))).await;
            ctx.set_env("argv0", &name);
            return self.run_block(ctx, &body).await;
        }
        self.run_external(ctx, &argv).await
    }

    async fn run_external(&self, ctx: &Ctx, argv: &[String]) -> Status {
        let name = argv.first().map(String::as_str).unwrap_or_default();
        let Some(path) = self.look_cmd(ctx, name).await else {
            ctx.warn("command not found").await;
            return Err(Error::Status(format!("{name}: command not found")));
        };
        let Some(host) = ctx.ns().host_path(&path) else {
            let e = Error::Status(format!("{path}: not a host file"));
            ctx.warn(&e.to_string()).await;
            return Err(e);
        };
        self.xprint(ctx, || format!("exec {} {}", host.display(), argv.join(" ")))
            .await;
        ql_adapters::run_external(ctx, &host.to_string_lossy(), argv).await
    }

    /// Namespace path of the program `name` runs, if there is one.
    pub async fn look_cmd(&self, ctx: &Ctx, name: &str) -> Option<String> {
        if name.starts_with('/') || name.starts_with("./") || name.starts_with("../") {
            let path = ctx.abs_path(name);
            return is_exec(ctx, &path).await.then_some(path);
        }
        for dir in self.search_path() {
            let path = paths::join(&ctx.abs_path(&dir), name);
            if is_exec(ctx, &path).await {
                return Some(path);
            }
        }
        None
    }

    /// Each command gets its own copy of the input; the block ends when
    /// every command has.
    async fn run_tee(&self, ctx: &Ctx, cmds: &[Cmd]) -> Status {
        self.xprint(ctx, || format!("tee {} cmds", cmds.len())).await;
        let mut inputs = Vec::with_capacity(cmds.len());
        let mut handles = Vec::with_capacity(cmds.len());
        for cmd in cmds {
            let c = ctx.child();
            c.dup_io();
            let input = Chan::new();
            c.set_io(0, input.clone());
            c.dup_dot();
            c.dup_env();
            let sh = self.clone();
            let cmd = cmd.clone();
            handles.push(c.spawn(move |c| async move { sh.run_cmd(&c, &cmd).await }));
            inputs.push(Some(input));
        }
        let all_done = async {
            let mut sts = Ok(());
            for h in &handles {
                let s = h.wait().await;
                if sts.is_ok() {
                    sts = s;
                }
            }
            sts
        };
        tokio::pin!(all_done);

        let stdin = ctx.stdin();
        let mut sts = Ok(());
        let mut done = None;
        loop {
            tokio::select! {
                s = &mut all_done => {
                    done = Some(s);
                    break;
                }
                m = ctx.recv(&stdin) => match m {
                    Ok(Some(m)) => {
                        for slot in inputs.iter_mut() {
                            if let Some(c) = slot {
                                if !c.send(m.clone()).await {
                                    *slot = None;
                                }
                            }
                        }
                    }
                    Ok(None) => {
                        sts = stdin.status();
                        break;
                    }
                    Err(e) => {
                        sts = Err(e);
                        break;
                    }
                },
            }
        }
        for c in inputs.iter().flatten() {
            c.close(sts.clone().err());
        }
        let branches = match done {
            Some(s) => s,
            None => all_done.await,
        };
        sts.and(branches)
    }

    async fn run_for(&self, ctx: &Ctx, names: &[Word], from_input: bool, body: &[Cmd]) -> Status {
        let words = self.expand(ctx, names).await?;
        if from_input && words.len() == 1 {
            let var = &words[0];
            let input = ctx.stdin();
            let mut buf = LineBuf::default();
            let mut sts = Ok(());
            loop {
                let (lines, done) = match ctx.recv(&input).await? {
                    Some(m) => match LineBuf::text(m) {
                        Some(text) => (buf.push(&text), false),
                        None => continue,
                    },
                    None => (buf.finish().into_iter().collect(), true),
                };
                for line in lines {
                    ctx.set_env(var, &line);
                    let s = self.run_block(ctx, body).await;
                    if matches!(s, Err(Error::Intr)) || self.exiting() {
                        return s;
                    }
                    if sts.is_ok() {
                        sts = s;
                    }
                }
                if done {
                    return sts;
                }
            }
        }
        let Some((var, vals)) = words.split_first() else {
            return Ok(());
        };
        let mut sts = Ok(());
        for v in vals {
            ctx.set_env(var, v);
            let s = self.run_block(ctx, body).await;
            if matches!(s, Err(Error::Intr)) || self.exiting() {
                return s;
            }
            if sts.is_ok() {
                sts = s;
            }
        }
        sts
    }

    async fn run_while(&self, ctx: &Ctx, cond: &Pipe, body: &[Cmd]) -> Status {
        while !self.exiting() && self.run_pipe(ctx, cond, None).await.is_ok() {
            if let Err(Error::Intr) = self.run_block(ctx, body).await {
                return Err(Error::Intr);
            }
        }
        Ok(())
    }

    /// Try each and-list in turn until one succeeds.
    async fn run_cond(&self, ctx: &Ctx, cond: &Cond) -> Status {
        self.xprint(ctx, || format!("cond {}", cond.span)).await;
        let mut sts = Ok(());
        for ands in &cond.ors {
            sts = Ok(());
            for p in ands {
                sts = self.run_pipe(ctx, p, None).await;
                if sts.is_err() {
                    break;
                }
            }
            if sts.is_ok() || matches!(sts, Err(Error::Intr)) {
                break;
            }
        }
        sts
    }

    // --- Variables ---

    async fn set_var(&self, ctx: &Ctx, set: &Set) -> Status {
        let name = set.name.as_str();
        self.xprint(ctx, || format!("set {name}")).await;
        match &set.value {
            SetValue::Map(entries) => {
                if name == "prompt" || name == "path" {
                    ctx.warn(&format!("{name} is not a map")).await;
                }
                let mut m = match ctx.value(name) {
                    Value::Map(m) => m,
                    _ => IndexMap::new(),
                };
                for (k, v) in entries {
                    if v.is_empty() {
                        m.shift_remove(k);
                    } else {
                        m.insert(k.clone(), v.clone());
                    }
                }
                ctx.set_value(name, &Value::Map(m));
            }
            SetValue::Words(words) => {
                let vals = match self.expand(ctx, words).await {
                    Ok(vals) => vals,
                    Err(e) => {
                        ctx.warn(&format!("{name}: {e}")).await;
                        return Ok(());
                    }
                };
                match &set.idx {
                    None => {
                        if name == "path" && vals.is_empty() {
                            return refuse(ctx, "won't reset path").await;
                        }
                        if name == "prompt" && vals.len() != 2 {
                            return refuse(ctx, "prompt must have two values").await;
                        }
                        if name == "status" {
                            let s = vals.join(" ");
                            ctx.set_env("status", &s);
                            return if s.is_empty() {
                                Ok(())
                            } else {
                                Err(Error::from_status(&s))
                            };
                        }
                        ctx.set_env(name, &encode_list(&vals));
                    }
                    Some(idx) => {
                        let cur = ctx.value(name);
                        let cur = if cur.is_empty()
                            && !matches!(cur, Value::Map(_))
                            && idx.parse::<usize>().is_err()
                        {
                            Value::Map(IndexMap::new())
                        } else {
                            cur
                        };
                        match cur.set_at(idx, &vals.join(" ")) {
                            Some(v) => ctx.set_value(name, &v),
                            None => {
                                return refuse(ctx, &format!("bad index '{idx}' for '{name}'"))
                                    .await
                            }
                        }
                    }
                }
            }
        }
        match name {
            "path" => *self.inner.path.write() = env::search_path(ctx),
            "prompt" => *self.inner.prompts.lock() = env::prompts(ctx),
            _ => {}
        }
        Ok(())
    }
}

async fn refuse(ctx: &Ctx, msg: &str) -> Status {
    ctx.warn(msg).await;
    Err(Error::Status(msg.to_string()))
}

/// Input and output of each of `n` stages: `n - 1` channels join
/// neighbours, the ends are null unless `outc` takes the last output.
pub(crate) fn pipe_chans(n: usize, outc: Option<Chan>) -> Vec<(Chan, Chan)> {
    let mut chans = Vec::with_capacity(n);
    let mut prev = Chan::null();
    for i in 0..n {
        let out = if i + 1 < n {
            Chan::new()
        } else {
            outc.clone().unwrap_or_else(Chan::null)
        };
        chans.push((std::mem::replace(&mut prev, out.clone()), out));
    }
    chans
}

/// Stages that may change the shell run in its context, unless they
/// redirect anything.
fn runs_here(stage: &Stage) -> bool {
    if !stage.redirs.is_empty() {
        return false;
    }
    match &stage.kind {
        StageKind::Block(_) | StageKind::For { .. } | StageKind::While { .. } => true,
        StageKind::Tee(_) => false,
        StageKind::Exec(_) => stage
            .cmd_name()
            .and_then(Builtin::from_name)
            .is_some_and(Builtin::is_here),
    }
}

/// A non-directory with some execute bit set.
async fn is_exec(ctx: &Ctx, path: &str) -> bool {
    match ctx.ns().stat(path).await {
        Ok(d) => !d.is_dir() && u32::from_str_radix(d.get("mode"), 8).is_ok_and(|m| m & 0o111 != 0),
        Err(_) => false,
    }
}

/// Write `s` to the context's stderr, ignoring signals.
pub(crate) async fn eprint(ctx: &Ctx, s: &str) {
    let _ = ctx.stderr().send(Msg::Bytes(s.as_bytes().to_vec())).await;
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal tokens delivered to a context's inbox, and the task wait handle.

use std::fmt;
use tokio::sync::watch;

use crate::{Error, Status};

/// Depth of every context's signal inbox; extra posts are dropped.
pub const SIG_INBOX: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Intr,
    Hup,
    Kill,
    Other(String),
}

impl Signal {
    pub fn as_str(&self) -> &str {
        match self {
            Signal::Intr => "intr",
            Signal::Hup => "hup",
            Signal::Kill => "kill",
            Signal::Other(s) => s,
        }
    }
}

impl From<&str> for Signal {
    fn from(s: &str) -> Self {
        match s {
            "intr" => Signal::Intr,
            "hup" => Signal::Hup,
            "kill" => Signal::Kill,
            other => Signal::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle on a task's exit.
///
/// Fires once, when the task calls `exits`; every clone observes the same
/// status.
#[derive(Debug, Clone)]
pub struct WaitHandle {
    id: u64,
    rx: watch::Receiver<Option<Status>>,
}

impl WaitHandle {
    pub(crate) fn new(id: u64, rx: watch::Receiver<Option<Status>>) -> Self {
        Self { id, rx }
    }

    /// Id of the context this handle waits for.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The exit status, if the task already exited.
    pub fn status(&self) -> Option<Status> {
        self.rx.borrow().clone()
    }

    pub fn is_done(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait for the task to exit and return its status.
    pub async fn wait(&self) -> Status {
        let mut rx = self.rx.clone();
        let res = rx.wait_for(Option::is_some).await.map(|s| s.clone());
        match res {
            Ok(Some(sts)) => sts,
            _ => Err(Error::Status("task vanished".to_string())),
        }
    }
}

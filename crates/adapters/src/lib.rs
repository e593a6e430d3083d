// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters between the ql core and the host system: the local file
//! tree, OS standard streams and external programs.

mod env;
pub mod exec;
pub mod local;
pub mod namespace;
pub mod stdio;
pub mod traced;

pub use exec::run_external;
pub use local::LocalTree;
pub use namespace::{host_ns, ns_from_env, parse_ns};
pub use stdio::OsStdio;
pub use traced::TracedTree;

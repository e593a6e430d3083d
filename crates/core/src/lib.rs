// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ql-core: message streams, process contexts and the namespace contract
//! shared by the ql shell and its commands.

pub mod chan;
pub mod ctx;
pub mod error;
pub mod msg;
pub mod ns;
pub mod paths;
pub mod pred;
pub mod tree;
pub mod value;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use chan::Chan;
pub use ctx::{post_all, Ctx, CtxBuilder, Env, IoSet, Signal, WaitHandle};
pub use error::{status_string, Error, Status};
pub use msg::{Addr, Dir, Msg, Opaque, Range};
pub use ns::{err_dir, Ns};
pub use pred::Pred;
pub use tree::{Tree, APPEND};
pub use value::Value;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ql_core::value::encode_list;

#[yare::parameterized(
    path_list = { &[("path", "/bin\u{8}/usr/local/bin")], &["/bin", "/usr/local/bin"] },
    path_words = { &[("path", "/a /b")], &["/a", "/b"] },
    unix_path = { &[("PATH", "/x::/y")], &["/x", "/y"] },
    path_wins = { &[("path", "/p"), ("PATH", "/u")], &["/p"] },
    default = { &[], &["/bin", "/usr/bin"] },
)]
fn search_path_sources(vars: &[(&str, &str)], want: &[&str]) {
    let ctx = Ctx::builder()
        .envs(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())))
        .build();
    assert_eq!(search_path(&ctx), want);
}

#[test]
fn prompts_need_two_values() {
    let ctx = Ctx::builder().env("prompt", "only").build();
    assert_eq!(prompts(&ctx), ["% ", "%     "]);
    ctx.set_env("prompt", &encode_list(&["$ ", "> "]));
    assert_eq!(prompts(&ctx), ["$ ", "> "]);
}

//! Background job specs

use crate::prelude::*;

#[test]
fn async_block_and_wait() {
    let out = ql()
        .script("{ sleep 1 ; echo done } &j ; echo started ; wait j")
        .passes()
        .stdout();
    similar_asserts::assert_eq!(out, "started\ndone\n");
}

#[test]
fn wait_reports_a_failed_job() {
    ql().script("/does/not/exist/x &j ; wait j ; echo $status")
        .passes()
        .stdout_has("file does not exist");
}

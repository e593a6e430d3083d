//! Listing specs
//!
//! A bare path at top level lists it; lf, gf and pf shape the listing.

use crate::prelude::*;

#[test]
fn bare_path_lists_depth_first() {
    let f = Fixture::new();
    f.ql()
        .script(&format!("{}/", f.path().display()))
        .passes()
        .stdout_eq(&format!("{}\n{}\n{}\n", f.abs("a"), f.abs("b"), f.abs("sub")));
}

#[test]
fn bare_path_is_lf_piped_to_pf() {
    let f = Fixture::new();
    let bare = f.ql().script("sub/").passes().stdout();
    f.ql().script("lf sub/ | pf").passes().stdout_eq(&bare);
}

#[test]
fn missing_path_sets_status() {
    let f = Fixture::new();
    f.ql()
        .script("/does/not/exist | echo $status")
        .fails()
        .stderr_has("/does/not/exist: file does not exist");
}

#[test]
fn status_is_visible_to_the_next_command() {
    let f = Fixture::new();
    f.ql()
        .script("/does/not/exist ; echo $status")
        .passes()
        .stdout_eq("/does/not/exist: file does not exist\n");
}

#[test]
fn predicates_filter_the_walk() {
    let f = Fixture::new();
    f.ql()
        .script("lf .,type=- | pf -p")
        .passes()
        .stdout_eq("a\nb\nc\n");
}

#[test]
fn gf_streams_contents() {
    let f = Fixture::new();
    f.ql()
        .script("gf a sub/c | pf -f")
        .passes()
        .stdout_eq("alpha\ngamma\n");
}

#[test]
fn for_over_a_listing() {
    let f = Fixture::new();
    f.ql()
        .script(".,type=- | for x { echo got $x }")
        .passes()
        .stdout_eq("got a\ngot b\ngot sub/c\n");
}

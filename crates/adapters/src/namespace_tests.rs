// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn entries_mount_in_order() {
    let ns = parse_ns("/ /\n/tmp /var/tmp ; /home/u /srv/u", false).unwrap();
    let mounts = ns.mounts();
    assert_eq!(
        mounts,
        vec![
            ("/home/u".to_string(), "lfs:/srv/u".to_string()),
            ("/tmp".to_string(), "lfs:/var/tmp".to_string()),
            ("/".to_string(), "lfs:/".to_string()),
        ]
    );
}

#[test]
fn comments_and_blanks_are_skipped() {
    let ns = parse_ns("# root\n\n/ /\n", false).unwrap();
    assert_eq!(ns.mounts().len(), 1);
}

#[parameterized(
    missing_host = { "/ " },
    extra_field = { "/ / x" },
    relative_prefix = { "tmp /tmp" },
    no_root = { "/tmp /tmp" },
)]
fn bad_descriptions_fail(desc: &str) {
    assert!(parse_ns(desc, false).is_err());
}

#[test]
fn host_ns_maps_paths_to_the_host() {
    let ns = host_ns(false);
    assert_eq!(
        ns.host_path("/etc/hosts"),
        Some(std::path::PathBuf::from("/etc/hosts"))
    );
}

#[test]
fn traced_mounts_keep_host_paths() {
    let ns = parse_ns("/ /srv", true).unwrap();
    assert_eq!(
        ns.host_path("/x"),
        Some(std::path::PathBuf::from("/srv/x"))
    );
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    intr = { "interrupted", Error::Intr },
    usage = { "usage", Error::Usage },
    broken = { "broken pipe", Error::BrokenPipe },
    free_form = { "exit status 2", Error::Status("exit status 2".to_string()) },
)]
fn from_status_maps_known_strings(text: &str, expected: Error) {
    assert_eq!(Error::from_status(text), expected);
    assert_eq!(expected.to_string(), text);
}

#[test]
fn io_not_found_becomes_not_exist() {
    let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    assert_eq!(Error::io("/x", &err), Error::NotExist("/x".to_string()));
}

#[test]
fn io_other_keeps_message() {
    let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    assert_eq!(Error::io("/x", &err).to_string(), "/x: denied");
}

#[test]
fn status_string_is_empty_on_success() {
    assert_eq!(status_string(&Ok(())), "");
    assert_eq!(status_string(&Err(Error::Usage)), "usage");
}

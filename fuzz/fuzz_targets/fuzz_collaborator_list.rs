//! Fuzz target for collaborator parsing.
//!
//! Tests the inline list parser and the config file parser with arbitrary input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rehome_migrate::{parse_collaborator_list, CollaboratorConfig, CollaboratorSet};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    let list = parse_collaborator_list(&text);
    for collaborator in &list {
        assert!(!collaborator.username.trim().is_empty());
        assert!(!collaborator.username.contains(','));
    }

    let mut set = CollaboratorSet::new();
    set.merge(&list);
    assert!(set.len() <= list.len());

    // Invalid JSON is an error, never a panic
    let _ = CollaboratorConfig::from_json(&text);
});

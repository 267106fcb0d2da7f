//! Fuzz target for remote URL parsing.
//!
//! Any URL that parses must reconstruct to a URL that parses to the same owner and repository.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rehome_migrate::remote::{redact, RemoteUrl};

fuzz_target!(|data: &[u8]| {
    let url = String::from_utf8_lossy(data);

    if let Some(parsed) = RemoteUrl::parse(&url) {
        let rebuilt = parsed.to_string();
        let reparsed = RemoteUrl::parse(&rebuilt).expect("reconstructed URL must parse");
        assert_eq!(reparsed.owner, parsed.owner);
        assert_eq!(reparsed.repo, parsed.repo);
        assert_eq!(reparsed.scheme, parsed.scheme);

        let moved = parsed.with_owner("fuzz-owner");
        assert_eq!(moved.repo, parsed.repo);
    }

    // Redaction must not panic on arbitrary input
    let _ = redact(&url);
});

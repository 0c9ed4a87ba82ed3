//! Fuzz target for compiling `.proto` text into schema trees.
//!
//! Goal: Compilation and tree construction should **never panic** on any
//! input. Syntax errors, unsupported groups and bad policy values are errors.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_proto_source
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = protofilter_source::fuzz::parse_proto_source(text);
    }
});

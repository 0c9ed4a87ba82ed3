//! Fuzz target for merging config values with command-line overrides.
//!
//! Goal: Resolution should **never panic**; invalid globs and missing
//! inputs or terms must come back as errors.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_resolve
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use protofilter_settings::{Overrides, ProtofilterConfigV1, resolve_config};

#[derive(Arbitrary, Debug)]
struct ResolveInput {
    inputs: Vec<String>,
    include_paths: Vec<String>,
    output: Option<String>,
    terms: Vec<String>,
    strip_policy_options: Option<bool>,
    /// Exclude globs (e.g. "**/testdata/**")
    exclude_files: Vec<String>,
    cli_inputs: Vec<String>,
    cli_terms: Vec<String>,
    cli_output: Option<String>,
    cli_strip: bool,
}

fuzz_target!(|input: ResolveInput| {
    // Limit input size to keep fuzzing fast
    if input.exclude_files.len() > 20 || input.exclude_files.iter().any(|g| g.len() > 256) {
        return;
    }

    let cfg = ProtofilterConfigV1 {
        inputs: input.inputs,
        include_paths: input.include_paths,
        output: input.output,
        terms: input.terms,
        strip_policy_options: input.strip_policy_options,
        exclude_files: input.exclude_files,
    };
    let overrides = Overrides {
        inputs: input.cli_inputs,
        include_paths: Vec::new(),
        output: input.cli_output,
        terms: input.cli_terms,
        strip_policy_options: input.cli_strip,
    };

    // Should never panic - errors are fine
    let _ = resolve_config(cfg, overrides);
});

//! Use case orchestration for protofilter.
//!
//! This crate provides the application layer: it coordinates the settings,
//! source, domain and render crates. The CLI crate depends on this; it only
//! handles argument parsing, logging setup and exit codes.

#![forbid(unsafe_code)]

mod filter;
mod summary;
mod write;

pub use filter::{FilterInput, FilterOutput, RenderedFile, filter_files, run_filter};
pub use summary::{RemovedEntry, RunSummary, serialize_summary};
pub use write::{write_outputs, write_summary};

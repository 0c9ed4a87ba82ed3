//! Printing schema trees back to `.proto` source text.
//!
//! Pure and deterministic: the same tree always prints the same bytes.

#![forbid(unsafe_code)]

mod printer;
mod proto;

pub use proto::render_file;

//! Machine-readable record of one filter run.

use anyhow::Context;
use protofilter_domain::{DanglingReference, NodeKind};
use serde::Serialize;

/// What a run kept, dropped and removed, serialized as JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Active terms, sorted.
    pub terms: Vec<String>,
    pub files_written: Vec<String>,
    pub files_dropped: Vec<String>,
    /// Roots of removed subtrees, in traversal order per file.
    pub removed: Vec<RemovedEntry>,
    pub dangling_references: Vec<DanglingReference>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RemovedEntry {
    pub file: String,
    pub kind: NodeKind,
    pub path: String,
}

pub fn serialize_summary(summary: &RunSummary) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec_pretty(summary).context("serialize run summary")
}

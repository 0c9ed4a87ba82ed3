//! The `filter` use case: load schemas, prune them for the active terms and
//! render what is left.

use crate::summary::{RemovedEntry, RunSummary};
use anyhow::Context;
use protofilter_domain::model::SchemaFile;
use protofilter_domain::{FileOutcome, declared_types, find_dangling_references, prune_file};
use protofilter_settings::{Overrides, ResolvedConfig};
use protofilter_source::LoadRequest;
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Input for the filter use case.
#[derive(Clone, Debug)]
pub struct FilterInput<'a> {
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    /// CLI overrides.
    pub overrides: Overrides,
}

/// One printed output file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedFile {
    /// Import name, also the path below the output directory.
    pub name: String,
    pub text: String,
}

/// Output from the filter use case. Nothing has been written yet.
#[derive(Clone, Debug)]
pub struct FilterOutput {
    pub files: Vec<RenderedFile>,
    pub summary: RunSummary,
    /// The resolved configuration used.
    pub resolved_config: ResolvedConfig,
}

/// Run the filter use case: resolve config, load, prune, check references, render.
pub fn run_filter(input: FilterInput<'_>) -> anyhow::Result<FilterOutput> {
    // Parse config (empty is allowed, defaults apply).
    let cfg = if input.config_text.trim().is_empty() {
        protofilter_settings::ProtofilterConfigV1::default()
    } else {
        protofilter_settings::parse_config_toml(input.config_text).context("parse config")?
    };

    let resolved =
        protofilter_settings::resolve_config(cfg, input.overrides).context("resolve config")?;

    let files = protofilter_source::load_schemas(&LoadRequest {
        inputs: resolved.inputs.clone(),
        include_paths: resolved.include_paths.clone(),
        exclude_files: resolved.exclude_files.clone(),
        strip_policy_options: resolved.strip_policy_options,
    })?;

    let (files, summary) = filter_files(files, &resolved)?;

    let files = files
        .iter()
        .map(|file| RenderedFile {
            name: file.name.clone(),
            text: protofilter_render::render_file(file),
        })
        .collect();

    Ok(FilterOutput {
        files,
        summary,
        resolved_config: resolved,
    })
}

/// Prune every file for the resolved terms and collect the run summary.
///
/// Files are pruned in parallel; the first failure aborts the whole run.
pub fn filter_files(
    mut files: Vec<SchemaFile>,
    resolved: &ResolvedConfig,
) -> anyhow::Result<(Vec<SchemaFile>, RunSummary)> {
    let terms = &resolved.terms;
    let before: BTreeSet<String> = files.iter().flat_map(declared_types).collect();

    let outcomes: Vec<FileOutcome> = files
        .par_iter_mut()
        .map(|file| prune_file(file, terms))
        .collect::<Result<Vec<_>, _>>()
        .context("prune schema files")?;

    let mut summary = RunSummary {
        terms: terms.iter().map(str::to_string).collect(),
        ..RunSummary::default()
    };
    let mut kept = Vec::with_capacity(files.len());
    for (file, outcome) in files.into_iter().zip(outcomes) {
        match outcome {
            FileOutcome::Dropped => {
                tracing::info!(file = %file.name, "file dropped by its policy");
                summary.files_dropped.push(file.name);
            }
            FileOutcome::Kept { removed } => {
                summary.removed.extend(removed.into_iter().map(|node| RemovedEntry {
                    file: file.name.clone(),
                    kind: node.kind,
                    path: node.path,
                }));
                kept.push(file);
            }
        }
    }

    let after: BTreeSet<String> = kept.iter().flat_map(declared_types).collect();
    let removed_types: BTreeSet<String> = before.difference(&after).cloned().collect();
    summary.dangling_references = find_dangling_references(&kept, &removed_types);
    for dangling in &summary.dangling_references {
        tracing::warn!(
            file = %dangling.file,
            from = %dangling.from,
            target = %dangling.target,
            "reference to a removed type"
        );
    }

    summary.files_written = kept.iter().map(|file| file.name.clone()).collect();
    Ok((kept, summary))
}

//! Schema source adapters: discover `.proto` inputs, compile them and build
//! the domain tree.
//!
//! This crate is allowed to do filesystem reads. Compilation runs in-process
//! through `protox`; nothing is spawned.

#![forbid(unsafe_code)]

mod comments;
mod convert;
mod discover;
mod options;
mod resolver;
mod strip;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use globset::GlobSet;
use prost_reflect::DescriptorPool;
use protofilter_domain::model::SchemaFile;
use resolver::{Lookup, MemoryResolver};

pub use discover::{InputFile, discover_inputs, normalize};
pub use options::{POLICY_PACKAGE, is_policy_option};
pub use resolver::FILTER_PROTO_NAME;
pub use strip::strip_policy_options;

/// Fuzz-friendly API for testing parsing robustness without filesystem access.
/// These functions are designed to never panic on any input.
pub mod fuzz {
    use super::*;

    /// Compile arbitrary text as a single `.proto` file and build its tree.
    ///
    /// Returns `Ok(())` when the text compiles and converts, `Err(...)`
    /// otherwise. **Never panics** on any input.
    pub fn parse_proto_source(text: &str) -> anyhow::Result<()> {
        let _ = load_sources(&[("fuzz.proto", text)], false)?;
        Ok(())
    }
}

/// What to load and how.
#[derive(Clone, Debug)]
pub struct LoadRequest {
    /// Files or directories.
    pub inputs: Vec<Utf8PathBuf>,
    /// User lookup paths, searched before the inferred input roots.
    pub include_paths: Vec<Utf8PathBuf>,
    /// Applied while walking directory inputs.
    pub exclude_files: GlobSet,
    pub strip_policy_options: bool,
}

/// Discover, compile and convert the requested inputs.
///
/// Imported files are compiled too but only the inputs are returned, in
/// discovery order.
pub fn load_schemas(req: &LoadRequest) -> anyhow::Result<Vec<SchemaFile>> {
    let inputs = discover_inputs(&req.inputs, &req.exclude_files).context("discover inputs")?;
    if inputs.is_empty() {
        anyhow::bail!("no .proto files found in the given inputs");
    }

    let includes = lookup_paths(&req.include_paths, &inputs);
    tracing::debug!(?includes, "import lookup paths");

    let mut names: Vec<String> = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let name = import_name(&input.path, &includes)
            .with_context(|| format!("{} is not under any include path", input.path))?;
        if !names.contains(&name) {
            names.push(name);
        }
    }

    let mut compiler = resolver::compiler(Lookup::Include(&includes));
    compiler
        .open_files(inputs.iter().map(|input| input.path.as_std_path()))
        .context("compile .proto inputs")?;
    let pool = compiler.descriptor_pool();

    let files = build(&pool, &names, req.strip_policy_options)?;
    tracing::info!(files = files.len(), "loaded schema files");
    Ok(files)
}

/// Compile in-memory `(import name, source)` pairs and convert all of them.
///
/// Imports resolve against the other given sources, the well-known types and
/// the bundled `filter.proto`.
pub fn load_sources(sources: &[(&str, &str)], strip: bool) -> anyhow::Result<Vec<SchemaFile>> {
    let names: Vec<String> = sources.iter().map(|(name, _)| name.to_string()).collect();
    let memory = MemoryResolver::new(
        sources
            .iter()
            .map(|(name, text)| (name.to_string(), text.to_string())),
    );

    let mut compiler = resolver::compiler(Lookup::Memory(memory));
    compiler
        .open_files(names.iter().map(|name| Utf8Path::new(name).as_std_path()))
        .context("compile .proto sources")?;
    let pool = compiler.descriptor_pool();

    build(&pool, &names, strip)
}

fn build(pool: &DescriptorPool, names: &[String], strip: bool) -> anyhow::Result<Vec<SchemaFile>> {
    let extensions = options::PolicyExtensions::from_pool(pool);
    names
        .iter()
        .map(|name| {
            let file = pool
                .get_file_by_name(name)
                .with_context(|| format!("{name} is missing from the compiled output"))?;
            let mut schema = convert::convert_file(pool, &file, &extensions)
                .with_context(|| format!("read {name}"))?;
            if strip {
                strip_policy_options(&mut schema);
            }
            Ok(schema)
        })
        .collect()
}

/// User include paths, then one inferred root per input; no duplicates.
fn lookup_paths(user: &[Utf8PathBuf], inputs: &[InputFile]) -> Vec<Utf8PathBuf> {
    let mut out: Vec<Utf8PathBuf> = Vec::new();
    let candidates = user
        .iter()
        .map(|p| normalize(p))
        .chain(inputs.iter().map(|input| input.root.clone()));
    for path in candidates {
        if !out.contains(&path) {
            out.push(path);
        }
    }
    out
}

/// The name `path` is compiled under: relative to the first include path
/// that contains it, or the relative path itself.
fn import_name(path: &Utf8Path, includes: &[Utf8PathBuf]) -> Option<String> {
    let to_name = |p: &Utf8Path| {
        p.components()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join("/")
    };
    includes
        .iter()
        .find_map(|dir| path.strip_prefix(dir).ok())
        .map(to_name)
        .or_else(|| path.is_relative().then(|| to_name(path)))
}

//! Config parsing and resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod resolve;

pub use model::ProtofilterConfigV1;
pub use resolve::{ConfigError, DEFAULT_OUTPUT, InvalidConfig, Overrides, ResolvedConfig};

/// Parse `protofilter.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<ProtofilterConfigV1> {
    let cfg: ProtofilterConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective run configuration (config file + CLI overrides) and validate it.
pub fn resolve_config(
    cfg: ProtofilterConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}

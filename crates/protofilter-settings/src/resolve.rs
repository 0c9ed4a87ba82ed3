use crate::model::ProtofilterConfigV1;
use camino::Utf8PathBuf;
use globset::{Glob, GlobSet, GlobSetBuilder};
use protofilter_domain::ActiveTerms;
use std::fmt;

pub const DEFAULT_OUTPUT: &str = "./output";

/// Values given on the command line. Empty/`None` means "not given".
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub inputs: Vec<String>,
    pub include_paths: Vec<String>,
    pub output: Option<String>,
    pub terms: Vec<String>,
    pub strip_policy_options: bool,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub inputs: Vec<Utf8PathBuf>,
    pub include_paths: Vec<Utf8PathBuf>,
    pub output: Utf8PathBuf,
    pub terms: ActiveTerms,
    pub strip_policy_options: bool,
    pub exclude_files: GlobSet,
}

/// One problem found while validating the merged configuration.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("no files given to process")]
    NoInputs,

    #[error("no terms to filter for given")]
    NoTerms,

    #[error("invalid exclude glob `{pattern}`: {reason}")]
    InvalidGlob { pattern: String, reason: String },
}

/// All problems found in one configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidConfig(pub Vec<ConfigError>);

impl std::error::Error for InvalidConfig {}

impl fmt::Display for InvalidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid configuration: ")?;
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

pub fn resolve_config(
    cfg: ProtofilterConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    let mut errors = Vec::new();

    let inputs = if overrides.inputs.is_empty() {
        cfg.inputs
    } else {
        overrides.inputs
    };
    if inputs.is_empty() {
        errors.push(ConfigError::NoInputs);
    }

    let terms = if overrides.terms.is_empty() {
        cfg.terms
    } else {
        overrides.terms
    };
    let terms: ActiveTerms = terms.into_iter().filter(|t| !t.is_empty()).collect();
    if terms.is_empty() {
        errors.push(ConfigError::NoTerms);
    }

    let mut globs = GlobSetBuilder::new();
    for pattern in &cfg.exclude_files {
        match Glob::new(pattern) {
            Ok(glob) => {
                globs.add(glob);
            }
            Err(err) => errors.push(ConfigError::InvalidGlob {
                pattern: pattern.clone(),
                reason: err.kind().to_string(),
            }),
        }
    }

    if !errors.is_empty() {
        return Err(InvalidConfig(errors).into());
    }

    let output = overrides
        .output
        .or(cfg.output)
        .filter(|o| !o.is_empty())
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    let include_paths = cfg
        .include_paths
        .into_iter()
        .chain(overrides.include_paths)
        .map(Utf8PathBuf::from)
        .collect();

    Ok(ResolvedConfig {
        inputs: inputs.into_iter().map(Utf8PathBuf::from).collect(),
        include_paths,
        output: Utf8PathBuf::from(output),
        terms,
        strip_policy_options: overrides.strip_policy_options
            || cfg.strip_policy_options.unwrap_or(false),
        exclude_files: globs.build()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_config_toml;

    fn overrides(inputs: &[&str], terms: &[&str]) -> Overrides {
        Overrides {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            terms: terms.iter().map(|s| s.to_string()).collect(),
            ..Overrides::default()
        }
    }

    fn config_errors(err: anyhow::Error) -> Vec<ConfigError> {
        err.downcast::<InvalidConfig>().expect("InvalidConfig").0
    }

    #[test]
    fn parses_all_keys() {
        let cfg = parse_config_toml(
            r#"
inputs = ["proto/"]
include_paths = ["third_party"]
output = "gen/public"
terms = ["public"]
strip_policy_options = true
exclude_files = ["**/testdata/**"]
"#,
        )
        .expect("parse");

        assert_eq!(cfg.inputs, vec!["proto/"]);
        assert_eq!(cfg.include_paths, vec!["third_party"]);
        assert_eq!(cfg.output.as_deref(), Some("gen/public"));
        assert_eq!(cfg.terms, vec!["public"]);
        assert_eq!(cfg.strip_policy_options, Some(true));
        assert_eq!(cfg.exclude_files, vec!["**/testdata/**"]);
    }

    #[test]
    fn empty_file_and_unknown_keys_are_accepted() {
        assert_eq!(parse_config_toml("").expect("empty"), ProtofilterConfigV1::default());
        assert!(parse_config_toml("future_key = 1\n").is_ok());
    }

    #[test]
    fn wrong_value_type_is_a_parse_error() {
        assert!(parse_config_toml("terms = \"public\"\n").is_err());
    }

    #[test]
    fn collects_every_problem() {
        let cfg = ProtofilterConfigV1 {
            exclude_files: vec!["a/[".to_string()],
            ..ProtofilterConfigV1::default()
        };

        let errors = config_errors(resolve_config(cfg, Overrides::default()).expect_err("invalid"));

        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], ConfigError::NoInputs);
        assert_eq!(errors[1], ConfigError::NoTerms);
        assert!(matches!(&errors[2], ConfigError::InvalidGlob { pattern, .. } if pattern == "a/["));
    }

    #[test]
    fn error_message_lists_problems() {
        let err = resolve_config(ProtofilterConfigV1::default(), Overrides::default())
            .expect_err("invalid");
        assert_eq!(
            err.to_string(),
            "invalid configuration: no files given to process; no terms to filter for given"
        );
    }

    #[test]
    fn output_defaults_when_missing_or_empty() {
        let resolved =
            resolve_config(ProtofilterConfigV1::default(), overrides(&["a.proto"], &["public"]))
                .expect("resolve");
        assert_eq!(resolved.output, DEFAULT_OUTPUT);

        let cfg = ProtofilterConfigV1 {
            output: Some(String::new()),
            ..ProtofilterConfigV1::default()
        };
        let resolved = resolve_config(cfg, overrides(&["a.proto"], &["public"])).expect("resolve");
        assert_eq!(resolved.output, DEFAULT_OUTPUT);
    }

    #[test]
    fn cli_values_take_precedence() {
        let cfg = ProtofilterConfigV1 {
            inputs: vec!["from_config.proto".to_string()],
            include_paths: vec!["cfg_include".to_string()],
            output: Some("cfg_out".to_string()),
            terms: vec!["internal".to_string()],
            strip_policy_options: Some(false),
            exclude_files: Vec::new(),
        };
        let mut cli = overrides(&["from_cli.proto"], &["public"]);
        cli.include_paths = vec!["cli_include".to_string()];
        cli.output = Some("cli_out".to_string());
        cli.strip_policy_options = true;

        let resolved = resolve_config(cfg, cli).expect("resolve");

        assert_eq!(resolved.inputs, vec![Utf8PathBuf::from("from_cli.proto")]);
        assert_eq!(
            resolved.include_paths,
            vec![Utf8PathBuf::from("cfg_include"), Utf8PathBuf::from("cli_include")]
        );
        assert_eq!(resolved.output, "cli_out");
        assert_eq!(resolved.terms.iter().collect::<Vec<_>>(), vec!["public"]);
        assert!(resolved.strip_policy_options);
    }

    #[test]
    fn config_values_fill_gaps() {
        let cfg = ProtofilterConfigV1 {
            inputs: vec!["proto".to_string()],
            terms: vec!["public".to_string(), "partner".to_string(), "public".to_string()],
            strip_policy_options: Some(true),
            exclude_files: vec!["**/testdata/**".to_string()],
            ..ProtofilterConfigV1::default()
        };

        let resolved = resolve_config(cfg, Overrides::default()).expect("resolve");

        assert_eq!(resolved.inputs, vec![Utf8PathBuf::from("proto")]);
        assert_eq!(resolved.terms.len(), 2);
        assert!(resolved.strip_policy_options);
        assert!(resolved.exclude_files.is_match("proto/testdata/bad.proto"));
        assert!(!resolved.exclude_files.is_match("proto/good.proto"));
    }

    #[test]
    fn blank_terms_do_not_count() {
        let errors = config_errors(
            resolve_config(ProtofilterConfigV1::default(), overrides(&["a.proto"], &[""]))
                .expect_err("no usable terms"),
        );
        assert_eq!(errors, vec![ConfigError::NoTerms]);
    }
}

use serde::{Deserialize, Serialize};

/// `protofilter.toml` schema v1.
///
/// Every key is optional; unknown keys are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtofilterConfigV1 {
    /// `.proto` files or directories to process.
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Lookup paths for imports, searched before the inputs' own directories.
    #[serde(default)]
    pub include_paths: Vec<String>,

    /// Directory the filtered files are written to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Active filter terms.
    #[serde(default)]
    pub terms: Vec<String>,

    /// Remove `(filter.*)` options and the `filter.proto` import from the output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_policy_options: Option<bool>,

    /// Globs for files to skip while walking input directories.
    #[serde(default)]
    pub exclude_files: Vec<String>,
}

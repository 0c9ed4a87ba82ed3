//! Writing rendered files and the run summary to disk.

use crate::filter::RenderedFile;
use crate::summary::{RunSummary, serialize_summary};
use anyhow::Context;
use camino::{Utf8Component, Utf8Path};

/// Write every file to `<output_dir>/<name>`, creating directories as needed.
pub fn write_outputs(output_dir: &Utf8Path, files: &[RenderedFile]) -> anyhow::Result<()> {
    for file in files {
        let relative = Utf8Path::new(&file.name);
        if !relative
            .components()
            .all(|c| matches!(c, Utf8Component::Normal(_)))
        {
            anyhow::bail!("refusing to write outside the output directory: {}", file.name);
        }
        let path = output_dir.join(relative);
        write_text_file(&path, &file.text).with_context(|| format!("write {}", file.name))?;
        tracing::info!(path = %path, "wrote filtered schema");
    }
    Ok(())
}

pub fn write_summary(path: &Utf8Path, summary: &RunSummary) -> anyhow::Result<()> {
    let data = serialize_summary(summary)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {}", parent))?;
    }
    std::fs::write(path, data).with_context(|| format!("write summary: {}", path))?;
    Ok(())
}

fn write_text_file(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {}", parent))?;
    }
    std::fs::write(path, text).with_context(|| format!("write text: {}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(name: &str, text: &str) -> RenderedFile {
        RenderedFile {
            name: name.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn writes_nested_paths_below_output_dir() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = Utf8Path::from_path(tmp.path()).expect("utf8 path");
        let out = root.join("gen");

        write_outputs(&out, &[rendered("acme/v1/a.proto", "syntax = \"proto3\";\n")])
            .expect("write");

        let text = std::fs::read_to_string(out.join("acme/v1/a.proto")).expect("read back");
        assert_eq!(text, "syntax = \"proto3\";\n");
    }

    #[test]
    fn rejects_names_escaping_the_output_dir() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = Utf8Path::from_path(tmp.path()).expect("utf8 path");

        let err = write_outputs(&root.join("gen"), &[rendered("../evil.proto", "")])
            .expect_err("must refuse");
        assert!(err.to_string().contains("outside the output directory"));
        assert!(!root.join("evil.proto").exists());
    }

    #[test]
    fn summary_is_written_as_json() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let root = Utf8Path::from_path(tmp.path()).expect("utf8 path");
        let path = root.join("reports/summary.json");

        write_summary(&path, &RunSummary::default()).expect("write summary");

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        assert!(value["files_written"].as_array().expect("array").is_empty());
    }
}

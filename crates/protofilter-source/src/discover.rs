use anyhow::Context;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use globset::GlobSet;
use std::path::PathBuf;
use walkdir::WalkDir;

/// A `.proto` file to compile, with the directory its imports are inferred from.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct InputFile {
    pub path: Utf8PathBuf,
    /// The walked directory for directory inputs, the parent directory otherwise.
    pub root: Utf8PathBuf,
}

/// Expand `inputs` into the `.proto` files they name.
///
/// Behavior:
/// - A file input is taken as is, whatever its extension.
/// - A directory input is walked recursively for `*.proto`; files whose path
///   (full or relative to the directory) matches `exclude` are skipped.
/// - The result is sorted by path and free of duplicates.
pub fn discover_inputs(inputs: &[Utf8PathBuf], exclude: &GlobSet) -> anyhow::Result<Vec<InputFile>> {
    let mut out = Vec::new();

    for input in inputs {
        let input = normalize(input);
        let meta = std::fs::metadata(&input).with_context(|| format!("read input {input}"))?;

        if meta.is_file() {
            let root = input
                .parent()
                .filter(|p| !p.as_str().is_empty())
                .map(Utf8Path::to_path_buf)
                .unwrap_or_else(|| Utf8PathBuf::from("."));
            out.push(InputFile { path: input, root });
            continue;
        }

        for entry in WalkDir::new(&input).follow_links(true) {
            let entry = entry.with_context(|| format!("walk {input}"))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(path) = pathbuf_to_utf8(entry.path().to_path_buf()) else {
                tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 path");
                continue;
            };
            if path.extension() != Some("proto") {
                continue;
            }

            let rel = path
                .strip_prefix(&input)
                .unwrap_or(&path)
                .as_str()
                .replace('\\', "/");
            if exclude.is_match(&rel) || exclude.is_match(path.as_str()) {
                tracing::debug!(%path, "excluded by exclude_files");
                continue;
            }

            out.push(InputFile {
                path,
                root: input.clone(),
            });
        }
    }

    // Stable order.
    out.sort();
    out.dedup_by(|a, b| a.path == b.path);

    tracing::debug!(count = out.len(), "discovered input files");
    Ok(out)
}

/// Drop `.` components so that prefix checks between inputs and include
/// paths compare like with like.
pub fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let out: Utf8PathBuf = path
        .components()
        .filter(|c| !matches!(c, Utf8Component::CurDir))
        .collect();
    if out.as_str().is_empty() {
        Utf8PathBuf::from(".")
    } else {
        out
    }
}

fn pathbuf_to_utf8(path: PathBuf) -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use globset::{Glob, GlobSetBuilder};
    use tempfile::TempDir;

    fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path")
    }

    fn write_file(path: &Utf8Path, contents: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, contents).expect("write file");
    }

    fn globs(patterns: &[&str]) -> GlobSet {
        let mut b = GlobSetBuilder::new();
        for p in patterns {
            b.add(Glob::new(p).expect("glob"));
        }
        b.build().expect("globset")
    }

    #[test]
    fn walks_directories_for_proto_files_in_order() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("b/second.proto"), "");
        write_file(&root.join("a/first.proto"), "");
        write_file(&root.join("a/notes.txt"), "");

        let found = discover_inputs(std::slice::from_ref(&root), &GlobSet::empty()).expect("discover");

        let rel: Vec<&str> = found
            .iter()
            .map(|f| f.path.strip_prefix(&root).expect("under root").as_str())
            .collect();
        assert_eq!(rel, vec!["a/first.proto", "b/second.proto"]);
        assert!(found.iter().all(|f| f.root == root));
    }

    #[test]
    fn exclude_globs_apply_to_relative_paths() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("api/keep.proto"), "");
        write_file(&root.join("api/testdata/skip.proto"), "");

        let found = discover_inputs(&[root.clone()], &globs(&["**/testdata/**"])).expect("discover");

        assert_eq!(found.len(), 1);
        assert!(found[0].path.ends_with("api/keep.proto"));
    }

    #[test]
    fn file_inputs_use_parent_directory_and_dedupe() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        let file = root.join("pkg/one.proto");
        write_file(&file, "");

        let found =
            discover_inputs(&[file.clone(), file.clone()], &GlobSet::empty()).expect("discover");

        assert_eq!(
            found,
            vec![InputFile {
                path: file,
                root: root.join("pkg"),
            }]
        );
    }

    #[test]
    fn missing_input_is_an_error() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);

        let err = discover_inputs(&[root.join("nope.proto")], &GlobSet::empty())
            .expect_err("missing input");
        assert!(err.to_string().contains("nope.proto"));
    }

    #[test]
    fn normalize_drops_current_dir_components() {
        assert_eq!(normalize(Utf8Path::new("./proto/./a.proto")), "proto/a.proto");
        assert_eq!(normalize(Utf8Path::new("./")), ".");
        assert_eq!(normalize(Utf8Path::new("a.proto")), "a.proto");
    }
}

use camino::Utf8PathBuf;
use protox::file::{ChainFileResolver, File, FileResolver, GoogleFileResolver, IncludeFileResolver};
use protox::{Compiler, Error};
use std::collections::BTreeMap;
use std::path::Path;

/// Import name the bundled policy definitions are served under.
pub const FILTER_PROTO_NAME: &str = "filter.proto";

const FILTER_PROTO: &str = include_str!("../proto/filter.proto");

/// Serves the bundled `filter.proto`. Chained last, so a user copy wins.
#[derive(Debug, Default)]
struct BundledFilterResolver;

impl FileResolver for BundledFilterResolver {
    fn open_file(&self, name: &str) -> Result<File, Error> {
        if name == FILTER_PROTO_NAME {
            File::from_source(name, FILTER_PROTO)
        } else {
            Err(Error::file_not_found(name))
        }
    }
}

/// In-memory sources keyed by import name.
#[derive(Debug, Default)]
pub(crate) struct MemoryResolver {
    files: BTreeMap<String, String>,
}

impl MemoryResolver {
    pub(crate) fn new<I>(files: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            files: files.into_iter().collect(),
        }
    }
}

impl FileResolver for MemoryResolver {
    fn resolve_path(&self, path: &Path) -> Option<String> {
        let name = path.to_str()?;
        self.files.contains_key(name).then(|| name.to_string())
    }

    fn open_file(&self, name: &str) -> Result<File, Error> {
        match self.files.get(name) {
            Some(source) => File::from_source(name, source),
            None => Err(Error::file_not_found(name)),
        }
    }
}

/// Where imports are looked up, in order.
pub(crate) enum Lookup<'a> {
    Include(&'a [Utf8PathBuf]),
    Memory(MemoryResolver),
}

/// A compiler that sees `lookup`, then the well-known types, then the bundled
/// `filter.proto`. Source info is retained for comments.
pub(crate) fn compiler(lookup: Lookup<'_>) -> Compiler {
    let mut chain = ChainFileResolver::new();
    match lookup {
        Lookup::Include(dirs) => {
            for dir in dirs {
                chain.add(IncludeFileResolver::new(dir.clone().into_std_path_buf()));
            }
        }
        Lookup::Memory(files) => chain.add(files),
    }
    chain.add(GoogleFileResolver::new());
    chain.add(BundledFilterResolver);

    let mut compiler = Compiler::with_file_resolver(chain);
    compiler.include_source_info(true);
    compiler
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_filter_proto_is_served_by_name() {
        let resolver = BundledFilterResolver;
        assert!(resolver.open_file(FILTER_PROTO_NAME).is_ok());
        assert!(resolver.open_file("other.proto").is_err());
    }

    #[test]
    fn memory_resolver_resolves_known_names_only() {
        let resolver = MemoryResolver::new([("a.proto".to_string(), "syntax = \"proto3\";".to_string())]);
        assert_eq!(resolver.resolve_path(Path::new("a.proto")), Some("a.proto".to_string()));
        assert_eq!(resolver.resolve_path(Path::new("b.proto")), None);
        assert!(resolver.open_file("b.proto").is_err());
    }
}

use crate::model::SchemaFile;
use crate::node::{Category, NodeKind, NodeMut};
use crate::policy::{ActiveTerms, evaluate};
use crate::validate::{ValidationError, join, validate_file};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PruneError {
    /// A node could not be validated while reading its policy.
    #[error("invalid {kind} `{path}`")]
    InvalidNode {
        kind: NodeKind,
        path: String,
        #[source]
        source: ValidationError,
    },

    /// An excluded child could not be detached from its parent.
    #[error("excluded {category} `{name}` not found under `{parent}`")]
    MissingChild {
        parent: String,
        category: Category,
        name: String,
    },

    /// The pruned file no longer passes structural validation.
    #[error("file `{file}` is invalid after pruning")]
    InvalidResult {
        file: String,
        #[source]
        source: ValidationError,
    },
}

/// Root of an excluded subtree, identified by its dotted full name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RemovedNode {
    pub kind: NodeKind,
    pub path: String,
}

/// Result of pruning one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file's own policy excluded it; nothing of it is emitted.
    Dropped,
    Kept { removed: Vec<RemovedNode> },
}

/// Depth-first pruning walk that records what it removes.
#[derive(Debug)]
pub struct Pruner<'t> {
    terms: &'t ActiveTerms,
    removed: Vec<RemovedNode>,
}

impl<'t> Pruner<'t> {
    pub fn new(terms: &'t ActiveTerms) -> Self {
        Self {
            terms,
            removed: Vec::new(),
        }
    }

    /// Prune `node`, whose parent has the dotted full name `scope`.
    ///
    /// Returns `true` when the caller must remove `node`; its children are
    /// not visited in that case. Otherwise excluded descendants have been
    /// removed in place.
    pub fn prune(&mut self, mut node: NodeMut<'_>, scope: &str) -> Result<bool, PruneError> {
        // Oneof choices and enum values live in the enclosing scope, not their own.
        let (path, child_scope) = match &node {
            NodeMut::File(f) => (f.name.clone(), f.package_name().to_string()),
            NodeMut::OneOf(_) | NodeMut::Enum(_) => (join(scope, node.name()), scope.to_string()),
            other => {
                let path = join(scope, other.name());
                (path.clone(), path)
            }
        };

        node.validate(&path)
            .map_err(|source| PruneError::InvalidNode {
                kind: node.kind(),
                path: path.clone(),
                source,
            })?;

        let verdict = evaluate(node.policy(), self.terms);
        if verdict.is_excluded() {
            tracing::debug!(kind = %node.kind(), path = %path, ?verdict, "excluding subtree");
            return Ok(true);
        }
        tracing::trace!(kind = %node.kind(), path = %path, ?verdict, "keeping node");

        let mut excluded = Vec::new();
        for child in node.children() {
            let kind = child.node.kind();
            let name = child.node.name().to_string();
            if self.prune(child.node, &child_scope)? {
                self.removed.push(RemovedNode {
                    kind,
                    path: join(&child_scope, &name),
                });
                excluded.push((child.category, name));
            }
        }

        detach(&mut node, &path, excluded)?;
        Ok(false)
    }

    /// Subtree roots removed so far, in visit order.
    pub fn removed(&self) -> &[RemovedNode] {
        &self.removed
    }

    pub fn into_removed(self) -> Vec<RemovedNode> {
        self.removed
    }
}

fn detach(
    node: &mut NodeMut<'_>,
    path: &str,
    excluded: Vec<(Category, String)>,
) -> Result<(), PruneError> {
    for (category, name) in excluded {
        if !node.remove_child(category, &name) {
            tracing::error!(parent = %path, %category, %name, "excluded child not found");
            return Err(PruneError::MissingChild {
                parent: path.to_string(),
                category,
                name,
            });
        }
    }
    Ok(())
}

/// Prune `node` against `terms`. `true` means the caller should remove it.
pub fn prune(node: NodeMut<'_>, terms: &ActiveTerms) -> Result<bool, PruneError> {
    Pruner::new(terms).prune(node, "")
}

/// Prune a whole file and re-validate what is left of it.
pub fn prune_file(file: &mut SchemaFile, terms: &ActiveTerms) -> Result<FileOutcome, PruneError> {
    let mut pruner = Pruner::new(terms);
    if pruner.prune(NodeMut::File(file), "")? {
        tracing::debug!(file = %file.name, "file excluded by its own policy");
        return Ok(FileOutcome::Dropped);
    }

    validate_file(file).map_err(|source| PruneError::InvalidResult {
        file: file.name.clone(),
        source,
    })?;

    Ok(FileOutcome::Kept {
        removed: pruner.into_removed(),
    })
}

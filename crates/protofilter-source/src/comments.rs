use prost_types::SourceCodeInfo;
use protofilter_domain::model::Comments;
use std::collections::HashMap;

// Field numbers used in source-info paths.
pub(crate) const FILE_MESSAGE: i32 = 4;
pub(crate) const FILE_ENUM: i32 = 5;
pub(crate) const FILE_SERVICE: i32 = 6;
pub(crate) const FILE_EXTENSION: i32 = 7;
pub(crate) const FILE_SYNTAX: i32 = 12;
pub(crate) const MESSAGE_FIELD: i32 = 2;
pub(crate) const MESSAGE_NESTED: i32 = 3;
pub(crate) const MESSAGE_ENUM: i32 = 4;
pub(crate) const MESSAGE_EXTENSION: i32 = 6;
pub(crate) const MESSAGE_ONEOF: i32 = 8;
pub(crate) const ENUM_VALUE: i32 = 2;
pub(crate) const SERVICE_METHOD: i32 = 2;

/// Comments of one file, keyed by source-info path.
#[derive(Debug, Default)]
pub(crate) struct CommentIndex(HashMap<Vec<i32>, Comments>);

impl CommentIndex {
    pub(crate) fn new(info: Option<&SourceCodeInfo>) -> Self {
        let mut map = HashMap::new();
        for location in info.map(|i| i.location.as_slice()).unwrap_or_default() {
            let comments = Comments {
                detached: location.leading_detached_comments.clone(),
                leading: location.leading_comments.clone(),
                trailing: location.trailing_comments.clone(),
            };
            if !comments.is_empty() {
                // The first location for a path is the declaration itself.
                map.entry(location.path.clone()).or_insert(comments);
            }
        }
        Self(map)
    }

    pub(crate) fn take(&mut self, path: &[i32]) -> Comments {
        self.0.remove(path).unwrap_or_default()
    }
}

/// `path` extended by one child step.
pub(crate) fn child_path(path: &[i32], field: i32, index: usize) -> Vec<i32> {
    let mut out = Vec::with_capacity(path.len() + 2);
    out.extend_from_slice(path);
    out.push(field);
    out.push(index as i32);
    out
}

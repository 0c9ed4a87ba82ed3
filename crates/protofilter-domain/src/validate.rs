//! Structural validation of schema nodes.
//!
//! Node-local checks run when the pruner visits a node. After pruning, the
//! whole file is checked again: removals can leave a oneof or enum empty, or
//! drop the zero value a proto3 enum must start with.

use crate::model::{Enum, Member, Message, OneOf, SchemaFile, Service, Syntax};
use crate::node::{Category, NodeKind};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{kind} in `{parent}` has an empty name")]
    EmptyName { kind: NodeKind, parent: String },

    #[error("`{parent}` declares {category} `{name}` more than once")]
    DuplicateName {
        parent: String,
        category: Category,
        name: String,
    },

    #[error("oneof `{path}` has no choices")]
    EmptyOneOf { path: String },

    #[error("enum `{path}` has no values")]
    EmptyEnum { path: String },

    #[error("first value of proto3 enum `{path}` must be 0, found `{name}` = {number}")]
    Proto3EnumMustStartAtZero {
        path: String,
        name: String,
        number: i32,
    },
}

/// Check the whole (pruned) file, depth-first.
pub fn validate_file(file: &SchemaFile) -> Result<(), ValidationError> {
    check_file(file)?;
    let scope = file.package_name();
    for message in &file.messages {
        validate_message(message, &join(scope, &message.name), file.syntax)?;
    }
    for en in &file.enums {
        validate_enum(en, &join(scope, &en.name), file.syntax)?;
    }
    for service in &file.services {
        let path = join(scope, &service.name);
        check_service(service, &path)?;
        for method in &service.methods {
            check_name(NodeKind::Method, &method.name, &join(&path, &method.name))?;
        }
    }
    for ext in &file.extensions {
        check_name(NodeKind::Field, &ext.name, &join(scope, &ext.name))?;
    }
    Ok(())
}

fn validate_message(message: &Message, path: &str, syntax: Syntax) -> Result<(), ValidationError> {
    check_message(message, path)?;
    for member in &message.members {
        match member {
            Member::Field(f) => check_name(NodeKind::Field, &f.name, &join(path, &f.name))?,
            Member::OneOf(o) => {
                let oneof_path = join(path, &o.name);
                check_oneof(o, &oneof_path)?;
                for choice in &o.choices {
                    check_name(NodeKind::Field, &choice.name, &join(&oneof_path, &choice.name))?;
                }
            }
        }
    }
    for nested in &message.messages {
        validate_message(nested, &join(path, &nested.name), syntax)?;
    }
    for en in &message.enums {
        validate_enum(en, &join(path, &en.name), syntax)?;
    }
    for ext in &message.extensions {
        check_name(NodeKind::Field, &ext.name, &join(path, &ext.name))?;
    }
    Ok(())
}

fn validate_enum(en: &Enum, path: &str, syntax: Syntax) -> Result<(), ValidationError> {
    check_enum(en, path)?;
    for value in &en.values {
        check_name(NodeKind::EnumValue, &value.name, &join(path, &value.name))?;
    }
    if syntax == Syntax::Proto3
        && let Some(first) = en.values.first()
        && first.number != 0
    {
        return Err(ValidationError::Proto3EnumMustStartAtZero {
            path: path.to_string(),
            name: first.name.clone(),
            number: first.number,
        });
    }
    Ok(())
}

pub(crate) fn check_name(kind: NodeKind, name: &str, path: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        let parent = path.rsplit_once('.').map(|(p, _)| p).unwrap_or("");
        return Err(ValidationError::EmptyName {
            kind,
            parent: parent.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn check_file(file: &SchemaFile) -> Result<(), ValidationError> {
    if file.name.is_empty() {
        return Err(ValidationError::EmptyName {
            kind: NodeKind::File,
            parent: String::new(),
        });
    }
    let parent = file.name.as_str();
    unique_names(parent, Category::Message, file.messages.iter().map(|m| m.name.as_str()))?;
    unique_names(parent, Category::Enum, file.enums.iter().map(|e| e.name.as_str()))?;
    unique_names(parent, Category::Service, file.services.iter().map(|s| s.name.as_str()))?;
    unique_names(parent, Category::Extension, file.extensions.iter().map(|x| x.name.as_str()))
}

pub(crate) fn check_message(message: &Message, path: &str) -> Result<(), ValidationError> {
    check_name(NodeKind::Message, &message.name, path)?;
    unique_names(path, Category::Field, message.fields().map(|f| f.name.as_str()))?;
    unique_names(path, Category::OneOf, message.oneofs().map(|o| o.name.as_str()))?;
    unique_names(path, Category::Message, message.messages.iter().map(|m| m.name.as_str()))?;
    unique_names(path, Category::Enum, message.enums.iter().map(|e| e.name.as_str()))?;
    unique_names(path, Category::Extension, message.extensions.iter().map(|x| x.name.as_str()))
}

pub(crate) fn check_oneof(oneof: &OneOf, path: &str) -> Result<(), ValidationError> {
    check_name(NodeKind::OneOf, &oneof.name, path)?;
    if oneof.choices.is_empty() {
        return Err(ValidationError::EmptyOneOf {
            path: path.to_string(),
        });
    }
    unique_names(path, Category::Choice, oneof.choices.iter().map(|f| f.name.as_str()))
}

pub(crate) fn check_enum(en: &Enum, path: &str) -> Result<(), ValidationError> {
    check_name(NodeKind::Enum, &en.name, path)?;
    if en.values.is_empty() {
        return Err(ValidationError::EmptyEnum {
            path: path.to_string(),
        });
    }
    unique_names(path, Category::Value, en.values.iter().map(|v| v.name.as_str()))
}

pub(crate) fn check_service(service: &Service, path: &str) -> Result<(), ValidationError> {
    check_name(NodeKind::Service, &service.name, path)?;
    unique_names(path, Category::Method, service.methods.iter().map(|m| m.name.as_str()))
}

fn unique_names<'a>(
    parent: &str,
    category: Category,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ValidationError::DuplicateName {
                parent: parent.to_string(),
                category,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Dotted full name of `name` inside `scope`.
pub(crate) fn join(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}.{name}")
    }
}

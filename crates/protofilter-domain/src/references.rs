//! Cross references left pointing at removed types.
//!
//! Pruning never rewrites references. A field typed by a removed message
//! still names it; these helpers find such leftovers so they can be reported.

use crate::model::{Enum, Field, Member, Message, SchemaFile};
use crate::validate::join;
use serde::Serialize;
use std::collections::BTreeSet;

/// A surviving element that names a type that no longer exists.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DanglingReference {
    pub file: String,
    /// Full name of the referring field or method.
    pub from: String,
    /// Full name of the removed type.
    pub target: String,
}

/// Full names of every message and enum declared in `file`, nested ones included.
pub fn declared_types(file: &SchemaFile) -> Vec<String> {
    let mut out = Vec::new();
    let scope = file.package_name();
    for message in &file.messages {
        collect_message(message, scope, &mut out);
    }
    for en in &file.enums {
        out.push(join(scope, &en.name));
    }
    out
}

fn collect_message(message: &Message, scope: &str, out: &mut Vec<String>) {
    let path = join(scope, &message.name);
    for nested in &message.messages {
        collect_message(nested, &path, out);
    }
    out.extend(message.enums.iter().map(|en: &Enum| join(&path, &en.name)));
    out.push(path);
}

/// Every reference in `files` whose target is in `removed_types`.
///
/// Results are sorted and free of duplicates.
pub fn find_dangling_references(
    files: &[SchemaFile],
    removed_types: &BTreeSet<String>,
) -> Vec<DanglingReference> {
    if removed_types.is_empty() {
        return Vec::new();
    }

    let mut found = BTreeSet::new();
    for file in files {
        let mut scan = Scan {
            file: &file.name,
            removed: removed_types,
            found: &mut found,
        };
        let scope = file.package_name();
        for message in &file.messages {
            scan.message(message, scope);
        }
        for ext in &file.extensions {
            scan.field(ext, scope);
        }
        for service in &file.services {
            let service_path = join(scope, &service.name);
            for method in &service.methods {
                let from = join(&service_path, &method.name);
                scan.check(&from, &method.input_type);
                scan.check(&from, &method.output_type);
            }
        }
    }
    found.into_iter().collect()
}

struct Scan<'a> {
    file: &'a str,
    removed: &'a BTreeSet<String>,
    found: &'a mut BTreeSet<DanglingReference>,
}

impl Scan<'_> {
    fn message(&mut self, message: &Message, scope: &str) {
        let path = join(scope, &message.name);
        for member in &message.members {
            match member {
                Member::Field(f) => self.field(f, &path),
                Member::OneOf(o) => {
                    for choice in &o.choices {
                        self.field(choice, &path);
                    }
                }
            }
        }
        for ext in &message.extensions {
            self.field(ext, &path);
        }
        for nested in &message.messages {
            self.message(nested, &path);
        }
    }

    fn field(&mut self, field: &Field, scope: &str) {
        let from = join(scope, &field.name);
        for target in field.ty.referenced_types() {
            self.check(&from, target);
        }
        if let Some(extendee) = &field.extendee {
            self.check(&from, extendee);
        }
    }

    fn check(&mut self, from: &str, target: &str) {
        let target = target.trim_start_matches('.');
        if self.removed.contains(target) {
            self.found.insert(DanglingReference {
                file: self.file.to_string(),
                from: from.to_string(),
                target: target.to_string(),
            });
        }
    }
}

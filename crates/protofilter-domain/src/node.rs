//! Uniform access to the eight node kinds of a schema tree.
//!
//! The set of node kinds is closed, so dispatch is a plain enum of mutable
//! handles rather than trait objects.

use crate::model::{Enum, EnumValue, Field, Member, Message, Method, OneOf, SchemaFile, Service};
use crate::policy::Policy;
use crate::validate::{self, ValidationError};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Message,
    Field,
    OneOf,
    Enum,
    EnumValue,
    Service,
    Method,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Message => "message",
            NodeKind::Field => "field",
            NodeKind::OneOf => "oneof",
            NodeKind::Enum => "enum",
            NodeKind::EnumValue => "enum value",
            NodeKind::Service => "service",
            NodeKind::Method => "method",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The child collection a node lives in, from its parent's point of view.
///
/// Names are unique per category, so `(category, name)` identifies exactly
/// one child of a given parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Message,
    Enum,
    Service,
    Extension,
    Field,
    OneOf,
    Choice,
    Value,
    Method,
}

impl Category {
    /// Category of a field declared directly in a file or message.
    pub fn of_field(field: &Field) -> Self {
        if field.is_extension() {
            Category::Extension
        } else {
            Category::Field
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Message => "message",
            Category::Enum => "enum",
            Category::Service => "service",
            Category::Extension => "extension",
            Category::Field => "field",
            Category::OneOf => "oneof",
            Category::Choice => "oneof choice",
            Category::Value => "enum value",
            Category::Method => "method",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable handle to any node of the tree.
#[derive(Debug)]
pub enum NodeMut<'a> {
    File(&'a mut SchemaFile),
    Message(&'a mut Message),
    Field(&'a mut Field),
    OneOf(&'a mut OneOf),
    Enum(&'a mut Enum),
    EnumValue(&'a mut EnumValue),
    Service(&'a mut Service),
    Method(&'a mut Method),
}

/// A child handle together with the category its parent stores it under.
#[derive(Debug)]
pub struct Child<'a> {
    pub category: Category,
    pub node: NodeMut<'a>,
}

impl<'a> Child<'a> {
    fn new(category: Category, node: NodeMut<'a>) -> Self {
        Self { category, node }
    }
}

impl NodeMut<'_> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeMut::File(_) => NodeKind::File,
            NodeMut::Message(_) => NodeKind::Message,
            NodeMut::Field(_) => NodeKind::Field,
            NodeMut::OneOf(_) => NodeKind::OneOf,
            NodeMut::Enum(_) => NodeKind::Enum,
            NodeMut::EnumValue(_) => NodeKind::EnumValue,
            NodeMut::Service(_) => NodeKind::Service,
            NodeMut::Method(_) => NodeKind::Method,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            NodeMut::File(n) => &n.name,
            NodeMut::Message(n) => &n.name,
            NodeMut::Field(n) => &n.name,
            NodeMut::OneOf(n) => &n.name,
            NodeMut::Enum(n) => &n.name,
            NodeMut::EnumValue(n) => &n.name,
            NodeMut::Service(n) => &n.name,
            NodeMut::Method(n) => &n.name,
        }
    }

    pub fn policy(&self) -> Option<&Policy> {
        match self {
            NodeMut::File(n) => n.policy.as_ref(),
            NodeMut::Message(n) => n.policy.as_ref(),
            NodeMut::Field(n) => n.policy.as_ref(),
            NodeMut::OneOf(n) => n.policy.as_ref(),
            NodeMut::Enum(n) => n.policy.as_ref(),
            NodeMut::EnumValue(n) => n.policy.as_ref(),
            NodeMut::Service(n) => n.policy.as_ref(),
            NodeMut::Method(n) => n.policy.as_ref(),
        }
    }

    /// Node-local structural checks on the node's current state.
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        match self {
            NodeMut::File(n) => validate::check_file(n),
            NodeMut::Message(n) => validate::check_message(n, path),
            NodeMut::Field(n) => validate::check_name(NodeKind::Field, &n.name, path),
            NodeMut::OneOf(n) => validate::check_oneof(n, path),
            NodeMut::Enum(n) => validate::check_enum(n, path),
            NodeMut::EnumValue(n) => validate::check_name(NodeKind::EnumValue, &n.name, path),
            NodeMut::Service(n) => validate::check_service(n, path),
            NodeMut::Method(n) => validate::check_name(NodeKind::Method, &n.name, path),
        }
    }

    /// Direct children in declaration order. Leaves have none.
    pub fn children(&mut self) -> Vec<Child<'_>> {
        match self {
            NodeMut::File(f) => {
                let mut out = Vec::with_capacity(
                    f.messages.len() + f.enums.len() + f.services.len() + f.extensions.len(),
                );
                out.extend(
                    f.messages
                        .iter_mut()
                        .map(|m| Child::new(Category::Message, NodeMut::Message(m))),
                );
                out.extend(
                    f.enums
                        .iter_mut()
                        .map(|e| Child::new(Category::Enum, NodeMut::Enum(e))),
                );
                out.extend(
                    f.services
                        .iter_mut()
                        .map(|s| Child::new(Category::Service, NodeMut::Service(s))),
                );
                out.extend(
                    f.extensions
                        .iter_mut()
                        .map(|x| Child::new(Category::Extension, NodeMut::Field(x))),
                );
                out
            }
            NodeMut::Message(m) => {
                let mut out = Vec::with_capacity(
                    m.members.len() + m.messages.len() + m.enums.len() + m.extensions.len(),
                );
                out.extend(m.members.iter_mut().map(|member| match member {
                    Member::Field(f) => Child::new(Category::of_field(f), NodeMut::Field(f)),
                    Member::OneOf(o) => Child::new(Category::OneOf, NodeMut::OneOf(o)),
                }));
                out.extend(
                    m.messages
                        .iter_mut()
                        .map(|n| Child::new(Category::Message, NodeMut::Message(n))),
                );
                out.extend(
                    m.enums
                        .iter_mut()
                        .map(|e| Child::new(Category::Enum, NodeMut::Enum(e))),
                );
                out.extend(
                    m.extensions
                        .iter_mut()
                        .map(|x| Child::new(Category::Extension, NodeMut::Field(x))),
                );
                out
            }
            NodeMut::OneOf(o) => o
                .choices
                .iter_mut()
                .map(|f| Child::new(Category::Choice, NodeMut::Field(f)))
                .collect(),
            NodeMut::Enum(e) => e
                .values
                .iter_mut()
                .map(|v| Child::new(Category::Value, NodeMut::EnumValue(v)))
                .collect(),
            NodeMut::Service(s) => s
                .methods
                .iter_mut()
                .map(|m| Child::new(Category::Method, NodeMut::Method(m)))
                .collect(),
            NodeMut::Field(_) | NodeMut::EnumValue(_) | NodeMut::Method(_) => Vec::new(),
        }
    }

    /// Remove the child named `name` from the collection for `category`.
    ///
    /// Returns `false` when this node has no such child; the node is left
    /// untouched in that case. Surviving siblings keep their relative order.
    pub fn remove_child(&mut self, category: Category, name: &str) -> bool {
        match (self, category) {
            (NodeMut::File(f), Category::Message) => remove_named(&mut f.messages, name, |m| &m.name),
            (NodeMut::File(f), Category::Enum) => remove_named(&mut f.enums, name, |e| &e.name),
            (NodeMut::File(f), Category::Service) => {
                remove_named(&mut f.services, name, |s| &s.name)
            }
            (NodeMut::File(f), Category::Extension) => {
                remove_named(&mut f.extensions, name, |x| &x.name)
            }
            (NodeMut::Message(m), Category::Field) => remove_member(&mut m.members, name, |member| {
                matches!(member, Member::Field(f) if !f.is_extension())
            }),
            (NodeMut::Message(m), Category::OneOf) => remove_member(&mut m.members, name, |member| {
                matches!(member, Member::OneOf(_))
            }),
            (NodeMut::Message(m), Category::Message) => {
                remove_named(&mut m.messages, name, |n| &n.name)
            }
            (NodeMut::Message(m), Category::Enum) => remove_named(&mut m.enums, name, |e| &e.name),
            (NodeMut::Message(m), Category::Extension) => {
                remove_named(&mut m.extensions, name, |x| &x.name)
            }
            (NodeMut::OneOf(o), Category::Choice) => remove_named(&mut o.choices, name, |f| &f.name),
            (NodeMut::Enum(e), Category::Value) => remove_named(&mut e.values, name, |v| &v.name),
            (NodeMut::Service(s), Category::Method) => {
                remove_named(&mut s.methods, name, |m| &m.name)
            }
            _ => false,
        }
    }
}

fn remove_named<T>(items: &mut Vec<T>, name: &str, name_of: impl Fn(&T) -> &String) -> bool {
    match items.iter().position(|item| name_of(item) == name) {
        Some(idx) => {
            items.remove(idx);
            true
        }
        None => false,
    }
}

fn remove_member(members: &mut Vec<Member>, name: &str, in_category: impl Fn(&Member) -> bool) -> bool {
    match members
        .iter()
        .position(|member| in_category(member) && member.name() == name)
    {
        Some(idx) => {
            members.remove(idx);
            true
        }
        None => false,
    }
}

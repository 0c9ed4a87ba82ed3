//! In-memory schema tree for one `.proto` source file.
//!
//! Every node owns its children. Besides the name, policy and children the
//! pruner works with, nodes carry what the printer needs to write the file
//! back out.

use crate::policy::Policy;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Syntax {
    Proto2,
    #[default]
    Proto3,
}

impl Syntax {
    pub fn as_str(self) -> &'static str {
        match self {
            Syntax::Proto2 => "proto2",
            Syntax::Proto3 => "proto3",
        }
    }
}

/// Comments attached to an element in the source file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Comments {
    /// Comment blocks separated from the element by a blank line.
    pub detached: Vec<String>,
    pub leading: Option<String>,
    pub trailing: Option<String>,
}

impl Comments {
    pub fn is_empty(&self) -> bool {
        self.detached.is_empty() && self.leading.is_none() && self.trailing.is_none()
    }
}

/// One `name = value` option entry, already rendered to proto text.
///
/// `name` is either a plain option (`deprecated`) or a parenthesized
/// extension (`(filter.message)`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionEntry {
    pub name: String,
    pub value: String,
}

impl OptionEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Inclusive number range, as written in `reserved` and `extensions` statements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumberRange {
    pub start: i32,
    pub end: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Import {
    pub path: String,
    pub public: bool,
    pub weak: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SchemaFile {
    /// Import name of the file, e.g. `acme/v1/orders.proto`.
    pub name: String,
    pub syntax: Syntax,
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub options: Vec<OptionEntry>,
    pub policy: Option<Policy>,
    /// Header comments (attached to the `syntax` statement).
    pub comments: Comments,
    pub messages: Vec<Message>,
    pub enums: Vec<Enum>,
    pub services: Vec<Service>,
    pub extensions: Vec<Field>,
}

impl SchemaFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Scope prefix for full names of top-level elements.
    pub fn package_name(&self) -> &str {
        self.package.as_deref().unwrap_or("")
    }
}

/// A field or a oneof, in declaration order within a message.
#[derive(Clone, Debug)]
pub enum Member {
    Field(Field),
    OneOf(OneOf),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Field(f) => &f.name,
            Member::OneOf(o) => &o.name,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Message {
    pub name: String,
    pub options: Vec<OptionEntry>,
    pub policy: Option<Policy>,
    pub comments: Comments,
    pub members: Vec<Member>,
    pub messages: Vec<Message>,
    pub enums: Vec<Enum>,
    pub extensions: Vec<Field>,
    pub reserved_ranges: Vec<NumberRange>,
    pub reserved_names: Vec<String>,
    pub extension_ranges: Vec<NumberRange>,
}

impl Message {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Plain (non-oneof) fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.members.iter().filter_map(|m| match m {
            Member::Field(f) => Some(f),
            Member::OneOf(_) => None,
        })
    }

    pub fn oneofs(&self) -> impl Iterator<Item = &OneOf> {
        self.members.iter().filter_map(|m| match m {
            Member::OneOf(o) => Some(o),
            Member::Field(_) => None,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldLabel {
    /// No label keyword (proto3 singular fields, oneof choices, maps).
    #[default]
    None,
    Optional,
    Required,
    Repeated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarType {
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarType::Double => "double",
            ScalarType::Float => "float",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Uint32 => "uint32",
            ScalarType::Uint64 => "uint64",
            ScalarType::Sint32 => "sint32",
            ScalarType::Sint64 => "sint64",
            ScalarType::Fixed32 => "fixed32",
            ScalarType::Fixed64 => "fixed64",
            ScalarType::Sfixed32 => "sfixed32",
            ScalarType::Sfixed64 => "sfixed64",
            ScalarType::Bool => "bool",
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarType),
    /// Message or enum reference, fully qualified with a leading dot.
    Named(String),
    Map {
        key: ScalarType,
        value: Box<FieldType>,
    },
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::Scalar(ScalarType::String)
    }
}

impl FieldType {
    /// Full names (without leading dot) of the message/enum types this type refers to.
    pub fn referenced_types(&self) -> Vec<&str> {
        match self {
            FieldType::Scalar(_) => Vec::new(),
            FieldType::Named(name) => vec![name.trim_start_matches('.')],
            FieldType::Map { value, .. } => value.referenced_types(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Field {
    pub name: String,
    pub number: i32,
    pub label: FieldLabel,
    pub ty: FieldType,
    /// Set for extension fields: the fully qualified extended message.
    pub extendee: Option<String>,
    pub default_value: Option<String>,
    /// Only set when it differs from the default camel-case JSON name.
    pub json_name: Option<String>,
    pub options: Vec<OptionEntry>,
    pub policy: Option<Policy>,
    pub comments: Comments,
}

impl Field {
    pub fn new(name: impl Into<String>, number: i32, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            number,
            ty,
            ..Self::default()
        }
    }

    pub fn is_extension(&self) -> bool {
        self.extendee.is_some()
    }
}

#[derive(Clone, Debug, Default)]
pub struct OneOf {
    pub name: String,
    pub options: Vec<OptionEntry>,
    pub policy: Option<Policy>,
    pub comments: Comments,
    pub choices: Vec<Field>,
}

impl OneOf {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Enum {
    pub name: String,
    pub options: Vec<OptionEntry>,
    pub policy: Option<Policy>,
    pub comments: Comments,
    pub values: Vec<EnumValue>,
    pub reserved_ranges: Vec<NumberRange>,
    pub reserved_names: Vec<String>,
}

impl Enum {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
    pub options: Vec<OptionEntry>,
    pub policy: Option<Policy>,
    pub comments: Comments,
}

impl EnumValue {
    pub fn new(name: impl Into<String>, number: i32) -> Self {
        Self {
            name: name.into(),
            number,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Service {
    pub name: String,
    pub options: Vec<OptionEntry>,
    pub policy: Option<Policy>,
    pub comments: Comments,
    pub methods: Vec<Method>,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Method {
    pub name: String,
    /// Fully qualified with a leading dot.
    pub input_type: String,
    pub output_type: String,
    pub client_streaming: bool,
    pub server_streaming: bool,
    pub options: Vec<OptionEntry>,
    pub policy: Option<Policy>,
    pub comments: Comments,
}

impl Method {
    pub fn new(
        name: impl Into<String>,
        input_type: impl Into<String>,
        output_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input_type: input_type.into(),
            output_type: output_type.into(),
            ..Self::default()
        }
    }
}

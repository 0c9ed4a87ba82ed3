//! Descriptor pool to domain tree.

use crate::comments::{
    CommentIndex, ENUM_VALUE, FILE_ENUM, FILE_EXTENSION, FILE_MESSAGE, FILE_SERVICE, FILE_SYNTAX,
    MESSAGE_ENUM, MESSAGE_EXTENSION, MESSAGE_FIELD, MESSAGE_NESTED, MESSAGE_ONEOF, SERVICE_METHOD,
    child_path,
};
use crate::options::{PolicyExtensions, Target, quote, render_options};
use anyhow::{Context, anyhow, bail};
use prost_reflect::{
    DescriptorPool, DynamicMessage, EnumDescriptor, ExtensionDescriptor, FileDescriptor, Kind,
    MessageDescriptor, ServiceDescriptor,
};
use prost_types::FieldDescriptorProto;
use prost_types::field_descriptor_proto::{Label, Type};
use protofilter_domain::model::{
    Enum, EnumValue, Field, FieldLabel, FieldType, Import, Member, Message, Method, NumberRange,
    OneOf, ScalarType, SchemaFile, Service, Syntax,
};
use std::collections::HashMap;

/// Build the domain tree for one compiled file.
pub(crate) fn convert_file(
    pool: &DescriptorPool,
    file: &FileDescriptor,
    extensions: &PolicyExtensions,
) -> anyhow::Result<SchemaFile> {
    let proto = file.file_descriptor_proto();
    let syntax = match proto.syntax() {
        "" | "proto2" => Syntax::Proto2,
        "proto3" => Syntax::Proto3,
        other => bail!("unsupported syntax `{other}`"),
    };

    let mut cx = Converter {
        pool,
        extensions,
        comments: CommentIndex::new(proto.source_code_info.as_ref()),
        syntax,
    };

    let mut out = SchemaFile::new(file.name());
    out.syntax = syntax;
    out.package = Some(file.package_name().to_string()).filter(|p| !p.is_empty());
    out.imports = proto
        .dependency
        .iter()
        .enumerate()
        .map(|(idx, path)| {
            let idx = idx as i32;
            Import {
                path: path.clone(),
                public: proto.public_dependency.contains(&idx),
                weak: proto.weak_dependency.contains(&idx),
            }
        })
        .collect();

    let options = file.options();
    out.options = render_options(&options);
    out.policy = cx.policy(Target::File, &options, file.name())?;
    out.comments = cx.comments.take(&[FILE_SYNTAX]);

    for (idx, message) in file.messages().enumerate() {
        let path = child_path(&[], FILE_MESSAGE, idx);
        out.messages.push(cx.message(&message, &path)?);
    }
    for (idx, en) in file.enums().enumerate() {
        let path = child_path(&[], FILE_ENUM, idx);
        out.enums.push(cx.enumeration(&en, &path)?);
    }
    for (idx, service) in file.services().enumerate() {
        let path = child_path(&[], FILE_SERVICE, idx);
        out.services.push(cx.service(&service, &path)?);
    }
    for (idx, ext) in file.extensions().enumerate() {
        let path = child_path(&[], FILE_EXTENSION, idx);
        out.extensions.push(cx.extension(&ext, &path)?);
    }

    Ok(out)
}

struct Converter<'a> {
    pool: &'a DescriptorPool,
    extensions: &'a PolicyExtensions,
    comments: CommentIndex,
    syntax: Syntax,
}

impl Converter<'_> {
    fn policy(
        &self,
        target: Target,
        options: &DynamicMessage,
        element: &str,
    ) -> anyhow::Result<Option<protofilter_domain::Policy>> {
        self.extensions
            .decode(target, options)
            .with_context(|| format!("read policy of `{element}`"))
    }

    fn message(&mut self, desc: &MessageDescriptor, path: &[i32]) -> anyhow::Result<Message> {
        let proto = desc.descriptor_proto();
        let mut msg = Message::new(desc.name());
        let options = desc.options();
        msg.options = render_options(&options);
        msg.policy = self.policy(Target::Message, &options, desc.full_name())?;
        msg.comments = self.comments.take(path);

        let oneofs: Vec<_> = desc.oneofs().collect();
        // Oneof index -> position in `members`.
        let mut placed: HashMap<usize, usize> = HashMap::new();

        for (idx, field_proto) in proto.field.iter().enumerate() {
            let field_desc = desc
                .get_field_by_name(field_proto.name())
                .ok_or_else(|| anyhow!("`{}` has no field `{}`", desc.full_name(), field_proto.name()))?;
            let field_path = child_path(path, MESSAGE_FIELD, idx);
            let full_name = field_desc.full_name().to_string();
            let field = self.field(field_proto, &field_desc.options(), &field_path, &full_name)?;

            let oneof_index = field_proto
                .oneof_index
                .filter(|_| !field_proto.proto3_optional())
                .map(|i| i as usize);
            let Some(oneof_index) = oneof_index else {
                msg.members.push(Member::Field(field));
                continue;
            };

            if let Some(&pos) = placed.get(&oneof_index) {
                if let Some(Member::OneOf(oneof)) = msg.members.get_mut(pos) {
                    oneof.choices.push(field);
                }
                continue;
            }

            let oneof_desc = oneofs.get(oneof_index).ok_or_else(|| {
                anyhow!("`{full_name}` refers to missing oneof #{oneof_index}")
            })?;
            let mut oneof = OneOf::new(oneof_desc.name());
            let oneof_options = oneof_desc.options();
            oneof.options = render_options(&oneof_options);
            oneof.policy = self.policy(Target::OneOf, &oneof_options, oneof_desc.full_name())?;
            oneof.comments = self.comments.take(&child_path(path, MESSAGE_ONEOF, oneof_index));
            oneof.choices.push(field);

            placed.insert(oneof_index, msg.members.len());
            msg.members.push(Member::OneOf(oneof));
        }

        for (idx, nested) in desc.child_messages().enumerate() {
            if nested.is_map_entry() {
                continue;
            }
            let nested_path = child_path(path, MESSAGE_NESTED, idx);
            msg.messages.push(self.message(&nested, &nested_path)?);
        }
        for (idx, en) in desc.child_enums().enumerate() {
            let enum_path = child_path(path, MESSAGE_ENUM, idx);
            msg.enums.push(self.enumeration(&en, &enum_path)?);
        }
        for (idx, ext) in desc.child_extensions().enumerate() {
            let ext_path = child_path(path, MESSAGE_EXTENSION, idx);
            msg.extensions.push(self.extension(&ext, &ext_path)?);
        }

        // Descriptor ranges are end-exclusive.
        msg.reserved_ranges = proto
            .reserved_range
            .iter()
            .map(|r| NumberRange {
                start: r.start(),
                end: r.end() - 1,
            })
            .collect();
        msg.reserved_names = proto.reserved_name.clone();
        msg.extension_ranges = proto
            .extension_range
            .iter()
            .map(|r| NumberRange {
                start: r.start(),
                end: r.end() - 1,
            })
            .collect();

        Ok(msg)
    }

    fn field(
        &mut self,
        proto: &FieldDescriptorProto,
        options: &DynamicMessage,
        path: &[i32],
        full_name: &str,
    ) -> anyhow::Result<Field> {
        let ty = self
            .field_type(proto)
            .with_context(|| format!("field `{full_name}`"))?;

        let in_oneof = proto.oneof_index.is_some() && !proto.proto3_optional();
        let label = match proto.label() {
            Label::Repeated if matches!(ty, FieldType::Map { .. }) => FieldLabel::None,
            Label::Repeated => FieldLabel::Repeated,
            Label::Required => FieldLabel::Required,
            Label::Optional if proto.proto3_optional() => FieldLabel::Optional,
            Label::Optional if self.syntax == Syntax::Proto2 && !in_oneof => FieldLabel::Optional,
            Label::Optional => FieldLabel::None,
        };

        let default_value = proto.default_value.as_ref().map(|value| match proto.r#type() {
            Type::String => quote(value.as_bytes()),
            // Already C-escaped in the descriptor.
            Type::Bytes => format!("\"{value}\""),
            _ => value.clone(),
        });

        let extendee = proto.extendee.clone().filter(|e| !e.is_empty());
        let json_name = proto
            .json_name
            .clone()
            .filter(|_| extendee.is_none())
            .filter(|json| *json != default_json_name(proto.name()));

        Ok(Field {
            name: proto.name().to_string(),
            number: proto.number(),
            label,
            ty,
            extendee,
            default_value,
            json_name,
            options: render_options(options),
            policy: self.policy(Target::Field, options, full_name)?,
            comments: self.comments.take(path),
        })
    }

    fn field_type(&self, proto: &FieldDescriptorProto) -> anyhow::Result<FieldType> {
        let scalar = match proto.r#type() {
            Type::Double => ScalarType::Double,
            Type::Float => ScalarType::Float,
            Type::Int64 => ScalarType::Int64,
            Type::Uint64 => ScalarType::Uint64,
            Type::Int32 => ScalarType::Int32,
            Type::Fixed64 => ScalarType::Fixed64,
            Type::Fixed32 => ScalarType::Fixed32,
            Type::Bool => ScalarType::Bool,
            Type::String => ScalarType::String,
            Type::Bytes => ScalarType::Bytes,
            Type::Uint32 => ScalarType::Uint32,
            Type::Sfixed32 => ScalarType::Sfixed32,
            Type::Sfixed64 => ScalarType::Sfixed64,
            Type::Sint32 => ScalarType::Sint32,
            Type::Sint64 => ScalarType::Sint64,
            Type::Group => bail!("proto2 groups are not supported"),
            Type::Enum => return Ok(FieldType::Named(proto.type_name().to_string())),
            Type::Message => return self.message_type(proto),
        };
        Ok(FieldType::Scalar(scalar))
    }

    fn message_type(&self, proto: &FieldDescriptorProto) -> anyhow::Result<FieldType> {
        let type_name = proto.type_name();
        let entry = self
            .pool
            .get_message_by_name(type_name.trim_start_matches('.'))
            .filter(|m| m.is_map_entry() && proto.label() == Label::Repeated);
        let Some(entry) = entry else {
            return Ok(FieldType::Named(type_name.to_string()));
        };

        let FieldType::Scalar(key) = kind_type(&entry.map_entry_key_field().kind()) else {
            bail!("map key of `{type_name}` is not a scalar");
        };
        Ok(FieldType::Map {
            key,
            value: Box::new(kind_type(&entry.map_entry_value_field().kind())),
        })
    }

    fn extension(&mut self, desc: &ExtensionDescriptor, path: &[i32]) -> anyhow::Result<Field> {
        self.field(desc.field_descriptor_proto(), &desc.options(), path, desc.full_name())
    }

    fn enumeration(&mut self, desc: &EnumDescriptor, path: &[i32]) -> anyhow::Result<Enum> {
        let proto = desc.enum_descriptor_proto();
        let mut en = Enum::new(desc.name());
        let options = desc.options();
        en.options = render_options(&options);
        en.policy = self.policy(Target::Enum, &options, desc.full_name())?;
        en.comments = self.comments.take(path);

        // The descriptor lists values by number; keep the declaration order.
        for (idx, value_proto) in proto.value.iter().enumerate() {
            let value = desc
                .get_value_by_name(value_proto.name())
                .ok_or_else(|| anyhow!("`{}` has no value `{}`", desc.full_name(), value_proto.name()))?;
            let value_options = value.options();
            let mut out = EnumValue::new(value.name(), value.number());
            out.options = render_options(&value_options);
            out.policy = self.policy(Target::EnumValue, &value_options, value.full_name())?;
            out.comments = self.comments.take(&child_path(path, ENUM_VALUE, idx));
            en.values.push(out);
        }

        // Enum reserved ranges are end-inclusive.
        en.reserved_ranges = proto
            .reserved_range
            .iter()
            .map(|r| NumberRange {
                start: r.start(),
                end: r.end(),
            })
            .collect();
        en.reserved_names = proto.reserved_name.clone();
        Ok(en)
    }

    fn service(&mut self, desc: &ServiceDescriptor, path: &[i32]) -> anyhow::Result<Service> {
        let mut svc = Service::new(desc.name());
        let options = desc.options();
        svc.options = render_options(&options);
        svc.policy = self.policy(Target::Service, &options, desc.full_name())?;
        svc.comments = self.comments.take(path);

        for (idx, method) in desc.methods().enumerate() {
            let method_options = method.options();
            let mut out = Method::new(
                method.name(),
                format!(".{}", method.input().full_name()),
                format!(".{}", method.output().full_name()),
            );
            out.client_streaming = method.is_client_streaming();
            out.server_streaming = method.is_server_streaming();
            out.options = render_options(&method_options);
            out.policy = self.policy(Target::Method, &method_options, method.full_name())?;
            out.comments = self.comments.take(&child_path(path, SERVICE_METHOD, idx));
            svc.methods.push(out);
        }
        Ok(svc)
    }
}

fn kind_type(kind: &Kind) -> FieldType {
    let scalar = match kind {
        Kind::Double => ScalarType::Double,
        Kind::Float => ScalarType::Float,
        Kind::Int32 => ScalarType::Int32,
        Kind::Int64 => ScalarType::Int64,
        Kind::Uint32 => ScalarType::Uint32,
        Kind::Uint64 => ScalarType::Uint64,
        Kind::Sint32 => ScalarType::Sint32,
        Kind::Sint64 => ScalarType::Sint64,
        Kind::Fixed32 => ScalarType::Fixed32,
        Kind::Fixed64 => ScalarType::Fixed64,
        Kind::Sfixed32 => ScalarType::Sfixed32,
        Kind::Sfixed64 => ScalarType::Sfixed64,
        Kind::Bool => ScalarType::Bool,
        Kind::String => ScalarType::String,
        Kind::Bytes => ScalarType::Bytes,
        Kind::Message(m) => return FieldType::Named(format!(".{}", m.full_name())),
        Kind::Enum(e) => return FieldType::Named(format!(".{}", e.full_name())),
    };
    FieldType::Scalar(scalar)
}

/// JSON name protoc derives when none is given: `foo_bar` -> `fooBar`.
fn default_json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

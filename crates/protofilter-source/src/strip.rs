use crate::options::is_policy_option;
use crate::resolver::FILTER_PROTO_NAME;
use protofilter_domain::model::{Enum, Field, Member, Message, OptionEntry, SchemaFile};

/// Remove the policy annotations from a tree: every `(filter.*)` option
/// entry, and the import of `filter.proto`.
///
/// Decoded policies stay on the nodes; only the printed form changes.
pub fn strip_policy_options(file: &mut SchemaFile) {
    file.imports.retain(|import| import.path != FILTER_PROTO_NAME);
    strip(&mut file.options);
    for message in &mut file.messages {
        strip_message(message);
    }
    for en in &mut file.enums {
        strip_enum(en);
    }
    for service in &mut file.services {
        strip(&mut service.options);
        for method in &mut service.methods {
            strip(&mut method.options);
        }
    }
    for ext in &mut file.extensions {
        strip_field(ext);
    }
}

fn strip_message(message: &mut Message) {
    strip(&mut message.options);
    for member in &mut message.members {
        match member {
            Member::Field(field) => strip_field(field),
            Member::OneOf(oneof) => {
                strip(&mut oneof.options);
                oneof.choices.iter_mut().for_each(strip_field);
            }
        }
    }
    message.messages.iter_mut().for_each(strip_message);
    message.enums.iter_mut().for_each(strip_enum);
    message.extensions.iter_mut().for_each(strip_field);
}

fn strip_enum(en: &mut Enum) {
    strip(&mut en.options);
    for value in &mut en.values {
        strip(&mut value.options);
    }
}

fn strip_field(field: &mut Field) {
    strip(&mut field.options);
}

fn strip(options: &mut Vec<OptionEntry>) {
    options.retain(|entry| !is_policy_option(&entry.name));
}

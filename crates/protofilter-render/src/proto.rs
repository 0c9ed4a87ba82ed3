use crate::printer::Printer;
use protofilter_domain::model::{
    Enum, Field, FieldLabel, FieldType, Member, Message, Method, NumberRange, OneOf, OptionEntry,
    SchemaFile, Service,
};

/// Highest field number; printed as `max` in ranges.
const FIELD_NUMBER_MAX: i32 = 536_870_911;

/// Print a schema file as `.proto` source.
///
/// Layout is fixed: header comments, `syntax`, `package`, imports, file
/// options, then messages, enums, services and `extend` blocks (one per
/// extendee, in first-seen order). Type references are printed fully
/// qualified, so the output does not depend on the package scope.
pub fn render_file(file: &SchemaFile) -> String {
    let mut p = Printer::default();

    p.statement(&format!("syntax = \"{}\";", file.syntax.as_str()), &file.comments);

    if let Some(package) = &file.package {
        p.blank();
        p.line(&format!("package {package};"));
    }

    if !file.imports.is_empty() {
        p.blank();
        for import in &file.imports {
            let modifier = if import.public {
                "public "
            } else if import.weak {
                "weak "
            } else {
                ""
            };
            p.line(&format!("import {modifier}{};", quote(&import.path)));
        }
    }

    if !file.options.is_empty() {
        p.blank();
        option_statements(&mut p, &file.options);
    }

    for message in &file.messages {
        p.blank();
        message_block(&mut p, message);
    }
    for en in &file.enums {
        p.blank();
        enum_block(&mut p, en);
    }
    for service in &file.services {
        p.blank();
        service_block(&mut p, service);
    }
    extend_blocks(&mut p, &file.extensions);

    p.finish()
}

fn message_block(p: &mut Printer, message: &Message) {
    p.open(&format!("message {}", message.name), &message.comments);
    option_statements(p, &message.options);

    for member in &message.members {
        match member {
            Member::Field(field) => field_statement(p, field),
            Member::OneOf(oneof) => oneof_block(p, oneof),
        }
    }

    if !message.reserved_ranges.is_empty() {
        p.line(&format!(
            "reserved {};",
            ranges(&message.reserved_ranges, FIELD_NUMBER_MAX)
        ));
    }
    if !message.reserved_names.is_empty() {
        p.line(&format!("reserved {};", names(&message.reserved_names)));
    }
    if !message.extension_ranges.is_empty() {
        p.line(&format!(
            "extensions {};",
            ranges(&message.extension_ranges, FIELD_NUMBER_MAX)
        ));
    }

    for nested in &message.messages {
        p.blank();
        message_block(p, nested);
    }
    for en in &message.enums {
        p.blank();
        enum_block(p, en);
    }
    extend_blocks(p, &message.extensions);

    p.close();
}

fn oneof_block(p: &mut Printer, oneof: &OneOf) {
    p.open(&format!("oneof {}", oneof.name), &oneof.comments);
    option_statements(p, &oneof.options);
    for choice in &oneof.choices {
        field_statement(p, choice);
    }
    p.close();
}

fn field_statement(p: &mut Printer, field: &Field) {
    let label = match field.label {
        FieldLabel::None => "",
        FieldLabel::Optional => "optional ",
        FieldLabel::Required => "required ",
        FieldLabel::Repeated => "repeated ",
    };

    let mut bracketed = Vec::new();
    if let Some(default) = &field.default_value {
        bracketed.push(format!("default = {default}"));
    }
    if let Some(json_name) = &field.json_name {
        bracketed.push(format!("json_name = {}", quote(json_name)));
    }
    bracketed.extend(field.options.iter().map(option_text));

    let mut text = format!(
        "{label}{} {} = {}",
        type_name(&field.ty),
        field.name,
        field.number
    );
    if !bracketed.is_empty() {
        text.push_str(&format!(" [{}]", bracketed.join(", ")));
    }
    text.push(';');
    p.statement(&text, &field.comments);
}

fn type_name(ty: &FieldType) -> String {
    match ty {
        FieldType::Scalar(scalar) => scalar.as_str().to_string(),
        FieldType::Named(name) => name.clone(),
        FieldType::Map { key, value } => format!("map<{}, {}>", key.as_str(), type_name(value)),
    }
}

fn enum_block(p: &mut Printer, en: &Enum) {
    p.open(&format!("enum {}", en.name), &en.comments);
    option_statements(p, &en.options);
    for value in &en.values {
        let mut text = format!("{} = {}", value.name, value.number);
        if !value.options.is_empty() {
            let opts: Vec<String> = value.options.iter().map(option_text).collect();
            text.push_str(&format!(" [{}]", opts.join(", ")));
        }
        text.push(';');
        p.statement(&text, &value.comments);
    }
    if !en.reserved_ranges.is_empty() {
        p.line(&format!("reserved {};", ranges(&en.reserved_ranges, i32::MAX)));
    }
    if !en.reserved_names.is_empty() {
        p.line(&format!("reserved {};", names(&en.reserved_names)));
    }
    p.close();
}

fn service_block(p: &mut Printer, service: &Service) {
    p.open(&format!("service {}", service.name), &service.comments);
    option_statements(p, &service.options);
    for method in &service.methods {
        method_statement(p, method);
    }
    p.close();
}

fn method_statement(p: &mut Printer, method: &Method) {
    let stream = |on: bool| if on { "stream " } else { "" };
    let signature = format!(
        "rpc {}({}{}) returns ({}{})",
        method.name,
        stream(method.client_streaming),
        method.input_type,
        stream(method.server_streaming),
        method.output_type
    );

    if method.options.is_empty() {
        p.statement(&format!("{signature};"), &method.comments);
    } else {
        p.open(&signature, &method.comments);
        option_statements(p, &method.options);
        p.close();
    }
}

/// One `extend` block per extendee, keeping the first-seen order of
/// extendees and the declaration order of fields within each.
fn extend_blocks(p: &mut Printer, extensions: &[Field]) {
    let mut groups: Vec<(&str, Vec<&Field>)> = Vec::new();
    for ext in extensions {
        let extendee = ext.extendee.as_deref().unwrap_or_default();
        match groups.iter_mut().find(|(name, _)| *name == extendee) {
            Some((_, fields)) => fields.push(ext),
            None => groups.push((extendee, vec![ext])),
        }
    }

    for (extendee, fields) in groups {
        p.blank();
        p.open(&format!("extend {extendee}"), &Default::default());
        for field in fields {
            field_statement(p, field);
        }
        p.close();
    }
}

fn option_statements(p: &mut Printer, options: &[OptionEntry]) {
    for entry in options {
        p.line(&format!("option {};", option_text(entry)));
    }
}

fn option_text(entry: &OptionEntry) -> String {
    format!("{} = {}", entry.name, entry.value)
}

fn ranges(ranges: &[NumberRange], max: i32) -> String {
    ranges
        .iter()
        .map(|r| {
            if r.start == r.end {
                r.start.to_string()
            } else if r.end == max {
                format!("{} to max", r.start)
            } else {
                format!("{} to {}", r.start, r.end)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn names(names: &[String]) -> String {
    names.iter().map(|n| quote(n)).collect::<Vec<_>>().join(", ")
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

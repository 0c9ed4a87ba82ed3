//! Options of a descriptor: policy decoding and rendering back to proto text.

use anyhow::{Context, bail};
use prost_reflect::{
    DescriptorPool, DynamicMessage, ExtensionDescriptor, Kind, MapKey, ReflectMessage, Value,
};
use protofilter_domain::model::OptionEntry;
use protofilter_domain::Policy;

/// Package of the bundled policy definitions; option names under it are policy options.
pub const POLICY_PACKAGE: &str = "filter";

/// The node kinds a policy extension can be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Target {
    File,
    Message,
    Field,
    OneOf,
    Enum,
    EnumValue,
    Service,
    Method,
}

impl Target {
    fn extension_name(self) -> &'static str {
        match self {
            Target::File => "filter.file",
            Target::Message => "filter.message",
            Target::Field => "filter.field",
            Target::OneOf => "filter.oneof",
            Target::Enum => "filter.enum",
            Target::EnumValue => "filter.enum_value",
            Target::Service => "filter.service",
            Target::Method => "filter.method",
        }
    }
}

/// The policy extensions known to one descriptor pool.
///
/// An extension the pool does not define simply yields no policies; that is
/// the case when no compiled file imports `filter.proto`.
#[derive(Debug, Default)]
pub(crate) struct PolicyExtensions {
    file: Option<ExtensionDescriptor>,
    message: Option<ExtensionDescriptor>,
    field: Option<ExtensionDescriptor>,
    oneof: Option<ExtensionDescriptor>,
    enum_: Option<ExtensionDescriptor>,
    enum_value: Option<ExtensionDescriptor>,
    service: Option<ExtensionDescriptor>,
    method: Option<ExtensionDescriptor>,
}

impl PolicyExtensions {
    pub(crate) fn from_pool(pool: &DescriptorPool) -> Self {
        let get = |target: Target| pool.get_extension_by_name(target.extension_name());
        Self {
            file: get(Target::File),
            message: get(Target::Message),
            field: get(Target::Field),
            oneof: get(Target::OneOf),
            enum_: get(Target::Enum),
            enum_value: get(Target::EnumValue),
            service: get(Target::Service),
            method: get(Target::Method),
        }
    }

    fn get(&self, target: Target) -> Option<&ExtensionDescriptor> {
        match target {
            Target::File => self.file.as_ref(),
            Target::Message => self.message.as_ref(),
            Target::Field => self.field.as_ref(),
            Target::OneOf => self.oneof.as_ref(),
            Target::Enum => self.enum_.as_ref(),
            Target::EnumValue => self.enum_value.as_ref(),
            Target::Service => self.service.as_ref(),
            Target::Method => self.method.as_ref(),
        }
    }

    /// Decode the policy attached to `options`, if any.
    pub(crate) fn decode(
        &self,
        target: Target,
        options: &DynamicMessage,
    ) -> anyhow::Result<Option<Policy>> {
        let Some(ext) = self.get(target) else {
            return Ok(None);
        };
        if ext.containing_message().full_name() != options.descriptor().full_name() {
            bail!(
                "`{}` extends {}, expected {}",
                ext.full_name(),
                ext.containing_message().full_name(),
                options.descriptor().full_name()
            );
        }
        if !options.has_extension(ext) {
            return Ok(None);
        }

        let value = options.get_extension(ext);
        let Some(filter) = value.as_message() else {
            bail!("`{}` is not a ValueFilter message", ext.full_name());
        };
        Ok(Some(Policy {
            include: string_list(filter, "include")
                .with_context(|| format!("decode `{}`", ext.full_name()))?,
            exclude: string_list(filter, "exclude")
                .with_context(|| format!("decode `{}`", ext.full_name()))?,
        }))
    }
}

fn string_list(message: &DynamicMessage, field: &str) -> anyhow::Result<Vec<String>> {
    let Some(value) = message.get_field_by_name(field) else {
        bail!("`{}` has no `{field}` field", message.descriptor().full_name());
    };
    let Some(items) = value.as_list() else {
        bail!("`{field}` is not a repeated field");
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .with_context(|| format!("`{field}` holds a non-string value"))
        })
        .collect()
}

/// Render every set option as `name = value` entries, one per list element.
///
/// Plain options keep their field name; extensions are written as
/// `(full.name)`. `map_entry` is dropped since map fields are printed as
/// `map<K, V>`.
pub(crate) fn render_options(options: &DynamicMessage) -> Vec<OptionEntry> {
    let mut out = Vec::new();
    for (field, value) in options.fields() {
        if field.name() == "map_entry" || field.name() == "uninterpreted_option" {
            continue;
        }
        push_entries(&mut out, field.name().to_string(), &field.kind(), value);
    }
    for (ext, value) in options.extensions() {
        push_entries(&mut out, format!("({})", ext.full_name()), &ext.kind(), value);
    }
    out
}

fn push_entries(out: &mut Vec<OptionEntry>, name: String, kind: &Kind, value: &Value) {
    match value {
        Value::List(items) => {
            for item in items {
                out.push(OptionEntry::new(name.clone(), render_value(kind, item)));
            }
        }
        Value::Map(entries) => {
            let mut rendered: Vec<String> = entries
                .iter()
                .map(|(key, value)| {
                    format!(
                        "{{ key: {} value: {} }}",
                        render_key(key),
                        render_value(&map_value_kind(kind), value)
                    )
                })
                .collect();
            rendered.sort();
            for entry in rendered {
                out.push(OptionEntry::new(name.clone(), entry));
            }
        }
        single => out.push(OptionEntry::new(name, render_value(kind, single))),
    }
}

fn map_value_kind(kind: &Kind) -> Kind {
    match kind {
        Kind::Message(entry) => entry.map_entry_value_field().kind(),
        other => other.clone(),
    }
}

fn render_key(key: &MapKey) -> String {
    match key {
        MapKey::Bool(v) => v.to_string(),
        MapKey::I32(v) => v.to_string(),
        MapKey::I64(v) => v.to_string(),
        MapKey::U32(v) => v.to_string(),
        MapKey::U64(v) => v.to_string(),
        MapKey::String(v) => quote(v.as_bytes()),
    }
}

/// Proto text for one option value.
pub(crate) fn render_value(kind: &Kind, value: &Value) -> String {
    match value {
        Value::Bool(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::F32(v) if v.is_finite() => format!("{v:?}"),
        Value::F32(v) => render_float(f64::from(*v)),
        Value::F64(v) => render_float(*v),
        Value::String(v) => quote(v.as_bytes()),
        Value::Bytes(v) => quote(v),
        Value::EnumNumber(number) => kind
            .as_enum()
            .and_then(|en| en.get_value(*number))
            .map(|value| value.name().to_string())
            .unwrap_or_else(|| number.to_string()),
        Value::Message(message) => {
            let text = message.to_text_format();
            if text.is_empty() {
                "{}".to_string()
            } else {
                format!("{{ {text} }}")
            }
        }
        Value::List(items) => {
            let rendered: Vec<String> = items.iter().map(|item| render_value(kind, item)).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Map(_) => "{}".to_string(),
    }
}

fn render_float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{v:?}")
    }
}

/// Double-quoted, C-escaped string literal.
pub fn quote(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');
    out.push_str(&escape(bytes));
    out.push('"');
    out
}

fn escape(bytes: &[u8]) -> String {
    // Valid UTF-8 is kept as is apart from the usual escapes.
    if let Ok(text) = std::str::from_utf8(bytes) {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if (c as u32) < 0x20 || c == '\u{7f}' => out.push_str(&format!("\\{:03o}", c as u32)),
                c => out.push(c),
            }
        }
        return out;
    }

    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\{b:03o}")),
        }
    }
    out
}

/// Is `name` (as rendered by [`render_options`]) one of the policy options?
pub fn is_policy_option(name: &str) -> bool {
    name.strip_prefix('(')
        .and_then(|rest| rest.strip_prefix(POLICY_PACKAGE))
        .is_some_and(|rest| rest.starts_with('.'))
}

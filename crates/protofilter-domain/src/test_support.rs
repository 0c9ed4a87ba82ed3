//! Small tree builders shared by the unit tests.

use crate::model::{Enum, EnumValue, Field, FieldType, Member, Message, Method, SchemaFile, ScalarType, Service};

pub fn field(name: &str, number: i32) -> Field {
    Field::new(name, number, FieldType::Scalar(ScalarType::String))
}

/// A proto3 file in package `pkg`.
pub fn file(name: &str, messages: Vec<Message>) -> SchemaFile {
    let mut f = SchemaFile::new(name);
    f.package = Some("pkg".to_string());
    f.messages = messages;
    f
}

pub fn message_with_fields(name: &str, fields: &[&str]) -> Message {
    let mut msg = Message::new(name);
    for (idx, field_name) in fields.iter().enumerate() {
        msg.members
            .push(Member::Field(field(field_name, idx as i32 + 1)));
    }
    msg
}

pub fn enum_with_values(name: &str, values: &[(&str, i32)]) -> Enum {
    let mut en = Enum::new(name);
    en.values = values
        .iter()
        .map(|(value, number)| EnumValue::new(*value, *number))
        .collect();
    en
}

pub fn method(name: &str) -> Method {
    Method::new(name, ".pkg.Request", ".pkg.Response")
}

pub fn service_with_methods(name: &str, methods: Vec<Method>) -> Service {
    let mut svc = Service::new(name);
    svc.methods = methods;
    svc
}

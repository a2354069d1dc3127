//! Hand-built descriptors for tests: a small `shop` package with nested
//! messages, a repeated field, and a map field.

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet, MessageOptions,
};

use crate::Registry;

fn field(name: &str, number: i32, r#type: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        json_name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(r#type as i32),
        ..Default::default()
    }
}

fn message_field(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..field(name, number, Type::Message)
    }
}

/// ```proto
/// syntax = "proto3";
/// package shop;
///
/// message Order {
///   int64 id = 1;
///   string text = 2;
///   bool ok = 3;
///   double price = 4;
///   Customer customer = 5;
///   repeated string tags = 6;
///   map<string, string> attrs = 7;
/// }
///
/// message Customer {
///   string name = 1;
///   int32 rating = 2;
///   Address address = 3;
/// }
///
/// message Address {
///   string city = 1;
/// }
/// ```
pub fn file_descriptor_set() -> FileDescriptorSet {
    let attrs_entry = DescriptorProto {
        name: Some("AttrsEntry".to_string()),
        field: vec![field("key", 1, Type::String), field("value", 2, Type::String)],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };

    let order = DescriptorProto {
        name: Some("Order".to_string()),
        field: vec![
            field("id", 1, Type::Int64),
            field("text", 2, Type::String),
            field("ok", 3, Type::Bool),
            field("price", 4, Type::Double),
            message_field("customer", 5, ".shop.Customer"),
            FieldDescriptorProto {
                label: Some(Label::Repeated as i32),
                ..field("tags", 6, Type::String)
            },
            FieldDescriptorProto {
                label: Some(Label::Repeated as i32),
                ..message_field("attrs", 7, ".shop.Order.AttrsEntry")
            },
        ],
        nested_type: vec![attrs_entry],
        ..Default::default()
    };

    let customer = DescriptorProto {
        name: Some("Customer".to_string()),
        field: vec![
            field("name", 1, Type::String),
            field("rating", 2, Type::Int32),
            message_field("address", 3, ".shop.Address"),
        ],
        ..Default::default()
    };

    let address = DescriptorProto {
        name: Some("Address".to_string()),
        field: vec![field("city", 1, Type::String)],
        ..Default::default()
    };

    FileDescriptorSet {
        file: vec![FileDescriptorProto {
            name: Some("shop.proto".to_string()),
            package: Some("shop".to_string()),
            syntax: Some("proto3".to_string()),
            message_type: vec![order, customer, address],
            ..Default::default()
        }],
    }
}

/// A registry over [`file_descriptor_set`].
pub fn registry() -> Registry {
    Registry::from_file_descriptor_set(file_descriptor_set())
        .expect("test descriptor set is valid")
}

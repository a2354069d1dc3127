//! Dynamic message codec.
//!
//! In: a JSON document becomes binary protobuf bytes for a configured
//! message type. Out: protobuf bytes become a rendered string through an
//! out-message template, projecting the dotted property paths the template
//! references.

use std::collections::HashMap;

use pbq_config::tmpl::prop_to_template_param;
use pbq_config::{OutMessage, Template};
use prost::Message as _;
use prost_reflect::{DynamicMessage, FieldDescriptor, Kind, MapKey, MessageDescriptor, Value};

use crate::{CodecError, Registry};

/// Encode a JSON document as binary protobuf bytes of the named message.
/// Canonical protobuf JSON semantics apply: numbers coerce from numeric
/// strings, unknown fields are rejected.
pub fn encode(registry: &Registry, name: &str, json: &str) -> Result<Vec<u8>, CodecError> {
    let descriptor = registry.find_message(name)?;
    let mut de = serde_json::Deserializer::from_str(json);
    let message =
        DynamicMessage::deserialize(descriptor, &mut de).map_err(|source| CodecError::Json {
            name: name.to_string(),
            source,
        })?;
    de.end().map_err(|source| CodecError::Json {
        name: name.to_string(),
        source,
    })?;
    Ok(message.encode_to_vec())
}

/// Renders protobuf-encoded bytes of one message type through an
/// out-message template. The descriptor walk for every property path is
/// done once, at construction.
#[derive(Debug, Clone)]
pub struct Stringifier {
    descriptor: MessageDescriptor,
    template: Template,
    fields: HashMap<String, Vec<FieldDescriptor>>,
}

impl Stringifier {
    pub fn new(registry: &Registry, message: &OutMessage) -> Result<Self, CodecError> {
        let descriptor = registry.find_message(&message.name)?;
        let mut fields = HashMap::with_capacity(message.props.len());
        for path in &message.props {
            let fds = field_path(&descriptor, path)?;
            fields.insert(prop_to_template_param(path), fds);
        }
        Ok(Self {
            descriptor,
            template: message.template.clone(),
            fields,
        })
    }

    /// Decode `bytes` and render the template. Missing submessages along a
    /// path yield the leaf field's zero value.
    pub fn stringify(&self, bytes: &[u8]) -> Result<String, CodecError> {
        let message =
            DynamicMessage::decode(self.descriptor.clone(), bytes).map_err(|source| {
                CodecError::Decode {
                    name: self.descriptor.full_name().to_string(),
                    source,
                }
            })?;
        let mut ctx = HashMap::with_capacity(self.fields.len());
        for (param, path) in &self.fields {
            let mut value = Value::Message(message.clone());
            for fd in path {
                let parent = value.as_message().ok_or_else(|| CodecError::Property {
                    name: self.descriptor.full_name().to_string(),
                    prop: fd.name().to_string(),
                    path: param.clone(),
                })?;
                value = parent.get_field(fd).into_owned();
            }
            ctx.insert(param.as_str(), value_to_json(&value)?);
        }
        self.template
            .render(&ctx)
            .map_err(|source| CodecError::Render {
                name: self.descriptor.full_name().to_string(),
                source,
            })
    }
}

/// Walk `dotted` through the descriptor, collecting one field descriptor
/// per segment. Every segment but the last must be a singular message
/// field.
fn field_path(
    descriptor: &MessageDescriptor,
    dotted: &str,
) -> Result<Vec<FieldDescriptor>, CodecError> {
    let property_error = |prop: &str| CodecError::Property {
        name: descriptor.full_name().to_string(),
        prop: prop.to_string(),
        path: dotted.to_string(),
    };
    let props: Vec<&str> = dotted.split('.').collect();
    let mut fds = Vec::with_capacity(props.len());
    let mut current = Some(descriptor.clone());
    for (i, prop) in props.iter().enumerate() {
        let md = current.take().ok_or_else(|| property_error(prop))?;
        let fd = md.get_field_by_name(prop).ok_or_else(|| property_error(prop))?;
        if i + 1 < props.len() {
            if fd.is_list() || fd.is_map() {
                return Err(property_error(prop));
            }
            current = match fd.kind() {
                Kind::Message(next) => Some(next),
                _ => None,
            };
        }
        fds.push(fd);
    }
    Ok(fds)
}

/// Project a leaf value into something the template engine renders
/// naturally: scalars stay scalars, messages and containers become their
/// JSON form.
fn value_to_json(value: &Value) -> Result<serde_json::Value, CodecError> {
    use serde_json::json;
    Ok(match value {
        Value::Bool(v) => json!(v),
        Value::I32(v) => json!(v),
        Value::I64(v) => json!(v),
        Value::U32(v) => json!(v),
        Value::U64(v) => json!(v),
        // widened through the decimal form so 0.1f32 doesn't surface as
        // 0.10000000149011612
        Value::F32(v) => json!(v.to_string().parse::<f64>().unwrap_or(f64::from(*v))),
        Value::F64(v) => json!(v),
        Value::String(v) => json!(v),
        Value::Bytes(v) => json!(v.to_vec()),
        Value::EnumNumber(v) => json!(v),
        Value::Message(m) => serde_json::to_value(m)?,
        Value::List(items) => serde_json::Value::Array(
            items.iter().map(value_to_json).collect::<Result<_, _>>()?,
        ),
        Value::Map(entries) => {
            let mut obj = serde_json::Map::with_capacity(entries.len());
            for (key, val) in entries {
                obj.insert(map_key_to_string(key), value_to_json(val)?);
            }
            serde_json::Value::Object(obj)
        }
    })
}

fn map_key_to_string(key: &MapKey) -> String {
    match key {
        MapKey::Bool(v) => v.to_string(),
        MapKey::I32(v) => v.to_string(),
        MapKey::I64(v) => v.to_string(),
        MapKey::U32(v) => v.to_string(),
        MapKey::U64(v) => v.to_string(),
        MapKey::String(v) => v.clone(),
    }
}

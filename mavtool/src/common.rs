use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use mavlib::protocol::{FieldDefinition, MessageDefinition, PrimitiveType};
use mavlib::{Dialect, ParsedMessage, Value};

pub fn load_dialect(path: Option<&Path>) -> anyhow::Result<Arc<Dialect>> {
    let dialect = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading dialect file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing dialect file {}", path.display()))?
        }
        None => mavlib::dialects::common(),
    };
    Ok(Arc::new(dialect))
}

pub fn print_message(msg: &ParsedMessage, def: Option<&MessageDefinition>) {
    println!(
        "{} seq {} sys {} comp {} ({}, {})",
        msg.message_name,
        msg.sequence,
        msg.system_id,
        msg.component_id,
        msg.protocol_version,
        if msg.crc_ok { "crc ok" } else { "CRC MISMATCH" },
    );

    match def {
        Some(def) => {
            for field in def.wire_order() {
                if let Some(value) = msg.payload.get(field.name()) {
                    println!("    {}: {}", field.name(), value);
                }
            }
        }
        None => {
            if let Some(Value::Bytes(raw)) = msg.payload.get("raw_payload") {
                e_hexdump("   ", raw);
            }
        }
    }
}

pub fn e_hexdump(prefix: &str, bytes: &[u8]) {
    for s in hexdump::hexdump_iter(bytes) {
        if prefix.is_empty() {
            println!("{}", s);
        } else {
            println!("{} {}", prefix, s);
        }
    }
}

pub fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::json;

    match value {
        Value::UInt8(v) => json!(v),
        Value::Int8(v) => json!(v),
        Value::UInt16(v) => json!(v),
        Value::Int16(v) => json!(v),
        Value::UInt32(v) => json!(v),
        Value::Int32(v) => json!(v),
        Value::UInt64(v) => json!(v),
        Value::Int64(v) => json!(v),
        Value::Float(v) => json!(v),
        Value::Double(v) => json!(v),
        Value::Char(c) => json!(c.to_string()),
        Value::Str(s) => json!(s),
        Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(value_to_json).collect())
        }
        Value::Bytes(bytes) => json!(bytes),
    }
}

pub fn json_to_value(field: &FieldDefinition, json: &serde_json::Value) -> anyhow::Result<Value> {
    match (field.array_length(), field.base()) {
        (None, ty) => scalar_from_json(field, ty, json),
        (Some(_), PrimitiveType::Char) => json
            .as_str()
            .map(Value::from)
            .with_context(|| format!("field `{}` expects a string", field.name())),
        (Some(_), ty) => {
            let items = json
                .as_array()
                .with_context(|| format!("field `{}` expects an array", field.name()))?;
            let items = items
                .iter()
                .map(|item| scalar_from_json(field, ty, item))
                .collect::<anyhow::Result<Vec<_>>>()?;
            Ok(Value::Array(items))
        }
    }
}

fn scalar_from_json(
    field: &FieldDefinition,
    ty: PrimitiveType,
    json: &serde_json::Value,
) -> anyhow::Result<Value> {
    let bad = || format!("field `{}` expects {}, got {}", field.name(), ty, json);

    Ok(match ty {
        PrimitiveType::UInt8 => Value::UInt8(
            json.as_u64()
                .and_then(|v| u8::try_from(v).ok())
                .with_context(bad)?,
        ),
        PrimitiveType::Int8 => Value::Int8(
            json.as_i64()
                .and_then(|v| i8::try_from(v).ok())
                .with_context(bad)?,
        ),
        PrimitiveType::UInt16 => Value::UInt16(
            json.as_u64()
                .and_then(|v| u16::try_from(v).ok())
                .with_context(bad)?,
        ),
        PrimitiveType::Int16 => Value::Int16(
            json.as_i64()
                .and_then(|v| i16::try_from(v).ok())
                .with_context(bad)?,
        ),
        PrimitiveType::UInt32 => Value::UInt32(
            json.as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .with_context(bad)?,
        ),
        PrimitiveType::Int32 => Value::Int32(
            json.as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .with_context(bad)?,
        ),
        PrimitiveType::UInt64 => Value::UInt64(json.as_u64().with_context(bad)?),
        PrimitiveType::Int64 => Value::Int64(json.as_i64().with_context(bad)?),
        PrimitiveType::Float => Value::Float(json.as_f64().with_context(bad)? as f32),
        PrimitiveType::Double => Value::Double(json.as_f64().with_context(bad)?),
        PrimitiveType::Char => Value::Char(
            json.as_str()
                .and_then(|s| s.chars().next())
                .with_context(bad)?,
        ),
    })
}

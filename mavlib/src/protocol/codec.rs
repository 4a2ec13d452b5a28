//! Payload encoding and decoding against a message definition.
//!
//! The codec owns the two rules every MAVLink endpoint must agree on:
//! the wire-order sort (core fields stably ordered by descending
//! *element* size, extension fields appended in declaration order) and
//! the v2 trailing-zero truncation of extension bytes.

use std::collections::HashMap;

use nom::combinator::map;
use nom::number::complete as num;
use nom::IResult;
use void::ResultVoidExt;

use super::dialect::{FieldDefinition, PrimitiveType};
use super::serialize::{Serializer, SerializerVec};
use super::MavVersion;

/// Errors raised while serializing a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The requested message name is not in the catalog.
    #[error("unknown message `{0}`")]
    UnknownMessage(String),

    /// A payload value does not fit the field's declared type.
    #[error("field `{field}` expects {expected}, got {found}")]
    MalformedMessage {
        field: String,
        expected: String,
        found: &'static str,
    },

    /// The catalog has a definition but no CRC_EXTRA seed for this id.
    /// A correctly generated dialect never does this.
    #[error("no CRC_EXTRA registered for message id {0}")]
    MissingCrcExtra(u32),
}

/// A decoded field value.
///
/// Every primitive keeps its exact width; 64-bit integers in
/// particular never pass through a float. `char[N]` arrays surface as
/// [Value::Str], other arrays as [Value::Array], and the payload of an
/// unknown message as [Value::Bytes].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    UInt8(u8),
    Int8(i8),
    UInt16(u16),
    Int16(i16),
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Int64(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Str(String),
    Array(Vec<Value>),
    Bytes(Vec<u8>),
}

impl Value {
    /// The default for a field the wire or the caller omitted: zero
    /// for numerics, NUL for a lone char, an empty string or sequence
    /// for arrays. Arrays are presence-optional at the API surface
    /// even though they are zero-padded on the wire.
    pub fn default_for(field: &FieldDefinition) -> Value {
        match (field.array_length(), field.base()) {
            (None, ty) => Self::default_scalar(ty),
            (Some(_), PrimitiveType::Char) => Value::Str(String::new()),
            (Some(_), _) => Value::Array(Vec::new()),
        }
    }

    fn default_scalar(ty: PrimitiveType) -> Value {
        match ty {
            PrimitiveType::UInt8 => Value::UInt8(0),
            PrimitiveType::Int8 => Value::Int8(0),
            PrimitiveType::UInt16 => Value::UInt16(0),
            PrimitiveType::Int16 => Value::Int16(0),
            PrimitiveType::UInt32 => Value::UInt32(0),
            PrimitiveType::Int32 => Value::Int32(0),
            PrimitiveType::UInt64 => Value::UInt64(0),
            PrimitiveType::Int64 => Value::Int64(0),
            PrimitiveType::Float => Value::Float(0.0),
            PrimitiveType::Double => Value::Double(0.0),
            PrimitiveType::Char => Value::Char('\0'),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::UInt8(_) => "uint8_t",
            Value::Int8(_) => "int8_t",
            Value::UInt16(_) => "uint16_t",
            Value::Int16(_) => "int16_t",
            Value::UInt32(_) => "uint32_t",
            Value::Int32(_) => "int32_t",
            Value::UInt64(_) => "uint64_t",
            Value::Int64(_) => "int64_t",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Bytes(_) => "bytes",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Value::UInt8(v) => write!(f, "{}", v),
            Value::Int8(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Char(c) => write!(f, "{:?}", c),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Bytes(bytes) => {
                f.write_str("[")?;
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{:02x}", b)?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        })*
    };
}

value_from! {
    u8 => UInt8, i8 => Int8, u16 => UInt16, i16 => Int16,
    u32 => UInt32, i32 => Int32, u64 => UInt64, i64 => Int64,
    f32 => Float, f64 => Double, char => Char, String => Str,
    Vec<Value> => Array,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

/// Fields in wire order: non-extension fields stably sorted by
/// descending element size, extension fields appended in declaration
/// order.
///
/// The sort key is the size of one *element*, never the total field
/// size, so a `uint8_t[20]` array follows every wider scalar.
pub fn wire_order(fields: &[FieldDefinition]) -> Vec<&FieldDefinition> {
    let mut order: Vec<&FieldDefinition> =
        fields.iter().filter(|f| !f.is_extension()).collect();
    order.sort_by(|a, b| b.element_size().cmp(&a.element_size()));
    order.extend(fields.iter().filter(|f| f.is_extension()));
    order
}

/// Untruncated payload size of a field list.
pub fn payload_size(fields: &[FieldDefinition]) -> usize {
    fields.iter().map(FieldDefinition::wire_size).sum()
}

/// Payload size of the non-extension fields only.
pub fn core_payload_size(fields: &[FieldDefinition]) -> usize {
    fields
        .iter()
        .filter(|f| !f.is_extension())
        .map(FieldDefinition::wire_size)
        .sum()
}

fn scalar(input: &[u8], ty: PrimitiveType) -> IResult<&[u8], Value> {
    match ty {
        PrimitiveType::UInt8 => map(num::u8, Value::UInt8)(input),
        PrimitiveType::Int8 => map(num::i8, Value::Int8)(input),
        PrimitiveType::UInt16 => map(num::le_u16, Value::UInt16)(input),
        PrimitiveType::Int16 => map(num::le_i16, Value::Int16)(input),
        PrimitiveType::UInt32 => map(num::le_u32, Value::UInt32)(input),
        PrimitiveType::Int32 => map(num::le_i32, Value::Int32)(input),
        PrimitiveType::UInt64 => map(num::le_u64, Value::UInt64)(input),
        PrimitiveType::Int64 => map(num::le_i64, Value::Int64)(input),
        PrimitiveType::Float => map(num::le_f32, Value::Float)(input),
        PrimitiveType::Double => map(num::le_f64, Value::Double)(input),
        PrimitiveType::Char => map(num::u8, |b| Value::Char(b as char))(input),
    }
}

fn field_value<'a>(input: &'a [u8], field: &FieldDefinition) -> IResult<&'a [u8], Value> {
    match (field.array_length(), field.base()) {
        (None, ty) => scalar(input, ty),
        (Some(n), PrimitiveType::Char) => {
            let (rest, raw) = nom::bytes::complete::take(n)(input)?;
            let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
            let text = raw[..end].iter().map(|&b| b as char).collect();
            Ok((rest, Value::Str(text)))
        }
        (Some(n), ty) => {
            let (rest, items) = nom::multi::count(|i| scalar(i, ty), n)(input)?;
            Ok((rest, Value::Array(items)))
        }
    }
}

/// Decode a payload against a field list.
///
/// Every declared field gets a value: fields wholly beyond the
/// received bytes get their defaults, and a field cut mid-way by v2
/// truncation is decoded against a zero-extended view, exactly as the
/// peer's encoder zero-padded it.
pub fn decode_payload(bytes: &[u8], fields: &[FieldDefinition]) -> HashMap<String, Value> {
    let order = wire_order(fields);
    let full = payload_size(fields);

    let padded: Vec<u8>;
    let buf: &[u8] = if bytes.len() < full {
        padded = {
            let mut p = bytes.to_vec();
            p.resize(full, 0);
            p
        };
        &padded
    } else {
        &bytes[..full]
    };

    let mut out = HashMap::with_capacity(order.len());
    let mut offset = 0;
    for field in order {
        let value = if offset >= bytes.len() {
            Value::default_for(field)
        } else {
            match field_value(&buf[offset..], field) {
                Ok((_, value)) => value,
                // unreachable: buf always holds the full payload size
                Err(_) => Value::default_for(field),
            }
        };
        out.insert(field.name().to_owned(), value);
        offset += field.wire_size();
    }
    out
}

fn type_desc(field: &FieldDefinition) -> String {
    match field.array_length() {
        None => field.base().name().to_owned(),
        Some(n) => format!("{}[{}]", field.base().name(), n),
    }
}

fn mismatch(field: &FieldDefinition, found: &Value) -> EncodeError {
    EncodeError::MalformedMessage {
        field: field.name().to_owned(),
        expected: type_desc(field),
        found: found.type_name(),
    }
}

fn write_scalar(ser: &mut SerializerVec, ty: PrimitiveType, value: &Value) -> bool {
    match (ty, value) {
        (PrimitiveType::UInt8, Value::UInt8(v)) => ser.write_u8(*v).void_unwrap(),
        (PrimitiveType::Int8, Value::Int8(v)) => ser.write_i8(*v).void_unwrap(),
        (PrimitiveType::UInt16, Value::UInt16(v)) => ser.write_le_u16(*v).void_unwrap(),
        (PrimitiveType::Int16, Value::Int16(v)) => ser.write_le_i16(*v).void_unwrap(),
        (PrimitiveType::UInt32, Value::UInt32(v)) => ser.write_le_u32(*v).void_unwrap(),
        (PrimitiveType::Int32, Value::Int32(v)) => ser.write_le_i32(*v).void_unwrap(),
        (PrimitiveType::UInt64, Value::UInt64(v)) => ser.write_le_u64(*v).void_unwrap(),
        (PrimitiveType::Int64, Value::Int64(v)) => ser.write_le_i64(*v).void_unwrap(),
        (PrimitiveType::Float, Value::Float(v)) => ser.write_le_f32(*v).void_unwrap(),
        (PrimitiveType::Double, Value::Double(v)) => ser.write_le_f64(*v).void_unwrap(),
        (PrimitiveType::Char, Value::Char(c)) => ser.write_u8(*c as u8).void_unwrap(),
        _ => return false,
    }
    true
}

fn write_field(
    ser: &mut SerializerVec,
    field: &FieldDefinition,
    value: Option<&Value>,
) -> Result<(), EncodeError> {
    match (field.array_length(), field.base()) {
        (None, ty) => {
            let default = Value::default_scalar(ty);
            let value = value.unwrap_or(&default);
            if !write_scalar(ser, ty, value) {
                return Err(mismatch(field, value));
            }
        }
        (Some(n), PrimitiveType::Char) => {
            let text = match value {
                None => "",
                Some(Value::Str(s)) => s.as_str(),
                Some(other) => return Err(mismatch(field, other)),
            };
            // overlong strings are cut at N, short ones NUL-padded
            let raw = text.as_bytes();
            let used = raw.len().min(n);
            ser.write_bytes(&raw[..used]).void_unwrap();
            for _ in used..n {
                ser.write_u8(0).void_unwrap();
            }
        }
        (Some(n), ty) => {
            let items: &[Value] = match value {
                None => &[],
                Some(Value::Array(items)) => items,
                Some(other) => return Err(mismatch(field, other)),
            };
            for item in items.iter().take(n) {
                if !write_scalar(ser, ty, item) {
                    return Err(mismatch(field, item));
                }
            }
            let pad = Value::default_scalar(ty);
            for _ in items.len().min(n)..n {
                write_scalar(ser, ty, &pad);
            }
        }
    }
    Ok(())
}

/// Encode a payload map against a field list.
///
/// Fields the caller omitted encode as their defaults. At v2, when the
/// definition has extension fields, trailing zero bytes are trimmed
/// back to — never past — the core payload size; a message without
/// extension fields always encodes at its full size.
pub fn encode_payload(
    payload: &HashMap<String, Value>,
    fields: &[FieldDefinition],
    version: MavVersion,
) -> Result<Vec<u8>, EncodeError> {
    let mut ser = SerializerVec::new();
    for field in wire_order(fields) {
        write_field(&mut ser, field, payload.get(field.name()))?;
    }
    let mut buf = ser.done();

    if version == MavVersion::V2 && fields.iter().any(FieldDefinition::is_extension) {
        let core = core_payload_size(fields);
        let mut trimmed = buf.len();
        while trimmed > core && buf[trimmed - 1] == 0 {
            trimmed -= 1;
        }
        buf.truncate(trimmed);
    }
    Ok(buf)
}

//! Dialect catalogs: message definitions, field definitions, and the
//! per-message CRC_EXTRA table.
//!
//! A dialect is a plain immutable value. Code-generated catalogs and
//! hand-assembled subsets both go through [DialectBuilder]; catalogs
//! produced by an external generator can additionally be deserialized
//! from JSON when the `serde` feature is enabled.

use std::collections::HashMap;

/// Largest message id a v2 frame can carry (24 bits).
pub const MAX_MESSAGE_ID: u32 = 0x00ff_ffff;

/// Largest payload a frame can carry.
pub const MAX_PAYLOAD_SIZE: usize = 255;

/// Errors raised while building or loading a dialect catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DialectError {
    /// The type string is not one of the MAVLink primitive type names.
    #[error("unknown MAVLink type `{0}`")]
    UnknownType(String),

    /// The type string carries a malformed `[N]` suffix.
    #[error("malformed array suffix in type `{0}`")]
    BadTypeSyntax(String),

    /// An explicit array length was combined with an inline `[N]` suffix.
    #[error("field `{0}` has both an inline array suffix and an explicit array length")]
    ConflictingArrayLength(String),

    /// Array lengths must be at least 2.
    #[error("field `{field}` has invalid array length {len}")]
    BadArrayLength { field: String, len: usize },

    /// Message ids are 24-bit.
    #[error("message id {0} exceeds the 24-bit range")]
    MessageIdRange(u32),

    /// A non-extension field appeared after an extension field.
    #[error("message `{message}`: core field `{field}` declared after an extension field")]
    ExtensionOrder { message: String, field: String },

    /// Two fields of one message share a name.
    #[error("message `{message}`: duplicate field `{field}`")]
    DuplicateField { message: String, field: String },

    /// The declared fields exceed the 255-byte payload limit.
    #[error("message `{message}`: payload is {size} bytes, max {MAX_PAYLOAD_SIZE}")]
    PayloadTooLarge { message: String, size: usize },

    /// Two messages in one dialect share an id.
    #[error("duplicate message id {0} in dialect")]
    DuplicateMessageId(u32),

    /// Two messages in one dialect share a name.
    #[error("duplicate message name `{0}` in dialect")]
    DuplicateMessageName(String),
}

/// The MAVLink primitive wire types. All multi-byte types are
/// little-endian on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Float,
    Double,
    Char,
}

impl PrimitiveType {
    /// Size of one element on the wire, in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::UInt8 | Self::Int8 | Self::Char => 1,
            Self::UInt16 | Self::Int16 => 2,
            Self::UInt32 | Self::Int32 | Self::Float => 4,
            Self::UInt64 | Self::Int64 | Self::Double => 8,
        }
    }

    /// The name used in message definitions, e.g. `uint16_t`.
    pub fn name(self) -> &'static str {
        match self {
            Self::UInt8 => "uint8_t",
            Self::Int8 => "int8_t",
            Self::UInt16 => "uint16_t",
            Self::Int16 => "int16_t",
            Self::UInt32 => "uint32_t",
            Self::Int32 => "int32_t",
            Self::UInt64 => "uint64_t",
            Self::Int64 => "int64_t",
            Self::Float => "float",
            Self::Double => "double",
            Self::Char => "char",
        }
    }
}

impl std::fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for PrimitiveType {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "uint8_t" => Self::UInt8,
            "int8_t" => Self::Int8,
            "uint16_t" => Self::UInt16,
            "int16_t" => Self::Int16,
            "uint32_t" => Self::UInt32,
            "int32_t" => Self::Int32,
            "uint64_t" => Self::UInt64,
            "int64_t" => Self::Int64,
            "float" => Self::Float,
            "double" => Self::Double,
            "char" => Self::Char,
            _ => return Err(DialectError::UnknownType(s.to_owned())),
        })
    }
}

/// One field of a message definition.
///
/// Fields are declared in XML order; the wire order is derived from the
/// declaration order by the codec's element-size sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    name: String,
    base: PrimitiveType,
    array_length: Option<usize>,
    extension: bool,
}

impl FieldDefinition {
    /// A scalar field.
    pub fn scalar(name: impl Into<String>, base: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            base,
            array_length: None,
            extension: false,
        }
    }

    /// An array field of `len` elements.
    ///
    /// # Panics
    ///
    /// Panics if `len < 2`; use [FieldDefinition::scalar] for single
    /// elements.
    pub fn array(name: impl Into<String>, base: PrimitiveType, len: usize) -> Self {
        let name = name.into();
        assert!(len >= 2, "array length for `{}` must be >= 2", name);
        Self {
            name,
            base,
            array_length: Some(len),
            extension: false,
        }
    }

    /// Parse a field from a MAVLink type string, accepting an inline
    /// array suffix: `"uint8_t"`, `"char[16]"`, `"uint16_t[4]"`.
    pub fn parse(name: impl Into<String>, type_spec: &str) -> Result<Self, DialectError> {
        Self::parse_with_array(name, type_spec, None)
    }

    /// Parse a field from a type string plus an optional explicit array
    /// length, as a generator emits them. Exactly one of the inline
    /// suffix and the explicit length may specify an array.
    pub fn parse_with_array(
        name: impl Into<String>,
        type_spec: &str,
        array_length: Option<usize>,
    ) -> Result<Self, DialectError> {
        let name = name.into();

        let (base, inline) = match type_spec.find('[') {
            None => (type_spec.parse::<PrimitiveType>()?, None),
            Some(open) => {
                let inner = type_spec[open..]
                    .strip_prefix('[')
                    .and_then(|s| s.strip_suffix(']'))
                    .ok_or_else(|| DialectError::BadTypeSyntax(type_spec.to_owned()))?;
                let len = inner
                    .parse::<usize>()
                    .map_err(|_| DialectError::BadTypeSyntax(type_spec.to_owned()))?;
                (type_spec[..open].parse::<PrimitiveType>()?, Some(len))
            }
        };

        let len = match (inline, array_length) {
            (Some(_), Some(_)) => return Err(DialectError::ConflictingArrayLength(name)),
            (inline, explicit) => inline.or(explicit),
        };

        if let Some(len) = len {
            if len < 2 {
                return Err(DialectError::BadArrayLength { field: name, len });
            }
        }

        Ok(Self {
            name,
            base,
            array_length: len,
            extension: false,
        })
    }

    /// Mark this field as a v2 extension field.
    pub fn extension(mut self) -> Self {
        self.extension = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The element type, ignoring any array length.
    pub fn base(&self) -> PrimitiveType {
        self.base
    }

    pub fn array_length(&self) -> Option<usize> {
        self.array_length
    }

    pub fn is_extension(&self) -> bool {
        self.extension
    }

    /// Size of one element; this is the sort key for the wire order.
    pub fn element_size(&self) -> usize {
        self.base.size()
    }

    /// Total bytes this field occupies in an untruncated payload.
    pub fn wire_size(&self) -> usize {
        self.base.size() * self.array_length.unwrap_or(1)
    }
}

/// A message definition: id, name, and fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDefinition {
    id: u32,
    name: String,
    fields: Vec<FieldDefinition>,
}

impl MessageDefinition {
    /// Build a definition, validating the catalog invariants.
    ///
    /// # Panics
    ///
    /// Panics on an invalid definition; this constructor is meant for
    /// definitions written in code. Data loaded at runtime goes through
    /// [MessageDefinition::try_new].
    pub fn new(id: u32, name: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        match Self::try_new(id, name, fields) {
            Ok(def) => def,
            Err(e) => panic!("invalid message definition: {}", e),
        }
    }

    /// Fallible variant of [MessageDefinition::new].
    pub fn try_new(
        id: u32,
        name: impl Into<String>,
        fields: Vec<FieldDefinition>,
    ) -> Result<Self, DialectError> {
        let name = name.into();

        if id > MAX_MESSAGE_ID {
            return Err(DialectError::MessageIdRange(id));
        }

        let mut seen_extension = false;
        for (i, field) in fields.iter().enumerate() {
            if field.is_extension() {
                seen_extension = true;
            } else if seen_extension {
                return Err(DialectError::ExtensionOrder {
                    message: name.clone(),
                    field: field.name().to_owned(),
                });
            }
            if fields[..i].iter().any(|f| f.name() == field.name()) {
                return Err(DialectError::DuplicateField {
                    message: name.clone(),
                    field: field.name().to_owned(),
                });
            }
        }

        let size = fields.iter().map(FieldDefinition::wire_size).sum::<usize>();
        if size > MAX_PAYLOAD_SIZE {
            return Err(DialectError::PayloadTooLarge {
                message: name,
                size,
            });
        }

        Ok(Self { id, name, fields })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Fields in wire order: core fields stably sorted by descending
    /// element size, extension fields appended in declaration order.
    pub fn wire_order(&self) -> Vec<&FieldDefinition> {
        super::codec::wire_order(&self.fields)
    }

    /// Untruncated payload size, extension fields included.
    pub fn payload_size(&self) -> usize {
        self.fields.iter().map(FieldDefinition::wire_size).sum()
    }

    /// Payload size of the non-extension fields only. Truncation never
    /// cuts below this.
    pub fn core_payload_size(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| !f.is_extension())
            .map(FieldDefinition::wire_size)
            .sum()
    }
}

/// An immutable message catalog: definitions keyed by id and by name,
/// plus the CRC_EXTRA seed for every id.
///
/// Construct one per dialect at startup and share it across endpoints
/// behind an `Arc`; it is never mutated afterwards.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawDialect"))]
pub struct Dialect {
    name: String,
    messages: HashMap<u32, MessageDefinition>,
    ids_by_name: HashMap<String, u32>,
    crc_extra: HashMap<u32, u8>,
}

impl Dialect {
    pub fn builder(name: impl Into<String>) -> DialectBuilder {
        DialectBuilder {
            dialect: Dialect {
                name: name.into(),
                messages: HashMap::new(),
                ids_by_name: HashMap::new(),
                crc_extra: HashMap::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message_by_id(&self, id: u32) -> Option<&MessageDefinition> {
        self.messages.get(&id)
    }

    pub fn message_by_name(&self, name: &str) -> Option<&MessageDefinition> {
        self.ids_by_name.get(name).and_then(|id| self.messages.get(id))
    }

    pub fn supports_id(&self, id: u32) -> bool {
        self.messages.contains_key(&id)
    }

    pub fn supports_name(&self, name: &str) -> bool {
        self.ids_by_name.contains_key(name)
    }

    /// All registered ids, ascending.
    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.messages.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ids_by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn crc_extra(&self, id: u32) -> Option<u8> {
        self.crc_extra.get(&id).copied()
    }

    /// The `id -> crc_extra` table the framer validates against.
    pub fn crc_table(&self) -> &HashMap<u32, u8> {
        &self.crc_extra
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Assembles a [Dialect]. Callers that only need a subset of a dialect
/// register just the messages they use.
#[derive(Debug, Clone)]
pub struct DialectBuilder {
    dialect: Dialect,
}

impl DialectBuilder {
    /// Register a message and its CRC_EXTRA seed.
    ///
    /// # Panics
    ///
    /// Panics on a duplicate id or name; catalogs built in code are
    /// programmer-controlled. Runtime-loaded catalogs use
    /// [DialectBuilder::try_message].
    pub fn message(mut self, def: MessageDefinition, crc_extra: u8) -> Self {
        match self.try_message_inner(def, crc_extra) {
            Ok(()) => self,
            Err(e) => panic!("invalid dialect: {}", e),
        }
    }

    /// Fallible variant of [DialectBuilder::message].
    pub fn try_message(
        mut self,
        def: MessageDefinition,
        crc_extra: u8,
    ) -> Result<Self, DialectError> {
        self.try_message_inner(def, crc_extra)?;
        Ok(self)
    }

    fn try_message_inner(
        &mut self,
        def: MessageDefinition,
        crc_extra: u8,
    ) -> Result<(), DialectError> {
        if self.dialect.messages.contains_key(&def.id()) {
            return Err(DialectError::DuplicateMessageId(def.id()));
        }
        if self.dialect.ids_by_name.contains_key(def.name()) {
            return Err(DialectError::DuplicateMessageName(def.name().to_owned()));
        }
        self.dialect.ids_by_name.insert(def.name().to_owned(), def.id());
        self.dialect.crc_extra.insert(def.id(), crc_extra);
        self.dialect.messages.insert(def.id(), def);
        Ok(())
    }

    pub fn build(self) -> Dialect {
        self.dialect
    }
}

// The JSON shape a generator emits, per message: numeric id, unique
// name, fields in XML declaration order, and the precomputed CRC_EXTRA
// byte. Validation happens in the TryFrom conversions.

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    type_spec: String,
    #[serde(default)]
    array_length: Option<usize>,
    #[serde(default)]
    extension: bool,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawMessage {
    id: u32,
    name: String,
    crc_extra: u8,
    fields: Vec<RawField>,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawDialect {
    dialect: String,
    messages: Vec<RawMessage>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawField> for FieldDefinition {
    type Error = DialectError;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        let field = FieldDefinition::parse_with_array(raw.name, &raw.type_spec, raw.array_length)?;
        Ok(if raw.extension { field.extension() } else { field })
    }
}

#[cfg(feature = "serde")]
impl TryFrom<RawDialect> for Dialect {
    type Error = DialectError;

    fn try_from(raw: RawDialect) -> Result<Self, Self::Error> {
        let mut builder = Dialect::builder(raw.dialect);
        for msg in raw.messages {
            let fields = msg
                .fields
                .into_iter()
                .map(FieldDefinition::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            let def = MessageDefinition::try_new(msg.id, msg.name, fields)?;
            builder = builder.try_message(def, msg.crc_extra)?;
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use super::PrimitiveType::*;

    #[test]
    fn parse_scalar_type() {
        let f = FieldDefinition::parse("voltage", "uint16_t").unwrap();
        assert_eq!(f.base(), UInt16);
        assert_eq!(f.array_length(), None);
        assert_eq!(f.wire_size(), 2);
    }

    #[test]
    fn parse_inline_array() {
        let f = FieldDefinition::parse("param_id", "char[16]").unwrap();
        assert_eq!(f.base(), Char);
        assert_eq!(f.array_length(), Some(16));
        assert_eq!(f.element_size(), 1);
        assert_eq!(f.wire_size(), 16);
    }

    #[test]
    fn parse_explicit_array() {
        let f = FieldDefinition::parse_with_array("hash", "uint8_t", Some(8)).unwrap();
        assert_eq!(f.array_length(), Some(8));
    }

    #[test]
    fn parse_rejects_unknown_type() {
        assert_eq!(
            FieldDefinition::parse("x", "uint24_t"),
            Err(DialectError::UnknownType("uint24_t".to_owned()))
        );
    }

    #[test]
    fn parse_rejects_bad_suffix() {
        assert!(matches!(
            FieldDefinition::parse("x", "uint8_t[3"),
            Err(DialectError::BadTypeSyntax(_))
        ));
        assert!(matches!(
            FieldDefinition::parse("x", "uint8_t[three]"),
            Err(DialectError::BadTypeSyntax(_))
        ));
    }

    #[test]
    fn parse_rejects_double_length() {
        assert_eq!(
            FieldDefinition::parse_with_array("x", "uint8_t[4]", Some(4)),
            Err(DialectError::ConflictingArrayLength("x".to_owned()))
        );
    }

    #[test]
    fn parse_rejects_short_array() {
        assert_eq!(
            FieldDefinition::parse("x", "uint8_t[1]"),
            Err(DialectError::BadArrayLength {
                field: "x".to_owned(),
                len: 1
            })
        );
    }

    #[test]
    fn message_rejects_core_after_extension() {
        let err = MessageDefinition::try_new(
            7,
            "BAD",
            vec![
                FieldDefinition::scalar("a", UInt8),
                FieldDefinition::scalar("b", UInt8).extension(),
                FieldDefinition::scalar("c", UInt8),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, DialectError::ExtensionOrder { .. }));
    }

    #[test]
    fn message_rejects_wide_id() {
        let err =
            MessageDefinition::try_new(0x0100_0000, "BAD", vec![]).unwrap_err();
        assert_eq!(err, DialectError::MessageIdRange(0x0100_0000));
    }

    #[test]
    fn message_rejects_oversize_payload() {
        let err = MessageDefinition::try_new(
            9,
            "BAD",
            vec![
                FieldDefinition::array("a", UInt8, 200),
                FieldDefinition::array("b", UInt8, 56),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, DialectError::PayloadTooLarge { size: 256, .. }));
    }

    #[test]
    fn builder_rejects_duplicates() {
        let def = |id, name: &str| {
            MessageDefinition::new(id, name, vec![FieldDefinition::scalar("a", UInt8)])
        };

        let err = Dialect::builder("test")
            .message(def(1, "ONE"), 10)
            .try_message(def(1, "OTHER"), 11)
            .unwrap_err();
        assert_eq!(err, DialectError::DuplicateMessageId(1));

        let err = Dialect::builder("test")
            .message(def(1, "ONE"), 10)
            .try_message(def(2, "ONE"), 11)
            .unwrap_err();
        assert_eq!(err, DialectError::DuplicateMessageName("ONE".to_owned()));
    }

    #[test]
    fn catalog_lookups_agree() {
        let dialect = Dialect::builder("test")
            .message(
                MessageDefinition::new(5, "FIVE", vec![FieldDefinition::scalar("a", UInt8)]),
                42,
            )
            .message(
                MessageDefinition::new(300, "BIG", vec![FieldDefinition::scalar("a", UInt32)]),
                7,
            )
            .build();

        assert_eq!(dialect.ids(), vec![5, 300]);
        assert_eq!(dialect.names(), vec!["BIG", "FIVE"]);
        assert!(dialect.supports_id(300));
        assert!(!dialect.supports_id(6));
        assert_eq!(dialect.message_by_name("FIVE").map(|d| d.id()), Some(5));
        assert_eq!(dialect.crc_extra(300), Some(7));
        assert_eq!(dialect.crc_extra(6), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn dialect_from_generator_json() {
        let json = r#"{
            "dialect": "demo",
            "messages": [
                {
                    "id": 22,
                    "name": "PARAM_VALUE",
                    "crc_extra": 220,
                    "fields": [
                        {"name": "param_id", "type": "char[16]"},
                        {"name": "param_value", "type": "float"},
                        {"name": "param_type", "type": "uint8_t"},
                        {"name": "param_count", "type": "uint16_t"},
                        {"name": "param_index", "type": "uint16_t"}
                    ]
                }
            ]
        }"#;

        let dialect: Dialect = serde_json::from_str(json).unwrap();
        assert_eq!(dialect.name(), "demo");
        let def = dialect.message_by_name("PARAM_VALUE").unwrap();
        assert_eq!(def.payload_size(), 25);
        assert_eq!(dialect.crc_extra(22), Some(220));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn generator_json_rejects_bad_field() {
        let json = r#"{
            "dialect": "demo",
            "messages": [
                {
                    "id": 1,
                    "name": "X",
                    "crc_extra": 0,
                    "fields": [{"name": "a", "type": "char[16]", "array_length": 16}]
                }
            ]
        }"#;

        assert!(serde_json::from_str::<Dialect>(json).is_err());
    }
}

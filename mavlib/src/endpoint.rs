//! The dialect engine: one catalog, one stream buffer, and the
//! parse/serialize surface callers actually use.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use crate::buffer::StreamBuffer;
use crate::protocol::codec::{self, EncodeError, Value};
use crate::protocol::frame::{create_frame, parse_frame, Frame};
use crate::protocol::{Dialect, MavVersion, MessageDefinition, SIGNATURE_LEN};

/// A message decoded off the wire, owned by the caller.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    pub protocol_version: MavVersion,
    pub sequence: u8,
    pub system_id: u8,
    pub component_id: u8,
    pub message_id: u32,
    /// False marks a checksum mismatch (or an id the catalog cannot
    /// check). The message is still delivered; dropping it is the
    /// consumer's call.
    pub crc_ok: bool,
    /// v2 signature block, passed through untouched.
    pub signature: Option<[u8; SIGNATURE_LEN]>,
    /// Definition name, or `UNKNOWN_<id>` for ids outside the catalog.
    pub message_name: String,
    /// Field name to decoded value; `raw_payload` bytes for unknown
    /// messages.
    pub payload: HashMap<String, Value>,
    /// Name of the dialect that decoded this message.
    pub dialect: String,
    /// When the message was pulled out of the stream.
    pub timestamp: SystemTime,
}

/// A message on its way out: a name, the fields the caller cares
/// about, and optional header overrides.
///
/// Omitted payload fields serialize as their defaults. Omitted header
/// fields fall back to system 1, component 1, sequence 0, and MAVLink 2
/// exactly when the id needs it.
#[derive(Debug, Clone, Default)]
pub struct OutgoingMessage {
    pub message_name: String,
    pub payload: HashMap<String, Value>,
    pub system_id: Option<u8>,
    pub component_id: Option<u8>,
    pub sequence: Option<u8>,
    pub protocol_version: Option<MavVersion>,
}

impl OutgoingMessage {
    pub fn new(message_name: impl Into<String>) -> Self {
        Self {
            message_name: message_name.into(),
            ..Self::default()
        }
    }

    /// Set one payload field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(name.into(), value.into());
        self
    }
}

/// A protocol endpoint for one dialect.
///
/// Owns the stream buffer exclusively, so feed each producer its own
/// endpoint; the catalog itself is immutable and cheap to share.
#[derive(Debug, Clone)]
pub struct Endpoint {
    dialect: Arc<Dialect>,
    buffer: StreamBuffer,
}

impl Endpoint {
    pub fn new(dialect: impl Into<Arc<Dialect>>) -> Self {
        Self {
            dialect: dialect.into(),
            buffer: StreamBuffer::new(),
        }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Feed raw link bytes in and collect every message that became
    /// complete, in stream order. Partial trailing input is retained
    /// for the next call.
    pub fn parse_bytes(&mut self, bytes: &[u8]) -> Vec<ParsedMessage> {
        self.buffer.append(bytes);

        let mut messages = Vec::new();
        loop {
            let (consumed, frame) =
                parse_frame(self.buffer.contents(), self.dialect.crc_table());
            if consumed == 0 && frame.is_none() {
                break;
            }
            self.buffer.consume(consumed);
            if let Some(frame) = frame {
                messages.push(self.decode(&frame));
            }
            if self.buffer.is_empty() {
                break;
            }
        }
        messages
    }

    /// Decode one frame against the catalog.
    ///
    /// An id the catalog does not know yields a synthetic
    /// `UNKNOWN_<id>` message carrying the raw payload, with the
    /// frame's `crc_ok` preserved.
    pub fn decode(&self, frame: &Frame) -> ParsedMessage {
        let (message_name, payload) = match self.dialect.message_by_id(frame.message_id) {
            Some(def) => (
                def.name().to_owned(),
                codec::decode_payload(&frame.payload, def.fields()),
            ),
            None => {
                tracing::debug!(message_id = frame.message_id, "id not in catalog");
                let mut payload = HashMap::new();
                payload.insert(
                    "raw_payload".to_owned(),
                    Value::Bytes(frame.payload.clone()),
                );
                (format!("UNKNOWN_{}", frame.message_id), payload)
            }
        };

        ParsedMessage {
            protocol_version: frame.version,
            sequence: frame.sequence,
            system_id: frame.system_id,
            component_id: frame.component_id,
            message_id: frame.message_id,
            crc_ok: frame.crc_ok,
            signature: frame.signature,
            message_name,
            payload,
            dialect: self.dialect.name().to_owned(),
            timestamp: SystemTime::now(),
        }
    }

    /// Serialize a message into complete frame bytes.
    pub fn serialize_message(&self, msg: &OutgoingMessage) -> Result<Vec<u8>, EncodeError> {
        let def = self.lookup(&msg.message_name)?;
        let crc_extra = self
            .dialect
            .crc_extra(def.id())
            .ok_or(EncodeError::MissingCrcExtra(def.id()))?;

        let version = msg.protocol_version.unwrap_or(if def.id() > 0xff {
            MavVersion::V2
        } else {
            MavVersion::V1
        });

        let payload = codec::encode_payload(&msg.payload, def.fields(), version)?;
        Ok(create_frame(
            def.id(),
            &payload,
            msg.system_id.unwrap_or(1),
            msg.component_id.unwrap_or(1),
            msg.sequence.unwrap_or(0),
            crc_extra,
            version,
        ))
    }

    /// A copy of `msg` with every omitted payload field filled with
    /// its default, fields visited in wire order.
    pub fn complete_message(&self, msg: &OutgoingMessage) -> Result<OutgoingMessage, EncodeError> {
        let def = self.lookup(&msg.message_name)?;
        let mut completed = msg.clone();
        for field in def.wire_order() {
            completed
                .payload
                .entry(field.name().to_owned())
                .or_insert_with(|| Value::default_for(field));
        }
        Ok(completed)
    }

    fn lookup(&self, name: &str) -> Result<&MessageDefinition, EncodeError> {
        self.dialect
            .message_by_name(name)
            .ok_or_else(|| EncodeError::UnknownMessage(name.to_owned()))
    }

    pub fn definition_by_id(&self, id: u32) -> Option<&MessageDefinition> {
        self.dialect.message_by_id(id)
    }

    pub fn definition_by_name(&self, name: &str) -> Option<&MessageDefinition> {
        self.dialect.message_by_name(name)
    }

    pub fn supports_id(&self, id: u32) -> bool {
        self.dialect.supports_id(id)
    }

    pub fn supports_name(&self, name: &str) -> bool {
        self.dialect.supports_name(name)
    }

    /// Registered ids, ascending.
    pub fn supported_ids(&self) -> Vec<u32> {
        self.dialect.ids()
    }

    pub fn supported_names(&self) -> Vec<&str> {
        self.dialect.names()
    }

    /// Drop any partial input held between [Endpoint::parse_bytes]
    /// calls.
    pub fn reset_buffer(&mut self) {
        self.buffer.reset();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    use crate::dialects;

    fn endpoint() -> Endpoint {
        Endpoint::new(dialects::common())
    }

    fn heartbeat() -> OutgoingMessage {
        OutgoingMessage {
            sequence: Some(42),
            protocol_version: Some(MavVersion::V1),
            ..OutgoingMessage::new("HEARTBEAT")
                .field("type", 6u8)
                .field("autopilot", 8u8)
                .field("base_mode", 81u8)
                .field("custom_mode", 12345u32)
                .field("system_status", 4u8)
                .field("mavlink_version", 3u8)
        }
    }

    fn byte_array(bytes: &[u8]) -> Value {
        Value::Array(bytes.iter().map(|&b| Value::UInt8(b)).collect())
    }

    #[test]
    fn heartbeat_v1_wire_image() {
        let bytes = endpoint().serialize_message(&heartbeat()).unwrap();
        assert_eq!(bytes.len(), 17);
        assert_eq!(
            &bytes[..15],
            &[
                0xfe, 0x09, 0x2a, 0x01, 0x01, 0x00, // header
                0x39, 0x30, 0x00, 0x00, // custom_mode
                0x06, 0x08, 0x51, 0x04, 0x03, // remaining fields in wire order
            ]
        );

        let mut rx = endpoint();
        let messages = rx.parse_bytes(&bytes);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].crc_ok);
        assert_eq!(messages[0].message_name, "HEARTBEAT");
        assert_eq!(messages[0].sequence, 42);
    }

    #[test]
    fn protocol_version_wire_order() {
        let spec_hash = [0xaau8, 0x99, 0x88, 0x77, 0x66, 0x55, 0x44, 0x33];
        let library_hash = [0x33u8, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa];
        let msg = OutgoingMessage::new("PROTOCOL_VERSION")
            .field("version", 200u16)
            .field("min_version", 100u16)
            .field("max_version", 300u16)
            .field("spec_version_hash", byte_array(&spec_hash))
            .field("library_version_hash", byte_array(&library_hash));

        let bytes = endpoint().serialize_message(&msg).unwrap();
        // id 300 forces MAVLink 2
        assert_eq!(bytes[0], 0xfd);
        let payload = &bytes[10..bytes.len() - 2];
        assert_eq!(payload.len(), 22);
        assert_eq!(&payload[..6], &[0xc8, 0x00, 0x64, 0x00, 0x2c, 0x01]);
        assert_eq!(&payload[6..14], &spec_hash);
        assert_eq!(&payload[14..22], &library_hash);
    }

    #[test]
    fn param_value_element_size_sort() {
        let msg = OutgoingMessage::new("PARAM_VALUE")
            .field("param_id", "RATE_PIT_P")
            .field("param_value", 0.15f32)
            .field("param_type", 9u8)
            .field("param_count", 300u16)
            .field("param_index", 42u16);

        let bytes = endpoint().serialize_message(&msg).unwrap();
        let payload = &bytes[6..bytes.len() - 2];
        assert_eq!(payload.len(), 25);
        assert_eq!(&payload[..4], &0.15f32.to_le_bytes());
        assert_eq!(&payload[4..6], &300u16.to_le_bytes());
        assert_eq!(&payload[6..8], &42u16.to_le_bytes());
        assert_eq!(&payload[8..24], b"RATE_PIT_P\0\0\0\0\0\0");
        assert_eq!(payload[24], 9);
    }

    #[test]
    fn v2_truncation_stops_at_core() {
        // SYS_STATUS: 31 core bytes, three uint32 extensions. With only
        // the first extension non-zero, the trailing two are trimmed.
        let msg = OutgoingMessage {
            protocol_version: Some(MavVersion::V2),
            ..OutgoingMessage::new("SYS_STATUS")
                .field("onboard_control_sensors_present_extended", 0xffff_ffffu32)
        };
        let bytes = endpoint().serialize_message(&msg).unwrap();
        assert_eq!(bytes[1], 35, "31 core + 4 first-extension bytes");

        // an extension-free message is never truncated
        let msg = OutgoingMessage {
            protocol_version: Some(MavVersion::V2),
            ..OutgoingMessage::new("HEARTBEAT")
        };
        let bytes = endpoint().serialize_message(&msg).unwrap();
        assert_eq!(bytes[1], 9);
    }

    #[test]
    fn corrupt_frame_still_decodes() {
        let mut bytes = endpoint().serialize_message(&heartbeat()).unwrap();
        bytes[10] ^= 0x01; // inside the payload
        let mut rx = endpoint();
        let messages = rx.parse_bytes(&bytes);
        assert_eq!(messages.len(), 1);
        assert!(!messages[0].crc_ok);
        assert_eq!(messages[0].message_name, "HEARTBEAT");
        // payload still decodes field-for-field
        assert!(messages[0].payload.contains_key("custom_mode"));
    }

    #[test]
    fn resynchronizes_after_noise() {
        let mut input = vec![0x00, 0x00, 0xff, 0x42];
        input.extend_from_slice(&endpoint().serialize_message(&heartbeat()).unwrap());

        let mut rx = endpoint();
        let messages = rx.parse_bytes(&input);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].crc_ok);
    }

    #[test]
    fn byte_at_a_time_streaming() {
        let bytes = endpoint().serialize_message(&heartbeat()).unwrap();
        let mut rx = endpoint();
        for &b in &bytes[..bytes.len() - 1] {
            assert!(rx.parse_bytes(&[b]).is_empty());
        }
        let messages = rx.parse_bytes(&bytes[bytes.len() - 1..]);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].crc_ok);
    }

    #[test]
    fn two_frames_one_call() {
        let ep = endpoint();
        let mut input = ep.serialize_message(&heartbeat()).unwrap();
        let second = OutgoingMessage {
            sequence: Some(43),
            ..OutgoingMessage::new("SYSTEM_TIME")
                .field("time_unix_usec", 1_700_000_000_000_000u64)
                .field("time_boot_ms", 123u32)
        };
        input.extend_from_slice(&ep.serialize_message(&second).unwrap());

        let mut rx = endpoint();
        let messages = rx.parse_bytes(&input);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].message_name, "HEARTBEAT");
        assert_eq!(messages[1].message_name, "SYSTEM_TIME");
        assert_eq!(
            messages[1].payload["time_unix_usec"],
            Value::UInt64(1_700_000_000_000_000)
        );
    }

    #[test]
    fn unknown_id_becomes_raw_message() {
        // a catalog that knows id 99, used only to emit the frame
        let tx_dialect = crate::protocol::Dialect::builder("tx")
            .message(
                crate::protocol::MessageDefinition::new(
                    99,
                    "PRIVATE",
                    vec![crate::protocol::FieldDefinition::scalar(
                        "x",
                        crate::protocol::PrimitiveType::UInt16,
                    )],
                ),
                77,
            )
            .build();
        let tx = Endpoint::new(tx_dialect);
        let bytes = tx
            .serialize_message(&OutgoingMessage::new("PRIVATE").field("x", 0x1234u16))
            .unwrap();

        let mut rx = endpoint();
        let messages = rx.parse_bytes(&bytes);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_name, "UNKNOWN_99");
        // unknown ids cannot be checksummed against the catalog
        assert!(!messages[0].crc_ok);
        assert_eq!(
            messages[0].payload["raw_payload"],
            Value::Bytes(vec![0x34, 0x12])
        );
    }

    #[test]
    fn partial_input_is_retained_and_resettable() {
        let bytes = endpoint().serialize_message(&heartbeat()).unwrap();

        let mut rx = endpoint();
        assert!(rx.parse_bytes(&bytes[..5]).is_empty());
        assert_eq!(rx.parse_bytes(&bytes[5..]).len(), 1);

        let mut rx = endpoint();
        assert!(rx.parse_bytes(&bytes[..5]).is_empty());
        rx.reset_buffer();
        // the tail alone no longer forms a frame
        assert!(rx.parse_bytes(&bytes[5..]).is_empty());
    }

    #[test]
    fn complete_message_fills_defaults() {
        let ep = endpoint();
        let msg = OutgoingMessage::new("HEARTBEAT").field("type", 6u8);
        let completed = ep.complete_message(&msg).unwrap();
        assert_eq!(completed.payload.len(), 6);
        assert_eq!(completed.payload["type"], Value::UInt8(6));
        assert_eq!(completed.payload["custom_mode"], Value::UInt32(0));
        assert_eq!(completed.payload["mavlink_version"], Value::UInt8(0));
    }

    #[test]
    fn serialize_failures() {
        let ep = endpoint();

        let err = ep
            .serialize_message(&OutgoingMessage::new("NOT_A_MESSAGE"))
            .unwrap_err();
        assert_eq!(err, EncodeError::UnknownMessage("NOT_A_MESSAGE".to_owned()));

        let err = ep
            .serialize_message(&OutgoingMessage::new("HEARTBEAT").field("type", "six"))
            .unwrap_err();
        assert!(matches!(err, EncodeError::MalformedMessage { .. }));
    }

    #[test]
    fn registry_accessors() {
        let ep = endpoint();
        let ids = ep.supported_ids();
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids sorted ascending");
        assert!(ids.contains(&0));
        assert!(ids.contains(&300));
        assert!(ep.supports_name("SYS_STATUS"));
        assert!(!ep.supports_id(9999));
        assert_eq!(ep.definition_by_name("HEARTBEAT").map(|d| d.id()), Some(0));
        assert_eq!(
            ep.definition_by_id(22).map(|d| d.name().to_owned()),
            Some("PARAM_VALUE".to_owned())
        );
    }

    #[derive(Debug, Clone)]
    struct HeartbeatFields {
        kind: u8,
        autopilot: u8,
        base_mode: u8,
        custom_mode: u32,
        system_status: u8,
        mavlink_version: u8,
    }

    impl Arbitrary for HeartbeatFields {
        fn arbitrary(g: &mut Gen) -> Self {
            Self {
                kind: u8::arbitrary(g),
                autopilot: u8::arbitrary(g),
                base_mode: u8::arbitrary(g),
                custom_mode: u32::arbitrary(g),
                system_status: u8::arbitrary(g),
                mavlink_version: u8::arbitrary(g),
            }
        }
    }

    fn roundtrip(msg: &OutgoingMessage) -> bool {
        let ep = endpoint();
        let bytes = match ep.serialize_message(msg) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        let mut rx = endpoint();
        let messages = rx.parse_bytes(&bytes);
        if messages.len() != 1 || !messages[0].crc_ok {
            return false;
        }
        let completed = match ep.complete_message(msg) {
            Ok(completed) => completed,
            Err(_) => return false,
        };
        messages[0].payload == completed.payload
    }

    #[quickcheck]
    fn roundtrip_heartbeat(h: HeartbeatFields, v2: bool) -> bool {
        let msg = OutgoingMessage {
            protocol_version: Some(if v2 { MavVersion::V2 } else { MavVersion::V1 }),
            ..OutgoingMessage::new("HEARTBEAT")
                .field("type", h.kind)
                .field("autopilot", h.autopilot)
                .field("base_mode", h.base_mode)
                .field("custom_mode", h.custom_mode)
                .field("system_status", h.system_status)
                .field("mavlink_version", h.mavlink_version)
        };
        roundtrip(&msg)
    }

    #[quickcheck]
    fn roundtrip_sys_status_extensions(a: u32, b: u32, c: u32) -> bool {
        // arbitrary extension values exercise every truncation point
        let msg = OutgoingMessage {
            protocol_version: Some(MavVersion::V2),
            ..OutgoingMessage::new("SYS_STATUS")
                .field("onboard_control_sensors_present_extended", a)
                .field("onboard_control_sensors_enabled_extended", b)
                .field("onboard_control_sensors_health_extended", c)
        };
        roundtrip(&msg)
    }

    #[quickcheck]
    fn sys_status_never_loses_core_bytes(a: u32, b: u32, c: u32) -> bool {
        let msg = OutgoingMessage {
            protocol_version: Some(MavVersion::V2),
            ..OutgoingMessage::new("SYS_STATUS")
                .field("onboard_control_sensors_present_extended", a)
                .field("onboard_control_sensors_enabled_extended", b)
                .field("onboard_control_sensors_health_extended", c)
        };
        let bytes = endpoint().serialize_message(&msg).unwrap();
        // header(10) + core(31) + checksum(2) is the floor
        bytes.len() >= 43 && bytes[1] >= 31
    }

    #[quickcheck]
    fn roundtrip_param_value(name: String, value: f32, index: u16) -> bool {
        if !value.is_finite() {
            return true; // NaN payloads cannot compare equal
        }
        // NUL terminates a char array on the wire, so keep it out of the input
        let name: String = name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(16)
            .collect();
        let msg = OutgoingMessage::new("PARAM_VALUE")
            .field("param_id", name)
            .field("param_value", value)
            .field("param_index", index);
        roundtrip(&msg)
    }
}

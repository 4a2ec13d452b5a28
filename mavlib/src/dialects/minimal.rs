//! The minimal dialect: just enough to identify a peer.

use crate::protocol::PrimitiveType::*;
use crate::protocol::{Dialect, FieldDefinition, MessageDefinition};

/// HEARTBEAT and PROTOCOL_VERSION.
pub fn minimal() -> Dialect {
    Dialect::builder("minimal")
        .message(heartbeat(), 50)
        .message(protocol_version(), 217)
        .build()
}

fn heartbeat() -> MessageDefinition {
    MessageDefinition::new(
        0,
        "HEARTBEAT",
        vec![
            FieldDefinition::scalar("type", UInt8),
            FieldDefinition::scalar("autopilot", UInt8),
            FieldDefinition::scalar("base_mode", UInt8),
            FieldDefinition::scalar("custom_mode", UInt32),
            FieldDefinition::scalar("system_status", UInt8),
            FieldDefinition::scalar("mavlink_version", UInt8),
        ],
    )
}

fn protocol_version() -> MessageDefinition {
    MessageDefinition::new(
        300,
        "PROTOCOL_VERSION",
        vec![
            FieldDefinition::scalar("version", UInt16),
            FieldDefinition::scalar("min_version", UInt16),
            FieldDefinition::scalar("max_version", UInt16),
            FieldDefinition::array("spec_version_hash", UInt8, 8),
            FieldDefinition::array("library_version_hash", UInt8, 8),
        ],
    )
}

//! The MAVLink wire protocol: framing, checksums, and the payload
//! codec, parameterized by a dialect catalog.

/// Start byte of a v1 frame.
pub const MAGIC_V1: u8 = 0xfe;

/// Start byte of a v2 frame.
pub const MAGIC_V2: u8 = 0xfd;

/// Frame checksum width.
pub const CHECKSUM_LEN: usize = 2;

/// Width of the v2 signature block, carried but never produced.
pub const SIGNATURE_LEN: usize = 13;

/// Largest frame on the wire: a signed v2 frame with a full payload.
pub const MAX_FRAME_SIZE: usize = 280;

pub mod crc;

pub mod dialect;
pub use dialect::{
    Dialect, DialectBuilder, DialectError, FieldDefinition, MessageDefinition, PrimitiveType,
};

pub mod codec;
pub use codec::{EncodeError, Value};

pub mod frame;
pub use frame::{create_frame, parse_frame, Frame};

pub mod serialize;
pub use serialize::{Serializer, SerializerCrc, SerializerVec};

/// The two MAVLink framings. v1 caps message ids at 255 and knows no
/// extension fields; v2 carries 24-bit ids, flags, truncation, and an
/// optional signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MavVersion {
    V1,
    V2,
}

impl std::fmt::Display for MavVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MavVersion::V1 => f.write_str("MAVLink 1"),
            MavVersion::V2 => f.write_str("MAVLink 2"),
        }
    }
}

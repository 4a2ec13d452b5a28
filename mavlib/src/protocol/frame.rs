//! Frame extraction and assembly.
//!
//! [parse_frame] follows the consumed-bytes contract: it reports how
//! many leading bytes of the input it is done with, whether or not a
//! frame came out. Junk before a magic byte is consumed, a frame that
//! needs more data is not, and a frame with a bad checksum is consumed
//! and emitted anyway with `crc_ok = false` so the stream always
//! re-synchronizes.

use std::collections::HashMap;

use void::ResultVoidExt;

use super::serialize::{Serializer, SerializerCrc, SerializerVec};
use super::{
    crc, MavVersion, CHECKSUM_LEN, MAGIC_V1, MAGIC_V2, SIGNATURE_LEN,
};

/// A single MAVLink frame, v1 or v2, as found on the wire.
///
/// The payload is owned; a frame outlives the stream buffer it was cut
/// from. A v2 signature block is carried through verbatim, never
/// produced or checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub version: MavVersion,
    /// v2 only; bit 0 flags a signed frame. Zero on v1 frames.
    pub incompat_flags: u8,
    /// v2 only. Zero on v1 frames.
    pub compat_flags: u8,
    pub sequence: u8,
    pub system_id: u8,
    pub component_id: u8,
    pub message_id: u32,
    pub payload: Vec<u8>,
    pub checksum: u16,
    pub signature: Option<[u8; SIGNATURE_LEN]>,
    /// Whether the checksum matched under the dialect's CRC_EXTRA
    /// table. False also covers ids absent from the table.
    pub crc_ok: bool,
}

impl Frame {
    pub fn magic(&self) -> u8 {
        self.version.magic()
    }

    pub fn payload_length(&self) -> u8 {
        self.payload.len() as u8
    }

    pub fn is_signed(&self) -> bool {
        self.incompat_flags & 0x01 != 0
    }
}

impl MavVersion {
    pub fn magic(self) -> u8 {
        match self {
            MavVersion::V1 => MAGIC_V1,
            MavVersion::V2 => MAGIC_V2,
        }
    }

    /// Header length including the magic byte.
    pub fn header_len(self) -> usize {
        match self {
            MavVersion::V1 => 6,
            MavVersion::V2 => 10,
        }
    }

    /// Smallest complete frame: header plus checksum.
    pub fn min_frame_len(self) -> usize {
        self.header_len() + CHECKSUM_LEN
    }
}

fn read_le_u16(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

/// Locate and cut one frame out of `bytes`.
///
/// Returns the number of consumed bytes and the frame, if a complete
/// one was found. Consumed bytes include any junk skipped before the
/// frame. `(0, None)` means the input holds the start of a possible
/// frame and more data is needed; a non-zero count with `None` means
/// junk was discarded.
pub fn parse_frame(bytes: &[u8], crc_table: &HashMap<u32, u8>) -> (usize, Option<Frame>) {
    // not enough for any frame, even with a magic at index 0
    if bytes.len() < MavVersion::V1.min_frame_len() {
        return (0, None);
    }

    // hunt for a magic byte; everything before it is noise
    let offset = match bytes
        .iter()
        .position(|&b| b == MAGIC_V1 || b == MAGIC_V2)
    {
        Some(offset) => offset,
        None => return (bytes.len(), None),
    };
    if offset > 0 {
        tracing::trace!(skipped = offset, "noise before frame start");
    }

    let rest = &bytes[offset..];
    let version = if rest[0] == MAGIC_V2 {
        MavVersion::V2
    } else {
        MavVersion::V1
    };

    if rest.len() < version.min_frame_len() {
        return (offset, None);
    }

    let payload_len = rest[1] as usize;
    let (incompat_flags, compat_flags, sequence, system_id, component_id, message_id) =
        match version {
            MavVersion::V1 => (0, 0, rest[2], rest[3], rest[4], u32::from(rest[5])),
            MavVersion::V2 => (
                rest[2],
                rest[3],
                rest[4],
                rest[5],
                rest[6],
                u32::from(rest[7]) | u32::from(rest[8]) << 8 | u32::from(rest[9]) << 16,
            ),
        };

    let checksum_start = version.header_len() + payload_len;
    let mut frame_len = checksum_start + CHECKSUM_LEN;
    if rest.len() < frame_len {
        return (offset, None);
    }

    let payload = rest[version.header_len()..checksum_start].to_vec();
    let checksum = read_le_u16(&rest[checksum_start..]);

    let signed = version == MavVersion::V2 && incompat_flags & 0x01 != 0;
    let signature = if signed {
        if rest.len() < frame_len + SIGNATURE_LEN {
            return (offset, None);
        }
        let mut sig = [0u8; SIGNATURE_LEN];
        sig.copy_from_slice(&rest[frame_len..frame_len + SIGNATURE_LEN]);
        frame_len += SIGNATURE_LEN;
        Some(sig)
    } else {
        None
    };

    let crc_ok = crc::validate_with_table(&rest[1..checksum_start], message_id, checksum, crc_table);
    if !crc_ok {
        tracing::debug!(message_id, "frame failed checksum");
    }

    let frame = Frame {
        version,
        incompat_flags,
        compat_flags,
        sequence,
        system_id,
        component_id,
        message_id,
        payload,
        checksum,
        signature,
        crc_ok,
    };

    (offset + frame_len, Some(frame))
}

/// Assemble an outgoing frame around an already-encoded payload.
///
/// A message id above the v1 range forces a v2 frame regardless of the
/// requested version. Incompat/compat flags always emit as zero:
/// signing is not produced.
pub fn create_frame(
    message_id: u32,
    payload: &[u8],
    system_id: u8,
    component_id: u8,
    sequence: u8,
    crc_extra: u8,
    version: MavVersion,
) -> Vec<u8> {
    let version = if message_id > 0xff {
        MavVersion::V2
    } else {
        version
    };

    let mut ser = SerializerVec::new();
    ser.write_u8(version.magic()).void_unwrap();

    // the checksum covers everything after the magic
    let mut ser = SerializerCrc::new(ser);
    ser.write_u8(payload.len() as u8).void_unwrap();
    if version == MavVersion::V2 {
        ser.write_u8(0).void_unwrap(); // incompat_flags
        ser.write_u8(0).void_unwrap(); // compat_flags
    }
    ser.write_u8(sequence).void_unwrap();
    ser.write_u8(system_id).void_unwrap();
    ser.write_u8(component_id).void_unwrap();
    match version {
        MavVersion::V1 => ser.write_u8(message_id as u8).void_unwrap(),
        MavVersion::V2 => {
            ser.write_u8(message_id as u8).void_unwrap();
            ser.write_u8((message_id >> 8) as u8).void_unwrap();
            ser.write_u8((message_id >> 16) as u8).void_unwrap();
        }
    }
    ser.write_bytes(payload).void_unwrap();

    let (checksum, mut ser) = ser.finalize_with(crc_extra);
    ser.write_le_u16(checksum).void_unwrap();
    ser.done()
}

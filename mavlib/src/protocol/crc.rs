//! The MAVLink frame checksum: CRC-16/MCRF4XX seeded with a
//! per-message CRC_EXTRA byte.
//!
//! The checksum covers every frame byte after the magic, through the
//! last payload byte, plus one final virtual byte carrying the
//! message's CRC_EXTRA. Endpoints with mismatched message definitions
//! therefore disagree on every checksum and never accept each other's
//! frames by accident.

use std::collections::HashMap;

use crc::{Crc, CRC_16_MCRF4XX};

/// Poly 0x1021 reflected, init 0xFFFF, no final XOR.
static MCRF4XX: Crc<u16> = Crc::<u16>::new(&CRC_16_MCRF4XX);

/// A running MCRF4XX digest over frame bytes.
pub fn digest() -> crc::Digest<'static, u16> {
    MCRF4XX.digest()
}

/// Checksum `bytes` followed by the virtual CRC_EXTRA byte.
pub fn calculate(bytes: &[u8], crc_extra: u8) -> u16 {
    let mut digest = MCRF4XX.digest();
    digest.update(bytes);
    digest.update(&[crc_extra]);
    digest.finalize()
}

/// Whether `received` matches the checksum of `bytes` under `crc_extra`.
pub fn validate(bytes: &[u8], crc_extra: u8, received: u16) -> bool {
    calculate(bytes, crc_extra) == received
}

/// Validate against a dialect's `id -> crc_extra` table. An id absent
/// from the table fails validation; the caller reports the frame with
/// `crc_ok = false` rather than dropping it.
pub fn validate_with_table(
    bytes: &[u8],
    message_id: u32,
    received: u16,
    table: &HashMap<u32, u8>,
) -> bool {
    table
        .get(&message_id)
        .map_or(false, |&crc_extra| validate(bytes, crc_extra, received))
}

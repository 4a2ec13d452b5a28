//! A MAVLink v1/v2 protocol engine.
//!
//! The engine is a bidirectional codec: it cuts structured messages
//! out of a raw byte stream and turns structured messages back into
//! wire frames, byte-for-byte compatible with existing MAVLink
//! implementations. It is parameterized by a [protocol::Dialect]
//! catalog and carries no transport; feed it bytes from whatever
//! serial or UDP link you own.
//!
//! ```
//! use mavlib::{dialects, Endpoint, OutgoingMessage};
//!
//! let tx = Endpoint::new(dialects::common());
//! let bytes = tx
//!     .serialize_message(
//!         &OutgoingMessage::new("HEARTBEAT")
//!             .field("type", 6u8)
//!             .field("custom_mode", 12345u32),
//!     )
//!     .unwrap();
//!
//! let mut rx = Endpoint::new(dialects::common());
//! let messages = rx.parse_bytes(&bytes);
//! assert_eq!(messages[0].message_name, "HEARTBEAT");
//! assert!(messages[0].crc_ok);
//! ```

mod buffer;
pub use buffer::*;

mod endpoint;
pub use endpoint::*;

pub mod dialects;

pub mod protocol;
pub use protocol::{Dialect, EncodeError, MavVersion, Value};

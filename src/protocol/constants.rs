//! Protocol constants
//!
//! The Frame exposes a single BLE service with two characteristics: a TX
//! characteristic the host writes to and an RX characteristic the device
//! notifies on. Writes are interpreted by the first byte:
//!
//! ```text
//! 0x01 <msg_code> <payload...>   data message chunk (routed to the Lua app)
//! 0x03                           break signal (stop the running app)
//! 0x04                           reset signal (clear Lua state)
//! anything else                  UTF-8 Lua string, executed by the REPL
//! ```
//!
//! Notifications mirror this: a leading 0x01 marks app data, anything else
//! is a printed string from the device.

use uuid::Uuid;

/// Frame BLE service
pub const FRAME_SERVICE_UUID: Uuid = Uuid::from_u128(0x7A230001_5475_A6A4_654C_8431F6AD49C4);

/// Write characteristic (host → device)
pub const FRAME_TX_CHAR_UUID: Uuid = Uuid::from_u128(0x7A230002_5475_A6A4_654C_8431F6AD49C4);

/// Notify characteristic (device → host)
pub const FRAME_RX_CHAR_UUID: Uuid = Uuid::from_u128(0x7A230003_5475_A6A4_654C_8431F6AD49C4);

/// First byte of every data message chunk
pub const DATA_MARKER: u8 = 0x01;

/// Stop the running Lua app
pub const BREAK_SIGNAL: u8 = 0x03;

/// Clear Lua state on the device
pub const RESET_SIGNAL: u8 = 0x04;

/// Message code for ImageSpriteBlock traffic
pub const SPRITE_BLOCK_MSG: u8 = 0x20;

/// Default maximum bytes per BLE write.
///
/// The Frame negotiates an MTU of 251, leaving 240-odd bytes of usable
/// payload after the ATT header. 240 is safe on every platform.
pub const DEFAULT_MAX_PAYLOAD: usize = 240;

/// Overhead of the first chunk of a message: marker, code, length (u16)
pub const FIRST_CHUNK_OVERHEAD: usize = 4;

/// Overhead of continuation chunks: marker, code
pub const CHUNK_OVERHEAD: usize = 2;

/// Length of a packed ImageSpriteBlock header
pub const BLOCK_HEADER_LEN: usize = 8;

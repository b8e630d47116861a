//! Frame wire protocol
//!
//! This module owns everything that goes over the air:
//! - Control bytes and UUIDs ([`constants`])
//! - Chunked data message framing ([`framing`])
//! - ImageSpriteBlock packing ([`block`])
//!
//! The BLE transport itself lives in [`crate::device`].

pub mod block;
pub mod constants;
pub mod framing;

pub use block::SpriteBlock;
pub use framing::frame_message;

//! Frame device access
//!
//! [`ble`] owns discovery, connection and characteristic I/O via btleplug;
//! [`frame`] layers the device conversation on top: Lua REPL commands,
//! data messages, file upload and the embedded receiver app.

pub mod ble;
pub mod frame;

pub use ble::BleTransport;
pub use frame::FrameDevice;

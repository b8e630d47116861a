//! Frame device conversation
//!
//! High-level API over the BLE transport: Lua REPL commands, data message
//! transmission, receiver app upload and start, break/reset signals.
//!
//! Printed strings from the device (REPL results, the app's ready line)
//! are forwarded through an internal channel; data notifications are
//! ignored since this tool only streams outward.

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::config::StreamConfig;
use crate::error::{DeviceError, Result};
use crate::protocol::constants::{BREAK_SIGNAL, DATA_MARKER, RESET_SIGNAL};
use crate::protocol::framing::frame_message;

use super::ble::{BleTransport, Notifications};

/// The embedded receiver app
pub const SPRITE_PLAYER_SOURCE: &str = include_str!("sprite_player.lua");

/// On-device file name for the receiver app
pub const SPRITE_PLAYER_NAME: &str = "sprite_player.lua";

/// Line the receiver app prints once it is accepting data
pub const APP_READY_PRINT: &str = "sprite player ready";

/// A connected Frame device
pub struct FrameDevice {
    transport: BleTransport,
    responses: mpsc::Receiver<String>,
    max_payload: usize,
    response_timeout: Duration,
}

impl FrameDevice {
    /// Connect to a Frame device per the config
    pub async fn connect(config: &StreamConfig) -> Result<Self> {
        let (transport, notifications) = BleTransport::connect(config).await?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(forward_responses(notifications, tx));

        Ok(Self {
            transport,
            responses: rx,
            max_payload: config.max_payload,
            response_timeout: config.response_timeout,
        })
    }

    /// Send a Lua string for the REPL to execute (fire and forget)
    pub async fn send_lua(&self, code: &str) -> Result<()> {
        if code.len() > self.max_payload {
            return Err(DeviceError::CommandTooLong(code.len()).into());
        }
        trace!(code, "send_lua");
        self.transport.write(code.as_bytes()).await
    }

    /// Send a Lua string and wait for an exact printed reply.
    ///
    /// Stale prints from earlier commands are drained and logged.
    pub async fn send_lua_expect(&mut self, code: &str, expect: &str) -> Result<()> {
        self.send_lua(code).await?;
        self.await_print(expect, self.response_timeout).await
    }

    /// Wait until the device prints `expect`
    pub async fn await_print(&mut self, expect: &str, wait: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let reply = timeout(remaining, self.responses.recv())
                .await
                .map_err(|_| DeviceError::ResponseTimeout(expect.to_string()))?
                .ok_or(DeviceError::Disconnected)?;

            if reply == expect {
                return Ok(());
            }
            debug!(reply, "Unexpected device print");
        }
    }

    /// Send a data message, chunked to the BLE payload limit
    pub async fn send_message(&self, msg_code: u8, payload: &[u8]) -> Result<()> {
        for chunk in frame_message(msg_code, payload, self.max_payload)? {
            self.transport.write(&chunk).await?;
        }
        Ok(())
    }

    /// Stop the running Lua app
    pub async fn send_break_signal(&self) -> Result<()> {
        self.transport.write(&[BREAK_SIGNAL]).await
    }

    /// Clear Lua state on the device
    pub async fn send_reset_signal(&self) -> Result<()> {
        self.transport.write(&[RESET_SIGNAL]).await
    }

    /// Upload the embedded sprite player app to the device
    pub async fn upload_sprite_player(&mut self) -> Result<()> {
        self.upload_file(SPRITE_PLAYER_NAME, SPRITE_PLAYER_SOURCE).await
    }

    /// Write a file to device flash via REPL commands.
    ///
    /// Each write is acknowledged with a print so the REPL buffer never
    /// overflows.
    pub async fn upload_file(&mut self, name: &str, content: &str) -> Result<()> {
        debug!(name, bytes = content.len(), "Uploading file");

        self.send_lua_expect(
            &format!("f=frame.file.open('{}','w');print(1)", name),
            "1",
        )
        .await?;

        let budget = self
            .max_payload
            .saturating_sub("f:write('');print(1)".len());
        for chunk in escape_chunks(content, budget) {
            self.send_lua_expect(&format!("f:write('{}');print(1)", chunk), "1")
                .await?;
        }

        self.send_lua_expect("f:close();print(1)", "1").await
    }

    /// Start the uploaded app and wait for its ready line.
    ///
    /// `require` does not return while the app loop runs, so this is fire
    /// and forget followed by a wait on the app's own print.
    pub async fn start_sprite_player(&mut self, wait: Duration) -> Result<()> {
        self.send_lua(&format!(
            "require('{}')",
            SPRITE_PLAYER_NAME.trim_end_matches(".lua")
        ))
        .await?;
        self.await_print(APP_READY_PRINT, wait).await
    }

    /// Whether the device is still connected
    pub async fn is_connected(&self) -> bool {
        self.transport.is_connected().await
    }

    /// Disconnect from the device
    pub async fn disconnect(&self) -> Result<()> {
        self.transport.disconnect().await
    }
}

/// Forward printed strings from the notification stream.
///
/// Data notifications (leading 0x01) are not expected in this direction
/// and are dropped.
async fn forward_responses(mut notifications: Notifications, tx: mpsc::Sender<String>) {
    while let Some(notification) = notifications.next().await {
        let value = notification.value;
        if value.first() == Some(&DATA_MARKER) {
            trace!(len = value.len(), "Ignoring data notification");
            continue;
        }
        let text = String::from_utf8_lossy(&value).trim().to_string();
        if text.is_empty() {
            continue;
        }
        if tx.send(text).await.is_err() {
            break;
        }
    }
}

/// Escape a string for inclusion in a single-quoted Lua literal
pub fn escape_lua(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7E => out.push(b as char),
            // Three digits always, so a trailing digit in the input
            // cannot extend the escape when Lua lexes it back
            other => out.push_str(&format!("\\{:03}", other)),
        }
    }
    out
}

/// Split `content` into escaped chunks whose escaped length fits `budget`
fn escape_chunks(content: &str, budget: usize) -> Vec<String> {
    let budget = budget.max(4); // room for at least one escaped byte
    let mut chunks = Vec::new();
    let mut current = String::new();

    for ch in content.chars() {
        let escaped = escape_lua(&ch.to_string());
        if current.len() + escaped.len() > budget {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(&escaped);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_lua_plain() {
        assert_eq!(escape_lua("print(1)"), "print(1)");
    }

    #[test]
    fn test_escape_lua_specials() {
        assert_eq!(escape_lua("a'b"), "a\\'b");
        assert_eq!(escape_lua("a\\b"), "a\\\\b");
        assert_eq!(escape_lua("a\nb"), "a\\nb");
        assert_eq!(escape_lua("a\tb"), "a\\tb");
    }

    #[test]
    fn test_escape_lua_control_bytes() {
        assert_eq!(escape_lua("\u{1}"), "\\001");
        assert_eq!(escape_lua("\u{1f}"), "\\031");
    }

    #[test]
    fn test_escape_lua_control_byte_before_digit() {
        // Lua reads up to three digits per decimal escape, so the
        // escape must not absorb a following literal digit
        assert_eq!(escape_lua("\u{1}23"), "\\00123");
        assert_eq!(lua_unescape(&escape_lua("\u{1}23")), vec![0x01, b'2', b'3']);
    }

    // Decodes a single-quoted Lua string body the way the Lua lexer does
    fn lua_unescape(s: &str) -> Vec<u8> {
        let mut out = Vec::new();
        let mut bytes = s.bytes().peekable();
        while let Some(b) = bytes.next() {
            if b != b'\\' {
                out.push(b);
                continue;
            }
            match bytes.next() {
                Some(b'n') => out.push(b'\n'),
                Some(b'r') => out.push(b'\r'),
                Some(b't') => out.push(b'\t'),
                Some(d @ b'0'..=b'9') => {
                    let mut value = (d - b'0') as u16;
                    for _ in 0..2 {
                        match bytes.peek() {
                            Some(d @ b'0'..=b'9') => {
                                value = value * 10 + (d - b'0') as u16;
                                bytes.next();
                            }
                            _ => break,
                        }
                    }
                    out.push(value as u8);
                }
                Some(other) => out.push(other),
                None => {}
            }
        }
        out
    }

    #[test]
    fn test_escape_lua_round_trip() {
        let input = "a'b\\c\nd\u{1}e\u{7f}5";
        assert_eq!(lua_unescape(&escape_lua(input)), input.as_bytes());
    }

    #[test]
    fn test_escape_chunks_fit_budget() {
        let content = "line one\nline 'two'\\end\n".repeat(40);
        let chunks = escape_chunks(&content, 100);

        for chunk in &chunks {
            assert!(chunk.len() <= 100);
            // No chunk ends mid-escape
            assert!(!chunk.ends_with('\\') || chunk.ends_with("\\\\"));
        }

        // Unescaping the concatenation recovers the input
        let joined = chunks.concat();
        let unescaped = joined
            .replace("\\\\", "\u{0}")
            .replace("\\n", "\n")
            .replace("\\'", "'")
            .replace("\u{0}", "\\");
        assert_eq!(unescaped, content);
    }

    #[test]
    fn test_escape_chunks_empty() {
        assert!(escape_chunks("", 100).is_empty());
    }

    #[test]
    fn test_sprite_player_source_embedded() {
        assert!(SPRITE_PLAYER_SOURCE.contains("frame.bluetooth.receive_callback"));
        assert!(SPRITE_PLAYER_SOURCE.contains(APP_READY_PRINT));
    }
}

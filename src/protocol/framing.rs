//! Data message framing
//!
//! A message (code + payload) larger than one BLE write is split into
//! chunks. The receiver accumulates chunks per message code until the
//! declared total length has arrived.
//!
//! ```text
//! First chunk:
//! +------+----------+---------------+-----------------+
//! | 0x01 | MsgCode  | TotalLen (2)  | Payload bytes   |
//! +------+----------+---------------+-----------------+
//!
//! Continuation chunks:
//! +------+----------+------------------------------+
//! | 0x01 | MsgCode  | Payload bytes                |
//! +------+----------+------------------------------+
//! ```
//! TotalLen is the full payload length, big-endian. Payloads above
//! `u16::MAX` bytes cannot be framed.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CodecError, Result};

use super::constants::{CHUNK_OVERHEAD, DATA_MARKER, FIRST_CHUNK_OVERHEAD};

/// Split a message into BLE-sized chunks.
///
/// `max_payload` is the maximum bytes per write, including the data
/// marker and message code.
pub fn frame_message(msg_code: u8, payload: &[u8], max_payload: usize) -> Result<Vec<Bytes>> {
    if payload.len() > u16::MAX as usize {
        return Err(CodecError::PayloadTooLarge(payload.len()).into());
    }
    if max_payload <= FIRST_CHUNK_OVERHEAD {
        return Err(CodecError::MaxPayloadTooSmall(max_payload).into());
    }

    let first_capacity = max_payload - FIRST_CHUNK_OVERHEAD;
    let cont_capacity = max_payload - CHUNK_OVERHEAD;

    let mut chunks = Vec::new();
    let first_len = payload.len().min(first_capacity);

    let mut buf = BytesMut::with_capacity(FIRST_CHUNK_OVERHEAD + first_len);
    buf.put_u8(DATA_MARKER);
    buf.put_u8(msg_code);
    buf.put_u16(payload.len() as u16);
    buf.put_slice(&payload[..first_len]);
    chunks.push(buf.freeze());

    let mut offset = first_len;
    while offset < payload.len() {
        let len = (payload.len() - offset).min(cont_capacity);
        let mut buf = BytesMut::with_capacity(CHUNK_OVERHEAD + len);
        buf.put_u8(DATA_MARKER);
        buf.put_u8(msg_code);
        buf.put_slice(&payload[offset..offset + len]);
        chunks.push(buf.freeze());
        offset += len;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_single_chunk() {
        let chunks = frame_message(0x20, &[1, 2, 3], 240).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0][..], &[0x01, 0x20, 0x00, 0x03, 1, 2, 3]);
    }

    #[test]
    fn test_empty_payload() {
        let chunks = frame_message(0x20, &[], 240).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0][..], &[0x01, 0x20, 0x00, 0x00]);
    }

    #[test]
    fn test_exact_first_chunk_boundary() {
        // 236 payload bytes fit exactly in the first chunk at max_payload 240
        let payload = vec![0xAA; 236];
        let chunks = frame_message(0x20, &payload, 240).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 240);
    }

    #[test]
    fn test_multi_chunk_split() {
        let payload = vec![0xAA; 500];
        let chunks = frame_message(0x20, &payload, 240).unwrap();

        // 236 + 238 + 26
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 240);
        assert_eq!(chunks[1].len(), 240);
        assert_eq!(chunks[2].len(), 28);

        // Length header counts the payload only
        assert_eq!(&chunks[0][2..4], &[0x01, 0xF4]);
        // Continuation chunks carry marker + code only
        assert_eq!(&chunks[1][..2], &[0x01, 0x20]);

        let total: usize = chunks.iter().map(|c| c.len()).sum();
        assert_eq!(total, 500 + 4 + 2 * 2);
    }

    #[test]
    fn test_chunks_reassemble() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let chunks = frame_message(0x20, &payload, 100).unwrap();

        let mut reassembled = Vec::new();
        reassembled.extend_from_slice(&chunks[0][4..]);
        for chunk in &chunks[1..] {
            reassembled.extend_from_slice(&chunk[2..]);
        }
        assert_eq!(reassembled, payload);
    }

    #[test]
    fn test_payload_too_large() {
        let payload = vec![0u8; u16::MAX as usize + 1];
        let err = frame_message(0x20, &payload, 240).unwrap_err();

        assert!(matches!(err, Error::Codec(CodecError::PayloadTooLarge(_))));
    }

    #[test]
    fn test_max_payload_too_small() {
        let err = frame_message(0x20, &[1], 4).unwrap_err();

        assert!(matches!(err, Error::Codec(CodecError::MaxPayloadTooSmall(4))));
    }
}

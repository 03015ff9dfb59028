use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{BackendError, BackendResult};
use crate::protocol::{LqlMessage, MAX_MESSAGE_SIZE};

const HEADER_LEN: usize = 4 + 1 + 4;

/// Frames [`LqlMessage`]s as `[4 bytes len][1 byte tag][4 bytes crc32][payload]`.
///
/// `len` counts everything after itself. The checksum covers the payload.
#[derive(Clone, Copy, Debug)]
pub struct LqlCodec {
    pub max_message_size: usize,
    pub verify_checksums: bool,
}

impl Default for LqlCodec {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            verify_checksums: true,
        }
    }
}

impl LqlCodec {
    pub fn encode(&self, msg: &LqlMessage) -> BackendResult<Bytes> {
        let payload =
            bincode::serialize(msg).map_err(|e| BackendError::Serialization(e.to_string()))?;
        if payload.len() > self.max_message_size {
            return Err(BackendError::MessageTooLarge {
                size: payload.len(),
                max: self.max_message_size,
            });
        }
        let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
        buf.put_u32((payload.len() + 5) as u32);
        buf.put_u8(msg.type_tag());
        buf.put_u32(crc32fast::hash(&payload));
        buf.put_slice(&payload);
        Ok(buf.freeze())
    }

    /// Decode one framed message. Returns the message and the bytes consumed.
    pub fn decode(&self, data: &[u8]) -> BackendResult<(LqlMessage, usize)> {
        if data.len() < HEADER_LEN {
            return Err(BackendError::Framing("too short".into()));
        }
        let mut header = &data[..HEADER_LEN];
        let len = header.get_u32() as usize;
        let tag = header.get_u8();
        let expected = header.get_u32();

        if len < 5 {
            return Err(BackendError::Framing(format!("frame length {len} below header")));
        }
        let size = len - 5;
        if size > self.max_message_size {
            return Err(BackendError::MessageTooLarge {
                size,
                max: self.max_message_size,
            });
        }
        let total = 4 + len;
        if data.len() < total {
            return Err(BackendError::Framing(format!(
                "incomplete: have {}, need {}",
                data.len(),
                total
            )));
        }

        let payload = &data[HEADER_LEN..total];
        if self.verify_checksums {
            let actual = crc32fast::hash(payload);
            if actual != expected {
                return Err(BackendError::ChecksumMismatch { expected, actual });
            }
        }
        let msg: LqlMessage = bincode::deserialize(payload)
            .map_err(|e| BackendError::Deserialization(e.to_string()))?;
        if msg.type_tag() != tag {
            return Err(BackendError::Framing(format!(
                "tag {tag} does not match {} payload",
                msg.type_name()
            )));
        }
        Ok((msg, total))
    }
}

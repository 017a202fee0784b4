//! Wire protocol spoken to the platform wrap service.
//!
//! Every exchange is one fixed-shape request frame followed by one reply
//! frame, little-endian throughout:
//!
//! ```text
//! request:  [command][output size][input size][block size][nonce size][input bytes...]
//! reply:    [status][output bytes...]            (payload only when status == 0)
//! ```
//!
//! The command word uses the platform IPC header encoding
//! `(opcode << 16) | (normal << 6) | translate` with four normal and four
//! translate parameters, so wrap is `0x0046_0104` and unwrap `0x0047_0104`.
//! The service validates the full word, not just the opcode.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::profile::{PACKED_MII_LEN, UNPACKED_MII_LEN};

/// Opcode of the wrap operation (plaintext in, ciphertext out).
pub const OP_WRAP: u32 = 0x46;

/// Opcode of the unwrap operation (ciphertext in, plaintext out).
pub const OP_UNWRAP: u32 = 0x47;

/// Cipher block length requested from the service.
///
/// Fixed parameter of the platform key-wrap scheme; never derived from the
/// payload length.
pub const WRAP_BLOCK_LEN: u32 = 12;

/// Nonce length requested from the service. Fixed, like [`WRAP_BLOCK_LEN`].
pub const WRAP_NONCE_LEN: u32 = 10;

/// Reply status word meaning the transform succeeded.
pub const STATUS_SUCCESS: u32 = 0;

/// Byte length of the request frame before the input payload.
pub const REQUEST_HEADER_LEN: usize = 20;

/// Byte length of the reply status word.
pub const REPLY_STATUS_LEN: usize = 4;

const NORMAL_PARAMS: u32 = 4;
const TRANSLATE_PARAMS: u32 = 4;

/// Which of the two transforms a request asks for.
///
/// The payload sizes are compile-time properties of the kind — a wrap always
/// carries [`UNPACKED_MII_LEN`] bytes in and [`PACKED_MII_LEN`] bytes out,
/// an unwrap the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    /// Encrypt an unpacked profile into its packed form.
    Wrap,
    /// Decrypt a packed profile into its unpacked form.
    Unwrap,
}

impl TransformKind {
    /// Service opcode for this transform.
    pub fn opcode(self) -> u32 {
        match self {
            TransformKind::Wrap => OP_WRAP,
            TransformKind::Unwrap => OP_UNWRAP,
        }
    }

    /// Full command word as the service expects it on the wire.
    pub fn command_word(self) -> u32 {
        (self.opcode() << 16) | (NORMAL_PARAMS << 6) | TRANSLATE_PARAMS
    }

    /// Exact input payload length for this transform.
    pub fn input_len(self) -> usize {
        match self {
            TransformKind::Wrap => UNPACKED_MII_LEN,
            TransformKind::Unwrap => PACKED_MII_LEN,
        }
    }

    /// Exact output payload length for this transform.
    pub fn output_len(self) -> usize {
        match self {
            TransformKind::Wrap => PACKED_MII_LEN,
            TransformKind::Unwrap => UNPACKED_MII_LEN,
        }
    }
}

/// A request frame ready to be encoded onto the service channel.
#[derive(Debug)]
pub struct TransformRequest<'a> {
    /// Which transform to perform.
    pub kind: TransformKind,
    /// Input payload; must be exactly `kind.input_len()` bytes.
    pub input: &'a [u8],
}

impl TransformRequest<'_> {
    /// Serialise the frame: header words followed by the input payload.
    pub fn encode(&self) -> Bytes {
        debug_assert_eq!(self.input.len(), self.kind.input_len());
        let mut buf = BytesMut::with_capacity(REQUEST_HEADER_LEN + self.input.len());
        buf.put_u32_le(self.kind.command_word());
        buf.put_u32_le(self.kind.output_len() as u32);
        buf.put_u32_le(self.kind.input_len() as u32);
        buf.put_u32_le(WRAP_BLOCK_LEN);
        buf.put_u32_le(WRAP_NONCE_LEN);
        buf.put_slice(self.input);
        buf.freeze()
    }
}

/// Decoded request header words, as seen by the service side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    /// Raw command word.
    pub command: u32,
    /// Declared output payload length.
    pub output_len: u32,
    /// Declared input payload length.
    pub input_len: u32,
    /// Declared cipher block length.
    pub block_len: u32,
    /// Declared nonce length.
    pub nonce_len: u32,
}

impl RequestHeader {
    /// Decode the five little-endian header words.
    pub fn decode(raw: [u8; REQUEST_HEADER_LEN]) -> Self {
        let mut buf = &raw[..];
        Self {
            command: buf.get_u32_le(),
            output_len: buf.get_u32_le(),
            input_len: buf.get_u32_le(),
            block_len: buf.get_u32_le(),
            nonce_len: buf.get_u32_le(),
        }
    }

    /// Resolve the header to a [`TransformKind`], verifying the command word
    /// and every declared parameter against the kind's fixed values.
    ///
    /// Returns `None` for an unknown command or any mismatched parameter.
    pub fn kind(&self) -> Option<TransformKind> {
        let kind = match self.command {
            c if c == TransformKind::Wrap.command_word() => TransformKind::Wrap,
            c if c == TransformKind::Unwrap.command_word() => TransformKind::Unwrap,
            _ => return None,
        };
        let sizes_ok = self.output_len as usize == kind.output_len()
            && self.input_len as usize == kind.input_len()
            && self.block_len == WRAP_BLOCK_LEN
            && self.nonce_len == WRAP_NONCE_LEN;
        sizes_ok.then_some(kind)
    }
}

/// Serialise a reply frame: status word, then the payload on success only.
pub fn encode_reply(status: u32, output: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(REPLY_STATUS_LEN + output.len());
    buf.put_u32_le(status);
    if status == STATUS_SUCCESS {
        buf.put_slice(output);
    }
    buf.freeze()
}

/// Decode the reply status word.
pub fn decode_status(raw: [u8; REPLY_STATUS_LEN]) -> u32 {
    u32::from_le_bytes(raw)
}

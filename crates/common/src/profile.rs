//! Fixed-size Mii profile blobs.
//!
//! A profile exists in exactly two shapes: the wrapped form the system stores
//! on disk and the unwrapped form the wrap service hands back. The two sizes
//! are distinct named types so that passing a wrapped blob where an unwrapped
//! one is expected is a compile error, not a runtime surprise. The contents
//! are opaque to this program end-to-end.

use std::fmt;

/// Byte length of a wrapped (encrypted) Mii profile.
pub const PACKED_MII_LEN: usize = 0x70;

/// Byte length of an unwrapped (decrypted) Mii profile.
pub const UNPACKED_MII_LEN: usize = 0x60;

/// A wrapped Mii profile: exactly [`PACKED_MII_LEN`] opaque bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PackedMii([u8; PACKED_MII_LEN]);

/// An unwrapped Mii profile: exactly [`UNPACKED_MII_LEN`] opaque bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct UnpackedMii([u8; UNPACKED_MII_LEN]);

impl PackedMii {
    /// Wrap a byte slice that must be exactly [`PACKED_MII_LEN`] bytes long.
    ///
    /// Returns `None` on any other length; callers decide how to surface the
    /// mismatch (the file layer reports it with the offending path attached).
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != PACKED_MII_LEN {
            return None;
        }
        let mut buf = [0u8; PACKED_MII_LEN];
        buf.copy_from_slice(bytes);
        Some(Self(buf))
    }

    /// Borrow the raw profile bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl UnpackedMii {
    /// Wrap a byte slice that must be exactly [`UNPACKED_MII_LEN`] bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != UNPACKED_MII_LEN {
            return None;
        }
        let mut buf = [0u8; UNPACKED_MII_LEN];
        buf.copy_from_slice(bytes);
        Some(Self(buf))
    }

    /// Borrow the raw profile bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// Profiles hold personal data; keep debug output to the shape, not the bytes.
impl fmt::Debug for PackedMii {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackedMii({PACKED_MII_LEN} bytes)")
    }
}

impl fmt::Debug for UnpackedMii {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnpackedMii({UNPACKED_MII_LEN} bytes)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_accepts_exact_length() {
        let mii = PackedMii::from_bytes(&[0xAB; PACKED_MII_LEN]).unwrap();
        assert_eq!(mii.as_bytes().len(), PACKED_MII_LEN);
        assert!(mii.as_bytes().iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn packed_rejects_other_lengths() {
        assert!(PackedMii::from_bytes(&[0u8; PACKED_MII_LEN - 1]).is_none());
        assert!(PackedMii::from_bytes(&[0u8; PACKED_MII_LEN + 1]).is_none());
        assert!(PackedMii::from_bytes(&[]).is_none());
    }

    #[test]
    fn unpacked_accepts_exact_length() {
        let mii = UnpackedMii::from_bytes(&[0u8; UNPACKED_MII_LEN]).unwrap();
        assert_eq!(mii.as_bytes().len(), UNPACKED_MII_LEN);
    }

    #[test]
    fn unpacked_rejects_packed_length() {
        assert!(UnpackedMii::from_bytes(&[0u8; PACKED_MII_LEN]).is_none());
    }

    #[test]
    fn debug_does_not_leak_bytes() {
        let mii = PackedMii::from_bytes(&[0x5A; PACKED_MII_LEN]).unwrap();
        let rendered = format!("{mii:?}");
        assert!(!rendered.contains("5A"));
        assert!(rendered.contains("PackedMii"));
    }
}

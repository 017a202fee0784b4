//! Gateway to the privileged platform wrap service.
//!
//! The service owns the key-wrap cipher; this side only marshals the fixed
//! parameter tuple and the opaque payload. Each call is exactly one blocking
//! round-trip on a connected Unix socket — no batching, no pipelining, no
//! retry, no timeout. A hung service call therefore stalls the whole tool,
//! which is the documented platform behaviour.

use std::io::{ErrorKind, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;

use anyhow::{Context, Result};
use common::profile::{PackedMii, UnpackedMii};
use common::protocol::{self, TransformKind, TransformRequest};
use common::ServiceError;
use tracing::debug;

/// The two transforms the wrap service performs on a profile.
///
/// This is the seam between the pipelines and the platform: production code
/// talks to [`AptService`], tests substitute a scripted double.
#[cfg_attr(test, mockall::automock)]
pub trait WrapService {
    /// Encrypt an unpacked profile into its packed form.
    fn wrap_mii(&mut self, input: &UnpackedMii) -> Result<PackedMii, ServiceError>;

    /// Decrypt a packed profile into its unpacked form.
    fn unwrap_mii(&mut self, input: &PackedMii) -> Result<UnpackedMii, ServiceError>;
}

/// Connected channel to the wrap service.
///
/// Owns the socket for its whole lifetime; the connection closes when the
/// gateway is dropped, on every exit path. This replaces a process-global
/// service handle: whoever needs the service is handed the gateway.
pub struct AptService {
    stream: UnixStream,
}

impl AptService {
    /// Connect to the wrap service at `socket`.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be connected — the service is
    /// absent or access was not granted.
    pub fn connect(socket: &Path) -> Result<Self> {
        let stream = UnixStream::connect(socket)
            .with_context(|| format!("connect to wrap service at {}", socket.display()))?;
        debug!(socket = %socket.display(), "wrap service channel established");
        Ok(Self::new(stream))
    }

    fn new(stream: UnixStream) -> Self {
        Self { stream }
    }

    /// One blocking request/reply round-trip.
    fn transform(&mut self, kind: TransformKind, input: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let frame = TransformRequest { kind, input }.encode();
        self.stream.write_all(&frame)?;

        let mut status_raw = [0u8; protocol::REPLY_STATUS_LEN];
        self.stream.read_exact(&mut status_raw)?;
        let status = protocol::decode_status(status_raw);
        if status != protocol::STATUS_SUCCESS {
            debug!(status = format!("{status:#010x}"), ?kind, "wrap service refused");
            return Err(ServiceError::Status(status));
        }

        let mut output = vec![0u8; kind.output_len()];
        self.stream
            .read_exact(&mut output)
            .map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => ServiceError::TruncatedReply,
                _ => ServiceError::Channel(e),
            })?;
        debug!(?kind, output_len = output.len(), "wrap service round-trip complete");
        Ok(output)
    }
}

impl WrapService for AptService {
    fn wrap_mii(&mut self, input: &UnpackedMii) -> Result<PackedMii, ServiceError> {
        let output = self.transform(TransformKind::Wrap, input.as_bytes())?;
        PackedMii::from_bytes(&output).ok_or(ServiceError::TruncatedReply)
    }

    fn unwrap_mii(&mut self, input: &PackedMii) -> Result<UnpackedMii, ServiceError> {
        let output = self.transform(TransformKind::Unwrap, input.as_bytes())?;
        UnpackedMii::from_bytes(&output).ok_or(ServiceError::TruncatedReply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::profile::{PACKED_MII_LEN, UNPACKED_MII_LEN};
    use common::protocol::{
        encode_reply, RequestHeader, REPLY_STATUS_LEN, REQUEST_HEADER_LEN, STATUS_SUCCESS,
    };
    use std::net::Shutdown;

    /// Gateway wired to one end of a socket pair; the test scripts the peer.
    /// Frames are far smaller than the socket buffer, so the peer's reply can
    /// be written before the call and the request read back afterwards.
    fn scripted_gateway() -> (AptService, UnixStream) {
        let (ours, peer) = UnixStream::pair().unwrap();
        (AptService::new(ours), peer)
    }

    #[test]
    fn unwrap_sends_the_expected_frame_and_returns_the_payload() {
        let (mut gw, mut peer) = scripted_gateway();
        peer.write_all(&encode_reply(STATUS_SUCCESS, &[0x22; UNPACKED_MII_LEN]))
            .unwrap();

        let input = PackedMii::from_bytes(&[0x11; PACKED_MII_LEN]).unwrap();
        let output = gw.unwrap_mii(&input).unwrap();
        assert_eq!(output.as_bytes(), &[0x22; UNPACKED_MII_LEN]);

        let mut raw = [0u8; REQUEST_HEADER_LEN];
        peer.read_exact(&mut raw).unwrap();
        let header = RequestHeader::decode(raw);
        assert_eq!(header.kind(), Some(TransformKind::Unwrap));

        let mut payload = [0u8; PACKED_MII_LEN];
        peer.read_exact(&mut payload).unwrap();
        assert_eq!(payload, [0x11; PACKED_MII_LEN]);
    }

    #[test]
    fn wrap_round_trips_with_swapped_sizes() {
        let (mut gw, mut peer) = scripted_gateway();
        peer.write_all(&encode_reply(STATUS_SUCCESS, &[0x33; PACKED_MII_LEN]))
            .unwrap();

        let input = UnpackedMii::from_bytes(&[0u8; UNPACKED_MII_LEN]).unwrap();
        let output = gw.wrap_mii(&input).unwrap();
        assert_eq!(output.as_bytes(), &[0x33; PACKED_MII_LEN]);

        let mut raw = [0u8; REQUEST_HEADER_LEN];
        peer.read_exact(&mut raw).unwrap();
        assert_eq!(RequestHeader::decode(raw).kind(), Some(TransformKind::Wrap));
    }

    #[test]
    fn non_success_status_is_a_service_error() {
        let (mut gw, mut peer) = scripted_gateway();
        peer.write_all(&encode_reply(0xC8A0_8035, &[])).unwrap();

        let input = PackedMii::from_bytes(&[0u8; PACKED_MII_LEN]).unwrap();
        match gw.unwrap_mii(&input) {
            Err(ServiceError::Status(status)) => assert_eq!(status, 0xC8A0_8035),
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[test]
    fn short_success_reply_is_truncated() {
        let (mut gw, mut peer) = scripted_gateway();
        let mut reply = encode_reply(STATUS_SUCCESS, &[0u8; UNPACKED_MII_LEN]).to_vec();
        reply.truncate(REPLY_STATUS_LEN + 16); // status word + a sliver of payload
        peer.write_all(&reply).unwrap();
        peer.shutdown(Shutdown::Write).unwrap();

        let input = PackedMii::from_bytes(&[0u8; PACKED_MII_LEN]).unwrap();
        assert!(matches!(
            gw.unwrap_mii(&input),
            Err(ServiceError::TruncatedReply)
        ));
    }

    #[test]
    fn closed_channel_is_a_channel_error() {
        let (mut gw, peer) = scripted_gateway();
        drop(peer);

        let input = PackedMii::from_bytes(&[0u8; PACKED_MII_LEN]).unwrap();
        assert!(gw.unwrap_mii(&input).is_err());
    }
}

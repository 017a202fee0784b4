//! Deterministic stand-in for the platform wrap service.
//!
//! Speaks the real request/reply framing from [`common::protocol`] over a
//! Unix socket, but the "transform" is a fixed byte-shape change — truncate
//! on unwrap, zero-pad on wrap — or an injected failure status. There is no
//! cryptography here and never will be; the real service owns the cipher.
//! The stub exists so the tool can be exercised end-to-end off-console.

use std::io::{ErrorKind, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};

use common::profile::{PACKED_MII_LEN, UNPACKED_MII_LEN};
use common::protocol::{
    encode_reply, RequestHeader, TransformKind, REQUEST_HEADER_LEN, STATUS_SUCCESS,
};
use tracing::{debug, warn};

/// Status word returned for frames the stub cannot resolve to a transform.
/// An arbitrary non-success value; real services have their own vocabulary.
pub const STATUS_INVALID_REQUEST: u32 = 0xD900_4DF2;

/// How the stub answers resolvable requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubBehavior {
    /// Apply the deterministic byte transform and report success.
    Transform,
    /// Report the given non-success status for every request.
    Fail(u32),
}

/// A serving instance of the stub.
pub struct StubService {
    behavior: StubBehavior,
}

impl StubService {
    pub fn new(behavior: StubBehavior) -> Self {
        Self { behavior }
    }

    /// Accept connections forever, one client at a time.
    ///
    /// A failed connection is logged and the next one accepted; only a
    /// failure of the listener itself ends the loop.
    pub fn serve(&self, listener: UnixListener) -> std::io::Result<()> {
        for conn in listener.incoming() {
            match conn {
                Ok(stream) => {
                    if let Err(e) = self.handle_connection(stream) {
                        warn!(error = %e, "connection error");
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Serve one connection until the client hangs up.
    fn handle_connection(&self, mut stream: UnixStream) -> std::io::Result<()> {
        loop {
            let mut raw = [0u8; REQUEST_HEADER_LEN];
            match stream.read_exact(&mut raw) {
                // Clean hang-up between requests.
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(()),
                other => other?,
            }

            let header = RequestHeader::decode(raw);
            let Some(kind) = header.kind() else {
                warn!(
                    command = format!("{:#010x}", header.command),
                    "rejecting unresolvable request"
                );
                stream.write_all(&encode_reply(STATUS_INVALID_REQUEST, &[]))?;
                // The payload length is untrustworthy now; drop the stream
                // rather than desynchronise.
                return Ok(());
            };

            let mut input = vec![0u8; kind.input_len()];
            stream.read_exact(&mut input)?;

            let reply = match self.behavior {
                StubBehavior::Fail(status) => encode_reply(status, &[]),
                StubBehavior::Transform => {
                    encode_reply(STATUS_SUCCESS, &transform(kind, &input))
                }
            };
            stream.write_all(&reply)?;
            debug!(?kind, "request served");
        }
    }
}

/// The deterministic byte transform.
///
/// Unwrap takes the first [`UNPACKED_MII_LEN`] bytes; wrap zero-pads to
/// [`PACKED_MII_LEN`]. Chosen so that a zero-filled profile survives a full
/// wrap/unwrap round-trip unchanged.
pub fn transform(kind: TransformKind, input: &[u8]) -> Vec<u8> {
    match kind {
        TransformKind::Unwrap => input[..UNPACKED_MII_LEN].to_vec(),
        TransformKind::Wrap => {
            let mut output = input.to_vec();
            output.resize(PACKED_MII_LEN, 0);
            output
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::protocol::{decode_status, TransformRequest, REPLY_STATUS_LEN};
    use std::net::Shutdown;

    #[test]
    fn transform_shapes() {
        let unwrapped = transform(TransformKind::Unwrap, &[1u8; PACKED_MII_LEN]);
        assert_eq!(unwrapped, vec![1u8; UNPACKED_MII_LEN]);

        let wrapped = transform(TransformKind::Wrap, &[2u8; UNPACKED_MII_LEN]);
        assert_eq!(wrapped.len(), PACKED_MII_LEN);
        assert_eq!(&wrapped[..UNPACKED_MII_LEN], &[2u8; UNPACKED_MII_LEN]);
        assert_eq!(
            &wrapped[UNPACKED_MII_LEN..],
            &[0u8; PACKED_MII_LEN - UNPACKED_MII_LEN]
        );
    }

    /// Script a whole conversation through a socket pair: frames are tiny,
    /// so both directions fit in the socket buffers without a second thread.
    fn converse(service: &StubService, requests: &[&[u8]]) -> Vec<u8> {
        let (mut client, server) = UnixStream::pair().unwrap();
        for frame in requests {
            client.write_all(frame).unwrap();
        }
        client.shutdown(Shutdown::Write).unwrap();

        service.handle_connection(server).unwrap();

        let mut replies = Vec::new();
        client.read_to_end(&mut replies).unwrap();
        replies
    }

    #[test]
    fn unwrap_request_is_answered_with_truncated_payload() {
        let service = StubService::new(StubBehavior::Transform);
        let input = [0xABu8; PACKED_MII_LEN];
        let frame = TransformRequest {
            kind: TransformKind::Unwrap,
            input: &input,
        }
        .encode();

        let replies = converse(&service, &[&frame]);
        assert_eq!(replies.len(), REPLY_STATUS_LEN + UNPACKED_MII_LEN);
        let mut status = [0u8; REPLY_STATUS_LEN];
        status.copy_from_slice(&replies[..REPLY_STATUS_LEN]);
        assert_eq!(decode_status(status), STATUS_SUCCESS);
        assert_eq!(&replies[REPLY_STATUS_LEN..], &[0xABu8; UNPACKED_MII_LEN]);
    }

    #[test]
    fn two_requests_on_one_connection() {
        let service = StubService::new(StubBehavior::Transform);
        let unpacked = [0u8; UNPACKED_MII_LEN];
        let wrap = TransformRequest {
            kind: TransformKind::Wrap,
            input: &unpacked,
        }
        .encode();
        let packed = [0u8; PACKED_MII_LEN];
        let unwrap = TransformRequest {
            kind: TransformKind::Unwrap,
            input: &packed,
        }
        .encode();

        let replies = converse(&service, &[&wrap, &unwrap]);
        assert_eq!(
            replies.len(),
            2 * REPLY_STATUS_LEN + PACKED_MII_LEN + UNPACKED_MII_LEN
        );
    }

    #[test]
    fn injected_failure_status_is_returned_verbatim() {
        let service = StubService::new(StubBehavior::Fail(0xC8A0_8035));
        let input = [0u8; PACKED_MII_LEN];
        let frame = TransformRequest {
            kind: TransformKind::Unwrap,
            input: &input,
        }
        .encode();

        let replies = converse(&service, &[&frame]);
        assert_eq!(replies.len(), REPLY_STATUS_LEN);
        let mut status = [0u8; REPLY_STATUS_LEN];
        status.copy_from_slice(&replies);
        assert_eq!(decode_status(status), 0xC8A0_8035);
    }

    #[test]
    fn unresolvable_command_gets_invalid_request_and_a_hangup() {
        let service = StubService::new(StubBehavior::Transform);
        let mut frame = [0u8; REQUEST_HEADER_LEN];
        frame[2] = 0x45; // command word 0x0045_0000 — not a transform

        let replies = converse(&service, &[&frame]);
        assert_eq!(replies.len(), REPLY_STATUS_LEN);
        let mut status = [0u8; REPLY_STATUS_LEN];
        status.copy_from_slice(&replies);
        assert_eq!(decode_status(status), STATUS_INVALID_REQUEST);
    }
}

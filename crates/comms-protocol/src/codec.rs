//! Codec for encoding and decoding inter-module frames.

use crate::frame::{
    BroadcastFrame, DispatchFrame, SendFrame, SubscriptionFrame, UserJoinFrame, MAX_HOSTNAME_LEN,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use common::types::{ClientNode, ModuleId};

/// Error type for encode operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EncodeError {
    /// Hostname does not fit the 1-byte length prefix
    #[error("Hostname too long for wire format ({len} bytes): {host}")]
    HostnameTooLong {
        /// The offending hostname
        host: String,
        /// Its length in bytes
        len: usize,
    },

    /// Payload length does not fit the 4-byte length field
    #[error("Payload too large for wire format: {0} bytes")]
    PayloadTooLarge(usize),

    /// Destination count does not fit the 4-byte count field
    #[error("Too many destinations: {0}")]
    TooManyDestinations(usize),
}

/// Error type for decode operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Insufficient data to decode
    #[error("Insufficient data")]
    Insufficient,

    /// Port field exceeds the valid range
    #[error("Port out of range: {0}")]
    PortOutOfRange(u32),

    /// Hostname bytes are not valid UTF-8
    #[error("Invalid hostname encoding")]
    InvalidHostname,
}

fn put_node(buf: &mut BytesMut, node: &ClientNode) -> Result<(), EncodeError> {
    let host = node.host_name.as_bytes();
    if host.len() > MAX_HOSTNAME_LEN {
        return Err(EncodeError::HostnameTooLong {
            host: node.host_name.clone(),
            len: host.len(),
        });
    }
    buf.put_u8(host.len() as u8);
    buf.put_slice(host);
    buf.put_u32(u32::from(node.port));
    Ok(())
}

fn get_node(data: &mut impl Buf) -> Result<ClientNode, DecodeError> {
    if data.remaining() < 1 {
        return Err(DecodeError::Insufficient);
    }
    let len = usize::from(data.get_u8());
    if data.remaining() < len + 4 {
        return Err(DecodeError::Insufficient);
    }
    let mut host = vec![0u8; len];
    data.copy_to_slice(&mut host);
    let host_name = String::from_utf8(host).map_err(|_| DecodeError::InvalidHostname)?;
    let raw_port = data.get_u32();
    let port = u16::try_from(raw_port).map_err(|_| DecodeError::PortOutOfRange(raw_port))?;
    Ok(ClientNode { host_name, port })
}

fn put_payload(buf: &mut BytesMut, payload: &Bytes) -> Result<(), EncodeError> {
    let len =
        u32::try_from(payload.len()).map_err(|_| EncodeError::PayloadTooLarge(payload.len()))?;
    buf.put_u32(len);
    buf.put_slice(payload);
    Ok(())
}

fn get_payload(data: &mut impl Buf) -> Result<Bytes, DecodeError> {
    if data.remaining() < 4 {
        return Err(DecodeError::Insufficient);
    }
    let len = data.get_u32() as usize;
    if data.remaining() < len {
        return Err(DecodeError::Insufficient);
    }
    let mut payload = vec![0u8; len];
    data.copy_to_slice(&mut payload);
    Ok(Bytes::from(payload))
}

/// Encode an addressed-send frame
///
/// # Errors
///
/// Returns an error if a destination hostname exceeds
/// [`MAX_HOSTNAME_LEN`] bytes or the payload exceeds the 4-byte length field.
pub fn encode_send(frame: &SendFrame) -> Result<Bytes, EncodeError> {
    let mut buf = BytesMut::new();
    let count = u32::try_from(frame.destinations.len())
        .map_err(|_| EncodeError::TooManyDestinations(frame.destinations.len()))?;
    buf.put_u32(count);
    for dest in &frame.destinations {
        put_node(&mut buf, dest)?;
    }
    put_payload(&mut buf, &frame.payload)?;
    buf.put_u32(frame.module.0);
    buf.put_u32(frame.priority);
    Ok(buf.freeze())
}

/// Decode an addressed-send frame
///
/// # Errors
///
/// Returns an error if the input is truncated or a destination is malformed.
pub fn decode_send(data: &mut impl Buf) -> Result<SendFrame, DecodeError> {
    if data.remaining() < 4 {
        return Err(DecodeError::Insufficient);
    }
    let count = data.get_u32();
    let mut destinations = Vec::new();
    for _ in 0..count {
        destinations.push(get_node(data)?);
    }
    let payload = get_payload(data)?;
    if data.remaining() < 8 {
        return Err(DecodeError::Insufficient);
    }
    let module = ModuleId(data.get_u32());
    let priority = data.get_u32();
    Ok(SendFrame {
        destinations,
        payload,
        module,
        priority,
    })
}

/// Encode a broadcast frame
///
/// # Errors
///
/// Returns an error if the payload exceeds the 4-byte length field.
pub fn encode_broadcast(frame: &BroadcastFrame) -> Result<Bytes, EncodeError> {
    let mut buf = BytesMut::with_capacity(frame.payload.len() + 12);
    put_payload(&mut buf, &frame.payload)?;
    buf.put_u32(frame.module.0);
    buf.put_u32(frame.priority);
    Ok(buf.freeze())
}

/// Decode a broadcast frame
///
/// # Errors
///
/// Returns an error if the input is truncated.
pub fn decode_broadcast(data: &mut impl Buf) -> Result<BroadcastFrame, DecodeError> {
    let payload = get_payload(data)?;
    if data.remaining() < 8 {
        return Err(DecodeError::Insufficient);
    }
    let module = ModuleId(data.get_u32());
    let priority = data.get_u32();
    Ok(BroadcastFrame {
        payload,
        module,
        priority,
    })
}

/// Encode a subscription-control frame
#[must_use]
pub fn encode_subscription(frame: &SubscriptionFrame) -> Bytes {
    let mut buf = BytesMut::with_capacity(4);
    buf.put_u32(frame.module.0);
    buf.freeze()
}

/// Decode a subscription-control frame
///
/// # Errors
///
/// Returns an error if the input is shorter than the 4-byte module id.
pub fn decode_subscription(data: &mut impl Buf) -> Result<SubscriptionFrame, DecodeError> {
    if data.remaining() < 4 {
        return Err(DecodeError::Insufficient);
    }
    Ok(SubscriptionFrame {
        module: ModuleId(data.get_u32()),
    })
}

/// Encode a user-join notification frame
///
/// # Errors
///
/// Returns an error if either hostname exceeds [`MAX_HOSTNAME_LEN`] bytes.
pub fn encode_user_join(frame: &UserJoinFrame) -> Result<Bytes, EncodeError> {
    let mut buf = BytesMut::new();
    put_node(&mut buf, &frame.device)?;
    put_node(&mut buf, &frame.server)?;
    Ok(buf.freeze())
}

/// Decode a user-join notification frame
///
/// # Errors
///
/// Returns an error if the input is truncated or an address is malformed.
pub fn decode_user_join(data: &mut impl Buf) -> Result<UserJoinFrame, DecodeError> {
    let device = get_node(data)?;
    let server = get_node(data)?;
    Ok(UserJoinFrame { device, server })
}

/// Encode an inbound dispatch frame (module id followed by payload)
#[must_use]
pub fn encode_dispatch(frame: &DispatchFrame) -> Bytes {
    let mut buf = BytesMut::with_capacity(frame.payload.len() + 4);
    buf.put_u32(frame.module.0);
    buf.put_slice(&frame.payload);
    buf.freeze()
}

/// Decode an inbound dispatch frame
///
/// # Errors
///
/// Returns an error if the input is shorter than the 4-byte module id.
pub fn decode_dispatch(data: &mut impl Buf) -> Result<DispatchFrame, DecodeError> {
    if data.remaining() < 4 {
        return Err(DecodeError::Insufficient);
    }
    let module = ModuleId(data.get_u32());
    let payload = data.copy_to_bytes(data.remaining());
    Ok(DispatchFrame { module, payload })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample_send() -> SendFrame {
        SendFrame {
            destinations: vec![
                ClientNode::new("192.168.1.10", 54321),
                ClientNode::new("meet.example.org", 8080),
            ],
            payload: Bytes::from_static(b"hello modules"),
            module: ModuleId(7),
            priority: 2,
        }
    }

    #[test]
    fn test_send_round_trip() {
        let frame = sample_send();
        let encoded = encode_send(&frame).unwrap();
        let decoded = decode_send(&mut encoded.clone()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_send_round_trip_empty_destinations_and_payload() {
        let frame = SendFrame {
            destinations: vec![],
            payload: Bytes::new(),
            module: ModuleId(0),
            priority: 0,
        };
        let encoded = encode_send(&frame).unwrap();
        let decoded = decode_send(&mut encoded.clone()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_send_exact_byte_layout() {
        let frame = SendFrame {
            destinations: vec![ClientNode::new("ab", 0x1234)],
            payload: Bytes::from_static(b"xy"),
            module: ModuleId(5),
            priority: 9,
        };
        let encoded = encode_send(&frame).unwrap();
        let expected: Vec<u8> = vec![
            0, 0, 0, 1, // destination count
            2, b'a', b'b', // hostname length + hostname
            0, 0, 0x12, 0x34, // port
            0, 0, 0, 2, b'x', b'y', // payload length + payload
            0, 0, 0, 5, // module id
            0, 0, 0, 9, // priority
        ];
        assert_eq!(encoded.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_hostname_at_limit_round_trips() {
        let host = "h".repeat(MAX_HOSTNAME_LEN);
        let frame = SendFrame {
            destinations: vec![ClientNode::new(host.clone(), 1)],
            payload: Bytes::new(),
            module: ModuleId(1),
            priority: 0,
        };
        let encoded = encode_send(&frame).unwrap();
        let decoded = decode_send(&mut encoded.clone()).unwrap();
        assert_eq!(
            decoded.destinations.first().unwrap().host_name.len(),
            MAX_HOSTNAME_LEN
        );
    }

    #[test]
    fn test_hostname_too_long_is_rejected_not_truncated() {
        let host = "h".repeat(MAX_HOSTNAME_LEN + 1);
        let frame = SendFrame {
            destinations: vec![ClientNode::new(host.clone(), 1)],
            payload: Bytes::new(),
            module: ModuleId(1),
            priority: 0,
        };
        let err = encode_send(&frame).unwrap_err();
        assert_eq!(
            err,
            EncodeError::HostnameTooLong {
                host,
                len: MAX_HOSTNAME_LEN + 1
            }
        );
    }

    #[test]
    fn test_user_join_hostname_too_long() {
        let frame = UserJoinFrame {
            device: ClientNode::new("h".repeat(300), 1),
            server: ClientNode::new("server", 2),
        };
        assert!(matches!(
            encode_user_join(&frame),
            Err(EncodeError::HostnameTooLong { len: 300, .. })
        ));
    }

    #[test]
    fn test_decode_send_truncated() {
        let frame = sample_send();
        let encoded = encode_send(&frame).unwrap();
        let truncated = encoded.slice(..encoded.len() - 3);
        assert_eq!(
            decode_send(&mut truncated.clone()),
            Err(DecodeError::Insufficient)
        );
    }

    #[test]
    fn test_decode_port_out_of_range() {
        let mut buf = BytesMut::new();
        buf.put_u8(1);
        buf.put_slice(b"h");
        buf.put_u32(70_000); // wire port wider than u16
        buf.put_u8(1);
        buf.put_slice(b"s");
        buf.put_u32(80);
        let err = decode_user_join(&mut buf.freeze()).unwrap_err();
        assert_eq!(err, DecodeError::PortOutOfRange(70_000));
    }

    #[test]
    fn test_decode_invalid_hostname_utf8() {
        let mut buf = BytesMut::new();
        buf.put_u8(2);
        buf.put_slice(&[0xFF, 0xFE]);
        buf.put_u32(80);
        buf.put_u8(1);
        buf.put_slice(b"s");
        buf.put_u32(80);
        assert_eq!(
            decode_user_join(&mut buf.freeze()),
            Err(DecodeError::InvalidHostname)
        );
    }

    #[test]
    fn test_broadcast_round_trip() {
        let frame = BroadcastFrame {
            payload: Bytes::from_static(b"to everyone"),
            module: ModuleId(3),
            priority: 1,
        };
        let encoded = encode_broadcast(&frame).unwrap();
        assert_eq!(decode_broadcast(&mut encoded.clone()).unwrap(), frame);
    }

    #[test]
    fn test_subscription_round_trip() {
        let frame = SubscriptionFrame { module: ModuleId(42) };
        let encoded = encode_subscription(&frame);
        assert_eq!(encoded.len(), 4);
        assert_eq!(decode_subscription(&mut encoded.clone()).unwrap(), frame);
    }

    #[test]
    fn test_user_join_round_trip() {
        let frame = UserJoinFrame {
            device: ClientNode::new("192.168.1.10", 54321),
            server: ClientNode::new("meet_server_ip", 8080),
        };
        let encoded = encode_user_join(&frame).unwrap();
        assert_eq!(decode_user_join(&mut encoded.clone()).unwrap(), frame);
    }

    #[test]
    fn test_dispatch_round_trip() {
        let frame = DispatchFrame {
            module: ModuleId(9),
            payload: Bytes::from_static(b"routed"),
        };
        let encoded = encode_dispatch(&frame);
        assert_eq!(decode_dispatch(&mut encoded.clone()).unwrap(), frame);
    }

    #[test]
    fn test_dispatch_too_short() {
        let data = Bytes::from_static(&[0, 0, 1]);
        assert_eq!(
            decode_dispatch(&mut data.clone()),
            Err(DecodeError::Insufficient)
        );
    }
}

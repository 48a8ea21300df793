//! Frame layouts for the RPC connection.
//!
//! Three frame kinds flow over a connection. A `Hello` is sent once by each
//! peer after the transport comes up and advertises the peer's callable
//! methods together with the ids it assigned to them; those ids are valid
//! only for the lifetime of the connection. `Call` and `Response` frames
//! are matched by correlation id, and a response carries an explicit status
//! byte so a handler failure reaches the caller instead of leaving the call
//! pending. All multi-byte integers are big-endian.

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Maximum method name length representable in the 1-byte length prefix
pub const MAX_METHOD_NAME_LEN: usize = 255;

const KIND_HELLO: u8 = 0x00;
const KIND_CALL: u8 = 0x01;
const KIND_RESPONSE: u8 = 0x02;

/// Completion status carried in a response frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResponseStatus {
    /// The handler completed; the payload is its result
    Ok = 0x00,
    /// The handler failed; the payload is the error message
    Error = 0x01,
    /// The callee has no handler for the method id
    UnknownMethod = 0x02,
}

/// One entry of a Hello method table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodAdvertisement {
    /// Method name as used by callers
    pub name: String,
    /// Id the advertising peer assigned to the method
    pub id: u16,
}

/// A frame exchanged over an RPC connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcFrame {
    /// Method table advertisement sent once by each peer after connecting
    Hello(Vec<MethodAdvertisement>),
    /// Invocation of a peer method
    Call {
        /// Correlation id linking the eventual response to this call
        correlation: u64,
        /// Peer-assigned id of the invoked method
        method: u16,
        /// Argument bytes handed to the handler
        payload: Bytes,
    },
    /// Completion of a prior call
    Response {
        /// Correlation id of the call being completed
        correlation: u64,
        /// Whether the handler succeeded
        status: ResponseStatus,
        /// Result bytes, or the error message on failure
        payload: Bytes,
    },
}

/// Error type for RPC frame codec operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    /// Insufficient data to decode
    #[error("Insufficient data")]
    Insufficient,

    /// Unknown frame kind byte
    #[error("Unknown frame kind: {0:#04x}")]
    UnknownKind(u8),

    /// Unknown response status byte
    #[error("Unknown response status: {0:#04x}")]
    UnknownStatus(u8),

    /// Method name does not fit the 1-byte length prefix
    #[error("Method name too long ({0} bytes)")]
    MethodNameTooLong(usize),

    /// Method name bytes are not valid UTF-8
    #[error("Invalid method name encoding")]
    InvalidMethodName,

    /// Method table does not fit the 2-byte count field
    #[error("Method table too large ({0} entries)")]
    TableTooLarge(usize),

    /// Payload length does not fit the 4-byte length field
    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(usize),
}

/// Encode an RPC frame
///
/// # Errors
///
/// Returns an error if a method name, the method table or the payload does
/// not fit its wire field.
pub fn encode(frame: &RpcFrame) -> Result<Bytes, FrameError> {
    let mut buf = BytesMut::new();
    match frame {
        RpcFrame::Hello(methods) => {
            buf.put_u8(KIND_HELLO);
            let count = u16::try_from(methods.len())
                .map_err(|_| FrameError::TableTooLarge(methods.len()))?;
            buf.put_u16(count);
            for method in methods {
                let name = method.name.as_bytes();
                let len = u8::try_from(name.len())
                    .map_err(|_| FrameError::MethodNameTooLong(name.len()))?;
                buf.put_u8(len);
                buf.put_slice(name);
                buf.put_u16(method.id);
            }
        }
        RpcFrame::Call {
            correlation,
            method,
            payload,
        } => {
            buf.put_u8(KIND_CALL);
            buf.put_u64(*correlation);
            buf.put_u16(*method);
            put_payload(&mut buf, payload)?;
        }
        RpcFrame::Response {
            correlation,
            status,
            payload,
        } => {
            buf.put_u8(KIND_RESPONSE);
            buf.put_u64(*correlation);
            buf.put_u8(*status as u8);
            put_payload(&mut buf, payload)?;
        }
    }
    Ok(buf.freeze())
}

/// Decode an RPC frame
///
/// # Errors
///
/// Returns an error if the input is truncated or carries an unknown kind or
/// status byte.
pub fn decode(data: &mut impl Buf) -> Result<RpcFrame, FrameError> {
    if data.remaining() < 1 {
        return Err(FrameError::Insufficient);
    }
    match data.get_u8() {
        KIND_HELLO => {
            if data.remaining() < 2 {
                return Err(FrameError::Insufficient);
            }
            let count = data.get_u16();
            let mut methods = Vec::new();
            for _ in 0..count {
                if data.remaining() < 1 {
                    return Err(FrameError::Insufficient);
                }
                let len = usize::from(data.get_u8());
                if data.remaining() < len + 2 {
                    return Err(FrameError::Insufficient);
                }
                let mut name = vec![0u8; len];
                data.copy_to_slice(&mut name);
                let name =
                    String::from_utf8(name).map_err(|_| FrameError::InvalidMethodName)?;
                let id = data.get_u16();
                methods.push(MethodAdvertisement { name, id });
            }
            Ok(RpcFrame::Hello(methods))
        }
        KIND_CALL => {
            if data.remaining() < 10 {
                return Err(FrameError::Insufficient);
            }
            let correlation = data.get_u64();
            let method = data.get_u16();
            let payload = get_payload(data)?;
            Ok(RpcFrame::Call {
                correlation,
                method,
                payload,
            })
        }
        KIND_RESPONSE => {
            if data.remaining() < 9 {
                return Err(FrameError::Insufficient);
            }
            let correlation = data.get_u64();
            let status = match data.get_u8() {
                0x00 => ResponseStatus::Ok,
                0x01 => ResponseStatus::Error,
                0x02 => ResponseStatus::UnknownMethod,
                other => return Err(FrameError::UnknownStatus(other)),
            };
            let payload = get_payload(data)?;
            Ok(RpcFrame::Response {
                correlation,
                status,
                payload,
            })
        }
        other => Err(FrameError::UnknownKind(other)),
    }
}

fn put_payload(buf: &mut BytesMut, payload: &Bytes) -> Result<(), FrameError> {
    let len =
        u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge(payload.len()))?;
    buf.put_u32(len);
    buf.put_slice(payload);
    Ok(())
}

fn get_payload(data: &mut impl Buf) -> Result<Bytes, FrameError> {
    if data.remaining() < 4 {
        return Err(FrameError::Insufficient);
    }
    let len = data.get_u32() as usize;
    if data.remaining() < len {
        return Err(FrameError::Insufficient);
    }
    let mut payload = vec![0u8; len];
    data.copy_to_slice(&mut payload);
    Ok(Bytes::from(payload))
}

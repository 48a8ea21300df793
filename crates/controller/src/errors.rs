//! Controller error taxonomy.
//!
//! Guard violations and peer rejections are expected, user-facing outcomes
//! and get their own variants so callers can branch without crashing. A
//! malformed response stays distinct from a rejection: the first is a
//! protocol fault, the second an application answer.

use crate::serialize::SerializeError;
use comms_protocol::dispatch::DispatchError;
use rpc::RpcError;
use thiserror::Error;

/// Error type for controller service operations
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The operation requires a registered profile
    #[error("Not registered")]
    NotRegistered,

    /// The operation is invalid while a meeting is active
    #[error("Already in a meeting")]
    AlreadyInMeeting,

    /// There is no active meeting to leave
    #[error("Not in a meeting")]
    NotInMeeting,

    /// The remote peer rejected the request
    #[error("Rejected by peer: {reason}")]
    Rejected {
        /// Reason reported by the peer
        reason: String,
    },

    /// The response payload could not be decoded
    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] SerializeError),

    /// RPC-level failure (timeout, dead connection, unknown method)
    #[error(transparent)]
    Rpc(RpcError),

    /// Outbound network control failure
    #[error(transparent)]
    Network(#[from] DispatchError),
}

impl From<RpcError> for ControllerError {
    fn from(err: RpcError) -> Self {
        match err {
            // A handler-reported failure is an application answer, not a
            // transport fault.
            RpcError::Remote(reason) => Self::Rejected { reason },
            other => Self::Rpc(other),
        }
    }
}

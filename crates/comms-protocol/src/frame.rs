//! Frame types for the inter-module wire protocol.
//!
//! Frames carry no kind tag on the wire; the kind is established
//! out-of-band by which control operation shipped the frame. All multi-byte
//! integers are big-endian, a fixed contract between peers.

use bytes::Bytes;
use common::types::{ClientNode, ModuleId};

/// Maximum hostname length representable in the 1-byte length prefix
pub const MAX_HOSTNAME_LEN: usize = 255;

/// An addressed send carrying a payload to an explicit destination list.
///
/// Wire layout:
/// - Destination count: 4 bytes
/// - Per destination: 1-byte hostname length, hostname bytes, 4-byte port
/// - Payload length: 4 bytes
/// - Payload: variable
/// - Module id: 4 bytes
/// - Priority: 4 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFrame {
    /// Endpoints the transport must deliver the payload to
    pub destinations: Vec<ClientNode>,
    /// Opaque payload bytes
    pub payload: Bytes,
    /// Module the payload is routed to on the receiving side
    pub module: ModuleId,
    /// Opaque scheduling hint for the transport; no semantics at this layer
    pub priority: u32,
}

/// A broadcast frame. Same layout as [`SendFrame`] minus the destination
/// list; fan-out is the transport's responsibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastFrame {
    /// Opaque payload bytes
    pub payload: Bytes,
    /// Module the payload is routed to on the receiving side
    pub module: ModuleId,
    /// Opaque scheduling hint for the transport
    pub priority: u32,
}

/// Subscription-control frame: 4-byte module id only.
///
/// Subscribe and unsubscribe share this layout; the direction is carried by
/// which control operation shipped the frame, not by frame content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionFrame {
    /// Module being subscribed or unsubscribed
    pub module: ModuleId,
}

/// User-join notification announcing a new client to the coordinator.
///
/// Wire layout: the device address followed by the main server address, each
/// as a 1-byte hostname length, hostname bytes and 4-byte port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserJoinFrame {
    /// Address of the joining device
    pub device: ClientNode,
    /// Address of the main server the device attaches to
    pub server: ClientNode,
}

/// An inbound frame as delivered to this process by the remote coordinator.
///
/// Wire layout: 4-byte module id followed by the payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchFrame {
    /// Module the payload is addressed to
    pub module: ModuleId,
    /// Payload handed to the subscribed callback
    pub payload: Bytes,
}

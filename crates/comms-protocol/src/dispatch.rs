//! Per-process dispatch front for pub/sub routing.
//!
//! Maps numeric module ids to receive callbacks, encodes outbound
//! send/broadcast/control operations into wire frames and routes inbound
//! frames to the subscribed module. Unknown module ids are dropped, not
//! errored: modules attach and detach dynamically, so a missing subscriber
//! is not a protocol violation.

use crate::codec::{self, DecodeError, EncodeError};
use crate::frame::{BroadcastFrame, SendFrame, SubscriptionFrame, UserJoinFrame};
use crate::transport::{Transport, TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use common::types::{ClientNode, ModuleId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Receive callback capability for a subscribed module.
pub trait ModuleHandler: Send + Sync {
    /// Called with the payload of every frame routed to the module.
    fn receive(&self, payload: Bytes);
}

/// Error type for dispatch operations
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A frame could not be encoded
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The transport rejected the frame
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Outbound control surface of the communication layer.
///
/// The operations a module uses to move data between processes: addressed
/// sends, broadcasts, subscription control and user-join notifications.
#[async_trait]
pub trait NetworkController: Send + Sync {
    /// Send a payload to an explicit destination list.
    ///
    /// Fire-and-forget at this layer: the transport accepting the frame is
    /// not a delivery guarantee.
    async fn send_data(
        &self,
        payload: Bytes,
        destinations: &[ClientNode],
        module: ModuleId,
        priority: u32,
    ) -> Result<(), DispatchError>;

    /// Broadcast a payload; fan-out is the transport's responsibility.
    async fn broadcast(
        &self,
        payload: Bytes,
        module: ModuleId,
        priority: u32,
    ) -> Result<(), DispatchError>;

    /// Register a callback for a module id, replacing any existing entry,
    /// and tell the remote coordinator to route that id here.
    async fn subscribe(
        &self,
        module: ModuleId,
        handler: Arc<dyn ModuleHandler>,
    ) -> Result<(), DispatchError>;

    /// Drop the callback for a module id and tell the remote coordinator to
    /// stop routing it here.
    async fn remove_subscription(&self, module: ModuleId) -> Result<(), DispatchError>;

    /// Announce a joining device and its main server to the coordinator.
    async fn add_user(
        &self,
        device: &ClientNode,
        server: &ClientNode,
    ) -> Result<(), DispatchError>;
}

/// Dispatch front owning the module-id routing table for one process.
pub struct DispatchFront {
    listeners: Mutex<HashMap<ModuleId, Arc<dyn ModuleHandler>>>,
    transport: Arc<dyn Transport>,
}

impl DispatchFront {
    /// Create a dispatch front over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            transport,
        }
    }

    /// Decode an inbound frame and invoke the subscribed callback.
    ///
    /// Invoked by the transport integration for every frame addressed to
    /// this process. Frames for module ids with no subscriber are logged and
    /// dropped. The callback runs outside the table lock, so it may
    /// subscribe or unsubscribe modules itself.
    ///
    /// # Errors
    ///
    /// Returns an error only for frames too short to carry a module id.
    pub async fn on_frame_received(&self, frame: Bytes) -> Result<(), DecodeError> {
        let mut data = frame;
        let decoded = codec::decode_dispatch(&mut data)?;
        let handler = self.listeners.lock().await.get(&decoded.module).cloned();
        match handler {
            Some(handler) => handler.receive(decoded.payload),
            None => debug!(
                target: "comms.dispatch",
                module = %decoded.module,
                "Dropping frame for unsubscribed module"
            ),
        }
        Ok(())
    }
}

#[async_trait]
impl NetworkController for DispatchFront {
    async fn send_data(
        &self,
        payload: Bytes,
        destinations: &[ClientNode],
        module: ModuleId,
        priority: u32,
    ) -> Result<(), DispatchError> {
        let frame = codec::encode_send(&SendFrame {
            destinations: destinations.to_vec(),
            payload,
            module,
            priority,
        })?;
        self.transport.send(frame).await?;
        Ok(())
    }

    async fn broadcast(
        &self,
        payload: Bytes,
        module: ModuleId,
        priority: u32,
    ) -> Result<(), DispatchError> {
        let frame = codec::encode_broadcast(&BroadcastFrame {
            payload,
            module,
            priority,
        })?;
        self.transport.send(frame).await?;
        Ok(())
    }

    async fn subscribe(
        &self,
        module: ModuleId,
        handler: Arc<dyn ModuleHandler>,
    ) -> Result<(), DispatchError> {
        self.listeners.lock().await.insert(module, handler);
        let frame = codec::encode_subscription(&SubscriptionFrame { module });
        self.transport.send(frame).await?;
        Ok(())
    }

    async fn remove_subscription(&self, module: ModuleId) -> Result<(), DispatchError> {
        self.listeners.lock().await.remove(&module);
        // Removing an id that was never subscribed still notifies the
        // coordinator; the control frame is idempotent on its side.
        let frame = codec::encode_subscription(&SubscriptionFrame { module });
        self.transport.send(frame).await?;
        Ok(())
    }

    async fn add_user(
        &self,
        device: &ClientNode,
        server: &ClientNode,
    ) -> Result<(), DispatchError> {
        let frame = codec::encode_user_join(&UserJoinFrame {
            device: device.clone(),
            server: server.clone(),
        })?;
        self.transport.send(frame).await?;
        Ok(())
    }
}

//! Transport boundary for the communication layer.
//!
//! This subsystem never opens sockets. A [`Transport`] is a duplex,
//! frame-oriented byte channel supplied by the embedding application; each
//! `send`/`recv` moves exactly one encoded frame.

use async_trait::async_trait;
use bytes::Bytes;

/// Error type for transport operations
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The channel was closed by the peer
    #[error("Transport closed")]
    Closed,

    /// Underlying I/O failure
    #[error("Transport I/O error: {0}")]
    Io(String),
}

/// A duplex frame channel between this process and a remote peer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Hand one encoded frame to the transport for delivery.
    ///
    /// Acceptance is not a delivery guarantee; reliability belongs to the
    /// transport implementation and the layers above.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed or the write fails.
    async fn send(&self, frame: Bytes) -> Result<(), TransportError>;

    /// Wait for the next inbound frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] once the peer is gone.
    async fn recv(&self) -> Result<Bytes, TransportError>;
}

/// In-process transport built on bounded channels.
///
/// Used by tests and harnesses that need two connected endpoints without any
/// real networking.
pub mod memory {
    use super::{Transport, TransportError};
    use async_trait::async_trait;
    use bytes::Bytes;
    use tokio::sync::{mpsc, Mutex};

    const CHANNEL_CAPACITY: usize = 64;

    /// One endpoint of an in-process duplex pair.
    pub struct MemoryTransport {
        tx: mpsc::Sender<Bytes>,
        rx: Mutex<mpsc::Receiver<Bytes>>,
    }

    impl MemoryTransport {
        /// Create two connected endpoints.
        #[must_use]
        pub fn pair() -> (MemoryTransport, MemoryTransport) {
            let (a_tx, b_rx) = mpsc::channel(CHANNEL_CAPACITY);
            let (b_tx, a_rx) = mpsc::channel(CHANNEL_CAPACITY);
            (
                MemoryTransport {
                    tx: a_tx,
                    rx: Mutex::new(a_rx),
                },
                MemoryTransport {
                    tx: b_tx,
                    rx: Mutex::new(b_rx),
                },
            )
        }
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        async fn send(&self, frame: Bytes) -> Result<(), TransportError> {
            self.tx.send(frame).await.map_err(|_| TransportError::Closed)
        }

        async fn recv(&self) -> Result<Bytes, TransportError> {
            self.rx
                .lock()
                .await
                .recv()
                .await
                .ok_or(TransportError::Closed)
        }
    }
}

/// Recording transport for tests that assert on outbound frames.
pub mod mock {
    use super::{Transport, TransportError};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    /// Captures every sent frame; `recv` never yields.
    #[derive(Default)]
    pub struct RecordingTransport {
        sent: Mutex<Vec<Bytes>>,
    }

    impl RecordingTransport {
        /// Create an empty recorder.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Frames sent so far, in order.
        #[must_use]
        pub fn sent(&self) -> Vec<Bytes> {
            self.sent
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, frame: Bytes) -> Result<(), TransportError> {
            self.sent
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(frame);
            Ok(())
        }

        async fn recv(&self) -> Result<Bytes, TransportError> {
            std::future::pending().await
        }
    }
}

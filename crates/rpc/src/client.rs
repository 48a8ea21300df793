//! RPC client: method registry, connection handshake and receive loop.
//!
//! A client is symmetric: it can expose methods for the peer to invoke and
//! call methods the peer advertised. Exactly one receive loop drains the
//! transport per connection; handler work is offloaded to spawned tasks so
//! a slow handler never stalls completion of other pending calls.

use crate::config::RpcConfig;
use crate::wire::{self, FrameError, MethodAdvertisement, ResponseStatus, RpcFrame};
use async_trait::async_trait;
use bytes::Bytes;
use comms_protocol::transport::{Transport, TransportError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Error raised by a subscribed handler while servicing a remote call.
///
/// The message is encoded into the response frame, so the calling peer
/// receives an explicit failure instead of waiting forever.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    /// Create a handler error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A locally subscribed method implementation, invokable by the peer.
#[async_trait]
pub trait RpcHandler: Send + Sync {
    /// Service one remote call.
    async fn handle(&self, payload: Bytes) -> Result<Bytes, HandlerError>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> RpcHandler for FnHandler<F>
where
    F: Fn(Bytes) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Bytes, HandlerError>> + Send,
{
    async fn handle(&self, payload: Bytes) -> Result<Bytes, HandlerError> {
        (self.0)(payload).await
    }
}

/// Wrap an async closure as an [`RpcHandler`].
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn RpcHandler>
where
    F: Fn(Bytes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Bytes, HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Error type for RPC client operations
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// `call` was invoked before `connect`
    #[error("Not connected")]
    NotConnected,

    /// The operation is only valid before `connect`
    #[error("Already connected")]
    AlreadyConnected,

    /// The peer never advertised the method
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// The peer answered that it has no handler for the method id
    #[error("Method not registered on peer")]
    PeerUnknownMethod,

    /// The peer's handler failed while servicing the call
    #[error("Remote error: {0}")]
    Remote(String),

    /// No response arrived within the configured timeout
    #[error("Call timed out")]
    TimedOut,

    /// The connection died while the call was pending
    #[error("Connection closed")]
    ConnectionClosed,

    /// The peer violated the handshake protocol
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// Transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Frame codec failure
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Outbound call capability, the seam consumers depend on for mocking.
#[async_trait]
pub trait RpcCaller: Send + Sync {
    /// Invoke a peer method and wait for its response.
    async fn call(&self, method: &str, payload: Bytes) -> Result<Bytes, RpcError>;
}

#[derive(Clone)]
struct NamedHandler {
    name: String,
    handler: Arc<dyn RpcHandler>,
}

struct Connection {
    transport: Arc<dyn Transport>,
    /// Peer-assigned method ids, valid for this connection only
    remote: HashMap<String, u16>,
}

type PendingMap = HashMap<u64, oneshot::Sender<Result<Bytes, RpcError>>>;

/// Asynchronous RPC client over a duplex frame transport.
pub struct RpcClient {
    config: RpcConfig,
    /// Handlers registered before connect, in registration order
    local: StdMutex<Vec<(String, Arc<dyn RpcHandler>)>>,
    connected: AtomicBool,
    conn: RwLock<Option<Connection>>,
    pending: Arc<Mutex<PendingMap>>,
    next_correlation: AtomicU64,
}

impl RpcClient {
    /// Create a disconnected client.
    #[must_use]
    pub fn new(config: RpcConfig) -> Self {
        Self {
            config,
            local: StdMutex::new(Vec::new()),
            connected: AtomicBool::new(false),
            conn: RwLock::new(None),
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_correlation: AtomicU64::new(1),
        }
    }

    /// Register a local handler under a method name.
    ///
    /// Must be called before [`connect`](Self::connect) for the method to be
    /// advertised to the peer. Registering a name twice replaces the handler.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::AlreadyConnected`] once the connection is up.
    pub fn subscribe(&self, name: &str, handler: Arc<dyn RpcHandler>) -> Result<(), RpcError> {
        if self.connected.load(Ordering::SeqCst) {
            return Err(RpcError::AlreadyConnected);
        }
        let mut local = self
            .local
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match local.iter_mut().find(|(existing, _)| existing.as_str() == name) {
            Some((_, slot)) => *slot = handler,
            None => local.push((name.to_string(), handler)),
        }
        Ok(())
    }

    /// Establish the connection over the given transport.
    ///
    /// Assigns ids to the locally subscribed methods in registration order
    /// starting at 1, advertises them to the peer, waits for the peer's own
    /// advertisement and starts the receive loop. Both peers must connect
    /// concurrently; each side's method ids come from its own advertisement
    /// and are valid only for this connection.
    ///
    /// Returns a handle to the receive loop so the caller can wait for it to
    /// terminate on shutdown or fatal transport error.
    ///
    /// # Errors
    ///
    /// Transport or protocol failures during the handshake are fatal
    /// start-up errors.
    pub async fn connect(
        &self,
        transport: Arc<dyn Transport>,
    ) -> Result<JoinHandle<()>, RpcError> {
        let mut conn = self.conn.write().await;
        if conn.is_some() {
            return Err(RpcError::AlreadyConnected);
        }

        let snapshot = self
            .local
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let mut advertised = Vec::with_capacity(snapshot.len());
        let mut handlers: HashMap<u16, NamedHandler> = HashMap::with_capacity(snapshot.len());
        for (index, (name, handler)) in snapshot.into_iter().enumerate() {
            let id = u16::try_from(index + 1)
                .map_err(|_| RpcError::Frame(FrameError::TableTooLarge(index + 1)))?;
            advertised.push(MethodAdvertisement {
                name: name.clone(),
                id,
            });
            handlers.insert(id, NamedHandler { name, handler });
        }

        transport.send(wire::encode(&RpcFrame::Hello(advertised))?).await?;

        let mut first = transport.recv().await?;
        let remote = match wire::decode(&mut first)? {
            RpcFrame::Hello(methods) => methods
                .into_iter()
                .map(|method| (method.name, method.id))
                .collect::<HashMap<_, _>>(),
            other => {
                return Err(RpcError::Handshake(format!(
                    "expected hello, got {other:?}"
                )))
            }
        };
        info!(
            target: "rpc.client",
            methods = remote.len(),
            "Connected; peer advertised method table"
        );

        *conn = Some(Connection {
            transport: Arc::clone(&transport),
            remote,
        });
        self.connected.store(true, Ordering::SeqCst);

        let receive_loop = ReceiveLoop {
            transport,
            handlers: Arc::new(handlers),
            pending: Arc::clone(&self.pending),
        };
        Ok(tokio::spawn(receive_loop.run()))
    }

    /// Invoke a peer method and wait for its response.
    ///
    /// The call frame carries a fresh correlation id; completion happens on
    /// the receive loop when the matching response arrives, so concurrent
    /// calls may complete in any order. With a configured timeout, an
    /// unanswered call fails with [`RpcError::TimedOut`] and a late response
    /// is dropped.
    ///
    /// # Errors
    ///
    /// Fails if the client is not connected, the peer never advertised the
    /// method, the transport rejects the frame, the peer reports a failure,
    /// or the connection dies before the response arrives.
    pub async fn call(&self, method: &str, payload: Bytes) -> Result<Bytes, RpcError> {
        let (transport, method_id) = {
            let conn = self.conn.read().await;
            let conn = conn.as_ref().ok_or(RpcError::NotConnected)?;
            let id = conn
                .remote
                .get(method)
                .copied()
                .ok_or_else(|| RpcError::UnknownMethod(method.to_string()))?;
            (Arc::clone(&conn.transport), id)
        };

        let correlation = self.next_correlation.fetch_add(1, Ordering::Relaxed);
        let frame = wire::encode(&RpcFrame::Call {
            correlation,
            method: method_id,
            payload,
        })?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(correlation, tx);
        if let Err(err) = transport.send(frame).await {
            self.pending.lock().await.remove(&correlation);
            return Err(RpcError::Transport(err));
        }

        match self.config.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(RpcError::ConnectionClosed),
                Err(_) => {
                    // Forget the call so a late response is dropped rather
                    // than delivered to nobody.
                    self.pending.lock().await.remove(&correlation);
                    Err(RpcError::TimedOut)
                }
            },
            None => rx.await.unwrap_or(Err(RpcError::ConnectionClosed)),
        }
    }
}

#[async_trait]
impl RpcCaller for RpcClient {
    async fn call(&self, method: &str, payload: Bytes) -> Result<Bytes, RpcError> {
        RpcClient::call(self, method, payload).await
    }
}

/// The single receive loop of a connection.
struct ReceiveLoop {
    transport: Arc<dyn Transport>,
    handlers: Arc<HashMap<u16, NamedHandler>>,
    pending: Arc<Mutex<PendingMap>>,
}

impl ReceiveLoop {
    async fn run(self) {
        loop {
            let raw = match self.transport.recv().await {
                Ok(raw) => raw,
                Err(TransportError::Closed) => {
                    debug!(target: "rpc.client", "Transport closed; stopping receive loop");
                    self.fail_pending().await;
                    return;
                }
                Err(err) => {
                    warn!(target: "rpc.client", error = %err, "Transport failure; stopping receive loop");
                    self.fail_pending().await;
                    return;
                }
            };

            let mut data = raw;
            match wire::decode(&mut data) {
                Ok(RpcFrame::Call {
                    correlation,
                    method,
                    payload,
                }) => self.dispatch_call(correlation, method, payload),
                Ok(RpcFrame::Response {
                    correlation,
                    status,
                    payload,
                }) => self.complete(correlation, status, payload).await,
                Ok(RpcFrame::Hello(_)) => {
                    warn!(target: "rpc.client", "Ignoring hello after handshake");
                }
                Err(err) => {
                    warn!(target: "rpc.client", error = %err, "Dropping malformed frame");
                }
            }
        }
    }

    /// Run the handler on its own task and send the response back.
    ///
    /// The loop itself never awaits handler completion, so other pending
    /// calls keep resolving while a handler works.
    fn dispatch_call(&self, correlation: u64, method: u16, payload: Bytes) {
        let entry = self.handlers.get(&method).cloned();
        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            let (status, body) = match entry {
                Some(named) => match named.handler.handle(payload).await {
                    Ok(result) => (ResponseStatus::Ok, result),
                    Err(err) => {
                        debug!(
                            target: "rpc.client",
                            method = %named.name,
                            error = %err,
                            "Handler reported failure"
                        );
                        (ResponseStatus::Error, Bytes::from(err.to_string()))
                    }
                },
                None => {
                    warn!(target: "rpc.client", method, "Call for unregistered method id");
                    (ResponseStatus::UnknownMethod, Bytes::new())
                }
            };
            match wire::encode(&RpcFrame::Response {
                correlation,
                status,
                payload: body,
            }) {
                Ok(frame) => {
                    if let Err(err) = transport.send(frame).await {
                        warn!(target: "rpc.client", error = %err, "Failed to send response");
                    }
                }
                Err(err) => {
                    warn!(target: "rpc.client", error = %err, "Failed to encode response");
                }
            }
        });
    }

    /// Resolve the pending call matching the correlation id, exactly once.
    async fn complete(&self, correlation: u64, status: ResponseStatus, payload: Bytes) {
        let sender = self.pending.lock().await.remove(&correlation);
        match sender {
            Some(tx) => {
                let result = match status {
                    ResponseStatus::Ok => Ok(payload),
                    ResponseStatus::Error => Err(RpcError::Remote(
                        String::from_utf8_lossy(&payload).into_owned(),
                    )),
                    ResponseStatus::UnknownMethod => Err(RpcError::PeerUnknownMethod),
                };
                // The caller may have timed out and dropped its receiver.
                let _ = tx.send(result);
            }
            None => {
                debug!(
                    target: "rpc.client",
                    correlation,
                    "Dropping response with no pending call"
                );
            }
        }
    }

    /// Fail every pending call when the connection dies.
    async fn fail_pending(&self) {
        let drained: Vec<_> = self.pending.lock().await.drain().collect();
        for (_, tx) in drained {
            let _ = tx.send(Err(RpcError::ConnectionClosed));
        }
    }
}

/// Mock caller for unit testing consumers of the RPC layer.
pub mod mock {
    use super::{RpcCaller, RpcError};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::VecDeque;
    use std::sync::{Mutex, PoisonError};

    /// Replays queued responses in order and records every call.
    #[derive(Default)]
    pub struct MockRpcCaller {
        responses: Mutex<VecDeque<Result<Bytes, RpcError>>>,
        calls: Mutex<Vec<(String, Bytes)>>,
    }

    impl MockRpcCaller {
        /// Create a mock with an empty response queue.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a successful response.
        pub fn push_ok(&self, payload: Bytes) {
            self.responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(Ok(payload));
        }

        /// Queue a failure.
        pub fn push_err(&self, err: RpcError) {
            self.responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(Err(err));
        }

        /// Calls made so far, as (method, payload) pairs.
        #[must_use]
        pub fn calls(&self) -> Vec<(String, Bytes)> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl RpcCaller for MockRpcCaller {
        async fn call(&self, method: &str, payload: Bytes) -> Result<Bytes, RpcError> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((method.to_string(), payload));
            self.responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or(Err(RpcError::ConnectionClosed))
        }
    }

    #[cfg(test)]
    #[allow(clippy::unwrap_used, clippy::expect_used)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_replays_responses_and_records_calls() {
            let mock = MockRpcCaller::new();
            mock.push_ok(Bytes::from_static(b"one"));
            mock.push_err(RpcError::Remote("denied".to_string()));

            let first = mock.call("a", Bytes::from_static(b"p1")).await.unwrap();
            assert_eq!(first, Bytes::from_static(b"one"));

            let second = mock.call("b", Bytes::new()).await;
            assert!(matches!(second, Err(RpcError::Remote(reason)) if reason == "denied"));

            let calls = mock.calls();
            assert_eq!(calls.len(), 2);
            assert_eq!(calls.first().unwrap().0, "a");
        }

        #[tokio::test]
        async fn test_mock_exhausted_queue_reports_closed() {
            let mock = MockRpcCaller::new();
            assert!(matches!(
                mock.call("a", Bytes::new()).await,
                Err(RpcError::ConnectionClosed)
            ));
        }
    }
}

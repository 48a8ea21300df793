//! Asynchronous RPC layer for Unicate inter-module communication.
//!
//! Provides name-addressed remote calls over a duplex frame transport.
//! Each peer advertises its callable methods in a handshake at connect
//! time; calls carry a fresh correlation id and complete through a future
//! resolved by a single receive loop, regardless of response order.

pub mod client;
pub mod config;
pub mod wire;

pub use client::{handler_fn, HandlerError, RpcCaller, RpcClient, RpcError, RpcHandler};
pub use config::RpcConfig;

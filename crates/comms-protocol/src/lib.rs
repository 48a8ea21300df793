//! Inter-module wire protocol for Unicate.
//!
//! This crate implements the binary frame layouts used to move data between
//! logical modules (addressed sends, broadcasts, subscription control and
//! user-join notifications) and the per-process dispatch front that routes
//! inbound frames to subscribed modules. Real delivery is owned by an
//! external transport; this crate only defines the byte contract and the
//! routing table.

#![warn(clippy::pedantic)]

pub mod frame;
pub mod codec;
pub mod dispatch;
pub mod transport;

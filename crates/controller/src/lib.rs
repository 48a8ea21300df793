//! Controller service for the Unicate client.
//!
//! Orchestrates registration and the meeting lifecycle (create, join,
//! leave) by issuing RPC calls over the communication layer, and keeps
//! durable meeting state through the remote cloud session store.

pub mod auth;
pub mod config;
pub mod errors;
pub mod methods;
pub mod models;
pub mod serialize;
pub mod services;

pub use errors::ControllerError;
pub use services::cloud_client::CloudStorageClient;
pub use services::controller_service::ControllerService;

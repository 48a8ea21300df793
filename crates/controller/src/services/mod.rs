//! Controller services.

pub mod cloud_client;
pub mod controller_service;

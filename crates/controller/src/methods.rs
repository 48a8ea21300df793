//! RPC method names shared by the controller and its serving peer.
//!
//! A method must be subscribed on the serving side before `connect` for the
//! name to resolve; ids behind these names are per-connection.

/// Register this client and receive its profile
pub const REGISTER: &str = "controller.register";

/// Create a meeting and receive the stored session
pub const CREATE_MEETING: &str = "controller.create_meeting";

/// Join an existing meeting by id and receive the updated session
pub const JOIN_MEETING: &str = "controller.join_meeting";

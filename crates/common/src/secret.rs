//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports from the [`secrecy`] crate. `SecretString` implements `Debug`
//! with redaction, so any struct that derives `Debug` while holding one gets
//! safe logging behavior for free, and the value is zeroized on drop.
//!
//! Use `SecretString` for password hashes, bearer service tokens and any
//! other credential handled by the communication layer. Reading the inner
//! value always requires an explicit [`ExposeSecret::expose_secret`] call.

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretBox, SecretString};

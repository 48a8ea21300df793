//! Request payloads for the controller RPC methods.

use crate::models::meeting_session::SessionMode;
use crate::models::user_profile::ParticipantRole;
use common::types::MeetingId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload for the register method.
///
/// The plaintext password travels only on this dedicated authentication
/// path; everywhere else the profile carries a hash that serde skips.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Email address to register under
    pub email: String,
    /// Plaintext password, hashed server-side
    pub password: String,
    /// Name shown to other participants
    pub display_name: String,
    /// Avatar URL, if the user set one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Role hint; the server derives the real role from the email domain
    #[serde(default)]
    pub requested_role: ParticipantRole,
}

/// Custom Debug implementation that redacts the password.
impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .field("logo_url", &self.logo_url)
            .field("requested_role", &self.requested_role)
            .finish()
    }
}

/// Payload for the create-meeting method
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    /// Mode of the meeting to create
    pub mode: SessionMode,
}

/// Payload for the join-meeting method
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinMeetingRequest {
    /// Id of the meeting to join
    pub meeting_id: MeetingId,
}

//! User identity model.

use common::secret::SecretString;
use common::types::ParticipantId;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Role a participant holds, derived from the email domain at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    /// Staff member allowed to create meetings
    Instructor,
    /// Enrolled student
    Student,
    /// Fallback role requested before the server has derived the real one
    #[default]
    Guest,
}

/// A user's core, permanent profile.
///
/// Created at registration and held for the process lifetime of the client.
/// Identity equality is by the generated id, not by email. The password
/// hash lives only in the runtime object: serde skips it, so it can never
/// reach a peer or the cloud store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Generated identity key
    pub user_id: ParticipantId,
    /// Email address, used as the login username
    pub email: String,
    /// Name shown to other participants
    pub display_name: String,
    /// Avatar URL, if the user set one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Role derived from the email domain at registration
    pub role: ParticipantRole,
    /// Bcrypt hash of the password; never serialized
    #[serde(skip)]
    pub password_hash: Option<SecretString>,
}

impl UserProfile {
    /// Create a profile with a freshly generated id and no password hash.
    pub fn new(
        email: impl Into<String>,
        display_name: impl Into<String>,
        logo_url: Option<String>,
        role: ParticipantRole,
    ) -> Self {
        Self {
            user_id: ParticipantId::new(),
            email: email.into(),
            display_name: display_name.into(),
            logo_url,
            role,
            password_hash: None,
        }
    }

    /// Replace the role outside the registration path.
    ///
    /// Roles are fixed at registration; this exists for reset and harness
    /// flows only.
    pub fn override_role(&mut self, role: ParticipantRole) {
        self.role = role;
    }
}

impl PartialEq for UserProfile {
    fn eq(&self, other: &Self) -> bool {
        self.user_id == other.user_id
    }
}

impl Eq for UserProfile {}

impl Hash for UserProfile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.user_id.hash(state);
    }
}

//! Meeting session model.

use crate::models::user_profile::UserProfile;
use chrono::Utc;
use common::types::MeetingId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Meeting type, affecting downstream behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionMode {
    /// Short-lived trial meeting
    Test,
    /// Regular class meeting
    Class,
}

/// A meeting created by an instructor.
///
/// The participant map only ever grows, and only through
/// [`add_participant`](Self::add_participant); there is no leave-cleanup. A
/// session has no explicit teardown either: it is abandoned when the owning
/// process drops its reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSession {
    /// Generated unique meeting id
    pub meeting_id: MeetingId,
    /// Email of the instructor who created the meeting
    pub created_by: String,
    /// Creation time in milliseconds since the Unix epoch
    pub created_at: i64,
    /// Session mode chosen at creation
    pub session_mode: SessionMode,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    participants: HashMap<String, UserProfile>,
}

impl MeetingSession {
    /// Create a meeting with a freshly generated id.
    pub fn new(created_by: impl Into<String>, session_mode: SessionMode) -> Self {
        Self {
            meeting_id: MeetingId::new(),
            created_by: created_by.into(),
            created_at: Utc::now().timestamp_millis(),
            session_mode,
            participants: HashMap::new(),
        }
    }

    /// Record a successful join.
    ///
    /// This is the single mutation path for the participant map, keyed by
    /// email; joining twice replaces the earlier entry.
    pub fn add_participant(&mut self, profile: UserProfile) {
        self.participants.insert(profile.email.clone(), profile);
    }

    /// Look up a participant by email.
    #[must_use]
    pub fn participant(&self, email: &str) -> Option<&UserProfile> {
        self.participants.get(email)
    }

    /// All participants, keyed by email.
    #[must_use]
    pub fn participants(&self) -> &HashMap<String, UserProfile> {
        &self.participants
    }
}

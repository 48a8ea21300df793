//! Domain models for the controller service.

pub mod meeting_session;
pub mod messages;
pub mod user_profile;

pub use meeting_session::{MeetingSession, SessionMode};
pub use messages::{CreateMeetingRequest, JoinMeetingRequest, RegisterRequest};
pub use user_profile::{ParticipantRole, UserProfile};

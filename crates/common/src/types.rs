//! Common data types for Unicate components.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A network endpoint identified by hostname and port.
///
/// Used both as a destination identifier for addressed sends and as a
/// listener's own address when registering with a remote party. Equality is
/// by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientNode {
    /// Hostname or IP address of the endpoint
    pub host_name: String,
    /// Port of the endpoint
    pub port: u16,
}

impl ClientNode {
    /// Create a new endpoint address
    #[must_use]
    pub fn new(host_name: impl Into<String>, port: u16) -> Self {
        Self {
            host_name: host_name.into(),
            port,
        }
    }
}

impl fmt::Display for ClientNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host_name, self.port)
    }
}

/// Integer key identifying a logical subsystem for pub/sub routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeetingId(pub Uuid);

impl MeetingId {
    /// Create a new random meeting ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MeetingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MeetingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MeetingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Unique identifier for a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    /// Create a new random participant ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_node_equality_by_value() {
        let a = ClientNode::new("192.168.1.10", 54321);
        let b = ClientNode::new("192.168.1.10", 54321);
        let c = ClientNode::new("192.168.1.10", 54322);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_client_node_display() {
        let node = ClientNode::new("meet.example.org", 8080);
        assert_eq!(node.to_string(), "meet.example.org:8080");
    }

    #[test]
    fn test_meeting_id_round_trip_via_string() {
        let id = MeetingId::new();
        let parsed: MeetingId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_meeting_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<MeetingId>().is_err());
    }

    #[test]
    fn test_meeting_id_serializes_as_string() {
        let id = MeetingId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }
}

//! Client for the remote cloud session store.
//!
//! Creates and fetches meeting sessions over the cloud HTTP API, keyed on a
//! bearer service token. Absence is the normal "not available" outcome:
//! any non-success status and any transport failure yield `None`, with the
//! actual cause logged server-side style rather than surfaced to callers.

use crate::config::{CloudConfig, ConfigError};
use crate::models::{MeetingSession, UserProfile};
use common::secret::{ExposeSecret, SecretString};
use common::types::MeetingId;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::warn;

/// Default HTTP request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the cloud session store API.
pub struct CloudStorageClient {
    http: reqwest::Client,
    base_url: String,
    service_token: SecretString,
}

impl CloudStorageClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: CloudConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url,
            service_token: config.service_token,
        })
    }

    /// Ask the cloud store to create a new meeting session.
    ///
    /// `POST {base}/api/sessions` with the host's profile as the body; only
    /// a `201 Created` response yields the stored session. The profile's
    /// password hash is skipped by serde, so it never reaches the store.
    pub async fn create_meeting_session(&self, host: &UserProfile) -> Option<MeetingSession> {
        let url = format!("{}/api/sessions", self.base_url);
        let response = match self
            .http
            .post(&url)
            .bearer_auth(self.service_token.expose_secret())
            .json(host)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(target: "controller.cloud", error = %err, "Create session request failed");
                return None;
            }
        };

        if response.status() != StatusCode::CREATED {
            warn!(
                target: "controller.cloud",
                status = %response.status(),
                "Create session rejected"
            );
            return None;
        }

        match response.json::<MeetingSession>().await {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(target: "controller.cloud", error = %err, "Create session response unreadable");
                None
            }
        }
    }

    /// Fetch a meeting session by id.
    ///
    /// `GET {base}/api/sessions/{id}`; only a `200 OK` response yields the
    /// session.
    pub async fn get_meeting_session(&self, meeting_id: &MeetingId) -> Option<MeetingSession> {
        let url = format!("{}/api/sessions/{meeting_id}", self.base_url);
        let response = match self
            .http
            .get(&url)
            .bearer_auth(self.service_token.expose_secret())
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(target: "controller.cloud", error = %err, "Get session request failed");
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            warn!(
                target: "controller.cloud",
                status = %response.status(),
                meeting_id = %meeting_id,
                "Session not available"
            );
            return None;
        }

        match response.json::<MeetingSession>().await {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(target: "controller.cloud", error = %err, "Get session response unreadable");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{ParticipantRole, SessionMode};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CloudStorageClient {
        CloudStorageClient::new(CloudConfig::new(
            server.uri(),
            SecretString::from("svc-token-123"),
        ))
        .unwrap()
    }

    fn host() -> UserProfile {
        UserProfile::new(
            "prof@iitpkd.ac.in",
            "Prof",
            None,
            ParticipantRole::Instructor,
        )
    }

    #[tokio::test]
    async fn test_create_session_on_201() {
        let server = MockServer::start().await;
        let session = MeetingSession::new("prof@iitpkd.ac.in", SessionMode::Class);
        let profile = host();

        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .and(header("Authorization", "Bearer svc-token-123"))
            .and(body_json(&profile))
            .respond_with(ResponseTemplate::new(201).set_body_json(&session))
            .expect(1)
            .mount(&server)
            .await;

        let created = client_for(&server).create_meeting_session(&profile).await;
        assert_eq!(created, Some(session));
    }

    #[tokio::test]
    async fn test_create_session_non_2xx_is_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let created = client_for(&server).create_meeting_session(&host()).await;
        assert_eq!(created, None);
    }

    #[tokio::test]
    async fn test_create_session_200_is_not_created() {
        // Only 201 counts as "created"; a plain 200 is treated as absence.
        let server = MockServer::start().await;
        let session = MeetingSession::new("prof@iitpkd.ac.in", SessionMode::Class);
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&session))
            .mount(&server)
            .await;

        let created = client_for(&server).create_meeting_session(&host()).await;
        assert_eq!(created, None);
    }

    #[tokio::test]
    async fn test_create_session_transport_failure_is_empty_result() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        drop(server);

        let created = client.create_meeting_session(&host()).await;
        assert_eq!(created, None);
    }

    #[tokio::test]
    async fn test_get_session_on_200() {
        let server = MockServer::start().await;
        let session = MeetingSession::new("prof@iitpkd.ac.in", SessionMode::Test);

        Mock::given(method("GET"))
            .and(path(format!("/api/sessions/{}", session.meeting_id)))
            .and(header("Authorization", "Bearer svc-token-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&session))
            .expect(1)
            .mount(&server)
            .await;

        let fetched = client_for(&server)
            .get_meeting_session(&session.meeting_id)
            .await;
        assert_eq!(fetched, Some(session));
    }

    #[tokio::test]
    async fn test_get_session_not_found_is_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetched = client_for(&server)
            .get_meeting_session(&MeetingId::new())
            .await;
        assert_eq!(fetched, None);
    }

    #[tokio::test]
    async fn test_create_session_malformed_body_is_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sessions"))
            .respond_with(ResponseTemplate::new(201).set_body_string("not json"))
            .mount(&server)
            .await;

        let created = client_for(&server).create_meeting_session(&host()).await;
        assert_eq!(created, None);
    }
}

//! Meeting lifecycle orchestration over the RPC layer.
//!
//! One service instance per client process, explicitly constructed with its
//! collaborators so tests can inject mocks. The state machine is
//! Unregistered -> Registered -> InMeeting, with leave dropping back to
//! Registered. The state lock is held across each remote call, so guards
//! and the following state update are atomic with respect to concurrent
//! operations.

use crate::errors::ControllerError;
use crate::methods;
use crate::models::{
    CreateMeetingRequest, JoinMeetingRequest, MeetingSession, RegisterRequest, SessionMode,
    UserProfile,
};
use crate::serialize;
use common::types::{ClientNode, MeetingId};
use comms_protocol::dispatch::NetworkController;
use rpc::RpcCaller;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Default)]
struct SessionState {
    profile: Option<UserProfile>,
    session: Option<MeetingSession>,
}

/// Sequences registration, meeting creation and joining for one client.
pub struct ControllerService {
    rpc: Arc<dyn RpcCaller>,
    network: Arc<dyn NetworkController>,
    /// This client's own address, announced on join
    device_node: ClientNode,
    /// Main server address the device attaches to
    server_node: ClientNode,
    state: Mutex<SessionState>,
}

impl ControllerService {
    /// Create a service with its injected collaborators.
    pub fn new(
        rpc: Arc<dyn RpcCaller>,
        network: Arc<dyn NetworkController>,
        device_node: ClientNode,
        server_node: ClientNode,
    ) -> Self {
        Self {
            rpc,
            network,
            device_node,
            server_node,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Register this client with the remote controller.
    ///
    /// Re-registration overwrites the stored profile; this is a
    /// single-user-per-process client, not a multi-tenant server.
    ///
    /// # Errors
    ///
    /// A peer rejection (unsupported domain, duplicate email) surfaces as
    /// [`ControllerError::Rejected`]; an undecodable response as
    /// [`ControllerError::MalformedResponse`].
    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> Result<UserProfile, ControllerError> {
        let mut state = self.state.lock().await;
        if state.profile.is_some() {
            info!(
                target: "controller.service",
                "Re-registering; previous profile will be replaced"
            );
        }

        let payload = serialize::to_payload(&request)?;
        let response = self.rpc.call(methods::REGISTER, payload).await?;
        let profile: UserProfile = serialize::from_payload(&response)?;

        info!(
            target: "controller.service",
            email = %profile.email,
            role = ?profile.role,
            "Registered"
        );
        state.profile = Some(profile.clone());
        Ok(profile)
    }

    /// Create a meeting and enter it.
    ///
    /// # Errors
    ///
    /// Fails with [`ControllerError::NotRegistered`] or
    /// [`ControllerError::AlreadyInMeeting`] before any remote call is made;
    /// those guard failures have no side effects.
    pub async fn create_meeting(
        &self,
        mode: SessionMode,
    ) -> Result<MeetingSession, ControllerError> {
        let mut state = self.state.lock().await;
        Self::ensure_can_enter_meeting(&state)?;

        let payload = serialize::to_payload(&CreateMeetingRequest { mode })?;
        let response = self.rpc.call(methods::CREATE_MEETING, payload).await?;
        let session: MeetingSession = serialize::from_payload(&response)?;

        info!(
            target: "controller.service",
            meeting_id = %session.meeting_id,
            mode = ?mode,
            "Created meeting"
        );
        state.session = Some(session.clone());
        Ok(session)
    }

    /// Join an existing meeting by id.
    ///
    /// The remote side owns adding this user to the session's participant
    /// map; locally the joined session is stored as returned. On success the
    /// network layer is told to announce this device to the coordinator.
    ///
    /// # Errors
    ///
    /// Same guards as [`create_meeting`](Self::create_meeting); a missing
    /// meeting surfaces as [`ControllerError::Rejected`].
    pub async fn join_meeting(
        &self,
        meeting_id: MeetingId,
    ) -> Result<MeetingSession, ControllerError> {
        let mut state = self.state.lock().await;
        Self::ensure_can_enter_meeting(&state)?;

        let payload = serialize::to_payload(&JoinMeetingRequest { meeting_id })?;
        let response = self.rpc.call(methods::JOIN_MEETING, payload).await?;
        let session: MeetingSession = serialize::from_payload(&response)?;

        self.network
            .add_user(&self.device_node, &self.server_node)
            .await?;

        info!(
            target: "controller.service",
            meeting_id = %session.meeting_id,
            created_by = %session.created_by,
            "Joined meeting"
        );
        state.session = Some(session.clone());
        Ok(session)
    }

    /// Leave the active meeting, returning to the registered state.
    ///
    /// # Errors
    ///
    /// Fails with [`ControllerError::NotInMeeting`] when no meeting is
    /// active.
    pub async fn leave_meeting(&self) -> Result<(), ControllerError> {
        let mut state = self.state.lock().await;
        match state.session.take() {
            Some(session) => {
                info!(
                    target: "controller.service",
                    meeting_id = %session.meeting_id,
                    "Left meeting"
                );
                Ok(())
            }
            None => Err(ControllerError::NotInMeeting),
        }
    }

    /// The registered profile, if any.
    pub async fn profile(&self) -> Option<UserProfile> {
        self.state.lock().await.profile.clone()
    }

    /// The active meeting session, if any.
    pub async fn session(&self) -> Option<MeetingSession> {
        self.state.lock().await.session.clone()
    }

    fn ensure_can_enter_meeting(state: &SessionState) -> Result<(), ControllerError> {
        if state.profile.is_none() {
            return Err(ControllerError::NotRegistered);
        }
        if state.session.is_some() {
            return Err(ControllerError::AlreadyInMeeting);
        }
        Ok(())
    }
}

//! The [`SessionManager`], owning every session on the server.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use log::{error, info};
use parking_lot::RwLock;
use tokio::sync::Notify;
use tokio::time::{Duration, Instant};
use uaserve_core::comms::secure_channel::SecureChannel;
use uaserve_types::{
    ByteString, CloseSessionRequest, CloseSessionResponse, CreateSessionRequest,
    CreateSessionResponse, Guid, NodeId, ResponseHeader, SignatureData, StatusCode,
};

use crate::info::ServerInfo;

use super::instance::Session;

static NEXT_SESSION_ID: AtomicU32 = AtomicU32::new(1);

fn next_session_id() -> (NodeId, u32) {
    // Session ids are GUIDs in namespace 1; the numeric id keys the
    // subscription cache.
    let numeric = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
    (NodeId::new(1, Guid::new()), numeric)
}

/// The minimum session timeout granted, in milliseconds.
const MIN_SESSION_TIMEOUT_MS: u64 = 1_000;

/// Manages all sessions on the server.
pub struct SessionManager {
    sessions: HashMap<NodeId, Arc<RwLock<Session>>>,
    info: Arc<ServerInfo>,
    /// Woken whenever a session is added, so the expiry task recomputes
    /// its next deadline.
    notify: Arc<Notify>,
}

impl SessionManager {
    /// Create an empty session manager.
    pub fn new(info: Arc<ServerInfo>, notify: Arc<Notify>) -> Self {
        Self {
            sessions: Default::default(),
            info,
            notify,
        }
    }

    /// The number of sessions, activated or not.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Find a session by its authentication token.
    pub fn find_by_token(&self, authentication_token: &NodeId) -> Option<Arc<RwLock<Session>>> {
        self.sessions
            .values()
            .find(|s| s.read().authentication_token() == authentication_token)
            .cloned()
    }

    /// Handle CreateSession: allocate ids and an unactivated session
    /// bound to the requesting channel.
    pub fn create_session(
        &mut self,
        channel: &SecureChannel,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse, StatusCode> {
        if self.sessions.len() >= self.info.config.limits.max_sessions {
            return Err(StatusCode::BadTooManySessions);
        }

        if request.endpoint_url.is_null() {
            error!("Create session was passed a null endpoint url");
            return Err(StatusCode::BadTcpEndpointUrlInvalid);
        }
        if !self.info.endpoint_exists(request.endpoint_url.as_ref()) {
            return Err(StatusCode::BadTcpEndpointUrlInvalid);
        }

        let session_timeout_ms = (request.requested_session_timeout.floor() as u64)
            .clamp(
                MIN_SESSION_TIMEOUT_MS,
                self.info.config.limits.max_session_timeout_ms,
            );

        let (session_id, session_id_numeric) = next_session_id();
        let authentication_token = NodeId::new(0, Guid::new());
        let server_nonce = ByteString::from(nonce());

        let session = Session::create(
            session_id.clone(),
            session_id_numeric,
            authentication_token.clone(),
            channel.secure_channel_id(),
            Duration::from_millis(session_timeout_ms),
            server_nonce.clone(),
            request.endpoint_url.clone(),
        );
        info!("Created new session with ID {session_id}");
        self.sessions
            .insert(session_id.clone(), Arc::new(RwLock::new(session)));
        self.notify.notify_waiters();

        Ok(CreateSessionResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            session_id,
            authentication_token,
            revised_session_timeout: session_timeout_ms as f64,
            server_nonce,
            server_certificate: ByteString::null(),
            server_endpoints: Some(self.info.endpoint_descriptions()),
            server_software_certificates: None,
            server_signature: SignatureData::null(),
            max_request_message_size: self.info.config.limits.max_message_size as u32,
        })
    }

    /// Handle CloseSession. Returns the closed session so the caller can
    /// delete its subscriptions when the request asks for that.
    pub fn close_session(
        &mut self,
        channel: &SecureChannel,
        request: &CloseSessionRequest,
    ) -> Result<(CloseSessionResponse, Arc<RwLock<Session>>), StatusCode> {
        let Some(session) = self.find_by_token(&request.request_header.authentication_token)
        else {
            return Err(StatusCode::BadSessionIdInvalid);
        };

        let session_id = {
            let session = session.read();
            if !session.is_activated()
                && session.secure_channel_id() != channel.secure_channel_id()
            {
                error!(
                    "close_session rejected, the channel does not match the one used to create the session"
                );
                return Err(StatusCode::BadSecureChannelIdInvalid);
            }
            session.session_id().clone()
        };

        info!("Closed session with ID {session_id}");
        let session = self.sessions.remove(&session_id).expect("session looked up above");
        {
            let mut session_lck = session.write();
            if session_lck.close() {
                self.info.authenticator.session_closed(&session_id);
            }
        }

        Ok((
            CloseSessionResponse {
                response_header: ResponseHeader::new_good(&request.request_header),
            },
            session,
        ))
    }

    /// Remove an expired session, notifying access control exactly once.
    pub fn expire_session(&mut self, id: &NodeId) -> Option<Arc<RwLock<Session>>> {
        let session = self.sessions.remove(id)?;
        info!("Session {id} has expired, removing it");
        {
            let mut session_lck = session.write();
            if session_lck.close() {
                self.info.authenticator.session_closed(id);
            }
        }
        Some(session)
    }

    /// Find expired sessions and the next upcoming deadline.
    pub fn check_session_expiry(&self) -> (Instant, Vec<NodeId>) {
        let now = Instant::now();
        let mut expired = Vec::new();
        let mut expiry =
            now + Duration::from_millis(self.info.config.limits.max_session_timeout_ms);
        for (id, session) in &self.sessions {
            let deadline = session.read().deadline();
            if deadline < now {
                expired.push(id.clone());
            } else if deadline < expiry {
                expiry = deadline;
            }
        }
        (expiry, expired)
    }

    /// Unbind every session bound to `channel_id`, after its channel went
    /// away. The sessions survive until their own timeout so they can be
    /// transferred to a new channel.
    pub fn unbind_channel(&mut self, channel_id: u32) {
        for session in self.sessions.values() {
            let mut session = session.write();
            if session.secure_channel_id() == channel_id {
                session.unbind_channel();
            }
        }
    }
}

fn nonce() -> Vec<u8> {
    use rand::RngCore;
    let mut bytes = vec![0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::SessionManager;
    use crate::{authenticator::DefaultAuthenticator, config::ServerConfig, info::ServerInfo};
    use std::sync::Arc;
    use uaserve_core::comms::secure_channel::{Role, SecureChannel};
    use uaserve_types::{CreateSessionRequest, DecodingOptions, RequestHeader, StatusCode};

    fn manager(max_sessions: usize) -> SessionManager {
        let mut config = ServerConfig::default();
        config.limits.max_sessions = max_sessions;
        SessionManager::new(
            Arc::new(ServerInfo::new(
                Arc::new(config),
                Arc::new(DefaultAuthenticator::new(Default::default())),
            )),
            Arc::new(tokio::sync::Notify::new()),
        )
    }

    fn create_request() -> CreateSessionRequest {
        CreateSessionRequest {
            request_header: RequestHeader::default(),
            endpoint_url: "opc.tcp://127.0.0.1:4840/".into(),
            requested_session_timeout: 120_000.0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn session_limit() {
        let mut mgr = manager(1);
        let channel = SecureChannel::new(Role::Server, DecodingOptions::default());
        mgr.create_session(&channel, &create_request()).unwrap();
        assert_eq!(
            mgr.create_session(&channel, &create_request()).unwrap_err(),
            StatusCode::BadTooManySessions
        );
    }

    #[tokio::test]
    async fn tokens_are_unique() {
        let mut mgr = manager(10);
        let channel = SecureChannel::new(Role::Server, DecodingOptions::default());
        let a = mgr.create_session(&channel, &create_request()).unwrap();
        let b = mgr.create_session(&channel, &create_request()).unwrap();
        assert_ne!(a.session_id, b.session_id);
        assert_ne!(a.authentication_token, b.authentication_token);
    }

    #[tokio::test]
    async fn timeout_clamped() {
        let mut mgr = manager(10);
        let channel = SecureChannel::new(Role::Server, DecodingOptions::default());
        let mut request = create_request();
        request.requested_session_timeout = 10_000_000.0;
        let response = mgr.create_session(&channel, &request).unwrap();
        assert_eq!(response.revised_session_timeout, 60_000.0);
    }
}

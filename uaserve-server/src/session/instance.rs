//! The [`Session`] instance: one authenticated logical context bound to a
//! secure channel.

use hashbrown::HashMap;
use tokio::time::{Duration, Instant};
use uaserve_types::{ByteString, NodeId, StatusCode, UAString};

use crate::authenticator::UserToken;
use crate::identity_token::IdentityToken;
use crate::services::view::BrowseContinuationPoint;

/// One session on the server.
pub struct Session {
    /// The session id, a GUID node id in namespace 1.
    session_id: NodeId,
    /// Compact numeric id used as key into the subscription cache.
    session_id_numeric: u32,
    /// The secret token identifying the session in request headers.
    authentication_token: NodeId,
    /// The id of the channel the session is bound to, 0 while unbound.
    secure_channel_id: u32,
    /// Whether ActivateSession has succeeded.
    activated: bool,
    /// The granted timeout.
    timeout: Duration,
    /// Monotonic deadline; every dispatched service pushes it out.
    deadline: Instant,
    /// The identity the session was activated with.
    identity: IdentityToken,
    /// The user the identity resolved to.
    user_token: Option<UserToken>,
    /// Nonce issued with CreateSession and refreshed on activation.
    session_nonce: ByteString,
    /// The endpoint url the session was created against.
    endpoint_url: UAString,
    /// Preferred locales from activation.
    locale_ids: Option<Vec<UAString>>,
    /// Outstanding browse continuation points.
    continuation_points: HashMap<ByteString, BrowseContinuationPoint>,
    /// Whether the access control hook was told about the teardown.
    closed_reported: bool,
}

impl Session {
    /// Create an unactivated session.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        session_id: NodeId,
        session_id_numeric: u32,
        authentication_token: NodeId,
        secure_channel_id: u32,
        timeout: Duration,
        session_nonce: ByteString,
        endpoint_url: UAString,
    ) -> Session {
        Session {
            session_id,
            session_id_numeric,
            authentication_token,
            secure_channel_id,
            activated: false,
            timeout,
            deadline: Instant::now() + timeout,
            identity: IdentityToken::Anonymous,
            user_token: None,
            session_nonce,
            endpoint_url,
            locale_ids: None,
            continuation_points: HashMap::new(),
            closed_reported: false,
        }
    }

    /// The session id.
    pub fn session_id(&self) -> &NodeId {
        &self.session_id
    }

    /// The compact numeric session id.
    pub fn session_id_numeric(&self) -> u32 {
        self.session_id_numeric
    }

    /// The authentication token of the session.
    pub fn authentication_token(&self) -> &NodeId {
        &self.authentication_token
    }

    /// The channel the session is bound to.
    pub fn secure_channel_id(&self) -> u32 {
        self.secure_channel_id
    }

    /// Whether the session has been activated.
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// The monotonic deadline after which the session has timed out.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// The granted timeout in milliseconds.
    pub fn timeout_ms(&self) -> f64 {
        self.timeout.as_secs_f64() * 1000.0
    }

    /// The session nonce.
    pub fn session_nonce(&self) -> &ByteString {
        &self.session_nonce
    }

    /// The endpoint url the session was created against.
    pub fn endpoint_url(&self) -> &UAString {
        &self.endpoint_url
    }

    /// The user the session acts as, once activated.
    pub fn user_token(&self) -> Option<&UserToken> {
        self.user_token.as_ref()
    }

    /// The identity the session was activated with.
    pub fn identity(&self) -> &IdentityToken {
        &self.identity
    }

    /// The locales the client prefers, from activation.
    pub fn locale_ids(&self) -> Option<&[UAString]> {
        self.locale_ids.as_deref()
    }

    /// Push the deadline out after a successful service call.
    pub fn keep_alive(&mut self) {
        self.deadline = Instant::now() + self.timeout;
    }

    /// `true` once the deadline has passed.
    pub fn is_timed_out(&self, now: Instant) -> bool {
        self.deadline < now
    }

    /// Fail with `BadSessionClosed` if the session has timed out.
    pub fn validate_timed_out(&self) -> Result<(), StatusCode> {
        if self.is_timed_out(Instant::now()) {
            Err(StatusCode::BadSessionClosed)
        } else {
            Ok(())
        }
    }

    /// Activate the session, possibly transferring it to a new channel.
    pub fn activate(
        &mut self,
        secure_channel_id: u32,
        session_nonce: ByteString,
        identity: IdentityToken,
        locale_ids: Option<Vec<UAString>>,
        user_token: UserToken,
    ) {
        self.activated = true;
        self.secure_channel_id = secure_channel_id;
        self.session_nonce = session_nonce;
        self.identity = identity;
        self.locale_ids = locale_ids;
        self.user_token = Some(user_token);
        self.keep_alive();
    }

    /// Unbind the session from its channel; it survives until its own
    /// timeout so a client may transfer it to a new channel.
    pub fn unbind_channel(&mut self) {
        self.secure_channel_id = 0;
    }

    /// Mark the session closed. Returns `true` the first time, letting
    /// the caller report the closure exactly once.
    pub fn close(&mut self) -> bool {
        let first = !self.closed_reported;
        self.closed_reported = true;
        self.activated = false;
        first
    }

    /// The browse continuation points of this session.
    pub fn continuation_points(&mut self) -> &mut HashMap<ByteString, BrowseContinuationPoint> {
        &mut self.continuation_points
    }
}

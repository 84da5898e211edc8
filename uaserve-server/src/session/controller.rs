//! The connection controller: owns the transport and secure channel of one
//! connection, validates sessions, and drives dispatch in receive order.
//! Only Publish responses resolve out of band.

use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uaserve_core::comms::secure_channel::SecureChannel;
use uaserve_core::comms::security_policy::SecurityPolicy;
use uaserve_core::comms::tcp_types::ErrorMessage;
use uaserve_core::{Message, RequestMessage};
use uaserve_types::{
    ActivateSessionRequest, ActivateSessionResponse, ByteString, CancelResponse,
    ChannelSecurityToken, DateTime, MessageSecurityMode, OpenSecureChannelRequest,
    OpenSecureChannelResponse, ResponseHeader, SecurityTokenRequestType, ServiceFault,
    StatusCode,
};

use crate::{
    address_space::AddressSpace,
    channels::SecureChannelManager,
    identity_token::IdentityToken,
    info::ServerInfo,
    services,
    subscriptions::SubscriptionCache,
};

use super::{
    manager::SessionManager,
    message_handler::{HandleMessageResult, MessageHandler, PendingPublishRequest, Response},
};
use crate::transport::tcp::{Request, TcpTransport, TransportPollResult};

/// Everything a connection controller needs from the server.
pub(crate) struct ControllerContext {
    pub info: Arc<ServerInfo>,
    pub session_manager: Arc<RwLock<SessionManager>>,
    pub channel_manager: Arc<Mutex<SecureChannelManager>>,
    pub address_space: Arc<RwLock<AddressSpace>>,
    pub subscriptions: Arc<SubscriptionCache>,
}

/// Controller of one client connection after the handshake.
pub(crate) struct SessionController {
    transport: TcpTransport,
    channel: SecureChannel,
    ctx: ControllerContext,
    handler: MessageHandler,
    /// Parked publish requests of this connection.
    pending_publish: FuturesUnordered<futures::future::BoxFuture<'static, Response>>,
    /// Cancelled when the channel is purged or the server shuts down.
    cancel: CancellationToken,
}

impl SessionController {
    pub fn new(
        transport: TcpTransport,
        channel: SecureChannel,
        ctx: ControllerContext,
        cancel: CancellationToken,
    ) -> Self {
        let handler = MessageHandler::new(
            ctx.info.clone(),
            ctx.address_space.clone(),
            ctx.subscriptions.clone(),
        );
        Self {
            transport,
            channel,
            ctx,
            handler,
            pending_publish: FuturesUnordered::new(),
            cancel,
        }
    }

    /// Drive the connection until it closes.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("Connection cancelled, closing");
                    break;
                }
                // An empty set yields None and disables the branch for
                // this round.
                Some(response) = self.pending_publish.next() => {
                    self.enqueue(response);
                }
                poll = self.transport.poll(&mut self.channel) => {
                    match poll {
                        TransportPollResult::OutgoingMessageSent
                        | TransportPollResult::IncomingChunk => {}
                        TransportPollResult::IncomingMessage(request) => {
                            self.handle_request(request).await;
                        }
                        TransportPollResult::RecoverableError(status, request_id, request_handle) => {
                            warn!("Recoverable error {status} handling a request");
                            let fault = ServiceFault::new(request_handle, status);
                            self.enqueue(Response {
                                message: fault.into(),
                                request_id,
                            });
                        }
                        TransportPollResult::Error(status) => {
                            error!("Fatal transport error {status}, closing connection");
                            self.transport
                                .enqueue_error(ErrorMessage::new(status, "Fatal error"));
                            self.transport.set_closing();
                        }
                        TransportPollResult::Closed => break,
                    }
                }
            }
        }
        self.teardown();
    }

    fn teardown(&mut self) {
        let channel_id = self.channel.secure_channel_id();
        if channel_id != 0 {
            self.ctx.channel_manager.lock().remove(channel_id);
            // Bound sessions become unbound and survive until their own
            // timeout, allowing transfer to a new channel.
            self.ctx.session_manager.write().unbind_channel(channel_id);
        }
        info!("Connection with channel {channel_id} closed");
    }

    fn enqueue(&mut self, response: Response) {
        if let Err(e) = self.transport.enqueue_message_for_send(
            &mut self.channel,
            response.message,
            response.request_id,
        ) {
            error!("Failed to send response: {e}");
            self.transport.set_closing();
        }
    }

    async fn handle_request(&mut self, request: Request) {
        let request_id = request.request_id;
        match request.message {
            RequestMessage::OpenSecureChannel(r) => {
                let response = self.open_secure_channel(&r);
                match response {
                    Ok(response) => self.enqueue(Response {
                        message: response.into(),
                        request_id,
                    }),
                    Err(status) => {
                        // A channel that cannot open is not worth keeping.
                        self.transport
                            .enqueue_error(ErrorMessage::new(status, "Failed to open channel"));
                        self.transport.set_closing();
                    }
                }
            }
            RequestMessage::CloseSecureChannel(_) => {
                // CLO has no response; flush and close.
                debug!("Closing secure channel {}", self.channel.secure_channel_id());
                self.transport.set_closing();
            }
            RequestMessage::GetEndpoints(r) => {
                let result = services::discovery::get_endpoints(&self.ctx.info, &r);
                self.enqueue(Response::from_result(
                    result,
                    r.request_header.request_handle,
                    request_id,
                ));
            }
            RequestMessage::FindServers(r) => {
                let result = services::discovery::find_servers(&self.ctx.info, &r);
                self.enqueue(Response::from_result(
                    result,
                    r.request_header.request_handle,
                    request_id,
                ));
            }
            RequestMessage::CreateSession(r) => {
                let result = {
                    let mut mgr = self.ctx.session_manager.write();
                    mgr.create_session(&self.channel, &r)
                };
                if result.is_ok() {
                    self.ctx
                        .channel_manager
                        .lock()
                        .set_session_bound(self.channel.secure_channel_id(), true);
                }
                self.enqueue(Response::from_result(
                    result,
                    r.request_header.request_handle,
                    request_id,
                ));
            }
            RequestMessage::ActivateSession(r) => {
                let result = self.activate_session(&r).await;
                self.enqueue(Response::from_result(
                    result,
                    r.request_header.request_handle,
                    request_id,
                ));
            }
            RequestMessage::CloseSession(r) => {
                let result = {
                    let mut mgr = self.ctx.session_manager.write();
                    mgr.close_session(&self.channel, &r)
                };
                let result = match result {
                    Ok((response, session)) => {
                        let session = session.read();
                        self.ctx
                            .channel_manager
                            .lock()
                            .set_session_bound(session.secure_channel_id(), false);
                        if r.delete_subscriptions {
                            self.ctx.subscriptions.delete_session_subscriptions(
                                session.session_id_numeric(),
                                StatusCode::BadSessionClosed,
                            );
                        }
                        Ok(response)
                    }
                    Err(e) => Err(e),
                };
                self.enqueue(Response::from_result(
                    result,
                    r.request_header.request_handle,
                    request_id,
                ));
            }
            RequestMessage::Cancel(r) => {
                // Requests are handled in receive order, so there is never
                // anything in flight to cancel except parked publishes,
                // which time out on their own.
                self.enqueue(Response {
                    message: CancelResponse {
                        response_header: ResponseHeader::new_good(&r.request_header),
                        cancel_count: 0,
                    }
                    .into(),
                    request_id,
                });
            }
            message => {
                self.handle_session_message(message, request_id);
            }
        }
    }

    /// Dispatch a message that requires an activated session.
    fn handle_session_message(&mut self, message: RequestMessage, request_id: u32) {
        let request_handle = message.request_handle();
        let authentication_token = &message.request_header().authentication_token;

        let session = {
            let mgr = self.ctx.session_manager.read();
            mgr.find_by_token(authentication_token)
        };
        let Some(session) = session else {
            self.enqueue(Response {
                message: ServiceFault::new(request_handle, StatusCode::BadSessionIdInvalid).into(),
                request_id,
            });
            return;
        };

        let token = {
            let mut session_lck = session.write();
            if session_lck.validate_timed_out().is_err() {
                self.enqueue(Response {
                    message: ServiceFault::new(request_handle, StatusCode::BadSessionIdInvalid)
                        .into(),
                    request_id,
                });
                return;
            }
            if !session_lck.is_activated() {
                self.enqueue(Response {
                    message: ServiceFault::new(request_handle, StatusCode::BadSessionNotActivated)
                        .into(),
                    request_id,
                });
                return;
            }
            if session_lck.secure_channel_id() != self.channel.secure_channel_id() {
                self.enqueue(Response {
                    message: ServiceFault::new(
                        request_handle,
                        StatusCode::BadSecureChannelIdInvalid,
                    )
                    .into(),
                    request_id,
                });
                return;
            }
            // Every dispatched service call refreshes the lifetime.
            session_lck.keep_alive();
            session_lck.user_token().cloned()
        };
        let Some(token) = token else {
            self.enqueue(Response {
                message: ServiceFault::new(request_handle, StatusCode::BadSessionNotActivated)
                    .into(),
                request_id,
            });
            return;
        };

        match self
            .handler
            .handle_message(message, &session, &token, request_id)
        {
            HandleMessageResult::Sync(response) => self.enqueue(response),
            HandleMessageResult::Publish(pending) => {
                self.park_publish(pending);
            }
        }
    }

    fn park_publish(&mut self, pending: PendingPublishRequest) {
        self.pending_publish.push(Box::pin(pending.recv()));
    }

    fn open_secure_channel(
        &mut self,
        request: &OpenSecureChannelRequest,
    ) -> Result<OpenSecureChannelResponse, StatusCode> {
        // Only the unsecured policy ships; everything else is a
        // capability provided from outside.
        if request.security_mode != MessageSecurityMode::None {
            warn!(
                "Rejecting OPN with unsupported security mode {:?}",
                request.security_mode
            );
            return Err(StatusCode::BadSecurityModeRejected);
        }

        let issued = match request.request_type {
            SecurityTokenRequestType::Issue => {
                if self.channel.secure_channel_id() != 0 {
                    return Err(StatusCode::BadInvalidState);
                }
                let mut mgr = self.ctx.channel_manager.lock();
                mgr.open(&self.ctx.info, request.requested_lifetime, self.cancel.clone())?
            }
            SecurityTokenRequestType::Renew => {
                if self.channel.secure_channel_id() == 0 {
                    return Err(StatusCode::BadTcpSecureChannelUnknown);
                }
                let mut mgr = self.ctx.channel_manager.lock();
                mgr.renew(
                    &self.ctx.info,
                    self.channel.secure_channel_id(),
                    request.requested_lifetime,
                )?
            }
        };

        self.channel.set_secure_channel_id(issued.channel_id);
        self.channel.set_security_mode(request.security_mode);
        self.channel.set_security_policy(SecurityPolicy::None);
        self.channel.issue_token(issued.token_id);
        self.channel.set_remote_nonce(&request.client_nonce)?;
        self.channel.create_local_nonce();

        Ok(OpenSecureChannelResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            server_protocol_version: uaserve_core::PROTOCOL_VERSION,
            security_token: ChannelSecurityToken {
                channel_id: issued.channel_id,
                token_id: issued.token_id,
                created_at: DateTime::now(),
                revised_lifetime: issued.revised_lifetime,
            },
            server_nonce: self.channel.local_nonce_as_byte_string(),
        })
    }

    async fn activate_session(
        &mut self,
        request: &ActivateSessionRequest,
    ) -> Result<ActivateSessionResponse, StatusCode> {
        let session = {
            let mgr = self.ctx.session_manager.read();
            mgr.find_by_token(&request.request_header.authentication_token)
        };
        let Some(session) = session else {
            return Err(StatusCode::BadSessionIdInvalid);
        };

        let (endpoint_url, was_activated, old_channel_id) = {
            let session_lck = session.read();
            session_lck.validate_timed_out().map_err(|_| StatusCode::BadSessionIdInvalid)?;
            (
                session_lck.endpoint_url().as_ref().to_string(),
                session_lck.is_activated(),
                session_lck.secure_channel_id(),
            )
        };

        // An unactivated session may only be activated on the channel it
        // was created on; an activated one may transfer to a new channel.
        let channel_id = self.channel.secure_channel_id();
        if !was_activated && old_channel_id != channel_id {
            error!("activate_session rejected, the channel does not match the one used to create the session");
            return Err(StatusCode::BadSecureChannelIdInvalid);
        }

        let Some(endpoint) = self.ctx.info.find_endpoint(&endpoint_url).cloned() else {
            return Err(StatusCode::BadTcpEndpointUrlInvalid);
        };

        let identity = {
            let ctx_r = self.channel.context();
            IdentityToken::new(&request.user_identity_token, &ctx_r.context())
        };
        let user_token = self
            .ctx
            .info
            .authenticator
            .activate_session(&endpoint, &identity)
            .await
            .map_err(|e| e.status())?;

        let server_nonce = ByteString::from(nonce());
        {
            let mut session_lck = session.write();
            session_lck.activate(
                channel_id,
                server_nonce.clone(),
                identity,
                request.locale_ids.clone(),
                user_token,
            );
        }
        if was_activated && old_channel_id != channel_id {
            info!("Session transferred from channel {old_channel_id} to {channel_id}");
            let mut mgr = self.ctx.channel_manager.lock();
            mgr.set_session_bound(old_channel_id, false);
            mgr.set_session_bound(channel_id, true);
        }

        Ok(ActivateSessionResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            server_nonce,
            results: None,
            diagnostic_infos: None,
        })
    }
}

fn nonce() -> Vec<u8> {
    use rand::RngCore;
    let mut bytes = vec![0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

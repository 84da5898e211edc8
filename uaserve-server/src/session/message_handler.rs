//! Dispatch of session-bound requests to their service handlers. Requests
//! arriving here have passed channel validation and session resolution.

use std::sync::Arc;

use log::warn;
use parking_lot::RwLock;
use tokio::time::{Duration, Instant};
use uaserve_core::{Message, RequestMessage, ResponseMessage};
use uaserve_types::{ServiceFault, StatusCode};

use crate::{
    address_space::AddressSpace,
    authenticator::UserToken,
    info::ServerInfo,
    services,
    subscriptions::{PendingPublish, SubscriptionCache},
};

use super::instance::Session;

/// One response ready to be sent, tagged with the request id it answers.
#[derive(Debug)]
pub(crate) struct Response {
    pub message: ResponseMessage,
    pub request_id: u32,
}

impl Response {
    /// Build a response from a handler result, turning errors into
    /// service faults.
    pub fn from_result<T>(
        result: Result<T, StatusCode>,
        request_handle: u32,
        request_id: u32,
    ) -> Response
    where
        T: Into<ResponseMessage>,
    {
        match result {
            Ok(message) => Response {
                message: message.into(),
                request_id,
            },
            Err(status) => Response {
                message: ServiceFault::new(request_handle, status).into(),
                request_id,
            },
        }
    }
}

/// Result of dispatching one message.
pub(crate) enum HandleMessageResult {
    /// The request resolved synchronously.
    Sync(Response),
    /// A publish request was parked; the response arrives through the
    /// returned handle once a notification or keep-alive is ready.
    Publish(PendingPublishRequest),
}

/// Handle on a parked publish request.
pub(crate) struct PendingPublishRequest {
    request_id: u32,
    request_handle: u32,
    recv: tokio::sync::oneshot::Receiver<ResponseMessage>,
}

impl PendingPublishRequest {
    /// Wait for the publish response. This can take arbitrarily long; the
    /// subscription engine resolves the request when there is something
    /// to send or its deadline passes.
    pub async fn recv(self) -> Response {
        match self.recv.await {
            Ok(message) => Response {
                message,
                request_id: self.request_id,
            },
            Err(_) => {
                // Sender dropped, e.g. the session was torn down.
                warn!("Parked publish request dropped without a response");
                Response {
                    message: ServiceFault::new(self.request_handle, StatusCode::BadSessionClosed)
                        .into(),
                    request_id: self.request_id,
                }
            }
        }
    }
}

/// Routes decoded, session-validated requests to the service handlers.
pub(crate) struct MessageHandler {
    info: Arc<ServerInfo>,
    address_space: Arc<RwLock<AddressSpace>>,
    subscriptions: Arc<SubscriptionCache>,
}

impl MessageHandler {
    pub fn new(
        info: Arc<ServerInfo>,
        address_space: Arc<RwLock<AddressSpace>>,
        subscriptions: Arc<SubscriptionCache>,
    ) -> Self {
        Self {
            info,
            address_space,
            subscriptions,
        }
    }

    /// Dispatch one message on behalf of `session`.
    pub fn handle_message(
        &self,
        message: RequestMessage,
        session: &Arc<RwLock<Session>>,
        token: &UserToken,
        request_id: u32,
    ) -> HandleMessageResult {
        let request_handle = message.request_handle();
        let session_id = session.read().session_id_numeric();
        let sync = |result: Response| HandleMessageResult::Sync(result);

        match message {
            RequestMessage::Read(request) => sync(Response::from_result(
                services::attributes::read(&self.info, &self.address_space, token, &request),
                request_handle,
                request_id,
            )),
            RequestMessage::Write(request) => sync(Response::from_result(
                services::attributes::write(&self.info, &self.address_space, token, &request),
                request_handle,
                request_id,
            )),
            RequestMessage::Browse(request) => sync(Response::from_result(
                services::view::browse(&self.info, &self.address_space, session, &request),
                request_handle,
                request_id,
            )),
            RequestMessage::BrowseNext(request) => sync(Response::from_result(
                services::view::browse_next(&self.info, session, &request),
                request_handle,
                request_id,
            )),
            RequestMessage::TranslateBrowsePathsToNodeIds(request) => sync(Response::from_result(
                services::view::translate_browse_paths(&self.info, &self.address_space, &request),
                request_handle,
                request_id,
            )),
            RequestMessage::RegisterNodes(request) => sync(Response::from_result(
                services::view::register_nodes(&self.info, &request),
                request_handle,
                request_id,
            )),
            RequestMessage::UnregisterNodes(request) => sync(Response::from_result(
                services::view::unregister_nodes(&self.info, &request),
                request_handle,
                request_id,
            )),
            RequestMessage::AddNodes(request) => sync(Response::from_result(
                services::node_management::add_nodes(&self.info, &self.address_space, &request),
                request_handle,
                request_id,
            )),
            RequestMessage::AddReferences(request) => sync(Response::from_result(
                services::node_management::add_references(
                    &self.info,
                    &self.address_space,
                    &request,
                ),
                request_handle,
                request_id,
            )),
            RequestMessage::DeleteNodes(request) => sync(Response::from_result(
                services::node_management::delete_nodes(&self.info, &self.address_space, &request),
                request_handle,
                request_id,
            )),
            RequestMessage::DeleteReferences(request) => sync(Response::from_result(
                services::node_management::delete_references(
                    &self.info,
                    &self.address_space,
                    &request,
                ),
                request_handle,
                request_id,
            )),
            RequestMessage::Call(request) => sync(Response::from_result(
                services::method::call(&self.info, &self.address_space, token, &request),
                request_handle,
                request_id,
            )),
            RequestMessage::CreateSubscription(request) => sync(Response::from_result(
                self.subscriptions
                    .create_subscription(session_id, &request, &self.info),
                request_handle,
                request_id,
            )),
            RequestMessage::ModifySubscription(request) => sync(Response::from_result(
                self.subscriptions.modify_subscription(session_id, &request),
                request_handle,
                request_id,
            )),
            RequestMessage::SetPublishingMode(request) => sync(Response::from_result(
                self.subscriptions.set_publishing_mode(session_id, &request),
                request_handle,
                request_id,
            )),
            RequestMessage::DeleteSubscriptions(request) => sync(Response::from_result(
                self.subscriptions
                    .delete_subscriptions(session_id, &request),
                request_handle,
                request_id,
            )),
            RequestMessage::CreateMonitoredItems(request) => {
                let address_space = self.address_space.read();
                let result = self
                    .subscriptions
                    .create_monitored_items(session_id, &request, &self.info, &address_space)
                    .map(|results| uaserve_types::CreateMonitoredItemsResponse {
                        response_header: uaserve_types::ResponseHeader::new_good(
                            &request.request_header,
                        ),
                        results: Some(results),
                        diagnostic_infos: None,
                    });
                sync(Response::from_result(result, request_handle, request_id))
            }
            RequestMessage::ModifyMonitoredItems(request) => {
                let result = self
                    .subscriptions
                    .modify_monitored_items(session_id, &request)
                    .map(|results| uaserve_types::ModifyMonitoredItemsResponse {
                        response_header: uaserve_types::ResponseHeader::new_good(
                            &request.request_header,
                        ),
                        results: Some(results),
                        diagnostic_infos: None,
                    });
                sync(Response::from_result(result, request_handle, request_id))
            }
            RequestMessage::SetMonitoringMode(request) => {
                let result = self
                    .subscriptions
                    .set_monitoring_mode(session_id, &request)
                    .map(|results| uaserve_types::SetMonitoringModeResponse {
                        response_header: uaserve_types::ResponseHeader::new_good(
                            &request.request_header,
                        ),
                        results: Some(results),
                        diagnostic_infos: None,
                    });
                sync(Response::from_result(result, request_handle, request_id))
            }
            RequestMessage::DeleteMonitoredItems(request) => {
                let ids = request.monitored_item_ids.clone().unwrap_or_default();
                let result = self
                    .subscriptions
                    .delete_monitored_items(session_id, request.subscription_id, &ids)
                    .map(|results| uaserve_types::DeleteMonitoredItemsResponse {
                        response_header: uaserve_types::ResponseHeader::new_good(
                            &request.request_header,
                        ),
                        results: Some(results),
                        diagnostic_infos: None,
                    });
                sync(Response::from_result(result, request_handle, request_id))
            }
            RequestMessage::Republish(request) => sync(Response::from_result(
                self.subscriptions.republish(session_id, &request),
                request_handle,
                request_id,
            )),
            RequestMessage::Publish(request) => self.publish(session_id, request, request_id),
            message => {
                log::debug!(
                    "Message handler does not handle this kind of message {:?}",
                    message
                );
                sync(Response {
                    message: ServiceFault::new(request_handle, StatusCode::BadServiceUnsupported)
                        .into(),
                    request_id,
                })
            }
        }
    }

    /// Park a publish request in the subscription engine.
    fn publish(
        &self,
        session_id: u32,
        request: Box<uaserve_types::PublishRequest>,
        request_id: u32,
    ) -> HandleMessageResult {
        let request_handle = request.request_header.request_handle;
        let timeout = request.request_header.timeout_hint;
        let timeout = if timeout == 0 {
            self.info.config.publish_timeout_default_ms
        } else {
            timeout.into()
        };
        let (send, recv) = tokio::sync::oneshot::channel();
        let pending = PendingPublish {
            response: send,
            request,
            ack_results: None,
            deadline: Instant::now() + Duration::from_millis(timeout),
        };
        match self.subscriptions.enqueue_publish_request(session_id, pending) {
            Ok(()) => HandleMessageResult::Publish(PendingPublishRequest {
                request_id,
                request_handle,
                recv,
            }),
            Err(status) => HandleMessageResult::Sync(Response {
                message: ServiceFault::new(request_handle, status).into(),
                request_id,
            }),
        }
    }
}

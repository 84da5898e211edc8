//! End-to-end scenarios over a live connection: handshake, sessions,
//! reads and writes, browsing, node management, subscriptions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use uaserve::core::{RequestMessage, ResponseMessage};
use uaserve::server::{AuthManager, DefaultAuthenticator, UserToken};
use uaserve::types::{
    AddNodesItem, AddNodesRequest, AttributesMask, BrowseDescription, BrowseDirection,
    BrowseRequest, ContextOwned, CreateMonitoredItemsRequest, CreateSubscriptionRequest,
    DataChangeNotification, DataTypeId, ExpandedNodeId, ExtensionObject, Guid, Identifier,
    MonitoredItemCreateRequest, NodeClass, NodeId, ObjectId, PublishRequest, QualifiedName,
    ReferenceTypeId, RepublishRequest, StatusCode, SubscriptionAcknowledgement,
    TimestampsToReturn, TryFromVariant, VariableAttributes, VariableTypeId, Variant,
};

use crate::utils::{start_server, RawClient};

#[tokio::test]
async fn hello_open_session_read_namespace_array() {
    let server = start_server(None).await;
    let mut client = RawClient::connect(&server).await;

    let (channel_id, token_id, revised_lifetime, server_nonce) =
        client.open_secure_channel().await;
    assert_eq!(channel_id, 1);
    assert_eq!(token_id, 1);
    assert_eq!(revised_lifetime, 3_600_000);
    assert_eq!(server_nonce.as_ref().len(), 32);

    let session_id = client.create_session(120_000.0).await;
    assert_eq!(session_id.namespace, 1);
    assert!(matches!(session_id.identifier, Identifier::Guid(_)));
    client.activate_session().await;

    // i=2255 is Server_NamespaceArray
    let value = client.read_value(NodeId::new(0, 2255u32)).await;
    assert_eq!(value.status(), StatusCode::Good);
    let namespaces: Vec<String> = Vec::try_from_variant(value.value.unwrap()).unwrap();
    assert_eq!(namespaces[0], "http://opcfoundation.org/UA/");
    assert_eq!(namespaces[1], "urn:uaserve:test");
}

#[tokio::test]
async fn read_without_session_is_rejected() {
    let server = start_server(None).await;
    let mut client = RawClient::connect(&server).await;
    client.open_secure_channel().await;

    let status = client.read_expect_fault(NodeId::new(0, 2255u32)).await;
    assert_eq!(status, StatusCode::BadSessionIdInvalid);
}

#[tokio::test]
async fn read_before_activation_is_rejected() {
    let server = start_server(None).await;
    let mut client = RawClient::connect(&server).await;
    client.open_secure_channel().await;
    client.create_session(120_000.0).await;

    let status = client.read_expect_fault(NodeId::new(0, 2255u32)).await;
    assert_eq!(status, StatusCode::BadSessionNotActivated);
}

fn the_answer_item(node_id: &NodeId) -> AddNodesItem {
    let ctx = ContextOwned::new_default();
    let attributes = VariableAttributes {
        specified_attributes: (AttributesMask::DISPLAY_NAME
            | AttributesMask::VALUE
            | AttributesMask::DATA_TYPE
            | AttributesMask::VALUE_RANK
            | AttributesMask::ACCESS_LEVEL
            | AttributesMask::USER_ACCESS_LEVEL)
            .bits(),
        display_name: "the answer".into(),
        value: Variant::Int32(42),
        data_type: DataTypeId::Int32.into(),
        value_rank: -1,
        // Read | Write
        access_level: 3,
        user_access_level: 3,
        ..Default::default()
    };
    AddNodesItem {
        parent_node_id: ExpandedNodeId::new(ObjectId::ObjectsFolder),
        reference_type_id: ReferenceTypeId::Organizes.into(),
        requested_new_node_id: ExpandedNodeId::new(node_id.clone()),
        browse_name: QualifiedName::new(1, "the.answer"),
        node_class: NodeClass::Variable,
        node_attributes: ExtensionObject::from_message(&attributes, &ctx.context()).unwrap(),
        type_definition: ExpandedNodeId::new(VariableTypeId::BaseDataVariableType),
    }
}

async fn add_the_answer(client: &mut RawClient, node_id: &NodeId) {
    let request: RequestMessage = AddNodesRequest {
        request_header: client.request_header(),
        nodes_to_add: Some(vec![the_answer_item(node_id)]),
    }
    .into();
    match client.send(request).await {
        ResponseMessage::AddNodes(response) => {
            let results = response.results.unwrap();
            assert_eq!(results[0].status_code, StatusCode::Good);
            assert_eq!(&results[0].added_node_id, node_id);
        }
        other => panic!("Expected add nodes response, got {other:?}"),
    }
}

#[tokio::test]
async fn add_variable_read_write() {
    let server = start_server(None).await;
    let mut client = RawClient::connect(&server).await;
    client.open_secure_channel().await;
    client.create_session(120_000.0).await;
    client.activate_session().await;

    let node_id = NodeId::new(1, "the.answer");
    add_the_answer(&mut client, &node_id).await;

    // The node is visible through the embedder handle as well
    assert!(server.handle.address_space().read().node_exists(&node_id));

    // Initial value reads back
    let value = client.read_value(node_id.clone()).await;
    assert_eq!(value.value, Some(Variant::Int32(42)));

    // Write-then-read observes the written value
    assert_eq!(
        client.write_value(node_id.clone(), 123i32).await,
        StatusCode::Good
    );
    let value = client.read_value(node_id.clone()).await;
    assert_eq!(value.value, Some(Variant::Int32(123)));
    assert_eq!(value.status(), StatusCode::Good);

    // A string does not go into an Int32 variable
    assert_eq!(
        client.write_value(node_id.clone(), "hello").await,
        StatusCode::BadTypeMismatch
    );
    let value = client.read_value(node_id).await;
    assert_eq!(value.value, Some(Variant::Int32(123)));
}

#[tokio::test]
async fn browse_with_subtypes_finds_server() {
    let server = start_server(None).await;
    let mut client = RawClient::connect(&server).await;
    client.open_secure_channel().await;
    client.create_session(120_000.0).await;
    client.activate_session().await;

    let request: RequestMessage = BrowseRequest {
        request_header: client.request_header(),
        view: Default::default(),
        requested_max_references_per_node: 0,
        nodes_to_browse: Some(vec![BrowseDescription {
            node_id: ObjectId::ObjectsFolder.into(),
            browse_direction: BrowseDirection::Forward,
            // i=33 HierarchicalReferences
            reference_type_id: NodeId::new(0, 33u32),
            include_subtypes: true,
            node_class_mask: 0,
            result_mask: 0x3f,
        }]),
    }
    .into();
    let ResponseMessage::Browse(response) = client.send(request).await else {
        panic!("Expected browse response");
    };
    let results = response.results.unwrap();
    assert_eq!(results[0].status_code, StatusCode::Good);
    let references = results[0].references.as_ref().unwrap();
    let server_ref = references
        .iter()
        .find(|r| r.node_id.node_id == NodeId::new(0, 2253u32))
        .expect("Server object reachable from Objects via Organizes");
    // Organizes (i=35) is a subtype of HierarchicalReferences (i=33)
    assert_eq!(server_ref.reference_type_id, NodeId::new(0, 35u32));
}

struct CountingAuthenticator {
    inner: DefaultAuthenticator,
    closed: AtomicUsize,
}

impl CountingAuthenticator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: DefaultAuthenticator::new(Default::default()),
            closed: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl AuthManager for CountingAuthenticator {
    async fn activate_session(
        &self,
        endpoint: &uaserve::server::config::ServerEndpoint,
        identity: &uaserve::server::IdentityToken,
    ) -> Result<UserToken, uaserve::types::Error> {
        self.inner.activate_session(endpoint, identity).await
    }

    fn session_closed(&self, _session_id: &NodeId) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test(start_paused = true)]
async fn session_times_out() {
    let authenticator = CountingAuthenticator::new();
    let server = start_server(Some(authenticator.clone())).await;
    let mut client = RawClient::connect(&server).await;
    client.open_secure_channel().await;
    client.create_session(1_000.0).await;
    client.activate_session().await;

    // Do nothing past the timeout; the cleanup task runs on the paused
    // clock.
    tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;

    let status = client.read_expect_fault(NodeId::new(0, 2255u32)).await;
    assert_eq!(status, StatusCode::BadSessionIdInvalid);
    assert_eq!(authenticator.closed.load(Ordering::SeqCst), 1);
}

async fn setup_subscription(client: &mut RawClient, node_id: &NodeId) -> u32 {
    // A generous keep-alive count keeps the paused-clock test free of
    // keep-alive responses racing the data changes.
    let request: RequestMessage = CreateSubscriptionRequest {
        request_header: client.request_header(),
        requested_publishing_interval: 100.0,
        requested_lifetime_count: 1000,
        requested_max_keep_alive_count: 100,
        max_notifications_per_publish: 0,
        publishing_enabled: true,
        priority: 0,
    }
    .into();
    let ResponseMessage::CreateSubscription(response) = client.send(request).await else {
        panic!("Expected create subscription response");
    };
    assert_eq!(response.revised_publishing_interval, 100.0);
    let subscription_id = response.subscription_id;

    let request: RequestMessage = CreateMonitoredItemsRequest {
        request_header: client.request_header(),
        subscription_id,
        timestamps_to_return: TimestampsToReturn::Both,
        items_to_create: Some(vec![MonitoredItemCreateRequest::new_value(
            node_id.clone(),
            77,
            50.0,
            10,
        )]),
    }
    .into();
    let ResponseMessage::CreateMonitoredItems(response) = client.send(request).await else {
        panic!("Expected create monitored items response");
    };
    assert_eq!(
        response.results.unwrap()[0].status_code,
        StatusCode::Good
    );
    subscription_id
}

fn data_change_values(notification_data: &[ExtensionObject]) -> Vec<(u32, Variant)> {
    let ctx = ContextOwned::new_default();
    let mut out = Vec::new();
    for object in notification_data {
        let dcn: DataChangeNotification = object.decode_inner(&ctx.context()).unwrap();
        for item in dcn.monitored_items.unwrap_or_default() {
            out.push((
                item.client_handle,
                item.value.value.unwrap_or(Variant::Empty),
            ));
        }
    }
    out
}

#[tokio::test(start_paused = true)]
async fn subscription_publish_republish_acknowledge() {
    let server = start_server(None).await;
    let mut client = RawClient::connect(&server).await;
    client.open_secure_channel().await;
    client.create_session(120_000.0).await;
    client.activate_session().await;

    let node_id = NodeId::new(1, "the.answer");
    add_the_answer(&mut client, &node_id).await;
    let subscription_id = setup_subscription(&mut client, &node_id).await;

    // Park a publish request, then write a new value.
    let publish: RequestMessage = PublishRequest {
        request_header: client.request_header(),
        subscription_acknowledgements: None,
    }
    .into();
    let publish_handle = client.send_nowait(publish).await;

    assert_eq!(
        client.write_value(node_id.clone(), 43i32).await,
        StatusCode::Good
    );

    // The write response for the value write arrives first, then the
    // publish response once the publishing interval elapses.
    let response = client.recv().await;
    let ResponseMessage::Publish(publish_response) = response else {
        panic!("Expected publish response, got {response:?}");
    };
    assert_eq!(
        publish_response.response_header.request_handle,
        publish_handle
    );
    assert_eq!(publish_response.subscription_id, subscription_id);
    let message = &publish_response.notification_message;
    assert_eq!(message.sequence_number, 1);
    let values = data_change_values(message.notification_data.as_deref().unwrap());
    assert_eq!(values, vec![(77, Variant::Int32(43))]);

    // Republish returns the retained message while it is unacknowledged.
    let request: RequestMessage = RepublishRequest {
        request_header: client.request_header(),
        subscription_id,
        retransmit_sequence_number: 1,
    }
    .into();
    let ResponseMessage::Republish(republish) = client.send(request).await else {
        panic!("Expected republish response");
    };
    assert_eq!(republish.notification_message.sequence_number, 1);

    // The next publish acknowledges sequence number 1.
    let publish: RequestMessage = PublishRequest {
        request_header: client.request_header(),
        subscription_acknowledgements: Some(vec![SubscriptionAcknowledgement {
            subscription_id,
            sequence_number: 1,
        }]),
    }
    .into();
    client.send_nowait(publish).await;

    // Trigger another notification so the parked publish resolves and
    // carries the acknowledgement result.
    assert_eq!(
        client.write_value(node_id.clone(), 44i32).await,
        StatusCode::Good
    );
    let ResponseMessage::Publish(second) = client.recv().await else {
        panic!("Expected second publish response");
    };
    assert_eq!(second.results, Some(vec![StatusCode::Good]));
    assert_eq!(second.notification_message.sequence_number, 2);

    // Acknowledged messages are no longer available for republish.
    let request: RequestMessage = RepublishRequest {
        request_header: client.request_header(),
        subscription_id,
        retransmit_sequence_number: 1,
    }
    .into();
    let ResponseMessage::ServiceFault(fault) = client.send(request).await else {
        panic!("Expected service fault");
    };
    assert_eq!(
        fault.response_header.service_result,
        StatusCode::BadMessageNotAvailable
    );
}

#[tokio::test]
async fn renew_secure_channel_token() {
    let server = start_server(None).await;
    let mut client = RawClient::connect(&server).await;
    let (channel_id, first_token, _, _) = client.open_secure_channel().await;

    let request: RequestMessage = uaserve::types::OpenSecureChannelRequest {
        request_header: client.request_header(),
        client_protocol_version: 0,
        request_type: uaserve::types::SecurityTokenRequestType::Renew,
        security_mode: uaserve::types::MessageSecurityMode::None,
        client_nonce: uaserve::types::ByteString::from(vec![9u8; 32]),
        requested_lifetime: 600_000,
    }
    .into();
    let ResponseMessage::OpenSecureChannel(response) = client.send(request).await else {
        panic!("Expected open secure channel response");
    };
    let token = &response.security_token;
    assert_eq!(token.channel_id, channel_id);
    assert!(token.token_id > first_token);
    assert_eq!(token.revised_lifetime, 600_000);
}

#[tokio::test]
async fn guid_session_ids_are_unique() {
    let server = start_server(None).await;

    let mut first = RawClient::connect(&server).await;
    first.open_secure_channel().await;
    let a = first.create_session(60_000.0).await;

    let mut second = RawClient::connect(&server).await;
    second.open_secure_channel().await;
    let b = second.create_session(60_000.0).await;

    assert_ne!(a, b);
    let _: &Guid = match &a.identifier {
        Identifier::Guid(g) => g,
        other => panic!("Session id should be a guid, got {other:?}"),
    };
}

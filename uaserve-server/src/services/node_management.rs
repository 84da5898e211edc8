//! The node management service set: AddNodes, AddReferences, DeleteNodes
//! and DeleteReferences.

use log::debug;
use parking_lot::RwLock;
use uaserve_nodes::{
    DataType, Method, Node, NodeBase, NodeType, Object, ObjectType, ReferenceType, Variable,
    VariableType, View,
};
use uaserve_types::{
    AddNodesItem, AddNodesRequest, AddNodesResponse, AddNodesResult, AddReferencesRequest,
    AddReferencesResponse, AttributeId, ContextOwned, DeleteNodesRequest, DeleteNodesResponse,
    DeleteReferencesRequest, DeleteReferencesResponse, ExtensionObject, MethodAttributes,
    NodeClass, NodeId, ObjectAttributes, ObjectId, ObjectTypeAttributes, ReferenceTypeAttributes,
    ReferenceTypeId, ResponseHeader, StatusCode, VariableAttributes, VariableTypeAttributes,
    Variant, ViewAttributes, DataTypeAttributes,
};

use crate::address_space::AddressSpace;
use crate::info::ServerInfo;

/// Handle an AddNodes request.
pub fn add_nodes(
    info: &ServerInfo,
    address_space: &RwLock<AddressSpace>,
    request: &AddNodesRequest,
) -> Result<AddNodesResponse, StatusCode> {
    let Some(nodes_to_add) = &request.nodes_to_add else {
        return Err(StatusCode::BadNothingToDo);
    };
    if nodes_to_add.is_empty() {
        return Err(StatusCode::BadNothingToDo);
    }
    if nodes_to_add.len() > info.config.limits.operational.max_nodes_per_node_management {
        return Err(StatusCode::BadTooManyOperations);
    }

    let mut address_space = address_space.write();
    let results = nodes_to_add
        .iter()
        .map(|item| match add_one_node(&mut address_space, item) {
            Ok(added_node_id) => AddNodesResult {
                status_code: StatusCode::Good,
                added_node_id,
            },
            Err(status_code) => AddNodesResult {
                status_code,
                added_node_id: NodeId::null(),
            },
        })
        .collect();

    Ok(AddNodesResponse {
        response_header: ResponseHeader::new_good(&request.request_header),
        results: Some(results),
        diagnostic_infos: None,
    })
}

fn add_one_node(
    address_space: &mut AddressSpace,
    item: &AddNodesItem,
) -> Result<NodeId, StatusCode> {
    if !item.parent_node_id.is_local() {
        return Err(StatusCode::BadParentNodeIdInvalid);
    }
    let parent = &item.parent_node_id.node_id;
    if !address_space.node_exists(parent) {
        return Err(StatusCode::BadParentNodeIdInvalid);
    }
    if item.browse_name.is_null() {
        return Err(StatusCode::BadBrowseNameInvalid);
    }
    if !matches!(
        address_space.find(&item.reference_type_id),
        Some(NodeType::ReferenceType(_))
    ) {
        return Err(StatusCode::BadReferenceTypeIdInvalid);
    }
    let requested_id = &item.requested_new_node_id;
    if !requested_id.is_local() {
        return Err(StatusCode::BadNodeIdRejected);
    }
    if !requested_id.node_id.is_null() && address_space.node_exists(&requested_id.node_id) {
        return Err(StatusCode::BadNodeIdExists);
    }

    // Objects and variables need a type definition, type and view nodes
    // must not carry one.
    let needs_type_definition =
        matches!(item.node_class, NodeClass::Object | NodeClass::Variable);
    if needs_type_definition {
        let td = &item.type_definition.node_id;
        if td.is_null() || !address_space.node_exists(td) {
            return Err(StatusCode::BadTypeDefinitionInvalid);
        }
        let expected_class = match item.node_class {
            NodeClass::Object => NodeClass::ObjectType,
            _ => NodeClass::VariableType,
        };
        if address_space.find(td).map(|n| n.node_class()) != Some(expected_class) {
            return Err(StatusCode::BadTypeDefinitionInvalid);
        }
    } else if !item.type_definition.is_null() {
        return Err(StatusCode::BadTypeDefinitionInvalid);
    }

    let node = build_node(item)?;
    let namespace = if requested_id.node_id.is_null() {
        item.browse_name.namespace_index
    } else {
        requested_id.node_id.namespace
    };
    let added_node_id = address_space.insert_with_assigned_id(node, namespace)?;

    // Tie the node to its parent and type definition. The node was
    // validated above, so these cannot fail other than by races within
    // this same write lock, which do not happen.
    address_space
        .add_reference(parent, item.reference_type_id.clone(), &added_node_id, true)
        .map_err(|_| StatusCode::BadInternalError)?;
    if needs_type_definition {
        address_space
            .add_reference(
                &added_node_id,
                ReferenceTypeId::HasTypeDefinition,
                &item.type_definition.node_id.clone(),
                true,
            )
            .map_err(|_| StatusCode::BadInternalError)?;
    }
    debug!("Added node {added_node_id}");
    Ok(added_node_id)
}

fn build_node(item: &AddNodesItem) -> Result<NodeType, StatusCode> {
    let ctx_owned = ContextOwned::new_default();
    let ctx = ctx_owned.context();
    let attributes = &item.node_attributes;
    let node_id = item.requested_new_node_id.node_id.clone();

    // Every attribute structure decodes against its own node class; a
    // mismatched or missing structure is BadNodeAttributesInvalid.
    let node: NodeType = match item.node_class {
        NodeClass::Object => {
            let attrs = decode_attributes::<ObjectAttributes>(
                attributes,
                ObjectId::ObjectAttributes_Encoding_DefaultBinary,
                &ctx,
            )?;
            let mut node = Object::default();
            node.base_mut().set_node_id(node_id);
            node.base_mut().set_browse_name(item.browse_name.clone());
            node.set_display_name(attrs.display_name);
            apply_common(&mut node, attrs.write_mask, attrs.user_write_mask)?;
            node.set_attribute(AttributeId::EventNotifier, Variant::Byte(attrs.event_notifier))
                .map_err(|_| StatusCode::BadNodeAttributesInvalid)?;
            node.into()
        }
        NodeClass::Variable => {
            let attrs = decode_attributes::<VariableAttributes>(
                attributes,
                ObjectId::VariableAttributes_Encoding_DefaultBinary,
                &ctx,
            )?;
            let mut node = Variable::default();
            node.base_mut().set_node_id(node_id);
            node.base_mut().set_browse_name(item.browse_name.clone());
            node.set_display_name(attrs.display_name);
            apply_common(&mut node, attrs.write_mask, attrs.user_write_mask)?;
            node.set_value_direct(attrs.value);
            node.set_data_type(attrs.data_type);
            node.set_value_rank(attrs.value_rank);
            if let Some(dims) = attrs.array_dimensions {
                node.set_array_dimensions(dims);
            }
            node.set_access_level(uaserve_nodes::AccessLevel::from_bits_truncate(
                attrs.access_level,
            ));
            node.set_user_access_level(uaserve_nodes::AccessLevel::from_bits_truncate(
                attrs.user_access_level,
            ));
            node.set_minimum_sampling_interval(attrs.minimum_sampling_interval);
            node.set_historizing(attrs.historizing);
            node.into()
        }
        NodeClass::Method => {
            let attrs = decode_attributes::<MethodAttributes>(
                attributes,
                ObjectId::MethodAttributes_Encoding_DefaultBinary,
                &ctx,
            )?;
            let mut node = Method::default();
            node.base_mut().set_node_id(node_id);
            node.base_mut().set_browse_name(item.browse_name.clone());
            node.set_display_name(attrs.display_name);
            apply_common(&mut node, attrs.write_mask, attrs.user_write_mask)?;
            node.set_executable(attrs.executable);
            node.set_user_executable(attrs.user_executable);
            node.into()
        }
        NodeClass::ObjectType => {
            let attrs = decode_attributes::<ObjectTypeAttributes>(
                attributes,
                ObjectId::ObjectTypeAttributes_Encoding_DefaultBinary,
                &ctx,
            )?;
            let mut node = ObjectType::default();
            node.base_mut().set_node_id(node_id);
            node.base_mut().set_browse_name(item.browse_name.clone());
            node.set_display_name(attrs.display_name);
            apply_common(&mut node, attrs.write_mask, attrs.user_write_mask)?;
            node.set_is_abstract(attrs.is_abstract);
            node.into()
        }
        NodeClass::VariableType => {
            let attrs = decode_attributes::<VariableTypeAttributes>(
                attributes,
                ObjectId::VariableTypeAttributes_Encoding_DefaultBinary,
                &ctx,
            )?;
            let mut node = VariableType::default();
            node.base_mut().set_node_id(node_id);
            node.base_mut().set_browse_name(item.browse_name.clone());
            node.set_display_name(attrs.display_name);
            apply_common(&mut node, attrs.write_mask, attrs.user_write_mask)?;
            node.set_is_abstract(attrs.is_abstract);
            node.set_data_type(attrs.data_type);
            node.into()
        }
        NodeClass::ReferenceType => {
            let attrs = decode_attributes::<ReferenceTypeAttributes>(
                attributes,
                ObjectId::ReferenceTypeAttributes_Encoding_DefaultBinary,
                &ctx,
            )?;
            let mut node = ReferenceType::default();
            node.base_mut().set_node_id(node_id);
            node.base_mut().set_browse_name(item.browse_name.clone());
            node.set_display_name(attrs.display_name);
            apply_common(&mut node, attrs.write_mask, attrs.user_write_mask)?;
            node.set_is_abstract(attrs.is_abstract);
            node.set_symmetric(attrs.symmetric);
            node.set_inverse_name(attrs.inverse_name);
            node.into()
        }
        NodeClass::DataType => {
            let attrs = decode_attributes::<DataTypeAttributes>(
                attributes,
                ObjectId::DataTypeAttributes_Encoding_DefaultBinary,
                &ctx,
            )?;
            let mut node = DataType::default();
            node.base_mut().set_node_id(node_id);
            node.base_mut().set_browse_name(item.browse_name.clone());
            node.set_display_name(attrs.display_name);
            apply_common(&mut node, attrs.write_mask, attrs.user_write_mask)?;
            node.set_is_abstract(attrs.is_abstract);
            node.into()
        }
        NodeClass::View => {
            let attrs = decode_attributes::<ViewAttributes>(
                attributes,
                ObjectId::ViewAttributes_Encoding_DefaultBinary,
                &ctx,
            )?;
            let mut node = View::default();
            node.base_mut().set_node_id(node_id);
            node.base_mut().set_browse_name(item.browse_name.clone());
            node.set_display_name(attrs.display_name);
            apply_common(&mut node, attrs.write_mask, attrs.user_write_mask)?;
            node.set_attribute(
                AttributeId::ContainsNoLoops,
                Variant::Boolean(attrs.contains_no_loops),
            )
            .map_err(|_| StatusCode::BadNodeAttributesInvalid)?;
            node.set_attribute(
                AttributeId::EventNotifier,
                Variant::Byte(attrs.event_notifier),
            )
            .map_err(|_| StatusCode::BadNodeAttributesInvalid)?;
            node.into()
        }
        NodeClass::Unspecified => return Err(StatusCode::BadNodeClassInvalid),
    };
    Ok(node)
}

fn decode_attributes<T: uaserve_types::BinaryDecodable>(
    object: &ExtensionObject,
    expected: ObjectId,
    ctx: &uaserve_types::Context<'_>,
) -> Result<T, StatusCode> {
    if object.object_id() != Some(expected) {
        return Err(StatusCode::BadNodeAttributesInvalid);
    }
    object
        .decode_inner::<T>(ctx)
        .map_err(|_| StatusCode::BadNodeAttributesInvalid)
}

fn apply_common<T: uaserve_nodes::Node>(
    node: &mut T,
    write_mask: u32,
    user_write_mask: u32,
) -> Result<(), StatusCode> {
    if write_mask != 0 {
        node.set_write_mask(uaserve_types::WriteMask::from_bits_truncate(write_mask));
    }
    if user_write_mask != 0 {
        node.set_user_write_mask(uaserve_types::WriteMask::from_bits_truncate(
            user_write_mask,
        ));
    }
    Ok(())
}

/// Handle an AddReferences request.
pub fn add_references(
    info: &ServerInfo,
    address_space: &RwLock<AddressSpace>,
    request: &AddReferencesRequest,
) -> Result<AddReferencesResponse, StatusCode> {
    let Some(references_to_add) = &request.references_to_add else {
        return Err(StatusCode::BadNothingToDo);
    };
    if references_to_add.is_empty() {
        return Err(StatusCode::BadNothingToDo);
    }
    if references_to_add.len() > info.config.limits.operational.max_nodes_per_node_management {
        return Err(StatusCode::BadTooManyOperations);
    }

    let mut address_space = address_space.write();
    let results = references_to_add
        .iter()
        .map(|item| {
            if !item.target_server_uri.is_null() || !item.target_node_id.is_local() {
                return StatusCode::BadReferenceNotAllowed;
            }
            if !matches!(
                address_space.find(&item.reference_type_id),
                Some(NodeType::ReferenceType(_))
            ) {
                return StatusCode::BadReferenceTypeIdInvalid;
            }
            if item.source_node_id == item.target_node_id.node_id {
                return StatusCode::BadInvalidSelfReference;
            }
            match address_space.add_reference(
                &item.source_node_id,
                item.reference_type_id.clone(),
                &item.target_node_id.node_id,
                item.is_forward,
            ) {
                Ok(()) => StatusCode::Good,
                Err(status) => status,
            }
        })
        .collect();

    Ok(AddReferencesResponse {
        response_header: ResponseHeader::new_good(&request.request_header),
        results: Some(results),
        diagnostic_infos: None,
    })
}

/// Handle a DeleteNodes request.
pub fn delete_nodes(
    info: &ServerInfo,
    address_space: &RwLock<AddressSpace>,
    request: &DeleteNodesRequest,
) -> Result<DeleteNodesResponse, StatusCode> {
    let Some(nodes_to_delete) = &request.nodes_to_delete else {
        return Err(StatusCode::BadNothingToDo);
    };
    if nodes_to_delete.is_empty() {
        return Err(StatusCode::BadNothingToDo);
    }
    if nodes_to_delete.len() > info.config.limits.operational.max_nodes_per_node_management {
        return Err(StatusCode::BadTooManyOperations);
    }

    let mut address_space = address_space.write();
    let results = nodes_to_delete
        .iter()
        .map(|item| {
            if !address_space.node_exists(&item.node_id) {
                StatusCode::BadNodeIdUnknown
            } else if item.node_id.namespace == 0 {
                // The core namespace is not the client's to dismantle.
                StatusCode::BadNoDeleteRights
            } else {
                address_space.delete(&item.node_id, item.delete_target_references);
                StatusCode::Good
            }
        })
        .collect();

    Ok(DeleteNodesResponse {
        response_header: ResponseHeader::new_good(&request.request_header),
        results: Some(results),
        diagnostic_infos: None,
    })
}

/// Handle a DeleteReferences request.
pub fn delete_references(
    info: &ServerInfo,
    address_space: &RwLock<AddressSpace>,
    request: &DeleteReferencesRequest,
) -> Result<DeleteReferencesResponse, StatusCode> {
    let Some(references_to_delete) = &request.references_to_delete else {
        return Err(StatusCode::BadNothingToDo);
    };
    if references_to_delete.is_empty() {
        return Err(StatusCode::BadNothingToDo);
    }
    if references_to_delete.len() > info.config.limits.operational.max_nodes_per_node_management
    {
        return Err(StatusCode::BadTooManyOperations);
    }

    let mut address_space = address_space.write();
    let results = references_to_delete
        .iter()
        .map(|item| {
            if !item.target_node_id.is_local() {
                return StatusCode::BadReferenceNotAllowed;
            }
            match address_space.delete_reference(
                &item.source_node_id,
                item.reference_type_id.clone(),
                &item.target_node_id.node_id,
                item.is_forward,
                item.delete_bidirectional,
            ) {
                Ok(()) => StatusCode::Good,
                Err(status) => status,
            }
        })
        .collect();

    Ok(DeleteReferencesResponse {
        response_header: ResponseHeader::new_good(&request.request_header),
        results: Some(results),
        diagnostic_infos: None,
    })
}

#[cfg(test)]
mod tests {
    use super::add_nodes;
    use crate::address_space::{populate_core_namespace, AddressSpace};
    use crate::authenticator::DefaultAuthenticator;
    use crate::config::ServerConfig;
    use crate::info::ServerInfo;
    use parking_lot::RwLock;
    use std::sync::Arc;
    use uaserve_types::{
        AddNodesItem, AddNodesRequest, AttributesMask, ContextOwned, ExpandedNodeId,
        ExtensionObject, NodeClass, NodeId, ObjectId, QualifiedName, ReferenceTypeId,
        RequestHeader, StatusCode, VariableAttributes, VariableTypeId, Variant,
    };

    fn setup() -> (ServerInfo, RwLock<AddressSpace>) {
        let info = ServerInfo::new(
            Arc::new(ServerConfig::default()),
            Arc::new(DefaultAuthenticator::new(Default::default())),
        );
        let mut space = AddressSpace::new();
        populate_core_namespace(&mut space, "urn:test");
        (info, RwLock::new(space))
    }

    fn variable_item(node_id: NodeId, parent: NodeId) -> AddNodesItem {
        let ctx = ContextOwned::new_default();
        let attributes = VariableAttributes {
            specified_attributes: (AttributesMask::DISPLAY_NAME
                | AttributesMask::VALUE
                | AttributesMask::DATA_TYPE
                | AttributesMask::VALUE_RANK
                | AttributesMask::ACCESS_LEVEL
                | AttributesMask::USER_ACCESS_LEVEL)
                .bits(),
            display_name: "the.answer".into(),
            value: Variant::Int32(42),
            data_type: uaserve_types::DataTypeId::Int32.into(),
            value_rank: -1,
            access_level: 3,
            user_access_level: 3,
            ..Default::default()
        };
        AddNodesItem {
            parent_node_id: ExpandedNodeId::new(parent),
            reference_type_id: ReferenceTypeId::Organizes.into(),
            requested_new_node_id: ExpandedNodeId::new(node_id),
            browse_name: QualifiedName::new(1, "the.answer"),
            node_class: NodeClass::Variable,
            node_attributes: ExtensionObject::from_message(&attributes, &ctx.context()).unwrap(),
            type_definition: ExpandedNodeId::new(VariableTypeId::BaseDataVariableType),
        }
    }

    #[test]
    fn add_variable_under_objects() {
        let (info, space) = setup();
        let id = NodeId::new(1, "the.answer");
        let response = add_nodes(
            &info,
            &space,
            &AddNodesRequest {
                request_header: RequestHeader::default(),
                nodes_to_add: Some(vec![variable_item(
                    id.clone(),
                    ObjectId::ObjectsFolder.into(),
                )]),
            },
        )
        .unwrap();
        let results = response.results.unwrap();
        assert_eq!(results[0].status_code, StatusCode::Good);
        assert_eq!(results[0].added_node_id, id);

        let space = space.read();
        assert!(space.node_exists(&id));
        // The node hangs off its parent and has its type definition.
        assert_eq!(
            space.type_definition(&id),
            Some(VariableTypeId::BaseDataVariableType.into())
        );
    }

    #[test]
    fn duplicate_id_rejected() {
        let (info, space) = setup();
        let id = NodeId::new(1, "the.answer");
        let request = AddNodesRequest {
            request_header: RequestHeader::default(),
            nodes_to_add: Some(vec![variable_item(
                id.clone(),
                ObjectId::ObjectsFolder.into(),
            )]),
        };
        add_nodes(&info, &space, &request).unwrap();
        let response = add_nodes(&info, &space, &request).unwrap();
        assert_eq!(
            response.results.unwrap()[0].status_code,
            StatusCode::BadNodeIdExists
        );
    }

    #[test]
    fn missing_parent_rejected() {
        let (info, space) = setup();
        let response = add_nodes(
            &info,
            &space,
            &AddNodesRequest {
                request_header: RequestHeader::default(),
                nodes_to_add: Some(vec![variable_item(
                    NodeId::new(1, "x"),
                    NodeId::new(1, "nosuch.parent"),
                )]),
            },
        )
        .unwrap();
        assert_eq!(
            response.results.unwrap()[0].status_code,
            StatusCode::BadParentNodeIdInvalid
        );
    }
}

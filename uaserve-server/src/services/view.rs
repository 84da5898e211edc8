//! The view service set: Browse, BrowseNext,
//! TranslateBrowsePathsToNodeIds, RegisterNodes and UnregisterNodes.

use parking_lot::RwLock;
use uaserve_nodes::{NodeBase, NodeType};
use uaserve_types::{
    BrowseDescription, BrowseDescriptionResultMask, BrowseDirection, BrowseNextRequest,
    BrowseNextResponse, BrowsePath, BrowsePathResult, BrowsePathTarget, BrowseRequest,
    BrowseResponse, BrowseResult, ByteString, ExpandedNodeId, Guid, NodeClass, NodeId,
    QualifiedName, ReferenceDescription, ReferenceTypeId, RegisterNodesRequest,
    RegisterNodesResponse, ResponseHeader, StatusCode, TranslateBrowsePathsToNodeIdsRequest,
    TranslateBrowsePathsToNodeIdsResponse, UnregisterNodesRequest, UnregisterNodesResponse,
};

use crate::address_space::AddressSpace;
use crate::info::ServerInfo;
use crate::session::Session;

/// The saved state of a browse that returned only part of its results.
pub struct BrowseContinuationPoint {
    remaining: Vec<ReferenceDescription>,
    max_references_per_node: usize,
}

/// Handle a Browse request.
pub fn browse(
    info: &ServerInfo,
    address_space: &RwLock<AddressSpace>,
    session: &RwLock<Session>,
    request: &BrowseRequest,
) -> Result<BrowseResponse, StatusCode> {
    let Some(nodes_to_browse) = &request.nodes_to_browse else {
        return Err(StatusCode::BadNothingToDo);
    };
    if nodes_to_browse.is_empty() {
        return Err(StatusCode::BadNothingToDo);
    }
    if nodes_to_browse.len() > info.config.limits.operational.max_nodes_per_browse {
        return Err(StatusCode::BadTooManyOperations);
    }
    if !request.view.view_id.is_null() {
        // Views are in the address space model but the server defines none.
        return Err(StatusCode::BadViewIdUnknown);
    }

    let max_references_per_node = revise_max_references(info, request.requested_max_references_per_node);

    let address_space = address_space.read();
    let mut session = session.write();
    let results = nodes_to_browse
        .iter()
        .map(|description| {
            browse_node(
                info,
                &address_space,
                &mut session,
                description,
                max_references_per_node,
            )
        })
        .collect();

    Ok(BrowseResponse {
        response_header: ResponseHeader::new_good(&request.request_header),
        results: Some(results),
        diagnostic_infos: None,
    })
}

fn revise_max_references(info: &ServerInfo, requested: u32) -> usize {
    let server_max = info.config.limits.operational.max_references_per_browse_node;
    if requested == 0 {
        server_max
    } else {
        (requested as usize).min(server_max)
    }
}

fn browse_node(
    info: &ServerInfo,
    address_space: &AddressSpace,
    session: &mut Session,
    description: &BrowseDescription,
    max_references_per_node: usize,
) -> BrowseResult {
    if matches!(description.browse_direction, BrowseDirection::Invalid) {
        return browse_error(StatusCode::BadBrowseDirectionInvalid);
    }
    if !address_space.node_exists(&description.node_id) {
        return browse_error(StatusCode::BadNodeIdUnknown);
    }
    let filter = if description.reference_type_id.is_null() {
        None
    } else {
        if !matches!(
            address_space.find(&description.reference_type_id),
            Some(NodeType::ReferenceType(_))
        ) {
            return browse_error(StatusCode::BadReferenceTypeIdInvalid);
        }
        Some((
            description.reference_type_id.clone(),
            description.include_subtypes,
        ))
    };

    let result_mask = BrowseDescriptionResultMask::from_bits_truncate(description.result_mask);
    let node_class_mask = description.node_class_mask;

    let mut references: Vec<ReferenceDescription> = address_space
        .find_references(&description.node_id, filter, description.browse_direction)
        .filter_map(|reference| {
            let target = address_space.find(reference.target_node)?;
            let node_class = target.node_class();
            if node_class_mask != 0 && node_class_mask & (node_class as i32 as u32) == 0 {
                return None;
            }
            Some(make_reference_description(
                address_space,
                reference.target_node,
                target,
                reference.reference_type,
                matches!(reference.direction, uaserve_nodes::ReferenceDirection::Forward),
                result_mask,
            ))
        })
        .collect();

    if references.len() > max_references_per_node {
        let remaining = references.split_off(max_references_per_node);
        let Some(continuation_point) = store_continuation_point(
            info,
            session,
            BrowseContinuationPoint {
                remaining,
                max_references_per_node,
            },
        ) else {
            return browse_error(StatusCode::BadNoContinuationPoints);
        };
        return BrowseResult {
            status_code: StatusCode::Good,
            continuation_point,
            references: Some(references),
        };
    }

    BrowseResult {
        status_code: StatusCode::Good,
        continuation_point: ByteString::null(),
        references: Some(references),
    }
}

fn browse_error(status_code: StatusCode) -> BrowseResult {
    BrowseResult {
        status_code,
        continuation_point: ByteString::null(),
        references: None,
    }
}

fn make_reference_description(
    address_space: &AddressSpace,
    target_id: &NodeId,
    target: &NodeType,
    reference_type: &NodeId,
    is_forward: bool,
    result_mask: BrowseDescriptionResultMask,
) -> ReferenceDescription {
    let node = target.as_node();
    let type_definition = if result_mask
        .contains(BrowseDescriptionResultMask::RESULT_MASK_TYPE_DEFINITION)
        && matches!(
            target.node_class(),
            NodeClass::Object | NodeClass::Variable
        ) {
        address_space
            .type_definition(target_id)
            .map(ExpandedNodeId::new)
            .unwrap_or_default()
    } else {
        ExpandedNodeId::null()
    };

    ReferenceDescription {
        reference_type_id: if result_mask
            .contains(BrowseDescriptionResultMask::RESULT_MASK_REFERENCE_TYPE)
        {
            reference_type.clone()
        } else {
            NodeId::null()
        },
        is_forward,
        node_id: ExpandedNodeId::new(target_id.clone()),
        browse_name: if result_mask.contains(BrowseDescriptionResultMask::RESULT_MASK_BROWSE_NAME)
        {
            node.browse_name().clone()
        } else {
            QualifiedName::null()
        },
        display_name: if result_mask
            .contains(BrowseDescriptionResultMask::RESULT_MASK_DISPLAY_NAME)
        {
            node.display_name().clone()
        } else {
            Default::default()
        },
        node_class: if result_mask.contains(BrowseDescriptionResultMask::RESULT_MASK_NODE_CLASS) {
            target.node_class()
        } else {
            NodeClass::Unspecified
        },
        type_definition,
    }
}

fn store_continuation_point(
    info: &ServerInfo,
    session: &mut Session,
    point: BrowseContinuationPoint,
) -> Option<ByteString> {
    let points = session.continuation_points();
    if points.len() >= info.config.limits.max_browse_continuation_points {
        return None;
    }
    let id = ByteString::from(Guid::new());
    points.insert(id.clone(), point);
    Some(id)
}

/// Handle a BrowseNext request: continue or release stored continuation
/// points.
pub fn browse_next(
    info: &ServerInfo,
    session: &RwLock<Session>,
    request: &BrowseNextRequest,
) -> Result<BrowseNextResponse, StatusCode> {
    let Some(continuation_points) = &request.continuation_points else {
        return Err(StatusCode::BadNothingToDo);
    };
    if continuation_points.is_empty() {
        return Err(StatusCode::BadNothingToDo);
    }
    if continuation_points.len() > info.config.limits.operational.max_nodes_per_browse {
        return Err(StatusCode::BadTooManyOperations);
    }

    let mut session = session.write();
    let results = continuation_points
        .iter()
        .map(|cp| {
            let Some(mut point) = session.continuation_points().remove(cp) else {
                return browse_error(StatusCode::BadContinuationPointInvalid);
            };
            if request.release_continuation_points {
                return BrowseResult {
                    status_code: StatusCode::Good,
                    continuation_point: ByteString::null(),
                    references: None,
                };
            }
            if point.remaining.len() > point.max_references_per_node {
                let rest = point.remaining.split_off(point.max_references_per_node);
                let references = std::mem::replace(&mut point.remaining, rest);
                let id = ByteString::from(Guid::new());
                session.continuation_points().insert(id.clone(), point);
                BrowseResult {
                    status_code: StatusCode::Good,
                    continuation_point: id,
                    references: Some(references),
                }
            } else {
                BrowseResult {
                    status_code: StatusCode::Good,
                    continuation_point: ByteString::null(),
                    references: Some(point.remaining),
                }
            }
        })
        .collect();

    Ok(BrowseNextResponse {
        response_header: ResponseHeader::new_good(&request.request_header),
        results: Some(results),
        diagnostic_infos: None,
    })
}

/// Handle a TranslateBrowsePathsToNodeIds request.
pub fn translate_browse_paths(
    info: &ServerInfo,
    address_space: &RwLock<AddressSpace>,
    request: &TranslateBrowsePathsToNodeIdsRequest,
) -> Result<TranslateBrowsePathsToNodeIdsResponse, StatusCode> {
    let Some(browse_paths) = &request.browse_paths else {
        return Err(StatusCode::BadNothingToDo);
    };
    if browse_paths.is_empty() {
        return Err(StatusCode::BadNothingToDo);
    }
    if browse_paths.len()
        > info
            .config
            .limits
            .operational
            .max_nodes_per_translate_browse_paths
    {
        return Err(StatusCode::BadTooManyOperations);
    }

    let address_space = address_space.read();
    let results = browse_paths
        .iter()
        .map(|path| translate_one(&address_space, path))
        .collect();

    Ok(TranslateBrowsePathsToNodeIdsResponse {
        response_header: ResponseHeader::new_good(&request.request_header),
        results: Some(results),
        diagnostic_infos: None,
    })
}

fn translate_one(address_space: &AddressSpace, path: &BrowsePath) -> BrowsePathResult {
    if !address_space.node_exists(&path.starting_node) {
        return BrowsePathResult {
            status_code: StatusCode::BadNodeIdUnknown,
            targets: None,
        };
    }
    let Some(elements) = &path.relative_path.elements else {
        return BrowsePathResult {
            status_code: StatusCode::BadNothingToDo,
            targets: None,
        };
    };
    if elements.is_empty() {
        return BrowsePathResult {
            status_code: StatusCode::BadNothingToDo,
            targets: None,
        };
    }

    // Walk the path breadth first, collecting every matching end node.
    let mut current: Vec<NodeId> = vec![path.starting_node.clone()];
    for element in elements {
        if element.target_name.is_null() {
            return BrowsePathResult {
                status_code: StatusCode::BadBrowseNameInvalid,
                targets: None,
            };
        }
        // A null reference type means any hierarchical reference.
        let (reference_type, include_subtypes): (NodeId, bool) =
            if element.reference_type_id.is_null() {
                (ReferenceTypeId::HierarchicalReferences.into(), true)
            } else {
                (element.reference_type_id.clone(), element.include_subtypes)
            };
        let mut next = Vec::new();
        for node in &current {
            let found = address_space.find_child_by_browse_name(
                node,
                &reference_type,
                include_subtypes,
                element.is_inverse,
                &element.target_name,
            );
            for f in found {
                if !next.contains(&f) {
                    next.push(f);
                }
            }
        }
        current = next;
        if current.is_empty() {
            break;
        }
    }

    if current.is_empty() {
        return BrowsePathResult {
            status_code: StatusCode::BadNoMatch,
            targets: None,
        };
    }
    BrowsePathResult {
        status_code: StatusCode::Good,
        targets: Some(
            current
                .into_iter()
                .map(|node| BrowsePathTarget {
                    target_id: ExpandedNodeId::new(node),
                    remaining_path_index: u32::MAX,
                })
                .collect(),
        ),
    }
}

/// Handle a RegisterNodes request. The ids are returned unchanged; the
/// semantics are stateless from the client's point of view.
pub fn register_nodes(
    info: &ServerInfo,
    request: &RegisterNodesRequest,
) -> Result<RegisterNodesResponse, StatusCode> {
    let Some(nodes) = &request.nodes_to_register else {
        return Err(StatusCode::BadNothingToDo);
    };
    if nodes.is_empty() {
        return Err(StatusCode::BadNothingToDo);
    }
    if nodes.len() > info.config.limits.operational.max_nodes_per_register_nodes {
        return Err(StatusCode::BadTooManyOperations);
    }
    Ok(RegisterNodesResponse {
        response_header: ResponseHeader::new_good(&request.request_header),
        registered_node_ids: Some(nodes.clone()),
    })
}

/// Handle an UnregisterNodes request.
pub fn unregister_nodes(
    info: &ServerInfo,
    request: &UnregisterNodesRequest,
) -> Result<UnregisterNodesResponse, StatusCode> {
    let Some(nodes) = &request.nodes_to_unregister else {
        return Err(StatusCode::BadNothingToDo);
    };
    if nodes.is_empty() {
        return Err(StatusCode::BadNothingToDo);
    }
    if nodes.len() > info.config.limits.operational.max_nodes_per_register_nodes {
        return Err(StatusCode::BadTooManyOperations);
    }
    Ok(UnregisterNodesResponse {
        response_header: ResponseHeader::new_good(&request.request_header),
    })
}

#[cfg(test)]
mod tests {
    use super::{browse, translate_browse_paths};
    use crate::address_space::{populate_core_namespace, AddressSpace};
    use crate::authenticator::DefaultAuthenticator;
    use crate::config::ServerConfig;
    use crate::info::ServerInfo;
    use crate::session::Session;
    use parking_lot::RwLock;
    use std::sync::Arc;
    use tokio::time::Duration;
    use uaserve_types::{
        BrowseDescription, BrowseDirection, BrowsePath, BrowseRequest, ByteString, NodeId,
        ObjectId, QualifiedName, ReferenceTypeId, RelativePath, RelativePathElement,
        RequestHeader, StatusCode, TranslateBrowsePathsToNodeIdsRequest, UAString,
    };

    fn setup() -> (ServerInfo, RwLock<AddressSpace>, RwLock<Session>) {
        let info = ServerInfo::new(
            Arc::new(ServerConfig::default()),
            Arc::new(DefaultAuthenticator::new(Default::default())),
        );
        let mut space = AddressSpace::new();
        populate_core_namespace(&mut space, "urn:test");
        let session = Session::create(
            NodeId::new(1, uaserve_types::Guid::new()),
            1,
            NodeId::new(0, uaserve_types::Guid::new()),
            1,
            Duration::from_secs(60),
            ByteString::null(),
            UAString::from("opc.tcp://localhost:4840/"),
        );
        (info, RwLock::new(space), RwLock::new(session))
    }

    #[tokio::test]
    async fn browse_objects_with_subtypes_finds_server() {
        let (info, space, session) = setup();
        let response = browse(
            &info,
            &space,
            &session,
            &BrowseRequest {
                request_header: RequestHeader::default(),
                view: Default::default(),
                requested_max_references_per_node: 0,
                nodes_to_browse: Some(vec![BrowseDescription {
                    node_id: ObjectId::ObjectsFolder.into(),
                    browse_direction: BrowseDirection::Forward,
                    reference_type_id: ReferenceTypeId::HierarchicalReferences.into(),
                    include_subtypes: true,
                    node_class_mask: 0,
                    result_mask: 0x3f,
                }]),
            },
        )
        .unwrap();

        let results = response.results.unwrap();
        assert_eq!(results[0].status_code, StatusCode::Good);
        let references = results[0].references.as_ref().unwrap();
        // The Server object hangs off Objects via Organizes, a subtype of
        // HierarchicalReferences.
        let server = references
            .iter()
            .find(|r| r.node_id.node_id == ObjectId::Server)
            .expect("server object in browse results");
        assert_eq!(server.reference_type_id, ReferenceTypeId::Organizes);
        assert!(server.is_forward);
    }

    #[tokio::test]
    async fn browse_twice_is_idempotent() {
        let (info, space, session) = setup();
        let request = BrowseRequest {
            request_header: RequestHeader::default(),
            view: Default::default(),
            requested_max_references_per_node: 0,
            nodes_to_browse: Some(vec![BrowseDescription {
                node_id: ObjectId::RootFolder.into(),
                browse_direction: BrowseDirection::Both,
                reference_type_id: NodeId::null(),
                include_subtypes: true,
                node_class_mask: 0,
                result_mask: 0x3f,
            }]),
        };
        let a = browse(&info, &space, &session, &request).unwrap();
        let b = browse(&info, &space, &session, &request).unwrap();
        assert_eq!(a.results, b.results);
    }

    #[tokio::test]
    async fn translate_root_to_server() {
        let (info, space, _) = setup();
        let response = translate_browse_paths(
            &info,
            &space,
            &TranslateBrowsePathsToNodeIdsRequest {
                request_header: RequestHeader::default(),
                browse_paths: Some(vec![BrowsePath {
                    starting_node: ObjectId::RootFolder.into(),
                    relative_path: RelativePath {
                        elements: Some(vec![
                            RelativePathElement {
                                reference_type_id: NodeId::null(),
                                is_inverse: false,
                                include_subtypes: true,
                                target_name: QualifiedName::new(0, "Objects"),
                            },
                            RelativePathElement {
                                reference_type_id: NodeId::null(),
                                is_inverse: false,
                                include_subtypes: true,
                                target_name: QualifiedName::new(0, "Server"),
                            },
                        ]),
                    },
                }]),
            },
        )
        .unwrap();
        let results = response.results.unwrap();
        assert_eq!(results[0].status_code, StatusCode::Good);
        let targets = results[0].targets.as_ref().unwrap();
        assert_eq!(targets[0].target_id.node_id, ObjectId::Server);
        assert_eq!(targets[0].remaining_path_index, u32::MAX);
    }
}

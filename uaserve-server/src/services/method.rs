//! The method service set: Call.

use parking_lot::RwLock;
use uaserve_nodes::NodeType;
use uaserve_types::{
    CallMethodRequest, CallMethodResult, CallRequest, CallResponse, ReferenceTypeId,
    ResponseHeader, StatusCode,
};

use crate::address_space::AddressSpace;
use crate::authenticator::UserToken;
use crate::info::ServerInfo;

/// Handle a Call request.
pub fn call(
    info: &ServerInfo,
    address_space: &RwLock<AddressSpace>,
    token: &UserToken,
    request: &CallRequest,
) -> Result<CallResponse, StatusCode> {
    let Some(methods_to_call) = &request.methods_to_call else {
        return Err(StatusCode::BadNothingToDo);
    };
    if methods_to_call.is_empty() {
        return Err(StatusCode::BadNothingToDo);
    }
    if methods_to_call.len() > info.config.limits.operational.max_nodes_per_method_call {
        return Err(StatusCode::BadTooManyOperations);
    }

    let address_space = address_space.read();
    let results = methods_to_call
        .iter()
        .map(|method| call_one(info, &address_space, token, method))
        .collect();

    Ok(CallResponse {
        response_header: ResponseHeader::new_good(&request.request_header),
        results: Some(results),
        diagnostic_infos: None,
    })
}

fn call_one(
    info: &ServerInfo,
    address_space: &AddressSpace,
    token: &UserToken,
    request: &CallMethodRequest,
) -> CallMethodResult {
    if !address_space.node_exists(&request.object_id) {
        return call_error(StatusCode::BadNodeIdUnknown);
    }
    let Some(NodeType::Method(method)) = address_space.find(&request.method_id) else {
        return call_error(StatusCode::BadMethodInvalid);
    };
    // The method must be a component of the object it is called on.
    let is_component = address_space
        .find_references(
            &request.object_id,
            Some((ReferenceTypeId::HasComponent, true)),
            uaserve_types::BrowseDirection::Forward,
        )
        .any(|r| r.target_node == &request.method_id);
    if !is_component {
        return call_error(StatusCode::BadMethodInvalid);
    }

    if !method.executable() {
        return call_error(StatusCode::BadNotSupported);
    }
    if !info
        .authenticator
        .allow_call(token, &request.method_id, method.user_executable())
    {
        return call_error(StatusCode::BadUserAccessDenied);
    }
    let Some(callback) = method.callback() else {
        return call_error(StatusCode::BadNotSupported);
    };

    let input = request.input_arguments.as_deref().unwrap_or(&[]);
    match callback(&request.object_id, input) {
        Ok(output) => CallMethodResult {
            status_code: StatusCode::Good,
            input_argument_results: None,
            input_argument_diagnostic_infos: None,
            output_arguments: Some(output),
        },
        Err(status_code) => call_error(status_code),
    }
}

fn call_error(status_code: StatusCode) -> CallMethodResult {
    CallMethodResult {
        status_code,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::call;
    use crate::address_space::{populate_core_namespace, AddressSpace};
    use crate::authenticator::{DefaultAuthenticator, UserToken};
    use crate::config::ServerConfig;
    use crate::info::ServerInfo;
    use parking_lot::RwLock;
    use std::sync::Arc;
    use uaserve_nodes::{MethodBuilder, ObjectBuilder};
    use uaserve_types::{
        CallMethodRequest, CallRequest, NodeId, ObjectId, RequestHeader, StatusCode,
        TryFromVariant, Variant,
    };

    fn setup() -> (ServerInfo, RwLock<AddressSpace>, NodeId, NodeId) {
        let info = ServerInfo::new(
            Arc::new(ServerConfig::default()),
            Arc::new(DefaultAuthenticator::new(Default::default())),
        );
        let mut space = AddressSpace::new();
        populate_core_namespace(&mut space, "urn:test");

        let object_id = NodeId::new(1, "machine");
        ObjectBuilder::new(&object_id, "machine", "machine")
            .organized_by(ObjectId::ObjectsFolder)
            .insert(&mut space);

        let method_id = NodeId::new(1, "machine.double");
        MethodBuilder::new(&method_id, "double", "double")
            .executable(true)
            .component_of(object_id.clone())
            .callback(Arc::new(|_object, input| {
                let v = input.first().cloned().unwrap_or(Variant::Empty);
                let v = i32::try_from_variant(v)?;
                Ok(vec![Variant::Int32(v * 2)])
            }))
            .insert(&mut space);

        (info, RwLock::new(space), object_id, method_id)
    }

    fn call_one(
        info: &ServerInfo,
        space: &RwLock<AddressSpace>,
        object_id: NodeId,
        method_id: NodeId,
        input: Vec<Variant>,
    ) -> uaserve_types::CallMethodResult {
        let mut response = call(
            info,
            space,
            &UserToken("anonymous".to_string()),
            &CallRequest {
                request_header: RequestHeader::default(),
                methods_to_call: Some(vec![CallMethodRequest {
                    object_id,
                    method_id,
                    input_arguments: Some(input),
                }]),
            },
        )
        .unwrap();
        response.results.as_mut().unwrap().remove(0)
    }

    #[test]
    fn call_method() {
        let (info, space, object_id, method_id) = setup();
        let result = call_one(
            &info,
            &space,
            object_id,
            method_id,
            vec![Variant::Int32(21)],
        );
        assert_eq!(result.status_code, StatusCode::Good);
        assert_eq!(result.output_arguments.unwrap()[0], Variant::Int32(42));
    }

    #[test]
    fn call_on_wrong_object() {
        let (info, space, _, method_id) = setup();
        let result = call_one(
            &info,
            &space,
            ObjectId::Server.into(),
            method_id,
            vec![Variant::Int32(21)],
        );
        assert_eq!(result.status_code, StatusCode::BadMethodInvalid);
    }

    #[test]
    fn bad_argument_type() {
        let (info, space, object_id, method_id) = setup();
        let result = call_one(
            &info,
            &space,
            object_id,
            method_id,
            vec![Variant::from("nope")],
        );
        assert_eq!(result.status_code, StatusCode::BadTypeMismatch);
    }
}

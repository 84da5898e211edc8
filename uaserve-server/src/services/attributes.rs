//! The attribute service set: Read and Write.

use std::str::FromStr;

use log::debug;
use parking_lot::RwLock;
use uaserve_nodes::{AccessLevel, Node, NodeType, VariableValue, VALUE_RANK_ANY,
    VALUE_RANK_ONE_OR_MORE_DIMENSIONS, VALUE_RANK_SCALAR, VALUE_RANK_SCALAR_OR_ONE_DIMENSION};
use uaserve_types::{
    AttributeId, DataTypeId, DataValue, NodeId, NumericRange, ReadRequest, ReadResponse,
    ResponseHeader, StatusCode, TimestampsToReturn, Variant, VariantTypeId, WriteMask,
    WriteRequest, WriteResponse, WriteValue,
};

use crate::address_space::AddressSpace;
use crate::authenticator::UserToken;
use crate::info::ServerInfo;

/// Handle a Read request.
pub fn read(
    info: &ServerInfo,
    address_space: &RwLock<AddressSpace>,
    token: &UserToken,
    request: &ReadRequest,
) -> Result<ReadResponse, StatusCode> {
    let Some(nodes_to_read) = &request.nodes_to_read else {
        return Err(StatusCode::BadNothingToDo);
    };
    if nodes_to_read.is_empty() {
        return Err(StatusCode::BadNothingToDo);
    }
    if nodes_to_read.len() > info.config.limits.operational.max_nodes_per_read {
        return Err(StatusCode::BadTooManyOperations);
    }
    if request.max_age < 0.0 {
        return Err(StatusCode::BadMaxAgeInvalid);
    }
    if request.timestamps_to_return == TimestampsToReturn::Invalid {
        return Err(StatusCode::BadTimestampsToReturnInvalid);
    }

    let address_space = address_space.read();
    let results = nodes_to_read
        .iter()
        .map(|node_to_read| {
            read_one(
                info,
                &address_space,
                token,
                &node_to_read.node_id,
                node_to_read.attribute_id,
                node_to_read.index_range.as_ref(),
                request.timestamps_to_return,
            )
        })
        .collect();

    Ok(ReadResponse {
        response_header: ResponseHeader::new_good(&request.request_header),
        results: Some(results),
        diagnostic_infos: None,
    })
}

fn read_one(
    info: &ServerInfo,
    address_space: &AddressSpace,
    token: &UserToken,
    node_id: &NodeId,
    attribute_id: u32,
    index_range: &str,
    timestamps_to_return: TimestampsToReturn,
) -> DataValue {
    let Ok(attribute_id) = AttributeId::try_from(attribute_id) else {
        return DataValue::new_status(StatusCode::BadAttributeIdInvalid);
    };
    let Ok(index_range) = NumericRange::from_str(index_range) else {
        return DataValue::new_status(StatusCode::BadIndexRangeInvalid);
    };
    let access = node_access_level(address_space, node_id);
    if !info
        .authenticator
        .allow_read(token, node_id, attribute_id, access)
    {
        return DataValue::new_status(StatusCode::BadUserAccessDenied);
    }
    if attribute_id == AttributeId::Value && !access.contains(AccessLevel::CURRENT_READ) {
        return DataValue::new_status(StatusCode::BadNotReadable);
    }
    address_space.read_attribute(node_id, attribute_id, &index_range, timestamps_to_return)
}

fn node_access_level(address_space: &AddressSpace, node_id: &NodeId) -> AccessLevel {
    match address_space.find(node_id) {
        Some(NodeType::Variable(v)) => v.user_access_level() & v.access_level(),
        _ => AccessLevel::CURRENT_READ,
    }
}

/// Handle a Write request.
pub fn write(
    info: &ServerInfo,
    address_space: &RwLock<AddressSpace>,
    token: &UserToken,
    request: &WriteRequest,
) -> Result<WriteResponse, StatusCode> {
    let Some(nodes_to_write) = &request.nodes_to_write else {
        return Err(StatusCode::BadNothingToDo);
    };
    if nodes_to_write.is_empty() {
        return Err(StatusCode::BadNothingToDo);
    }
    if nodes_to_write.len() > info.config.limits.operational.max_nodes_per_write {
        return Err(StatusCode::BadTooManyOperations);
    }

    let mut address_space = address_space.write();
    let results = nodes_to_write
        .iter()
        .map(|node_to_write| write_one(info, &mut address_space, token, node_to_write))
        .collect();

    Ok(WriteResponse {
        response_header: ResponseHeader::new_good(&request.request_header),
        results: Some(results),
        diagnostic_infos: None,
    })
}

fn write_one(
    info: &ServerInfo,
    address_space: &mut AddressSpace,
    token: &UserToken,
    node_to_write: &WriteValue,
) -> StatusCode {
    let Ok(attribute_id) = AttributeId::try_from(node_to_write.attribute_id) else {
        return StatusCode::BadAttributeIdInvalid;
    };
    let Ok(index_range) = NumericRange::from_str(node_to_write.index_range.as_ref()) else {
        return StatusCode::BadIndexRangeInvalid;
    };
    if !index_range.is_none() && attribute_id != AttributeId::Value {
        return StatusCode::BadIndexRangeInvalid;
    }
    if !address_space.node_exists(&node_to_write.node_id) {
        return StatusCode::BadNodeIdUnknown;
    }

    let access = node_access_level(address_space, &node_to_write.node_id);
    if !info
        .authenticator
        .allow_write(token, &node_to_write.node_id, attribute_id, access)
    {
        return StatusCode::BadUserAccessDenied;
    }

    if let Err(status) = validate_writability(address_space, &node_to_write.node_id, attribute_id)
    {
        return status;
    }

    // Writing the value of a variable goes through the variable so that
    // data sources and index ranges are honored, with the type checked
    // against the node first. Everything else is a plain attribute set.
    let is_variable_value = attribute_id == AttributeId::Value
        && matches!(
            address_space.find(&node_to_write.node_id),
            Some(NodeType::Variable(_))
        );

    if is_variable_value {
        if let Some(NodeType::Variable(variable)) = address_space.find(&node_to_write.node_id) {
            if let Some(value) = &node_to_write.value.value {
                let status = validate_value_to_write(address_space, variable, value);
                if status.is_bad() {
                    return status;
                }
            }
        }
        let Some(NodeType::Variable(variable)) = address_space.find_mut(&node_to_write.node_id)
        else {
            return StatusCode::BadNodeIdUnknown;
        };
        match variable.write_value(node_to_write.value.clone(), &index_range) {
            Ok(()) => StatusCode::Good,
            Err(status) => status,
        }
    } else {
        let Some(value) = node_to_write.value.value.clone() else {
            return StatusCode::BadTypeMismatch;
        };
        if let Err(status) =
            validate_rank_or_dimension_write(address_space, &node_to_write.node_id, attribute_id, &value)
        {
            return status;
        }
        let Some(node) = address_space.find_mut(&node_to_write.node_id) else {
            return StatusCode::BadNodeIdUnknown;
        };
        match node.as_mut_node().set_attribute(attribute_id, value) {
            Ok(()) => StatusCode::Good,
            Err(status) => status,
        }
    }
}

fn validate_writability(
    address_space: &AddressSpace,
    node_id: &NodeId,
    attribute_id: AttributeId,
) -> Result<(), StatusCode> {
    let Some(node) = address_space.find(node_id) else {
        return Err(StatusCode::BadNodeIdUnknown);
    };

    if let (NodeType::Variable(v), AttributeId::Value) = (node, attribute_id) {
        let access = v.access_level() & v.user_access_level();
        if !access.contains(AccessLevel::CURRENT_WRITE) {
            return Err(StatusCode::BadNotWritable);
        }
        return Ok(());
    }

    let mask_value = match attribute_id {
        AttributeId::BrowseName => WriteMask::BROWSE_NAME,
        AttributeId::DisplayName => WriteMask::DISPLAY_NAME,
        AttributeId::Description => WriteMask::DESCRIPTION,
        AttributeId::WriteMask => WriteMask::WRITE_MASK,
        AttributeId::UserWriteMask => WriteMask::USER_WRITE_MASK,
        AttributeId::IsAbstract => WriteMask::IS_ABSTRACT,
        AttributeId::Symmetric => WriteMask::SYMMETRIC,
        AttributeId::InverseName => WriteMask::INVERSE_NAME,
        AttributeId::ContainsNoLoops => WriteMask::CONTAINS_NO_LOOPS,
        AttributeId::EventNotifier => WriteMask::EVENT_NOTIFIER,
        AttributeId::Value => WriteMask::VALUE_FOR_VARIABLE_TYPE,
        AttributeId::DataType => WriteMask::DATA_TYPE,
        AttributeId::ValueRank => WriteMask::VALUE_RANK,
        AttributeId::ArrayDimensions => WriteMask::ARRAY_DIMENSIONS,
        AttributeId::AccessLevel => WriteMask::ACCESS_LEVEL,
        AttributeId::UserAccessLevel => WriteMask::USER_ACCESS_LEVEL,
        AttributeId::MinimumSamplingInterval => WriteMask::MINIMUM_SAMPLING_INTERVAL,
        AttributeId::Historizing => WriteMask::HISTORIZING,
        AttributeId::Executable => WriteMask::EXECUTABLE,
        AttributeId::UserExecutable => WriteMask::USER_EXECUTABLE,
        _ => return Err(StatusCode::BadNotWritable),
    };

    let write_mask = node.as_node().write_mask();
    match write_mask {
        Some(mask) if mask.contains(mask_value) => Ok(()),
        _ => Err(StatusCode::BadNotWritable),
    }
}

/// Check that a variant is assignable to a variable: the variant's type
/// must equal or be a subtype of the node's data type, and the shape must
/// agree with the value rank and array dimensions.
pub fn validate_value_to_write(
    address_space: &AddressSpace,
    variable: &uaserve_nodes::Variable,
    value: &Variant,
) -> StatusCode {
    // A null write clears the value without a type to check.
    if value.is_empty() {
        return StatusCode::Good;
    }

    let Some(value_type) = value.data_type() else {
        return StatusCode::BadTypeMismatch;
    };
    let value_type: NodeId = value_type.into();
    let node_type = variable.data_type();

    let type_ok = value_type == *node_type
        || address_space.is_subtype_of(&value_type, node_type)
        // Enumeration values travel as Int32.
        || (value_type == DataTypeId::Int32
            && address_space.is_subtype_of(node_type, &DataTypeId::Enumeration.into()));
    if !type_ok {
        debug!(
            "Rejecting write: value type {value_type} is not a subtype of {node_type}"
        );
        return StatusCode::BadTypeMismatch;
    }

    if !rank_compatible(variable.value_rank(), value) {
        return StatusCode::BadTypeMismatch;
    }
    if let Some(fixed) = variable.array_dimensions() {
        if !dimensions_compatible(fixed, value) {
            return StatusCode::BadTypeMismatch;
        }
    }
    StatusCode::Good
}

fn rank_compatible(value_rank: i32, value: &Variant) -> bool {
    let dims = match value.type_id() {
        VariantTypeId::Empty => return true,
        VariantTypeId::Scalar(_) => None,
        VariantTypeId::Array(_, dims) => Some(dims.map(|d| d.len()).unwrap_or(1)),
    };
    match (value_rank, dims) {
        (VALUE_RANK_SCALAR, None) => true,
        (VALUE_RANK_SCALAR, Some(_)) => false,
        (VALUE_RANK_ANY, _) => true,
        (VALUE_RANK_SCALAR_OR_ONE_DIMENSION, None) => true,
        (VALUE_RANK_SCALAR_OR_ONE_DIMENSION, Some(d)) => d == 1,
        (VALUE_RANK_ONE_OR_MORE_DIMENSIONS, Some(_)) => true,
        (VALUE_RANK_ONE_OR_MORE_DIMENSIONS, None) => false,
        (n, Some(d)) if n > 0 => d == n as usize,
        _ => false,
    }
}

fn dimensions_compatible(fixed: &[u32], value: &Variant) -> bool {
    let Variant::Array(array) = value else {
        return false;
    };
    match &array.dimensions {
        Some(dims) => {
            dims.len() == fixed.len()
                && dims
                    .iter()
                    .zip(fixed.iter())
                    .all(|(d, f)| *f == 0 || d <= f)
        }
        // A plain one dimensional array.
        None => fixed.len() == 1 && (fixed[0] == 0 || array.values.len() as u32 <= fixed[0]),
    }
}

/// Writing a new ValueRank or ArrayDimensions is only legal when the
/// current value stays compatible with the new shape.
fn validate_rank_or_dimension_write(
    address_space: &AddressSpace,
    node_id: &NodeId,
    attribute_id: AttributeId,
    value: &Variant,
) -> Result<(), StatusCode> {
    let Some(NodeType::Variable(variable)) = address_space.find(node_id) else {
        return Ok(());
    };
    let current = match variable.value() {
        VariableValue::Direct(v) => v.value.clone().unwrap_or_default(),
        VariableValue::Source(_) => return Ok(()),
    };
    match attribute_id {
        AttributeId::ValueRank => {
            let Variant::Int32(new_rank) = value else {
                return Err(StatusCode::BadTypeMismatch);
            };
            if !rank_compatible(*new_rank, &current) {
                return Err(StatusCode::BadTypeMismatch);
            }
        }
        AttributeId::ArrayDimensions => {
            let dims = match value {
                Variant::Array(a) => a
                    .values
                    .iter()
                    .map(|v| match v {
                        Variant::UInt32(d) => Some(*d),
                        _ => None,
                    })
                    .collect::<Option<Vec<u32>>>(),
                _ => None,
            };
            let Some(dims) = dims else {
                return Err(StatusCode::BadTypeMismatch);
            };
            if !current.is_empty() && !dimensions_compatible(&dims, &current) {
                return Err(StatusCode::BadTypeMismatch);
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{read, write};
    use crate::address_space::{populate_core_namespace, AddressSpace};
    use crate::authenticator::{DefaultAuthenticator, UserToken};
    use crate::config::ServerConfig;
    use crate::info::ServerInfo;
    use parking_lot::RwLock;
    use std::sync::Arc;
    use uaserve_nodes::VariableBuilder;
    use uaserve_types::{
        AttributeId, DataTypeId, DataValue, NodeId, ObjectId, ReadRequest, ReadValueId,
        RequestHeader, StatusCode, TimestampsToReturn, Variant, WriteRequest, WriteValue,
    };

    fn setup() -> (ServerInfo, RwLock<AddressSpace>, NodeId) {
        let info = ServerInfo::new(
            Arc::new(ServerConfig::default()),
            Arc::new(DefaultAuthenticator::new(Default::default())),
        );
        let mut space = AddressSpace::new();
        populate_core_namespace(&mut space, "urn:test");
        let id = NodeId::new(1, "the.answer");
        VariableBuilder::new(&id, "the.answer", "the.answer")
            .value(42i32)
            .data_type(DataTypeId::Int32)
            .writable()
            .organized_by(ObjectId::ObjectsFolder)
            .insert(&mut space);
        (info, RwLock::new(space), id)
    }

    fn anonymous() -> UserToken {
        UserToken("anonymous".to_string())
    }

    fn read_value(info: &ServerInfo, space: &RwLock<AddressSpace>, id: &NodeId) -> DataValue {
        let response = read(
            info,
            space,
            &anonymous(),
            &ReadRequest {
                request_header: RequestHeader::default(),
                max_age: 0.0,
                timestamps_to_return: TimestampsToReturn::Both,
                nodes_to_read: Some(vec![ReadValueId {
                    node_id: id.clone(),
                    attribute_id: AttributeId::Value as u32,
                    ..Default::default()
                }]),
            },
        )
        .unwrap();
        response.results.unwrap().remove(0)
    }

    fn write_value(
        info: &ServerInfo,
        space: &RwLock<AddressSpace>,
        id: &NodeId,
        value: impl Into<Variant>,
    ) -> StatusCode {
        let response = write(
            info,
            space,
            &anonymous(),
            &WriteRequest {
                request_header: RequestHeader::default(),
                nodes_to_write: Some(vec![WriteValue {
                    node_id: id.clone(),
                    attribute_id: AttributeId::Value as u32,
                    index_range: Default::default(),
                    value: DataValue::new_now(value),
                }]),
            },
        )
        .unwrap();
        response.results.unwrap()[0]
    }

    #[test]
    fn write_then_read() {
        let (info, space, id) = setup();
        assert_eq!(write_value(&info, &space, &id, 123i32), StatusCode::Good);
        let value = read_value(&info, &space, &id);
        assert_eq!(value.value, Some(Variant::Int32(123)));
        assert_eq!(value.status(), StatusCode::Good);
    }

    #[test]
    fn type_mismatch_rejected() {
        let (info, space, id) = setup();
        assert_eq!(
            write_value(&info, &space, &id, "hello"),
            StatusCode::BadTypeMismatch
        );
        // The stored value is untouched
        let value = read_value(&info, &space, &id);
        assert_eq!(value.value, Some(Variant::Int32(42)));
    }

    #[test]
    fn unknown_node() {
        let (info, space, _) = setup();
        assert_eq!(
            write_value(&info, &space, &NodeId::new(1, "nosuch"), 1i32),
            StatusCode::BadNodeIdUnknown
        );
    }

    #[test]
    fn index_range_on_scalar_attribute() {
        let (info, space, id) = setup();
        let response = read(
            &info,
            &space,
            &anonymous(),
            &ReadRequest {
                request_header: RequestHeader::default(),
                max_age: 0.0,
                timestamps_to_return: TimestampsToReturn::Both,
                nodes_to_read: Some(vec![ReadValueId {
                    node_id: id.clone(),
                    attribute_id: AttributeId::DisplayName as u32,
                    index_range: "1:2".into(),
                    ..Default::default()
                }]),
            },
        )
        .unwrap();
        assert_eq!(
            response.results.unwrap()[0].status(),
            StatusCode::BadIndexRangeInvalid
        );
    }
}

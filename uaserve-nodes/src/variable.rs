//! The `Variable` node class, carrying a value that is either stored
//! directly or served through a data source callback.

use std::fmt;
use std::sync::Arc;

use uaserve_types::{
    AttributeId, DataEncoding, DataTypeId, DataValue, DateTime, NumericRange, StatusCode,
    TimestampsToReturn, Variant,
};

use crate::{node_base_impl, node_builder_impl, AccessLevel, Base, Node};

/// A value rank denoting a scalar value.
pub const VALUE_RANK_SCALAR: i32 = -1;
/// A value rank denoting any number of dimensions.
pub const VALUE_RANK_ANY: i32 = -2;
/// A value rank denoting a scalar or an array of any dimensionality.
pub const VALUE_RANK_SCALAR_OR_ONE_DIMENSION: i32 = -3;
/// A value rank denoting an array of one or more dimensions.
pub const VALUE_RANK_ONE_OR_MORE_DIMENSIONS: i32 = 0;
/// A value rank denoting a one dimensional array.
pub const VALUE_RANK_ONE_DIMENSION: i32 = 1;

/// A callback pair backing the value of a variable, for values that live
/// outside the address space (sensors, registers, computed values).
pub trait DataSource: Send + Sync {
    /// Read the current value.
    fn read(&self, node_id: &uaserve_types::NodeId) -> Result<DataValue, StatusCode>;

    /// Write a new value. The default rejects writes.
    fn write(
        &self,
        _node_id: &uaserve_types::NodeId,
        _value: &DataValue,
    ) -> Result<(), StatusCode> {
        Err(StatusCode::BadNotWritable)
    }
}

/// Where the value of a variable comes from.
#[derive(Clone)]
pub enum VariableValue {
    /// The value is stored in the node.
    Direct(DataValue),
    /// The value is produced and consumed by a data source callback.
    Source(Arc<dyn DataSource>),
}

impl fmt::Debug for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Direct(v) => f.debug_tuple("Direct").field(v).finish(),
            VariableValue::Source(_) => f.debug_tuple("Source").field(&"...").finish(),
        }
    }
}

/// A variable node.
#[derive(Debug, Clone)]
pub struct Variable {
    pub(crate) base: Base,
    value: VariableValue,
    data_type: uaserve_types::NodeId,
    value_rank: i32,
    array_dimensions: Option<Vec<u32>>,
    access_level: u8,
    user_access_level: u8,
    minimum_sampling_interval: Option<f64>,
    historizing: bool,
}

impl Default for Variable {
    fn default() -> Self {
        Variable {
            base: Base {
                node_class: uaserve_types::NodeClass::Variable,
                ..Default::default()
            },
            value: VariableValue::Direct(DataValue::default()),
            data_type: DataTypeId::BaseDataType.into(),
            value_rank: VALUE_RANK_SCALAR,
            array_dimensions: None,
            access_level: AccessLevel::CURRENT_READ.bits(),
            user_access_level: AccessLevel::CURRENT_READ.bits(),
            minimum_sampling_interval: None,
            historizing: false,
        }
    }
}

node_base_impl!(Variable);

impl Node for Variable {
    fn get_attribute(
        &self,
        timestamps_to_return: TimestampsToReturn,
        attribute_id: AttributeId,
        index_range: &NumericRange,
        data_encoding: &DataEncoding,
    ) -> Option<DataValue> {
        match attribute_id {
            AttributeId::Value => self
                .read_value(index_range)
                .map(|mut v| {
                    v.keep_timestamps(timestamps_to_return);
                    v
                })
                .map_or_else(|e| Some(DataValue::new_status(e)), Some),
            AttributeId::DataType => Some(self.data_type.clone().into()),
            AttributeId::ValueRank => Some(self.value_rank.into()),
            AttributeId::ArrayDimensions => self
                .array_dimensions
                .clone()
                .map(|dims| Variant::from(dims).into()),
            AttributeId::AccessLevel => Some(self.access_level.into()),
            AttributeId::UserAccessLevel => Some(self.user_access_level.into()),
            AttributeId::MinimumSamplingInterval => {
                self.minimum_sampling_interval.map(|v| v.into())
            }
            AttributeId::Historizing => Some(self.historizing.into()),
            _ => self.base.get_attribute(
                timestamps_to_return,
                attribute_id,
                index_range,
                data_encoding,
            ),
        }
    }

    fn set_attribute(
        &mut self,
        attribute_id: AttributeId,
        value: Variant,
    ) -> Result<(), StatusCode> {
        match attribute_id {
            AttributeId::Value => {
                self.set_value_direct(value);
                Ok(())
            }
            AttributeId::DataType => {
                if let Variant::NodeId(v) = value {
                    self.data_type = *v;
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            AttributeId::ValueRank => {
                if let Variant::Int32(v) = value {
                    self.value_rank = v;
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            AttributeId::ArrayDimensions => {
                let dims = <Vec<u32> as uaserve_types::TryFromVariant>::try_from_variant(value)?;
                self.array_dimensions = Some(dims);
                Ok(())
            }
            AttributeId::AccessLevel => {
                if let Variant::Byte(v) = value {
                    self.access_level = v;
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            AttributeId::UserAccessLevel => {
                if let Variant::Byte(v) = value {
                    self.user_access_level = v;
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            AttributeId::MinimumSamplingInterval => {
                if let Variant::Double(v) = value {
                    self.minimum_sampling_interval = Some(v);
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            AttributeId::Historizing => {
                if let Variant::Boolean(v) = value {
                    self.historizing = v;
                    Ok(())
                } else {
                    Err(StatusCode::BadTypeMismatch)
                }
            }
            _ => self.base.set_attribute(attribute_id, value),
        }
    }
}

impl Variable {
    /// Create a variable with a directly stored initial value.
    pub fn new(
        node_id: &uaserve_types::NodeId,
        browse_name: impl Into<uaserve_types::QualifiedName>,
        display_name: impl Into<uaserve_types::LocalizedText>,
        value: impl Into<Variant>,
    ) -> Variable {
        Variable {
            base: Base::new(NodeClass::Variable, node_id, browse_name, display_name),
            value: VariableValue::Direct(DataValue::new_now(value)),
            ..Default::default()
        }
    }

    /// `true` if the node is valid for insertion.
    pub fn is_valid(&self) -> bool {
        self.base.is_valid()
    }

    /// Read the current value, applying `index_range` if given.
    pub fn read_value(&self, index_range: &NumericRange) -> Result<DataValue, StatusCode> {
        let value = match &self.value {
            VariableValue::Direct(value) => value.clone(),
            VariableValue::Source(source) => source.read(self.base.node_id())?,
        };
        if index_range.is_none() {
            return Ok(value);
        }
        let Some(variant) = &value.value else {
            return Err(StatusCode::BadIndexRangeNoData);
        };
        let sub = variant.range_of(index_range)?;
        Ok(DataValue {
            value: Some(sub),
            ..value
        })
    }

    /// Write a data value, applying `index_range` if given. Goes to the
    /// data source when one is installed.
    pub fn write_value(
        &mut self,
        value: DataValue,
        index_range: &NumericRange,
    ) -> Result<(), StatusCode> {
        match &mut self.value {
            VariableValue::Source(source) => source.write(&self.base.node_id, &value),
            VariableValue::Direct(current) => {
                if index_range.is_none() {
                    *current = value;
                    return Ok(());
                }
                let Some(new_value) = &value.value else {
                    return Err(StatusCode::BadTypeMismatch);
                };
                let Some(variant) = &mut current.value else {
                    return Err(StatusCode::BadIndexRangeNoData);
                };
                variant.set_range_of(index_range, new_value)?;
                current.source_timestamp = value.source_timestamp;
                current.server_timestamp = value.server_timestamp;
                current.status = value.status;
                Ok(())
            }
        }
    }

    /// Replace the value with a plain variant, stamping the current time.
    pub fn set_value_direct(&mut self, value: impl Into<Variant>) {
        let now = DateTime::now();
        self.value = VariableValue::Direct(DataValue {
            value: Some(value.into()),
            status: Some(StatusCode::Good),
            source_timestamp: Some(now),
            server_timestamp: Some(now),
            ..Default::default()
        });
    }

    /// Install a data source callback backing the value.
    pub fn set_value_source(&mut self, source: Arc<dyn DataSource>) {
        self.value = VariableValue::Source(source);
    }

    /// The value storage of the variable.
    pub fn value(&self) -> &VariableValue {
        &self.value
    }

    /// The data type of the value.
    pub fn data_type(&self) -> &uaserve_types::NodeId {
        &self.data_type
    }

    /// Set the data type of the value.
    pub fn set_data_type(&mut self, data_type: impl Into<uaserve_types::NodeId>) {
        self.data_type = data_type.into();
    }

    /// The value rank.
    pub fn value_rank(&self) -> i32 {
        self.value_rank
    }

    /// Set the value rank.
    pub fn set_value_rank(&mut self, value_rank: i32) {
        self.value_rank = value_rank;
    }

    /// The array dimensions, when fixed.
    pub fn array_dimensions(&self) -> Option<&[u32]> {
        self.array_dimensions.as_deref()
    }

    /// Set the array dimensions.
    pub fn set_array_dimensions(&mut self, dimensions: Vec<u32>) {
        self.array_dimensions = Some(dimensions);
    }

    /// The access level byte.
    pub fn access_level(&self) -> AccessLevel {
        AccessLevel::from_bits_truncate(self.access_level)
    }

    /// Set the access level.
    pub fn set_access_level(&mut self, access_level: AccessLevel) {
        self.access_level = access_level.bits();
    }

    /// The user access level byte.
    pub fn user_access_level(&self) -> AccessLevel {
        AccessLevel::from_bits_truncate(self.user_access_level)
    }

    /// Set the user access level.
    pub fn set_user_access_level(&mut self, user_access_level: AccessLevel) {
        self.user_access_level = user_access_level.bits();
    }

    /// The minimum sampling interval in milliseconds, if set.
    pub fn minimum_sampling_interval(&self) -> Option<f64> {
        self.minimum_sampling_interval
    }

    /// Set the minimum sampling interval.
    pub fn set_minimum_sampling_interval(&mut self, interval: f64) {
        self.minimum_sampling_interval = Some(interval);
    }

    /// Whether the variable is historized.
    pub fn historizing(&self) -> bool {
        self.historizing
    }

    /// Set the historizing flag.
    pub fn set_historizing(&mut self, historizing: bool) {
        self.historizing = historizing;
    }
}

node_builder_impl!(VariableBuilder, Variable);

impl VariableBuilder {
    /// Set the initial value of the variable.
    pub fn value(mut self, value: impl Into<Variant>) -> Self {
        self.node.set_value_direct(value);
        self
    }

    /// Install a data source callback backing the value.
    pub fn value_source(mut self, source: std::sync::Arc<dyn super::DataSource>) -> Self {
        self.node.set_value_source(source);
        self
    }

    /// Set the data type of the variable.
    pub fn data_type(mut self, data_type: impl Into<BuilderNodeId>) -> Self {
        self.node.set_data_type(data_type.into());
        self
    }

    /// Set the value rank of the variable.
    pub fn value_rank(mut self, value_rank: i32) -> Self {
        self.node.set_value_rank(value_rank);
        self
    }

    /// Set the array dimensions of the variable.
    pub fn array_dimensions(mut self, dimensions: &[u32]) -> Self {
        self.node.set_array_dimensions(dimensions.to_vec());
        self
    }

    /// Set the access level of the variable.
    pub fn access_level(mut self, access_level: super::AccessLevel) -> Self {
        self.node.set_access_level(access_level);
        self
    }

    /// Set the user access level of the variable.
    pub fn user_access_level(mut self, user_access_level: super::AccessLevel) -> Self {
        self.node.set_user_access_level(user_access_level);
        self
    }

    /// Set the minimum sampling interval in milliseconds.
    pub fn minimum_sampling_interval(mut self, interval: f64) -> Self {
        self.node.set_minimum_sampling_interval(interval);
        self
    }

    /// Make the variable writable by setting current read and write on
    /// both access levels.
    pub fn writable(self) -> Self {
        let level = super::AccessLevel::CURRENT_READ | super::AccessLevel::CURRENT_WRITE;
        self.access_level(level).user_access_level(level)
    }

    /// Declare the variable to be an instance of the given variable type.
    pub fn has_type_definition(self, type_id: impl Into<BuilderNodeId>) -> Self {
        self.reference(
            type_id,
            ReferenceTypeId::HasTypeDefinition,
            ReferenceDirection::Forward,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{DataSource, Variable, VariableBuilder};
    use crate::Node;
    use std::sync::Arc;
    use uaserve_types::{
        AttributeId, DataEncoding, DataTypeId, DataValue, NodeId, NumericRange, StatusCode,
        TimestampsToReturn, Variant,
    };

    #[test]
    fn read_and_write_direct() {
        let id = NodeId::new(1, "v");
        let mut v = Variable::new(&id, "v", "v", 42i32);
        let read = v.read_value(&NumericRange::None).unwrap();
        assert_eq!(read.value, Some(Variant::Int32(42)));

        v.write_value(DataValue::new_now(43i32), &NumericRange::None)
            .unwrap();
        let read = v.read_value(&NumericRange::None).unwrap();
        assert_eq!(read.value, Some(Variant::Int32(43)));
    }

    #[test]
    fn index_range_on_scalar_fails() {
        let id = NodeId::new(1, "v");
        let v = Variable::new(&id, "v", "v", 42i32);
        assert_eq!(
            v.read_value(&NumericRange::Index(0)).unwrap_err(),
            StatusCode::BadIndexRangeInvalid
        );
    }

    struct FixedSource;

    impl DataSource for FixedSource {
        fn read(&self, _node_id: &NodeId) -> Result<DataValue, StatusCode> {
            Ok(DataValue::new_now(99i32))
        }
    }

    #[test]
    fn data_source_read() {
        let id = NodeId::new(1, "v");
        let v = VariableBuilder::new(&id, "v", "v")
            .data_type(DataTypeId::Int32)
            .value_source(Arc::new(FixedSource))
            .build();
        let read = v
            .get_attribute(
                TimestampsToReturn::Both,
                AttributeId::Value,
                &NumericRange::None,
                &DataEncoding::Binary,
            )
            .unwrap();
        assert_eq!(read.value, Some(Variant::Int32(99)));
        // Writes are rejected by the default data source impl
        let mut v = v;
        assert!(v
            .write_value(DataValue::new_now(1i32), &NumericRange::None)
            .is_err());
    }
}

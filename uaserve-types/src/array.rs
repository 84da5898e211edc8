//! The [`Array`] type, holding potentially multi-dimensional OPC UA arrays
//! as a flat vector of variants.

use log::error;
use thiserror::Error;

use crate::variant::{Variant, VariantScalarTypeId, VariantTypeId};

/// An array is a vector of values with an optional set of dimensions. The
/// dimensions, when present, must multiply out to the number of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    /// Type of the elements in the array.
    pub value_type: VariantScalarTypeId,

    /// Values stored sequentially, highest rank dimension first.
    pub values: Vec<Variant>,

    /// Dimensions of a multi dimensional array. `None` for a single
    /// dimension.
    pub dimensions: Option<Vec<u32>>,
}

/// Error returned when creating arrays.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// An element of the array does not match the declared element type.
    #[error("Variant array content does not match the declared element type")]
    ContentMismatch,
    /// The dimensions multiplied together do not equal the array length.
    #[error("Variant array dimensions multiplied together do not equal the array length")]
    InvalidDimensions,
}

impl Array {
    /// Construct a single dimension array from the supplied values.
    pub fn new<V>(value_type: VariantScalarTypeId, values: V) -> Result<Array, ArrayError>
    where
        V: Into<Vec<Variant>>,
    {
        let values = values.into();
        Self::validate_array_type_to_values(value_type, &values)?;
        Ok(Array {
            value_type,
            values,
            dimensions: None,
        })
    }

    /// Construct a multi-dimensional array. The values are held flat; the
    /// dimensions parameter indicates how they are addressed.
    pub fn new_multi<V, D>(
        value_type: VariantScalarTypeId,
        values: V,
        dimensions: D,
    ) -> Result<Array, ArrayError>
    where
        V: Into<Vec<Variant>>,
        D: Into<Vec<u32>>,
    {
        let values = values.into();
        let dimensions: Vec<_> = dimensions.into();

        if !Self::validate_dimensions(values.len(), &dimensions) {
            return Err(ArrayError::InvalidDimensions);
        }

        Self::validate_array_type_to_values(value_type, &values)?;
        Ok(Array {
            value_type,
            values,
            dimensions: Some(dimensions),
        })
    }

    fn validate_array_type_to_values(
        value_type: VariantScalarTypeId,
        values: &[Variant],
    ) -> Result<(), ArrayError> {
        if !values_are_of_type(values, value_type) {
            Err(ArrayError::ContentMismatch)
        } else {
            Ok(())
        }
    }

    /// Whether this is a valid array.
    pub fn is_valid(&self) -> bool {
        self.is_valid_dimensions() && values_are_of_type(&self.values, self.value_type)
    }

    /// The number of elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn validate_dimensions(values_len: usize, dimensions: &[u32]) -> bool {
        let len = dimensions
            .iter()
            .map(|d| *d as usize)
            .reduce(|a, b| a * b)
            .unwrap_or(0);
        len == values_len
    }

    fn is_valid_dimensions(&self) -> bool {
        if let Some(ref dimensions) = self.dimensions {
            Self::validate_dimensions(self.values.len(), dimensions)
        } else {
            true
        }
    }
}

/// Check that all elements in the slice are scalars of the expected type.
pub fn values_are_of_type(values: &[Variant], expected_type: VariantScalarTypeId) -> bool {
    let found_unexpected = values.iter().any(|v| match v.type_id() {
        VariantTypeId::Array(_, _) => true,
        VariantTypeId::Scalar(s) => s != expected_type,
        VariantTypeId::Empty => true,
    });
    if found_unexpected {
        error!(
            "Variant array is expected to hold {:?} but found other types in it",
            expected_type
        );
    };
    !found_unexpected
}

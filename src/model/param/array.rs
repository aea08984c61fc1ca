//! Arrays of a user-chosen element type (`T name[size]`)

use crate::error::{BoundsError, SchemaResult};
use crate::model::FieldId;
use crate::range::NumericRange;

/// Repetition of one element field.
///
/// With a single-valued size range (`uint8 rgb[3]`) and an element of fixed
/// size, the array has a fixed size and no length prefix. Every other array
/// is preceded by a 2-byte byte-length prefix.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayParameter {
    element: FieldId,
    size_range: NumericRange<u64>,
    array_size: Option<usize>,
}

impl ArrayParameter {
    /// Creates an array of `element`.
    ///
    /// The element field is created by
    /// [`DcFile::array_of`](crate::DcFile::array_of), which is the usual way
    /// to build one.
    pub(crate) fn new(element: FieldId, size_range: NumericRange<u64>) -> SchemaResult<Self> {
        for r in size_range.iter() {
            if r.max > u16::MAX as u64 {
                return Err(BoundsError::Overflow {
                    max: u16::MAX as u64,
                    val: r.max,
                }
                .into());
            }
        }
        let array_size = size_range.one_value().map(|n| n as usize);
        Ok(Self {
            element,
            size_range,
            array_size,
        })
    }

    #[must_use]
    pub fn element(&self) -> FieldId {
        self.element
    }

    #[must_use]
    pub fn size_range(&self) -> &NumericRange<u64> {
        &self.size_range
    }

    /// Element count, if the size range admits exactly one value
    #[must_use]
    pub fn array_size(&self) -> Option<usize> {
        self.array_size
    }

    /// Smallest legal element count
    #[must_use]
    pub fn min_len(&self) -> usize {
        self.size_range.min_or(0) as usize
    }

    #[must_use]
    pub fn validate_num_nested_fields(&self, n: usize) -> bool {
        self.size_range.contains(n as u64)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn size_forms() {
        let fixed = ArrayParameter::new(FieldId(0), NumericRange::single(3, 3).unwrap()).unwrap();
        assert_eq!(fixed.array_size(), Some(3));
        assert!(fixed.validate_num_nested_fields(3));
        assert!(!fixed.validate_num_nested_fields(2));

        let open = ArrayParameter::new(FieldId(0), NumericRange::new()).unwrap();
        assert_eq!(open.array_size(), None);
        assert_eq!(open.min_len(), 0);
        assert!(open.validate_num_nested_fields(1000));
    }

    #[test]
    fn oversized() {
        assert!(ArrayParameter::new(FieldId(0), NumericRange::single(0, 70_000).unwrap()).is_err());
    }
}

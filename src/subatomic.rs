//! Catalog of subatomic wire types
//!
//! Every [`SimpleParameter`](crate::model::param::SimpleParameter) is built
//! around one [`SubatomicType`]: a fixed-width integer or float, a single
//! `char`, a length-prefixed `string`/`blob`, or one of the built-in
//! homogeneous array shorthands (`int16array`, ...).
//!
//! [`PackType`] is the coarser classification the packer uses to decide
//! which value accessors a node accepts.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Elementary wire types of the DC schema language.
///
/// The discriminants are contributed to the schema fingerprint and must not
/// be reordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SubatomicType {
    Int8 = 0,
    Int16 = 1,
    Int32 = 2,
    Int64 = 3,
    UInt8 = 4,
    UInt16 = 5,
    UInt32 = 6,
    UInt64 = 7,
    Float64 = 8,
    String = 9,
    Blob = 10,
    Blob32 = 11,
    Int16Array = 12,
    Int32Array = 13,
    UInt16Array = 14,
    UInt32Array = 15,
    Int8Array = 16,
    UInt8Array = 17,
    UInt32UInt8Array = 18,
    Char = 19,
}

/// Coarse classification of a packer node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PackType {
    Invalid,
    Double,
    Int,
    UInt,
    Int64,
    UInt64,
    String,
    Blob,
    Array,
    Field,
    Class,
    Switch,
}

impl PackType {
    /// Returns `true` for nodes read and written as a single byte string
    /// even though they expose nested per-byte fields.
    #[must_use]
    pub const fn is_byte_string(self) -> bool {
        matches!(self, PackType::String | PackType::Blob)
    }
}

impl SubatomicType {
    pub const ALL: [SubatomicType; 20] = [
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Float64,
        Self::String,
        Self::Blob,
        Self::Blob32,
        Self::Int16Array,
        Self::Int32Array,
        Self::UInt16Array,
        Self::UInt32Array,
        Self::Int8Array,
        Self::UInt8Array,
        Self::UInt32UInt8Array,
        Self::Char,
    ];

    /// Keyword used for this type in schema text
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::Blob => "blob",
            Self::Blob32 => "blob32",
            Self::Int16Array => "int16array",
            Self::Int32Array => "int32array",
            Self::UInt16Array => "uint16array",
            Self::UInt32Array => "uint32array",
            Self::Int8Array => "int8array",
            Self::UInt8Array => "uint8array",
            Self::UInt32UInt8Array => "uint32uint8array",
            Self::Char => "char",
        }
    }

    /// Byte width of a scalar value of this type, or `None` for types
    /// without an intrinsic width.
    #[must_use]
    pub const fn scalar_width(self) -> Option<usize> {
        match self {
            Self::Int8 | Self::UInt8 | Self::Char => Some(1),
            Self::Int16 | Self::UInt16 => Some(2),
            Self::Int32 | Self::UInt32 => Some(4),
            Self::Int64 | Self::UInt64 | Self::Float64 => Some(8),
            _ => None,
        }
    }

    /// Scalar type of one element of a built-in array, string or blob.
    ///
    /// `uint32uint8array` has a compound element and returns `None`.
    #[must_use]
    pub const fn element_type(self) -> Option<SubatomicType> {
        match self {
            Self::Int8Array => Some(Self::Int8),
            Self::Int16Array => Some(Self::Int16),
            Self::Int32Array => Some(Self::Int32),
            Self::UInt8Array | Self::Blob | Self::Blob32 => Some(Self::UInt8),
            Self::UInt16Array => Some(Self::UInt16),
            Self::UInt32Array => Some(Self::UInt32),
            Self::String => Some(Self::Char),
            _ => None,
        }
    }

    /// Bytes occupied by one element of a built-in array, string or blob
    #[must_use]
    pub const fn bytes_per_element(self) -> usize {
        match self {
            Self::Int8Array | Self::UInt8Array | Self::String | Self::Blob | Self::Blob32 => 1,
            Self::Int16Array | Self::UInt16Array => 2,
            Self::Int32Array | Self::UInt32Array => 4,
            Self::UInt32UInt8Array => 5,
            _ => 0,
        }
    }

    /// Returns `true` for the homogeneous array shorthands and for
    /// `string`/`blob`/`blob32`, which all expose nested per-element fields.
    #[must_use]
    pub const fn has_nested_fields(self) -> bool {
        self.bytes_per_element() != 0
    }

    #[must_use]
    pub const fn is_byte_string(self) -> bool {
        matches!(self, Self::String | Self::Blob | Self::Blob32)
    }

    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Int8Array
                | Self::Int16Array
                | Self::Int32Array
        )
    }

    /// Bits available to a modulus of this type, if it accepts one
    #[must_use]
    pub const fn modulus_bits(self) -> Option<Option<u32>> {
        match self {
            Self::Int8 | Self::Int8Array => Some(Some(7)),
            Self::Int16 | Self::Int16Array => Some(Some(15)),
            Self::Int32 | Self::Int32Array => Some(Some(31)),
            Self::Int64 => Some(Some(63)),
            Self::Char | Self::UInt8 | Self::UInt8Array => Some(Some(8)),
            Self::UInt16 | Self::UInt16Array => Some(Some(16)),
            Self::UInt32 | Self::UInt32Array => Some(Some(32)),
            Self::UInt64 | Self::Float64 => Some(None),
            _ => None,
        }
    }

    /// Pack type of an undecorated parameter of this type
    #[must_use]
    pub const fn base_pack_type(self) -> PackType {
        match self {
            Self::Int8 | Self::Int16 | Self::Int32 => PackType::Int,
            Self::Int64 => PackType::Int64,
            Self::UInt8 | Self::UInt16 | Self::UInt32 => PackType::UInt,
            Self::UInt64 => PackType::UInt64,
            Self::Float64 => PackType::Double,
            Self::Char | Self::String => PackType::String,
            Self::Blob | Self::Blob32 => PackType::Blob,
            _ => PackType::Array,
        }
    }
}

impl Display for SubatomicType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unrecognized type keyword
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTypeName(pub String);

impl Display for UnknownTypeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown subatomic type `{}`", self.0)
    }
}

impl std::error::Error for UnknownTypeName {}

impl FromStr for SubatomicType {
    type Err = UnknownTypeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.name() == s)
            .ok_or_else(|| UnknownTypeName(s.to_owned()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_round_trip() {
        for ty in SubatomicType::ALL {
            assert_eq!(ty.name().parse::<SubatomicType>(), Ok(ty));
        }
        assert!("int128".parse::<SubatomicType>().is_err());
    }

    #[test]
    fn element_layout() {
        assert_eq!(SubatomicType::String.element_type(), Some(SubatomicType::Char));
        assert_eq!(SubatomicType::Blob32.element_type(), Some(SubatomicType::UInt8));
        assert_eq!(SubatomicType::UInt32UInt8Array.bytes_per_element(), 5);
        assert!(!SubatomicType::Float64.has_nested_fields());
        assert_eq!(SubatomicType::Int16.scalar_width(), Some(2));
    }
}

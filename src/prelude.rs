//! Assorted imports for building schemas and packing values
//!
//! ```
//! use dclass::prelude::*;
//!
//! let mut file = DcFile::new();
//! let hp = file.new_parameter_field("hp", SimpleParameter::new(SubatomicType::Int16).into());
//! let bytes = pack_to_vec(&file, hp, &DcValue::Int(-2)).unwrap();
//! assert_eq!(bytes, [0xfe, 0xff]);
//! ```

#[doc(inline)]
pub use crate::{
    format_data, pack_to_vec, unpack_to_value, DcConfig, DcFile, DcValue, Node, NumericRange,
    Packer, Parameter, SimpleParameter, SubatomicType,
};

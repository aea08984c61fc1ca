//! Data model and packer for Distributed Class (DC) protocol schemas
//!
//! # Overview
//!
//! A DC schema declares the classes of a distributed-object system: their
//! inheritance, and the fields through which object state and remote method
//! calls are exchanged between peers. Every message on the wire is the
//! packed argument list of one field, laid out in the order the schema
//! dictates, with no self-describing metadata in between. Both peers must
//! therefore agree on the schema byte for byte, which they check by comparing
//! a 32-bit fingerprint of it.
//!
//! This crate provides:
//!
//! * the schema model ([`DcFile`] and the declarations it owns), built up
//!   through a programmatic API and rendered back to schema text;
//! * the fingerprint ([`DcFile::generate_hash`]), computed with the same
//!   [`HashGenerator`] that peers use;
//! * the [`Packer`], a streaming cursor that writes and reads field values in
//!   the wire format, including in-place replacement of named fields of an
//!   existing record.
//!
//! # Wire format
//!
//! All integers and floats are little-endian and unaligned. Strings, blobs
//! and arrays without a fixed size carry a 16-bit byte-length prefix (32 bits
//! for `blob32`); anything whose size is fixed by the schema carries none.
//! A struct is the concatenation of its fields; a switch is its key followed
//! by the fields of the matching case.
//!
//! # Configuration
//!
//! The few behaviours that differ between schema dialects (multiple and
//! virtual inheritance, legacy field ordering) are captured by [`DcConfig`],
//! which can be read from the environment.
//!
//! # Logging
//!
//! The crate logs through the `log` facade: schema cache invalidation and
//! catalog rebuilds at `debug`, unmatched switch keys at `warn`, and every
//! raised packer flag at `trace`. Binaries choose the backend; the demo uses
//! `env_logger`.

pub mod config;
pub mod error;
pub mod hash;
pub mod keyword;
pub mod model;
pub mod packer;
pub mod prelude;
pub mod range;
pub mod subatomic;
pub mod value;
pub mod wire;

pub use crate::config::DcConfig;
pub use crate::error::{SchemaError, SchemaResult};
pub use crate::hash::HashGenerator;
pub use crate::keyword::{Keyword, KeywordList};
pub use crate::model::param::CaseGroup;
pub use crate::model::{
    ArrayParameter, ClassId, DClass, DcFile, DcSwitch, Declaration, Field, FieldId, FieldKind,
    Import, Node, ParamType, Parameter, SimpleParameter, SwitchCase, SwitchId, Typedef, TypedefId,
};
pub use crate::packer::catalog::{Catalog, LiveCatalog};
pub use crate::packer::format::{format_data, pack_to_vec, unpack_to_value};
pub use crate::packer::{Mode, Packer, PackerError, SessionError, SessionResult};
pub use crate::range::NumericRange;
pub use crate::subatomic::{PackType, SubatomicType};
pub use crate::value::DcValue;
pub use crate::wire::{PackData, Reader, Target};

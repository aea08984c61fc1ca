//! Little-endian wire primitives
//!
//! This module holds the byte-level layer underneath the packer: the
//! [`Target`] trait and its [`PackData`] output buffer for writing, and the
//! [`Reader`] cursor for reading. Nothing here knows about the schema.

pub mod pack_data;
pub mod reader;
pub mod target;

pub use pack_data::PackData;
pub use reader::{ReadError, ReadResult, Reader};
pub use target::Target;

//! Schema model: classes, fields and parameters
//!
//! # Ownership
//!
//! A [`DcFile`] is the arena that owns every declaration of a schema. Other
//! declarations refer to each other through the copyable handles defined
//! here ([`ClassId`], [`FieldId`], [`SwitchId`], [`TypedefId`]), never by
//! reference, so the model has no ownership cycles and any handle can be
//! resolved through the file that issued it.
//!
//! Every typed slot is a [`Field`]: class members, atomic-field elements,
//! switch keys and case members, array elements, and the element types of
//! the built-in array shorthands (which are interned, so two `uint8array`
//! parameters share one element field).
//!
//! # Packer interface
//!
//! The packer walks the schema as a tree of [`Node`]s. Nearly every node is a
//! field; the one exception is [`Node::Case`], the list of fields selected by
//! a switch once its key has been read. The per-node queries the packer
//! relies on (fixed size, length-prefix width, nested arity) live in
//! [`interface`].

pub mod class;
pub mod field;
pub mod file;
mod hashing;
pub mod inherit;
pub mod interface;
pub mod param;
pub mod typedef;
mod write;

pub use class::DClass;
pub use field::{AtomicField, Field, FieldKind, MolecularField};
pub use file::{Declaration, DcFile, Import};
pub use param::{ArrayParameter, ParamType, Parameter, SimpleParameter, SwitchCase, DcSwitch};
pub use typedef::Typedef;

macro_rules! handle {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
            #[repr(transparent)]
            pub struct $name(pub(crate) u32);

            impl $name {
                /// Position of the declaration in its arena
                #[inline]
                #[must_use]
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

handle! {
    /// Handle to a class or struct owned by a [`DcFile`]
    ClassId,
    /// Handle to a field owned by a [`DcFile`]
    FieldId,
    /// Handle to a switch owned by a [`DcFile`]
    SwitchId,
    /// Handle to a typedef owned by a [`DcFile`]
    TypedefId,
}

/// A position in the packer's type tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Node {
    Field(FieldId),
    /// Fields selected by one case group of a switch, preceded by the key
    Case { switch: SwitchId, group: usize },
}

impl From<FieldId> for Node {
    fn from(id: FieldId) -> Self {
        Node::Field(id)
    }
}

impl Node {
    #[must_use]
    pub fn as_field(self) -> Option<FieldId> {
        match self {
            Node::Field(id) => Some(id),
            Node::Case { .. } => None,
        }
    }
}

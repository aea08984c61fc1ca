//! Typed value slots
//!
//! A [`Parameter`] is the typed part of a parameter field. The variant set
//! is closed: a single subatomic value ([`SimpleParameter`]), a repeated
//! element ([`ArrayParameter`]), the flattened fields of another class used
//! as a struct, or a discriminated union ([`DcSwitch`]).
//!
//! Any parameter may additionally remember the typedef it was created from;
//! this affects only how it is rendered back to schema text.

pub mod array;
pub mod simple;
pub mod switch;

pub use array::ArrayParameter;
pub use simple::SimpleParameter;
pub use switch::{CaseGroup, DcSwitch, SwitchCase};

use super::{ClassId, SwitchId, TypedefId};

/// The wire shape of a [`Parameter`]
#[derive(Clone, Debug, PartialEq)]
pub enum ParamType {
    Simple(SimpleParameter),
    Array(ArrayParameter),
    /// Value of a struct (or class) type: its constructor, then its
    /// inherited non-molecular fields
    Class(ClassId),
    Switch(SwitchId),
}

/// A typed value slot, optionally aliased through a typedef
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    typedef: Option<TypedefId>,
    ty: ParamType,
}

impl Parameter {
    #[must_use]
    pub fn new(ty: ParamType) -> Self {
        Self { typedef: None, ty }
    }

    #[must_use]
    pub fn simple(simple: SimpleParameter) -> Self {
        Self::new(ParamType::Simple(simple))
    }

    #[must_use]
    pub fn class(class: ClassId) -> Self {
        Self::new(ParamType::Class(class))
    }

    #[must_use]
    pub fn switch(switch: SwitchId) -> Self {
        Self::new(ParamType::Switch(switch))
    }

    #[must_use]
    pub fn ty(&self) -> &ParamType {
        &self.ty
    }

    pub fn ty_mut(&mut self) -> &mut ParamType {
        &mut self.ty
    }

    #[must_use]
    pub fn typedef(&self) -> Option<TypedefId> {
        self.typedef
    }

    pub(crate) fn set_typedef(&mut self, typedef: TypedefId) {
        self.typedef = Some(typedef);
    }

    #[must_use]
    pub fn as_simple(&self) -> Option<&SimpleParameter> {
        match &self.ty {
            ParamType::Simple(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayParameter> {
        match &self.ty {
            ParamType::Array(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_switch(&self) -> Option<SwitchId> {
        match self.ty {
            ParamType::Switch(id) => Some(id),
            _ => None,
        }
    }
}

impl From<SimpleParameter> for Parameter {
    fn from(simple: SimpleParameter) -> Self {
        Self::simple(simple)
    }
}

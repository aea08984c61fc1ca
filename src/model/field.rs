//! Fields: the named slots of classes, atomic fields and switches

use crate::keyword::{flags, KeywordList};
use crate::model::param::Parameter;
use crate::model::{ClassId, FieldId};

/// An RPC-style field, `name(type, type, ...)`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AtomicField {
    elements: Vec<FieldId>,
}

impl AtomicField {
    pub(crate) fn new(elements: Vec<FieldId>) -> Self {
        Self { elements }
    }

    /// Parameter fields of the argument list
    #[must_use]
    pub fn elements(&self) -> &[FieldId] {
        &self.elements
    }
}

/// A composite of atomic fields of the same class, `name : a, b;`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MolecularField {
    atomics: Vec<FieldId>,
    nested: Vec<FieldId>,
}

impl MolecularField {
    pub(crate) fn new(atomics: Vec<FieldId>, nested: Vec<FieldId>) -> Self {
        Self { atomics, nested }
    }

    #[must_use]
    pub fn atomics(&self) -> &[FieldId] {
        &self.atomics
    }

    /// Elements of every atomic, concatenated
    #[must_use]
    pub fn nested(&self) -> &[FieldId] {
        &self.nested
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    Parameter(Parameter),
    Atomic(AtomicField),
    Molecular(MolecularField),
}

/// A field declaration owned by a [`DcFile`](crate::DcFile)
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    name: String,
    number: Option<u32>,
    class: Option<ClassId>,
    owned: bool,
    keywords: KeywordList,
    default_value: Option<Vec<u8>>,
    kind: FieldKind,
}

impl Field {
    pub(crate) fn new(name: String, kind: FieldKind) -> Self {
        Self {
            name,
            number: None,
            class: None,
            owned: false,
            keywords: KeywordList::new(),
            default_value: None,
            kind,
        }
    }

    /// Field name; parameters may be anonymous
    #[must_use]
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Field number, assigned when the field is added to a class
    #[must_use]
    pub fn get_number(&self) -> Option<u32> {
        self.number
    }

    pub(crate) fn set_number(&mut self, number: u32) {
        self.number = Some(number);
    }

    /// Class the field was declared in
    #[must_use]
    pub fn get_class(&self) -> Option<ClassId> {
        self.class
    }

    pub(crate) fn set_class(&mut self, class: ClassId) {
        self.class = Some(class);
    }

    /// Returns `true` once the field belongs to a class, atomic field or
    /// switch.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    pub(crate) fn set_owned(&mut self) {
        self.owned = true;
    }

    #[must_use]
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut FieldKind {
        &mut self.kind
    }

    #[must_use]
    pub fn as_parameter(&self) -> Option<&Parameter> {
        match &self.kind {
            FieldKind::Parameter(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_atomic(&self) -> Option<&AtomicField> {
        match &self.kind {
            FieldKind::Atomic(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_molecular(&self) -> Option<&MolecularField> {
        match &self.kind {
            FieldKind::Molecular(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn keywords(&self) -> &KeywordList {
        &self.keywords
    }

    pub(crate) fn keywords_mut(&mut self) -> &mut KeywordList {
        &mut self.keywords
    }

    /// Packed default value, if one was declared
    #[must_use]
    pub fn get_default_value(&self) -> Option<&[u8]> {
        self.default_value.as_deref()
    }

    #[must_use]
    pub fn has_default_value(&self) -> bool {
        self.default_value.is_some()
    }

    pub(crate) fn set_default_value(&mut self, value: Vec<u8>) {
        self.default_value = Some(value);
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.keywords.has_flag(flags::REQUIRED)
    }

    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.keywords.has_flag(flags::BROADCAST)
    }

    #[must_use]
    pub fn is_ram(&self) -> bool {
        self.keywords.has_flag(flags::RAM)
    }

    #[must_use]
    pub fn is_db(&self) -> bool {
        self.keywords.has_flag(flags::DB)
    }

    #[must_use]
    pub fn is_clsend(&self) -> bool {
        self.keywords.has_flag(flags::CLSEND)
    }

    #[must_use]
    pub fn is_clrecv(&self) -> bool {
        self.keywords.has_flag(flags::CLRECV)
    }

    #[must_use]
    pub fn is_ownsend(&self) -> bool {
        self.keywords.has_flag(flags::OWNSEND)
    }

    #[must_use]
    pub fn is_ownrecv(&self) -> bool {
        self.keywords.has_flag(flags::OWNRECV)
    }

    #[must_use]
    pub fn is_airecv(&self) -> bool {
        self.keywords.has_flag(flags::AIRECV)
    }
}

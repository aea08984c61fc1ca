//! Class and struct declarations

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use crate::model::FieldId;

/// Flattened view of a class, computed on first use and discarded
/// whenever any class of the file changes.
#[derive(Clone, Debug, Default)]
pub(crate) struct ClassLayout {
    /// Visible fields: inherited ones first, then local declarations
    pub(crate) inherited: Vec<FieldId>,
    /// Fields of a value of this class: the constructor, then every
    /// non-molecular inherited field
    pub(crate) nested: Vec<FieldId>,
    pub(crate) fixed_byte_size: Option<usize>,
}

/// A `dclass` or `struct` declaration.
///
/// Queries that need the rest of the hierarchy (inherited fields, lookups
/// that fall back on the parents) are answered by the owning
/// [`DcFile`](crate::DcFile).
#[derive(Clone, Debug)]
pub struct DClass {
    name: String,
    is_struct: bool,
    is_bogus: bool,
    number: Option<u32>,
    parents: Vec<super::ClassId>,
    constructor: Option<FieldId>,
    fields: Vec<FieldId>,
    pub(crate) fields_by_name: HashMap<String, FieldId>,
    pub(crate) fields_by_index: BTreeMap<u32, FieldId>,
    pub(crate) layout: OnceLock<ClassLayout>,
}

impl DClass {
    pub(crate) fn new(name: String, is_struct: bool, is_bogus: bool) -> Self {
        Self {
            name,
            is_struct,
            is_bogus,
            number: None,
            parents: Vec::new(),
            constructor: None,
            fields: Vec::new(),
            fields_by_name: HashMap::new(),
            fields_by_index: BTreeMap::new(),
            layout: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn get_name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_struct(&self) -> bool {
        self.is_struct
    }

    /// Returns `true` for a class that was referenced before being declared.
    #[must_use]
    pub fn is_bogus_class(&self) -> bool {
        self.is_bogus
    }

    /// Position among the file's classes; structs are not numbered
    #[must_use]
    pub fn get_number(&self) -> Option<u32> {
        self.number
    }

    pub(crate) fn set_number(&mut self, number: u32) {
        self.number = Some(number);
    }

    #[must_use]
    pub fn get_num_parents(&self) -> usize {
        self.parents.len()
    }

    #[must_use]
    pub fn get_parent(&self, n: usize) -> Option<super::ClassId> {
        self.parents.get(n).copied()
    }

    #[must_use]
    pub fn parents(&self) -> &[super::ClassId] {
        &self.parents
    }

    pub(crate) fn push_parent(&mut self, parent: super::ClassId) {
        self.parents.push(parent);
    }

    #[must_use]
    pub fn get_constructor(&self) -> Option<FieldId> {
        self.constructor
    }

    pub(crate) fn set_constructor(&mut self, field: FieldId) {
        self.constructor = Some(field);
    }

    /// Number of fields declared in this class, excluding the constructor
    #[must_use]
    pub fn get_num_fields(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn get_field(&self, n: usize) -> Option<FieldId> {
        self.fields.get(n).copied()
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }

    pub(crate) fn push_field(&mut self, field: FieldId) {
        self.fields.push(field);
    }

    /// Local field (or constructor) of the given name, ignoring parents
    #[must_use]
    pub fn get_local_field_by_name(&self, name: &str) -> Option<FieldId> {
        self.fields_by_name.get(name).copied()
    }

    pub(crate) fn invalidate(&mut self) {
        self.layout = OnceLock::new();
    }
}

//! The schema arena and its builder API
//!
//! A [`DcFile`] is populated by a front end through the `add_*` and `new_*`
//! methods, and afterwards queried by the packer and by applications.
//! Fields are created detached (`new_parameter_field`, `new_atomic_field`,
//! `new_molecular_field`) and then placed exactly once: into a class with
//! [`DcFile::add_field`], into an atomic field as an element, or into a
//! switch with [`DcFile::add_switch_field`].
//!
//! Handles index directly into the arena. Passing a [`FieldId`],
//! [`SwitchId`] or [`TypedefId`] issued by a different file may panic; class
//! handles are checked by the builder methods that take one.

use std::collections::{HashMap, HashSet};

use crate::config::DcConfig;
use crate::error::{SchemaError, SchemaResult};
use crate::keyword::{Keyword, HISTORICAL_KEYWORDS};
use crate::model::class::{ClassLayout, DClass};
use crate::model::field::{AtomicField, Field, FieldKind, MolecularField};
use crate::model::inherit;
use crate::model::param::{ArrayParameter, DcSwitch, ParamType, Parameter, SimpleParameter};
use crate::model::typedef::Typedef;
use crate::model::{ClassId, FieldId, SwitchId, TypedefId};
use crate::packer::Packer;
use crate::range::NumericRange;
use crate::subatomic::SubatomicType;

/// A top-level declaration, in file order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Declaration {
    Class(ClassId),
    Switch(SwitchId),
    Typedef(TypedefId),
}

/// `import module` or `from module import a, b`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Import {
    pub module: String,
    pub symbols: Vec<String>,
}

/// A complete schema
#[derive(Clone, Debug)]
pub struct DcFile {
    config: DcConfig,
    classes: Vec<DClass>,
    class_list: Vec<ClassId>,
    fields: Vec<Field>,
    switches: Vec<DcSwitch>,
    typedefs: Vec<Typedef>,
    keywords: Vec<Keyword>,
    imports: Vec<Import>,
    declarations: Vec<Declaration>,
    things_by_name: HashMap<String, Declaration>,
    typedefs_by_name: HashMap<String, TypedefId>,
    fields_by_index: Vec<FieldId>,
    elements: HashMap<(SubatomicType, u32), FieldId>,
    pair_element: Option<FieldId>,
    all_objects_valid: bool,
}

impl Default for DcFile {
    fn default() -> Self {
        Self::with_config(DcConfig::default())
    }
}

impl DcFile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty file; the historical keywords are predeclared.
    #[must_use]
    pub fn with_config(config: DcConfig) -> Self {
        Self {
            config,
            classes: Vec::new(),
            class_list: Vec::new(),
            fields: Vec::new(),
            switches: Vec::new(),
            typedefs: Vec::new(),
            keywords: HISTORICAL_KEYWORDS
                .iter()
                .map(|&(name, _)| Keyword::new(name))
                .collect(),
            imports: Vec::new(),
            declarations: Vec::new(),
            things_by_name: HashMap::new(),
            typedefs_by_name: HashMap::new(),
            fields_by_index: Vec::new(),
            elements: HashMap::new(),
            pair_element: None,
            all_objects_valid: true,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DcConfig {
        &self.config
    }

    /// Returns the field behind `id`.
    ///
    /// # Panics
    ///
    /// If `id` was not issued by this file.
    #[must_use]
    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.index()]
    }

    #[must_use]
    pub fn get_field_by_id(&self, id: FieldId) -> Option<&Field> {
        self.fields.get(id.index())
    }

    /// Returns the class behind `id`.
    ///
    /// # Panics
    ///
    /// If `id` was not issued by this file.
    #[must_use]
    pub fn class(&self, id: ClassId) -> &DClass {
        &self.classes[id.index()]
    }

    #[must_use]
    pub fn get_class_by_id(&self, id: ClassId) -> Option<&DClass> {
        self.classes.get(id.index())
    }

    #[must_use]
    pub fn switch(&self, id: SwitchId) -> &DcSwitch {
        &self.switches[id.index()]
    }

    #[must_use]
    pub fn typedef(&self, id: TypedefId) -> &Typedef {
        &self.typedefs[id.index()]
    }

    #[must_use]
    pub fn get_num_classes(&self) -> usize {
        self.class_list.len()
    }

    #[must_use]
    pub fn get_class(&self, n: usize) -> Option<ClassId> {
        self.class_list.get(n).copied()
    }

    #[must_use]
    pub fn get_class_by_name(&self, name: &str) -> Option<ClassId> {
        match self.things_by_name.get(name) {
            Some(&Declaration::Class(id)) => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_switch_by_name(&self, name: &str) -> Option<SwitchId> {
        match self.things_by_name.get(name) {
            Some(&Declaration::Switch(id)) => Some(id),
            _ => None,
        }
    }

    /// Looks up a field by its file-wide number.
    #[must_use]
    pub fn get_field_by_index(&self, index: u32) -> Option<FieldId> {
        self.fields_by_index.get(index as usize).copied()
    }

    #[must_use]
    pub fn get_num_typedefs(&self) -> usize {
        self.typedefs.len()
    }

    #[must_use]
    pub fn get_typedef(&self, n: usize) -> Option<TypedefId> {
        (n < self.typedefs.len()).then(|| TypedefId(n as u32))
    }

    #[must_use]
    pub fn get_typedef_by_name(&self, name: &str) -> Option<TypedefId> {
        self.typedefs_by_name.get(name).copied()
    }

    #[must_use]
    pub fn get_num_keywords(&self) -> usize {
        self.keywords.len()
    }

    #[must_use]
    pub fn get_keyword(&self, n: usize) -> Option<&Keyword> {
        self.keywords.get(n)
    }

    #[must_use]
    pub fn get_keyword_by_name(&self, name: &str) -> Option<&Keyword> {
        self.keywords.iter().find(|k| k.name() == name)
    }

    #[must_use]
    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    #[must_use]
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Returns `false` if any class was referenced without being declared.
    #[must_use]
    pub fn all_objects_valid(&self) -> bool {
        self.all_objects_valid
    }

    fn class_checked(&self, id: ClassId) -> SchemaResult<&DClass> {
        self.classes
            .get(id.index())
            .ok_or_else(|| SchemaError::UnknownClass(format!("#{}", id.index())))
    }

    fn claim_name(&mut self, name: &str, decl: Declaration) -> SchemaResult<()> {
        if name.is_empty() {
            return Ok(());
        }
        if self.things_by_name.contains_key(name) {
            return Err(SchemaError::DuplicateName {
                scope: "class or switch",
                name: name.to_owned(),
            });
        }
        self.things_by_name.insert(name.to_owned(), decl);
        Ok(())
    }

    fn push_class(&mut self, name: &str, is_struct: bool, is_bogus: bool) -> SchemaResult<ClassId> {
        let id = ClassId(self.classes.len() as u32);
        self.claim_name(name, Declaration::Class(id))?;
        let mut class = DClass::new(name.to_owned(), is_struct, is_bogus);
        if !is_struct {
            class.set_number(self.class_list.len() as u32);
        }
        self.classes.push(class);
        self.class_list.push(id);
        if is_bogus {
            self.all_objects_valid = false;
        } else {
            self.declarations.push(Declaration::Class(id));
        }
        Ok(id)
    }

    /// Declares a `dclass` (or, with `is_struct`, a `struct`).
    pub fn add_class(&mut self, name: &str, is_struct: bool) -> SchemaResult<ClassId> {
        self.push_class(name, is_struct, false)
    }

    /// Registers a class that was referenced before any declaration.
    ///
    /// The file is no longer [`all_objects_valid`](Self::all_objects_valid)
    /// afterwards.
    pub fn add_bogus_class(&mut self, name: &str) -> SchemaResult<ClassId> {
        self.push_class(name, false, true)
    }

    fn inherits_from(&self, class: ClassId, ancestor: ClassId) -> bool {
        class == ancestor
            || self
                .class(class)
                .parents()
                .iter()
                .any(|&p| self.inherits_from(p, ancestor))
    }

    /// Whether a value of `field` holds a value of `target`, directly or
    /// through arrays, switches and the fields of other classes.
    ///
    /// A class target also matches any class inheriting from it.
    fn field_contains(&self, field: FieldId, target: Declaration, seen: &mut HashSet<Declaration>) -> bool {
        match self.field(field).kind() {
            FieldKind::Parameter(param) => match param.ty() {
                ParamType::Simple(_) => false,
                ParamType::Array(array) => self.field_contains(array.element(), target, seen),
                ParamType::Class(class) => self.decl_contains(Declaration::Class(*class), target, seen),
                ParamType::Switch(switch) => self.decl_contains(Declaration::Switch(*switch), target, seen),
            },
            FieldKind::Atomic(atomic) => atomic
                .elements()
                .iter()
                .any(|&id| self.field_contains(id, target, seen)),
            FieldKind::Molecular(molecular) => molecular
                .nested()
                .iter()
                .any(|&id| self.field_contains(id, target, seen)),
        }
    }

    fn decl_contains(&self, decl: Declaration, target: Declaration, seen: &mut HashSet<Declaration>) -> bool {
        let hit = match (decl, target) {
            (Declaration::Class(class), Declaration::Class(ancestor)) => self.inherits_from(class, ancestor),
            _ => decl == target,
        };
        if hit {
            return true;
        }
        if !seen.insert(decl) {
            return false;
        }
        match decl {
            Declaration::Class(id) => {
                let class = self.class(id);
                class
                    .get_constructor()
                    .into_iter()
                    .chain(class.fields().iter().copied())
                    .any(|f| self.field_contains(f, target, seen))
                    || class
                        .parents()
                        .iter()
                        .any(|&p| self.decl_contains(Declaration::Class(p), target, seen))
            }
            Declaration::Switch(id) => {
                let switch = self.switch(id);
                self.field_contains(switch.key(), target, seen)
                    || switch
                        .fields()
                        .iter()
                        .any(|&f| self.field_contains(f, target, seen))
            }
            Declaration::Typedef(_) => false,
        }
    }

    pub fn add_parent(&mut self, class: ClassId, parent: ClassId) -> SchemaResult<()> {
        let dclass = self.class_checked(class)?;
        let dparent = self.class_checked(parent)?;
        if !self.config.multiple_inheritance && dclass.get_num_parents() != 0 {
            return Err(SchemaError::MultipleInheritance {
                class: dclass.get_name().to_owned(),
            });
        }
        if self.inherits_from(parent, class) {
            return Err(SchemaError::InheritanceCycle {
                class: dclass.get_name().to_owned(),
                parent: dparent.get_name().to_owned(),
            });
        }
        if self.decl_contains(Declaration::Class(parent), Declaration::Class(class), &mut HashSet::new()) {
            return Err(SchemaError::RecursiveType {
                owner: dclass.get_name().to_owned(),
                field: dparent.get_name().to_owned(),
            });
        }
        self.classes[class.index()].push_parent(parent);
        self.mark_inherited_fields_stale();
        Ok(())
    }

    fn element_for(&mut self, ty: SubatomicType, divisor: u32) -> FieldId {
        if ty == SubatomicType::UInt32UInt8Array {
            return self.pair_element();
        }
        let element = ty.element_type().unwrap_or(SubatomicType::UInt8);
        if let Some(&id) = self.elements.get(&(element, divisor)) {
            return id;
        }
        let mut simple = SimpleParameter::new(element);
        if divisor != 1 {
            if let Err(err) = simple.set_divisor(divisor) {
                log::error!("element of {ty}: {err}");
            }
        }
        let id = self.push_field(Field::new(String::new(), FieldKind::Parameter(simple.into())));
        self.elements.insert((element, divisor), id);
        id
    }

    /// Element of `uint32uint8array`: an anonymous struct of a `uint32` and
    /// a `uint8`, outside the file's class list.
    fn pair_element(&mut self) -> FieldId {
        if let Some(id) = self.pair_element {
            return id;
        }
        let class = ClassId(self.classes.len() as u32);
        let mut dclass = DClass::new(String::new(), true, false);
        for ty in [SubatomicType::UInt32, SubatomicType::UInt8] {
            let mut field = Field::new(String::new(), FieldKind::Parameter(SimpleParameter::new(ty).into()));
            field.set_class(class);
            field.set_owned();
            let id = self.push_field(field);
            dclass.push_field(id);
        }
        self.classes.push(dclass);
        let id = self.push_field(Field::new(String::new(), FieldKind::Parameter(Parameter::class(class))));
        self.pair_element = Some(id);
        id
    }

    fn push_field(&mut self, field: Field) -> FieldId {
        let id = FieldId(self.fields.len() as u32);
        self.fields.push(field);
        id
    }

    fn register_parameter(&mut self, param: &mut Parameter) {
        if let ParamType::Simple(simple) = param.ty_mut() {
            let ty = simple.subatomic_type();
            if ty.has_nested_fields() && simple.nested_field().is_none() {
                let divisor = simple.divisor();
                let element = self.element_for(ty, divisor);
                simple.set_nested_field(element);
            }
        }
    }

    /// Creates a detached parameter field; `name` may be empty.
    pub fn new_parameter_field(&mut self, name: &str, mut param: Parameter) -> FieldId {
        self.register_parameter(&mut param);
        self.push_field(Field::new(name.to_owned(), FieldKind::Parameter(param)))
    }

    fn claim_field(&mut self, id: FieldId) -> SchemaResult<()> {
        let field = self.field(id);
        if field.is_owned() {
            return Err(SchemaError::AlreadyOwned {
                field: field.get_name().to_owned(),
            });
        }
        self.fields[id.index()].set_owned();
        Ok(())
    }

    /// Creates a detached atomic field from detached parameter fields.
    pub fn new_atomic_field(&mut self, name: &str, elements: Vec<FieldId>) -> SchemaResult<FieldId> {
        for (i, &id) in elements.iter().enumerate() {
            let field = self.field(id);
            if field.as_parameter().is_none() {
                return Err(SchemaError::NotAParameter {
                    field: field.get_name().to_owned(),
                });
            }
            if field.is_owned() || elements[..i].contains(&id) {
                return Err(SchemaError::AlreadyOwned {
                    field: field.get_name().to_owned(),
                });
            }
        }
        for &id in &elements {
            self.claim_field(id)?;
        }
        let kind = FieldKind::Atomic(AtomicField::new(elements));
        Ok(self.push_field(Field::new(name.to_owned(), kind)))
    }

    /// Creates a detached molecular field over existing atomic fields.
    ///
    /// The molecular field takes the keywords of its first atomic field.
    pub fn new_molecular_field(&mut self, name: &str, atomics: Vec<FieldId>) -> SchemaResult<FieldId> {
        let mut nested = Vec::new();
        for &id in &atomics {
            let field = self.field(id);
            match field.as_atomic() {
                Some(atomic) => nested.extend_from_slice(atomic.elements()),
                None => {
                    return Err(SchemaError::NotAtomic {
                        field: field.get_name().to_owned(),
                    })
                }
            }
        }
        let keywords = atomics.first().map(|&id| self.field(id).keywords().clone());
        let mut field = Field::new(name.to_owned(), FieldKind::Molecular(MolecularField::new(atomics, nested)));
        if let Some(keywords) = keywords {
            field.keywords_mut().copy_keywords(&keywords);
        }
        Ok(self.push_field(field))
    }

    /// Places a detached field into `class`.
    ///
    /// A field named after its class becomes the constructor, which must be
    /// an atomic field. Other fields are numbered from the file-wide counter
    /// (with multiple inheritance) or after the inherited fields (without),
    /// except for struct members, which stay unnumbered unless the legacy
    /// sort mode is enabled.
    pub fn add_field(&mut self, class: ClassId, field: FieldId) -> SchemaResult<()> {
        let dclass = self.class_checked(class)?;
        let class_name = dclass.get_name().to_owned();
        let is_struct = dclass.is_struct();
        let f = self.field(field);
        if f.is_owned() {
            return Err(SchemaError::AlreadyOwned {
                field: f.get_name().to_owned(),
            });
        }
        let name = f.get_name().to_owned();
        if self.field_contains(field, Declaration::Class(class), &mut HashSet::new()) {
            return Err(SchemaError::RecursiveType {
                owner: class_name,
                field: name,
            });
        }

        if !name.is_empty() && name == class_name {
            if dclass.get_constructor().is_some() {
                return Err(SchemaError::DuplicateConstructor { class: class_name });
            }
            if f.as_atomic().is_none() {
                return Err(SchemaError::ConstructorNotAtomic { class: class_name });
            }
            self.fields[field.index()].set_class(class);
            self.fields[field.index()].set_owned();
            let dclass = &mut self.classes[class.index()];
            dclass.set_constructor(field);
            dclass.fields_by_name.insert(name, field);
            self.mark_inherited_fields_stale();
            return Ok(());
        }

        if !name.is_empty() {
            if dclass.fields_by_name.contains_key(&name) {
                return Err(SchemaError::DuplicateField {
                    owner: class_name,
                    name,
                });
            }
            self.classes[class.index()].fields_by_name.insert(name, field);
        }

        if self.config.sorts_by_file() || !is_struct {
            let number = if self.config.multiple_inheritance {
                self.fields_by_index.push(field);
                (self.fields_by_index.len() - 1) as u32
            } else {
                self.get_num_inherited_fields(class) as u32
            };
            self.fields[field.index()].set_number(number);
            self.classes[class.index()].fields_by_index.insert(number, field);
        }

        self.fields[field.index()].set_class(class);
        self.fields[field.index()].set_owned();
        self.classes[class.index()].push_field(field);
        self.mark_inherited_fields_stale();
        Ok(())
    }

    /// Overrides the number of a field.
    pub fn set_number(&mut self, field: FieldId, number: u32) {
        let f = &mut self.fields[field.index()];
        f.set_number(number);
        if let Some(class) = f.get_class() {
            self.classes[class.index()].fields_by_index.insert(number, field);
        }
        self.mark_inherited_fields_stale();
    }

    /// Declares a keyword, returning `false` if it already exists.
    pub fn add_keyword(&mut self, name: &str) -> bool {
        if self.get_keyword_by_name(name).is_some() {
            return false;
        }
        self.keywords.push(Keyword::new(name));
        true
    }

    /// Attaches a declared keyword to a field.
    ///
    /// Returns `Ok(false)` if the field already carried it.
    pub fn add_field_keyword(&mut self, field: FieldId, name: &str) -> SchemaResult<bool> {
        let keyword = self
            .get_keyword_by_name(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownKeyword(name.to_owned()))?;
        Ok(self.fields[field.index()].keywords_mut().add_keyword(&keyword))
    }

    pub fn add_typedef(&mut self, name: &str, mut param: Parameter) -> SchemaResult<TypedefId> {
        if self.typedefs_by_name.contains_key(name) {
            return Err(SchemaError::DuplicateName {
                scope: "typedef",
                name: name.to_owned(),
            });
        }
        self.register_parameter(&mut param);
        let id = TypedefId(self.typedefs.len() as u32);
        self.typedefs
            .push(Typedef::new(name.to_owned(), id.0, param));
        self.typedefs_by_name.insert(name.to_owned(), id);
        self.declarations.push(Declaration::Typedef(id));
        Ok(id)
    }

    /// A fresh copy of the typedef's parameter that renders under the
    /// typedef name.
    #[must_use]
    pub fn typedef_parameter(&self, id: TypedefId) -> Parameter {
        let mut param = self.typedef(id).parameter().clone();
        param.set_typedef(id);
        param
    }

    /// Declares a switch keyed by `key`. Anonymous switches are not
    /// registered by name.
    pub fn add_switch(&mut self, name: &str, key: Parameter) -> SchemaResult<SwitchId> {
        let id = SwitchId(self.switches.len() as u32);
        self.claim_name(name, Declaration::Switch(id))?;
        let key = self.new_parameter_field("", key);
        self.fields[key.index()].set_owned();
        self.switches.push(DcSwitch::new(name.to_owned(), key));
        if !name.is_empty() {
            self.declarations.push(Declaration::Switch(id));
        }
        Ok(id)
    }

    /// Opens a case for the packed key value `value`.
    pub fn add_case(&mut self, switch: SwitchId, value: Vec<u8>) -> SchemaResult<usize> {
        let ret = self.switches[switch.index()].add_case(value)?;
        self.mark_inherited_fields_stale();
        Ok(ret)
    }

    pub fn add_default(&mut self, switch: SwitchId) -> SchemaResult<()> {
        self.switches[switch.index()].add_default()?;
        self.mark_inherited_fields_stale();
        Ok(())
    }

    /// Places a detached field into every open case of `switch`.
    pub fn add_switch_field(&mut self, switch: SwitchId, field: FieldId) -> SchemaResult<()> {
        let f = self.field(field);
        if f.is_owned() {
            return Err(SchemaError::AlreadyOwned {
                field: f.get_name().to_owned(),
            });
        }
        let name = f.get_name().to_owned();
        if self.field_contains(field, Declaration::Switch(switch), &mut HashSet::new()) {
            return Err(SchemaError::RecursiveType {
                owner: self.switch(switch).name().to_owned(),
                field: name,
            });
        }
        self.switches[switch.index()].add_field(field, &name)?;
        self.fields[field.index()].set_owned();
        self.mark_inherited_fields_stale();
        Ok(())
    }

    pub fn add_break(&mut self, switch: SwitchId) -> SchemaResult<()> {
        self.switches[switch.index()].add_break()
    }

    /// Builds `element name[size]`.
    pub fn array_of(&mut self, element: Parameter, size: NumericRange<u64>) -> SchemaResult<Parameter> {
        let element = self.new_parameter_field("", element);
        self.fields[element.index()].set_owned();
        Ok(Parameter::new(ParamType::Array(ArrayParameter::new(element, size)?)))
    }

    /// Attaches a packed default value to a field.
    ///
    /// The bytes must form exactly one value of the field's type.
    pub fn set_default_value(&mut self, field: FieldId, value: Vec<u8>) -> SchemaResult<()> {
        let valid = {
            let mut packer = Packer::new(self);
            packer.set_unpack_data_borrowed(&value);
            packer.begin_unpack(field);
            packer.unpack_validate();
            let consumed = packer.get_num_unpacked_bytes();
            packer.end_unpack().is_ok() && consumed == value.len()
        };
        if !valid {
            return Err(SchemaError::InvalidDefault {
                field: self.field(field).get_name().to_owned(),
            });
        }
        self.fields[field.index()].set_default_value(value);
        Ok(())
    }

    pub fn add_import_module(&mut self, module: &str) {
        self.imports.push(Import {
            module: module.to_owned(),
            symbols: Vec::new(),
        });
    }

    /// Adds a symbol to the most recent import, returning `false` if there
    /// is none.
    pub fn add_import_symbol(&mut self, symbol: &str) -> bool {
        match self.imports.last_mut() {
            Some(import) => {
                import.symbols.push(symbol.to_owned());
                true
            }
            None => false,
        }
    }

    /// Discards every cached class layout.
    pub fn mark_inherited_fields_stale(&mut self) {
        log::debug!("invalidating inherited fields of {} classes", self.classes.len());
        for class in &mut self.classes {
            class.invalidate();
        }
    }

    pub(crate) fn layout(&self, class: ClassId) -> &ClassLayout {
        self.classes[class.index()]
            .layout
            .get_or_init(|| inherit::build_layout(self, class))
    }

    /// Number of fields visible on `class`, including inherited ones
    #[must_use]
    pub fn get_num_inherited_fields(&self, class: ClassId) -> usize {
        self.layout(class).inherited.len()
    }

    #[must_use]
    pub fn get_inherited_field(&self, class: ClassId, n: usize) -> Option<FieldId> {
        self.layout(class).inherited.get(n).copied()
    }

    /// Looks up a field by name on `class`, then on its parents in order.
    #[must_use]
    pub fn get_class_field_by_name(&self, class: ClassId, name: &str) -> Option<FieldId> {
        let dclass = self.get_class_by_id(class)?;
        dclass.get_local_field_by_name(name).or_else(|| {
            dclass
                .parents()
                .iter()
                .find_map(|&p| self.get_class_field_by_name(p, name))
        })
    }

    /// Looks up a field by number on `class`, then on its parents in order.
    #[must_use]
    pub fn get_class_field_by_index(&self, class: ClassId, index: u32) -> Option<FieldId> {
        let dclass = self.get_class_by_id(class)?;
        dclass.fields_by_index.get(&index).copied().or_else(|| {
            dclass
                .parents()
                .iter()
                .find_map(|&p| self.get_class_field_by_index(p, index))
        })
    }

    /// Returns `true` if any ancestor of `class` is a bogus class.
    #[must_use]
    pub fn inherits_from_bogus_class(&self, class: ClassId) -> bool {
        self.class(class)
            .parents()
            .iter()
            .any(|&p| self.class(p).is_bogus_class() || self.inherits_from_bogus_class(p))
    }
}

//! Schema fingerprint
//!
//! The walk feeds the structure of every visible class through a
//! [`HashGenerator`]. Field and parameter names never contribute, so a
//! schema can be refactored for readability without breaking peers; class
//! and switch names, types, ranges, keywords and parent links all do.

use crate::hash::HashGenerator;
use crate::model::param::{DcSwitch, ParamType, Parameter};
use crate::model::{ClassId, DcFile, FieldId, FieldKind};

impl DcFile {
    /// Computes the 32-bit fingerprint of the schema.
    #[must_use]
    pub fn generate_hash(&self) -> u32 {
        let mut hashgen = HashGenerator::new();
        self.hash_into(&mut hashgen);
        hashgen.get_hash()
    }

    /// Feeds the schema into an existing generator.
    pub fn hash_into(&self, hashgen: &mut HashGenerator) {
        let config = self.config();
        if config.virtual_inheritance {
            hashgen.add_int(if config.sort_inheritance_by_file { 1 } else { 2 });
        }
        hashgen.add_int(self.get_num_classes() as i64);
        for n in 0..self.get_num_classes() {
            if let Some(class) = self.get_class(n) {
                self.hash_class(class, hashgen);
            }
        }
    }

    fn hash_class(&self, id: ClassId, hashgen: &mut HashGenerator) {
        let class = self.class(id);
        hashgen.add_string(class.get_name());
        if class.is_struct() {
            hashgen.add_int(1);
        }
        hashgen.add_int(class.get_num_parents() as i64);
        for &parent in class.parents() {
            hashgen.add_int(self.class(parent).get_number().map_or(-1, i64::from));
        }
        if let Some(ctor) = class.get_constructor() {
            self.hash_field(ctor, hashgen);
        }
        hashgen.add_int(class.get_num_fields() as i64);
        for &field in class.fields() {
            self.hash_field(field, hashgen);
        }
    }

    fn hash_field(&self, id: FieldId, hashgen: &mut HashGenerator) {
        let field = self.field(id);
        match field.kind() {
            FieldKind::Parameter(param) => {
                if !field.keywords().is_empty() {
                    field.keywords().generate_hash(hashgen);
                }
                self.hash_parameter(param, hashgen);
            }
            FieldKind::Atomic(atomic) => {
                self.hash_number(id, hashgen);
                hashgen.add_int(atomic.elements().len() as i64);
                for &element in atomic.elements() {
                    self.hash_field(element, hashgen);
                }
                field.keywords().generate_hash(hashgen);
            }
            FieldKind::Molecular(molecular) => {
                self.hash_number(id, hashgen);
                hashgen.add_int(molecular.atomics().len() as i64);
                for &atomic in molecular.atomics() {
                    self.hash_field(atomic, hashgen);
                }
            }
        }
    }

    fn hash_number(&self, id: FieldId, hashgen: &mut HashGenerator) {
        if self.config().multiple_inheritance {
            hashgen.add_int(self.field(id).get_number().map_or(-1, i64::from));
        }
    }

    fn hash_parameter(&self, param: &Parameter, hashgen: &mut HashGenerator) {
        match param.ty() {
            ParamType::Simple(simple) => simple.generate_hash(hashgen),
            ParamType::Array(array) => {
                self.hash_field(array.element(), hashgen);
                if array.size_range().is_empty() {
                    hashgen.add_int(-1);
                } else {
                    array.size_range().generate_hash(hashgen);
                }
            }
            ParamType::Class(class) => self.hash_class(*class, hashgen),
            ParamType::Switch(switch) => self.hash_switch(self.switch(*switch), hashgen),
        }
    }

    fn hash_switch(&self, switch: &DcSwitch, hashgen: &mut HashGenerator) {
        hashgen.add_string(switch.name());
        self.hash_field(switch.key(), hashgen);
        hashgen.add_int(switch.cases().len() as i64);
        let hash_group = |group: usize, hashgen: &mut HashGenerator| {
            let fields = switch.group(group).map_or(&[][..], |g| g.fields());
            hashgen.add_int(fields.len() as i64 + 1);
            self.hash_field(switch.key(), hashgen);
            for &field in fields {
                self.hash_field(field, hashgen);
            }
        };
        for case in switch.cases() {
            hashgen.add_blob(case.value());
            hash_group(case.group(), hashgen);
        }
        if let Some(default) = switch.default_group() {
            hash_group(default, hashgen);
        }
    }
}

#[cfg(test)]
mod test {
    use crate::config::DcConfig;
    use crate::model::{DcFile, Parameter, SimpleParameter};
    use crate::range::NumericRange;
    use crate::subatomic::SubatomicType;

    fn schema(field_name: &str, ty: SubatomicType) -> DcFile {
        schema_with(DcConfig::default(), field_name, ty)
    }

    fn schema_with(config: DcConfig, field_name: &str, ty: SubatomicType) -> DcFile {
        let mut file = DcFile::with_config(config);
        let avatar = file.add_class("Avatar", false).unwrap();
        let arg = file.new_parameter_field(field_name, SimpleParameter::new(ty).into());
        let set = file.new_atomic_field("setHp", vec![arg]).unwrap();
        file.add_field_keyword(set, "broadcast").unwrap();
        file.add_field(avatar, set).unwrap();
        let plain = file.new_parameter_field("plain", SimpleParameter::new(SubatomicType::UInt8).into());
        file.add_field(avatar, plain).unwrap();
        file
    }

    #[test]
    fn stable_under_renaming() {
        let a = schema("hp", SubatomicType::Int16);
        let b = schema("health", SubatomicType::Int16);
        assert_eq!(a.generate_hash(), b.generate_hash());
        assert_eq!(a.generate_hash(), a.clone().generate_hash());
    }

    #[test]
    fn sensitive_to_types() {
        let a = schema("hp", SubatomicType::Int16);
        let b = schema("hp", SubatomicType::Int32);
        assert_ne!(a.generate_hash(), b.generate_hash());
    }

    #[test]
    fn sensitive_to_config() {
        let a = schema("hp", SubatomicType::Int16);
        let b = schema_with(
            DcConfig {
                sort_inheritance_by_file: true,
                ..DcConfig::default()
            },
            "hp",
            SubatomicType::Int16,
        );
        assert_ne!(a.generate_hash(), b.generate_hash());
    }

    #[test]
    fn sensitive_to_ranges_and_keywords() {
        let base = schema("hp", SubatomicType::Int16).generate_hash();

        let mut ranged = DcFile::new();
        let avatar = ranged.add_class("Avatar", false).unwrap();
        let mut simple = SimpleParameter::new(SubatomicType::Int16);
        simple.set_range(NumericRange::single(0.0, 100.0).unwrap()).unwrap();
        let arg = ranged.new_parameter_field("hp", simple.into());
        let set = ranged.new_atomic_field("setHp", vec![arg]).unwrap();
        ranged.add_field_keyword(set, "broadcast").unwrap();
        ranged.add_field(avatar, set).unwrap();
        let plain = ranged.new_parameter_field("plain", Parameter::from(SimpleParameter::new(SubatomicType::UInt8)));
        ranged.add_field(avatar, plain).unwrap();
        assert_ne!(base, ranged.generate_hash());

        let mut ram = schema("hp", SubatomicType::Int16);
        let avatar = ram.get_class_by_name("Avatar").unwrap();
        let set = ram.get_class_field_by_name(avatar, "setHp").unwrap();
        ram.add_field_keyword(set, "ram").unwrap();
        assert_ne!(base, ram.generate_hash());
    }

    #[test]
    fn class_names_count() {
        let a = schema("hp", SubatomicType::Int16);
        let mut b = DcFile::new();
        let avatar = b.add_class("Toon", false).unwrap();
        let arg = b.new_parameter_field("hp", SimpleParameter::new(SubatomicType::Int16).into());
        let set = b.new_atomic_field("setHp", vec![arg]).unwrap();
        b.add_field_keyword(set, "broadcast").unwrap();
        b.add_field(avatar, set).unwrap();
        let plain = b.new_parameter_field("plain", SimpleParameter::new(SubatomicType::UInt8).into());
        b.add_field(avatar, plain).unwrap();
        assert_ne!(a.generate_hash(), b.generate_hash());
    }
}

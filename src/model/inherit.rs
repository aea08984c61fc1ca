//! Flattening of class hierarchies
//!
//! With virtual inheritance (the default), the visible fields of a class
//! are computed as follows:
//!
//! 1. The flattened fields of each parent are appended, in parent order.
//!    A named field already collected from an earlier parent is skipped, so
//!    in a diamond the leftmost path wins and a common ancestor's fields
//!    appear once. Unnamed fields are always appended.
//! 2. Local fields are appended in declaration order. A local field whose
//!    name was inherited removes the inherited entry first, so the flattened
//!    list never holds a name twice.
//! 3. In the legacy `sort_inheritance_by_file` mode, unnamed parent fields
//!    are dropped and the final list is ordered by field number.
//!
//! Without virtual inheritance the list is the plain concatenation of the
//! parents' lists followed by the local fields.

use std::collections::HashSet;

use crate::model::class::ClassLayout;
use crate::model::{ClassId, DcFile, FieldId, FieldKind, Node};

/// Computes the visible fields of `class`.
pub(crate) fn resolve(file: &DcFile, class: ClassId) -> Vec<FieldId> {
    let config = file.config();
    let Some(dclass) = file.get_class_by_id(class) else {
        return Vec::new();
    };

    if !(config.multiple_inheritance && config.virtual_inheritance) {
        let mut ret = Vec::new();
        for &parent in dclass.parents() {
            ret.extend_from_slice(&file.layout(parent).inherited);
        }
        ret.extend_from_slice(dclass.fields());
        return ret;
    }

    let sorts = config.sorts_by_file();
    let mut names: HashSet<&str> = HashSet::new();
    let mut ret: Vec<FieldId> = Vec::new();

    for &parent in dclass.parents() {
        for &id in &file.layout(parent).inherited {
            let name = file.field(id).get_name();
            if name.is_empty() {
                if !sorts {
                    ret.push(id);
                }
            } else if names.insert(name) {
                ret.push(id);
            }
        }
    }

    for &id in dclass.fields() {
        let name = file.field(id).get_name();
        if !name.is_empty() && !names.insert(name) {
            shadow(file, &mut ret, name);
        }
        ret.push(id);
    }

    if sorts {
        ret.sort_by_key(|&id| file.field(id).get_number().map_or(u64::MAX, u64::from));
    }
    ret
}

fn shadow(file: &DcFile, fields: &mut Vec<FieldId>, name: &str) {
    match fields.iter().position(|&id| file.field(id).get_name() == name) {
        Some(pos) => {
            fields.remove(pos);
        }
        None => log::error!("shadowed field `{name}` missing from inherited list"),
    }
}

/// Builds the full layout of `class`.
pub(crate) fn build_layout(file: &DcFile, class: ClassId) -> ClassLayout {
    let inherited = resolve(file, class);
    let mut nested = Vec::with_capacity(inherited.len() + 1);
    if let Some(ctor) = file.get_class_by_id(class).and_then(|c| c.get_constructor()) {
        nested.push(ctor);
    }
    nested.extend(
        inherited
            .iter()
            .copied()
            .filter(|&id| !matches!(file.field(id).kind(), FieldKind::Molecular(_))),
    );
    let fixed_byte_size = nested.iter().try_fold(0usize, |acc, &id| {
        file.fixed_byte_size(Node::Field(id)).map(|n| acc + n)
    });
    ClassLayout {
        inherited,
        nested,
        fixed_byte_size,
    }
}

#[cfg(test)]
mod test {
    use crate::config::DcConfig;
    use crate::model::{DcFile, Parameter, SimpleParameter};
    use crate::subatomic::SubatomicType;

    fn add_u8(file: &mut DcFile, class: crate::model::ClassId, name: &str) -> crate::model::FieldId {
        let param = Parameter::simple(SimpleParameter::new(SubatomicType::UInt8));
        let field = file.new_parameter_field(name, param);
        file.add_field(class, field).unwrap();
        field
    }

    fn names(file: &DcFile, class: crate::model::ClassId) -> Vec<String> {
        (0..file.get_num_inherited_fields(class))
            .filter_map(|i| file.get_inherited_field(class, i))
            .map(|f| file.field(f).get_name().to_owned())
            .collect()
    }

    #[test]
    fn diamond() {
        let mut file = DcFile::new();
        let base = file.add_class("Base", false).unwrap();
        add_u8(&mut file, base, "a");
        let left = file.add_class("Left", false).unwrap();
        file.add_parent(left, base).unwrap();
        add_u8(&mut file, left, "b");
        let right = file.add_class("Right", false).unwrap();
        file.add_parent(right, base).unwrap();
        add_u8(&mut file, right, "c");
        let diamond = file.add_class("Diamond", false).unwrap();
        file.add_parent(diamond, left).unwrap();
        file.add_parent(diamond, right).unwrap();
        add_u8(&mut file, diamond, "d");

        assert_eq!(file.get_num_inherited_fields(diamond), 4);
        assert_eq!(names(&file, diamond), ["a", "b", "c", "d"]);
    }

    #[test]
    fn shadowing() {
        let mut file = DcFile::new();
        let base = file.add_class("Base", false).unwrap();
        add_u8(&mut file, base, "x");
        add_u8(&mut file, base, "y");
        let derived = file.add_class("Derived", false).unwrap();
        file.add_parent(derived, base).unwrap();
        let local = add_u8(&mut file, derived, "x");

        assert_eq!(names(&file, derived), ["y", "x"]);
        assert_eq!(file.get_class_field_by_name(derived, "x"), Some(local));
    }

    #[test]
    fn unnamed_fields_kept() {
        let mut file = DcFile::new();
        let base = file.add_class("Base", false).unwrap();
        add_u8(&mut file, base, "");
        let derived = file.add_class("Derived", false).unwrap();
        file.add_parent(derived, base).unwrap();
        add_u8(&mut file, derived, "");
        assert_eq!(file.get_num_inherited_fields(derived), 2);
    }

    #[test]
    fn cache_tracks_mutation() {
        let mut file = DcFile::new();
        let base = file.add_class("Base", false).unwrap();
        let derived = file.add_class("Derived", false).unwrap();
        file.add_parent(derived, base).unwrap();
        assert_eq!(file.get_num_inherited_fields(derived), 0);
        add_u8(&mut file, base, "late");
        assert_eq!(names(&file, derived), ["late"]);
    }

    #[test]
    fn non_virtual_concatenates() {
        let mut file = DcFile::with_config(DcConfig {
            virtual_inheritance: false,
            ..DcConfig::default()
        });
        let base = file.add_class("Base", false).unwrap();
        add_u8(&mut file, base, "a");
        let left = file.add_class("Left", false).unwrap();
        file.add_parent(left, base).unwrap();
        let right = file.add_class("Right", false).unwrap();
        file.add_parent(right, base).unwrap();
        let both = file.add_class("Both", false).unwrap();
        file.add_parent(both, left).unwrap();
        file.add_parent(both, right).unwrap();
        assert_eq!(names(&file, both), ["a", "a"]);
    }

    #[test]
    fn sorted_by_number() {
        let mut file = DcFile::with_config(DcConfig {
            sort_inheritance_by_file: true,
            ..DcConfig::default()
        });
        let derived = file.add_class("Derived", false).unwrap();
        let base = file.add_class("Base", false).unwrap();
        add_u8(&mut file, derived, "d");
        add_u8(&mut file, base, "b");
        file.add_parent(derived, base).unwrap();
        assert_eq!(names(&file, derived), ["d", "b"]);
    }
}

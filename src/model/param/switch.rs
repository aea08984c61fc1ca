//! Discriminated unions
//!
//! ```text
//! switch Shape (uint8) {
//!   case 0:
//!   case 1:
//!     float64 radius;
//!     break;
//!   case 2:
//!     float64 w;
//!   default:
//!     float64 h;
//! };
//! ```
//!
//! A switch is built incrementally, statement by statement. Case labels with
//! no field or `break` in between share a single [`CaseGroup`]. A case that
//! received fields and was not terminated by `break` falls through: fields
//! declared afterwards are appended to it as well as to the new group.
//! Above, `case 2` selects `[w, h]` and `default` selects `[h]`.

use std::collections::{HashMap, HashSet};

use crate::error::{SchemaError, SchemaResult};
use crate::model::FieldId;

/// A case label: the packed key value and the group it selects
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwitchCase {
    value: Vec<u8>,
    group: usize,
}

impl SwitchCase {
    /// Packed bytes of the key value
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    #[must_use]
    pub fn group(&self) -> usize {
        self.group
    }
}

/// The field list selected by one or more case labels
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaseGroup {
    fields: Vec<FieldId>,
    names: HashSet<String>,
}

impl CaseGroup {
    /// Fields following the key, in wire order
    #[must_use]
    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }
}

/// A switch declaration
#[derive(Clone, Debug, PartialEq)]
pub struct DcSwitch {
    name: String,
    key: FieldId,
    cases: Vec<SwitchCase>,
    groups: Vec<CaseGroup>,
    default_group: Option<usize>,
    by_value: HashMap<Vec<u8>, usize>,
    fields: Vec<FieldId>,
    open_groups: Vec<usize>,
    fields_added: bool,
}

impl DcSwitch {
    pub(crate) fn new(name: String, key: FieldId) -> Self {
        Self {
            name,
            key,
            cases: Vec::new(),
            groups: Vec::new(),
            default_group: None,
            by_value: HashMap::new(),
            fields: Vec::new(),
            open_groups: Vec::new(),
            fields_added: false,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter field holding the key
    #[must_use]
    pub fn key(&self) -> FieldId {
        self.key
    }

    #[must_use]
    pub fn cases(&self) -> &[SwitchCase] {
        &self.cases
    }

    #[must_use]
    pub fn groups(&self) -> &[CaseGroup] {
        &self.groups
    }

    #[must_use]
    pub fn group(&self, group: usize) -> Option<&CaseGroup> {
        self.groups.get(group)
    }

    #[must_use]
    pub fn default_group(&self) -> Option<usize> {
        self.default_group
    }

    /// Every field declared in the switch body, in declaration order
    #[must_use]
    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }

    #[must_use]
    pub fn get_case_by_value(&self, value: &[u8]) -> Option<usize> {
        self.by_value.get(value).copied()
    }

    /// Selects the group for a packed key value, falling back to the
    /// default group.
    #[must_use]
    pub fn apply_switch(&self, value: &[u8]) -> Option<usize> {
        match self.by_value.get(value) {
            Some(&case) => Some(self.cases[case].group),
            None => self.default_group,
        }
    }

    fn start_new_case(&mut self) -> usize {
        let group = match self.open_groups.last() {
            Some(&open) if !self.fields_added => open,
            _ => {
                self.groups.push(CaseGroup::default());
                let group = self.groups.len() - 1;
                self.open_groups.push(group);
                group
            }
        };
        self.fields_added = false;
        group
    }

    /// Opens a case for the packed key `value` and returns its index.
    pub(crate) fn add_case(&mut self, value: Vec<u8>) -> SchemaResult<usize> {
        if self.by_value.contains_key(&value) {
            return Err(SchemaError::DuplicateCase {
                switch: self.name.clone(),
                value,
            });
        }
        let group = self.start_new_case();
        let index = self.cases.len();
        self.by_value.insert(value.clone(), index);
        self.cases.push(SwitchCase { value, group });
        Ok(index)
    }

    pub(crate) fn add_default(&mut self) -> SchemaResult<()> {
        if self.default_group.is_some() {
            return Err(SchemaError::DuplicateDefault {
                switch: self.name.clone(),
            });
        }
        self.default_group = Some(self.start_new_case());
        Ok(())
    }

    /// Appends a field to every open group.
    pub(crate) fn add_field(&mut self, field: FieldId, name: &str) -> SchemaResult<()> {
        if self.open_groups.is_empty() {
            return Err(SchemaError::NoOpenCase {
                switch: self.name.clone(),
            });
        }
        if !name.is_empty()
            && self
                .open_groups
                .iter()
                .any(|&g| self.groups[g].names.contains(name))
        {
            return Err(SchemaError::DuplicateField {
                owner: self.name.clone(),
                name: name.to_owned(),
            });
        }
        for &g in &self.open_groups {
            let group = &mut self.groups[g];
            group.fields.push(field);
            if !name.is_empty() {
                group.names.insert(name.to_owned());
            }
        }
        self.fields.push(field);
        self.fields_added = true;
        Ok(())
    }

    pub(crate) fn add_break(&mut self) -> SchemaResult<()> {
        if self.open_groups.is_empty() {
            return Err(SchemaError::NoOpenCase {
                switch: self.name.clone(),
            });
        }
        self.open_groups.clear();
        self.fields_added = false;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fallthrough_groups() {
        let mut sw = DcSwitch::new("Shape".into(), FieldId(0));
        sw.add_case(vec![0]).unwrap();
        sw.add_case(vec![1]).unwrap();
        sw.add_field(FieldId(1), "radius").unwrap();
        sw.add_break().unwrap();
        sw.add_case(vec![2]).unwrap();
        sw.add_field(FieldId(2), "w").unwrap();
        sw.add_default().unwrap();
        sw.add_field(FieldId(3), "h").unwrap();
        sw.add_break().unwrap();

        assert_eq!(sw.apply_switch(&[0]), sw.apply_switch(&[1]));
        let circle = sw.apply_switch(&[0]).unwrap();
        assert_eq!(sw.group(circle).unwrap().fields(), &[FieldId(1)]);
        let rect = sw.apply_switch(&[2]).unwrap();
        assert_eq!(sw.group(rect).unwrap().fields(), &[FieldId(2), FieldId(3)]);
        let other = sw.apply_switch(&[9]).unwrap();
        assert_eq!(sw.group(other).unwrap().fields(), &[FieldId(3)]);
        assert_eq!(sw.fields().len(), 3);
    }

    #[test]
    fn rejections() {
        let mut sw = DcSwitch::new("S".into(), FieldId(0));
        assert!(matches!(
            sw.add_field(FieldId(1), "x"),
            Err(SchemaError::NoOpenCase { .. })
        ));
        sw.add_case(vec![5]).unwrap();
        assert!(matches!(
            sw.add_case(vec![5]),
            Err(SchemaError::DuplicateCase { .. })
        ));
        sw.add_field(FieldId(1), "x").unwrap();
        assert!(matches!(
            sw.add_field(FieldId(2), "x"),
            Err(SchemaError::DuplicateField { .. })
        ));
        sw.add_default().unwrap();
        assert!(sw.add_default().is_err());
    }

    #[test]
    fn no_default() {
        let mut sw = DcSwitch::new("S".into(), FieldId(0));
        sw.add_case(vec![1]).unwrap();
        sw.add_break().unwrap();
        assert_eq!(sw.apply_switch(&[2]), None);
    }
}

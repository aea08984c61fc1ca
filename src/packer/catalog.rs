//! Field catalogs for random access by name
//!
//! A [`Catalog`] lists every named field reachable from a root, keyed by its
//! dotted path (`pos.x`), together with its parent and its index within the
//! parent. It is a property of the schema alone. Fields of every case of a
//! switch are listed, even though any one record holds at most one case.
//!
//! A [`LiveCatalog`] is built over one particular packed record. It walks the
//! record once, resolving switches as it goes, and records the byte range
//! occupied by each named field that is actually present.
//!
//! Neither catalog descends into strings, blobs, or arrays whose length is
//! only known from a prefix: their elements are unnamed.

use std::ops::Range;

use indexmap::IndexMap;

use super::Packer;
use crate::model::{DcFile, Node};

/// Position of a named field in the type tree
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub field: Node,
    pub parent: Node,
    /// Index of `field` among the nested fields of `parent`
    pub field_index: usize,
    /// Whether the field is a switch key, a case field, or nested within one
    pub in_switch: bool,
}

/// Schema-level catalog of a root field
#[derive(Clone, Debug)]
pub struct Catalog {
    root: Node,
    entries: IndexMap<String, CatalogEntry>,
}

impl Catalog {
    /// Walks the structure of `root`.
    #[must_use]
    pub fn build(file: &DcFile, root: Node) -> Self {
        let mut entries = IndexMap::new();
        fill_static(file, "", root, None, 0, false, &mut entries);
        Self { root, entries }
    }

    #[must_use]
    pub fn root(&self) -> Node {
        self.root
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn fill_static(
    file: &DcFile,
    prefix: &str,
    field: Node,
    parent: Option<Node>,
    field_index: usize,
    in_switch: bool,
    entries: &mut IndexMap<String, CatalogEntry>,
) {
    let mut next_prefix = prefix.to_owned();
    if let Some(parent) = parent {
        let name = file.node_name(field);
        if !name.is_empty() {
            let full = format!("{prefix}{name}");
            next_prefix = format!("{full}.");
            entries.entry(full).or_insert(CatalogEntry {
                field,
                parent,
                field_index,
                in_switch,
            });
        }
    }

    if !file.has_nested_fields(field) || file.pack_type(field).is_byte_string() {
        return;
    }

    if let Some(switch) = file.switch_of(field) {
        let sw = file.switch(switch);
        fill_static(file, &next_prefix, Node::Field(sw.key()), Some(field), 0, true, entries);
        for group in 0..sw.groups().len() {
            let case = Node::Case { switch, group };
            let fields = sw.group(group).map_or(&[][..], |g| g.fields());
            for (i, &nested) in fields.iter().enumerate() {
                fill_static(file, &next_prefix, Node::Field(nested), Some(case), i + 1, true, entries);
            }
        }
        return;
    }

    let Some(n) = file.num_nested_fields(field) else {
        return;
    };
    for i in 0..n {
        if let Some(nested) = file.nested_field(field, i) {
            fill_static(file, &next_prefix, nested, Some(field), i, in_switch, entries);
        }
    }
}

/// A catalog entry located within one record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveEntry {
    pub entry: CatalogEntry,
    pub begin: usize,
    pub end: usize,
}

impl LiveEntry {
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.begin..self.end
    }
}

/// Catalog of the fields present in one packed record
#[derive(Clone, Debug, Default)]
pub struct LiveCatalog {
    entries: IndexMap<String, LiveEntry>,
}

impl LiveCatalog {
    /// Walks `data` as a packed value of `root`.
    ///
    /// Returns `None` if the record does not unpack cleanly.
    #[must_use]
    pub fn build(file: &DcFile, root: Node, data: &[u8]) -> Option<Self> {
        let mut packer = Packer::new(file);
        packer.set_unpack_data_borrowed(data);
        packer.begin_unpack(root);
        let mut entries = IndexMap::new();
        fill_live(&mut packer, file, "", false, &mut entries);
        match packer.end_unpack() {
            Ok(()) => Some(Self { entries }),
            Err(err) => {
                log::debug!("cannot catalog record of {} bytes: {err}", data.len());
                None
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LiveEntry> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&str, &LiveEntry)> {
        self.entries.get_index(index).map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.get_index_of(name)
    }

    /// Byte range occupied by the named field
    #[must_use]
    pub fn span(&self, name: &str) -> Option<Range<usize>> {
        self.entries.get(name).map(LiveEntry::span)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LiveEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn fill_live(
    packer: &mut Packer<'_>,
    file: &DcFile,
    prefix: &str,
    in_switch: bool,
    entries: &mut IndexMap<String, LiveEntry>,
) {
    let Some(field) = packer.get_current_field() else {
        return;
    };
    let begin = packer.get_num_unpacked_bytes();

    let mut next_prefix = prefix.to_owned();
    let mut slot = None;
    if let Some(parent) = packer.get_current_parent() {
        let name = file.node_name(field);
        if !name.is_empty() {
            let full = format!("{prefix}{name}");
            next_prefix = format!("{full}.");
            if !entries.contains_key(&full) {
                let entry = CatalogEntry {
                    field,
                    parent,
                    field_index: packer.get_current_field_index(),
                    in_switch,
                };
                slot = Some(entries.insert_full(full, LiveEntry { entry, begin, end: begin }).0);
            }
        }
    }

    if file.has_nested_fields(field) && !file.pack_type(field).is_byte_string() {
        let nested_in_switch = in_switch || file.switch_of(field).is_some();
        packer.push();
        while packer.more_nested_fields() {
            fill_live(packer, file, &next_prefix, nested_in_switch, entries);
        }
        packer.pop();
    } else {
        packer.unpack_skip();
    }

    if let Some(i) = slot {
        entries[i].end = packer.get_num_unpacked_bytes();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{Parameter, SimpleParameter};
    use crate::subatomic::SubatomicType;

    fn simple(ty: SubatomicType) -> Parameter {
        SimpleParameter::new(ty).into()
    }

    /// `setShape(uint8 id, Point pos, switch (uint8) { case 0: uint16 r; case 1: string label; })`
    fn schema() -> (DcFile, Node) {
        let mut file = DcFile::new();
        let point = file.add_class("Point", true).unwrap();
        for name in ["x", "y"] {
            let f = file.new_parameter_field(name, simple(SubatomicType::Int16));
            file.add_field(point, f).unwrap();
        }
        let sw = file.add_switch("", simple(SubatomicType::UInt8)).unwrap();
        file.add_case(sw, vec![0]).unwrap();
        let r = file.new_parameter_field("r", simple(SubatomicType::UInt16));
        file.add_switch_field(sw, r).unwrap();
        file.add_break(sw).unwrap();
        file.add_case(sw, vec![1]).unwrap();
        let label = file.new_parameter_field("label", simple(SubatomicType::String));
        file.add_switch_field(sw, label).unwrap();
        file.add_break(sw).unwrap();

        let id = file.new_parameter_field("id", simple(SubatomicType::UInt8));
        let pos = file.new_parameter_field("pos", Parameter::class(point));
        let kind = file.new_parameter_field("kind", Parameter::switch(sw));
        let atomic = file.new_atomic_field("setShape", vec![id, pos, kind]).unwrap();
        (file, Node::Field(atomic))
    }

    #[test]
    fn static_names() {
        let (file, root) = schema();
        let catalog = Catalog::build(&file, root);
        let names: Vec<&str> = catalog.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["id", "pos", "pos.x", "pos.y", "kind", "kind.r", "kind.label"]);
        assert_eq!(catalog.get("pos.y").unwrap().field_index, 1);
        let r = catalog.get("kind.r").unwrap();
        assert!(r.in_switch);
        assert_eq!(r.field_index, 1);
        assert!(!catalog.get("kind").unwrap().in_switch);
    }

    #[test]
    fn live_spans() {
        let (file, root) = schema();
        // id=9, pos=(1, -1), case 1, label "ab"
        let data = [9, 1, 0, 0xff, 0xff, 1, 2, 0, b'a', b'b'];
        let live = LiveCatalog::build(&file, root, &data).unwrap();
        assert_eq!(live.span("id"), Some(0..1));
        assert_eq!(live.span("pos"), Some(1..5));
        assert_eq!(live.span("pos.y"), Some(3..5));
        assert_eq!(live.span("kind"), Some(5..10));
        assert_eq!(live.span("kind.label"), Some(6..10));
        assert_eq!(live.span("kind.r"), None);
        assert_eq!(live.index_of("pos"), Some(1));
    }

    #[test]
    fn live_rejects_truncated_records() {
        let (file, root) = schema();
        assert!(LiveCatalog::build(&file, root, &[9, 1, 0]).is_none());
    }
}

//! Uniform per-node queries used by the packer
//!
//! Every [`Node`] answers the same questions regardless of what it is:
//!
//! * its [`PackType`], deciding which value accessors apply;
//! * whether it has nested fields, how many (if known statically) and which;
//! * the width of the length prefix written in front of its nested fields;
//! * its fixed byte size, if every value occupies the same number of bytes.
//!
//! A switch parameter exposes exactly one nested field, its key. Once the
//! key has been packed or unpacked, the packer replaces the switch with the
//! [`Node::Case`] selected by the key, whose nested fields are the key again
//! followed by the fields of the case.

use crate::error::{LengthError, WidthError};
use crate::model::param::{ArrayParameter, ParamType, SimpleParameter};
use crate::model::{DcFile, FieldKind, Node, SwitchId};
use crate::packer::error::{ErrorFlags, PackerError};
use crate::subatomic::{PackType, SubatomicType};
use crate::wire::{PackData, Reader, Target};

/// A node resolved to the shape that determines its wire behaviour
enum Shape<'a> {
    Simple(&'a SimpleParameter),
    Array(&'a ArrayParameter),
    Class(crate::model::ClassId),
    Switch(SwitchId),
    Fields(&'a [crate::model::FieldId]),
    Case(SwitchId, usize),
}

impl DcFile {
    fn shape(&self, node: Node) -> Shape<'_> {
        match node {
            Node::Case { switch, group } => Shape::Case(switch, group),
            Node::Field(id) => match self.field(id).kind() {
                FieldKind::Parameter(p) => match p.ty() {
                    ParamType::Simple(s) => Shape::Simple(s),
                    ParamType::Array(a) => Shape::Array(a),
                    ParamType::Class(c) => Shape::Class(*c),
                    ParamType::Switch(s) => Shape::Switch(*s),
                },
                FieldKind::Atomic(a) => Shape::Fields(a.elements()),
                FieldKind::Molecular(m) => Shape::Fields(m.nested()),
            },
        }
    }

    fn case_fields(&self, switch: SwitchId, group: usize) -> &[crate::model::FieldId] {
        self.switch(switch)
            .group(group)
            .map_or(&[][..], |g| g.fields())
    }

    /// Subatomic element type of an array, if it is a simple parameter
    fn array_element_type(&self, array: &ArrayParameter) -> Option<SubatomicType> {
        self.field(array.element())
            .as_parameter()
            .and_then(|p| p.as_simple())
            .map(SimpleParameter::subatomic_type)
    }

    #[must_use]
    pub fn pack_type(&self, node: Node) -> PackType {
        match self.shape(node) {
            Shape::Simple(s) => s.pack_type(),
            Shape::Array(a) => match self.array_element_type(a) {
                Some(SubatomicType::Char) => PackType::String,
                Some(SubatomicType::Int8 | SubatomicType::UInt8) => PackType::Blob,
                _ => PackType::Array,
            },
            Shape::Class(_) => PackType::Class,
            Shape::Switch(_) | Shape::Case(..) => PackType::Switch,
            Shape::Fields(_) => PackType::Field,
        }
    }

    #[must_use]
    pub fn has_nested_fields(&self, node: Node) -> bool {
        match self.shape(node) {
            Shape::Simple(s) => s.subatomic_type().has_nested_fields(),
            _ => true,
        }
    }

    /// Statically known nested arity, or `None` if it can only be derived
    /// from a length prefix.
    #[must_use]
    pub fn num_nested_fields(&self, node: Node) -> Option<usize> {
        match self.shape(node) {
            Shape::Simple(s) => {
                if s.subatomic_type().has_nested_fields() {
                    s.num_nested_fields()
                } else {
                    Some(0)
                }
            }
            Shape::Array(a) => a.array_size(),
            Shape::Class(c) => Some(self.layout(c).nested.len()),
            Shape::Switch(_) => Some(1),
            Shape::Fields(fields) => Some(fields.len()),
            Shape::Case(switch, group) => Some(1 + self.case_fields(switch, group).len()),
        }
    }

    /// The `i`th child of `node`.
    ///
    /// Repeated elements (arrays, strings, blobs) return the element for any
    /// index.
    #[must_use]
    pub fn nested_field(&self, node: Node, i: usize) -> Option<Node> {
        let field = match self.shape(node) {
            Shape::Simple(s) => s.nested_field(),
            Shape::Array(a) => Some(a.element()),
            Shape::Class(c) => self.layout(c).nested.get(i).copied(),
            Shape::Switch(s) => (i == 0).then(|| self.switch(s).key()),
            Shape::Fields(fields) => fields.get(i).copied(),
            Shape::Case(switch, group) => match i {
                0 => Some(self.switch(switch).key()),
                i => self.case_fields(switch, group).get(i - 1).copied(),
            },
        };
        field.map(Node::Field)
    }

    /// Width of the byte-length prefix written before the nested fields:
    /// 0, 2 or 4.
    #[must_use]
    pub fn num_length_bytes(&self, node: Node) -> usize {
        match self.shape(node) {
            Shape::Simple(s) => s.num_length_bytes(),
            Shape::Array(a) => {
                if self.array_fixed_byte_size(a).is_some() {
                    0
                } else {
                    2
                }
            }
            _ => 0,
        }
    }

    fn array_fixed_byte_size(&self, array: &ArrayParameter) -> Option<usize> {
        let count = array.array_size()?;
        let element = self.fixed_byte_size(Node::Field(array.element()))?;
        Some(count * element)
    }

    fn sum_fixed(&self, fields: &[crate::model::FieldId]) -> Option<usize> {
        fields
            .iter()
            .try_fold(0usize, |acc, &id| Some(acc + self.fixed_byte_size(Node::Field(id))?))
    }

    /// Size of every value of `node`, if they all have the same size
    #[must_use]
    pub fn fixed_byte_size(&self, node: Node) -> Option<usize> {
        match self.shape(node) {
            Shape::Simple(s) => s.fixed_byte_size(),
            Shape::Array(a) => self.array_fixed_byte_size(a),
            Shape::Class(c) => self.layout(c).fixed_byte_size,
            Shape::Fields(fields) => self.sum_fixed(fields),
            Shape::Case(switch, group) => {
                let key = self.fixed_byte_size(Node::Field(self.switch(switch).key()))?;
                Some(key + self.sum_fixed(self.case_fields(switch, group))?)
            }
            Shape::Switch(s) => {
                let sw = self.switch(s);
                let key = self.fixed_byte_size(Node::Field(sw.key()))?;
                let mut sizes = sw.groups().iter().map(|g| self.sum_fixed(g.fields()));
                let first = sizes.next()??;
                if sizes.all(|size| size == Some(first)) {
                    Some(key + first)
                } else {
                    None
                }
            }
        }
    }

    /// Number of nested fields encoded in `length` bytes, for nodes whose
    /// arity is announced by a length prefix
    #[must_use]
    pub fn calc_num_nested_fields(&self, node: Node, length: usize) -> Option<usize> {
        match self.shape(node) {
            Shape::Simple(s) if s.bytes_per_element() != 0 => Some(s.calc_num_nested_fields(length)),
            Shape::Array(a) => match self.fixed_byte_size(Node::Field(a.element()))? {
                0 => Some(0),
                size => Some(length / size),
            },
            _ => None,
        }
    }

    /// Checks the number of nested fields visited against the declared size.
    #[must_use]
    pub fn validate_num_nested_fields(&self, node: Node, n: usize) -> bool {
        match self.shape(node) {
            Shape::Simple(s) => s.validate_num_nested_fields(n),
            Shape::Array(a) => a.validate_num_nested_fields(n),
            _ => true,
        }
    }

    /// Field name of `node`, or the switch name for a case
    #[must_use]
    pub fn node_name(&self, node: Node) -> &str {
        match node {
            Node::Field(id) => self.field(id).get_name(),
            Node::Case { switch, .. } => self.switch(switch).name(),
        }
    }

    /// The switch behind a switch parameter or one of its cases
    #[must_use]
    pub fn switch_of(&self, node: Node) -> Option<SwitchId> {
        match self.shape(node) {
            Shape::Switch(s) | Shape::Case(s, _) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn simple_of(&self, node: Node) -> Option<&SimpleParameter> {
        match self.shape(node) {
            Shape::Simple(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn array_of_node(&self, node: Node) -> Option<&ArrayParameter> {
        match self.shape(node) {
            Shape::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Packed default value declared for `node`, if any
    #[must_use]
    pub fn default_value(&self, node: Node) -> Option<&[u8]> {
        node.as_field()
            .and_then(|id| self.field(id).get_default_value())
    }

    /// Packs a byte string into a string/blob parameter, or into an array of
    /// `char`, `int8` or `uint8`.
    pub(crate) fn pack_bytes(&self, node: Node, out: &mut PackData, value: &[u8], errs: &mut ErrorFlags) {
        match self.shape(node) {
            Shape::Simple(s) => s.pack_bytes(out, value, errs),
            Shape::Array(a) if self.pack_type(node).is_byte_string() => match self.num_length_bytes(node) {
                0 => {
                    let n = a.array_size().unwrap_or(0);
                    if value.len() != n {
                        errs.range(PackerError::Length(LengthError::WrongLength {
                            exact: n,
                            actual: value.len(),
                        }));
                    }
                    let kept = &value[..value.len().min(n)];
                    out.push_all(kept);
                    out.append_junk(n - kept.len());
                }
                _ => {
                    if !a.validate_num_nested_fields(value.len()) {
                        errs.range(PackerError::Length(LengthError::OutOfRange {
                            actual: value.len(),
                        }));
                    }
                    if value.len() > 0xffff {
                        errs.range(PackerError::Width(WidthError::TooWide {
                            limit: 0xffff,
                            actual: value.len(),
                        }));
                    }
                    out.push_u16(value.len() as u16);
                    out.push_all(value);
                }
            },
            _ => errs.pack(PackerError::WrongType {
                operation: "pack string",
                pack_type: self.pack_type(node),
            }),
        }
    }

    /// Unpacks a byte string; the counterpart of `pack_bytes`.
    pub(crate) fn unpack_bytes(&self, node: Node, r: &mut Reader<'_>, errs: &mut ErrorFlags) -> Vec<u8> {
        match self.shape(node) {
            Shape::Simple(s) => s.unpack_bytes(r, errs),
            Shape::Array(a) if self.pack_type(node).is_byte_string() => {
                let len = match self.num_length_bytes(node) {
                    0 => Ok(a.array_size().unwrap_or(0)),
                    width => r.take_length(width),
                };
                let bytes = len.and_then(|len| r.consume(len));
                match bytes {
                    Ok(bytes) => {
                        if !a.validate_num_nested_fields(bytes.len()) {
                            errs.range(PackerError::Length(LengthError::OutOfRange {
                                actual: bytes.len(),
                            }));
                        }
                        bytes.to_vec()
                    }
                    Err(e) => {
                        errs.pack(e.into());
                        Vec::new()
                    }
                }
            }
            _ => {
                errs.pack(PackerError::WrongType {
                    operation: "unpack string",
                    pack_type: self.pack_type(node),
                });
                Vec::new()
            }
        }
    }

    /// Skips a value without decoding it.
    ///
    /// Returns `None` if the node has neither a fixed size nor a length
    /// prefix, in which case the caller must walk its nested fields.
    pub(crate) fn unpack_skip(&self, node: Node, r: &mut Reader<'_>) -> Option<Result<(), PackerError>> {
        if let Some(size) = self.fixed_byte_size(node) {
            return Some(r.skip(size).map_err(PackerError::from));
        }
        match self.num_length_bytes(node) {
            0 => None,
            width => Some(
                r.take_length(width)
                    .and_then(|len| r.skip(len))
                    .map_err(PackerError::from),
            ),
        }
    }

    /// Whether values of `a` and `b` are bitwise interchangeable.
    ///
    /// Names, ranges and default values are not compared. `uint8` matches
    /// `char`, and `string`, `blob` and `uint8array` match each other. A
    /// built-in array type matches a variable-length array of the same
    /// element type.
    #[must_use]
    pub fn check_match(&self, a: Node, b: Node) -> bool {
        match (self.shape(a), self.shape(b)) {
            (Shape::Simple(x), Shape::Simple(y)) => simple_types_match(x, y),
            (Shape::Simple(s), Shape::Array(array)) | (Shape::Array(array), Shape::Simple(s)) => {
                array.array_size().is_none()
                    && s.nested_field().is_some_and(|element| {
                        self.check_match(Node::Field(element), Node::Field(array.element()))
                    })
            }
            (Shape::Array(x), Shape::Array(y)) => {
                x.array_size() == y.array_size()
                    && self.check_match(Node::Field(x.element()), Node::Field(y.element()))
            }
            (Shape::Class(x), Shape::Class(y)) => {
                x == y || self.fields_match(&self.layout(x).nested, &self.layout(y).nested)
            }
            (Shape::Fields(x), Shape::Fields(y)) => self.fields_match(x, y),
            (Shape::Switch(x), Shape::Switch(y)) => x == y || self.switches_match(x, y),
            (Shape::Case(sx, gx), Shape::Case(sy, gy)) => {
                self.check_match(
                    Node::Field(self.switch(sx).key()),
                    Node::Field(self.switch(sy).key()),
                ) && self.fields_match(self.case_fields(sx, gx), self.case_fields(sy, gy))
            }
            _ => false,
        }
    }

    fn fields_match(&self, x: &[crate::model::FieldId], y: &[crate::model::FieldId]) -> bool {
        x.len() == y.len()
            && x
                .iter()
                .zip(y)
                .all(|(&a, &b)| self.check_match(Node::Field(a), Node::Field(b)))
    }

    /// Same key type, and the same key values selecting matching fields
    fn switches_match(&self, x: SwitchId, y: SwitchId) -> bool {
        let (sx, sy) = (self.switch(x), self.switch(y));
        let cases_match = sx.cases().len() == sy.cases().len()
            && sx.cases().iter().zip(sy.cases()).all(|(cx, cy)| {
                cx.value() == cy.value()
                    && self.fields_match(self.case_fields(x, cx.group()), self.case_fields(y, cy.group()))
            });
        let defaults_match = match (sx.default_group(), sy.default_group()) {
            (Some(gx), Some(gy)) => self.fields_match(self.case_fields(x, gx), self.case_fields(y, gy)),
            (None, None) => true,
            _ => false,
        };
        self.check_match(Node::Field(sx.key()), Node::Field(sy.key())) && cases_match && defaults_match
    }
}

fn simple_types_match(x: &SimpleParameter, y: &SimpleParameter) -> bool {
    use SubatomicType as T;

    let (a, b) = (x.subatomic_type(), y.subatomic_type());
    x.divisor() == y.divisor()
        && (a == b
            || matches!((a, b), (T::UInt8 | T::Char, T::UInt8 | T::Char))
            || matches!(
                (a, b),
                (
                    T::String | T::Blob | T::UInt8Array,
                    T::String | T::Blob | T::UInt8Array
                )
            ))
}

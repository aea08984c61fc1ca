//! Streaming packer and unpacker
//!
//! A [`Packer`] walks the type tree of a root [`Node`] (typically an atomic
//! field, or a parameter field) one nested field at a time, either writing
//! values into its pack buffer or reading them from its unpack buffer.
//!
//! # Sessions
//!
//! Work happens in sessions bracketed by `begin_*` and `end_*`:
//!
//! * **pack**: values are appended to the pack buffer, which survives
//!   `end_pack` so that several fields can be packed back to back into one
//!   record.
//! * **unpack**: values are read from the unpack buffer, starting wherever
//!   the previous unpack session stopped.
//! * **repack**: selected fields of an existing record are replaced in
//!   place, by name, through [`Packer::seek`]. Everything that is not
//!   repacked is copied through unchanged.
//!
//! # Traversal
//!
//! Scalar accessors (`pack_int`, `unpack_string`, ...) consume the current
//! field and advance to the next sibling. Aggregates are entered with
//! [`Packer::push`] and left with [`Packer::pop`], between which their
//! nested fields are visited in order until
//! [`Packer::more_nested_fields`] returns `false`.
//!
//! When a length prefix is required (variable-length arrays, strings and
//! blobs), `push` reserves it in pack mode and `pop` patches it; in unpack
//! mode `push` reads it and uses it to bound the nested traversal.
//!
//! Once the key of a switch has been visited, the packer substitutes the
//! case selected by the key as the current parent, exposing the fields of
//! that case as further nested fields.
//!
//! # Errors
//!
//! No operation returns an error directly. Failures raise the sticky flags
//! described in [`error`], and the `end_*` call of the session reports them.

pub mod catalog;
pub mod error;
pub mod format;
mod frame;

use std::borrow::Cow;

use crate::model::param::simple::Number;
use crate::model::{DcFile, Node, SwitchId};
use crate::subatomic::PackType;
use crate::value::DcValue;
use crate::wire::{PackData, Reader, Target};

use self::catalog::{Catalog, LiveCatalog, LiveEntry};
pub use self::error::{ErrorFlags, PackerError, SessionError, SessionResult};
use self::frame::{Frame, FrameStack};

/// Kind of session a [`Packer`] is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Idle,
    Pack,
    Unpack,
    Repack,
}

/// Schema-driven cursor for packing and unpacking records.
///
/// The packer borrows the [`DcFile`] it walks for its whole lifetime; the
/// unpack buffer may be borrowed for the same lifetime or handed over.
#[derive(Debug)]
pub struct Packer<'a> {
    file: &'a DcFile,
    mode: Mode,

    pack_data: PackData,
    unpack_data: Cow<'a, [u8]>,
    unpack_p: usize,
    /// Position of the unpack cursor when the current session began
    base: usize,

    root: Option<Node>,
    catalog: Option<Catalog>,
    live: Option<LiveCatalog>,
    catalog_used: bool,

    current_field: Option<Node>,
    current_parent: Option<Node>,
    field_index: usize,
    num_nested_fields: Option<usize>,
    push_marker: usize,
    pop_marker: Option<usize>,
    stack: FrameStack,

    last_switch: Option<SwitchId>,
    last_switch_key: Option<DcValue>,
    errors: ErrorFlags,
}

macro_rules! raw_ops {
    ($($t:ty => $pack:ident / $unpack:ident via $push:ident / $take:ident),* $(,)?) => {
        $(
            #[doc = concat!("Appends a little-endian `", stringify!($t), "` outside of any session.")]
            pub fn $pack(&mut self, value: $t) {
                if self.expect_idle(stringify!($pack)) {
                    self.pack_data.$push(value);
                }
            }

            #[doc = concat!("Reads a little-endian `", stringify!($t), "` outside of any session.")]
            pub fn $unpack(&mut self) -> $t {
                if !self.expect_idle(stringify!($unpack)) {
                    return <$t>::default();
                }
                let mut r = Reader::new(&self.unpack_data, self.unpack_p);
                match r.$take() {
                    Ok(v) => {
                        self.unpack_p = r.offset();
                        v
                    }
                    Err(e) => {
                        self.errors.pack(e.into());
                        <$t>::default()
                    }
                }
            }
        )*
    };
}

impl<'a> Packer<'a> {
    #[must_use]
    pub fn new(file: &'a DcFile) -> Self {
        Self {
            file,
            mode: Mode::Idle,
            pack_data: PackData::new(),
            unpack_data: Cow::Borrowed(&[]),
            unpack_p: 0,
            base: 0,
            root: None,
            catalog: None,
            live: None,
            catalog_used: false,
            current_field: None,
            current_parent: None,
            field_index: 0,
            num_nested_fields: Some(0),
            push_marker: 0,
            pop_marker: None,
            stack: FrameStack::default(),
            last_switch: None,
            last_switch_key: None,
            errors: ErrorFlags::default(),
        }
    }

    #[must_use]
    pub fn file(&self) -> &'a DcFile {
        self.file
    }

    #[must_use]
    pub fn get_mode(&self) -> Mode {
        self.mode
    }

    // Session control

    fn start(&mut self, operation: &'static str, mode: Mode, root: Node) -> bool {
        if self.mode != Mode::Idle {
            self.errors.pack(PackerError::WrongMode {
                operation,
                mode: self.mode,
            });
            return false;
        }
        self.errors.clear();
        self.reset_traversal();
        self.mode = mode;
        self.root = Some(root);
        self.last_switch = None;
        self.last_switch_key = None;
        true
    }

    fn reset_traversal(&mut self) {
        self.stack.clear();
        self.current_field = None;
        self.current_parent = None;
        self.field_index = 0;
        self.num_nested_fields = Some(0);
        self.push_marker = 0;
        self.pop_marker = None;
        self.live = None;
        self.catalog_used = false;
    }

    /// Starts packing a value of `root` at the end of the pack buffer.
    pub fn begin_pack(&mut self, root: impl Into<Node>) {
        let root = root.into();
        if self.start("begin_pack", Mode::Pack, root) {
            if let Some(size) = self.file.fixed_byte_size(root) {
                self.pack_data.anticipate(size);
            }
            self.current_field = Some(root);
        }
    }

    pub fn end_pack(&mut self) -> SessionResult<()> {
        if !self.expect_mode("end_pack", &[Mode::Pack]) {
            return self.errors.to_result();
        }
        if !self.stack.is_empty() || self.current_field.is_some() || self.current_parent.is_some() {
            self.errors.pack(PackerError::Unfinished);
        }
        self.finish()
    }

    /// Starts unpacking a value of `root` from the current unpack position.
    pub fn begin_unpack(&mut self, root: impl Into<Node>) {
        let root = root.into();
        if self.start("begin_unpack", Mode::Unpack, root) {
            self.base = self.unpack_p;
            self.current_field = Some(root);
        }
    }

    /// Ends the unpack session.
    ///
    /// Leaving fields unvisited is an error, unless [`Packer::seek`] was used
    /// during the session.
    pub fn end_unpack(&mut self) -> SessionResult<()> {
        if !self.expect_mode("end_unpack", &[Mode::Unpack]) {
            return self.errors.to_result();
        }
        if !self.catalog_used
            && (!self.stack.is_empty()
                || self.current_field.is_some()
                || self.current_parent.is_some())
        {
            self.errors.pack(PackerError::Unfinished);
        }
        cfg_if::cfg_if! {
            if #[cfg(feature = "check_complete_parse")] {
                if !self.catalog_used && self.unpack_p < self.unpack_data.len() {
                    self.errors.pack(PackerError::TrailingBytes {
                        residual: self.unpack_data.len() - self.unpack_p,
                    });
                }
            }
        }
        self.finish()
    }

    /// Starts replacing fields of the record held in the unpack buffer.
    ///
    /// Nothing is current until [`Packer::seek`] selects a field. The pack
    /// buffer is cleared; on `end_repack` it holds the updated record.
    pub fn begin_repack(&mut self, root: impl Into<Node>) {
        let root = root.into();
        if self.start("begin_repack", Mode::Repack, root) {
            self.pack_data.clear();
            self.unpack_p = 0;
            self.base = 0;
            self.ensure_live_catalog();
        }
    }

    pub fn end_repack(&mut self) -> SessionResult<()> {
        if !self.expect_mode("end_repack", &[Mode::Repack]) {
            return self.errors.to_result();
        }
        if !self.stack.is_empty() || self.current_field.is_some() {
            self.errors.pack(PackerError::Unfinished);
        }
        let rest = self.unpack_data.get(self.unpack_p..).unwrap_or_default();
        self.pack_data.push_all(rest);
        self.unpack_p = self.unpack_data.len();
        self.finish()
    }

    fn finish(&mut self) -> SessionResult<()> {
        self.mode = Mode::Idle;
        self.reset_traversal();
        self.errors.to_result()
    }

    /// Abandons any session and lowers the error flags. Buffers are kept.
    pub fn clear(&mut self) {
        self.mode = Mode::Idle;
        self.reset_traversal();
        self.root = None;
        self.errors.clear();
    }

    /// Empties both buffers.
    pub fn clear_data(&mut self) {
        self.pack_data.clear();
        self.unpack_data = Cow::Borrowed(&[]);
        self.unpack_p = 0;
    }

    // Buffers

    /// Sets the buffer to unpack from, borrowing it.
    pub fn set_unpack_data_borrowed(&mut self, data: &'a [u8]) {
        if self.expect_idle("set_unpack_data") {
            self.unpack_data = Cow::Borrowed(data);
            self.unpack_p = 0;
        }
    }

    /// Sets the buffer to unpack from, taking ownership of it.
    pub fn set_unpack_data_owned(&mut self, data: Vec<u8>) {
        if self.expect_idle("set_unpack_data") {
            self.unpack_data = Cow::Owned(data);
            self.unpack_p = 0;
        }
    }

    #[must_use]
    pub fn get_unpack_data(&self) -> &[u8] {
        &self.unpack_data
    }

    /// Current contents of the pack buffer
    #[must_use]
    pub fn get_data(&self) -> &[u8] {
        self.pack_data.as_slice()
    }

    #[must_use]
    pub fn get_length(&self) -> usize {
        self.pack_data.len()
    }

    /// Moves the contents of the pack buffer out.
    pub fn take_data(&mut self) -> Vec<u8> {
        self.pack_data.take()
    }

    /// Offset of the unpack cursor
    #[must_use]
    pub fn get_num_unpacked_bytes(&self) -> usize {
        self.unpack_p
    }

    // Flags

    #[must_use]
    pub fn had_parse_error(&self) -> bool {
        self.errors.had_parse_error()
    }

    #[must_use]
    pub fn had_pack_error(&self) -> bool {
        self.errors.had_pack_error()
    }

    #[must_use]
    pub fn had_range_error(&self) -> bool {
        self.errors.had_range_error()
    }

    #[must_use]
    pub fn had_error(&self) -> bool {
        self.errors.had_error()
    }

    #[must_use]
    pub fn errors(&self) -> &ErrorFlags {
        &self.errors
    }

    // Traversal state

    #[must_use]
    pub fn get_current_field(&self) -> Option<Node> {
        self.current_field
    }

    #[must_use]
    pub fn get_current_parent(&self) -> Option<Node> {
        self.current_parent
    }

    /// Index of the current field among the nested fields of its parent
    #[must_use]
    pub fn get_current_field_index(&self) -> usize {
        self.field_index
    }

    /// Name of the current field, or `""`
    #[must_use]
    pub fn get_current_field_name(&self) -> &'a str {
        let file = self.file;
        self.current_field.map_or("", |node| file.node_name(node))
    }

    #[must_use]
    pub fn get_pack_type(&self) -> PackType {
        self.current_field
            .map_or(PackType::Invalid, |node| self.file.pack_type(node))
    }

    /// Whether the current field can be entered with [`Packer::push`]
    #[must_use]
    pub fn has_nested_fields(&self) -> bool {
        self.current_field
            .is_some_and(|node| self.file.has_nested_fields(node))
    }

    /// Arity of the container being traversed, if known
    #[must_use]
    pub fn get_num_nested_fields(&self) -> Option<usize> {
        self.num_nested_fields
    }

    /// Whether another nested field remains at this level.
    ///
    /// Always `false` once a pack error has been raised, so that loops over
    /// nested fields terminate.
    #[must_use]
    pub fn more_nested_fields(&self) -> bool {
        self.current_field.is_some() && !self.errors.had_pack_error()
    }

    /// The switch most recently resolved in this session
    #[must_use]
    pub fn get_last_switch(&self) -> Option<SwitchId> {
        self.last_switch
    }

    /// Key value of the switch most recently visited
    #[must_use]
    pub fn get_last_switch_key(&self) -> Option<&DcValue> {
        self.last_switch_key.as_ref()
    }

    /// Live catalog of the record being unpacked or repacked, once a seek
    /// has built it
    #[must_use]
    pub fn live_catalog(&self) -> Option<&LiveCatalog> {
        self.live.as_ref()
    }

    // Guards

    fn expect_mode(&mut self, operation: &'static str, allowed: &[Mode]) -> bool {
        if allowed.contains(&self.mode) {
            true
        } else {
            self.errors.pack(PackerError::WrongMode {
                operation,
                mode: self.mode,
            });
            false
        }
    }

    fn expect_idle(&mut self, operation: &'static str) -> bool {
        self.expect_mode(operation, &[Mode::Idle])
    }

    fn expect_field(&mut self, operation: &'static str, allowed: &[Mode]) -> Option<Node> {
        if !self.expect_mode(operation, allowed) {
            return None;
        }
        if self.current_field.is_none() {
            self.errors.pack(PackerError::NoCurrentField { operation });
        }
        self.current_field
    }

    fn expect_pack(&mut self, operation: &'static str) -> Option<Node> {
        self.expect_field(operation, &[Mode::Pack, Mode::Repack])
    }

    fn expect_unpack(&mut self, operation: &'static str) -> Option<Node> {
        self.expect_field(operation, &[Mode::Unpack])
    }

    /// The switch behind `node` if it is a switch parameter (not a case)
    fn switch_param(&self, node: Node) -> Option<SwitchId> {
        match node {
            Node::Field(_) => self.file.switch_of(node),
            Node::Case { .. } => None,
        }
    }

    // Navigation

    fn advance(&mut self) {
        self.field_index += 1;
        match self.num_nested_fields {
            Some(n) if self.field_index >= n => {
                self.current_field = None;
                if let Some(switch) = self.current_parent.and_then(|p| self.switch_param(p)) {
                    self.handle_switch(switch);
                }
            }
            _ if self.pop_marker.is_some_and(|m| self.unpack_p >= m) => {
                self.current_field = None;
            }
            _ => {
                self.current_field = self
                    .current_parent
                    .and_then(|p| self.file.nested_field(p, self.field_index));
            }
        }
    }

    /// Replaces the switch parameter being traversed with the case selected
    /// by the key just visited.
    fn handle_switch(&mut self, switch: SwitchId) {
        let file = self.file;
        let sw = file.switch(switch);
        let key: &[u8] = match self.mode {
            Mode::Unpack => self
                .unpack_data
                .get(self.push_marker..self.unpack_p)
                .unwrap_or_default(),
            _ => self.pack_data.tail(self.push_marker),
        };
        self.last_switch_key = file
            .simple_of(Node::Field(sw.key()))
            .and_then(|simple| simple.decode_value(key));

        let Some(group) = sw.apply_switch(key) else {
            log::warn!(
                "switch `{}` has no case for key {:02x?}",
                sw.name(),
                key
            );
            self.errors.range(PackerError::UnmatchedSwitchKey {
                switch: sw.name().to_owned(),
                key: self.last_switch_key.clone(),
            });
            return;
        };

        let case = Node::Case { switch, group };
        self.last_switch = Some(switch);
        self.current_parent = Some(case);
        self.num_nested_fields = file.num_nested_fields(case);
        if self
            .num_nested_fields
            .is_some_and(|n| self.field_index < n)
        {
            self.current_field = file.nested_field(case, self.field_index);
        }
    }

    /// Enters the nested fields of the current field.
    pub fn push(&mut self) {
        let Some(field) = self.current_field else {
            self.errors.pack(PackerError::NoCurrentField { operation: "push" });
            return;
        };
        let file = self.file;
        if !file.has_nested_fields(field) {
            self.errors.pack(PackerError::NotNested);
            return;
        }

        self.stack.push(Frame {
            parent: self.current_parent,
            field_index: self.field_index,
            num_nested: self.num_nested_fields,
            push_marker: self.push_marker,
            pop_marker: self.pop_marker,
        });
        self.current_parent = Some(field);
        self.field_index = 0;
        self.pop_marker = None;

        let mut num_nested = file.num_nested_fields(field);
        let length_bytes = file.num_length_bytes(field);
        match self.mode {
            Mode::Unpack => {
                self.push_marker = self.unpack_p;
                if length_bytes != 0 {
                    let mut r = Reader::new(&self.unpack_data, self.unpack_p);
                    match r.take_length(length_bytes) {
                        Ok(length) => {
                            self.unpack_p = r.offset();
                            self.push_marker = self.unpack_p;
                            self.pop_marker = Some(self.unpack_p + length);
                            num_nested = if length == 0 {
                                Some(0)
                            } else {
                                file.calc_num_nested_fields(field, length)
                            };
                        }
                        Err(e) => {
                            self.errors.pack(e.into());
                            num_nested = Some(0);
                        }
                    }
                }
            }
            _ => {
                self.push_marker = self.pack_data.append_junk(length_bytes);
            }
        }

        self.num_nested_fields = num_nested;
        self.current_field = if num_nested == Some(0) {
            None
        } else {
            file.nested_field(field, 0)
        };
    }

    /// Leaves the nested fields entered by the matching [`Packer::push`].
    pub fn pop(&mut self) {
        if self.current_field.is_some() && self.num_nested_fields.is_some() {
            self.errors.pack(PackerError::UnfinishedFields);
        } else if self.mode == Mode::Unpack {
            if let Some(marker) = self.pop_marker.filter(|&m| m != self.unpack_p) {
                self.errors.pack(PackerError::ResidualBytes {
                    residual: marker.abs_diff(self.unpack_p),
                });
            }
        }

        let Some(frame) = self.stack.pop() else {
            self.errors.pack(PackerError::UnbalancedPop);
            return;
        };

        let file = self.file;
        if let Some(parent) = self.current_parent {
            if !file.validate_num_nested_fields(parent, self.field_index) {
                self.errors.pack(PackerError::NestedCount {
                    actual: self.field_index,
                });
            }
            if matches!(self.mode, Mode::Pack | Mode::Repack) {
                self.patch_length(file.num_length_bytes(parent));
            }
        }

        self.current_field = self.current_parent;
        self.current_parent = frame.parent;
        self.field_index = frame.field_index;
        self.num_nested_fields = frame.num_nested;
        self.push_marker = frame.push_marker;
        self.pop_marker = frame.pop_marker;
        self.advance();
    }

    /// Fills in the length prefix reserved by `push`.
    fn patch_length(&mut self, length_bytes: usize) {
        if length_bytes == 0 {
            return;
        }
        let length = self
            .pack_data
            .len()
            .saturating_sub(self.push_marker + length_bytes);
        let written = if length_bytes == 4 {
            self.pack_data
                .rewrite_at(self.push_marker, &(length as u32).to_le_bytes())
        } else {
            if length > 0xffff {
                self.errors
                    .range(PackerError::Width(crate::error::WidthError::TooWide {
                        limit: 0xffff,
                        actual: length,
                    }));
            }
            self.pack_data
                .rewrite_at(self.push_marker, &(length as u16).to_le_bytes())
        };
        if !written {
            self.errors.pack(PackerError::UnbalancedPop);
        }
    }

    // Packing

    fn pack_number(&mut self, operation: &'static str, value: Number) {
        let Some(node) = self.expect_pack(operation) else {
            return;
        };
        let file = self.file;
        match file.simple_of(node) {
            Some(simple) => simple.pack_number(&mut self.pack_data, value, &mut self.errors),
            None => self.errors.pack(PackerError::WrongType {
                operation,
                pack_type: file.pack_type(node),
            }),
        }
        self.advance();
    }

    pub fn pack_int(&mut self, value: i32) {
        self.pack_number("pack_int", Number::Int(value.into()))
    }

    pub fn pack_uint(&mut self, value: u32) {
        self.pack_number("pack_uint", Number::UInt(value.into()))
    }

    pub fn pack_int64(&mut self, value: i64) {
        self.pack_number("pack_int64", Number::Int(value))
    }

    pub fn pack_uint64(&mut self, value: u64) {
        self.pack_number("pack_uint64", Number::UInt(value))
    }

    pub fn pack_double(&mut self, value: f64) {
        self.pack_number("pack_double", Number::Float(value))
    }

    fn pack_byte_string(&mut self, operation: &'static str, value: &[u8]) {
        let Some(node) = self.expect_pack(operation) else {
            return;
        };
        self.file
            .pack_bytes(node, &mut self.pack_data, value, &mut self.errors);
        self.advance();
    }

    pub fn pack_string(&mut self, value: &str) {
        self.pack_byte_string("pack_string", value.as_bytes())
    }

    pub fn pack_blob(&mut self, value: &[u8]) {
        self.pack_byte_string("pack_blob", value)
    }

    /// Appends already-packed bytes as the value of the current field.
    ///
    /// The bytes are not validated.
    pub fn pack_literal_value(&mut self, value: &[u8]) {
        if self.expect_pack("pack_literal_value").is_some() {
            self.pack_data.push_all(value);
            self.advance();
        }
    }

    /// Packs the declared default of the current field, or the least legal
    /// value of its type.
    pub fn pack_default_value(&mut self) {
        let Some(node) = self.expect_pack("pack_default_value") else {
            return;
        };
        let file = self.file;
        if let Some(bytes) = file.default_value(node) {
            self.pack_data.push_all(bytes);
            self.advance();
        } else if let Some(simple) = file.simple_of(node) {
            simple.pack_default(&mut self.pack_data, &mut self.errors);
            self.advance();
        } else if let Some(array) = file.array_of_node(node) {
            let count = array.min_len();
            self.push();
            for _ in 0..count {
                self.pack_default_value();
            }
            self.pop();
        } else {
            self.push();
            if let Some(switch) = self.switch_param(node) {
                match file.switch(switch).cases().first() {
                    Some(case) => self.pack_literal_value(case.value()),
                    None => self.pack_default_value(),
                }
            }
            while self.more_nested_fields() {
                self.pack_default_value();
            }
            self.pop();
        }
    }

    /// Packs a dynamically-typed value into the current field.
    ///
    /// Lists are packed element by element into the nested fields.
    pub fn pack_value(&mut self, value: &DcValue) {
        match value {
            DcValue::Int(i) => self.pack_number("pack_value", Number::Int(*i)),
            DcValue::UInt(u) => self.pack_number("pack_value", Number::UInt(*u)),
            DcValue::Float(f) => self.pack_number("pack_value", Number::Float(*f)),
            DcValue::Str(s) => self.pack_byte_string("pack_value", s.as_bytes()),
            DcValue::Blob(b) => self.pack_byte_string("pack_value", b),
            DcValue::List(items) => {
                if self.expect_pack("pack_value").is_none() {
                    return;
                }
                self.push();
                for item in items {
                    if self.had_pack_error() {
                        break;
                    }
                    self.pack_value(item);
                }
                self.pop();
            }
        }
    }

    // Unpacking

    fn read<T>(&mut self, f: impl FnOnce(&mut Reader<'_>, &mut ErrorFlags) -> T) -> T {
        let mut r = Reader::new(&self.unpack_data, self.unpack_p);
        let ret = f(&mut r, &mut self.errors);
        self.unpack_p = r.offset();
        ret
    }

    fn unpack_scalar<T: Default>(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&crate::model::SimpleParameter, &mut Reader<'_>, &mut ErrorFlags) -> T,
    ) -> T {
        let Some(node) = self.expect_unpack(operation) else {
            return T::default();
        };
        let file = self.file;
        let ret = match file.simple_of(node) {
            Some(simple) => self.read(|r, errs| f(simple, r, errs)),
            None => {
                self.errors.pack(PackerError::WrongType {
                    operation,
                    pack_type: file.pack_type(node),
                });
                T::default()
            }
        };
        self.advance();
        ret
    }

    pub fn unpack_int64(&mut self) -> i64 {
        self.unpack_scalar("unpack_int64", |s, r, errs| s.unpack_int64(r, errs))
    }

    pub fn unpack_uint64(&mut self) -> u64 {
        self.unpack_scalar("unpack_uint64", |s, r, errs| s.unpack_uint64(r, errs))
    }

    pub fn unpack_double(&mut self) -> f64 {
        self.unpack_scalar("unpack_double", |s, r, errs| s.unpack_double(r, errs))
    }

    pub fn unpack_int(&mut self) -> i32 {
        let v = self.unpack_int64();
        i32::try_from(v).unwrap_or_else(|_| {
            self.errors.pack(PackerError::Lossy {
                operation: "unpack_int",
                value: v.to_string(),
            });
            0
        })
    }

    pub fn unpack_uint(&mut self) -> u32 {
        let v = self.unpack_uint64();
        u32::try_from(v).unwrap_or_else(|_| {
            self.errors.pack(PackerError::Lossy {
                operation: "unpack_uint",
                value: v.to_string(),
            });
            0
        })
    }

    pub fn unpack_blob(&mut self) -> Vec<u8> {
        let Some(node) = self.expect_unpack("unpack_blob") else {
            return Vec::new();
        };
        let file = self.file;
        let ret = self.read(|r, errs| file.unpack_bytes(node, r, errs));
        self.advance();
        ret
    }

    pub fn unpack_string(&mut self) -> String {
        let bytes = self.unpack_blob();
        String::from_utf8(bytes).unwrap_or_else(|e| {
            self.errors.pack(PackerError::InvalidUtf8);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        })
    }

    /// Returns the packed bytes of the current field without decoding them.
    pub fn unpack_literal_value(&mut self) -> Vec<u8> {
        let start = self.unpack_p;
        self.unpack_skip();
        self.unpack_data
            .get(start..self.unpack_p)
            .unwrap_or_default()
            .to_vec()
    }

    /// Steps over the current field.
    pub fn unpack_skip(&mut self) {
        let Some(node) = self.expect_unpack("unpack_skip") else {
            return;
        };
        let file = self.file;
        let mut r = Reader::new(&self.unpack_data, self.unpack_p);
        match file.unpack_skip(node, &mut r) {
            Some(result) => {
                self.unpack_p = r.offset();
                if let Err(e) = result {
                    self.errors.pack(e);
                }
                self.advance();
            }
            None => {
                self.push();
                while self.more_nested_fields() {
                    self.unpack_skip();
                }
                self.pop();
            }
        }
    }

    /// Steps over the current field, checking every value against its
    /// declared range.
    pub fn unpack_validate(&mut self) {
        let Some(node) = self.expect_unpack("unpack_validate") else {
            return;
        };
        let file = self.file;
        let validated = match file.simple_of(node) {
            Some(simple) => self.read(|r, errs| simple.unpack_validate(r, errs)),
            None => false,
        };
        if validated {
            self.advance();
        } else {
            self.push();
            while self.more_nested_fields() {
                self.unpack_validate();
            }
            self.pop();
        }
    }

    /// Unpacks the current field as a dynamically-typed value.
    pub fn unpack_value(&mut self) -> DcValue {
        match self.get_pack_type() {
            PackType::Double => DcValue::Float(self.unpack_double()),
            PackType::Int | PackType::Int64 => DcValue::Int(self.unpack_int64()),
            PackType::UInt | PackType::UInt64 => DcValue::UInt(self.unpack_uint64()),
            PackType::String => match String::from_utf8(self.unpack_blob()) {
                Ok(s) => DcValue::Str(s),
                Err(e) => DcValue::Blob(e.into_bytes()),
            },
            PackType::Blob => DcValue::Blob(self.unpack_blob()),
            PackType::Invalid => {
                if self.expect_unpack("unpack_value").is_some() {
                    self.unpack_skip();
                }
                DcValue::List(Vec::new())
            }
            PackType::Array | PackType::Field | PackType::Class | PackType::Switch => {
                let mut items = Vec::new();
                self.push();
                while self.more_nested_fields() {
                    items.push(self.unpack_value());
                }
                self.pop();
                DcValue::List(items)
            }
        }
    }

    // Random access

    fn ensure_live_catalog(&mut self) -> bool {
        self.catalog_used = true;
        if self.live.is_some() {
            return true;
        }
        let Some(root) = self.root else {
            self.errors.pack(PackerError::CatalogFailed);
            return false;
        };
        let data = self.unpack_data.get(self.base..).unwrap_or_default();
        match LiveCatalog::build(self.file, root, data) {
            Some(live) => {
                self.live = Some(live);
                true
            }
            None => {
                self.errors.pack(PackerError::CatalogFailed);
                false
            }
        }
    }

    fn known_to_catalog(&mut self, name: &str) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        if self.catalog.as_ref().map_or(true, |c| c.root() != root) {
            self.catalog = Some(Catalog::build(self.file, root));
        }
        self.catalog.as_ref().is_some_and(|c| c.contains(name))
    }

    fn lookup(&mut self, name: &str) -> Option<LiveEntry> {
        if !self.ensure_live_catalog() {
            return None;
        }
        let found = self.live.as_ref().and_then(|live| live.get(name)).copied();
        if found.is_none() {
            let err = if self.known_to_catalog(name) {
                PackerError::AbsentSeekTarget(name.to_owned())
            } else {
                PackerError::UnknownSeekTarget(name.to_owned())
            };
            self.errors.pack(err);
        }
        found
    }

    /// Positions the packer on the named field, given as a dotted path from
    /// the root (`pos.x`).
    ///
    /// In unpack mode the field and its following siblings can then be
    /// unpacked. In repack mode the field alone can be packed, replacing its
    /// previous value; fields within a switch cannot be repacked separately
    /// from the switch.
    pub fn seek(&mut self, name: &str) -> bool {
        if !self.expect_mode("seek", &[Mode::Unpack, Mode::Repack]) {
            return false;
        }
        let Some(entry) = self.lookup(name) else {
            return false;
        };
        match self.mode {
            Mode::Unpack => {
                self.seek_unpack(entry);
                true
            }
            _ => self.seek_repack(name, entry),
        }
    }

    /// Like [`Packer::seek`], addressing the `index`th field present in the
    /// record.
    pub fn seek_index(&mut self, index: usize) -> bool {
        if !self.expect_mode("seek", &[Mode::Unpack, Mode::Repack]) || !self.ensure_live_catalog() {
            return false;
        }
        let name = self
            .live
            .as_ref()
            .and_then(|live| live.get_index(index))
            .map(|(name, _)| name.to_owned());
        match name {
            Some(name) => self.seek(&name),
            None => {
                self.errors
                    .pack(PackerError::UnknownSeekTarget(format!("#{index}")));
                false
            }
        }
    }

    fn seek_unpack(&mut self, live: LiveEntry) {
        let entry = live.entry;
        self.stack.clear();
        self.current_field = Some(entry.field);
        self.current_parent = Some(entry.parent);
        self.field_index = entry.field_index;
        self.num_nested_fields = self.file.num_nested_fields(entry.parent);
        self.unpack_p = self.base + live.begin;
        self.push_marker = self.unpack_p;
        self.pop_marker = None;
    }

    fn seek_repack(&mut self, name: &str, mut live: LiveEntry) -> bool {
        if !self.stack.is_empty() || self.current_field.is_some() {
            self.errors.pack(PackerError::UnfinishedFields);
            return false;
        }
        if live.entry.in_switch {
            self.errors.pack(PackerError::SeekIntoSwitch(name.to_owned()));
            return false;
        }

        if live.begin < self.unpack_p {
            let rest = self.unpack_data.get(self.unpack_p..).unwrap_or_default();
            self.pack_data.push_all(rest);
            let data = self.pack_data.take();
            log::debug!(
                "`{name}` repacked out of order; restarting over {} bytes",
                data.len()
            );
            self.unpack_data = Cow::Owned(data);
            self.unpack_p = 0;
            self.live = None;
            match self.lookup(name) {
                Some(entry) => live = entry,
                None => return false,
            }
        }

        let skipped = self
            .unpack_data
            .get(self.unpack_p..live.begin)
            .unwrap_or_default();
        self.pack_data.push_all(skipped);

        let entry = live.entry;
        self.current_field = Some(entry.field);
        self.current_parent = Some(entry.parent);
        self.field_index = entry.field_index;
        self.num_nested_fields = Some(entry.field_index + 1);
        self.unpack_p = live.end;
        self.push_marker = self.pack_data.len();
        self.pop_marker = Some(live.end);
        true
    }

    // Raw access outside of sessions

    raw_ops! {
        i8 => raw_pack_int8 / raw_unpack_int8 via push_i8 / take_i8,
        i16 => raw_pack_int16 / raw_unpack_int16 via push_i16 / take_i16,
        i32 => raw_pack_int32 / raw_unpack_int32 via push_i32 / take_i32,
        i64 => raw_pack_int64 / raw_unpack_int64 via push_i64 / take_i64,
        u8 => raw_pack_uint8 / raw_unpack_uint8 via push_u8 / take_u8,
        u16 => raw_pack_uint16 / raw_unpack_uint16 via push_u16 / take_u16,
        u32 => raw_pack_uint32 / raw_unpack_uint32 via push_u32 / take_u32,
        u64 => raw_pack_uint64 / raw_unpack_uint64 via push_u64 / take_u64,
        f64 => raw_pack_float64 / raw_unpack_float64 via push_f64 / take_f64,
    }

    /// Appends a blob with a 16-bit length prefix outside of any session.
    pub fn raw_pack_blob(&mut self, value: &[u8]) {
        if !self.expect_idle("raw_pack_blob") {
            return;
        }
        if value.len() > 0xffff {
            self.errors
                .range(PackerError::Width(crate::error::WidthError::TooWide {
                    limit: 0xffff,
                    actual: value.len(),
                }));
        }
        self.pack_data.push_u16(value.len() as u16);
        self.pack_data.push_all(value);
    }

    pub fn raw_pack_string(&mut self, value: &str) {
        self.raw_pack_blob(value.as_bytes())
    }

    pub fn raw_unpack_blob(&mut self) -> Vec<u8> {
        if !self.expect_idle("raw_unpack_blob") {
            return Vec::new();
        }
        let mut r = Reader::new(&self.unpack_data, self.unpack_p);
        match r.take_u16().and_then(|len| r.consume(len.into())) {
            Ok(bytes) => {
                self.unpack_p = r.offset();
                bytes.to_vec()
            }
            Err(e) => {
                self.errors.pack(e.into());
                Vec::new()
            }
        }
    }

    pub fn raw_unpack_string(&mut self) -> String {
        String::from_utf8(self.raw_unpack_blob()).unwrap_or_else(|e| {
            self.errors.pack(PackerError::InvalidUtf8);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        })
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::format::{pack_to_vec, unpack_to_value};
    use super::*;
    use crate::model::{FieldId, Parameter, SimpleParameter};
    use crate::range::NumericRange;
    use crate::subatomic::SubatomicType;

    fn simple(ty: SubatomicType) -> Parameter {
        SimpleParameter::new(ty).into()
    }

    /// `setInfo(uint8 level, string name, uint16 ids[], Point pos)` and
    /// `setShape(Shape shape)` with `Shape` switching on a `uint8`
    struct Schema {
        file: DcFile,
        set_info: FieldId,
        set_shape: FieldId,
        shape: SwitchId,
    }

    fn schema() -> Schema {
        let mut file = DcFile::new();
        let point = file.add_class("Point", true).unwrap();
        for name in ["x", "y"] {
            let f = file.new_parameter_field(name, simple(SubatomicType::Int16));
            file.add_field(point, f).unwrap();
        }

        let level = file.new_parameter_field("level", simple(SubatomicType::UInt8));
        let name = file.new_parameter_field("name", simple(SubatomicType::String));
        let ids = file
            .array_of(simple(SubatomicType::UInt16), NumericRange::new())
            .unwrap();
        let ids = file.new_parameter_field("ids", ids);
        let pos = file.new_parameter_field("pos", Parameter::class(point));
        let set_info = file
            .new_atomic_field("setInfo", vec![level, name, ids, pos])
            .unwrap();

        let shape = file.add_switch("Shape", simple(SubatomicType::UInt8)).unwrap();
        file.add_case(shape, vec![0]).unwrap();
        let r = file.new_parameter_field("r", simple(SubatomicType::UInt16));
        file.add_switch_field(shape, r).unwrap();
        file.add_break(shape).unwrap();
        file.add_case(shape, vec![1]).unwrap();
        let label = file.new_parameter_field("label", simple(SubatomicType::String));
        file.add_switch_field(shape, label).unwrap();
        file.add_break(shape).unwrap();
        let param = file.new_parameter_field("shape", Parameter::switch(shape));
        let set_shape = file.new_atomic_field("setShape", vec![param]).unwrap();

        let avatar = file.add_class("Avatar", false).unwrap();
        file.add_field(avatar, set_info).unwrap();
        file.add_field(avatar, set_shape).unwrap();
        Schema {
            file,
            set_info,
            set_shape,
            shape,
        }
    }

    const INFO: [u8; 15] = [
        7, // level
        2, 0, b'a', b'b', // name
        4, 0, 1, 0, 2, 0, // ids
        3, 0, 0xfc, 0xff, // pos
    ];

    fn pack_info(packer: &mut Packer<'_>, root: FieldId) {
        packer.begin_pack(root);
        packer.push();
        packer.pack_uint(7);
        packer.pack_string("ab");
        packer.push();
        packer.pack_uint(1);
        packer.pack_uint(2);
        packer.pop();
        packer.push();
        packer.pack_int(3);
        packer.pack_int(-4);
        packer.pop();
        packer.pop();
    }

    #[test]
    fn pack_by_hand() {
        let s = schema();
        let mut packer = Packer::new(&s.file);
        pack_info(&mut packer, s.set_info);
        assert_eq!(packer.end_pack(), Ok(()));
        assert_eq!(packer.get_data(), &INFO);
        assert_eq!(packer.get_mode(), Mode::Idle);
    }

    #[test]
    fn unpack_by_hand() {
        let s = schema();
        let mut packer = Packer::new(&s.file);
        packer.set_unpack_data_borrowed(&INFO);
        packer.begin_unpack(s.set_info);
        packer.push();
        assert_eq!(packer.get_current_field_name(), "level");
        assert_eq!(packer.unpack_uint(), 7);
        assert_eq!(packer.unpack_string(), "ab");
        assert_eq!(packer.get_pack_type(), PackType::Array);
        packer.push();
        assert_eq!(packer.get_num_nested_fields(), Some(2));
        let mut ids = Vec::new();
        while packer.more_nested_fields() {
            ids.push(packer.unpack_uint());
        }
        packer.pop();
        assert_eq!(ids, [1, 2]);
        packer.push();
        assert_eq!((packer.unpack_int(), packer.unpack_int()), (3, -4));
        packer.pop();
        packer.pop();
        assert_eq!(packer.end_unpack(), Ok(()));
        assert_eq!(packer.get_num_unpacked_bytes(), INFO.len());
    }

    #[test]
    fn values_round_trip() {
        let s = schema();
        let value = unpack_to_value(&s.file, s.set_info, &INFO).unwrap();
        assert_eq!(
            value,
            DcValue::List(vec![
                DcValue::UInt(7),
                "ab".into(),
                DcValue::List(vec![DcValue::UInt(1), DcValue::UInt(2)]),
                DcValue::List(vec![DcValue::Int(3), DcValue::Int(-4)]),
            ])
        );
        assert_eq!(pack_to_vec(&s.file, s.set_info, &value).unwrap(), INFO);
    }

    #[test]
    fn minimal_prefixes() {
        let mut file = DcFile::new();
        let fixed = file
            .array_of(simple(SubatomicType::UInt16), NumericRange::single(3, 3).unwrap())
            .unwrap();
        let fixed = file.new_parameter_field("rgb", fixed);
        let bytes = pack_to_vec(
            &file,
            fixed,
            &DcValue::List(vec![1u32.into(), 2u32.into(), 3u32.into()]),
        )
        .unwrap();
        assert_eq!(bytes, [1, 0, 2, 0, 3, 0]);

        let blob = file.new_parameter_field("b", simple(SubatomicType::Blob32));
        let bytes = pack_to_vec(&file, blob, &DcValue::Blob(vec![9])).unwrap();
        assert_eq!(bytes, [1, 0, 0, 0, 9]);
    }

    #[test]
    fn switch_selects_case() {
        let s = schema();
        let mut packer = Packer::new(&s.file);
        packer.begin_pack(s.set_shape);
        packer.push();
        packer.push();
        packer.pack_uint(1);
        assert_eq!(packer.get_current_field_name(), "label");
        packer.pack_string("hi");
        packer.pop();
        packer.pop();
        assert_eq!(packer.end_pack(), Ok(()));
        assert_eq!(packer.get_data(), &[1, 2, 0, b'h', b'i']);
        assert_eq!(packer.get_last_switch(), Some(s.shape));
        assert_eq!(packer.get_last_switch_key(), Some(&DcValue::UInt(1)));

        let value = unpack_to_value(&s.file, s.set_shape, &[0, 44, 1]).unwrap();
        assert_eq!(
            value,
            DcValue::List(vec![DcValue::List(vec![DcValue::UInt(0), DcValue::UInt(300)])])
        );
    }

    #[test]
    fn unmatched_switch_key() {
        let s = schema();
        let mut packer = Packer::new(&s.file);
        packer.begin_pack(s.set_shape);
        packer.push();
        packer.push();
        packer.pack_uint(5);
        assert!(!packer.more_nested_fields());
        packer.pop();
        packer.pop();
        let err = packer.end_pack().unwrap_err();
        assert!(err.is_range_only());
        assert!(matches!(err.cause, Some(PackerError::UnmatchedSwitchKey { .. })));

        assert!(unpack_to_value(&s.file, s.set_shape, &[5]).is_err());
    }

    #[test]
    fn out_of_range_values_are_still_packed() {
        let mut file = DcFile::new();
        let mut percent = SimpleParameter::new(SubatomicType::UInt8);
        percent.set_range(NumericRange::single(0.0, 100.0).unwrap()).unwrap();
        let field = file.new_parameter_field("pct", percent.into());

        let mut packer = Packer::new(&file);
        packer.begin_pack(field);
        packer.pack_uint(200);
        let err = packer.end_pack().unwrap_err();
        assert!(err.is_range_only());
        assert_eq!(packer.get_data(), &[200]);
    }

    #[test]
    fn fixed_length_strings_have_no_prefix() {
        let mut file = DcFile::new();
        let mut tag = SimpleParameter::new(SubatomicType::String);
        tag.set_range(NumericRange::single(4.0, 4.0).unwrap()).unwrap();
        let tag = file.new_parameter_field("tag", tag.into());
        let n = file.new_parameter_field("n", simple(SubatomicType::UInt8));
        let set_tag = file.new_atomic_field("setTag", vec![tag, n]).unwrap();

        let mut packer = Packer::new(&file);
        packer.begin_pack(set_tag);
        packer.push();
        packer.pack_string("abcd");
        packer.pack_uint(9);
        packer.pop();
        assert_eq!(packer.end_pack(), Ok(()));
        assert_eq!(packer.get_data(), b"abcd\x09");

        let data = packer.take_data();
        packer.set_unpack_data_owned(data);
        packer.begin_unpack(set_tag);
        packer.push();
        assert_eq!(packer.unpack_string(), "abcd");
        assert_eq!(packer.get_num_unpacked_bytes(), 4);
        assert_eq!(packer.unpack_uint(), 9);
        packer.pop();
        assert_eq!(packer.end_unpack(), Ok(()));

        packer.begin_pack(set_tag);
        packer.push();
        packer.pack_string("abc");
        packer.pack_uint(9);
        packer.pop();
        let err = packer.end_pack().unwrap_err();
        assert!(err.is_range_only());
        assert_eq!(
            err.cause,
            Some(PackerError::Length(crate::error::LengthError::OutOfRange { actual: 3 }))
        );
    }

    #[test]
    fn structural_misuse() {
        let s = schema();
        let mut packer = Packer::new(&s.file);

        pack_info(&mut packer, s.set_info);
        packer.pop();
        assert!(packer.had_pack_error());
        assert!(packer.end_pack().is_err());

        packer.begin_pack(s.set_info);
        assert!(!packer.had_error());
        packer.push();
        packer.pack_uint(7);
        packer.pop();
        let err = packer.end_pack().unwrap_err();
        assert_eq!(err.cause, Some(PackerError::UnfinishedFields));

        packer.begin_pack(s.set_info);
        packer.push();
        packer.pack_uint(7);
        packer.pack_double(1.0);
        assert!(matches!(
            packer.errors().first(),
            Some(PackerError::WrongType { .. })
        ));
        assert!(packer.had_pack_error());
        assert!(!packer.more_nested_fields());
        packer.clear();
        assert!(!packer.had_error());
        assert_eq!(packer.get_mode(), Mode::Idle);

        packer.unpack_skip();
        assert!(matches!(
            packer.errors().first(),
            Some(PackerError::WrongMode { mode: Mode::Idle, .. })
        ));
    }

    #[test]
    fn nested_count_is_checked() {
        let mut file = DcFile::new();
        let few = file
            .array_of(simple(SubatomicType::Int16), NumericRange::single(2, 4).unwrap())
            .unwrap();
        let few = file.new_parameter_field("few", few);
        let err = pack_to_vec(&file, few, &DcValue::List(vec![DcValue::Int(1)])).unwrap_err();
        assert!(err.pack_error);
        assert_eq!(err.cause, Some(PackerError::NestedCount { actual: 1 }));
    }

    #[test]
    fn default_values() {
        let mut s = schema();
        let mut packer = Packer::new(&s.file);
        packer.begin_pack(s.set_info);
        packer.pack_default_value();
        assert_eq!(packer.end_pack(), Ok(()));
        assert_eq!(packer.get_data(), &[0, 0, 0, 0, 0, 0, 0, 0, 0]);

        packer.clear_data();
        packer.begin_pack(s.set_shape);
        packer.pack_default_value();
        assert_eq!(packer.end_pack(), Ok(()));
        assert_eq!(packer.get_data(), &[0, 0, 0]);

        let avatar = s.file.get_class_by_name("Avatar").unwrap();
        let found = s.file.get_class_field_by_name(avatar, "setInfo");
        assert_eq!(found, Some(s.set_info));
        s.file.set_default_value(s.set_info, INFO.to_vec()).unwrap();
        let mut packer = Packer::new(&s.file);
        packer.begin_pack(s.set_info);
        packer.pack_default_value();
        assert_eq!(packer.end_pack(), Ok(()));
        assert_eq!(packer.get_data(), &INFO);
    }

    #[test]
    fn seek_while_unpacking() {
        let s = schema();
        let mut packer = Packer::new(&s.file);
        packer.set_unpack_data_borrowed(&INFO);
        packer.begin_unpack(s.set_info);
        assert!(packer.seek("pos"));
        packer.push();
        assert_eq!(packer.unpack_int(), 3);
        assert_eq!(packer.unpack_int(), -4);
        packer.pop();
        assert_eq!(
            packer.live_catalog().and_then(|live| live.span("pos")),
            Some(11..15)
        );
        assert_eq!(packer.get_num_unpacked_bytes(), 15);

        assert!(packer.seek("name"));
        assert_eq!(packer.unpack_string(), "ab");
        assert_eq!(packer.get_num_unpacked_bytes(), 5);
        assert!(packer.seek("pos.y"));
        assert_eq!(packer.unpack_int(), -4);
        assert_eq!(packer.end_unpack(), Ok(()));

        packer.set_unpack_data_borrowed(&INFO);
        packer.begin_unpack(s.set_info);
        assert!(!packer.seek("nope"));
        assert_eq!(
            packer.errors().first(),
            Some(&PackerError::UnknownSeekTarget("nope".to_owned()))
        );
    }

    #[test]
    fn seek_to_absent_case() {
        let s = schema();
        let data = [1, 2, 0, b'h', b'i'];
        let mut packer = Packer::new(&s.file);
        packer.set_unpack_data_borrowed(&data);
        packer.begin_unpack(s.set_shape);
        assert!(packer.seek("shape.label"));
        assert_eq!(packer.unpack_string(), "hi");
        assert!(!packer.seek("shape.r"));
        assert_eq!(
            packer.errors().first(),
            Some(&PackerError::AbsentSeekTarget("shape.r".to_owned()))
        );
    }

    #[test]
    fn repack_in_and_out_of_order() {
        let s = schema();
        let mut packer = Packer::new(&s.file);
        packer.set_unpack_data_owned(INFO.to_vec());
        packer.begin_repack(s.set_info);
        assert!(packer.seek("name"));
        packer.pack_string("hello");
        assert!(packer.seek("pos.x"));
        packer.pack_int(10);
        assert!(packer.seek("level"));
        packer.pack_uint(99);
        assert_eq!(packer.end_repack(), Ok(()));
        assert_eq!(
            packer.get_data(),
            &[99, 5, 0, b'h', b'e', b'l', b'l', b'o', 4, 0, 1, 0, 2, 0, 10, 0, 0xfc, 0xff]
        );
    }

    #[test]
    fn repack_whole_switch_only() {
        let s = schema();
        let data = [1, 2, 0, b'h', b'i'];
        let mut packer = Packer::new(&s.file);
        packer.set_unpack_data_borrowed(&data);
        packer.begin_repack(s.set_shape);
        assert!(!packer.seek("shape.label"));
        assert_eq!(
            packer.errors().first(),
            Some(&PackerError::SeekIntoSwitch("shape.label".to_owned()))
        );
        packer.clear();

        packer.begin_repack(s.set_shape);
        assert!(packer.seek("shape"));
        packer.push();
        packer.pack_uint(0);
        packer.pack_uint(300);
        packer.pop();
        assert_eq!(packer.end_repack(), Ok(()));
        assert_eq!(packer.get_data(), &[0, 44, 1]);
    }

    #[test]
    fn raw_access() {
        let file = DcFile::new();
        let mut packer = Packer::new(&file);
        packer.raw_pack_uint16(0x1234);
        packer.raw_pack_string("ok");
        packer.raw_pack_float64(0.5);
        let data = packer.take_data();
        assert_eq!(&data[..6], &[0x34, 0x12, 2, 0, b'o', b'k']);

        packer.set_unpack_data_owned(data);
        assert_eq!(packer.raw_unpack_uint16(), 0x1234);
        assert_eq!(packer.raw_unpack_string(), "ok");
        assert_eq!(packer.raw_unpack_float64(), 0.5);
        assert!(!packer.had_error());
        assert_eq!(packer.raw_unpack_int8(), 0);
        assert!(packer.had_pack_error());
    }

    proptest! {
        #[test]
        fn arbitrary_values_round_trip(
            level in any::<u8>(),
            name in "[ -~]{0,16}",
            ids in proptest::collection::vec(any::<u16>(), 0..8),
            x in any::<i16>(),
            y in any::<i16>(),
        ) {
            let s = schema();
            let expected_len = 1 + 2 + name.len() + 2 + 2 * ids.len() + 4;
            let value = DcValue::List(vec![
                DcValue::UInt(level.into()),
                DcValue::Str(name),
                DcValue::List(ids.into_iter().map(|i| DcValue::UInt(i.into())).collect()),
                DcValue::List(vec![DcValue::Int(x.into()), DcValue::Int(y.into())]),
            ]);
            let bytes = pack_to_vec(&s.file, s.set_info, &value).unwrap();
            prop_assert_eq!(bytes.len(), expected_len);
            prop_assert_eq!(unpack_to_value(&s.file, s.set_info, &bytes).unwrap(), value);
        }

        #[test]
        fn fixed_size_is_exact(key in 0u8..2, r in any::<u16>(), x in any::<i16>()) {
            let mut file = DcFile::new();
            let shape = file.add_switch("", simple(SubatomicType::UInt8)).unwrap();
            file.add_case(shape, vec![0]).unwrap();
            let a = file.new_parameter_field("a", simple(SubatomicType::UInt16));
            file.add_switch_field(shape, a).unwrap();
            file.add_break(shape).unwrap();
            file.add_case(shape, vec![1]).unwrap();
            let b = file.new_parameter_field("b", simple(SubatomicType::Int16));
            file.add_switch_field(shape, b).unwrap();
            file.add_break(shape).unwrap();
            let sw = file.new_parameter_field("sw", Parameter::switch(shape));
            let n = file.new_parameter_field("n", simple(SubatomicType::Int16));
            let root = file.new_atomic_field("set", vec![n, sw]).unwrap();
            prop_assert_eq!(file.fixed_byte_size(Node::Field(root)), Some(5));

            let payload = if key == 0 { DcValue::UInt(r.into()) } else { DcValue::Int(x.into()) };
            let value = DcValue::List(vec![
                DcValue::Int(x.into()),
                DcValue::List(vec![DcValue::UInt(key.into()), payload]),
            ]);
            let bytes = pack_to_vec(&file, root, &value).unwrap();
            prop_assert_eq!(bytes.len(), 5);
        }
    }
}

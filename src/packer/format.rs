//! Human-readable rendering of packed values
//!
//! The text form mirrors the nesting of the type tree: arrays in `[...]`,
//! atomic fields and switches in `(...)`, structs in `{...}`. Strings are
//! quoted and blobs written as `<hex>`. Parameter names can be prefixed as
//! `name = value`.
//!
//! The free functions wrap a whole session around a single root value.

use std::fmt::{self, Write};

use super::{Packer, SessionResult};
use crate::model::{DcFile, Node};
use crate::subatomic::PackType;
use crate::value::{enquote_string, write_hex, DcValue};

impl Packer<'_> {
    /// Unpacks the current field and renders it as text.
    pub fn unpack_and_format(&mut self, show_names: bool) -> String {
        let mut out = String::new();
        // Writing into a `String` cannot fail.
        let _ = self.unpack_and_format_into(&mut out, show_names);
        out
    }

    pub fn unpack_and_format_into<W: Write>(&mut self, out: &mut W, show_names: bool) -> fmt::Result {
        let pack_type = self.get_pack_type();
        if show_names {
            if let Some(id) = self.get_current_field().and_then(Node::as_field) {
                let field = self.file().field(id);
                if field.as_parameter().is_some() && !field.get_name().is_empty() {
                    write!(out, "{} = ", field.get_name())?;
                }
            }
        }

        match pack_type {
            PackType::Invalid => {
                if self.get_current_field().is_some() {
                    self.unpack_skip();
                }
                out.write_str("<invalid>")
            }
            PackType::Double => write!(out, "{}", self.unpack_double()),
            PackType::Int | PackType::Int64 => write!(out, "{}", self.unpack_int64()),
            PackType::UInt | PackType::UInt64 => write!(out, "{}", self.unpack_uint64()),
            PackType::String => enquote_string(out, '"', &self.unpack_blob()),
            PackType::Blob => write_hex(out, &self.unpack_blob()),
            PackType::Array | PackType::Field | PackType::Switch | PackType::Class => {
                let (open, close) = match pack_type {
                    PackType::Array => ('[', ']'),
                    PackType::Class => ('{', '}'),
                    _ => ('(', ')'),
                };
                out.write_char(open)?;
                self.push();
                while self.more_nested_fields() {
                    self.unpack_and_format_into(out, show_names)?;
                    if self.more_nested_fields() {
                        out.write_str(", ")?;
                    }
                }
                self.pop();
                out.write_char(close)
            }
        }
    }
}

/// Renders a packed value of `root`.
pub fn format_data(
    file: &DcFile,
    root: impl Into<Node>,
    data: &[u8],
    show_names: bool,
) -> SessionResult<String> {
    let mut packer = Packer::new(file);
    packer.set_unpack_data_borrowed(data);
    packer.begin_unpack(root);
    let text = packer.unpack_and_format(show_names);
    packer.end_unpack()?;
    Ok(text)
}

/// Packs `value` as a complete value of `root`.
pub fn pack_to_vec(file: &DcFile, root: impl Into<Node>, value: &DcValue) -> SessionResult<Vec<u8>> {
    let mut packer = Packer::new(file);
    packer.begin_pack(root);
    packer.pack_value(value);
    packer.end_pack()?;
    Ok(packer.take_data())
}

/// Unpacks a complete value of `root`.
pub fn unpack_to_value(file: &DcFile, root: impl Into<Node>, data: &[u8]) -> SessionResult<DcValue> {
    let mut packer = Packer::new(file);
    packer.set_unpack_data_borrowed(data);
    packer.begin_unpack(root);
    let value = packer.unpack_value();
    packer.end_unpack()?;
    Ok(value)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{Parameter, SimpleParameter};
    use crate::range::NumericRange;
    use crate::subatomic::SubatomicType;

    fn simple(ty: SubatomicType) -> Parameter {
        SimpleParameter::new(ty).into()
    }

    #[test]
    fn nesting_and_names() {
        let mut file = DcFile::new();
        let point = file.add_class("Point", true).unwrap();
        for name in ["x", "y"] {
            let f = file.new_parameter_field(name, simple(SubatomicType::Int16));
            file.add_field(point, f).unwrap();
        }
        let name = file.new_parameter_field("name", simple(SubatomicType::String));
        let tags = file
            .array_of(simple(SubatomicType::UInt8), NumericRange::new())
            .unwrap();
        let tags = file.new_parameter_field("tags", tags);
        let ids = file
            .array_of(simple(SubatomicType::UInt16), NumericRange::new())
            .unwrap();
        let ids = file.new_parameter_field("", ids);
        let pos = file.new_parameter_field("pos", Parameter::class(point));
        let mut scaled = SimpleParameter::new(SubatomicType::Int16);
        scaled.set_divisor(10).unwrap();
        let scaled = file.new_parameter_field("h", scaled.into());
        let root = file
            .new_atomic_field("setAll", vec![name, tags, ids, pos, scaled])
            .unwrap();

        let value = DcValue::List(vec![
            "a\"b".into(),
            DcValue::Blob(vec![0xde, 0xad]),
            DcValue::List(vec![DcValue::UInt(1), DcValue::UInt(2)]),
            DcValue::List(vec![DcValue::Int(-1), DcValue::Int(5)]),
            DcValue::Float(1.5),
        ]);
        let bytes = pack_to_vec(&file, root, &value).unwrap();

        assert_eq!(
            format_data(&file, root, &bytes, false).unwrap(),
            r#"("a\"b", <dead>, [1, 2], {-1, 5}, 1.5)"#
        );
        assert_eq!(
            format_data(&file, root, &bytes, true).unwrap(),
            r#"(name = "a\"b", tags = <dead>, [1, 2], pos = {x = -1, y = 5}, h = 1.5)"#
        );
    }

    #[test]
    fn truncated_data_is_reported() {
        let mut file = DcFile::new();
        let n = file.new_parameter_field("n", simple(SubatomicType::UInt32));
        assert!(format_data(&file, n, &[1, 2], false).is_err());
        assert_eq!(format_data(&file, n, &[1, 0, 0, 0], false).unwrap(), "1");
    }
}

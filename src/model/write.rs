//! Rendering of a schema back into DC syntax

use std::fmt::{self, Display, Write};

use crate::model::param::{DcSwitch, ParamType, Parameter};
use crate::model::{DcFile, Declaration, FieldId, FieldKind, Node, SwitchId};
use crate::packer::format::format_data;
use crate::value::write_hex;

fn indent<W: Write>(out: &mut W, level: usize) -> fmt::Result {
    write!(out, "{:level$}", "")
}

enum SwitchItem<'s> {
    Case(&'s [u8]),
    Default,
    Body(usize),
}

fn write_suffix<W: Write>(out: &mut W, name: &str, postname: &str) -> fmt::Result {
    if !name.is_empty() || !postname.is_empty() {
        write!(out, " {name}{postname}")?;
    }
    Ok(())
}

impl DcFile {
    /// Writes the whole schema in DC syntax.
    ///
    /// With `brief`, default values, argument names and index comments are
    /// left out.
    pub fn write<W: Write>(&self, out: &mut W, brief: bool) -> fmt::Result {
        if !self.imports().is_empty() {
            for import in self.imports() {
                if import.symbols.is_empty() {
                    writeln!(out, "import {}", import.module)?;
                } else {
                    writeln!(out, "from {} import {}", import.module, import.symbols.join(", "))?;
                }
            }
            writeln!(out)?;
        }

        let mut custom = (0..self.get_num_keywords())
            .filter_map(|n| self.get_keyword(n))
            .filter(|k| k.historical_flag().is_none())
            .peekable();
        if custom.peek().is_some() {
            for keyword in custom {
                writeln!(out, "keyword {};", keyword.name())?;
            }
            writeln!(out)?;
        }

        for decl in self.declarations() {
            match *decl {
                Declaration::Class(id) => self.write_class(out, id, brief)?,
                Declaration::Switch(id) => self.write_switch(out, id, brief, 0, "")?,
                Declaration::Typedef(id) => {
                    let typedef = self.typedef(id);
                    out.write_str("typedef ")?;
                    self.write_param(out, typedef.parameter(), brief, typedef.get_name(), "")?;
                    out.write_char(';')?;
                    if !brief {
                        write!(out, "  // typedef {}", typedef.get_number())?;
                    }
                    writeln!(out)?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn write_class<W: Write>(&self, out: &mut W, id: crate::model::ClassId, brief: bool) -> fmt::Result {
        let class = self.class(id);
        out.write_str(if class.is_struct() { "struct" } else { "dclass" })?;
        if !class.get_name().is_empty() {
            write!(out, " {}", class.get_name())?;
        }
        for (i, &parent) in class.parents().iter().enumerate() {
            out.write_str(if i == 0 { " : " } else { ", " })?;
            out.write_str(self.class(parent).get_name())?;
        }
        out.write_str(" {")?;
        if let (false, Some(n)) = (brief, class.get_number()) {
            write!(out, "  // index {n}")?;
        }
        writeln!(out)?;
        if let Some(ctor) = class.get_constructor() {
            self.write_field(out, ctor, brief, 2)?;
        }
        for &field in class.fields() {
            self.write_field(out, field, brief, 2)?;
        }
        writeln!(out, "}};")
    }

    fn write_field<W: Write>(&self, out: &mut W, id: FieldId, brief: bool, level: usize) -> fmt::Result {
        let field = self.field(id);
        indent(out, level)?;
        match field.kind() {
            FieldKind::Parameter(param) => {
                self.write_param(out, param, brief, field.get_name(), "")?;
                if !brief {
                    self.write_default(out, id)?;
                }
                field.keywords().output(out)?;
            }
            FieldKind::Atomic(atomic) => {
                write!(out, "{}(", field.get_name())?;
                for (i, &element) in atomic.elements().iter().enumerate() {
                    if i != 0 {
                        out.write_str(", ")?;
                    }
                    self.output_element(out, element, brief)?;
                }
                out.write_char(')')?;
                field.keywords().output(out)?;
            }
            FieldKind::Molecular(molecular) => {
                out.write_str(field.get_name())?;
                for (i, &atomic) in molecular.atomics().iter().enumerate() {
                    out.write_str(if i == 0 { " : " } else { ", " })?;
                    out.write_str(self.field(atomic).get_name())?;
                }
            }
        }
        out.write_char(';')?;
        if let (false, Some(n)) = (brief, field.get_number()) {
            write!(out, "  // field {n}")?;
        }
        writeln!(out)
    }

    /// A parameter as it appears inside an argument list or a one-line switch
    fn output_element<W: Write>(&self, out: &mut W, id: FieldId, brief: bool) -> fmt::Result {
        let field = self.field(id);
        let Some(param) = field.as_parameter() else {
            return out.write_str(field.get_name());
        };
        let name = if brief { "" } else { field.get_name() };
        self.write_param(out, param, brief, name, "")?;
        if !brief {
            self.write_default(out, id)?;
        }
        Ok(())
    }

    fn write_default<W: Write>(&self, out: &mut W, id: FieldId) -> fmt::Result {
        let Some(bytes) = self.field(id).get_default_value() else {
            return Ok(());
        };
        out.write_str(" = ")?;
        match format_data(self, Node::Field(id), bytes, false) {
            Ok(text) => out.write_str(&text),
            Err(err) => {
                log::warn!("cannot format default of `{}`: {err}", self.field(id).get_name());
                write_hex(out, bytes)
            }
        }
    }

    /// Writes the type of `param` followed by `name` and `postname`.
    fn write_param<W: Write>(
        &self,
        out: &mut W,
        param: &Parameter,
        brief: bool,
        name: &str,
        postname: &str,
    ) -> fmt::Result {
        if let Some(typedef) = param.typedef() {
            out.write_str(self.typedef(typedef).get_name())?;
            return write_suffix(out, name, postname);
        }
        match param.ty() {
            ParamType::Simple(simple) => {
                simple.output_type(out)?;
                write_suffix(out, name, postname)
            }
            ParamType::Array(array) => {
                let mut post = format!("{postname}[");
                array.size_range().output(&mut post, 1)?;
                post.push(']');
                match self.field(array.element()).as_parameter() {
                    Some(element) => self.write_param(out, element, brief, name, &post),
                    None => write_suffix(out, name, &post),
                }
            }
            ParamType::Class(class) => {
                out.write_str(self.class(*class).get_name())?;
                write_suffix(out, name, postname)
            }
            ParamType::Switch(switch) => {
                let sw = self.switch(*switch);
                if sw.name().is_empty() {
                    self.output_switch(out, sw, brief)?;
                } else {
                    out.write_str(sw.name())?;
                }
                write_suffix(out, name, postname)
            }
        }
    }

    fn write_case_label<W: Write>(&self, out: &mut W, sw: &DcSwitch, value: &[u8]) -> fmt::Result {
        match format_data(self, Node::Field(sw.key()), value, false) {
            Ok(text) => out.write_str(&text),
            Err(_) => write_hex(out, value),
        }
    }

    /// Walks a switch body: each case label, and after the last label of a
    /// group all of the group's fields followed by `break`.
    fn for_each_item<F>(&self, sw: &DcSwitch, mut f: F) -> fmt::Result
    where
        F: FnMut(SwitchItem<'_>) -> fmt::Result,
    {
        let mut last = None;
        for case in sw.cases() {
            if let Some(group) = last.filter(|&g| g != case.group()) {
                f(SwitchItem::Body(group))?;
            }
            last = Some(case.group());
            f(SwitchItem::Case(case.value()))?;
        }
        if let Some(default) = sw.default_group() {
            if let Some(group) = last.filter(|&g| g != default) {
                f(SwitchItem::Body(group))?;
            }
            last = Some(default);
            f(SwitchItem::Default)?;
        }
        match last {
            Some(group) => f(SwitchItem::Body(group)),
            None => Ok(()),
        }
    }

    fn write_switch<W: Write>(
        &self,
        out: &mut W,
        id: SwitchId,
        brief: bool,
        level: usize,
        name: &str,
    ) -> fmt::Result {
        let sw = self.switch(id);
        indent(out, level)?;
        out.write_str("switch")?;
        if !sw.name().is_empty() {
            write!(out, " {}", sw.name())?;
        }
        out.write_str(" (")?;
        self.output_element(out, sw.key(), brief)?;
        writeln!(out, ") {{")?;
        self.for_each_item(sw, |item| match item {
            SwitchItem::Case(value) => {
                indent(out, level)?;
                out.write_str("case ")?;
                self.write_case_label(out, sw, value)?;
                writeln!(out, ":")
            }
            SwitchItem::Default => {
                indent(out, level)?;
                writeln!(out, "default:")
            }
            SwitchItem::Body(group) => {
                for &field in sw.group(group).map_or(&[][..], |g| g.fields()) {
                    self.write_field(out, field, brief, level + 2)?;
                }
                indent(out, level + 2)?;
                writeln!(out, "break;")
            }
        })?;
        indent(out, level)?;
        out.write_char('}')?;
        write_suffix(out, name, "")?;
        writeln!(out, ";")
    }

    /// One-line form used for anonymous switches inside a parameter
    fn output_switch<W: Write>(&self, out: &mut W, sw: &DcSwitch, brief: bool) -> fmt::Result {
        out.write_str("switch (")?;
        self.output_element(out, sw.key(), brief)?;
        out.write_str(") {")?;
        self.for_each_item(sw, |item| match item {
            SwitchItem::Case(value) => {
                out.write_str(" case ")?;
                self.write_case_label(out, sw, value)?;
                out.write_char(':')
            }
            SwitchItem::Default => out.write_str(" default:"),
            SwitchItem::Body(group) => {
                for &field in sw.group(group).map_or(&[][..], |g| g.fields()) {
                    out.write_char(' ')?;
                    self.output_element(out, field, brief)?;
                    out.write_char(';')?;
                }
                out.write_str(" break;")
            }
        })?;
        out.write_str(" }")
    }

    /// Renders the schema to a string.
    #[must_use]
    pub fn to_dc_string(&self, brief: bool) -> String {
        let mut s = String::new();
        // Writing to a String cannot fail.
        let _ = self.write(&mut s, brief);
        s
    }
}

impl Display for DcFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, false)
    }
}

#[cfg(test)]
mod test {
    use crate::model::{DcFile, Parameter, SimpleParameter};
    use crate::range::NumericRange;
    use crate::subatomic::SubatomicType;

    fn simple(ty: SubatomicType) -> Parameter {
        SimpleParameter::new(ty).into()
    }

    fn sample() -> DcFile {
        let mut file = DcFile::new();
        file.add_import_module("game");
        file.add_import_symbol("Avatar");
        file.add_import_symbol("Toon");
        file.add_import_module("math");
        file.add_keyword("editor");

        let byte = file.add_typedef("byte", simple(SubatomicType::UInt8)).unwrap();

        let point = file.add_class("Point", true).unwrap();
        for name in ["x", "y"] {
            let f = file.new_parameter_field(name, simple(SubatomicType::Int16));
            file.add_field(point, f).unwrap();
        }

        let avatar = file.add_class("Avatar", false).unwrap();
        let id = file.new_parameter_field("id", simple(SubatomicType::UInt32));
        let ctor = file.new_atomic_field("Avatar", vec![id]).unwrap();
        file.add_field(avatar, ctor).unwrap();

        let name = file.new_parameter_field("name", simple(SubatomicType::String));
        file.set_default_value(name, vec![3, 0, b'b', b'o', b'b']).unwrap();
        let set_name = file.new_atomic_field("setName", vec![name]).unwrap();
        file.add_field_keyword(set_name, "broadcast").unwrap();
        file.add_field_keyword(set_name, "ram").unwrap();
        file.add_field(avatar, set_name).unwrap();

        let p = file.new_parameter_field("p", Parameter::class(point));
        let set_pos = file.new_atomic_field("setPos", vec![p]).unwrap();
        file.add_field_keyword(set_pos, "ram").unwrap();
        file.add_field(avatar, set_pos).unwrap();

        let both = file.new_molecular_field("setNamePos", vec![set_name, set_pos]).unwrap();
        file.add_field(avatar, both).unwrap();

        let level = file.new_parameter_field("level", file.typedef_parameter(byte));
        file.set_default_value(level, vec![3]).unwrap();
        file.add_field_keyword(level, "db").unwrap();
        file.add_field(avatar, level).unwrap();

        let sw = file.add_switch("Shape", simple(SubatomicType::UInt8)).unwrap();
        file.add_case(sw, vec![0]).unwrap();
        file.add_case(sw, vec![1]).unwrap();
        let radius = file.new_parameter_field("radius", simple(SubatomicType::Float64));
        file.add_switch_field(sw, radius).unwrap();
        file.add_break(sw).unwrap();
        file.add_default(sw).unwrap();
        let w = file.new_parameter_field("w", simple(SubatomicType::Int32));
        file.add_switch_field(sw, w).unwrap();
        file.add_break(sw).unwrap();
        file
    }

    #[test]
    fn full_output() {
        let expected = "\
from game import Avatar, Toon
import math

keyword editor;

typedef uint8 byte;  // typedef 0

struct Point {
  int16 x;
  int16 y;
};

dclass Avatar {  // index 1
  Avatar(uint32 id);
  setName(string name = \"bob\") broadcast ram;  // field 0
  setPos(Point p) ram;  // field 1
  setNamePos : setName, setPos;  // field 2
  byte level = 3 db;  // field 3
};

switch Shape (uint8) {
case 0:
case 1:
  float64 radius;
  break;
default:
  int32 w;
  break;
};

";
        assert_eq!(sample().to_dc_string(false), expected);
    }

    #[test]
    fn brief_output() {
        let text = sample().to_dc_string(true);
        assert!(text.contains("dclass Avatar {\n  Avatar(uint32);\n"));
        assert!(text.contains("  setName(string) broadcast ram;\n"));
        assert!(text.contains("  byte level db;\n"));
        assert!(text.contains("typedef uint8 byte;\n"));
        assert!(!text.contains("//"));
    }

    #[test]
    fn arrays_and_inline_switches() {
        let mut file = DcFile::new();
        let c = file.add_class("C", false).unwrap();
        let arr = file
            .array_of(simple(SubatomicType::Int8), NumericRange::single(2, 4).unwrap())
            .unwrap();
        let f = file.new_parameter_field("xs", arr);
        file.add_field(c, f).unwrap();

        let sw = file.add_switch("", simple(SubatomicType::UInt8)).unwrap();
        file.add_case(sw, vec![7]).unwrap();
        let v = file.new_parameter_field("v", simple(SubatomicType::UInt16));
        file.add_switch_field(sw, v).unwrap();
        file.add_break(sw).unwrap();
        let g = file.new_parameter_field("u", Parameter::switch(sw));
        file.add_field(c, g).unwrap();

        let text = file.to_dc_string(false);
        assert!(text.contains("  int8 xs[2-4];  // field 0\n"), "{text}");
        assert!(
            text.contains("  switch (uint8) { case 7: uint16 v; break; } u;  // field 1\n"),
            "{text}"
        );
    }
}

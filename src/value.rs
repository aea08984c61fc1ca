//! Typed values moved in and out of the packer
//!
//! [`DcValue`] is the dynamic counterpart of a schema type: the packer can
//! pack one against the current field with
//! [`Packer::pack_value`](crate::Packer::pack_value) and reconstruct one with
//! [`Packer::unpack_value`](crate::Packer::unpack_value). Aggregates (arrays,
//! structs, atomic fields, switches) are all represented by
//! [`DcValue::List`], in wire order.
//!
//! The helpers [`enquote_string`] and [`write_hex`] implement the literal
//! syntax shared by the formatter and the schema writer.

use std::fmt::{self, Display, Formatter, Write};

/// A dynamically-typed value of some schema type.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum DcValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Blob(Vec<u8>),
    List(Vec<DcValue>),
}

impl DcValue {
    /// Returns the value as a signed integer, if it is numeric and in range.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            DcValue::Int(i) => Some(i),
            DcValue::UInt(u) => i64::try_from(u).ok(),
            DcValue::Float(f) if f.fract() == 0.0 => Some(f as i64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            DcValue::Int(i) => Some(i as f64),
            DcValue::UInt(u) => Some(u as f64),
            DcValue::Float(f) => Some(f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DcValue::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[DcValue]> {
        match self {
            DcValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<i64> for DcValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for DcValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<u64> for DcValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<u32> for DcValue {
    fn from(v: u32) -> Self {
        Self::UInt(v.into())
    }
}

impl From<f64> for DcValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for DcValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for DcValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<u8>> for DcValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

impl From<Vec<DcValue>> for DcValue {
    fn from(v: Vec<DcValue>) -> Self {
        Self::List(v)
    }
}

impl Display for DcValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DcValue::Int(i) => write!(f, "{i}"),
            DcValue::UInt(u) => write!(f, "{u}"),
            DcValue::Float(x) => write!(f, "{x}"),
            DcValue::Str(s) => enquote_string(f, '"', s.as_bytes()),
            DcValue::Blob(b) => write_hex(f, b),
            DcValue::List(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_char(']')
            }
        }
    }
}

/// Writes `bytes` between `quote` characters, escaping the quote character,
/// backslashes and non-printable bytes (as `\xNN`).
pub fn enquote_string<W: Write>(out: &mut W, quote: char, bytes: &[u8]) -> fmt::Result {
    out.write_char(quote)?;
    for &b in bytes {
        let c = b as char;
        if c == '\\' || c == quote {
            out.write_char('\\')?;
            out.write_char(c)?;
        } else if !(0x20..0x7f).contains(&b) {
            write!(out, "\\x{:02x}", b)?;
        } else {
            out.write_char(c)?;
        }
    }
    out.write_char(quote)
}

/// Writes `bytes` as a `<hex>` literal
pub fn write_hex<W: Write>(out: &mut W, bytes: &[u8]) -> fmt::Result {
    out.write_char('<')?;
    for b in bytes {
        write!(out, "{:02x}", b)?;
    }
    out.write_char('>')
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quoting() {
        let mut s = String::new();
        enquote_string(&mut s, '"', b"a\"b\\c\n").unwrap();
        assert_eq!(s, r#""a\"b\\c\x0a""#);
    }

    #[test]
    fn display_nested() {
        let v = DcValue::List(vec![
            DcValue::Int(-3),
            DcValue::from("hi"),
            DcValue::Blob(vec![0xde, 0xad]),
            DcValue::List(vec![DcValue::Float(1.5)]),
        ]);
        assert_eq!(v.to_string(), r#"[-3, "hi", <dead>, [1.5]]"#);
    }

    #[test]
    fn numeric_views() {
        assert_eq!(DcValue::UInt(7).as_i64(), Some(7));
        assert_eq!(DcValue::UInt(u64::MAX).as_i64(), None);
        assert_eq!(DcValue::Float(2.0).as_i64(), Some(2));
        assert_eq!(DcValue::Float(2.5).as_i64(), None);
        assert_eq!(DcValue::Int(2).as_f64(), Some(2.0));
    }
}

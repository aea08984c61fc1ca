//! Parameters of a single subatomic type
//!
//! A `SimpleParameter` wraps one [`SubatomicType`] together with the
//! decorations the schema language allows on it:
//!
//! * a *divisor* `d`, a fixed-point scale: the stored value is
//!   `round(value * d)` and the value read back is `stored / d`. Any divisor
//!   other than 1 turns an integer parameter into a [`PackType::Double`].
//! * a *modulus* `m`: stored values are wrapped into `[0, m)` before range
//!   checking, with negative values folded as `m - 1 - ((-v - 1) % m)`.
//! * a *range*, checked against the stored (scaled) value. For `string`,
//!   `blob` and the built-in arrays the range constrains the length or
//!   element count instead, and a single-valued range on a `string` or `blob`
//!   removes its length prefix. `blob32` always keeps its 4-byte prefix.

use std::fmt::{self, Write};

use crate::error::{BoundsError, LengthError, SchemaError, SchemaResult, WidthError};
use crate::hash::HashGenerator;
use crate::model::FieldId;
use crate::packer::error::{ErrorFlags, PackerError};
use crate::range::NumericRange;
use crate::subatomic::{PackType, SubatomicType};
use crate::value::DcValue;
use crate::wire::{PackData, Reader, Target};

/// A numeric value handed to the packer, before scaling
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    UInt(u64),
    Float(f64),
}

/// A numeric value as it sits on the wire, after scaling
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Stored {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

/// A parameter of one subatomic type, with optional divisor, modulus and range
#[derive(Clone, Debug, PartialEq)]
pub struct SimpleParameter {
    ty: SubatomicType,
    divisor: u32,
    modulus: Option<f64>,
    orig_range: NumericRange<f64>,
    pack_type: PackType,
    nested: Option<FieldId>,
    num_length_bytes: usize,
    fixed_byte_size: Option<usize>,
    int_range: NumericRange<i64>,
    uint_range: NumericRange<u64>,
    double_range: NumericRange<f64>,
    int_modulus: u64,
    double_modulus: f64,
}

fn round_half_up(x: f64) -> i128 {
    (x + 0.5).floor() as i128
}

fn fits_signed(v: i128, bits: u32) -> bool {
    let lim = 1i128 << (bits - 1);
    v >= -lim && v < lim
}

fn fits_unsigned(v: i128, bits: u32) -> bool {
    v >= 0 && v < (1i128 << bits)
}

impl SimpleParameter {
    /// Creates an undecorated parameter of type `ty`.
    ///
    /// Parameters with nested element fields only become usable once they
    /// have been added to a [`DcFile`](crate::DcFile), which attaches the
    /// shared element field.
    #[must_use]
    pub fn new(ty: SubatomicType) -> Self {
        let num_length_bytes = match ty {
            SubatomicType::Blob32 => 4,
            ty if ty.has_nested_fields() => 2,
            _ => 0,
        };
        Self {
            ty,
            divisor: 1,
            modulus: None,
            orig_range: NumericRange::new(),
            pack_type: ty.base_pack_type(),
            nested: None,
            num_length_bytes,
            fixed_byte_size: ty.scalar_width(),
            int_range: NumericRange::new(),
            uint_range: NumericRange::new(),
            double_range: NumericRange::new(),
            int_modulus: 0,
            double_modulus: 0.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn subatomic_type(&self) -> SubatomicType {
        self.ty
    }

    #[inline]
    #[must_use]
    pub fn divisor(&self) -> u32 {
        self.divisor
    }

    #[inline]
    #[must_use]
    pub fn modulus(&self) -> Option<f64> {
        self.modulus
    }

    /// Range as declared, before divisor scaling
    #[must_use]
    pub fn range(&self) -> &NumericRange<f64> {
        &self.orig_range
    }

    #[must_use]
    pub fn pack_type(&self) -> PackType {
        self.pack_type
    }

    /// Returns `true` unless this is a `char`, `string` or `blob` type.
    #[must_use]
    pub fn is_numeric_type(&self) -> bool {
        !self.ty.base_pack_type().is_byte_string()
    }

    #[must_use]
    pub fn has_range_limits(&self) -> bool {
        !self.orig_range.is_empty()
    }

    #[must_use]
    pub fn nested_field(&self) -> Option<FieldId> {
        self.nested
    }

    pub(crate) fn set_nested_field(&mut self, field: FieldId) {
        self.nested = Some(field);
    }

    #[must_use]
    pub fn num_length_bytes(&self) -> usize {
        self.num_length_bytes
    }

    #[must_use]
    pub fn fixed_byte_size(&self) -> Option<usize> {
        self.fixed_byte_size
    }

    #[must_use]
    pub fn bytes_per_element(&self) -> usize {
        self.ty.bytes_per_element()
    }

    /// Sets the fixed-point scale of the parameter.
    ///
    /// Fails for `char`/`string`/`blob` types and for a zero divisor. Any
    /// range or modulus already declared is rescaled.
    pub fn set_divisor(&mut self, divisor: u32) -> SchemaResult<()> {
        if !self.is_numeric_type() || divisor == 0 {
            return Err(SchemaError::InvalidDivisor {
                ty: self.ty.name(),
                divisor,
            });
        }
        let mut next = self.clone();
        next.divisor = divisor;
        next.pack_type = match self.ty.base_pack_type() {
            PackType::Int | PackType::Int64 | PackType::UInt | PackType::UInt64 if divisor != 1 => {
                PackType::Double
            }
            base => base,
        };
        if next.has_range_limits() {
            let range = next.orig_range.clone();
            next.set_range(range)?;
        }
        if let Some(m) = next.modulus {
            next.set_modulus(m)?;
        }
        *self = next;
        Ok(())
    }

    /// Declares a modulus: packed values are wrapped into `[0, modulus)`.
    pub fn set_modulus(&mut self, modulus: f64) -> SchemaResult<()> {
        let invalid = SchemaError::InvalidModulus {
            ty: self.ty.name(),
            modulus,
        };
        if !self.is_numeric_type() || !(modulus > 0.0) {
            return Err(invalid);
        }
        let double_modulus = modulus * self.divisor as f64;
        let int_modulus = round_half_up(double_modulus);
        match self.ty.modulus_bits() {
            None => return Err(invalid),
            Some(Some(bits)) if !fits_unsigned(int_modulus - 1, bits) => return Err(invalid),
            Some(_) if int_modulus < 1 && self.ty != SubatomicType::Float64 => return Err(invalid),
            Some(_) => {}
        }
        self.modulus = Some(modulus);
        self.double_modulus = double_modulus;
        self.int_modulus = int_modulus.clamp(0, u64::MAX as i128) as u64;
        Ok(())
    }

    /// Declares the legal values (or, for strings, blobs and built-in
    /// arrays, the legal lengths) of the parameter.
    pub fn set_range(&mut self, range: NumericRange<f64>) -> SchemaResult<()> {
        let ty = self.ty;
        let divisor = self.divisor as f64;
        let invalid = |min: f64, max: f64| SchemaError::InvalidRange {
            ty: ty.name(),
            min,
            max,
        };
        let mut int_range = NumericRange::new();
        let mut uint_range = NumericRange::new();
        let mut double_range = NumericRange::new();
        let mut num_length_bytes = self.num_length_bytes;
        let mut fixed_byte_size = self.fixed_byte_size;

        for r in range.iter() {
            let (lo, hi) = (r.min, r.max);
            match ty {
                SubatomicType::Int8
                | SubatomicType::Int16
                | SubatomicType::Int32
                | SubatomicType::Int64 => {
                    let bits = 8 * ty.scalar_width().unwrap_or(8) as u32;
                    let (min, max) = (round_half_up(lo * divisor), round_half_up(hi * divisor));
                    if !fits_signed(min, bits) || !fits_signed(max, bits) {
                        return Err(invalid(lo, hi));
                    }
                    int_range
                        .add_range(min as i64, max as i64)
                        .map_err(|_| invalid(lo, hi))?;
                }
                SubatomicType::UInt8
                | SubatomicType::UInt16
                | SubatomicType::UInt32
                | SubatomicType::UInt64
                | SubatomicType::Char => {
                    let bits = 8 * ty.scalar_width().unwrap_or(8) as u32;
                    let (min, max) = (round_half_up(lo * divisor), round_half_up(hi * divisor));
                    if !fits_unsigned(min, bits) || !fits_unsigned(max, bits) {
                        return Err(invalid(lo, hi));
                    }
                    uint_range
                        .add_range(min as u64, max as u64)
                        .map_err(|_| invalid(lo, hi))?;
                }
                SubatomicType::Float64 => {
                    double_range
                        .add_range(lo * divisor, hi * divisor)
                        .map_err(|_| invalid(lo, hi))?;
                }
                _ => {
                    // lengths and element counts, never scaled
                    let limit: i128 = match ty {
                        SubatomicType::Blob32 => u32::MAX as i128,
                        _ => 0xffff / ty.bytes_per_element() as i128,
                    };
                    let (min, max) = (round_half_up(lo), round_half_up(hi));
                    if min < 0 || max > limit {
                        return Err(invalid(lo, hi));
                    }
                    uint_range
                        .add_range(min as u64, max as u64)
                        .map_err(|_| invalid(lo, hi))?;
                }
            }
        }

        if matches!(ty, SubatomicType::String | SubatomicType::Blob) {
            match uint_range.one_value() {
                Some(len) => {
                    num_length_bytes = 0;
                    fixed_byte_size = Some(len as usize);
                }
                None => {
                    num_length_bytes = 2;
                    fixed_byte_size = None;
                }
            }
        }

        self.orig_range = range;
        self.int_range = int_range;
        self.uint_range = uint_range;
        self.double_range = double_range;
        self.num_length_bytes = num_length_bytes;
        self.fixed_byte_size = fixed_byte_size;
        Ok(())
    }

    /// Number of elements of a built-in array encoded in `length` bytes
    #[must_use]
    pub fn calc_num_nested_fields(&self, length: usize) -> usize {
        match self.bytes_per_element() {
            0 => 0,
            bpe => length / bpe,
        }
    }

    /// Statically known element count (only for fixed-length strings and blobs)
    #[must_use]
    pub fn num_nested_fields(&self) -> Option<usize> {
        match (self.fixed_byte_size, self.bytes_per_element()) {
            (Some(size), bpe) if bpe != 0 => Some(size / bpe),
            _ => None,
        }
    }

    /// Checks an element count against the declared length range.
    #[must_use]
    pub fn validate_num_nested_fields(&self, n: usize) -> bool {
        !self.ty.has_nested_fields() || self.uint_range.contains(n as u64)
    }

    fn apply_double_modulus(&self, mut real: f64) -> f64 {
        if self.modulus.is_some() && self.double_modulus > 0.0 {
            let m = self.double_modulus;
            if real < 0.0 {
                real = m - (-real) % m;
                if real == m {
                    real = 0.0;
                }
            } else {
                real %= m;
            }
        }
        real
    }

    fn apply_int_modulus(&self, v: i128) -> i128 {
        if self.modulus.is_none() || self.int_modulus == 0 {
            return v;
        }
        let m = self.int_modulus as i128;
        if v < 0 {
            m - 1 - (-v - 1) % m
        } else {
            v % m
        }
    }

    /// Range-checks and writes a scaled integer value, truncating it to the
    /// wire width if it does not fit.
    fn write_stored_int(&self, out: &mut PackData, v: i128, errs: &mut ErrorFlags) {
        if self.ty.is_signed() {
            match i64::try_from(v) {
                Ok(v) => {
                    if let Err(e) = self.int_range.validate(v) {
                        errs.range(PackerError::IntRange(e));
                    }
                }
                Err(_) => errs.range(PackerError::Lossy {
                    operation: "pack",
                    value: v.to_string(),
                }),
            }
        } else if v < 0 {
            errs.range(PackerError::IntRange(BoundsError::Underflow {
                min: 0,
                val: v.clamp(i64::MIN as i128, 0) as i64,
            }));
        } else if let Ok(u) = u64::try_from(v) {
            if let Err(e) = self.uint_range.validate(u) {
                errs.range(PackerError::UIntRange(e));
            }
        }
        if let Some(width) = self.ty.scalar_width() {
            let bits = 8 * width as u32;
            let fits = if self.ty.is_signed() {
                fits_signed(v, bits)
            } else {
                fits_unsigned(v, bits) || v < 0
            };
            if !fits {
                errs.range(PackerError::Width(WidthError::TooWide {
                    limit: width,
                    actual: (128 - v.unsigned_abs().leading_zeros() as usize + 7) / 8,
                }));
            }
        }
        match self.ty {
            SubatomicType::Int8 => out.push_i8(v as i8),
            SubatomicType::Int16 => out.push_i16(v as i16),
            SubatomicType::Int32 => out.push_i32(v as i32),
            SubatomicType::Int64 => out.push_i64(v as i64),
            SubatomicType::UInt8 | SubatomicType::Char => out.push_u8(v as u8),
            SubatomicType::UInt16 => out.push_u16(v as u16),
            SubatomicType::UInt32 => out.push_u32(v as u32),
            SubatomicType::UInt64 => out.push_u64(v as u64),
            _ => 0,
        };
    }

    fn write_stored_double(&self, out: &mut PackData, real: f64, errs: &mut ErrorFlags) {
        if let Err(e) = self.double_range.validate(real) {
            errs.range(PackerError::FloatRange(e));
        }
        out.push_f64(real);
    }

    /// Packs a numeric value, applying divisor, modulus and range checks.
    pub(crate) fn pack_number(&self, out: &mut PackData, value: Number, errs: &mut ErrorFlags) {
        let divisor = self.divisor as f64;
        match self.ty {
            SubatomicType::Float64 => {
                let real = match value {
                    Number::Int(i) => i as f64 * divisor,
                    Number::UInt(u) => u as f64 * divisor,
                    Number::Float(f) => f * divisor,
                };
                let real = self.apply_double_modulus(real);
                self.write_stored_double(out, real, errs);
            }
            ty if ty.scalar_width().is_some() => {
                let stored = match value {
                    Number::Int(i) => self.apply_int_modulus(i as i128 * self.divisor as i128),
                    Number::UInt(u) => self.apply_int_modulus(u as i128 * self.divisor as i128),
                    Number::Float(f) => round_half_up(self.apply_double_modulus(f * divisor)),
                };
                self.write_stored_int(out, stored, errs);
            }
            _ => errs.pack(PackerError::WrongType {
                operation: "pack numeric value",
                pack_type: self.pack_type,
            }),
        }
    }

    /// Packs a string or blob value.
    ///
    /// Single-byte types accept a value of exactly one byte.
    pub(crate) fn pack_bytes(&self, out: &mut PackData, value: &[u8], errs: &mut ErrorFlags) {
        match self.ty {
            SubatomicType::Char | SubatomicType::Int8 | SubatomicType::UInt8 => match value {
                [] => errs.pack(PackerError::Length(LengthError::WrongLength {
                    exact: 1,
                    actual: 0,
                })),
                [b, rest @ ..] => {
                    if !rest.is_empty() {
                        errs.range(PackerError::Length(LengthError::WrongLength {
                            exact: 1,
                            actual: value.len(),
                        }));
                    }
                    if let Err(e) = self.uint_range.validate(*b as u64) {
                        errs.range(PackerError::UIntRange(e));
                    }
                    out.push_u8(*b);
                }
            },
            SubatomicType::String | SubatomicType::Blob | SubatomicType::Blob32 => {
                if !self.uint_range.contains(value.len() as u64) {
                    errs.range(PackerError::Length(LengthError::OutOfRange {
                        actual: value.len(),
                    }));
                }
                match self.num_length_bytes {
                    0 => {}
                    4 => {
                        out.push_u32(value.len() as u32);
                    }
                    _ => {
                        if value.len() > 0xffff {
                            errs.range(PackerError::Width(WidthError::TooWide {
                                limit: 0xffff,
                                actual: value.len(),
                            }));
                        }
                        out.push_u16(value.len() as u16);
                    }
                }
                out.push_all(value);
            }
            _ => errs.pack(PackerError::WrongType {
                operation: "pack string",
                pack_type: self.pack_type,
            }),
        }
    }

    /// Packs the zero value, or the least legal value when zero is out of
    /// range. Strings and built-in arrays get their minimum legal length.
    pub(crate) fn pack_default(&self, out: &mut PackData, errs: &mut ErrorFlags) {
        match self.ty {
            SubatomicType::Float64 => {
                let v = if self.double_range.contains(0.0) {
                    0.0
                } else {
                    self.double_range.min_or(0.0)
                };
                self.write_stored_double(out, v, errs);
            }
            ty if ty.scalar_width().is_some() => {
                let v = if ty.is_signed() {
                    if self.int_range.contains(0) {
                        0
                    } else {
                        self.int_range.min_or(0) as i128
                    }
                } else if self.uint_range.contains(0) {
                    0
                } else {
                    self.uint_range.min_or(0) as i128
                };
                self.write_stored_int(out, v, errs);
            }
            _ => {
                let count = self.uint_range.min_or(0) as usize;
                let bytes = count * self.bytes_per_element();
                match self.num_length_bytes {
                    0 => {}
                    4 => {
                        out.push_u32(bytes as u32);
                    }
                    _ => {
                        out.push_u16(bytes as u16);
                    }
                }
                out.append_junk(bytes);
            }
        }
    }

    /// Reads the raw stored value of a scalar type.
    pub(crate) fn read_stored(&self, r: &mut Reader<'_>) -> Result<Stored, PackerError> {
        let stored = match self.ty {
            SubatomicType::Int8 => Stored::Signed(r.take_i8()?.into()),
            SubatomicType::Int16 => Stored::Signed(r.take_i16()?.into()),
            SubatomicType::Int32 => Stored::Signed(r.take_i32()?.into()),
            SubatomicType::Int64 => Stored::Signed(r.take_i64()?),
            SubatomicType::UInt8 | SubatomicType::Char => Stored::Unsigned(r.take_u8()?.into()),
            SubatomicType::UInt16 => Stored::Unsigned(r.take_u16()?.into()),
            SubatomicType::UInt32 => Stored::Unsigned(r.take_u32()?.into()),
            SubatomicType::UInt64 => Stored::Unsigned(r.take_u64()?),
            SubatomicType::Float64 => Stored::Float(r.take_f64()?),
            _ => {
                return Err(PackerError::WrongType {
                    operation: "unpack numeric value",
                    pack_type: self.pack_type,
                })
            }
        };
        Ok(stored)
    }

    fn validate_stored(&self, stored: Stored, errs: &mut ErrorFlags) {
        let result = match stored {
            Stored::Signed(i) => self.int_range.validate(i).map(drop).map_err(PackerError::IntRange),
            Stored::Unsigned(u) => self
                .uint_range
                .validate(u)
                .map(drop)
                .map_err(PackerError::UIntRange),
            Stored::Float(f) => self
                .double_range
                .validate(f)
                .map(drop)
                .map_err(PackerError::FloatRange),
        };
        if let Err(e) = result {
            errs.range(e);
        }
    }

    /// Reads and range-checks a scalar value, without undoing the divisor.
    pub(crate) fn unpack_stored(&self, r: &mut Reader<'_>, errs: &mut ErrorFlags) -> Option<Stored> {
        match self.read_stored(r) {
            Ok(stored) => {
                self.validate_stored(stored, errs);
                Some(stored)
            }
            Err(e) => {
                errs.pack(e);
                None
            }
        }
    }

    pub(crate) fn unpack_double(&self, r: &mut Reader<'_>, errs: &mut ErrorFlags) -> f64 {
        let raw = match self.unpack_stored(r, errs) {
            Some(Stored::Signed(i)) => i as f64,
            Some(Stored::Unsigned(u)) => u as f64,
            Some(Stored::Float(f)) => f,
            None => return 0.0,
        };
        raw / self.divisor as f64
    }

    pub(crate) fn unpack_int64(&self, r: &mut Reader<'_>, errs: &mut ErrorFlags) -> i64 {
        let divisor = self.divisor as i64;
        match self.unpack_stored(r, errs) {
            Some(Stored::Signed(i)) => i / divisor,
            Some(Stored::Unsigned(u)) => match i64::try_from(u) {
                Ok(i) => i / divisor,
                Err(_) => {
                    errs.pack(PackerError::Lossy {
                        operation: "unpack_int64",
                        value: u.to_string(),
                    });
                    0
                }
            },
            Some(Stored::Float(f)) => {
                let v = f / self.divisor as f64;
                if v >= i64::MIN as f64 && v < i64::MAX as f64 {
                    v as i64
                } else {
                    errs.pack(PackerError::Lossy {
                        operation: "unpack_int64",
                        value: v.to_string(),
                    });
                    0
                }
            }
            None => 0,
        }
    }

    pub(crate) fn unpack_uint64(&self, r: &mut Reader<'_>, errs: &mut ErrorFlags) -> u64 {
        let divisor = self.divisor as u64;
        let lossy = |errs: &mut ErrorFlags, value: String| {
            errs.pack(PackerError::Lossy {
                operation: "unpack_uint64",
                value,
            });
            0u64
        };
        match self.unpack_stored(r, errs) {
            Some(Stored::Signed(i)) => match u64::try_from(i) {
                Ok(u) => u / divisor,
                Err(_) => lossy(errs, i.to_string()),
            },
            Some(Stored::Unsigned(u)) => u / divisor,
            Some(Stored::Float(f)) => {
                let v = f / self.divisor as f64;
                if v >= 0.0 && v < u64::MAX as f64 {
                    v as u64
                } else {
                    lossy(errs, v.to_string())
                }
            }
            None => 0,
        }
    }

    /// Unpacks a string or blob value, or a one-byte string from a
    /// single-byte type.
    pub(crate) fn unpack_bytes(&self, r: &mut Reader<'_>, errs: &mut ErrorFlags) -> Vec<u8> {
        let result = match self.ty {
            SubatomicType::Char | SubatomicType::Int8 | SubatomicType::UInt8 => {
                r.take_u8().map_err(PackerError::from).map(|b| {
                    if let Err(e) = self.uint_range.validate(b.into()) {
                        errs.range(PackerError::UIntRange(e));
                    }
                    vec![b]
                })
            }
            SubatomicType::String | SubatomicType::Blob | SubatomicType::Blob32 => {
                self.read_byte_string(r, errs)
            }
            _ => Err(PackerError::WrongType {
                operation: "unpack string",
                pack_type: self.pack_type,
            }),
        };
        result.unwrap_or_else(|e| {
            errs.pack(e);
            Vec::new()
        })
    }

    fn read_byte_string(
        &self,
        r: &mut Reader<'_>,
        errs: &mut ErrorFlags,
    ) -> Result<Vec<u8>, PackerError> {
        let len = match (self.num_length_bytes, self.fixed_byte_size) {
            (0, Some(size)) => size,
            (width, _) => r.take_length(width)?,
        };
        if !self.uint_range.contains(len as u64) {
            errs.range(PackerError::Length(LengthError::OutOfRange { actual: len }));
        }
        Ok(r.consume(len)?.to_vec())
    }

    /// Reads the value and checks it against the declared range.
    ///
    /// Returns `false` if the parameter does not know how to validate
    /// itself, in which case the packer descends into its elements.
    pub(crate) fn unpack_validate(&self, r: &mut Reader<'_>, errs: &mut ErrorFlags) -> bool {
        if self.ty.scalar_width().is_some() {
            self.unpack_stored(r, errs);
            true
        } else if self.ty.is_byte_string() {
            if let Err(e) = self.read_byte_string(r, errs) {
                errs.pack(e);
            }
            true
        } else {
            false
        }
    }

    /// Decodes a complete wire value of a scalar type, e.g. a switch key.
    pub(crate) fn decode_value(&self, bytes: &[u8]) -> Option<DcValue> {
        let mut r = Reader::new(bytes, 0);
        let divisor = self.divisor;
        let value = match self.ty {
            SubatomicType::Char | SubatomicType::String => {
                let mut scratch = ErrorFlags::default();
                let raw = self.unpack_bytes(&mut r, &mut scratch);
                if scratch.had_pack_error() {
                    return None;
                }
                match String::from_utf8(raw) {
                    Ok(s) => DcValue::Str(s),
                    Err(e) => DcValue::Blob(e.into_bytes()),
                }
            }
            SubatomicType::Blob | SubatomicType::Blob32 => {
                let mut scratch = ErrorFlags::default();
                let raw = self.unpack_bytes(&mut r, &mut scratch);
                if scratch.had_pack_error() {
                    return None;
                }
                DcValue::Blob(raw)
            }
            _ => match self.read_stored(&mut r).ok()? {
                Stored::Float(f) => DcValue::Float(f / divisor as f64),
                Stored::Signed(i) if divisor != 1 => DcValue::Float(i as f64 / divisor as f64),
                Stored::Unsigned(u) if divisor != 1 => DcValue::Float(u as f64 / divisor as f64),
                Stored::Signed(i) => DcValue::Int(i),
                Stored::Unsigned(u) => DcValue::UInt(u),
            },
        };
        (r.remaining() == 0).then_some(value)
    }

    /// Writes the type in schema syntax: `type%modulus/divisor(range)`.
    pub fn output_type<W: Write>(&self, out: &mut W) -> fmt::Result {
        write!(out, "{}", self.ty)?;
        if let Some(m) = self.modulus {
            write!(out, "%{}", m)?;
        }
        if self.divisor != 1 {
            write!(out, "/{}", self.divisor)?;
        }
        if self.has_range_limits() {
            out.write_char('(')?;
            match self.ty {
                SubatomicType::Int8
                | SubatomicType::Int16
                | SubatomicType::Int32
                | SubatomicType::Int64 => self.int_range.output(out, self.divisor)?,
                SubatomicType::Float64 => self.double_range.output(out, self.divisor)?,
                SubatomicType::UInt8
                | SubatomicType::UInt16
                | SubatomicType::UInt32
                | SubatomicType::UInt64
                | SubatomicType::Char => self.uint_range.output(out, self.divisor)?,
                _ => self.uint_range.output(out, 1)?,
            }
            out.write_char(')')?;
        }
        Ok(())
    }

    pub fn generate_hash(&self, hashgen: &mut HashGenerator) {
        hashgen.add_int(self.ty as i64);
        hashgen.add_int(self.divisor.into());
        if self.modulus.is_some() {
            hashgen.add_int(self.double_modulus as i32 as i64);
        }
        self.int_range.generate_hash(hashgen);
        self.uint_range.generate_hash(hashgen);
        self.double_range.generate_hash(hashgen);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn range(min: f64, max: f64) -> NumericRange<f64> {
        NumericRange::single(min, max).unwrap()
    }

    fn packed(param: &SimpleParameter, value: Number) -> (Vec<u8>, ErrorFlags) {
        let mut out = PackData::new();
        let mut errs = ErrorFlags::default();
        param.pack_number(&mut out, value, &mut errs);
        (out.into_vec(), errs)
    }

    #[test]
    fn fixed_widths() {
        for ty in SubatomicType::ALL {
            let p = SimpleParameter::new(ty);
            assert_eq!(p.fixed_byte_size(), ty.scalar_width());
        }
    }

    #[test]
    fn divisor_scales() {
        let mut p = SimpleParameter::new(SubatomicType::Int16);
        p.set_divisor(100).unwrap();
        assert_eq!(p.pack_type(), PackType::Double);
        let (bytes, errs) = packed(&p, Number::Float(1.234));
        assert!(!errs.had_error());
        assert_eq!(bytes, 123i16.to_le_bytes());
        let mut errs = ErrorFlags::default();
        let v = p.unpack_double(&mut Reader::new(&bytes, 0), &mut errs);
        assert!((v - 1.23).abs() < 1e-9);
    }

    #[test]
    fn divisor_rejected_for_strings() {
        assert!(SimpleParameter::new(SubatomicType::String).set_divisor(10).is_err());
        assert!(SimpleParameter::new(SubatomicType::UInt8).set_divisor(0).is_err());
    }

    #[test]
    fn modulus_folds_negative() {
        let mut p = SimpleParameter::new(SubatomicType::UInt16);
        p.set_modulus(360.0).unwrap();
        let (bytes, errs) = packed(&p, Number::Int(-10));
        assert!(!errs.had_error());
        assert_eq!(bytes, 350u16.to_le_bytes());
        let (bytes, _) = packed(&p, Number::Int(725));
        assert_eq!(bytes, 5u16.to_le_bytes());
        let (bytes, _) = packed(&p, Number::Float(-1.0));
        assert_eq!(bytes, 359u16.to_le_bytes());
    }

    #[test]
    fn modulus_limits() {
        assert!(SimpleParameter::new(SubatomicType::UInt8).set_modulus(256.0).is_ok());
        assert!(SimpleParameter::new(SubatomicType::UInt8).set_modulus(257.0).is_err());
        assert!(SimpleParameter::new(SubatomicType::Int8).set_modulus(128.0).is_ok());
        assert!(SimpleParameter::new(SubatomicType::Int8).set_modulus(129.0).is_err());
        assert!(SimpleParameter::new(SubatomicType::Blob).set_modulus(10.0).is_err());
        assert!(SimpleParameter::new(SubatomicType::UInt32).set_modulus(0.0).is_err());
    }

    #[test]
    fn range_violation_still_writes() {
        let mut p = SimpleParameter::new(SubatomicType::Int8);
        p.set_range(range(-10.0, 10.0)).unwrap();
        let (bytes, errs) = packed(&p, Number::Int(11));
        assert_eq!(bytes, vec![11]);
        assert!(errs.had_range_error());
        assert!(!errs.had_pack_error());
    }

    #[test]
    fn width_violation() {
        let p = SimpleParameter::new(SubatomicType::UInt8);
        let (bytes, errs) = packed(&p, Number::Int(300));
        assert_eq!(bytes, vec![44]);
        assert!(errs.had_range_error());
    }

    #[test]
    fn range_rejected_outside_type() {
        let mut p = SimpleParameter::new(SubatomicType::Int8);
        assert!(p.set_range(range(-200.0, 0.0)).is_err());
        assert!(!p.has_range_limits());
    }

    #[test]
    fn fixed_length_string() {
        let mut p = SimpleParameter::new(SubatomicType::String);
        assert_eq!(p.num_length_bytes(), 2);
        assert_eq!(p.fixed_byte_size(), None);
        p.set_range(range(4.0, 4.0)).unwrap();
        assert_eq!(p.num_length_bytes(), 0);
        assert_eq!(p.fixed_byte_size(), Some(4));
        assert_eq!(p.num_nested_fields(), Some(4));

        let mut out = PackData::new();
        let mut errs = ErrorFlags::default();
        p.pack_bytes(&mut out, b"abcd", &mut errs);
        assert_eq!(out.as_slice(), b"abcd");
        assert!(!errs.had_error());
    }

    #[test]
    fn blob32_prefix() {
        let p = SimpleParameter::new(SubatomicType::Blob32);
        let mut out = PackData::new();
        let mut errs = ErrorFlags::default();
        p.pack_bytes(&mut out, &[7, 8], &mut errs);
        assert_eq!(out.as_slice(), &[2, 0, 0, 0, 7, 8]);
        let got = p.unpack_bytes(&mut Reader::new(out.as_slice(), 0), &mut errs);
        assert_eq!(got, vec![7, 8]);
        assert!(!errs.had_error());
    }

    #[test]
    fn single_byte_string() {
        let p = SimpleParameter::new(SubatomicType::Char);
        let mut out = PackData::new();
        let mut errs = ErrorFlags::default();
        p.pack_bytes(&mut out, b"", &mut errs);
        assert!(errs.had_pack_error());
        let mut errs = ErrorFlags::default();
        p.pack_bytes(&mut out, b"xy", &mut errs);
        assert!(errs.had_range_error() && !errs.had_pack_error());
        assert_eq!(out.as_slice(), b"x");
    }

    #[test]
    fn truncated_unpack() {
        let p = SimpleParameter::new(SubatomicType::UInt32);
        let mut errs = ErrorFlags::default();
        let v = p.unpack_uint64(&mut Reader::new(&[1, 2], 0), &mut errs);
        assert_eq!(v, 0);
        assert!(matches!(errs.first(), Some(PackerError::Truncated(_))));
    }

    #[test]
    fn lossy_unpack() {
        let p = SimpleParameter::new(SubatomicType::Int8);
        let mut errs = ErrorFlags::default();
        p.unpack_uint64(&mut Reader::new(&[0xff], 0), &mut errs);
        assert!(errs.had_pack_error());
    }

    #[test]
    fn default_respects_range() {
        let mut p = SimpleParameter::new(SubatomicType::Int32);
        p.set_range(range(5.0, 10.0)).unwrap();
        let mut out = PackData::new();
        let mut errs = ErrorFlags::default();
        p.pack_default(&mut out, &mut errs);
        assert_eq!(out.as_slice(), &5i32.to_le_bytes());

        let mut s = SimpleParameter::new(SubatomicType::UInt16Array);
        s.set_range(range(2.0, 8.0)).unwrap();
        let mut out = PackData::new();
        s.pack_default(&mut out, &mut errs);
        assert_eq!(out.as_slice(), &[4, 0, 0, 0, 0, 0]);
        assert!(!errs.had_error());
    }

    #[test]
    fn output_syntax() {
        let mut p = SimpleParameter::new(SubatomicType::Int16);
        p.set_modulus(360.0).unwrap();
        p.set_divisor(10).unwrap();
        p.set_range(range(-18.0, 18.0)).unwrap();
        let mut s = String::new();
        p.output_type(&mut s).unwrap();
        assert_eq!(s, "int16%360/10(-18-18)");
    }

    #[test]
    fn decode_key() {
        let p = SimpleParameter::new(SubatomicType::UInt8);
        assert_eq!(p.decode_value(&[3]), Some(DcValue::UInt(3)));
        assert_eq!(p.decode_value(&[3, 4]), None);
        let s = SimpleParameter::new(SubatomicType::String);
        assert_eq!(
            s.decode_value(&[2, 0, b'o', b'k']),
            Some(DcValue::Str("ok".into()))
        );
    }
}

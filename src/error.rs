//! General error types
//!
//! This module contains the error types that are shared between the
//! schema model and the packer, as well as [`SchemaError`], the error
//! type returned by every build-time entry point of [`DcFile`](crate::DcFile).
//!
//! Errors raised while packing or unpacking a value are not reported through
//! `Result` at the call site; they are recorded as sticky flags on the
//! [`Packer`](crate::Packer) and surfaced by its `end_*` methods (see
//! [`packer::error`](crate::packer::error)).

use std::error::Error;
use std::fmt::{Debug, Display};

/// A length-prefixed value is too long for its prefix.
#[derive(Clone, PartialEq, PartialOrd, Eq, Ord, Debug)]
pub enum WidthError {
    TooWide { limit: usize, actual: usize },
}

impl Display for WidthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WidthError::TooWide { limit, actual } => {
                write!(f, "{actual} bytes do not fit a prefix of at most {limit}")
            }
        }
    }
}

impl Error for WidthError {}

/// A string, blob or array has a length its declaration does not allow.
#[derive(Clone, PartialEq, PartialOrd, Eq, Ord, Debug)]
pub enum LengthError {
    /// Length outside of the declared size range
    OutOfRange { actual: usize },
    /// Length differs from the single declared size
    WrongLength { exact: usize, actual: usize },
}

impl Display for LengthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LengthError::OutOfRange { actual } => {
                write!(f, "length {actual} outside of declared size range")
            }
            LengthError::WrongLength { exact, actual } => {
                write!(f, "length {actual} where exactly {exact} is declared")
            }
        }
    }
}

impl Error for LengthError {}

/// A value rejected by a [`NumericRange`](crate::NumericRange), or a
/// malformed interval.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BoundsError<Ext: Debug> {
    Underflow { min: Ext, val: Ext },
    Overflow { max: Ext, val: Ext },
    InvalidBounds { min: Ext, max: Ext },
    /// Between two intervals of a multi-interval range
    Excluded { val: Ext },
}

impl<Ext: Debug + Display> Display for BoundsError<Ext> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundsError::Underflow { min, val } => {
                write!(f, "value {val} below declared minimum {min}")
            }
            BoundsError::Overflow { max, val } => {
                write!(f, "value {val} above declared maximum {max}")
            }
            BoundsError::InvalidBounds { min, max } => {
                write!(f, "interval {min}-{max} is reversed")
            }
            BoundsError::Excluded { val } => {
                write!(f, "value {val} falls outside every declared interval")
            }
        }
    }
}

impl<Ext: Display + Debug> Error for BoundsError<Ext> {}

/// Enumeration over all failures that can be reported while the schema
/// model is being populated.
///
/// A grammar front end is expected to map these onto its own `parse_error`
/// diagnostics; the model itself is left unchanged whenever one is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A class, typedef, switch or keyword of this name is already declared
    DuplicateName { scope: &'static str, name: String },
    /// A field of this name is already declared in the class or switch
    DuplicateField { owner: String, name: String },
    /// A class may have at most one constructor
    DuplicateConstructor { class: String },
    /// Constructors must be atomic fields
    ConstructorNotAtomic { class: String },
    /// Switch case value already registered
    DuplicateCase { switch: String, value: Vec<u8> },
    /// Switch already has a default case
    DuplicateDefault { switch: String },
    /// `add_field` or `add_break` on a switch with no open case
    NoOpenCase { switch: String },
    /// Divisor is zero, or applied to a type without numeric value
    InvalidDivisor { ty: &'static str, divisor: u32 },
    /// Modulus is non-positive, too wide, or applied to a non-numeric type
    InvalidModulus { ty: &'static str, modulus: f64 },
    /// A declared range bound does not fit the type, or the intervals overlap
    InvalidRange { ty: &'static str, min: f64, max: f64 },
    /// Array size range is invalid
    InvalidArraySize(BoundsError<u64>),
    /// Molecular fields may only aggregate atomic fields
    NotAtomic { field: String },
    /// The field is a parameter-only construct used in the wrong place
    NotAParameter { field: String },
    /// The field was already placed into a class, switch or atomic field
    AlreadyOwned { field: String },
    /// A class referenced by name has not been declared
    UnknownClass(String),
    /// Second parent declared while multiple inheritance is disabled
    MultipleInheritance { class: String },
    /// The new parent already inherits from the class
    InheritanceCycle { class: String, parent: String },
    /// The field's type would contain a value of the declaration it is
    /// being added to
    RecursiveType { owner: String, field: String },
    /// A keyword referenced by name has not been declared
    UnknownKeyword(String),
    /// Default value bytes do not form exactly one value of the field's type
    InvalidDefault { field: String },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::DuplicateName { scope, name } => {
                write!(f, "{scope} `{name}` is already declared")
            }
            SchemaError::DuplicateField { owner, name } => {
                write!(f, "duplicate field name `{name}` in `{owner}`")
            }
            SchemaError::DuplicateConstructor { class } => {
                write!(f, "class `{class}` already has a constructor")
            }
            SchemaError::ConstructorNotAtomic { class } => {
                write!(f, "constructor of `{class}` must be an atomic field")
            }
            SchemaError::DuplicateCase { switch, value } => {
                write!(f, "duplicate case value {value:?} in switch `{switch}`")
            }
            SchemaError::DuplicateDefault { switch } => {
                write!(f, "switch `{switch}` already has a default case")
            }
            SchemaError::NoOpenCase { switch } => {
                write!(f, "switch `{switch}` has no open case")
            }
            SchemaError::InvalidDivisor { ty, divisor } => {
                write!(f, "invalid divisor {divisor} for type {ty}")
            }
            SchemaError::InvalidModulus { ty, modulus } => {
                write!(f, "invalid modulus {modulus} for type {ty}")
            }
            SchemaError::InvalidRange { ty, min, max } => {
                write!(f, "invalid range ({min}-{max}) for type {ty}")
            }
            SchemaError::InvalidArraySize(err) => {
                write!(f, "invalid array size: {err}")
            }
            SchemaError::NotAtomic { field } => {
                write!(f, "`{field}` is not an atomic field")
            }
            SchemaError::NotAParameter { field } => {
                write!(f, "`{field}` is not a parameter")
            }
            SchemaError::AlreadyOwned { field } => {
                write!(f, "field `{field}` already belongs to another declaration")
            }
            SchemaError::UnknownClass(name) => write!(f, "no class named `{name}`"),
            SchemaError::MultipleInheritance { class } => {
                write!(f, "`{class}` cannot have more than one parent without multiple inheritance")
            }
            SchemaError::InheritanceCycle { class, parent } => {
                write!(f, "`{parent}` cannot be a parent of `{class}`: it inherits from it")
            }
            SchemaError::RecursiveType { owner, field } => {
                write!(f, "`{field}` would make `{owner}` contain itself")
            }
            SchemaError::UnknownKeyword(name) => write!(f, "no keyword named `{name}`"),
            SchemaError::InvalidDefault { field } => {
                write!(f, "default value does not match the type of `{field}`")
            }
        }
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SchemaError::InvalidArraySize(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BoundsError<u64>> for SchemaError {
    fn from(err: BoundsError<u64>) -> Self {
        Self::InvalidArraySize(err)
    }
}

/// Type alias for Result with an error type of [`SchemaError`]
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

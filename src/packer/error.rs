//! Sticky error flags of a packing session
//!
//! The packer never aborts an operation midway through the type tree.
//! Instead every failure raises one of three flags, which stay raised until
//! the next `begin_*` (or [`Packer::clear`](super::Packer::clear)):
//!
//! * `parse_error`: malformed value text handed to the packer.
//! * `pack_error`: structural or API misuse, including truncated input.
//! * `range_error`: well-typed data outside of its declared constraints.
//!
//! The first [`PackerError`] recorded in a session is kept alongside the flags
//! so that `end_*` can report what went wrong.

use std::error::Error;
use std::fmt::{Display, Formatter, Result};

use super::Mode;
use crate::error::{BoundsError, LengthError, WidthError};
use crate::subatomic::PackType;
use crate::value::DcValue;
use crate::wire::ReadError;

/// Cause of a raised error flag
#[derive(Debug, Clone, PartialEq)]
pub enum PackerError {
    /// Operation not permitted in the current mode
    WrongMode { operation: &'static str, mode: Mode },
    /// No field is expected at this point of the traversal
    NoCurrentField { operation: &'static str },
    /// `push` on a field without nested fields
    NotNested,
    /// Value accessor not supported by the current field
    WrongType {
        operation: &'static str,
        pack_type: PackType,
    },
    /// Read past the end of the unpack buffer
    Truncated(ReadError),
    /// `pop` without a matching `push`
    UnbalancedPop,
    /// `pop` before every nested field was packed or unpacked
    UnfinishedFields,
    /// `pop` after unpacking fewer bytes than the length prefix announced
    ResidualBytes { residual: usize },
    /// Number of nested fields rejected by the container
    NestedCount { actual: usize },
    /// `end_*` while a traversal is still open
    Unfinished,
    /// Bytes left over after the root field was unpacked
    TrailingBytes { residual: usize },
    /// `seek` without a root, or with a target the catalog does not know
    UnknownSeekTarget(String),
    /// The target exists in the catalog but not in this particular buffer
    AbsentSeekTarget(String),
    /// `seek` into the fields of a switch while repacking
    SeekIntoSwitch(String),
    /// The live catalog could not be built over the unpack buffer
    CatalogFailed,
    /// Switch key value with no registered case and no default
    UnmatchedSwitchKey { switch: String, key: Option<DcValue> },
    /// Unpacked value does not fit the requested Rust type
    Lossy {
        operation: &'static str,
        value: String,
    },
    /// Unpacked string is not valid UTF-8
    InvalidUtf8,
    IntRange(BoundsError<i64>),
    UIntRange(BoundsError<u64>),
    FloatRange(BoundsError<f64>),
    Length(LengthError),
    Width(WidthError),
}

impl Display for PackerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            PackerError::WrongMode { operation, mode } => {
                write!(f, "{operation} is not permitted in {mode:?} mode")
            }
            PackerError::NoCurrentField { operation } => {
                write!(f, "{operation}: no field remains at this level")
            }
            PackerError::NotNested => write!(f, "current field has no nested fields"),
            PackerError::WrongType {
                operation,
                pack_type,
            } => write!(f, "{operation} is not supported by a {pack_type:?} field"),
            PackerError::Truncated(err) => Display::fmt(err, f),
            PackerError::UnbalancedPop => write!(f, "pop without matching push"),
            PackerError::UnfinishedFields => {
                write!(f, "pop before all nested fields were visited")
            }
            PackerError::ResidualBytes { residual } => {
                write!(f, "pop with {residual} unconsumed bytes in the current field")
            }
            PackerError::NestedCount { actual } => {
                write!(f, "{actual} nested elements violate the declared size")
            }
            PackerError::Unfinished => write!(f, "session ended inside an open field"),
            PackerError::TrailingBytes { residual } => {
                write!(f, "{residual} bytes remain after the root field")
            }
            PackerError::UnknownSeekTarget(name) => write!(f, "no field `{name}` to seek to"),
            PackerError::AbsentSeekTarget(name) => {
                write!(f, "field `{name}` is not present in this buffer")
            }
            PackerError::SeekIntoSwitch(name) => {
                write!(f, "cannot repack `{name}` separately from its switch")
            }
            PackerError::CatalogFailed => {
                write!(f, "unable to catalog the fields of the unpack buffer")
            }
            PackerError::UnmatchedSwitchKey { switch, key } => match key {
                Some(key) => write!(f, "switch `{switch}` has no case for key {key}"),
                None => write!(f, "switch `{switch}` has no case for the packed key"),
            },
            PackerError::Lossy { operation, value } => {
                write!(f, "{operation}: value {value} does not fit the requested type")
            }
            PackerError::InvalidUtf8 => write!(f, "string value is not valid UTF-8"),
            PackerError::IntRange(err) => Display::fmt(err, f),
            PackerError::UIntRange(err) => Display::fmt(err, f),
            PackerError::FloatRange(err) => Display::fmt(err, f),
            PackerError::Length(err) => Display::fmt(err, f),
            PackerError::Width(err) => Display::fmt(err, f),
        }
    }
}

impl Error for PackerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PackerError::Truncated(err) => Some(err),
            PackerError::IntRange(err) => Some(err),
            PackerError::UIntRange(err) => Some(err),
            PackerError::FloatRange(err) => Some(err),
            PackerError::Length(err) => Some(err),
            PackerError::Width(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ReadError> for PackerError {
    fn from(err: ReadError) -> Self {
        Self::Truncated(err)
    }
}

/// The three sticky flags plus the first recorded cause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorFlags {
    parse: bool,
    pack: bool,
    range: bool,
    first: Option<PackerError>,
}

impl ErrorFlags {
    /// Raises `pack_error`.
    pub fn pack(&mut self, err: PackerError) {
        log::trace!("pack error: {err}");
        self.pack = true;
        self.first.get_or_insert(err);
    }

    /// Raises `range_error`.
    pub fn range(&mut self, err: PackerError) {
        log::trace!("range error: {err}");
        self.range = true;
        self.first.get_or_insert(err);
    }

    /// Raises `parse_error`. Only the value-text front end calls this.
    pub fn parse(&mut self) {
        self.parse = true;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn had_parse_error(&self) -> bool {
        self.parse
    }

    #[must_use]
    pub fn had_pack_error(&self) -> bool {
        self.pack
    }

    #[must_use]
    pub fn had_range_error(&self) -> bool {
        self.range
    }

    #[must_use]
    pub fn had_error(&self) -> bool {
        self.parse || self.pack || self.range
    }

    #[must_use]
    pub fn first(&self) -> Option<&PackerError> {
        self.first.as_ref()
    }

    /// Converts the flags into the result of an `end_*` call.
    pub fn to_result(&self) -> SessionResult<()> {
        if self.had_error() {
            Err(SessionError {
                parse_error: self.parse,
                pack_error: self.pack,
                range_error: self.range,
                cause: self.first.clone(),
            })
        } else {
            Ok(())
        }
    }
}

/// Failure of a packing session, as reported by `end_pack`, `end_unpack`
/// and `end_repack`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionError {
    pub parse_error: bool,
    pub pack_error: bool,
    pub range_error: bool,
    pub cause: Option<PackerError>,
}

impl SessionError {
    /// Returns `true` if the only problem was out-of-range data.
    #[must_use]
    pub fn is_range_only(&self) -> bool {
        self.range_error && !self.pack_error && !self.parse_error
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let kind = if self.pack_error {
            "pack error"
        } else if self.parse_error {
            "parse error"
        } else {
            "range error"
        };
        match &self.cause {
            Some(cause) => write!(f, "{kind}: {cause}"),
            None => f.write_str(kind),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_ref().map(|e| e as &(dyn Error + 'static))
    }
}

/// Type alias for Result with an error type of [`SessionError`]
pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_cause_is_kept() {
        let mut flags = ErrorFlags::default();
        assert_eq!(flags.to_result(), Ok(()));
        flags.range(PackerError::IntRange(BoundsError::Overflow { max: 10, val: 11 }));
        flags.pack(PackerError::UnbalancedPop);
        assert!(flags.had_range_error() && flags.had_pack_error());
        let err = flags.to_result().unwrap_err();
        assert!(!err.is_range_only());
        assert_eq!(
            err.to_string(),
            "pack error: value 11 above declared maximum 10"
        );
        flags.clear();
        assert!(!flags.had_error());
    }
}

//! Bounds-checked little-endian reads over a borrowed buffer
//!
//! [`Reader`] is a cursor over an unpacking buffer. Every read either
//! succeeds and advances the offset, or fails with [`ReadError`] and leaves
//! the offset unchanged.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error case when a read would consume bytes beyond the end of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadError {
    pub offset: usize,
    pub requested: usize,
    pub limit: usize,
}

impl Display for ReadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot read {} bytes (currently at byte {} out of limit {})",
            self.requested, self.offset, self.limit
        )
    }
}

impl Error for ReadError {}

pub type ReadResult<T> = Result<T, ReadError>;

/// Cursor over an immutable byte buffer.
#[derive(Clone, Copy, Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

macro_rules! take_le {
    ($($name:ident -> $t:ty),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(&mut self) -> ReadResult<$t> {
                self.take_array().map(<$t>::from_le_bytes)
            }
        )*
    };
}

impl<'a> Reader<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, offset }
    }

    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.offset)
    }

    /// Consumes `n` bytes and returns them as a slice of the original buffer.
    pub fn consume(&mut self, n: usize) -> ReadResult<&'a [u8]> {
        match self.offset.checked_add(n) {
            Some(end) if end <= self.buf.len() => {
                let ret = &self.buf[self.offset..end];
                self.offset = end;
                Ok(ret)
            }
            _ => Err(ReadError {
                offset: self.offset,
                requested: n,
                limit: self.buf.len(),
            }),
        }
    }

    /// Like `consume`, discarding the bytes.
    pub fn skip(&mut self, n: usize) -> ReadResult<()> {
        self.consume(n).map(|_| ())
    }

    pub fn take_array<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        let bytes = self.consume(N)?;
        let mut arr = [0u8; N];
        arr.copy_from_slice(bytes);
        Ok(arr)
    }

    take_le! {
        take_i8 -> i8,
        take_i16 -> i16,
        take_i32 -> i32,
        take_i64 -> i64,
        take_u8 -> u8,
        take_u16 -> u16,
        take_u32 -> u32,
        take_u64 -> u64,
        take_f64 -> f64,
    }

    /// Reads a little-endian length prefix of `width` bytes (2 or 4).
    pub fn take_length(&mut self, width: usize) -> ReadResult<usize> {
        match width {
            4 => self.take_u32().map(|n| n as usize),
            _ => self.take_u16().map(usize::from),
        }
    }
}

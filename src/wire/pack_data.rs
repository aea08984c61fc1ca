//! Output buffer of a packing session
//!
//! `PackData` is a newtype around `Vec<u8>` that adds the two operations the
//! packer needs beyond appending: reserving placeholder bytes for a length
//! prefix, and patching them once the prefixed content has been written.

use super::target::Target;

/// The packer's output buffer
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct PackData(Vec<u8>);

impl PackData {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear()
    }

    /// Moves the contents out, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.0)
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// Appends `n` zero bytes and returns the offset of the first one.
    pub fn append_junk(&mut self, n: usize) -> usize {
        let pos = self.0.len();
        self.0.resize(pos + n, 0);
        pos
    }

    /// Overwrites bytes starting at `pos`; the range must already have been
    /// written.
    ///
    /// Returns `false`, leaving the buffer untouched, if it has not.
    pub fn rewrite_at(&mut self, pos: usize, bytes: &[u8]) -> bool {
        match self.0.get_mut(pos..pos + bytes.len()) {
            Some(slot) => {
                slot.copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }

    /// Returns the bytes from `pos` to the end of the buffer.
    #[must_use]
    pub fn tail(&self, pos: usize) -> &[u8] {
        self.0.get(pos..).unwrap_or(&[])
    }
}

impl Target for PackData {
    fn anticipate(&mut self, extra: usize) {
        self.0.reserve(extra)
    }

    #[inline]
    fn push_one(&mut self, b: u8) -> usize {
        self.0.push(b);
        1
    }

    #[inline]
    fn push_many<const N: usize>(&mut self, arr: [u8; N]) -> usize {
        self.0.extend_from_slice(&arr);
        N
    }

    #[inline]
    fn push_all(&mut self, buf: &[u8]) -> usize {
        self.0.extend_from_slice(buf);
        buf.len()
    }
}

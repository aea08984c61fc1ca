//! Append-only byte sinks
//!
//! [`Target`] is the write half of the wire layer and carries the
//! little-endian encodings of every fixed-width scalar. The packer writes into
//! a [`PackData`](super::PackData).

/// Byte-oriented buffer with infallible, incremental append operations.
///
/// The `push_XXX` methods return the number of bytes written.
pub trait Target {
    /// Reserves room for at least `extra` additional bytes.
    fn anticipate(&mut self, extra: usize);

    fn push_one(&mut self, b: u8) -> usize;

    fn push_many<const N: usize>(&mut self, arr: [u8; N]) -> usize;

    fn push_all(&mut self, buf: &[u8]) -> usize;

    #[inline]
    fn push_i8(&mut self, v: i8) -> usize {
        self.push_one(v as u8)
    }

    #[inline]
    fn push_i16(&mut self, v: i16) -> usize {
        self.push_many(v.to_le_bytes())
    }

    #[inline]
    fn push_i32(&mut self, v: i32) -> usize {
        self.push_many(v.to_le_bytes())
    }

    #[inline]
    fn push_i64(&mut self, v: i64) -> usize {
        self.push_many(v.to_le_bytes())
    }

    #[inline]
    fn push_u8(&mut self, v: u8) -> usize {
        self.push_one(v)
    }

    #[inline]
    fn push_u16(&mut self, v: u16) -> usize {
        self.push_many(v.to_le_bytes())
    }

    #[inline]
    fn push_u32(&mut self, v: u32) -> usize {
        self.push_many(v.to_le_bytes())
    }

    #[inline]
    fn push_u64(&mut self, v: u64) -> usize {
        self.push_many(v.to_le_bytes())
    }

    #[inline]
    fn push_f64(&mut self, v: f64) -> usize {
        self.push_many(v.to_le_bytes())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wire::PackData;

    #[test]
    fn little_endian() {
        let mut buf = PackData::new();
        assert_eq!(buf.push_u16(0x0102), 2);
        assert_eq!(buf.push_i32(-2), 4);
        assert_eq!(buf.push_f64(1.0), 8);
        assert_eq!(&buf.as_slice()[..6], &[0x02, 0x01, 0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(buf.tail(6), &1.0f64.to_le_bytes());
    }
}

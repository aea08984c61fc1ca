//! Closed interval sets used for declared value constraints
//!
//! A [`NumericRange`] is an ordered list of non-overlapping `[min, max]`
//! intervals. The empty range places no constraint on a value. Ranges are
//! kept in the scaled domain of their parameter: a `int16/100(-1.5-1.5)`
//! declaration is stored as `[-150, 150]`, and the divisor is only
//! reapplied when the range is rendered back to text.

use std::fmt::{self, Debug, Display, Write};

use crate::error::BoundsError;
use crate::hash::HashGenerator;

/// Numeric types that can bound a [`NumericRange`]
pub trait RangeBound: Copy + PartialOrd + Debug + Display {
    /// Word contributed to a schema fingerprint for this bound
    fn hash_word(self) -> i64;

    /// Writes the bound as it appears in schema text, undoing the divisor
    fn write_scaled<W: Write>(self, out: &mut W, divisor: u32) -> fmt::Result;
}

impl RangeBound for i64 {
    fn hash_word(self) -> i64 {
        self as i32 as i64
    }

    fn write_scaled<W: Write>(self, out: &mut W, divisor: u32) -> fmt::Result {
        if divisor == 1 {
            write!(out, "{}", self)
        } else {
            write!(out, "{}", self as f64 / divisor as f64)
        }
    }
}

impl RangeBound for u64 {
    fn hash_word(self) -> i64 {
        self as i32 as i64
    }

    fn write_scaled<W: Write>(self, out: &mut W, divisor: u32) -> fmt::Result {
        if divisor == 1 {
            write!(out, "{}", self)
        } else {
            write!(out, "{}", self as f64 / divisor as f64)
        }
    }
}

impl RangeBound for f64 {
    fn hash_word(self) -> i64 {
        self as i32 as i64
    }

    fn write_scaled<W: Write>(self, out: &mut W, divisor: u32) -> fmt::Result {
        write!(out, "{}", self / divisor as f64)
    }
}

/// One closed interval of a [`NumericRange`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinMax<T> {
    pub min: T,
    pub max: T,
}

/// Set of closed intervals over a numeric type
#[derive(Clone, Debug, PartialEq)]
pub struct NumericRange<T> {
    ranges: Vec<MinMax<T>>,
}

impl<T> Default for NumericRange<T> {
    fn default() -> Self {
        Self { ranges: Vec::new() }
    }
}

impl<T: RangeBound> NumericRange<T> {
    /// Returns an unconstrained range
    #[must_use]
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Returns the range consisting of the single interval `[min, max]`
    pub fn single(min: T, max: T) -> Result<Self, BoundsError<T>> {
        let mut ret = Self::new();
        ret.add_range(min, max)?;
        Ok(ret)
    }

    /// Adds the interval `[min, max]` to the set.
    ///
    /// Fails without modifying the range when `min > max` or when the new
    /// interval overlaps one that is already present.
    pub fn add_range(&mut self, min: T, max: T) -> Result<(), BoundsError<T>> {
        if min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }
        if self
            .ranges
            .iter()
            .any(|r| !(max < r.min || min > r.max))
        {
            return Err(BoundsError::InvalidBounds { min, max });
        }
        self.ranges.push(MinMax { min, max });
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MinMax<T>> + '_ {
        self.ranges.iter()
    }

    /// Returns `true` if `val` lies in any interval, or if the range is empty.
    #[must_use]
    pub fn contains(&self, val: T) -> bool {
        self.ranges.is_empty() || self.ranges.iter().any(|r| val >= r.min && val <= r.max)
    }

    /// Checks `val` against the declared intervals.
    pub fn validate(&self, val: T) -> Result<T, BoundsError<T>> {
        if self.contains(val) {
            return Ok(val);
        }
        let (lo, hi) = (self.min_or(val), self.max_or(val));
        if val < lo {
            Err(BoundsError::Underflow { min: lo, val })
        } else if val > hi {
            Err(BoundsError::Overflow { max: hi, val })
        } else {
            Err(BoundsError::Excluded { val })
        }
    }

    /// Returns `true` if the range admits exactly one value
    #[must_use]
    pub fn has_one_value(&self) -> bool {
        matches!(self.ranges.as_slice(), [r] if r.min == r.max)
    }

    #[must_use]
    pub fn one_value(&self) -> Option<T> {
        match self.ranges.as_slice() {
            [r] if r.min == r.max => Some(r.min),
            _ => None,
        }
    }

    /// Least admissible value, or `default` for an empty range
    #[must_use]
    pub fn min_or(&self, default: T) -> T {
        self.ranges
            .iter()
            .map(|r| r.min)
            .fold(None, |acc: Option<T>, v| match acc {
                Some(m) if m <= v => Some(m),
                _ => Some(v),
            })
            .unwrap_or(default)
    }

    /// Greatest admissible value, or `default` for an empty range
    #[must_use]
    pub fn max_or(&self, default: T) -> T {
        self.ranges
            .iter()
            .map(|r| r.max)
            .fold(None, |acc: Option<T>, v| match acc {
                Some(m) if m >= v => Some(m),
                _ => Some(v),
            })
            .unwrap_or(default)
    }

    /// Converts every bound through `f`, preserving interval order.
    pub fn try_map<U: RangeBound, E>(
        &self,
        mut f: impl FnMut(T) -> Result<U, E>,
    ) -> Result<NumericRange<U>, E> {
        let mut ranges = Vec::with_capacity(self.ranges.len());
        for r in &self.ranges {
            ranges.push(MinMax {
                min: f(r.min)?,
                max: f(r.max)?,
            });
        }
        Ok(NumericRange { ranges })
    }

    /// Contributes the range to a schema fingerprint.
    ///
    /// An empty range contributes nothing.
    pub fn generate_hash(&self, hashgen: &mut HashGenerator) {
        if self.ranges.is_empty() {
            return;
        }
        hashgen.add_int(self.ranges.len() as i64);
        for r in &self.ranges {
            hashgen.add_int(r.min.hash_word());
            hashgen.add_int(r.max.hash_word());
        }
    }

    /// Writes the range in schema syntax (`0-10, 20, 30-40`), without
    /// surrounding parentheses.
    pub fn output<W: Write>(&self, out: &mut W, divisor: u32) -> fmt::Result {
        for (i, r) in self.ranges.iter().enumerate() {
            if i != 0 {
                out.write_str(", ")?;
            }
            r.min.write_scaled(out, divisor)?;
            if r.min != r.max {
                out.write_char('-')?;
                r.max.write_scaled(out, divisor)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_is_unconstrained() {
        let range = NumericRange::<i64>::new();
        assert!(range.contains(i64::MIN));
        assert_eq!(range.validate(42), Ok(42));
        assert_eq!(range.min_or(-7), -7);
    }

    #[test]
    fn multiple_intervals() {
        let mut range = NumericRange::<i64>::new();
        range.add_range(0, 10).unwrap();
        range.add_range(20, 30).unwrap();
        assert!(range.add_range(5, 25).is_err());
        assert!(range.add_range(3, 1).is_err());
        assert_eq!(range.len(), 2);
        assert_eq!(range.validate(25), Ok(25));
        assert_eq!(range.validate(15), Err(BoundsError::Excluded { val: 15 }));
        assert_eq!(
            range.validate(31),
            Err(BoundsError::Overflow { max: 30, val: 31 })
        );
        assert_eq!(
            range.validate(-1),
            Err(BoundsError::Underflow { min: 0, val: -1 })
        );
    }

    #[test]
    fn one_value() {
        let range = NumericRange::<u64>::single(8, 8).unwrap();
        assert!(range.has_one_value());
        assert_eq!(range.one_value(), Some(8));
        assert!(!NumericRange::<u64>::single(0, 8).unwrap().has_one_value());
    }

    #[test]
    fn output_with_divisor() {
        let mut range = NumericRange::<i64>::single(-150, 150).unwrap();
        range.add_range(200, 200).unwrap();
        let mut s = String::new();
        range.output(&mut s, 100).unwrap();
        assert_eq!(s, "-1.5-1.5, 2");
        s.clear();
        range.output(&mut s, 1).unwrap();
        assert_eq!(s, "-150-150, 200");
    }
}

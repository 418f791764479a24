//! Type index handle.
//!
//! Every type lives in a [`TypePool`](crate::TypePool) and is referenced by
//! its 32-bit index. The non-parameterized built-in types are pre-interned at
//! fixed indices so they can be named without a pool lookup.

use std::fmt;

/// A 32-bit index into the type pool.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Idx(u32);

impl Idx {
    // === Operand Types (0-4) ===
    /// Matches every other type.
    pub const ANY: Self = Self(0);
    /// A non-existing function result.
    pub const VOID: Self = Self(1);
    /// Block labels.
    pub const LABEL: Self = Self(2);
    /// Placeholder before final type resolution.
    pub const UNKNOWN: Self = Self(3);
    /// The type of types.
    pub const META: Self = Self(4);

    // === Non-parameterized HILTI types (5-15) ===
    pub const DOUBLE: Self = Self(5);
    pub const BOOL: Self = Self(6);
    pub const STRING: Self = Self(7);
    pub const BYTES: Self = Self(8);
    pub const ADDR: Self = Self(9);
    pub const NET: Self = Self(10);
    pub const PORT: Self = Self(11);
    pub const REGEXP: Self = Self(12);
    pub const CONTINUATION: Self = Self(13);
    /// Iterator over `bytes`.
    pub const ITERATOR_BYTES: Self = Self(14);
    /// Root of the exception tree, `Hilti::Exception`.
    pub const EXCEPTION: Self = Self(15);

    /// Number of pre-interned types.
    pub const PREINTERNED_COUNT: u32 = 16;

    /// Sentinel value indicating no type.
    pub const NONE: Self = Self(u32::MAX);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Debug for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "Idx::NONE")
        } else {
            write!(f, "Idx({})", self.0)
        }
    }
}

impl Default for Idx {
    fn default() -> Self {
        Self::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_round_trip() {
        assert_eq!(Idx::from_raw(42).raw(), 42);
        assert_eq!(Idx::from_raw(7).index(), 7);
    }

    #[test]
    fn sentinel() {
        assert!(Idx::NONE.is_none());
        assert!(!Idx::ANY.is_none());
        assert_eq!(Idx::default(), Idx::NONE);
        assert_eq!(format!("{:?}", Idx::NONE), "Idx::NONE");
    }
}

//! Per-entry type flags.

use bitflags::bitflags;

bitflags! {
    /// Properties recorded on every pool entry at construction time.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u8 {
        /// The instance itself is a wildcard (`ref<*>`).
        const WILDCARD     = 1 << 0;
        /// Some parameter, transitively, is a wildcard (`ref<list<*>>`).
        const HAS_WILDCARD = 1 << 1;
        /// The instance is the shared entry in the canonical cache.
        const CANONICAL    = 1 << 2;
    }
}

impl TypeFlags {
    /// Flags a parameter contributes to a type that embeds it.
    #[inline]
    pub fn propagate(self) -> Self {
        if self.intersects(Self::WILDCARD | Self::HAS_WILDCARD) {
            Self::HAS_WILDCARD
        } else {
            Self::empty()
        }
    }

    /// Concrete types carry runtime metadata.
    #[inline]
    pub fn is_concrete(self) -> bool {
        !self.intersects(Self::WILDCARD | Self::HAS_WILDCARD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn propagate_wildcards() {
        assert_eq!(TypeFlags::WILDCARD.propagate(), TypeFlags::HAS_WILDCARD);
        assert_eq!(TypeFlags::HAS_WILDCARD.propagate(), TypeFlags::HAS_WILDCARD);
        assert_eq!(TypeFlags::CANONICAL.propagate(), TypeFlags::empty());
    }

    #[test]
    fn concrete() {
        assert!(TypeFlags::CANONICAL.is_concrete());
        assert!(!(TypeFlags::CANONICAL | TypeFlags::HAS_WILDCARD).is_concrete());
    }
}

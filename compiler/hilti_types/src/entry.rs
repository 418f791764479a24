//! Pool entries and kind-specific payloads.

use smallvec::SmallVec;

use crate::{Idx, Tag, TypeFlags, TypeParam};

/// One type in the pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeEntry {
    pub tag: Tag,
    /// Fully parameterized display name; the canonical cache key.
    pub name: String,
    /// Parameters as given at construction (empty for wildcards).
    pub params: SmallVec<[TypeParam; 2]>,
    pub flags: TypeFlags,
    pub detail: TypeDetail,
}

impl TypeEntry {
    pub(crate) fn simple(tag: Tag) -> Self {
        TypeEntry {
            tag,
            name: tag.name().to_owned(),
            params: SmallVec::new(),
            flags: TypeFlags::empty(),
            detail: TypeDetail::None,
        }
    }

    pub(crate) fn wildcard(tag: Tag) -> Self {
        TypeEntry {
            tag,
            name: format!("{}<*>", tag.name()),
            params: SmallVec::new(),
            flags: TypeFlags::WILDCARD,
            detail: TypeDetail::None,
        }
    }

    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.flags.contains(TypeFlags::WILDCARD)
    }
}

/// A struct field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: String,
    pub ty: Idx,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: Idx) -> Self {
        StructField {
            name: name.into(),
            ty,
        }
    }
}

/// A function parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionParam {
    pub name: String,
    pub ty: Idx,
}

impl FunctionParam {
    pub fn new(name: impl Into<String>, ty: Idx) -> Self {
        FunctionParam {
            name: name.into(),
            ty,
        }
    }
}

/// Kind-specific data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeDetail {
    /// Nothing beyond the tag and name.
    None,
    Integer {
        /// Bit width; zero matches every width.
        width: u8,
    },
    Tuple {
        elements: SmallVec<[Idx; 4]>,
    },
    Reference {
        target: Idx,
    },
    Container {
        item: Idx,
        /// Channel capacity, zero for unbounded. Always zero for lists and vectors.
        capacity: u64,
        iterator: Idx,
    },
    /// Wildcard containers still iterate; the item type is unknown.
    WildcardContainer {
        iterator: Idx,
    },
    Iterator {
        container: Idx,
    },
    Struct {
        fields: Vec<StructField>,
    },
    Enum {
        /// Labels with their values; `Undef` is always label 0.
        labels: Vec<(String, u32)>,
    },
    Bitset {
        bits: Vec<(String, u8)>,
    },
    Exception {
        name: String,
        arg: Option<Idx>,
        /// Explicit base, `None` meaning the root.
        base: Option<Idx>,
    },
    Function {
        params: Vec<FunctionParam>,
        result: Idx,
    },
    TypeDecl {
        target: Idx,
    },
}

use std::fmt;

use crate::Idx;

/// A type parameter as supplied to [`TypePool::resolve_type`](crate::TypePool::resolve_type).
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeParam {
    /// An integer parameter (`int<32>`, a channel capacity).
    Int(i64),
    /// A type parameter (`ref<bytes>`).
    Type(Idx),
    /// The wildcard marker `*`.
    Wildcard,
    /// A bare identifier, such as `_` for an unbounded channel.
    Ident(String),
}

impl TypeParam {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, TypeParam::Wildcard)
    }

    pub fn as_type(&self) -> Option<Idx> {
        match self {
            TypeParam::Type(idx) => Some(*idx),
            _ => None,
        }
    }
}

impl From<i64> for TypeParam {
    fn from(value: i64) -> Self {
        TypeParam::Int(value)
    }
}

impl From<Idx> for TypeParam {
    fn from(idx: Idx) -> Self {
        TypeParam::Type(idx)
    }
}

/// Renders non-type parameters; type parameters need the pool for their name.
impl fmt::Display for TypeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeParam::Int(v) => write!(f, "{v}"),
            TypeParam::Type(idx) => write!(f, "{idx:?}"),
            TypeParam::Wildcard => f.write_str("*"),
            TypeParam::Ident(s) => f.write_str(s),
        }
    }
}

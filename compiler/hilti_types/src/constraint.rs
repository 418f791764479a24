use crate::{Idx, Tag, TypeClass};

/// What a signature slot accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeConstraint {
    /// Any instance of a class.
    Class(TypeClass),
    /// Instances compatible with a specific type (wildcards allowed).
    Exact(Idx),
}

impl TypeConstraint {
    /// Accepts everything.
    pub const ANY: Self = TypeConstraint::Class(TypeClass::Kind(Tag::Any));

    pub fn kind(tag: Tag) -> Self {
        TypeConstraint::Class(TypeClass::Kind(tag))
    }
}

impl From<TypeClass> for TypeConstraint {
    fn from(class: TypeClass) -> Self {
        TypeConstraint::Class(class)
    }
}

impl From<Tag> for TypeConstraint {
    fn from(tag: Tag) -> Self {
        TypeConstraint::kind(tag)
    }
}

impl From<Idx> for TypeConstraint {
    fn from(idx: Idx) -> Self {
        TypeConstraint::Exact(idx)
    }
}

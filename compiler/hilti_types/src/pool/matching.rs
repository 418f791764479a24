//! Polymorphic type compatibility.
//!
//! Rules, in order:
//! 1. Identical entries match.
//! 2. `any` on either side matches.
//! 3. Different kinds never match.
//! 4. A wildcard on either side matches every instance of its kind.
//! 5. Otherwise a kind-specific comparison decides; the default compares
//!    names.

use super::TypePool;
use crate::{Idx, Tag, TypeClass, TypeConstraint, TypeDetail};

impl TypePool {
    /// Whether two type instances are compatible.
    pub fn types_match(&self, a: Idx, b: Idx) -> bool {
        if a == b {
            return true;
        }
        let (ea, eb) = (self.get(a), self.get(b));
        if ea.tag == Tag::Any || eb.tag == Tag::Any {
            return true;
        }
        if ea.tag != eb.tag {
            return false;
        }
        if ea.is_wildcard() || eb.is_wildcard() {
            return true;
        }

        match (&ea.detail, &eb.detail) {
            (TypeDetail::Integer { width: wa }, TypeDetail::Integer { width: wb }) => {
                *wa == 0 || *wb == 0 || wa == wb
            }
            (TypeDetail::Tuple { elements: xa }, TypeDetail::Tuple { elements: xb }) => {
                xa.len() == xb.len()
                    && xa.iter().zip(xb.iter()).all(|(&x, &y)| self.types_match(x, y))
            }
            (TypeDetail::Reference { target: ta }, TypeDetail::Reference { target: tb }) => {
                self.types_match(*ta, *tb)
            }
            _ => ea.name == eb.name,
        }
    }

    /// Whether a type instance belongs to a class.
    #[inline]
    pub fn matches_class(&self, idx: Idx, class: TypeClass) -> bool {
        self.tag(idx).is_a(class)
    }

    /// Whether a type instance satisfies a signature constraint.
    pub fn satisfies(&self, idx: Idx, constraint: &TypeConstraint) -> bool {
        match constraint {
            TypeConstraint::Class(class) => self.matches_class(idx, *class),
            TypeConstraint::Exact(expected) => self.types_match(idx, *expected),
        }
    }

    /// Render a constraint for mismatch messages.
    pub fn constraint_name(&self, constraint: &TypeConstraint) -> String {
        match constraint {
            TypeConstraint::Class(class) => class.name().to_owned(),
            TypeConstraint::Exact(idx) => self.name(*idx).to_owned(),
        }
    }
}

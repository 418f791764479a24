use std::fmt;

use hilti_types::{Idx, TypePool};

use crate::{ConstValue, Constant, Id};

/// A tuple built from operands (call arguments, tuple constants).
#[derive(Clone, PartialEq, Debug)]
pub struct TupleOperand {
    pub elements: Vec<Operand>,
    /// The tuple type of the elements.
    pub ty: Idx,
}

/// An operand that denotes a type itself.
#[derive(Clone, PartialEq, Debug)]
pub struct TypeOperand {
    /// The type referred to.
    pub referenced: Idx,
    /// The type-declaration wrapper around `referenced`.
    pub ty: Idx,
}

/// An instruction operand.
#[derive(Clone, PartialEq, Debug)]
pub enum Operand {
    Const(Constant),
    Id(Id),
    Tuple(TupleOperand),
    Type(TypeOperand),
}

impl Operand {
    /// The operand's own type.
    pub fn ty(&self) -> Idx {
        match self {
            Operand::Const(c) => c.ty,
            Operand::Id(id) => id.ty,
            Operand::Tuple(t) => t.ty,
            Operand::Type(t) => t.ty,
        }
    }

    pub fn constant(value: ConstValue, ty: Idx) -> Self {
        Operand::Const(Constant::new(value, ty))
    }

    pub fn int(value: i64, ty: Idx) -> Self {
        Self::constant(ConstValue::Int(value), ty)
    }

    pub fn bool(value: bool) -> Self {
        Self::constant(ConstValue::Bool(value), Idx::BOOL)
    }

    pub fn double(value: f64) -> Self {
        Self::constant(ConstValue::Double(value), Idx::DOUBLE)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::constant(ConstValue::String(value.into()), Idx::STRING)
    }

    /// Jump target.
    pub fn label(name: impl Into<String>) -> Self {
        Self::constant(ConstValue::Label(name.into()), Idx::LABEL)
    }

    pub fn id(id: Id) -> Self {
        Operand::Id(id)
    }

    /// Tuple of operands; its type is interned in `pool`.
    pub fn tuple(pool: &mut TypePool, elements: Vec<Operand>) -> Self {
        let types: Vec<Idx> = elements.iter().map(Operand::ty).collect();
        let ty = pool.tuple(&types);
        Operand::Tuple(TupleOperand { elements, ty })
    }

    /// Operand standing for the type `referenced`.
    pub fn type_of(pool: &mut TypePool, referenced: Idx) -> Self {
        let ty = pool.type_decl(referenced);
        Operand::Type(TypeOperand { referenced, ty })
    }

    pub fn as_id(&self) -> Option<&Id> {
        match self {
            Operand::Id(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            Operand::Const(Constant {
                value: ConstValue::Label(l),
                ..
            }) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Const(c) => write!(f, "{}", c.value),
            Operand::Id(id) => write!(f, "{id}"),
            Operand::Tuple(t) => {
                f.write_str("(")?;
                for (i, e) in t.elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{e}")?;
                }
                f.write_str(")")
            }
            Operand::Type(t) => write!(f, "type {:?}", t.referenced),
        }
    }
}

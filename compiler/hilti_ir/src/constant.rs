use std::fmt;

use hilti_types::Idx;

/// Literal values.
#[derive(Clone, PartialEq, Debug)]
pub enum ConstValue {
    Int(i64),
    Double(f64),
    Bool(bool),
    String(String),
    /// A block label, as a jump target.
    Label(String),
    /// An enum label.
    Enum(String),
    /// The null reference.
    Null,
}

/// A typed literal.
#[derive(Clone, PartialEq, Debug)]
pub struct Constant {
    pub value: ConstValue,
    pub ty: Idx,
}

impl Constant {
    pub fn new(value: ConstValue, ty: Idx) -> Self {
        Constant { value, ty }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Double(v) => write!(f, "{v}"),
            ConstValue::Bool(v) => write!(f, "{}", if *v { "True" } else { "False" }),
            ConstValue::String(s) => write!(f, "{s:?}"),
            ConstValue::Label(l) => write!(f, "@{l}"),
            ConstValue::Enum(l) => f.write_str(l),
            ConstValue::Null => f.write_str("Null"),
        }
    }
}

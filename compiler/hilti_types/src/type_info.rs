//! Runtime type descriptors.
//!
//! One [`TypeInfo`] exists per concrete HILTI type used by a compiled unit.
//! The code generator fills in the conversion hooks and emits it as a
//! global laid out as
//!
//! ```text
//! { i16 type_id, ptr name, i16 num_params,
//!   ptr to_string, ptr to_int64, ptr to_double,
//!   <num_params x (i64 | ptr)> }
//! ```
//!
//! under the symbol returned by [`type_info_symbol`]. The symbol must be
//! identical across compilation units, so it depends only on the type name.

use hilti_diagnostic::internal_error;

use crate::{Idx, TypeParam, TypePool};

/// Prefix of every descriptor symbol.
pub const TYPE_INFO_PREFIX: &str = "__hlt_type_info_";

const RESERVED: &[char] = &['<', '>', ',', '{', '}', ' '];

/// Global symbol holding the descriptor of the type named `type_name`.
///
/// Reserved characters become `_`, runs of `_` collapse to one, and a
/// trailing `_` is dropped.
pub fn type_info_symbol(type_name: &str) -> String {
    let mut canonical = String::with_capacity(type_name.len());
    for c in type_name.chars() {
        let c = if RESERVED.contains(&c) { '_' } else { c };
        if c == '_' && canonical.ends_with('_') {
            continue;
        }
        canonical.push(c);
    }
    if canonical.ends_with('_') {
        canonical.pop();
    }
    format!("{TYPE_INFO_PREFIX}{canonical}")
}

/// A descriptor parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeInfoParam {
    Int(i64),
    /// Points at the nested type's descriptor.
    Type(Idx),
}

/// Runtime descriptor of one concrete type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeInfo {
    pub ty: Idx,
    pub type_id: u16,
    pub name: String,
    pub symbol: String,
    pub params: Vec<TypeInfoParam>,
    /// Native conversion functions, by name.
    pub to_string: Option<String>,
    pub to_int64: Option<String>,
    pub to_double: Option<String>,
}

impl TypeInfo {
    /// Descriptor with id, name and parameters filled in and no hooks.
    ///
    /// Only concrete HILTI types have descriptors; asking for any other
    /// type is an internal defect.
    pub fn new(pool: &TypePool, ty: Idx) -> Self {
        let entry = pool.get(ty);
        let Some(type_id) = entry.tag.type_id().filter(|_| pool.is_concrete(ty)) else {
            internal_error(format_args!("no runtime type information for {}", entry.name));
        };

        let params = entry
            .params
            .iter()
            .map(|param| match param {
                TypeParam::Int(v) => TypeInfoParam::Int(*v),
                TypeParam::Type(idx) => TypeInfoParam::Type(*idx),
                // Unbounded channel capacity.
                TypeParam::Ident(_) => TypeInfoParam::Int(0),
                TypeParam::Wildcard => {
                    internal_error(format_args!("wildcard parameter in concrete type {}", entry.name))
                }
            })
            .collect();

        TypeInfo {
            ty,
            type_id,
            name: entry.name.clone(),
            symbol: type_info_symbol(&entry.name),
            params,
            to_string: None,
            to_int64: None,
            to_double: None,
        }
    }

    pub fn with_to_string(mut self, function: impl Into<String>) -> Self {
        self.to_string = Some(function.into());
        self
    }

    pub fn with_to_int64(mut self, function: impl Into<String>) -> Self {
        self.to_int64 = Some(function.into());
        self
    }

    pub fn with_to_double(mut self, function: impl Into<String>) -> Self {
        self.to_double = Some(function.into());
        self
    }

    pub fn num_params(&self) -> usize {
        self.params.len()
    }
}

#[cfg(test)]
mod tests;

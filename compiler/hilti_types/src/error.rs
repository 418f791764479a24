//! Type resolution errors.

use std::fmt;

use hilti_diagnostic::{Diagnostic, ErrorCode, Location};

/// Number of parameters a type keyword expects.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Variable, but at least one.
    AtLeastOne,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => n == count,
            Arity::AtLeastOne => count >= 1,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeastOne => write!(f, "at least 1"),
        }
    }
}

/// A user-facing failure to build a type.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("no such type, {name}")]
    UnknownType { name: String },

    #[error("type {name} does not accept type parameters")]
    ParametersNotAccepted { name: String },

    #[error("wrong number of parameters for type {name} (expected {expected}, have {found})")]
    WrongParameterCount {
        name: String,
        expected: Arity,
        found: usize,
    },

    #[error("type {name} does not accept wildcards")]
    WildcardNotAllowed { name: String },

    #[error("error in type parameter: {reason} ({param})")]
    ParameterMismatch { param: String, reason: String },

    #[error("{param} is not a type")]
    NotAType { param: String },

    #[error("{name} is not iterable")]
    NotIterable { name: String },
}

impl TypeError {
    pub(crate) fn mismatch(param: impl fmt::Display, reason: impl Into<String>) -> Self {
        TypeError::ParameterMismatch {
            param: param.to_string(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            TypeError::UnknownType { .. } => ErrorCode::E1001,
            TypeError::ParametersNotAccepted { .. } => ErrorCode::E1002,
            TypeError::WrongParameterCount { .. } => ErrorCode::E1003,
            TypeError::WildcardNotAllowed { .. } => ErrorCode::E1004,
            TypeError::ParameterMismatch { .. } => ErrorCode::E1005,
            TypeError::NotAType { .. } | TypeError::NotIterable { .. } => ErrorCode::E1006,
        }
    }

    pub fn to_diagnostic(&self, location: Location) -> Diagnostic {
        Diagnostic::error(self.code())
            .with_message(self.to_string())
            .with_label(location, "in this type")
    }
}

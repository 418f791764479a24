//! Instruction validation errors.

use hilti_diagnostic::{Diagnostic, ErrorCode, Location};

use crate::{MismatchKind, SignatureMismatch};

/// A user-facing failure to accept an instruction.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InstructionError {
    #[error("unknown instruction {name}")]
    Unknown { name: String },

    #[error("{name}: {mismatch}")]
    Signature {
        name: String,
        mismatch: SignatureMismatch,
    },

    #[error("no matching overload of operator {name} for {found}")]
    NoOverload { name: String, found: String },

    #[error("{name}: {reason}")]
    Rejected { name: String, reason: String },
}

impl InstructionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            InstructionError::Unknown { .. } => ErrorCode::E2004,
            InstructionError::Signature { mismatch, .. } => match mismatch.kind {
                MismatchKind::Missing => ErrorCode::E2001,
                MismatchKind::Superfluous => ErrorCode::E2002,
                MismatchKind::TypeMismatch { .. } => ErrorCode::E2003,
            },
            InstructionError::NoOverload { .. } => ErrorCode::E2005,
            InstructionError::Rejected { .. } => ErrorCode::E2006,
        }
    }

    pub fn to_diagnostic(&self, location: Location) -> Diagnostic {
        let diag = Diagnostic::error(self.code())
            .with_message(self.to_string())
            .with_label(location, "in this instruction");
        match self {
            InstructionError::NoOverload { .. } => {
                diag.with_note("overloads are selected by the type of operand 1")
            }
            _ => diag,
        }
    }
}

//! Checking instructions against signatures.

use std::fmt;

use hilti_types::TypePool;

use crate::{Instruction, Operand, Signature, Slot};

/// Why a slot failed to match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MismatchKind {
    Missing,
    Superfluous,
    TypeMismatch { expected: String, found: String },
}

/// First slot of an instruction that its signature rejects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureMismatch {
    pub slot: Slot,
    pub kind: MismatchKind,
}

impl fmt::Display for SignatureMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            MismatchKind::Missing => write!(f, "missing {}", self.slot),
            MismatchKind::Superfluous => write!(f, "superfluous {}", self.slot),
            MismatchKind::TypeMismatch { expected, found } => write!(
                f,
                "type of {} does not match signature (expected {expected}, found {found})",
                self.slot
            ),
        }
    }
}

impl std::error::Error for SignatureMismatch {}

/// Check every slot of `instruction` against `signature`.
///
/// Slots are checked in the order operand 1, 2, 3, target; the first
/// incompatible slot is reported.
pub fn match_instruction_with_signature(
    pool: &TypePool,
    instruction: &Instruction,
    signature: &Signature,
) -> Result<(), SignatureMismatch> {
    for slot in Slot::ALL {
        match_slot(pool, slot, instruction.operand(slot), signature)?;
    }
    Ok(())
}

fn match_slot(
    pool: &TypePool,
    slot: Slot,
    actual: Option<&Operand>,
    signature: &Signature,
) -> Result<(), SignatureMismatch> {
    let fail = |kind| Err(SignatureMismatch { slot, kind });

    match (signature.slot(slot), actual) {
        (None, None) => Ok(()),
        (Some(spec), None) if spec.optional => Ok(()),
        (Some(_), None) => fail(MismatchKind::Missing),
        (None, Some(_)) => fail(MismatchKind::Superfluous),
        (Some(spec), Some(op)) => {
            // A type used as a value is checked by the type it denotes.
            let ty = match op {
                Operand::Type(t) => t.referenced,
                _ => op.ty(),
            };
            if pool.satisfies(ty, &spec.constraint) {
                Ok(())
            } else {
                fail(MismatchKind::TypeMismatch {
                    expected: pool.constraint_name(&spec.constraint),
                    found: pool.name(ty).to_owned(),
                })
            }
        }
    }
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchKind::Missing => f.write_str("missing"),
            MismatchKind::Superfluous => f.write_str("superfluous"),
            MismatchKind::TypeMismatch { .. } => f.write_str("type mismatch"),
        }
    }
}

#[cfg(test)]
mod tests;

use std::fmt;

use hilti_diagnostic::{internal_error, Location};
use hilti_types::{Idx, TypePool};

use crate::Operand;

/// One of the four operand positions of an instruction.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Slot {
    Op1,
    Op2,
    Op3,
    Target,
}

impl Slot {
    /// Slots in matching order.
    pub const ALL: [Slot; 4] = [Slot::Op1, Slot::Op2, Slot::Op3, Slot::Target];
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Op1 => f.write_str("operand 1"),
            Slot::Op2 => f.write_str("operand 2"),
            Slot::Op3 => f.write_str("operand 3"),
            Slot::Target => f.write_str("target"),
        }
    }
}

/// An instruction: a mnemonic, up to three operands and a target.
///
/// Construction performs no checking; see
/// [`match_instruction_with_signature`](crate::match_instruction_with_signature).
#[derive(Clone, PartialEq, Debug)]
pub struct Instruction {
    pub name: String,
    pub op1: Option<Operand>,
    pub op2: Option<Operand>,
    pub op3: Option<Operand>,
    /// Always an identifier operand when present.
    pub target: Option<Operand>,
    pub location: Location,
}

impl Instruction {
    pub fn new(name: impl Into<String>) -> Self {
        Instruction {
            name: name.into(),
            op1: None,
            op2: None,
            op3: None,
            target: None,
            location: Location::none(),
        }
    }

    #[must_use]
    pub fn with_op1(mut self, op: Operand) -> Self {
        self.op1 = Some(op);
        self
    }

    #[must_use]
    pub fn with_op2(mut self, op: Operand) -> Self {
        self.op2 = Some(op);
        self
    }

    #[must_use]
    pub fn with_op3(mut self, op: Operand) -> Self {
        self.op3 = Some(op);
        self
    }

    /// Set the target. Targets must be identifiers.
    #[must_use]
    pub fn with_target(mut self, target: Operand) -> Self {
        if !matches!(target, Operand::Id(_)) {
            internal_error(format_args!("target of {} is not an identifier", self.name));
        }
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn operand(&self, slot: Slot) -> Option<&Operand> {
        match slot {
            Slot::Op1 => self.op1.as_ref(),
            Slot::Op2 => self.op2.as_ref(),
            Slot::Op3 => self.op3.as_ref(),
            Slot::Target => self.target.as_ref(),
        }
    }

    /// Type an operator dispatches on: operand 1's type, with a
    /// type-declaration wrapper stripped.
    pub fn dispatch_type(&self, pool: &TypePool) -> Option<Idx> {
        self.op1.as_ref().map(|op| pool.unwrap_decl(op.ty()))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(target) = &self.target {
            write!(f, "{target} = ")?;
        }
        f.write_str(&self.name)?;
        for op in [&self.op1, &self.op2, &self.op3].into_iter().flatten() {
            write!(f, " {op}")?;
        }
        Ok(())
    }
}

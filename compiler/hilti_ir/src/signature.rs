use std::fmt;

use hilti_types::{TypeConstraint, TypePool};

use crate::{Instruction, Slot};

/// Post-construction check run after the operand types matched.
///
/// Returns a user-facing reason on rejection.
pub type SignatureHook = fn(&TypePool, &Instruction) -> Result<(), String>;

/// Constraint of one signature slot.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotSpec {
    pub constraint: TypeConstraint,
    /// An absent operand is fine.
    pub optional: bool,
}

/// The declared contract of an instruction.
#[derive(Clone)]
pub struct Signature {
    /// Mnemonic, shared by an operator and all its overloads.
    pub name: String,
    /// Name of a specific overload implementation.
    pub overload: Option<String>,
    pub op1: Option<SlotSpec>,
    pub op2: Option<SlotSpec>,
    pub op3: Option<SlotSpec>,
    pub target: Option<SlotSpec>,
    pub terminator: bool,
    pub hook: Option<SignatureHook>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Signature {
            name: name.into(),
            overload: None,
            op1: None,
            op2: None,
            op3: None,
            target: None,
            terminator: false,
            hook: None,
        }
    }

    fn spec(constraint: impl Into<TypeConstraint>, optional: bool) -> Option<SlotSpec> {
        Some(SlotSpec {
            constraint: constraint.into(),
            optional,
        })
    }

    #[must_use]
    pub fn op1(mut self, constraint: impl Into<TypeConstraint>) -> Self {
        self.op1 = Self::spec(constraint, false);
        self
    }

    #[must_use]
    pub fn op2(mut self, constraint: impl Into<TypeConstraint>) -> Self {
        self.op2 = Self::spec(constraint, false);
        self
    }

    #[must_use]
    pub fn optional_op2(mut self, constraint: impl Into<TypeConstraint>) -> Self {
        self.op2 = Self::spec(constraint, true);
        self
    }

    #[must_use]
    pub fn op3(mut self, constraint: impl Into<TypeConstraint>) -> Self {
        self.op3 = Self::spec(constraint, false);
        self
    }

    #[must_use]
    pub fn target(mut self, constraint: impl Into<TypeConstraint>) -> Self {
        self.target = Self::spec(constraint, false);
        self
    }

    #[must_use]
    pub fn optional_target(mut self, constraint: impl Into<TypeConstraint>) -> Self {
        self.target = Self::spec(constraint, true);
        self
    }

    #[must_use]
    pub fn terminator(mut self) -> Self {
        self.terminator = true;
        self
    }

    #[must_use]
    pub fn with_hook(mut self, hook: SignatureHook) -> Self {
        self.hook = Some(hook);
        self
    }

    #[must_use]
    pub fn overload_of(mut self, implementation: impl Into<String>) -> Self {
        self.overload = Some(implementation.into());
        self
    }

    pub fn slot(&self, slot: Slot) -> Option<&SlotSpec> {
        match slot {
            Slot::Op1 => self.op1.as_ref(),
            Slot::Op2 => self.op2.as_ref(),
            Slot::Op3 => self.op3.as_ref(),
            Slot::Target => self.target.as_ref(),
        }
    }

    /// Key that selects the lowering: the overload name if any, else the
    /// mnemonic.
    pub fn key(&self) -> &str {
        self.overload.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("name", &self.name)
            .field("overload", &self.overload)
            .field("op1", &self.op1)
            .field("op2", &self.op2)
            .field("op3", &self.op3)
            .field("target", &self.target)
            .field("terminator", &self.terminator)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

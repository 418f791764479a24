//! The instruction and operator registry of one compilation session.

use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use hilti_diagnostic::internal_error;
use hilti_types::{Idx, TypePool};

use crate::{match_instruction_with_signature, Instruction, InstructionError, Signature};

/// Result of resolving an operator against its overloads.
#[derive(Debug)]
pub struct OverloadResolution<'a> {
    /// Number of overloads the operands satisfy.
    pub count: usize,
    /// First satisfied overload in registration order.
    pub first: Option<&'a Signature>,
    /// Operand 1's type with any type-declaration wrapper removed.
    pub dispatch_type: Option<Idx>,
}

impl OverloadResolution<'_> {
    pub fn is_ambiguous(&self) -> bool {
        self.count > 1
    }
}

/// Every instruction and operator known to a session.
///
/// Plain instructions have exactly one signature. Operators have none of
/// their own; their overloads are kept in registration order.
#[derive(Default)]
pub struct InstructionSet {
    instructions: FxHashMap<String, Signature>,
    overloads: FxHashMap<String, Vec<Signature>>,
}

impl InstructionSet {
    /// An empty set. See `with_builtins` for the standard one.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plain instruction. Registering a mnemonic twice is a
    /// defect.
    pub fn register_instruction(&mut self, signature: Signature) {
        if self.overloads.contains_key(&signature.name) {
            internal_error(format_args!("{} is already an operator", signature.name));
        }
        trace!(name = %signature.name, "register instruction");
        if let Some(old) = self.instructions.insert(signature.name.clone(), signature) {
            internal_error(format_args!("instruction {} registered twice", old.name));
        }
    }

    /// Declare an operator with no overloads yet.
    pub fn register_operator(&mut self, name: &str) {
        if self.instructions.contains_key(name) {
            internal_error(format_args!("{name} is already an instruction"));
        }
        self.overloads.entry(name.to_owned()).or_default();
    }

    /// Add a type-specific overload under its operator's name.
    pub fn register_overload(&mut self, signature: Signature) {
        let Some(list) = self.overloads.get_mut(&signature.name) else {
            internal_error(format_args!(
                "overload for undeclared operator {}",
                signature.name
            ));
        };
        trace!(operator = %signature.name, key = signature.key(), "register overload");
        list.push(signature);
    }

    pub fn lookup(&self, name: &str) -> Option<&Signature> {
        self.instructions.get(name)
    }

    pub fn is_operator(&self, name: &str) -> bool {
        self.overloads.contains_key(name)
    }

    pub fn overloads(&self, name: &str) -> &[Signature] {
        self.overloads.get(name).map_or(&[], Vec::as_slice)
    }

    /// Whether `name` is an instruction or operator of this set.
    pub fn contains(&self, name: &str) -> bool {
        self.instructions.contains_key(name) || self.overloads.contains_key(name)
    }

    /// Test every overload of the operator `instruction` names against its
    /// operands.
    pub fn find_overloaded_operator<'a>(
        &'a self,
        pool: &TypePool,
        instruction: &Instruction,
    ) -> OverloadResolution<'a> {
        let dispatch_type = instruction.dispatch_type(pool);
        let mut count = 0;
        let mut first = None;
        for signature in self.overloads(&instruction.name) {
            if match_instruction_with_signature(pool, instruction, signature).is_ok() {
                count += 1;
                first = first.or(Some(signature));
            }
        }
        OverloadResolution {
            count,
            first,
            dispatch_type,
        }
    }

    /// Select the signature for `instruction` and check it fully: slot
    /// types, then the signature's hook.
    ///
    /// An operator matching several overloads resolves to the first one
    /// registered.
    pub fn validate<'a>(
        &'a self,
        pool: &TypePool,
        instruction: &Instruction,
    ) -> Result<&'a Signature, InstructionError> {
        let name = &instruction.name;
        let signature = if let Some(signature) = self.lookup(name) {
            match_instruction_with_signature(pool, instruction, signature).map_err(|mismatch| {
                InstructionError::Signature {
                    name: name.clone(),
                    mismatch,
                }
            })?;
            signature
        } else if self.is_operator(name) {
            let resolution = self.find_overloaded_operator(pool, instruction);
            if resolution.is_ambiguous() {
                warn!(
                    operator = %name,
                    count = resolution.count,
                    "ambiguous operator overloads; using the first registered"
                );
            }
            resolution
                .first
                .ok_or_else(|| InstructionError::NoOverload {
                    name: name.clone(),
                    found: resolution
                        .dispatch_type
                        .map_or_else(|| "no operands".to_owned(), |t| pool.name(t).to_owned()),
                })?
        } else {
            return Err(InstructionError::Unknown { name: name.clone() });
        };

        if let Some(hook) = signature.hook {
            hook(pool, instruction).map_err(|reason| InstructionError::Rejected {
                name: name.clone(),
                reason,
            })?;
        }
        Ok(signature)
    }
}

#[cfg(test)]
mod tests;

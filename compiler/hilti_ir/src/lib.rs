//! IR model and instruction framework for the HILTI backend.
//!
//! The front-end delivers a [`Module`] of [`Function`]s, each a list of
//! [`Block`]s of [`Instruction`]s. Instructions are plain data: they are
//! built without checking and validated separately against a
//! [`Signature`] with [`match_instruction_with_signature`].
//!
//! # Operators
//!
//! An operator is a generic instruction whose behavior depends on the type
//! of its first operand. Type-specific behavior is registered as overloads
//! under the operator's name in an [`InstructionSet`], and
//! [`InstructionSet::find_overloaded_operator`] picks the overloads whose
//! signatures the actual operands satisfy.

mod builtin;
mod constant;
mod error;
mod id;
mod instruction;
mod matching;
mod module;
mod operand;
mod registry;
mod signature;

pub use builtin::names;
pub use constant::{ConstValue, Constant};
pub use error::InstructionError;
pub use id::{Id, IdRole};
pub use instruction::{Instruction, Slot};
pub use matching::{match_instruction_with_signature, MismatchKind, SignatureMismatch};
pub use module::{Block, CallingConvention, Function, Global, Linkage, Module, ModuleItem};
pub use operand::{Operand, TupleOperand, TypeOperand};
pub use registry::{InstructionSet, OverloadResolution};
pub use signature::{Signature, SignatureHook, SlotSpec};

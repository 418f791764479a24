//! Calling conventions at the native level.
//!
//! Internal functions take only a frame pointer (plus, for return
//! continuations, the returned value) and use `fastcc` so that every
//! control transfer can be a guaranteed tail call. Bridge functions use
//! the C convention. C-HILTI bridges additionally receive generic
//! arguments type-erased and report exceptions through a trailing
//! out-parameter.

use std::fmt;

use inkwell::context::Context;
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType};
use inkwell::AddressSpace;

/// Native calling convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallConv {
    /// `fastcc`: internal functions, reached only by tail calls.
    Fast,
    /// `ccc`: bridge functions and the runtime.
    C,
}

impl CallConv {
    /// LLVM convention ID (see `CallingConv.h`).
    pub const fn llvm_id(self) -> u32 {
        match self {
            CallConv::Fast => 8,
            CallConv::C => 0,
        }
    }
}

impl fmt::Display for CallConv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallConv::Fast => f.write_str("fastcc"),
            CallConv::C => f.write_str("ccc"),
        }
    }
}

/// How one declared bridge parameter crosses the boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgPassing<'ctx> {
    /// As a single value of the given C type.
    Direct(BasicTypeEnum<'ctx>),
    /// As a `TypeInfo` pointer followed by a pointer to a spilled copy.
    Erased,
}

/// Physical signature of a bridge function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeAbi<'ctx> {
    pub params: Vec<ArgPassing<'ctx>>,
    /// Trailing pointer to the caller's exception slot.
    pub exception_slot: bool,
    /// `None` for `void`.
    pub ret: Option<BasicTypeEnum<'ctx>>,
}

impl<'ctx> BridgeAbi<'ctx> {
    /// The native parameter list.
    pub fn native_params(&self, context: &'ctx Context) -> Vec<BasicTypeEnum<'ctx>> {
        let ptr = context.ptr_type(AddressSpace::default()).as_basic_type_enum();
        let mut out = Vec::with_capacity(self.params.len() + 1);
        for param in &self.params {
            match *param {
                ArgPassing::Direct(ty) => out.push(ty),
                ArgPassing::Erased => {
                    out.push(ptr);
                    out.push(ptr);
                }
            }
        }
        if self.exception_slot {
            out.push(ptr);
        }
        out
    }

    pub fn fn_type(&self, context: &'ctx Context) -> FunctionType<'ctx> {
        let params: Vec<BasicMetadataTypeEnum<'ctx>> = self
            .native_params(context)
            .into_iter()
            .map(Into::into)
            .collect();
        match self.ret {
            Some(ret) => ret.fn_type(&params, false),
            None => context.void_type().fn_type(&params, false),
        }
    }
}

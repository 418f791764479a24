//! Functions, blocks and module-level declarations.

use inkwell::module::Linkage;
use inkwell::values::{BasicValue, BasicValueEnum, FunctionValue};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use hilti_diagnostic::internal_error;
use hilti_ir::{CallingConvention, Function, Global, Instruction, Linkage as IrLinkage, Operand};
use hilti_types::Idx;

use super::{Callee, CodeGen, FunctionState};
use crate::abi::{ArgPassing, BridgeAbi, CallConv};
use crate::builder::zero;
use crate::mangle;

impl<'a, 'ctx> CodeGen<'a, 'ctx> {
    pub(super) fn declare_global(&mut self, global: &Global) {
        let name = mangle::global_name(&self.unit().name, &global.id.name);
        let ty = self.storage_type(global.id.ty);
        let init = match &global.init {
            Some(c) => self.operand_value(&Operand::Const(c.clone())),
            None => zero(ty),
        };
        if BasicValue::as_instruction_value(&init).is_some() {
            internal_error(format_args!("global {} has a non-constant initializer", global.id));
        }
        trace!(%name, "declare global");
        let native = self.native.add_global(ty, None, &name);
        native.set_linkage(Linkage::Internal);
        native.set_initializer(&init);
    }

    /// Declare the native functions of `function`: for HILTI functions
    /// one per block, for bridges the C prototype.
    pub(super) fn declare_function(&mut self, function: &'a Function) {
        let mangled = mangle::function_name(&function.name, function.cc);
        if function.cc.is_bridge() {
            self.declare_bridge(function, &mangled);
            return;
        }

        self.frame_layout(function);
        let linkage = if function.is_declaration() || function.linkage == IrLinkage::Exported {
            Linkage::External
        } else {
            Linkage::Internal
        };
        let ty = self
            .context
            .void_type()
            .fn_type(&[self.ptr_type().into()], false);
        for (i, name) in Self::block_function_names(function, &mangled).into_iter().enumerate() {
            let linkage = if i == 0 { linkage } else { Linkage::Internal };
            let native = self.native.add_function(&name, ty, Some(linkage));
            native.set_call_conventions(CallConv::Fast.llvm_id());
            name_frame_param(native);
        }
    }

    fn declare_bridge(&mut self, function: &Function, mangled: &str) {
        if !function.is_declaration() {
            internal_error(format_args!(
                "{} function {} cannot have a body",
                function.cc, function.name
            ));
        }
        let abi = self.bridge_abi(function);
        let count = abi.native_params(self.context).len();
        if let Err(e) = self.prototypes.check(mangled, count) {
            self.diagnostics.emit_error(e.to_diagnostic(function.location.clone()));
        }
        trace!(name = %mangled, cc = %function.cc, "declare bridge");
        if self.native.get_function(mangled).is_none() {
            let native = self
                .native
                .add_function(mangled, abi.fn_type(self.context), Some(Linkage::External));
            native.set_call_conventions(CallConv::C.llvm_id());
        }
    }

    /// Physical signature of a bridge function.
    pub(super) fn bridge_abi(&self, function: &Function) -> BridgeAbi<'ctx> {
        let c_hilti = function.cc == CallingConvention::CHilti;
        let params = function
            .params
            .iter()
            .map(|p| {
                if c_hilti && self.pool.is_generic(p.ty) {
                    ArgPassing::Erased
                } else {
                    ArgPassing::Direct(self.c_param_type(p.ty))
                }
            })
            .collect();
        let result = function.result(self.pool);
        BridgeAbi {
            params,
            exception_slot: c_hilti,
            ret: (result != Idx::VOID).then(|| self.c_param_type(result)),
        }
    }

    /// Native function name of every block of `function`, entry first.
    fn block_function_names(function: &Function, mangled: &str) -> Vec<String> {
        if function.blocks.is_empty() {
            return vec![mangled.to_owned()];
        }
        function
            .blocks
            .iter()
            .enumerate()
            .map(|(i, block)| {
                if i == 0 {
                    return mangled.to_owned();
                }
                match &block.label {
                    Some(label) => mangle::block_function_name(mangled, label),
                    None => mangle::block_function_name(mangled, &format!("b{i}")),
                }
            })
            .collect()
    }

    pub(super) fn lower_function(&mut self, function: &'a Function) {
        let mangled = mangle::function_name(&function.name, function.cc);
        debug!(function = %function.name, native = %mangled, "lowering function");

        let layout = self.frame_layout(function);
        let blocks = Self::block_function_names(function, &mangled)
            .iter()
            .map(|name| match self.native.get_function(name) {
                Some(native) => native,
                None => internal_error(format_args!("block function @{name} was not declared")),
            })
            .collect();
        let mut labels = FxHashMap::default();
        for (i, block) in function.blocks.iter().enumerate() {
            if let Some(label) = &block.label {
                if labels.insert(label.as_str(), i).is_some() {
                    internal_error(format_args!("label {label} defined twice in {}", function.name));
                }
            }
        }
        self.current = Some(FunctionState {
            function,
            mangled,
            layout,
            blocks,
            labels,
        });

        for (i, block) in function.blocks.iter().enumerate() {
            let native = self.state().blocks[i];
            debug!(block = %native.get_name().to_string_lossy(), "lowering block");
            let entry = self.context.append_basic_block(native, "entry");
            self.builders.push(entry);

            for instruction in &block.instructions {
                self.lower_instruction(instruction);
            }
            if !self.builders.is_absorbing() {
                self.fall_through(i);
            }
            self.builders.pop();
        }
        self.current = None;
    }

    /// Leave block `index` at its end without a terminator.
    fn fall_through(&mut self, index: usize) {
        let state = self.state();
        if let Some(&next) = state.blocks.get(index + 1) {
            let frame = self.frame_ptr();
            self.tail_call(Callee::Direct(next), &[frame]);
        } else if state.function.result(self.pool) == Idx::VOID {
            self.return_with(None);
        } else {
            internal_error(format_args!(
                "{} reaches its end without returning a value",
                state.function.name
            ));
        }
    }

    pub(super) fn lower_instruction(&mut self, instruction: &Instruction) {
        if self.builders.is_absorbing() {
            trace!(%instruction, "unreachable");
            return;
        }
        trace!(%instruction, "lowering");
        let set = self.instructions;
        let signature = match set.validate(self.pool, instruction) {
            Ok(signature) => signature,
            Err(e) => internal_error(format_args!("invalid instruction reached code generation: {e}")),
        };
        let key = signature.key();
        let Some(lower) = self.lowerings.get(key).copied() else {
            internal_error(format_args!("no lowering for instruction {key}"));
        };
        lower(self, instruction);
    }

    /// Native function of the block labeled `label` in the current
    /// function.
    pub(super) fn block_function(&self, label: &str) -> FunctionValue<'ctx> {
        let state = self.state();
        match state.labels.get(label) {
            Some(&i) => state.blocks[i],
            None => internal_error(format_args!(
                "unknown label {label} in {}",
                state.function.name
            )),
        }
    }

    /// The frame of the current function; parameter 0 of every native
    /// function generated from it.
    pub(super) fn frame_ptr(&self) -> BasicValueEnum<'ctx> {
        if self.builders.is_absorbing() {
            return self.ptr_type().get_undef().into();
        }
        match self.insert_function().get_first_param() {
            Some(frame) => frame,
            None => internal_error("native function without a frame parameter"),
        }
    }
}

pub(super) fn name_frame_param(function: FunctionValue<'_>) {
    if let Some(frame) = function.get_first_param() {
        frame.set_name("frame");
    }
}

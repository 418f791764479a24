//! Calls between HILTI functions and across the native boundary.

use inkwell::module::Linkage;
use inkwell::types::{BasicMetadataTypeEnum, BasicTypeEnum};
use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum, FunctionValue, PointerValue};
use tracing::trace;

use hilti_diagnostic::internal_error;
use hilti_ir::{Function, Operand};
use hilti_types::{Idx, Tag};

use super::function::name_frame_param;
use super::{Callee, CodeGen};
use crate::abi::{ArgPassing, CallConv};
use crate::frame::{
    continuation_type, CONT_FRAME, CONT_SUCCESSOR, FRAME_CONT_EXCEPT, FRAME_CONT_NORMAL,
    FRAME_EXCEPTION,
};
use crate::mangle;

impl<'a, 'ctx> CodeGen<'a, 'ctx> {
    /// Call a HILTI function.
    ///
    /// The callee gets a fresh frame whose normal continuation resumes
    /// the caller in a new return function and whose exception
    /// continuation is the caller's. Lowering of the caller's block then
    /// continues inside the return function.
    pub(super) fn call_hilti(&mut self, callee: &Function, args: &[Operand], target: Option<&Operand>) {
        let callee_fn = self.native_function(&mangle::function_name(&callee.name, callee.cc));
        let layout = self.frame_layout(callee);
        let frame_ty = layout.ty();

        let values: Vec<BasicValueEnum<'ctx>> = args.iter().map(|a| self.operand_value(a)).collect();
        let frame = self.malloc(frame_ty.into());
        for (param, value) in callee.params.iter().zip(values) {
            let Some(index) = layout.field_index(&param.name) else {
                internal_error(format_args!("{} has no parameter slot {param}", callee.name));
            };
            let slot = self.field_ptr(frame_ty, frame, &[index]);
            self.store(value, slot);
        }

        // The callee's return continuation passes its result whether or
        // not this call keeps it.
        let result = callee.result(self.pool);
        let result_ty = (result != Idx::VOID).then(|| self.storage_type(result));
        let resume = self.resume_function(result_ty);

        let own = self.frame_ptr().into_pointer_value();
        let succ = self.field_ptr(frame_ty, frame, &[FRAME_CONT_NORMAL, CONT_SUCCESSOR]);
        self.store(resume.as_global_value().as_pointer_value().into(), succ);
        let cont_frame = self.field_ptr(frame_ty, frame, &[FRAME_CONT_NORMAL, CONT_FRAME]);
        self.store(own.into(), cont_frame);

        let own_ty = self.state().layout.ty();
        let own_except = self.field_ptr(own_ty, own, &[FRAME_CONT_EXCEPT]);
        let except = self.load(continuation_type(self.context).into(), own_except);
        let callee_except = self.field_ptr(frame_ty, frame, &[FRAME_CONT_EXCEPT]);
        self.store(except, callee_except);
        let exception = self.field_ptr(frame_ty, frame, &[FRAME_EXCEPTION]);
        self.store(self.ptr_type().const_null().into(), exception);

        trace!(callee = %callee.name, "tail call into callee");
        self.tail_call(Callee::Direct(callee_fn), &[frame.into()]);

        let entry = self.context.append_basic_block(resume, "entry");
        self.builders.replace_top(Some(entry));
        if let Some(target) = target {
            let Some(result) = resume.get_nth_param(1) else {
                internal_error(format_args!("{} returns no value", callee.name));
            };
            self.store_target(target, result);
        }
    }

    /// Fresh `__<caller>_l<n>_return` taking the frame and, for
    /// value-returning callees, the result.
    fn resume_function(&mut self, result: Option<BasicTypeEnum<'ctx>>) -> FunctionValue<'ctx> {
        let label = self.new_label("return");
        let name = mangle::block_function_name(&self.state().mangled, &label);
        let mut params: Vec<BasicMetadataTypeEnum<'ctx>> = vec![self.ptr_type().into()];
        params.extend(result.map(Into::into));
        let ty = self.context.void_type().fn_type(&params, false);

        let resume = self.native.add_function(&name, ty, Some(Linkage::Internal));
        resume.set_call_conventions(CallConv::Fast.llvm_id());
        name_frame_param(resume);
        resume
    }

    /// Call a C or C-HILTI function. C-HILTI calls pass generic
    /// arguments as (type info, pointer to a copy) and get a pointer to
    /// the frame's exception slot, which is tested after the call.
    pub(super) fn call_bridge(&mut self, callee: &Function, args: &[Operand], target: Option<&Operand>) {
        let callee_fn = self.native_function(&mangle::function_name(&callee.name, callee.cc));
        let abi = self.bridge_abi(callee);

        let mut native_args: Vec<BasicValueEnum<'ctx>> = Vec::with_capacity(args.len() + 1);
        for ((param, passing), arg) in callee.params.iter().zip(&abi.params).zip(args) {
            match passing {
                ArgPassing::Direct(_) => {
                    let value = self.operand_value(arg);
                    native_args.push(self.c_value(value, param.ty));
                }
                ArgPassing::Erased => {
                    let ty = arg.ty();
                    native_args.push(self.type_info_ptr(ty).into());
                    let value = self.operand_value(arg);
                    let copy = self.alloca(self.storage_type(ty));
                    self.store(value, copy);
                    native_args.push(copy.into());
                }
            }
        }

        let slot = if abi.exception_slot {
            let frame = self.frame_ptr().into_pointer_value();
            let frame_ty = self.state().layout.ty();
            let slot = self.field_ptr(frame_ty, frame, &[FRAME_EXCEPTION]);
            self.store(self.ptr_type().const_null().into(), slot);
            native_args.push(slot.into());
            Some(slot)
        } else {
            None
        };

        let result = self.builders.live().and_then(|builder| {
            let args: Vec<BasicMetadataValueEnum<'ctx>> =
                native_args.iter().map(|&a| a.into()).collect();
            let call = builder.build_call(callee_fn, &args, "").expect("bridge call");
            call.set_call_convention(CallConv::C.llvm_id());
            call.try_as_basic_value().basic()
        });

        if let Some(slot) = slot {
            self.exception_test(slot);
        }
        if let (Some(target), Some(result)) = (target, result) {
            let value = self.from_c_value(result, callee.result(self.pool));
            self.store_target(target, value);
        }
    }

    /// Branch to a raise if the exception slot at `slot` is set; lowering
    /// continues on the path where it is not.
    fn exception_test(&mut self, slot: PointerValue<'ctx>) {
        let exception = self.load(self.ptr_type().into(), slot);
        let function = self.insert_function();
        let excpt_label = self.new_label("excpt");
        let noexcpt_label = self.new_label("noexcpt");
        let excpt = self.context.append_basic_block(function, &excpt_label);
        let noexcpt = self.context.append_basic_block(function, &noexcpt_label);
        if let Some(builder) = self.builders.live() {
            let is_set = builder
                .build_is_not_null(exception.into_pointer_value(), "")
                .expect("null test");
            builder
                .build_conditional_branch(is_set, excpt, noexcpt)
                .expect("branch");
        }

        self.builders.push(excpt);
        self.raise(exception);
        self.builders.pop();
        self.builders.replace_top(Some(noexcpt));
    }

    /// Convert a value to its C argument form; identity unless the
    /// `c_value` table has a handler.
    pub(super) fn c_value(&mut self, value: BasicValueEnum<'ctx>, ty: Idx) -> BasicValueEnum<'ctx> {
        match self.tables.c_value.find(self.pool, ty) {
            Some(hook) => hook(self, value, ty),
            None => value,
        }
    }

    /// Convert a C result back to storage form.
    fn from_c_value(&mut self, value: BasicValueEnum<'ctx>, ty: Idx) -> BasicValueEnum<'ctx> {
        let (BasicValueEnum::IntValue(int), BasicTypeEnum::IntType(storage)) =
            (value, self.storage_type(ty))
        else {
            return value;
        };
        if int.get_type().get_bit_width() <= storage.get_bit_width() {
            return value;
        }
        match self.builders.live() {
            Some(builder) => builder
                .build_int_truncate(int, storage, "")
                .expect("trunc")
                .into(),
            None => storage.get_undef().into(),
        }
    }

    /// The HILTI function a `call` operand names.
    pub(super) fn callee(&self, operand: &Operand) -> &'a Function {
        let Some(id) = operand.as_id() else {
            internal_error(format_args!("cannot call {operand}"));
        };
        if self.pool.tag(id.ty) != Tag::Function {
            internal_error(format_args!("{id} is not a function"));
        }
        match self.unit().function(&id.name) {
            Some(function) => function,
            None => internal_error(format_args!("unknown function {id}")),
        }
    }

    fn native_function(&self, name: &str) -> FunctionValue<'ctx> {
        match self.native.get_function(name) {
            Some(function) => function,
            None => internal_error(format_args!("@{name} was not declared")),
        }
    }
}

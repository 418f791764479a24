//! Native glue between a C caller and a HILTI entry function.
//!
//! For every entry `E` three functions are added to the module:
//!
//! - `__hlt_run_E(ptr record, ptr argv)`, `ccc`: builds the entry frame
//!   from the argument words, points both of its continuations at a
//!   sentinel frame on the native stack and calls `E`.
//! - `__hlt_exit_E(ptr sentinel [, result])`, `fastcc`: the normal
//!   continuation; records state 1 and the result word.
//! - `__hlt_exit_exception_E(ptr sentinel)`, `fastcc`: the exception
//!   continuation; records state 2 and the exception.
//!
//! The sentinel's normal continuation frame holds the record pointer.

use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, IntType, StructType};
use inkwell::values::{BasicValueEnum, FunctionValue, IntValue, PointerValue};
use inkwell::AddressSpace;

use crate::abi::CallConv;
use crate::codegen::EntrySignature;
use crate::frame::{
    base_frame_type, CONT_FRAME, CONT_SUCCESSOR, FRAME_CONT_EXCEPT, FRAME_CONT_NORMAL,
    FRAME_EXCEPTION, FRAME_FIRST_LOCAL,
};
use crate::runtime_decl;

use super::ExecError;

pub(super) const RECORD_STATE: u32 = 0;
pub(super) const RECORD_RESULT: u32 = 1;
pub(super) const RECORD_EXCEPTION: u32 = 2;

pub(super) const STATE_RETURNED: i64 = 1;
pub(super) const STATE_RAISED: i64 = 2;

pub(super) fn run_name(entry: &str) -> String {
    format!("__hlt_run_{entry}")
}

/// Emission state for the harness of one entry.
struct Harness<'m, 'ctx> {
    context: &'ctx Context,
    module: &'m Module<'ctx>,
    builder: Builder<'ctx>,
    i64t: IntType<'ctx>,
}

/// Add the harness functions of `entry` to `module`.
pub(super) fn build<'ctx>(
    context: &'ctx Context,
    module: &Module<'ctx>,
    entry: &EntrySignature<'ctx>,
) -> Result<(), ExecError> {
    let Some(callee) = module.get_function(&entry.name) else {
        return Err(ExecError::UnknownEntry(entry.name.clone()));
    };
    for ty in entry.params.iter().chain(&entry.result) {
        check_scalar(*ty)?;
    }
    let h = Harness {
        context,
        module,
        builder: context.create_builder(),
        i64t: context.i64_type(),
    };
    let exit = h.exit(entry);
    let exit_exception = h.exit_exception(entry);
    h.run(entry, callee, exit, exit_exception);
    Ok(())
}

/// Only scalars cross the harness as one word.
fn check_scalar(ty: BasicTypeEnum<'_>) -> Result<(), ExecError> {
    match ty {
        BasicTypeEnum::IntType(t) if t.get_bit_width() <= 64 => Ok(()),
        BasicTypeEnum::FloatType(_) | BasicTypeEnum::PointerType(_) => Ok(()),
        other => Err(ExecError::Unsupported(format!("{other:?}"))),
    }
}

impl<'ctx> Harness<'_, 'ctx> {
    fn ptr(&self) -> BasicTypeEnum<'ctx> {
        self.context.ptr_type(AddressSpace::default()).into()
    }

    /// `{ i64 state, i64 result, ptr exception }`
    fn record_type(&self) -> StructType<'ctx> {
        let i64t = self.i64t.into();
        self.context.struct_type(&[i64t, i64t, self.ptr()], false)
    }

    fn fast_function(&self, name: &str, params: &[BasicMetadataTypeEnum<'ctx>]) -> FunctionValue<'ctx> {
        let ty = self.context.void_type().fn_type(params, false);
        let function = self.module.add_function(name, ty, Some(Linkage::Internal));
        function.set_call_conventions(CallConv::Fast.llvm_id());
        self.builder
            .position_at_end(self.context.append_basic_block(function, "entry"));
        function
    }

    fn gep(
        &self,
        ty: StructType<'ctx>,
        ptr: PointerValue<'ctx>,
        path: &[u32],
    ) -> PointerValue<'ctx> {
        let mut current_ty = ty;
        let mut current = ptr;
        for (depth, &index) in path.iter().enumerate() {
            current = self
                .builder
                .build_struct_gep(current_ty, current, index, "")
                .expect("struct gep");
            if depth + 1 < path.len() {
                if let Some(BasicTypeEnum::StructType(inner)) = current_ty.get_field_type_at_index(index) {
                    current_ty = inner;
                }
            }
        }
        current
    }

    /// The record behind the sentinel `sentinel`.
    fn record(&self, sentinel: PointerValue<'ctx>) -> PointerValue<'ctx> {
        let slot = self.gep(base_frame_type(self.context), sentinel, &[FRAME_CONT_NORMAL, CONT_FRAME]);
        self.builder
            .build_load(self.ptr(), slot, "record")
            .expect("load")
            .into_pointer_value()
    }

    fn set_state(&self, record: PointerValue<'ctx>, state: i64) {
        let slot = self.gep(self.record_type(), record, &[RECORD_STATE]);
        self.builder
            .build_store(slot, self.i64t.const_int(state as u64, true))
            .expect("store");
    }

    fn exit(&self, entry: &EntrySignature<'ctx>) -> FunctionValue<'ctx> {
        let mut params: Vec<BasicMetadataTypeEnum<'ctx>> = vec![self.ptr().into()];
        params.extend(entry.result.map(Into::into));
        let exit = self.fast_function(&format!("__hlt_exit_{}", entry.name), &params);

        let sentinel = param(exit, 0).into_pointer_value();
        let record = self.record(sentinel);
        self.set_state(record, STATE_RETURNED);
        if let Some(result) = exit.get_nth_param(1) {
            let word = self.to_word(result);
            let slot = self.gep(self.record_type(), record, &[RECORD_RESULT]);
            self.builder.build_store(slot, word).expect("store");
        }
        self.builder.build_return(None).expect("ret");
        exit
    }

    fn exit_exception(&self, entry: &EntrySignature<'ctx>) -> FunctionValue<'ctx> {
        let exit = self.fast_function(
            &format!("__hlt_exit_exception_{}", entry.name),
            &[self.ptr().into()],
        );
        let sentinel = param(exit, 0).into_pointer_value();
        let record = self.record(sentinel);
        self.set_state(record, STATE_RAISED);
        let slot = self.gep(base_frame_type(self.context), sentinel, &[FRAME_EXCEPTION]);
        let exception = self.builder.build_load(self.ptr(), slot, "").expect("load");
        let dest = self.gep(self.record_type(), record, &[RECORD_EXCEPTION]);
        self.builder.build_store(dest, exception).expect("store");
        self.builder.build_return(None).expect("ret");
        exit
    }

    fn run(
        &self,
        entry: &EntrySignature<'ctx>,
        callee: FunctionValue<'ctx>,
        exit: FunctionValue<'ctx>,
        exit_exception: FunctionValue<'ctx>,
    ) {
        let ty = self
            .context
            .void_type()
            .fn_type(&[self.ptr().into(), self.ptr().into()], false);
        let run = self.module.add_function(&run_name(&entry.name), ty, Some(Linkage::External));
        self.builder
            .position_at_end(self.context.append_basic_block(run, "entry"));
        let record = param(run, 0).into_pointer_value();
        let argv = param(run, 1).into_pointer_value();

        let base = base_frame_type(self.context);
        let sentinel = self.builder.build_alloca(base, "sentinel").expect("alloca");
        let slot = self.gep(base, sentinel, &[FRAME_CONT_NORMAL, CONT_FRAME]);
        self.builder.build_store(slot, record).expect("store");

        let size = BasicType::size_of(&entry.frame).expect("frames are sized structs");
        let malloc = runtime_decl::declare_by_name(self.context, self.module, runtime_decl::MALLOC)
            .expect("allocator is a runtime function");
        let frame = self
            .builder
            .build_call(malloc, &[size.into()], "frame")
            .expect("call")
            .try_as_basic_value()
            .basic()
            .expect("allocator returns a pointer")
            .into_pointer_value();

        for (field, successor) in [(FRAME_CONT_NORMAL, exit), (FRAME_CONT_EXCEPT, exit_exception)] {
            let succ = self.gep(entry.frame, frame, &[field, CONT_SUCCESSOR]);
            let target = self.gep(entry.frame, frame, &[field, CONT_FRAME]);
            self.builder
                .build_store(succ, successor.as_global_value().as_pointer_value())
                .expect("store");
            self.builder.build_store(target, sentinel).expect("store");
        }
        let exception = self.gep(entry.frame, frame, &[FRAME_EXCEPTION]);
        self.builder
            .build_store(exception, self.context.ptr_type(AddressSpace::default()).const_null())
            .expect("store");

        let words: Vec<BasicTypeEnum<'ctx>> = vec![self.i64t.into(); entry.params.len()];
        let argv_ty = self.context.struct_type(&words, false);
        for (i, &ty) in entry.params.iter().enumerate() {
            let i = i as u32;
            let src = self.gep(argv_ty, argv, &[i]);
            let word = self
                .builder
                .build_load(self.i64t, src, "")
                .expect("load")
                .into_int_value();
            let value = self.from_word(word, ty);
            let dest = self.gep(entry.frame, frame, &[FRAME_FIRST_LOCAL + i]);
            self.builder.build_store(dest, value).expect("store");
        }

        let call = self
            .builder
            .build_call(callee, &[frame.into()], "")
            .expect("call");
        call.set_call_convention(CallConv::Fast.llvm_id());
        self.builder.build_return(None).expect("ret");
    }

    fn to_word(&self, value: BasicValueEnum<'ctx>) -> IntValue<'ctx> {
        let b = &self.builder;
        match value {
            BasicValueEnum::IntValue(v) if v.get_type().get_bit_width() == 1 => {
                b.build_int_z_extend(v, self.i64t, "").expect("zext")
            }
            BasicValueEnum::IntValue(v) if v.get_type().get_bit_width() < 64 => {
                b.build_int_s_extend(v, self.i64t, "").expect("sext")
            }
            BasicValueEnum::IntValue(v) => v,
            BasicValueEnum::FloatValue(v) => b
                .build_bit_cast(v, self.i64t, "")
                .expect("bitcast")
                .into_int_value(),
            BasicValueEnum::PointerValue(v) => b.build_ptr_to_int(v, self.i64t, "").expect("ptrtoint"),
            other => unreachable!("non-scalar {other:?} passed the scalar check"),
        }
    }

    fn from_word(&self, word: IntValue<'ctx>, ty: BasicTypeEnum<'ctx>) -> BasicValueEnum<'ctx> {
        let b = &self.builder;
        match ty {
            BasicTypeEnum::IntType(t) if t.get_bit_width() < 64 => {
                b.build_int_truncate(word, t, "").expect("trunc").into()
            }
            BasicTypeEnum::IntType(_) => word.into(),
            BasicTypeEnum::FloatType(t) => b.build_bit_cast(word, t, "").expect("bitcast"),
            BasicTypeEnum::PointerType(t) => b.build_int_to_ptr(word, t, "").expect("inttoptr").into(),
            other => unreachable!("non-scalar {other:?} passed the scalar check"),
        }
    }
}

fn param(function: FunctionValue<'_>, index: u32) -> BasicValueEnum<'_> {
    function
        .get_nth_param(index)
        .expect("harness functions are declared with their parameters")
}

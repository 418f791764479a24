//! The code generation session.
//!
//! One [`CodeGen`] lowers one unit at a time: [`CodeGen::reset`] clears
//! the per-unit state, [`CodeGen::visit`] lowers every function of the
//! unit and [`CodeGen::finalize`] emits the type descriptors, optionally
//! verifies, and hands out the LLVM module.
//!
//! # Lowering model
//!
//! Each HILTI block becomes its own `fastcc` native function taking the
//! frame pointer. The entry block is named after the function, later
//! blocks `__<function>_<label>`. Control never returns through native
//! `ret`: fall-through, jumps, calls, returns and raises are all tail
//! calls, each immediately followed by `ret void`.

mod calls;
mod function;
mod instructions;
mod metadata;
mod operands;


use std::rc::Rc;

use inkwell::context::Context;
use inkwell::module::{Linkage, Module as NativeModule};
use inkwell::types::{BasicType, BasicTypeEnum, FunctionType, PointerType, StructType};
use inkwell::values::{
    BasicMetadataValueEnum, BasicValueEnum, FunctionValue, GlobalValue, PointerValue,
};
use inkwell::AddressSpace;
use rustc_hash::FxHashMap;
use tracing::debug;

use hilti_diagnostic::{internal_error, Diagnostic, DiagnosticQueue, ErrorGuaranteed};
use hilti_ir::{Function, InstructionSet, Module};
use hilti_types::{Idx, TypeInfo, TypePool};

use crate::abi::CallConv;
use crate::builder::{undef, BuilderStack};
use crate::frame::FrameLayout;
use crate::mangle;
use crate::prototypes::PrototypeIndex;
use crate::runtime_decl;
use crate::tables::{LowerFn, Tables};
use crate::verify::verify;
use crate::CodegenOptions;

use instructions::builtin_lowerings;

/// Target of a tail call.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Callee<'ctx> {
    Direct(FunctionValue<'ctx>),
    /// A successor loaded from a continuation.
    Indirect(PointerValue<'ctx>, FunctionType<'ctx>),
}

/// State of the HILTI function being lowered.
struct FunctionState<'a, 'ctx> {
    function: &'a Function,
    mangled: String,
    layout: Rc<FrameLayout<'ctx>>,
    /// Native function of each HILTI block, in block order.
    blocks: Vec<FunctionValue<'ctx>>,
    /// Block index by label.
    labels: FxHashMap<&'a str, usize>,
}

/// How the harness of an executor enters a HILTI function: the native
/// entry, its frame and the storage types of parameters and result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntrySignature<'ctx> {
    pub name: String,
    pub frame: StructType<'ctx>,
    pub params: Vec<BasicTypeEnum<'ctx>>,
    pub result: Option<BasicTypeEnum<'ctx>>,
}

/// A code generation session.
pub struct CodeGen<'a, 'ctx> {
    context: &'ctx Context,
    pool: &'a TypePool,
    instructions: &'a InstructionSet,
    options: CodegenOptions,
    tables: Tables<'ctx>,
    lowerings: FxHashMap<&'static str, LowerFn<'ctx>>,
    prototypes: PrototypeIndex,
    diagnostics: DiagnosticQueue,

    // Per-unit state, cleared by `reset`.
    unit: Option<&'a Module>,
    native: NativeModule<'ctx>,
    pub(crate) builders: BuilderStack<'ctx>,
    frames: FxHashMap<String, Rc<FrameLayout<'ctx>>>,
    strings: FxHashMap<String, GlobalValue<'ctx>>,
    next_label: u32,
    next_const: u32,
    current: Option<FunctionState<'a, 'ctx>>,
}

impl<'a, 'ctx> CodeGen<'a, 'ctx> {
    pub fn new(
        context: &'ctx Context,
        pool: &'a TypePool,
        instructions: &'a InstructionSet,
        options: CodegenOptions,
    ) -> Self {
        let prototypes = PrototypeIndex::load(&options.lib_paths);
        let mut cg = CodeGen {
            context,
            pool,
            instructions,
            options,
            tables: Tables::builtin(),
            lowerings: builtin_lowerings(),
            prototypes,
            diagnostics: DiagnosticQueue::new(),
            unit: None,
            native: context.create_module(""),
            builders: BuilderStack::new(context),
            frames: FxHashMap::default(),
            strings: FxHashMap::default(),
            next_label: 0,
            next_const: 0,
            current: None,
        };
        cg.reset();
        if cg.options.dump_ir {
            debug!("C argument mapping:\n{}", cg.tables.document_c_mapping(pool));
        }
        cg
    }

    pub fn context(&self) -> &'ctx Context {
        self.context
    }

    pub fn pool(&self) -> &'a TypePool {
        self.pool
    }

    pub fn options(&self) -> &CodegenOptions {
        &self.options
    }

    pub fn tables(&self) -> &Tables<'ctx> {
        &self.tables
    }

    /// Register additional lowering handlers. Handlers registered later
    /// only win where no earlier entry matches.
    pub fn tables_mut(&mut self) -> &mut Tables<'ctx> {
        &mut self.tables
    }

    /// Lower instructions whose signature key is `key` with `lower`.
    pub fn register_lowering(&mut self, key: &'static str, lower: LowerFn<'ctx>) {
        self.lowerings.insert(key, lower);
    }

    pub fn prototypes_mut(&mut self) -> &mut PrototypeIndex {
        &mut self.prototypes
    }

    /// Diagnostics of the current unit.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.diagnostics()
    }

    // ── Session ─────────────────────────────────────────────────────

    /// Forget everything about the previous unit.
    pub fn reset(&mut self) {
        self.unit = None;
        self.native = self.context.create_module("");
        runtime_decl::declare_by_name(self.context, &self.native, runtime_decl::MALLOC);
        self.builders.clear();
        self.frames.clear();
        self.strings.clear();
        self.next_label = 0;
        self.next_const = 0;
        self.current = None;
        self.diagnostics = DiagnosticQueue::new();
    }

    /// Lower every function of `unit` into the native module.
    pub fn visit(&mut self, unit: &'a Module) {
        debug!(module = %unit.name, "lowering module");
        self.unit = Some(unit);
        self.native.set_name(&unit.name);

        for global in &unit.globals {
            self.declare_global(global);
        }
        // All functions first, so that calls may refer forward.
        for function in &unit.functions {
            self.declare_function(function);
        }
        for function in &unit.functions {
            if !function.is_declaration() {
                self.lower_function(function);
            }
        }
    }

    /// Emit the type descriptors and hand out the module.
    ///
    /// Fails if `verify` is set and verification fails, or if lowering
    /// reported errors. The diagnostics stay available through
    /// [`CodeGen::diagnostics`].
    pub fn finalize(&mut self, verify_module: bool) -> Result<NativeModule<'ctx>, ErrorGuaranteed> {
        self.emit_type_infos();
        let module = std::mem::replace(&mut self.native, self.context.create_module(""));

        if self.options.dump_ir {
            debug!(
                module = %module.get_name().to_string_lossy(),
                "native module:\n{}",
                module.print_to_string().to_string()
            );
        }
        if verify_module {
            if let Err(e) = verify(&module) {
                debug!(error = %e, "verification failed");
                return Err(self.diagnostics.emit_error(e.to_diagnostic()));
            }
        }
        if let Some(guarantee) = ErrorGuaranteed::from_error_count(self.diagnostics.error_count()) {
            return Err(guarantee);
        }
        Ok(module)
    }

    /// `reset`, `visit` and `finalize` with the session's verify option.
    pub fn compile(&mut self, unit: &'a Module) -> Result<NativeModule<'ctx>, ErrorGuaranteed> {
        self.reset();
        self.visit(unit);
        self.finalize(self.options.verify)
    }

    // ── Types ───────────────────────────────────────────────────────

    pub fn storage_type(&self, ty: Idx) -> BasicTypeEnum<'ctx> {
        let hook = self.tables.storage.get(self.pool, ty);
        hook(self, ty)
    }

    pub fn c_param_type(&self, ty: Idx) -> BasicTypeEnum<'ctx> {
        let hook = self.tables.c_param.get(self.pool, ty);
        hook(self, ty)
    }

    /// Runtime descriptor of `ty`, with its conversion hooks.
    pub fn type_info(&self, ty: Idx) -> TypeInfo {
        let hook = self.tables.type_info.get(self.pool, ty);
        hook(self.pool, ty)
    }

    pub(crate) fn ptr_type(&self) -> PointerType<'ctx> {
        self.context.ptr_type(AddressSpace::default())
    }

    /// Frame layout of `function`, computed once per unit.
    pub fn frame_layout(&mut self, function: &Function) -> Rc<FrameLayout<'ctx>> {
        let mangled = mangle::function_name(&function.name, function.cc);
        if let Some(layout) = self.frames.get(&mangled) {
            return Rc::clone(layout);
        }
        let slots: Vec<(String, BasicTypeEnum<'ctx>)> = function
            .ids()
            .map(|id| (id.name.clone(), self.storage_type(id.ty)))
            .collect();
        let layout = Rc::new(FrameLayout::new(
            self.context,
            &mangle::frame_type_name(&mangled),
            slots,
        ));
        debug!(%layout, "frame layout");
        self.frames.insert(mangled, Rc::clone(&layout));
        layout
    }

    /// How to enter the HILTI function `function` from outside.
    pub fn entry_signature(&mut self, function: &Function) -> EntrySignature<'ctx> {
        if function.cc.is_bridge() {
            internal_error(format_args!("{} is not a HILTI function", function.name));
        }
        let layout = self.frame_layout(function);
        let result = function.result(self.pool);
        EntrySignature {
            name: mangle::function_name(&function.name, function.cc),
            frame: layout.ty(),
            params: function.params.iter().map(|p| self.storage_type(p.ty)).collect(),
            result: (result != Idx::VOID).then(|| self.storage_type(result)),
        }
    }

    // ── Emission ────────────────────────────────────────────────────

    pub(crate) fn load(&mut self, ty: BasicTypeEnum<'ctx>, ptr: PointerValue<'ctx>) -> BasicValueEnum<'ctx> {
        match self.builders.live() {
            Some(builder) => builder.build_load(ty, ptr, "").expect("load"),
            None => undef(ty),
        }
    }

    pub(crate) fn store(&mut self, value: BasicValueEnum<'ctx>, ptr: PointerValue<'ctx>) {
        if let Some(builder) = self.builders.live() {
            builder.build_store(ptr, value).expect("store");
        }
    }

    /// Address of the field at `path` of the struct `ty` that `ptr`
    /// points at.
    pub(crate) fn field_ptr(
        &mut self,
        ty: StructType<'ctx>,
        ptr: PointerValue<'ctx>,
        path: &[u32],
    ) -> PointerValue<'ctx> {
        let Some(builder) = self.builders.live() else {
            return self.ptr_type().get_undef();
        };
        let mut current_ty = ty;
        let mut current = ptr;
        for (depth, &index) in path.iter().enumerate() {
            current = builder
                .build_struct_gep(current_ty, current, index, "")
                .expect("struct gep");
            if depth + 1 < path.len() {
                current_ty = match current_ty.get_field_type_at_index(index) {
                    Some(BasicTypeEnum::StructType(inner)) => inner,
                    other => internal_error(format_args!("field path through {other:?}")),
                };
            }
        }
        current
    }

    /// Heap cell for a value of `ty`, from the runtime allocator.
    pub(crate) fn malloc(&mut self, ty: BasicTypeEnum<'ctx>) -> PointerValue<'ctx> {
        let Some(size) = BasicType::size_of(&ty) else {
            internal_error(format_args!("{ty:?} has no size"));
        };
        let malloc = runtime_decl::declare_by_name(self.context, &self.native, runtime_decl::MALLOC);
        let (Some(builder), Some(malloc)) = (self.builders.live(), malloc) else {
            return self.ptr_type().get_undef();
        };
        builder
            .build_call(malloc, &[size.into()], "")
            .expect("malloc")
            .try_as_basic_value()
            .basic()
            .map_or_else(|| internal_error("malloc returns no value"), BasicValueEnum::into_pointer_value)
    }

    /// Stack cell for a value of `ty` in the current native function.
    pub(crate) fn alloca(&mut self, ty: BasicTypeEnum<'ctx>) -> PointerValue<'ctx> {
        match self.builders.live() {
            Some(builder) => builder.build_alloca(ty, "").expect("alloca"),
            None => self.ptr_type().get_undef(),
        }
    }

    /// `tail call` + `ret void`, after which the current block is done.
    pub(crate) fn tail_call(&mut self, callee: Callee<'ctx>, args: &[BasicValueEnum<'ctx>]) {
        if let Some(builder) = self.builders.live() {
            let args: Vec<BasicMetadataValueEnum<'ctx>> = args.iter().map(|&a| a.into()).collect();
            let call = match callee {
                Callee::Direct(function) => builder.build_call(function, &args, ""),
                Callee::Indirect(ptr, ty) => builder.build_indirect_call(ty, ptr, &args, ""),
            }
            .expect("tail call");
            call.set_call_convention(CallConv::Fast.llvm_id());
            call.set_tail_call(true);
            builder.build_return(None).expect("ret void");
        }
        self.builders.replace_top(None);
    }

    /// Function of the current insertion point.
    fn insert_function(&self) -> FunctionValue<'ctx> {
        match self.builders.top().and_then(|block| block.get_parent()) {
            Some(function) => function,
            None => internal_error("no insertion point while absorbing"),
        }
    }

    /// Fresh label `l<n>_<postfix>`, unique within the unit.
    pub(crate) fn new_label(&mut self, postfix: &str) -> String {
        self.next_label += 1;
        format!("l{}_{postfix}", self.next_label)
    }

    /// Pointer to a constant global holding `{ i64 len, [len x i8] }`.
    pub(crate) fn string_constant(&mut self, text: &str) -> PointerValue<'ctx> {
        if let Some(global) = self.strings.get(text) {
            return global.as_pointer_value();
        }
        self.next_const += 1;
        let name = format!("__hlt_string_{}", self.next_const);
        let len = self.context.i64_type().const_int(text.len() as u64, false);
        let data = self.context.const_string(text.as_bytes(), false);
        let init = self.context.const_struct(&[len.into(), data.into()], false);

        let global = self.native.add_global(init.get_type(), None, &name);
        global.set_linkage(Linkage::Internal);
        global.set_constant(true);
        global.set_initializer(&init);
        self.strings.insert(text.to_owned(), global);
        global.as_pointer_value()
    }

    fn unit(&self) -> &'a Module {
        match self.unit {
            Some(unit) => unit,
            None => internal_error("no unit is being lowered"),
        }
    }

    fn state(&self) -> &FunctionState<'a, 'ctx> {
        match &self.current {
            Some(state) => state,
            None => internal_error("no function is being lowered"),
        }
    }
}

//! Operands, assignment targets and continuations.

use inkwell::types::BasicMetadataTypeEnum;
use inkwell::values::{BasicValueEnum, PointerValue};

use hilti_diagnostic::internal_error;
use hilti_ir::{ConstValue, Constant, Id, IdRole, ModuleItem, Operand, TupleOperand};
use hilti_types::{Idx, Tag};

use super::{Callee, CodeGen};
use crate::frame::{
    base_frame_type, CONT_FRAME, CONT_SUCCESSOR, FRAME_CONT_EXCEPT, FRAME_CONT_NORMAL,
    FRAME_EXCEPTION,
};
use crate::mangle;

impl<'a, 'ctx> CodeGen<'a, 'ctx> {
    /// Native value of an operand.
    pub(crate) fn operand_value(&mut self, operand: &Operand) -> BasicValueEnum<'ctx> {
        match operand {
            Operand::Const(Constant {
                value: ConstValue::Label(label),
                ..
            }) => internal_error(format_args!("label @{label} used as a value")),
            Operand::Const(Constant { ty, .. }) | Operand::Tuple(TupleOperand { ty, .. }) => {
                let hook = self.tables.ctor_expr.get(self.pool, *ty);
                hook(self, operand)
            }
            Operand::Id(id) => self.id_value(id),
            Operand::Type(t) => internal_error(format_args!(
                "type {} used as a value",
                self.pool.name(t.referenced)
            )),
        }
    }

    fn id_value(&mut self, id: &Id) -> BasicValueEnum<'ctx> {
        match id.role {
            IdRole::Local | IdRole::Param => {
                let ptr = self.frame_slot(id);
                self.load(self.storage_type(id.ty), ptr)
            }
            IdRole::Global => {
                let ptr = self.global_ptr(id);
                self.load(self.storage_type(id.ty), ptr)
            }
            IdRole::Function => {
                let name = match self.unit().lookup(&id.name) {
                    Some(ModuleItem::Function(f)) => mangle::function_name(&f.name, f.cc),
                    _ => internal_error(format_args!("unknown function {id}")),
                };
                match self.native.get_function(&name) {
                    Some(f) => f.as_global_value().as_pointer_value().into(),
                    None => internal_error(format_args!("@{name} was not declared")),
                }
            }
        }
    }

    /// Store `value` into the location `target` names.
    pub(crate) fn store_target(&mut self, target: &Operand, value: BasicValueEnum<'ctx>) {
        let ptr = match target.as_id() {
            Some(id) if id.is_frame_slot() => self.frame_slot(id),
            Some(id) if id.role == IdRole::Global => self.global_ptr(id),
            _ => internal_error(format_args!("cannot assign to {target}")),
        };
        self.store(value, ptr);
    }

    /// Address of the frame field of a local or parameter.
    fn frame_slot(&mut self, id: &Id) -> PointerValue<'ctx> {
        let layout = std::rc::Rc::clone(&self.state().layout);
        let Some(index) = layout.field_index(&id.name) else {
            internal_error(format_args!(
                "unknown identifier {id} in {}",
                self.state().function.name
            ));
        };
        let frame = self.frame_ptr().into_pointer_value();
        self.field_ptr(layout.ty(), frame, &[index])
    }

    fn global_ptr(&self, id: &Id) -> PointerValue<'ctx> {
        let unit = self.unit();
        let name = mangle::global_name(&unit.name, &id.name);
        match self.native.get_global(&name) {
            Some(global) if unit.global(&id.name).is_some() => global.as_pointer_value(),
            _ => internal_error(format_args!("unknown global {id} in module {}", unit.name)),
        }
    }

    /// Pointer to the runtime descriptor of `ty`; references use the
    /// descriptor of the referenced type.
    pub(crate) fn type_info_ptr(&mut self, ty: Idx) -> PointerValue<'ctx> {
        let ty = self.pool.unwrap_decl(ty);
        let ty = match self.pool.tag(ty) {
            Tag::Reference => self.pool.reference_target(ty).unwrap_or(ty),
            _ => ty,
        };
        if !self.pool.is_concrete(ty) || self.pool.tag(ty).type_id().is_none() {
            internal_error(format_args!(
                "{} has no runtime type information",
                self.pool.name(ty)
            ));
        }
        self.type_info_global(ty).as_pointer_value()
    }

    // ── Continuations ───────────────────────────────────────────────

    /// Load successor and frame of the continuation in field `field` of
    /// the current frame.
    fn continuation(&mut self, field: u32) -> (PointerValue<'ctx>, PointerValue<'ctx>) {
        let frame_ty = self.state().layout.ty();
        let frame = self.frame_ptr().into_pointer_value();
        let ptr = self.ptr_type();
        let succ_ptr = self.field_ptr(frame_ty, frame, &[field, CONT_SUCCESSOR]);
        let succ = self.load(ptr.into(), succ_ptr).into_pointer_value();
        let target_ptr = self.field_ptr(frame_ty, frame, &[field, CONT_FRAME]);
        let target = self.load(ptr.into(), target_ptr).into_pointer_value();
        (succ, target)
    }

    /// Continue with the normal continuation, passing `result` along.
    pub(crate) fn return_with(&mut self, result: Option<BasicValueEnum<'ctx>>) {
        let (succ, target) = self.continuation(FRAME_CONT_NORMAL);
        let mut params: Vec<BasicMetadataTypeEnum<'ctx>> = vec![self.ptr_type().into()];
        let mut args = vec![target.into()];
        if let Some(result) = result {
            params.push(result.get_type().into());
            args.push(result);
        }
        let ty = self.context.void_type().fn_type(&params, false);
        self.tail_call(Callee::Indirect(succ, ty), &args);
    }

    /// Store `exception` into the frame of the exception continuation and
    /// continue there.
    pub(crate) fn raise(&mut self, exception: BasicValueEnum<'ctx>) {
        let (succ, target) = self.continuation(FRAME_CONT_EXCEPT);
        let slot = self.field_ptr(base_frame_type(self.context), target, &[FRAME_EXCEPTION]);
        self.store(exception, slot);
        let ty = self
            .context
            .void_type()
            .fn_type(&[self.ptr_type().into()], false);
        self.tail_call(Callee::Indirect(succ, ty), &[target.into()]);
    }
}

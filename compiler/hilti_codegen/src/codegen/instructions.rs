//! Lowering of the built-in instructions.
//!
//! Every handler runs with the builder positioned at a live block and the
//! instruction already validated against its signature, so missing
//! operands are internal defects.

use inkwell::values::BasicValueEnum;
use inkwell::{FloatPredicate, IntPredicate};
use rustc_hash::FxHashMap;
use tracing::trace;

use hilti_diagnostic::internal_error;
use hilti_ir::{names, CallingConvention, Instruction, Operand, Slot};

use super::{Callee, CodeGen};
use crate::builder::undef;
use crate::frame::exception_type;
use crate::tables::LowerFn;

/// Lowering of every built-in instruction and operator overload, by
/// signature key.
pub(super) fn builtin_lowerings<'ctx>() -> FxHashMap<&'static str, LowerFn<'ctx>> {
    let mut map: FxHashMap<&'static str, LowerFn<'ctx>> = FxHashMap::default();

    // Flow control.
    map.insert(names::ASSIGN, lower_assign);
    map.insert(names::JUMP, lower_jump);
    map.insert(names::IF_ELSE, lower_if_else);
    map.insert(names::RETURN_VOID, lower_return_void);
    map.insert(names::RETURN_RESULT, lower_return_result);
    map.insert(names::CALL, lower_call);
    map.insert(names::THROW, lower_throw);

    // Arithmetic and comparisons.
    map.insert(names::INT_ADD, |cg, i| binary(cg, i, BinOp::Add));
    map.insert(names::INT_SUB, |cg, i| binary(cg, i, BinOp::Sub));
    map.insert(names::INT_MUL, |cg, i| binary(cg, i, BinOp::Mul));
    map.insert(names::INT_EQ, |cg, i| icmp(cg, i, IntPredicate::EQ));
    map.insert(names::INT_LT, |cg, i| icmp(cg, i, IntPredicate::SLT));
    map.insert(names::BOOL_AND, |cg, i| binary(cg, i, BinOp::And));
    map.insert(names::BOOL_OR, |cg, i| binary(cg, i, BinOp::Or));
    map.insert(names::BOOL_NOT, lower_bool_not);
    map.insert(names::DOUBLE_ADD, |cg, i| binary(cg, i, BinOp::FAdd));

    // `equal` overloads.
    map.insert(names::EQUAL_INT, |cg, i| icmp(cg, i, IntPredicate::EQ));
    map.insert(names::EQUAL_BOOL, |cg, i| icmp(cg, i, IntPredicate::EQ));
    map.insert(names::EQUAL_DOUBLE, lower_equal_double);
    map
}

fn operand(insn: &Instruction, slot: Slot) -> &Operand {
    match insn.operand(slot) {
        Some(op) => op,
        None => internal_error(format_args!("{} without {slot}", insn.name)),
    }
}

fn label(insn: &Instruction, slot: Slot) -> &str {
    let op = operand(insn, slot);
    match op.as_label() {
        Some(label) => label,
        None => internal_error(format_args!("{slot} of {} is not a label: {op}", insn.name)),
    }
}

// ── Flow control ────────────────────────────────────────────────────

fn lower_assign(cg: &mut CodeGen<'_, '_>, insn: &Instruction) {
    let value = cg.operand_value(operand(insn, Slot::Op1));
    cg.store_target(operand(insn, Slot::Target), value);
}

fn lower_jump(cg: &mut CodeGen<'_, '_>, insn: &Instruction) {
    let dest = cg.block_function(label(insn, Slot::Op1));
    let frame = cg.frame_ptr();
    cg.tail_call(Callee::Direct(dest), &[frame]);
}

/// Branch natively to one of two local blocks, each of which tail calls
/// the block function of its HILTI label.
fn lower_if_else(cg: &mut CodeGen<'_, '_>, insn: &Instruction) {
    let cond = cg.operand_value(operand(insn, Slot::Op1)).into_int_value();
    let then_fn = cg.block_function(label(insn, Slot::Op2));
    let else_fn = cg.block_function(label(insn, Slot::Op3));

    let function = cg.insert_function();
    let then_label = cg.new_label("then");
    let else_label = cg.new_label("else");
    let then_at = cg.context().append_basic_block(function, &then_label);
    let else_at = cg.context().append_basic_block(function, &else_label);
    if let Some(builder) = cg.builders.live() {
        builder
            .build_conditional_branch(cond, then_at, else_at)
            .expect("branch");
    }

    for (at, dest) in [(then_at, then_fn), (else_at, else_fn)] {
        cg.builders.push(at);
        let frame = cg.frame_ptr();
        cg.tail_call(Callee::Direct(dest), &[frame]);
        cg.builders.pop();
    }
    cg.builders.replace_top(None);
}

fn lower_return_void(cg: &mut CodeGen<'_, '_>, _: &Instruction) {
    cg.return_with(None);
}

fn lower_return_result(cg: &mut CodeGen<'_, '_>, insn: &Instruction) {
    let result = cg.operand_value(operand(insn, Slot::Op1));
    cg.return_with(Some(result));
}

fn lower_call(cg: &mut CodeGen<'_, '_>, insn: &Instruction) {
    let callee = cg.callee(operand(insn, Slot::Op1));
    let Operand::Tuple(args) = operand(insn, Slot::Op2) else {
        internal_error(format_args!("arguments of {insn} are not a tuple"));
    };
    let target = insn.target.as_ref();
    match callee.cc {
        CallingConvention::Hilti => cg.call_hilti(callee, &args.elements, target),
        CallingConvention::C | CallingConvention::CHilti => {
            cg.call_bridge(callee, &args.elements, target);
        }
    }
}

/// Allocate an exception object `{ type info, argument }` and raise it.
fn lower_throw(cg: &mut CodeGen<'_, '_>, insn: &Instruction) {
    let Operand::Type(exception) = operand(insn, Slot::Op1) else {
        internal_error(format_args!("{insn} does not name an exception type"));
    };
    trace!(exception = %cg.pool().name(exception.referenced), "throw");

    let object_ty = exception_type(cg.context());
    let object = cg.malloc(object_ty.into());
    let type_info = cg.type_info_ptr(exception.referenced);
    let type_slot = cg.field_ptr(object_ty, object, &[0]);
    cg.store(type_info.into(), type_slot);

    let arg = match &insn.op2 {
        Some(op) => {
            let value = cg.operand_value(op);
            let boxed = cg.malloc(cg.storage_type(op.ty()));
            cg.store(value, boxed);
            boxed
        }
        None => cg.ptr_type().const_null(),
    };
    let arg_slot = cg.field_ptr(object_ty, object, &[1]);
    cg.store(arg.into(), arg_slot);

    cg.raise(object.into());
}

// ── Arithmetic ──────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug)]
enum BinOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    FAdd,
}

fn binary(cg: &mut CodeGen<'_, '_>, insn: &Instruction, op: BinOp) {
    let lhs = cg.operand_value(operand(insn, Slot::Op1));
    let rhs = cg.operand_value(operand(insn, Slot::Op2));
    let Some(builder) = cg.builders.live() else {
        let result = undef(lhs.get_type());
        cg.store_target(operand(insn, Slot::Target), result);
        return;
    };
    let int = BasicValueEnum::into_int_value;
    let result: BasicValueEnum<'_> = match op {
        BinOp::Add => builder.build_int_add(int(lhs), int(rhs), "").expect("add").into(),
        BinOp::Sub => builder.build_int_sub(int(lhs), int(rhs), "").expect("sub").into(),
        BinOp::Mul => builder.build_int_mul(int(lhs), int(rhs), "").expect("mul").into(),
        BinOp::And => builder.build_and(int(lhs), int(rhs), "").expect("and").into(),
        BinOp::Or => builder.build_or(int(lhs), int(rhs), "").expect("or").into(),
        BinOp::FAdd => builder
            .build_float_add(lhs.into_float_value(), rhs.into_float_value(), "")
            .expect("fadd")
            .into(),
    };
    cg.store_target(operand(insn, Slot::Target), result);
}

fn icmp(cg: &mut CodeGen<'_, '_>, insn: &Instruction, pred: IntPredicate) {
    let lhs = cg.operand_value(operand(insn, Slot::Op1)).into_int_value();
    let rhs = cg.operand_value(operand(insn, Slot::Op2)).into_int_value();
    let result = match cg.builders.live() {
        Some(builder) => builder.build_int_compare(pred, lhs, rhs, "").expect("icmp"),
        None => cg.context().bool_type().get_undef(),
    };
    cg.store_target(operand(insn, Slot::Target), result.into());
}

fn lower_bool_not(cg: &mut CodeGen<'_, '_>, insn: &Instruction) {
    let value = cg.operand_value(operand(insn, Slot::Op1)).into_int_value();
    let result = match cg.builders.live() {
        Some(builder) => builder.build_not(value, "").expect("not"),
        None => cg.context().bool_type().get_undef(),
    };
    cg.store_target(operand(insn, Slot::Target), result.into());
}

fn lower_equal_double(cg: &mut CodeGen<'_, '_>, insn: &Instruction) {
    let lhs = cg.operand_value(operand(insn, Slot::Op1)).into_float_value();
    let rhs = cg.operand_value(operand(insn, Slot::Op2)).into_float_value();
    let result = match cg.builders.live() {
        Some(builder) => builder
            .build_float_compare(FloatPredicate::OEQ, lhs, rhs, "")
            .expect("fcmp"),
        None => cg.context().bool_type().get_undef(),
    };
    cg.store_target(operand(insn, Slot::Target), result.into());
}

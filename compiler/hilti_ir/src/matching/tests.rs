#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use hilti_types::{Idx, Tag, TypeClass, TypePool};

use crate::{
    match_instruction_with_signature, Id, Instruction, MismatchKind, Operand, Signature, Slot,
};

fn int64(pool: &mut TypePool) -> Idx {
    pool.integer(64).unwrap_or_else(|e| panic!("{e}"))
}

fn add_signature(pool: &mut TypePool) -> Signature {
    let wild = pool.wildcard(Tag::Integer).unwrap_or_else(|e| panic!("{e}"));
    Signature::new("int.add").op1(wild).op2(wild).target(wild)
}

#[test]
fn matching_instruction_is_accepted() {
    let mut pool = TypePool::new();
    let sig = add_signature(&mut pool);
    let i64t = int64(&mut pool);
    let insn = Instruction::new("int.add")
        .with_op1(Operand::int(1, i64t))
        .with_op2(Operand::int(2, i64t))
        .with_target(Operand::id(Id::local("x", i64t)));

    assert_eq!(match_instruction_with_signature(&pool, &insn, &sig), Ok(()));
}

#[test]
fn absent_required_operand_is_missing() {
    let mut pool = TypePool::new();
    let sig = add_signature(&mut pool);
    let i64t = int64(&mut pool);
    let insn = Instruction::new("int.add")
        .with_op2(Operand::int(2, i64t))
        .with_target(Operand::id(Id::local("x", i64t)));

    let err = match_instruction_with_signature(&pool, &insn, &sig).unwrap_err();
    assert_eq!(err.slot, Slot::Op1);
    assert_eq!(err.kind, MismatchKind::Missing);
    assert_eq!(err.to_string(), "missing operand 1");
}

#[test]
fn unexpected_operand_is_superfluous() {
    let pool = TypePool::new();
    let sig = Signature::new("bool.not").op1(Tag::Bool).target(Tag::Bool);
    let insn = Instruction::new("bool.not")
        .with_op1(Operand::bool(true))
        .with_op2(Operand::bool(false))
        .with_target(Operand::id(Id::local("b", Idx::BOOL)));

    let err = match_instruction_with_signature(&pool, &insn, &sig).unwrap_err();
    assert_eq!(err.slot, Slot::Op2);
    assert!(err.to_string().contains("superfluous"));
    assert_eq!(err.to_string(), "superfluous operand 2");
}

#[test]
fn optional_slots_may_be_absent() {
    let pool = TypePool::new();
    let sig = Signature::new("return.void").optional_op2(TypeClass::ValueType);
    let insn = Instruction::new("return.void");
    assert_eq!(match_instruction_with_signature(&pool, &insn, &sig), Ok(()));
}

#[test]
fn type_mismatch_names_expected_and_found() {
    let mut pool = TypePool::new();
    let sig = add_signature(&mut pool);
    let i64t = int64(&mut pool);
    let insn = Instruction::new("int.add")
        .with_op1(Operand::int(1, i64t))
        .with_op2(Operand::int(2, i64t))
        .with_target(Operand::id(Id::local("b", Idx::BOOL)));

    let err = match_instruction_with_signature(&pool, &insn, &sig).unwrap_err();
    assert_eq!(
        err.to_string(),
        "type of target does not match signature (expected int<*>, found bool)"
    );
}

#[test]
fn first_failing_slot_is_reported() {
    let pool = TypePool::new();
    let sig = Signature::new("bool.and").op1(Tag::Bool).op2(Tag::Bool);
    let insn = Instruction::new("bool.and")
        .with_op1(Operand::double(1.0))
        .with_op3(Operand::bool(true));

    let err = match_instruction_with_signature(&pool, &insn, &sig).unwrap_err();
    assert_eq!(err.slot, Slot::Op1);
}

#[test]
fn type_operand_checks_referenced_type() {
    let mut pool = TypePool::new();
    let sig = Signature::new("new").op1(TypeClass::HeapType);
    let list = pool.list(Idx::STRING).unwrap_or_else(|e| panic!("{e}"));
    let as_type = Operand::type_of(&mut pool, list);
    let insn = Instruction::new("new").with_op1(as_type);
    assert_eq!(match_instruction_with_signature(&pool, &insn, &sig), Ok(()));

    let as_type = Operand::type_of(&mut pool, Idx::BOOL);
    let insn = Instruction::new("new").with_op1(as_type);
    let err = match_instruction_with_signature(&pool, &insn, &sig).unwrap_err();
    assert_eq!(
        err.kind,
        MismatchKind::TypeMismatch {
            expected: "heap type".to_owned(),
            found: "bool".to_owned(),
        }
    );
}

#[test]
fn any_constraint_accepts_everything() {
    let mut pool = TypePool::new();
    let sig = Signature::new("debug.print").op1(Tag::Any);
    let tuple = Operand::tuple(&mut pool, vec![Operand::bool(true), Operand::string("x")]);
    let insn = Instruction::new("debug.print").with_op1(tuple);
    assert_eq!(match_instruction_with_signature(&pool, &insn, &sig), Ok(()));
}

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use hilti_diagnostic::ErrorCode;
use hilti_types::{Idx, Tag, TypePool};

use crate::{names, Id, Instruction, InstructionSet, Operand, Signature};

fn equal(op1: Operand, op2: Operand) -> Instruction {
    Instruction::new(names::EQUAL)
        .with_op1(op1)
        .with_op2(op2)
        .with_target(Operand::id(Id::local("r", Idx::BOOL)))
}

#[test]
fn operator_resolves_by_first_operand_type() {
    let mut pool = TypePool::new();
    let set = InstructionSet::with_builtins(&mut pool);

    let insn = equal(Operand::double(1.0), Operand::double(2.0));
    let resolution = set.find_overloaded_operator(&pool, &insn);
    assert_eq!(resolution.count, 1);
    assert_eq!(resolution.dispatch_type, Some(Idx::DOUBLE));
    assert_eq!(
        resolution.first.map(Signature::key),
        Some(names::EQUAL_DOUBLE)
    );

    let i32t = pool.integer(32).unwrap_or_else(|e| panic!("{e}"));
    let insn = equal(Operand::int(1, i32t), Operand::int(1, i32t));
    let signature = set.validate(&pool, &insn).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(signature.key(), names::EQUAL_INT);
}

#[test]
fn no_overload_matches() {
    let mut pool = TypePool::new();
    let set = InstructionSet::with_builtins(&mut pool);
    let insn = equal(Operand::string("a"), Operand::string("b"));

    let resolution = set.find_overloaded_operator(&pool, &insn);
    assert_eq!(resolution.count, 0);
    assert!(resolution.first.is_none());

    let err = set.validate(&pool, &insn).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E2005);
    assert_eq!(
        err.to_string(),
        "no matching overload of operator equal for string"
    );
}

#[test]
fn dispatch_type_unwraps_type_declarations() {
    let mut pool = TypePool::new();
    let mut set = InstructionSet::new();
    set.register_operator("describe");
    set.register_overload(
        Signature::new("describe")
            .overload_of("describe::bool")
            .op1(Tag::Bool),
    );

    let op = Operand::type_of(&mut pool, Idx::BOOL);
    let insn = Instruction::new("describe").with_op1(op);
    let resolution = set.find_overloaded_operator(&pool, &insn);
    assert_eq!(resolution.dispatch_type, Some(Idx::BOOL));
    assert_eq!(resolution.count, 1);
}

#[test]
fn ambiguous_overloads_use_the_first_registered() {
    let pool = TypePool::new();
    let mut set = InstructionSet::new();
    set.register_operator("size");
    set.register_overload(Signature::new("size").overload_of("size::any").op1(Tag::Any));
    set.register_overload(Signature::new("size").overload_of("size::bool").op1(Tag::Bool));

    let insn = Instruction::new("size").with_op1(Operand::bool(true));
    let resolution = set.find_overloaded_operator(&pool, &insn);
    assert_eq!(resolution.count, 2);
    assert!(resolution.is_ambiguous());

    let signature = set.validate(&pool, &insn).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(signature.key(), "size::any");
}

#[test]
#[should_panic(expected = "registered twice")]
fn duplicate_instruction_is_a_defect() {
    let mut set = InstructionSet::new();
    set.register_instruction(Signature::new("nop"));
    set.register_instruction(Signature::new("nop"));
}

#[test]
#[should_panic(expected = "undeclared operator")]
fn overload_needs_operator() {
    let mut set = InstructionSet::new();
    set.register_overload(Signature::new("nothing").op1(Tag::Bool));
}

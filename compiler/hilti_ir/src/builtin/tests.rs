#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use hilti_diagnostic::ErrorCode;
use hilti_types::{FunctionParam, Idx, TypePool};

use crate::{names, Id, Instruction, InstructionError, InstructionSet, Operand};

fn setup() -> (TypePool, InstructionSet) {
    let mut pool = TypePool::new();
    let set = InstructionSet::with_builtins(&mut pool);
    (pool, set)
}

fn int64(pool: &mut TypePool) -> Idx {
    pool.integer(64).unwrap_or_else(|e| panic!("{e}"))
}

#[test]
fn every_builtin_is_registered() {
    let (_, set) = setup();
    for name in [
        names::ASSIGN,
        names::JUMP,
        names::IF_ELSE,
        names::RETURN_VOID,
        names::RETURN_RESULT,
        names::CALL,
        names::THROW,
        names::INT_ADD,
        names::INT_SUB,
        names::INT_MUL,
        names::INT_EQ,
        names::INT_LT,
        names::BOOL_AND,
        names::BOOL_OR,
        names::BOOL_NOT,
        names::DOUBLE_ADD,
    ] {
        assert!(set.lookup(name).is_some(), "{name} not registered");
    }
    assert!(set.is_operator(names::EQUAL));
    assert_eq!(set.overloads(names::EQUAL).len(), 3);
}

#[test]
fn terminators_are_flagged() {
    let (_, set) = setup();
    let terminators: Vec<&str> = [
        names::JUMP,
        names::IF_ELSE,
        names::RETURN_VOID,
        names::RETURN_RESULT,
        names::THROW,
    ]
    .into_iter()
    .filter(|n| set.lookup(n).is_some_and(|s| s.terminator))
    .collect();
    assert_eq!(terminators.len(), 5);
    assert!(!set.lookup(names::CALL).is_some_and(|s| s.terminator));
}

#[test]
fn assign_rejects_incompatible_target() {
    let (mut pool, set) = setup();
    let i64t = int64(&mut pool);
    let insn = Instruction::new(names::ASSIGN)
        .with_op1(Operand::int(3, i64t))
        .with_target(Operand::id(Id::local("b", Idx::BOOL)));

    let err = set.validate(&pool, &insn).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E2006);
    assert_eq!(err.to_string(), "assign: cannot assign int<64> to bool");
}

#[test]
fn int_add_accepts_matching_widths_only() {
    let (mut pool, set) = setup();
    let i64t = int64(&mut pool);
    let i8t = pool.integer(8).unwrap_or_else(|e| panic!("{e}"));
    let ok = Instruction::new(names::INT_ADD)
        .with_op1(Operand::int(1, i64t))
        .with_op2(Operand::int(2, i64t))
        .with_target(Operand::id(Id::local("x", i64t)));
    assert!(set.validate(&pool, &ok).is_ok());

    let mixed = Instruction::new(names::INT_ADD)
        .with_op1(Operand::int(1, i64t))
        .with_op2(Operand::int(2, i8t))
        .with_target(Operand::id(Id::local("x", i64t)));
    assert_eq!(set.validate(&pool, &mixed).unwrap_err().code(), ErrorCode::E2006);
}

#[test]
fn call_checks_arity_and_result() {
    let (mut pool, set) = setup();
    let i64t = int64(&mut pool);
    let fty = pool.function(vec![FunctionParam::new("n", i64t)], Idx::BOOL);
    let callee = Operand::id(Id::function("Main::f", fty));

    let args = Operand::tuple(&mut pool, vec![Operand::int(1, i64t)]);
    let good = Instruction::new(names::CALL)
        .with_op1(callee.clone())
        .with_op2(args)
        .with_target(Operand::id(Id::local("r", Idx::BOOL)));
    assert!(set.validate(&pool, &good).is_ok());

    let no_args = Operand::tuple(&mut pool, vec![]);
    let bad = Instruction::new(names::CALL)
        .with_op1(callee)
        .with_op2(no_args);
    let err = set.validate(&pool, &bad).unwrap_err();
    assert_eq!(
        err.to_string(),
        "call: wrong number of arguments (expected 1, have 0)"
    );
}

#[test]
fn throw_checks_exception_argument() {
    let (mut pool, set) = setup();
    let root = pool.exception_root();
    let with_arg = pool
        .register_exception("Main::Oops", Some(Idx::STRING), Some(root))
        .unwrap_or_else(|e| panic!("{e}"));

    let op = Operand::type_of(&mut pool, with_arg);
    let ok = Instruction::new(names::THROW)
        .with_op1(op.clone())
        .with_op2(Operand::string("boom"));
    assert!(set.validate(&pool, &ok).is_ok());

    let missing = Instruction::new(names::THROW).with_op1(op);
    let err = set.validate(&pool, &missing).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E2006);
}

#[test]
fn unknown_instruction() {
    let (pool, set) = setup();
    let err = set
        .validate(&pool, &Instruction::new("frobnicate"))
        .unwrap_err();
    assert_eq!(
        err,
        InstructionError::Unknown {
            name: "frobnicate".to_owned()
        }
    );
    assert_eq!(err.code(), ErrorCode::E2004);
}

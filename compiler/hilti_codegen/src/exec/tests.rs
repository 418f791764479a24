#![allow(clippy::unwrap_used, clippy::expect_used)]

use inkwell::context::Context;
use pretty_assertions::assert_eq;

use hilti_ir::{names, Block, CallingConvention, Function, Instruction, InstructionSet, Module, Operand};
use hilti_types::{FunctionParam, Idx, TypePool};

use super::{ExecError, Machine, Outcome, Scalar};
use crate::{CodeGen, CodegenOptions};

/// A unit with `Main::<name>(x: ty) -> ty` per entry of `shapes`, each
/// computing `op(x, x)` or, without an operator, returning `x`.
fn unit(pool: &mut TypePool, shapes: &[(&str, Idx, Option<&str>)]) -> Module {
    let mut unit = Module::new("Main");
    for &(name, ty, op) in shapes {
        let fty = pool.function(vec![FunctionParam::new("x", ty)], ty);
        let mut f = Function::new(pool, &format!("Main::{name}"), fty, CallingConvention::Hilti);
        let x = f.params[0].clone();
        let mut block = Block::new();
        let result = match op {
            Some(op) => {
                let r = f.add_local("r", ty);
                block.push(
                    Instruction::new(op)
                        .with_op1(Operand::id(x.clone()))
                        .with_op2(Operand::id(x))
                        .with_target(Operand::id(r.clone())),
                );
                r
            }
            None => x,
        };
        block.push(Instruction::new(names::RETURN_RESULT).with_op1(Operand::id(result)));
        f.add_block(block);
        unit.add_function(f);
    }
    unit
}

fn setup() -> (TypePool, InstructionSet) {
    let mut pool = TypePool::new();
    let set = InstructionSet::with_builtins(&mut pool);
    (pool, set)
}

fn load<'ctx>(
    context: &'ctx Context,
    pool: &TypePool,
    set: &InstructionSet,
    unit: &Module,
) -> Result<Machine<'ctx>, ExecError> {
    let mut cg = CodeGen::new(context, pool, set, CodegenOptions::default());
    let module = cg.compile(unit).expect("unit compiles");
    let entries: Vec<_> = unit
        .functions
        .iter()
        .map(|f| cg.entry_signature(f))
        .collect();
    Machine::new(context, module, &entries)
}

#[test]
fn scalars_cross_as_words() {
    let (mut pool, set) = setup();
    let i8t = pool.integer(8).unwrap();
    let i64t = pool.integer(64).unwrap();
    let unit = unit(
        &mut pool,
        &[
            ("narrow", i8t, None),
            ("twice", i64t, Some(names::INT_ADD)),
            ("flag", Idx::BOOL, None),
            ("half", Idx::DOUBLE, Some(names::DOUBLE_ADD)),
        ],
    );
    let context = Context::create();
    let machine = load(&context, &pool, &set, &unit).unwrap();

    let cases = [
        ("hlt_Main_narrow", Scalar::Int(-3), Scalar::Int(-3)),
        ("hlt_Main_twice", Scalar::Int(-21), Scalar::Int(-42)),
        ("hlt_Main_flag", Scalar::Bool(true), Scalar::Bool(true)),
        ("hlt_Main_half", Scalar::Double(1.25), Scalar::Double(2.5)),
    ];
    for (entry, arg, expected) in cases {
        assert_eq!(
            machine.run(entry, &[arg]).unwrap(),
            Outcome::Returned(Some(expected)),
            "{entry}"
        );
    }
}

#[test]
fn calls_are_checked_against_the_entry() {
    let (mut pool, set) = setup();
    let i64t = pool.integer(64).unwrap();
    let unit = unit(&mut pool, &[("id", i64t, None)]);
    let context = Context::create();
    let machine = load(&context, &pool, &set, &unit).unwrap();

    assert_eq!(
        machine.run("hlt_Main_nope", &[]),
        Err(ExecError::UnknownEntry("hlt_Main_nope".to_owned()))
    );
    assert_eq!(
        machine.run("hlt_Main_id", &[]),
        Err(ExecError::Arity {
            entry: "hlt_Main_id".to_owned(),
            expected: 1,
            found: 0,
        })
    );
}

#[test]
fn host_functions_are_bound_before_running() {
    let (mut pool, set) = setup();
    let i64t = pool.integer(64).unwrap();
    let unit = unit(&mut pool, &[("id", i64t, None)]);
    let context = Context::create();
    let machine = load(&context, &pool, &set, &unit).unwrap();

    assert_eq!(
        machine.map_host("Hlt_missing", 0x1000),
        Err(ExecError::UnknownSymbol("Hlt_missing".to_owned()))
    );
    assert_eq!(
        machine.run("hlt_Main_id", &[Scalar::Int(9)]).unwrap(),
        Outcome::Returned(Some(Scalar::Int(9)))
    );
    assert_eq!(
        machine.map_host("hlt_Main_id", 0x1000),
        Err(ExecError::AlreadyRunning)
    );
}

#[test]
fn aggregates_cannot_be_entry_parameters() {
    let (mut pool, set) = setup();
    let i64t = pool.integer(64).unwrap();
    let pair = pool.tuple(&[i64t, Idx::BOOL]);
    let unit = unit(&mut pool, &[("pair", pair, None)]);
    let context = Context::create();

    let Err(err) = load(&context, &pool, &set, &unit) else {
        panic!("tuple parameter crossed the harness");
    };
    assert!(matches!(err, ExecError::Unsupported(_)), "{err}");
}

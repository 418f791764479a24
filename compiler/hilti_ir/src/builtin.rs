//! The standard instruction set.

use hilti_diagnostic::internal_error;
use hilti_types::{Idx, Tag, TypeClass, TypePool};

use crate::{Instruction, InstructionSet, Operand, Signature};

/// Mnemonics of the built-in instructions and operators.
pub mod names {
    pub const ASSIGN: &str = "assign";
    pub const JUMP: &str = "jump";
    pub const IF_ELSE: &str = "if.else";
    pub const RETURN_VOID: &str = "return.void";
    pub const RETURN_RESULT: &str = "return.result";
    pub const CALL: &str = "call";
    pub const THROW: &str = "exception.throw";
    pub const INT_ADD: &str = "int.add";
    pub const INT_SUB: &str = "int.sub";
    pub const INT_MUL: &str = "int.mul";
    pub const INT_EQ: &str = "int.eq";
    pub const INT_LT: &str = "int.lt";
    pub const BOOL_AND: &str = "bool.and";
    pub const BOOL_OR: &str = "bool.or";
    pub const BOOL_NOT: &str = "bool.not";
    pub const DOUBLE_ADD: &str = "double.add";

    /// Operator dispatched on the type of operand 1.
    pub const EQUAL: &str = "equal";
    pub const EQUAL_INT: &str = "equal::int";
    pub const EQUAL_BOOL: &str = "equal::bool";
    pub const EQUAL_DOUBLE: &str = "equal::double";
}

impl InstructionSet {
    /// A set with every built-in instruction and operator registered.
    ///
    /// Needs the pool to create the wildcard types the signatures use.
    pub fn with_builtins(pool: &mut TypePool) -> Self {
        let mut set = InstructionSet::new();
        let int = pool
            .wildcard(Tag::Integer)
            .unwrap_or_else(|e| internal_error(e));

        // Flow control.
        set.register_instruction(
            Signature::new(names::ASSIGN)
                .op1(TypeClass::ValueType)
                .target(TypeClass::ValueType)
                .with_hook(check_assign),
        );
        set.register_instruction(Signature::new(names::JUMP).op1(Tag::Label).terminator());
        set.register_instruction(
            Signature::new(names::IF_ELSE)
                .op1(Tag::Bool)
                .op2(Tag::Label)
                .op3(Tag::Label)
                .terminator(),
        );
        set.register_instruction(Signature::new(names::RETURN_VOID).terminator());
        set.register_instruction(
            Signature::new(names::RETURN_RESULT)
                .op1(TypeClass::ValueType)
                .terminator(),
        );
        set.register_instruction(
            Signature::new(names::CALL)
                .op1(Tag::Function)
                .op2(Tag::Tuple)
                .optional_target(TypeClass::ValueType)
                .with_hook(check_call),
        );
        set.register_instruction(
            Signature::new(names::THROW)
                .op1(Tag::Exception)
                .optional_op2(TypeClass::ValueType)
                .terminator()
                .with_hook(check_throw),
        );

        // Integers.
        for name in [names::INT_ADD, names::INT_SUB, names::INT_MUL] {
            set.register_instruction(
                Signature::new(name)
                    .op1(int)
                    .op2(int)
                    .target(int)
                    .with_hook(check_same_operand_types),
            );
        }
        for name in [names::INT_EQ, names::INT_LT] {
            set.register_instruction(
                Signature::new(name)
                    .op1(int)
                    .op2(int)
                    .target(Tag::Bool)
                    .with_hook(check_same_operand_types),
            );
        }

        // Booleans and doubles.
        for name in [names::BOOL_AND, names::BOOL_OR] {
            set.register_instruction(
                Signature::new(name)
                    .op1(Tag::Bool)
                    .op2(Tag::Bool)
                    .target(Tag::Bool),
            );
        }
        set.register_instruction(
            Signature::new(names::BOOL_NOT)
                .op1(Tag::Bool)
                .target(Tag::Bool),
        );
        set.register_instruction(
            Signature::new(names::DOUBLE_ADD)
                .op1(Tag::Double)
                .op2(Tag::Double)
                .target(Tag::Double),
        );

        // Operators.
        set.register_operator(names::EQUAL);
        for (key, operand) in [
            (names::EQUAL_INT, int),
            (names::EQUAL_BOOL, Idx::BOOL),
            (names::EQUAL_DOUBLE, Idx::DOUBLE),
        ] {
            set.register_overload(
                Signature::new(names::EQUAL)
                    .overload_of(key)
                    .op1(operand)
                    .op2(operand)
                    .target(Tag::Bool),
            );
        }
        set
    }
}

// ── Validation hooks ────────────────────────────────────────────────

fn check_assign(pool: &TypePool, insn: &Instruction) -> Result<(), String> {
    match (&insn.op1, &insn.target) {
        (Some(src), Some(dst)) if !pool.types_match(src.ty(), dst.ty()) => Err(format!(
            "cannot assign {} to {}",
            pool.name(src.ty()),
            pool.name(dst.ty())
        )),
        _ => Ok(()),
    }
}

fn check_same_operand_types(pool: &TypePool, insn: &Instruction) -> Result<(), String> {
    match (&insn.op1, &insn.op2) {
        (Some(a), Some(b)) if !pool.types_match(a.ty(), b.ty()) => Err(format!(
            "operand types {} and {} differ",
            pool.name(a.ty()),
            pool.name(b.ty())
        )),
        _ => Ok(()),
    }
}

fn check_call(pool: &TypePool, insn: &Instruction) -> Result<(), String> {
    let (Some(callee), Some(Operand::Tuple(args))) = (&insn.op1, &insn.op2) else {
        return Err("call arguments must be a tuple".to_owned());
    };
    let params = pool.function_params(callee.ty()).unwrap_or(&[]);
    if params.len() != args.elements.len() {
        return Err(format!(
            "wrong number of arguments (expected {}, have {})",
            params.len(),
            args.elements.len()
        ));
    }
    for (param, arg) in params.iter().zip(&args.elements) {
        if !pool.types_match(param.ty, arg.ty()) {
            return Err(format!(
                "argument {} has type {}, expected {}",
                param.name,
                pool.name(arg.ty()),
                pool.name(param.ty)
            ));
        }
    }

    let result = pool.function_result(callee.ty()).unwrap_or(Idx::VOID);
    match &insn.target {
        Some(_) if result == Idx::VOID => Err("function does not return a value".to_owned()),
        Some(target) if !pool.types_match(result, target.ty()) => Err(format!(
            "result of type {} cannot be stored in {}",
            pool.name(result),
            pool.name(target.ty())
        )),
        _ => Ok(()),
    }
}

fn check_throw(pool: &TypePool, insn: &Instruction) -> Result<(), String> {
    let Some(Operand::Type(exception)) = &insn.op1 else {
        return Err("operand 1 must name an exception type".to_owned());
    };
    match (pool.exception_arg(exception.referenced), &insn.op2) {
        (Some(expected), Some(arg)) if !pool.types_match(expected, arg.ty()) => Err(format!(
            "exception argument has type {}, expected {}",
            pool.name(arg.ty()),
            pool.name(expected)
        )),
        (Some(_), None) => Err("exception requires an argument".to_owned()),
        (None, Some(_)) => Err("exception does not take an argument".to_owned()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests;

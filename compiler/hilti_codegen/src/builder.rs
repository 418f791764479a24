//! The builder stack.
//!
//! Native instructions are always emitted at the block on top of the
//! stack, through one [`Builder`] that follows the top. An entry without
//! a block absorbs everything emitted into it: after a tail call the rest
//! of a HILTI block is unreachable at the native level, and lowering
//! keeps running over it without producing code.

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::types::BasicTypeEnum;
use inkwell::values::BasicValueEnum;

use hilti_diagnostic::internal_error;

pub struct BuilderStack<'ctx> {
    builder: Builder<'ctx>,
    stack: Vec<Option<BasicBlock<'ctx>>>,
}

impl<'ctx> BuilderStack<'ctx> {
    pub fn new(context: &'ctx Context) -> Self {
        BuilderStack {
            builder: context.create_builder(),
            stack: Vec::new(),
        }
    }

    pub fn push(&mut self, block: BasicBlock<'ctx>) {
        self.stack.push(Some(block));
        self.reposition();
    }

    pub fn pop(&mut self) -> Option<BasicBlock<'ctx>> {
        let Some(top) = self.stack.pop() else {
            internal_error("builder stack underflow");
        };
        self.reposition();
        top
    }

    /// Swap the top builder for one at `block`, or an absorbing one.
    pub fn replace_top(&mut self, block: Option<BasicBlock<'ctx>>) {
        match self.stack.last_mut() {
            Some(top) => *top = block,
            None => internal_error("no builder to replace"),
        }
        self.reposition();
    }

    /// Current block; `None` while absorbing.
    pub fn top(&self) -> Option<BasicBlock<'ctx>> {
        match self.stack.last() {
            Some(top) => *top,
            None => internal_error("no active builder"),
        }
    }

    pub fn is_absorbing(&self) -> bool {
        self.top().is_none()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.builder.clear_insertion_position();
    }

    /// The builder, positioned at the end of the top block; `None` while
    /// absorbing.
    pub fn live(&self) -> Option<&Builder<'ctx>> {
        let block = self.top()?;
        if block.get_terminator().is_some() {
            internal_error(format_args!(
                "emitting into terminated block {}",
                block.get_name().to_string_lossy()
            ));
        }
        Some(&self.builder)
    }

    fn reposition(&self) {
        match self.stack.last() {
            Some(Some(block)) => self.builder.position_at_end(*block),
            _ => self.builder.clear_insertion_position(),
        }
    }
}

/// Placeholder for a value computed in an absorbing builder.
pub fn undef(ty: BasicTypeEnum<'_>) -> BasicValueEnum<'_> {
    match ty {
        BasicTypeEnum::ArrayType(t) => t.get_undef().into(),
        BasicTypeEnum::FloatType(t) => t.get_undef().into(),
        BasicTypeEnum::IntType(t) => t.get_undef().into(),
        BasicTypeEnum::PointerType(t) => t.get_undef().into(),
        BasicTypeEnum::StructType(t) => t.get_undef().into(),
        BasicTypeEnum::VectorType(t) => t.get_undef().into(),
        #[allow(unreachable_patterns, reason = "further vector kinds on newer LLVM")]
        other => internal_error(format_args!("no undef value of {other:?}")),
    }
}

/// All-zero constant of `ty`.
pub fn zero(ty: BasicTypeEnum<'_>) -> BasicValueEnum<'_> {
    match ty {
        BasicTypeEnum::ArrayType(t) => t.const_zero().into(),
        BasicTypeEnum::FloatType(t) => t.const_zero().into(),
        BasicTypeEnum::IntType(t) => t.const_zero().into(),
        BasicTypeEnum::PointerType(t) => t.const_zero().into(),
        BasicTypeEnum::StructType(t) => t.const_zero().into(),
        BasicTypeEnum::VectorType(t) => t.const_zero().into(),
        #[allow(unreachable_patterns, reason = "further vector kinds on newer LLVM")]
        other => internal_error(format_args!("no zero value of {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use inkwell::module::Module;
    use pretty_assertions::assert_eq;

    use super::*;

    fn function<'ctx>(context: &'ctx Context, module: &Module<'ctx>) -> BasicBlock<'ctx> {
        let i64t = context.i64_type();
        let f = module.add_function("f", i64t.fn_type(&[i64t.into()], false), None);
        context.append_basic_block(f, "entry")
    }

    #[test]
    fn emits_at_top() {
        let context = Context::create();
        let module = context.create_module("m");
        let entry = function(&context, &module);
        let mut builders = BuilderStack::new(&context);
        builders.push(entry);

        let a0 = entry
            .get_parent()
            .and_then(|f| f.get_first_param())
            .map(BasicValueEnum::into_int_value)
            .unwrap_or_else(|| panic!("no parameter"));
        let builder = builders.live().unwrap_or_else(|| panic!("absorbing"));
        let one = context.i64_type().const_int(1, false);
        let sum = builder.build_int_add(a0, one, "sum").unwrap();
        builder.build_return(Some(&sum)).unwrap();

        assert!(entry.get_terminator().is_some());
        assert!(module.verify().is_ok());
    }

    #[test]
    fn absorbing_builder_discards() {
        let context = Context::create();
        let module = context.create_module("m");
        let entry = function(&context, &module);
        let mut builders = BuilderStack::new(&context);
        builders.push(entry);
        builders.push(entry);
        builders.replace_top(None);
        assert!(builders.is_absorbing());
        assert!(builders.live().is_none());

        let v = undef(context.i64_type().into());
        assert!(v.into_int_value().is_undef());
        assert!(entry.get_first_instruction().is_none());

        assert_eq!(builders.pop(), None);
        assert_eq!(builders.top(), Some(entry));
        assert_eq!(builders.pop(), Some(entry));
    }

    #[test]
    fn replace_top_moves_the_builder() {
        let context = Context::create();
        let module = context.create_module("m");
        let entry = function(&context, &module);
        let next = context.insert_basic_block_after(entry, "next");
        let mut builders = BuilderStack::new(&context);
        builders.push(entry);
        builders.replace_top(Some(next));
        let builder = builders.live().unwrap_or_else(|| panic!("absorbing"));
        builder.build_unreachable().unwrap();
        assert!(next.get_terminator().is_some());
        assert!(entry.get_terminator().is_none());
    }

    #[test]
    #[should_panic(expected = "no active builder")]
    fn cleared_stack_has_no_top() {
        let context = Context::create();
        let module = context.create_module("m");
        let entry = function(&context, &module);
        let mut builders = BuilderStack::new(&context);
        builders.push(entry);
        builders.clear();
        builders.top();
    }

    #[test]
    #[should_panic(expected = "builder stack underflow")]
    fn pop_empty() {
        let context = Context::create();
        BuilderStack::new(&context).pop();
    }

    #[test]
    #[should_panic(expected = "terminated block")]
    fn emit_after_terminator() {
        let context = Context::create();
        let module = context.create_module("m");
        let entry = function(&context, &module);
        let mut builders = BuilderStack::new(&context);
        builders.push(entry);
        if let Some(builder) = builders.live() {
            builder.build_unreachable().unwrap();
        }
        builders.live();
    }

    #[test]
    fn zero_values() {
        let context = Context::create();
        let int = zero(context.i64_type().into()).into_int_value();
        assert_eq!(int.get_zero_extended_constant(), Some(0));
        let double = zero(context.f64_type().into()).into_float_value();
        assert_eq!(double.get_constant(), Some((0.0, false)));
    }
}

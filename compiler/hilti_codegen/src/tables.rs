//! The lowering tables.
//!
//! Five independent [`DispatchTable`]s decide how a HILTI type is
//! lowered:
//!
//! | Table | Maps | Mandatory |
//! |-------|------|-----------|
//! | `type_info` | type → runtime descriptor | yes |
//! | `ctor_expr` | constant or tuple operand → native value | yes |
//! | `storage` | type → native storage type | yes |
//! | `c_param` | type → native type of a C argument | yes |
//! | `c_value` | native value → native C argument value | no, identity |
//!
//! [`Tables::builtin`] registers the handlers for the built-in types;
//! further handlers can be registered on a session through
//! [`crate::CodeGen::tables_mut`].

use inkwell::types::{BasicType, BasicTypeEnum};
use inkwell::values::{BasicValue, BasicValueEnum};
use inkwell::AddressSpace;

use hilti_diagnostic::internal_error;
use hilti_ir::{ConstValue, Constant, Instruction, Operand};
use hilti_types::{Idx, Tag, TypeClass, TypeInfo, TypePool};

use crate::builder::undef;
use crate::dispatch::DispatchTable;
use crate::CodeGen;

pub type TypeInfoHook = fn(&TypePool, Idx) -> TypeInfo;
pub type CtorExprHook<'ctx> = fn(&mut CodeGen<'_, 'ctx>, &Operand) -> BasicValueEnum<'ctx>;
pub type TypeHook<'ctx> = fn(&CodeGen<'_, 'ctx>, Idx) -> BasicTypeEnum<'ctx>;
pub type ValueHook<'ctx> =
    fn(&mut CodeGen<'_, 'ctx>, BasicValueEnum<'ctx>, Idx) -> BasicValueEnum<'ctx>;

/// Lowers one instruction; looked up by signature key.
pub type LowerFn<'ctx> = fn(&mut CodeGen<'_, 'ctx>, &Instruction);

pub struct Tables<'ctx> {
    pub type_info: DispatchTable<TypeInfoHook>,
    pub ctor_expr: DispatchTable<CtorExprHook<'ctx>>,
    pub storage: DispatchTable<TypeHook<'ctx>>,
    pub c_param: DispatchTable<TypeHook<'ctx>>,
    pub c_value: DispatchTable<ValueHook<'ctx>>,
}

impl<'ctx> Tables<'ctx> {
    pub fn empty() -> Self {
        Tables {
            type_info: DispatchTable::new("type info"),
            ctor_expr: DispatchTable::new("constructor"),
            storage: DispatchTable::new("storage"),
            c_param: DispatchTable::new("C parameter"),
            c_value: DispatchTable::new("C value"),
        }
    }

    /// Tables with the handlers of all built-in types.
    pub fn builtin() -> Self {
        let mut t = Self::empty();

        // Runtime descriptors.
        t.type_info.register(Tag::Integer, int_type_info);
        t.type_info.register(Tag::Double, double_type_info);
        t.type_info.register(Tag::Bool, bool_type_info);
        t.type_info.register(Tag::String, string_type_info);
        t.type_info.register(TypeClass::HiltiType, plain_type_info);

        // Constants and tuples.
        t.ctor_expr.register(Tag::Integer, int_ctor);
        t.ctor_expr.register(Tag::Bool, bool_ctor);
        t.ctor_expr.register(Tag::Double, double_ctor);
        t.ctor_expr.register(Tag::String, string_ctor);
        t.ctor_expr.register(Tag::Reference, null_ctor);
        t.ctor_expr.register(Tag::Enum, enum_ctor);
        t.ctor_expr.register(Tag::Tuple, tuple_ctor);

        // Storage.
        t.storage.register(Tag::Integer, int_storage);
        t.storage.register(Tag::Bool, |cg, _| cg.context().bool_type().into());
        t.storage.register(Tag::Double, |cg, _| cg.context().f64_type().into());
        t.storage.register(Tag::Tuple, tuple_storage);
        t.storage.register(Tag::Addr, |cg, _| {
            let i64t = cg.context().i64_type().into();
            cg.context().struct_type(&[i64t, i64t], false).into()
        });
        t.storage.register(Tag::Net, |cg, _| {
            let context = cg.context();
            let i64t = context.i64_type().into();
            context
                .struct_type(&[i64t, i64t, context.i8_type().into()], false)
                .into()
        });
        t.storage.register(Tag::Port, |cg, _| cg.context().i32_type().into());
        t.storage.register(Tag::Enum, |cg, _| cg.context().i8_type().into());
        t.storage.register(Tag::Bitset, |cg, _| cg.context().i64_type().into());
        t.storage.register(TypeClass::Iterator, |cg, _| {
            let ptr = pointer(cg);
            cg.context().struct_type(&[ptr, ptr], false).into()
        });
        t.storage.register(Tag::String, |cg, _| pointer(cg));
        t.storage.register(Tag::Reference, |cg, _| pointer(cg));
        t.storage.register(TypeClass::HeapType, |cg, _| pointer(cg));
        t.storage.register(Tag::Function, |cg, _| pointer(cg));

        // C arguments.
        t.c_param
            .register_documented(Tag::Bool, |cg, _| cg.context().i8_type().into(), "int8_t, 0 or 1");
        t.c_param
            .register_documented(Tag::Integer, storage_as_c, "intN_t of the same width");
        t.c_param
            .register_documented(Tag::Double, storage_as_c, "double");
        t.c_param
            .register_documented(Tag::String, storage_as_c, "hlt_string*");
        t.c_param
            .register_documented(TypeClass::ValueType, storage_as_c, "same layout as in a frame");
        t.c_param
            .register_documented(TypeClass::HeapType, storage_as_c, "pointer to the object");

        t.c_value.register(Tag::Bool, bool_to_c);
        t
    }

    /// One line per documented C argument mapping, `<type>: <C type>`.
    pub fn document_c_mapping(&self, pool: &TypePool) -> String {
        let mut out = String::new();
        for (constraint, doc) in self.c_param.docs() {
            out.push_str(&pool.constraint_name(constraint));
            out.push_str(": ");
            out.push_str(doc);
            out.push('\n');
        }
        out
    }
}

impl Default for Tables<'_> {
    fn default() -> Self {
        Self::builtin()
    }
}

// ── Type info ───────────────────────────────────────────────────────

fn int_type_info(pool: &TypePool, ty: Idx) -> TypeInfo {
    TypeInfo::new(pool, ty)
        .with_to_string("__Hlt::int_to_string")
        .with_to_int64("__Hlt::int_to_int64")
}

fn double_type_info(pool: &TypePool, ty: Idx) -> TypeInfo {
    TypeInfo::new(pool, ty)
        .with_to_string("__Hlt::double_to_string")
        .with_to_double("__Hlt::double_to_double")
}

fn bool_type_info(pool: &TypePool, ty: Idx) -> TypeInfo {
    TypeInfo::new(pool, ty)
        .with_to_string("__Hlt::bool_to_string")
        .with_to_int64("__Hlt::bool_to_int64")
}

fn string_type_info(pool: &TypePool, ty: Idx) -> TypeInfo {
    TypeInfo::new(pool, ty).with_to_string("__Hlt::string_to_string")
}

fn plain_type_info(pool: &TypePool, ty: Idx) -> TypeInfo {
    TypeInfo::new(pool, ty)
}

// ── Constructors ────────────────────────────────────────────────────

fn constant(op: &Operand) -> &Constant {
    match op {
        Operand::Const(c) => c,
        other => internal_error(format_args!("expected a constant, found {other}")),
    }
}

fn int_ctor<'ctx>(cg: &mut CodeGen<'_, 'ctx>, op: &Operand) -> BasicValueEnum<'ctx> {
    let c = constant(op);
    let ConstValue::Int(v) = c.value else {
        internal_error(format_args!("{} is not an integer constant", c.value));
    };
    match cg.storage_type(c.ty) {
        BasicTypeEnum::IntType(ty) => ty.const_int(v as u64, true).into(),
        other => internal_error(format_args!("integer stored as {other:?}")),
    }
}

fn bool_ctor<'ctx>(cg: &mut CodeGen<'_, 'ctx>, op: &Operand) -> BasicValueEnum<'ctx> {
    match constant(op).value {
        ConstValue::Bool(b) => cg.context().bool_type().const_int(u64::from(b), false).into(),
        ref other => internal_error(format_args!("{other} is not a boolean constant")),
    }
}

fn double_ctor<'ctx>(cg: &mut CodeGen<'_, 'ctx>, op: &Operand) -> BasicValueEnum<'ctx> {
    match constant(op).value {
        ConstValue::Double(d) => cg.context().f64_type().const_float(d).into(),
        ref other => internal_error(format_args!("{other} is not a double constant")),
    }
}

fn string_ctor<'ctx>(cg: &mut CodeGen<'_, 'ctx>, op: &Operand) -> BasicValueEnum<'ctx> {
    match &constant(op).value {
        ConstValue::String(s) => cg.string_constant(s).into(),
        other => internal_error(format_args!("{other} is not a string constant")),
    }
}

fn null_ctor<'ctx>(cg: &mut CodeGen<'_, 'ctx>, op: &Operand) -> BasicValueEnum<'ctx> {
    match constant(op).value {
        ConstValue::Null => cg.ptr_type().const_null().into(),
        ref other => internal_error(format_args!("{other} is not a reference constant")),
    }
}

fn enum_ctor<'ctx>(cg: &mut CodeGen<'_, 'ctx>, op: &Operand) -> BasicValueEnum<'ctx> {
    let c = constant(op);
    let ConstValue::Enum(label) = &c.value else {
        internal_error(format_args!("{} is not an enum constant", c.value));
    };
    match cg.pool().enum_value(c.ty, label) {
        Some(v) => cg.context().i8_type().const_int(u64::from(v), false).into(),
        None => internal_error(format_args!(
            "{} has no label {label}",
            cg.pool().name(c.ty)
        )),
    }
}

/// Constant elements give a constant aggregate; otherwise the tuple is
/// assembled with `insertvalue`.
fn tuple_ctor<'ctx>(cg: &mut CodeGen<'_, 'ctx>, op: &Operand) -> BasicValueEnum<'ctx> {
    let Operand::Tuple(tuple) = op else {
        internal_error(format_args!("expected a tuple, found {op}"));
    };
    let BasicTypeEnum::StructType(ty) = cg.storage_type(tuple.ty) else {
        internal_error(format_args!("{} is not stored as a struct", cg.pool().name(tuple.ty)));
    };
    let elements: Vec<BasicValueEnum<'ctx>> = tuple
        .elements
        .iter()
        .map(|e| cg.operand_value(e))
        .collect();
    if elements.iter().all(|e| BasicValue::as_instruction_value(e).is_none()) {
        return ty.const_named_struct(&elements).into();
    }

    let Some(builder) = cg.builders.live() else {
        return undef(ty.into());
    };
    let mut aggregate = ty.get_undef();
    for (index, value) in elements.into_iter().enumerate() {
        aggregate = builder
            .build_insert_value(aggregate, value, index as u32, "")
            .expect("insertvalue")
            .into_struct_value();
    }
    aggregate.into()
}

// ── Storage ─────────────────────────────────────────────────────────

fn pointer<'ctx>(cg: &CodeGen<'_, 'ctx>) -> BasicTypeEnum<'ctx> {
    cg.context().ptr_type(AddressSpace::default()).into()
}

fn int_storage<'ctx>(cg: &CodeGen<'_, 'ctx>, ty: Idx) -> BasicTypeEnum<'ctx> {
    match cg.pool().integer_width(ty) {
        Some(width) if width > 0 => cg.context().custom_width_int_type(u32::from(width)).into(),
        _ => internal_error(format_args!(
            "{} has no storage representation",
            cg.pool().name(ty)
        )),
    }
}

fn tuple_storage<'ctx>(cg: &CodeGen<'_, 'ctx>, ty: Idx) -> BasicTypeEnum<'ctx> {
    let elements: Vec<BasicTypeEnum<'ctx>> = cg
        .pool()
        .tuple_elements(ty)
        .unwrap_or(&[])
        .iter()
        .map(|&e| cg.storage_type(e))
        .collect();
    cg.context().struct_type(&elements, false).as_basic_type_enum()
}

// ── C boundary ──────────────────────────────────────────────────────

fn storage_as_c<'ctx>(cg: &CodeGen<'_, 'ctx>, ty: Idx) -> BasicTypeEnum<'ctx> {
    cg.storage_type(ty)
}

fn bool_to_c<'ctx>(
    cg: &mut CodeGen<'_, 'ctx>,
    value: BasicValueEnum<'ctx>,
    _: Idx,
) -> BasicValueEnum<'ctx> {
    let i8t = cg.context().i8_type();
    match cg.builders.live() {
        Some(builder) => builder
            .build_int_z_extend(value.into_int_value(), i8t, "")
            .expect("zext")
            .into(),
        None => i8t.get_undef().into(),
    }
}

#[cfg(test)]
mod tests {
    use inkwell::context::Context;
    use hilti_ir::InstructionSet;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::CodegenOptions;

    #[test]
    fn storage_of_builtin_types() {
        let context = Context::create();
        let mut pool = TypePool::new();
        let i16 = pool.integer(16).unwrap_or_else(|e| panic!("{e}"));
        let pair = pool.tuple(&[i16, Idx::BOOL]);
        let set = InstructionSet::new();
        let cg = CodeGen::new(&context, &pool, &set, CodegenOptions::default());

        let ptr = context.ptr_type(AddressSpace::default());
        assert_eq!(cg.storage_type(i16), context.i16_type().into());
        assert_eq!(cg.storage_type(Idx::BOOL), context.bool_type().into());
        assert_eq!(cg.storage_type(Idx::BYTES), ptr.into());
        assert_eq!(
            cg.storage_type(pair),
            context
                .struct_type(&[context.i16_type().into(), context.bool_type().into()], false)
                .into()
        );
        assert_eq!(
            cg.storage_type(Idx::ITERATOR_BYTES),
            context.struct_type(&[ptr.into(), ptr.into()], false).into()
        );
    }

    #[test]
    fn bool_crosses_as_int8() {
        let context = Context::create();
        let pool = TypePool::new();
        let set = InstructionSet::new();
        let cg = CodeGen::new(&context, &pool, &set, CodegenOptions::default());
        assert_eq!(cg.c_param_type(Idx::BOOL), context.i8_type().into());
        assert_eq!(cg.c_param_type(Idx::DOUBLE), context.f64_type().into());
    }

    #[test]
    #[should_panic(expected = "int<*> has no storage representation")]
    fn wildcard_integer_has_no_storage() {
        let context = Context::create();
        let mut pool = TypePool::new();
        let any_int = pool.wildcard(Tag::Integer).unwrap_or_else(|e| panic!("{e}"));
        let set = InstructionSet::new();
        let cg = CodeGen::new(&context, &pool, &set, CodegenOptions::default());
        cg.storage_type(any_int);
    }

    #[test]
    fn conversion_hooks() {
        let mut pool = TypePool::new();
        let i64 = pool.integer(64).unwrap_or_else(|e| panic!("{e}"));
        let tables = Tables::builtin();

        let info = tables.type_info.get(&pool, i64)(&pool, i64);
        assert_eq!(info.to_string.as_deref(), Some("__Hlt::int_to_string"));
        assert_eq!(info.to_int64.as_deref(), Some("__Hlt::int_to_int64"));
        assert_eq!(info.to_double, None);

        let info = tables.type_info.get(&pool, Idx::BYTES)(&pool, Idx::BYTES);
        assert_eq!(info.to_string, None);
    }

    #[test]
    fn c_mapping_document() {
        let pool = TypePool::new();
        let doc = Tables::builtin().document_c_mapping(&pool);
        let first = doc.lines().next().unwrap_or_default();
        assert_eq!(first, "bool: int8_t, 0 or 1");
        assert_eq!(doc.lines().count(), 6);
    }
}

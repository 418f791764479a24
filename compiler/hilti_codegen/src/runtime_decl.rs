//! Functions provided by the HILTI runtime library.
//!
//! Declared into a module on first use. Conversion hooks of the built-in
//! types name these by their HILTI-level name (`__Hlt::int_to_string`);
//! the native symbol is the C-mangled form.

use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum};
use inkwell::values::FunctionValue;
use inkwell::AddressSpace;

/// The allocator behind frames and exception objects.
pub const MALLOC: &str = "__hlt_malloc";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rt {
    I32,
    I64,
    Double,
    Ptr,
}

impl Rt {
    fn native(self, context: &Context) -> BasicTypeEnum<'_> {
        match self {
            Rt::I32 => context.i32_type().into(),
            Rt::I64 => context.i64_type().into(),
            Rt::Double => context.f64_type().into(),
            Rt::Ptr => context.ptr_type(AddressSpace::default()).into(),
        }
    }
}

/// One runtime entry point.
#[derive(Debug)]
pub struct RuntimeFunction {
    /// Name as HILTI code refers to it.
    pub name: &'static str,
    pub symbol: &'static str,
    params: &'static [Rt],
    ret: Rt,
}

impl RuntimeFunction {
    pub fn params<'ctx>(&self, context: &'ctx Context) -> Vec<BasicTypeEnum<'ctx>> {
        self.params.iter().map(|p| p.native(context)).collect()
    }

    pub fn ret<'ctx>(&self, context: &'ctx Context) -> BasicTypeEnum<'ctx> {
        self.ret.native(context)
    }
}

// to_string: (type info, object, options, exception slot)
// to_int64 / to_double: (type info, object, exception slot)
const RUNTIME: &[RuntimeFunction] = &[
    RuntimeFunction {
        name: MALLOC,
        symbol: MALLOC,
        params: &[Rt::I64],
        ret: Rt::Ptr,
    },
    RuntimeFunction {
        name: "__Hlt::int_to_string",
        symbol: "__Hlt_int_to_string",
        params: &[Rt::Ptr, Rt::Ptr, Rt::I32, Rt::Ptr],
        ret: Rt::Ptr,
    },
    RuntimeFunction {
        name: "__Hlt::int_to_int64",
        symbol: "__Hlt_int_to_int64",
        params: &[Rt::Ptr, Rt::Ptr, Rt::Ptr],
        ret: Rt::I64,
    },
    RuntimeFunction {
        name: "__Hlt::bool_to_string",
        symbol: "__Hlt_bool_to_string",
        params: &[Rt::Ptr, Rt::Ptr, Rt::I32, Rt::Ptr],
        ret: Rt::Ptr,
    },
    RuntimeFunction {
        name: "__Hlt::bool_to_int64",
        symbol: "__Hlt_bool_to_int64",
        params: &[Rt::Ptr, Rt::Ptr, Rt::Ptr],
        ret: Rt::I64,
    },
    RuntimeFunction {
        name: "__Hlt::double_to_string",
        symbol: "__Hlt_double_to_string",
        params: &[Rt::Ptr, Rt::Ptr, Rt::I32, Rt::Ptr],
        ret: Rt::Ptr,
    },
    RuntimeFunction {
        name: "__Hlt::double_to_double",
        symbol: "__Hlt_double_to_double",
        params: &[Rt::Ptr, Rt::Ptr, Rt::Ptr],
        ret: Rt::Double,
    },
    RuntimeFunction {
        name: "__Hlt::string_to_string",
        symbol: "__Hlt_string_to_string",
        params: &[Rt::Ptr, Rt::Ptr, Rt::I32, Rt::Ptr],
        ret: Rt::Ptr,
    },
];

/// Look up a runtime function by its HILTI-level name.
pub fn lookup(name: &str) -> Option<&'static RuntimeFunction> {
    RUNTIME.iter().find(|f| f.name == name)
}

/// Declare `function` in `module` unless already present.
pub fn declare<'ctx>(
    context: &'ctx Context,
    module: &Module<'ctx>,
    function: &RuntimeFunction,
) -> FunctionValue<'ctx> {
    if let Some(existing) = module.get_function(function.symbol) {
        return existing;
    }
    tracing::trace!(symbol = function.symbol, "declare runtime function");
    let params: Vec<BasicMetadataTypeEnum<'ctx>> = function
        .params(context)
        .into_iter()
        .map(Into::into)
        .collect();
    let ty = function.ret(context).fn_type(&params, false);
    module.add_function(function.symbol, ty, Some(Linkage::External))
}

/// Declare the runtime function named `name`, if there is one.
pub fn declare_by_name<'ctx>(
    context: &'ctx Context,
    module: &Module<'ctx>,
    name: &str,
) -> Option<FunctionValue<'ctx>> {
    lookup(name).map(|function| declare(context, module, function))
}

/// Every runtime entry point, for binding at load time.
pub fn all() -> impl Iterator<Item = &'static RuntimeFunction> {
    RUNTIME.iter()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn conversion_hooks_are_known() {
        let context = Context::create();
        let f = lookup("__Hlt::int_to_string").unwrap_or_else(|| panic!("missing"));
        assert_eq!(f.symbol, "__Hlt_int_to_string");
        assert_eq!(f.params(&context).len(), 4);
        assert!(lookup("__Hlt::no_such_thing").is_none());
        assert_eq!(all().count(), 8);
    }

    #[test]
    fn declare_by_name_skips_unknown_functions() {
        let context = Context::create();
        let module = context.create_module("m");
        let declared = declare_by_name(&context, &module, "__Hlt::double_to_double")
            .unwrap_or_else(|| panic!("not declared"));
        assert_eq!(declared.get_name().to_str(), Ok("__Hlt_double_to_double"));
        assert!(declare_by_name(&context, &module, "nope").is_none());
        assert_eq!(
            declared.get_type().get_return_type(),
            Some(context.f64_type().into())
        );
    }

    #[test]
    fn declaring_twice_is_idempotent() {
        let context = Context::create();
        let module = context.create_module("m");
        let malloc = lookup(MALLOC).unwrap_or_else(|| panic!("missing"));
        let first = declare(&context, &module, malloc);
        let second = declare(&context, &module, malloc);
        assert_eq!(first, second);
        assert_eq!(module.get_functions().count(), 1);
        assert!(module
            .print_to_string()
            .to_string()
            .contains("declare ptr @__hlt_malloc(i64)"));
    }
}

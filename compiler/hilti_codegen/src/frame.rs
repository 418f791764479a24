//! Frame layouts.
//!
//! A frame replaces a native stack frame. Every frame starts with the
//! same three fields, so support code can reach them through the base
//! frame type without knowing which function the frame belongs to:
//!
//! ```text
//! %__hlt_bframe = type { %__hlt_continuation,  ; normal continuation
//!                        %__hlt_continuation,  ; exception continuation
//!                        ptr }                 ; pending exception
//! %__hlt_continuation = type { ptr, ptr }      ; successor, frame
//! ```
//!
//! Parameters and then locals follow, one field each, in declaration
//! order.

use std::fmt;

use inkwell::context::Context;
use inkwell::types::{AnyType, BasicType, BasicTypeEnum, StructType};
use inkwell::AddressSpace;
use rustc_hash::FxHashMap;

pub const FRAME_CONT_NORMAL: u32 = 0;
pub const FRAME_CONT_EXCEPT: u32 = 1;
pub const FRAME_EXCEPTION: u32 = 2;
/// Index of the first parameter or local.
pub const FRAME_FIRST_LOCAL: u32 = 3;

pub const CONT_SUCCESSOR: u32 = 0;
pub const CONT_FRAME: u32 = 1;

pub const CONTINUATION_TYPE: &str = "__hlt_continuation";
pub const BASE_FRAME_TYPE: &str = "__hlt_bframe";
/// `{ ptr type_info, ptr argument }`
pub const EXCEPTION_TYPE: &str = "__hlt_exception";

const PREFIX_NAMES: [&str; 3] = ["cont_normal", "cont_except", "exception"];

/// The named struct `name` with body `fields`.
///
/// Named structs live in the context, so a type defined for an earlier
/// unit is reused when its body matches. On a clash LLVM renames the new
/// type.
pub fn named_struct<'ctx>(
    context: &'ctx Context,
    name: &str,
    fields: &[BasicTypeEnum<'ctx>],
) -> StructType<'ctx> {
    if let Some(existing) = context.get_struct_type(name) {
        if existing.get_field_types() == fields {
            return existing;
        }
    }
    let ty = context.opaque_struct_type(name);
    ty.set_body(fields, false);
    ty
}

pub fn continuation_type(context: &Context) -> StructType<'_> {
    let ptr = context.ptr_type(AddressSpace::default()).as_basic_type_enum();
    named_struct(context, CONTINUATION_TYPE, &[ptr, ptr])
}

pub fn base_frame_type(context: &Context) -> StructType<'_> {
    named_struct(context, BASE_FRAME_TYPE, &prefix_fields(context))
}

pub fn exception_type(context: &Context) -> StructType<'_> {
    let ptr = context.ptr_type(AddressSpace::default()).as_basic_type_enum();
    named_struct(context, EXCEPTION_TYPE, &[ptr, ptr])
}

fn prefix_fields(context: &Context) -> [BasicTypeEnum<'_>; 3] {
    let cont = continuation_type(context).as_basic_type_enum();
    let ptr = context.ptr_type(AddressSpace::default()).as_basic_type_enum();
    [cont, cont, ptr]
}

/// Field layout of one function's frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameLayout<'ctx> {
    ty: StructType<'ctx>,
    names: Vec<String>,
    index: FxHashMap<String, u32>,
}

impl<'ctx> FrameLayout<'ctx> {
    /// Layout of the struct type `name` with the fixed prefix followed by
    /// `slots`.
    pub fn new(
        context: &'ctx Context,
        name: &str,
        slots: impl IntoIterator<Item = (String, BasicTypeEnum<'ctx>)>,
    ) -> Self {
        let mut names: Vec<String> = PREFIX_NAMES.iter().map(|&n| n.to_owned()).collect();
        let mut fields = prefix_fields(context).to_vec();
        for (slot, ty) in slots {
            names.push(slot);
            fields.push(ty);
        }

        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i as u32))
            .collect();
        FrameLayout {
            ty: named_struct(context, name, &fields),
            names,
            index,
        }
    }

    /// Struct type name.
    pub fn name(&self) -> String {
        self.ty
            .get_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn ty(&self) -> StructType<'ctx> {
        self.ty
    }

    /// Position of the field holding `name`.
    pub fn field_index(&self, name: &str) -> Option<u32> {
        self.index.get(name).copied()
    }

}

impl fmt::Display for FrameLayout<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{} {{", self.name())?;
        for (i, (name, ty)) in self.names.iter().zip(self.ty.get_field_types()).enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, " {name}: {}", ty.print_to_string().to_string_lossy())?;
        }
        f.write_str(" }")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn layout(context: &Context) -> FrameLayout<'_> {
        FrameLayout::new(
            context,
            "__frame_hlt_f",
            [
                ("a".to_owned(), context.i64_type().into()),
                ("b".to_owned(), context.bool_type().into()),
            ],
        )
    }

    #[test]
    fn prefix_then_locals_in_order() {
        let context = Context::create();
        let layout = layout(&context);
        let fields = layout.ty().get_field_types();
        assert_eq!(fields.len(), FRAME_FIRST_LOCAL as usize + 2);
        assert_eq!(fields[FRAME_FIRST_LOCAL as usize], BasicTypeEnum::from(context.i64_type()));
        assert_eq!(fields[FRAME_FIRST_LOCAL as usize + 1], BasicTypeEnum::from(context.bool_type()));
    }

    #[test]
    fn field_index_is_stable() {
        let context = Context::create();
        let layout = layout(&context);
        for _ in 0..3 {
            assert_eq!(layout.field_index("cont_normal"), Some(FRAME_CONT_NORMAL));
            assert_eq!(layout.field_index("exception"), Some(FRAME_EXCEPTION));
            assert_eq!(layout.field_index("a"), Some(FRAME_FIRST_LOCAL));
            assert_eq!(layout.field_index("b"), Some(FRAME_FIRST_LOCAL + 1));
        }
        assert_eq!(layout.field_index("c"), None);
    }

    #[test]
    fn prefix_matches_base_frame() {
        let context = Context::create();
        let base = base_frame_type(&context).get_field_types();
        let empty = FrameLayout::new(&context, "__frame_hlt_g", []);
        assert_eq!(base, empty.ty().get_field_types());
        assert_eq!(&layout(&context).ty().get_field_types()[..3], base.as_slice());
    }

    #[test]
    fn struct_types_are_reused_within_a_context() {
        let context = Context::create();
        let first = layout(&context);
        let again = layout(&context);
        assert_eq!(first.ty(), again.ty());
        assert_eq!(again.name(), "__frame_hlt_f");
        assert_eq!(continuation_type(&context), continuation_type(&context));
    }

    #[test]
    fn display() {
        let context = Context::create();
        assert_eq!(
            layout(&context).to_string(),
            "%__frame_hlt_f { cont_normal: %__hlt_continuation, cont_except: %__hlt_continuation, \
             exception: ptr, a: i64, b: i1 }"
        );
    }
}

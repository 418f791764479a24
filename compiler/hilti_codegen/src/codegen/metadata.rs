//! Runtime type descriptors.
//!
//! Descriptors may point at each other through their type parameters, so
//! they are emitted in two passes: first every global is declared, then
//! every initializer is built. Lowering declares the descriptors it
//! refers to on demand.

use inkwell::module::Linkage;
use inkwell::types::{BasicTypeEnum, StructType};
use inkwell::values::{BasicValueEnum, GlobalValue, PointerValue};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use hilti_diagnostic::internal_error;
use hilti_types::{type_info_symbol, Idx, TypeInfo, TypeInfoParam};

use super::CodeGen;
use crate::mangle;
use crate::runtime_decl;

impl<'a, 'ctx> CodeGen<'a, 'ctx> {
    /// The descriptor global of the concrete type `ty`, declared without
    /// an initializer on first use.
    pub(super) fn type_info_global(&mut self, ty: Idx) -> GlobalValue<'ctx> {
        let symbol = type_info_symbol(self.pool.name(ty));
        if let Some(global) = self.native.get_global(&symbol) {
            return global;
        }
        let info = self.type_info(ty);
        let global = self.native.add_global(self.type_info_struct(&info), None, &symbol);
        global.set_linkage(Linkage::LinkOnceAny);
        global.set_constant(true);
        global
    }

    /// `{ i16, ptr, i16, ptr, ptr, ptr, <params> }`
    fn type_info_struct(&self, info: &TypeInfo) -> StructType<'ctx> {
        let i16t: BasicTypeEnum<'ctx> = self.context.i16_type().into();
        let ptr: BasicTypeEnum<'ctx> = self.ptr_type().into();
        let mut fields = vec![i16t, ptr, i16t, ptr, ptr, ptr];
        fields.extend(info.params.iter().map(|param| match param {
            TypeInfoParam::Int(_) => self.context.i64_type().into(),
            TypeInfoParam::Type(_) => ptr,
        }));
        self.context.struct_type(&fields, false)
    }

    /// Emit a descriptor for every concrete HILTI type of the pool.
    pub(super) fn emit_type_infos(&mut self) {
        let mut seen = FxHashSet::default();
        let types: Vec<Idx> = self
            .pool
            .hilti_types()
            .filter(|&ty| self.pool.is_concrete(ty) && self.pool.tag(ty).type_id().is_some())
            .filter(|&ty| seen.insert(type_info_symbol(self.pool.name(ty))))
            .collect();
        debug!(count = types.len(), "emitting type descriptors");

        for &ty in &types {
            self.type_info_global(ty);
        }
        for &ty in &types {
            let info = self.type_info(ty);
            self.define_type_info(&info);
        }
    }

    fn define_type_info(&mut self, info: &TypeInfo) {
        trace!(symbol = %info.symbol, "type descriptor");
        let Some(global) = self.native.get_global(&info.symbol) else {
            internal_error(format_args!("descriptor @{} was not declared", info.symbol));
        };

        let mut name = info.name.clone().into_bytes();
        name.push(0);
        let name = self.context.const_string(&name, false);
        let name_global = self
            .native
            .add_global(name.get_type(), None, &format!("{}_name", info.symbol));
        name_global.set_linkage(Linkage::LinkOnceAny);
        name_global.set_constant(true);
        name_global.set_initializer(&name);

        let num_params = u64::try_from(info.params.len())
            .unwrap_or_else(|_| internal_error("too many type parameters"));
        let i16t = self.context.i16_type();
        let mut fields: Vec<BasicValueEnum<'ctx>> = vec![
            i16t.const_int(u64::from(info.type_id), false).into(),
            name_global.as_pointer_value().into(),
            i16t.const_int(num_params, false).into(),
        ];
        for hook in [&info.to_string, &info.to_int64, &info.to_double] {
            let hook = match hook {
                Some(function) => self.conversion_function(function),
                None => self.ptr_type().const_null(),
            };
            fields.push(hook.into());
        }
        for param in &info.params {
            fields.push(match *param {
                TypeInfoParam::Int(v) => self.context.i64_type().const_int(v as u64, true).into(),
                TypeInfoParam::Type(nested) => {
                    let symbol = type_info_symbol(self.pool.name(nested));
                    match self.native.get_global(&symbol) {
                        Some(descriptor) => descriptor.as_pointer_value().into(),
                        None => internal_error(format_args!(
                            "unsupported type parameter {} of {}",
                            self.pool.name(nested),
                            info.name
                        )),
                    }
                }
            });
        }
        global.set_initializer(&self.context.const_struct(&fields, false));
    }

    /// Address of a conversion hook: a function of the unit, or else one
    /// of the runtime library.
    fn conversion_function(&mut self, name: &str) -> PointerValue<'ctx> {
        if let Some(function) = self.unit.and_then(|unit| unit.function(name)) {
            let symbol = mangle::function_name(&function.name, function.cc);
            if let Some(native) = self.native.get_function(&symbol) {
                return native.as_global_value().as_pointer_value();
            }
        }
        match runtime_decl::declare_by_name(self.context, &self.native, name) {
            Some(function) => function.as_global_value().as_pointer_value(),
            None => internal_error(format_args!("unknown conversion function {name}")),
        }
    }
}

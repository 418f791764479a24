//! Runtime functions for JIT-compiled HILTI code.
//!
//! Bound to the declarations of [`crate::runtime_decl`] when a module is
//! loaded into an [`crate::exec::Machine`]. The `#[repr(C)]` types mirror
//! the layouts the code generator emits.
//!
//! # Safety
//!
//! The hooks are called from generated code, which passes a valid
//! descriptor and a pointer to a value of the described type.

#![allow(unsafe_code)]
#![allow(clippy::not_unsafe_ptr_arg_deref)]
// Native symbols follow the runtime's C naming.
#![allow(non_snake_case)]

use std::alloc::{alloc_zeroed, Layout};
use std::ffi::{c_char, CStr};

/// Fixed part of a type descriptor; parameters follow at
/// [`TypeInfoHeader::PARAMS_OFFSET`].
#[repr(C)]
pub struct TypeInfoHeader {
    pub type_id: i16,
    pub name: *const c_char,
    pub num_params: i16,
    pub to_string: *const u8,
    pub to_int64: *const u8,
    pub to_double: *const u8,
}

impl TypeInfoHeader {
    pub const PARAMS_OFFSET: usize = std::mem::size_of::<TypeInfoHeader>();

    /// # Safety
    /// `self.name` must point at a NUL-terminated string.
    pub unsafe fn name(&self) -> String {
        if self.name.is_null() {
            return String::new();
        }
        CStr::from_ptr(self.name).to_string_lossy().into_owned()
    }

    /// The `index`th parameter as an integer.
    ///
    /// # Safety
    /// `self` must be a full descriptor with more than `index` parameters.
    pub unsafe fn int_param(&self, index: usize) -> i64 {
        let base = (self as *const Self).cast::<u8>().add(Self::PARAMS_OFFSET);
        base.cast::<i64>().add(index).read()
    }
}

/// `{ ptr type_info, ptr argument }`
#[repr(C)]
pub struct HltException {
    pub type_info: *const TypeInfoHeader,
    pub arg: *const u8,
}

/// Header of `{ i64 len, [len x i8] }`.
#[repr(C)]
pub struct HltString {
    pub len: i64,
}

impl HltString {
    /// # Safety
    /// `s` must be null or point at a string object.
    pub unsafe fn to_rust(s: *const HltString) -> String {
        if s.is_null() {
            return String::new();
        }
        let len = usize::try_from((*s).len).unwrap_or(0);
        let data = s.cast::<u8>().add(std::mem::size_of::<HltString>());
        String::from_utf8_lossy(std::slice::from_raw_parts(data, len)).into_owned()
    }

    fn alloc(text: &str) -> *const HltString {
        let header = std::mem::size_of::<HltString>();
        let s = __hlt_malloc((header + text.len()) as i64).cast::<HltString>();
        // SAFETY: freshly allocated with room for header and text.
        unsafe {
            (*s).len = text.len() as i64;
            std::ptr::copy_nonoverlapping(text.as_ptr(), s.cast::<u8>().add(header), text.len());
        }
        s
    }
}

/// Zeroed heap memory. Never freed: frames and exceptions live as long
/// as the process.
#[no_mangle]
pub extern "C" fn __hlt_malloc(size: i64) -> *mut u8 {
    let size = usize::try_from(size).unwrap_or(0).max(1);
    let Ok(layout) = Layout::from_size_align(size, 16) else {
        return std::ptr::null_mut();
    };
    // SAFETY: layout has non-zero size.
    unsafe { alloc_zeroed(layout) }
}

/// Value of an `int<width>` at `obj`, sign-extended.
unsafe fn read_int(type_info: *const TypeInfoHeader, obj: *const u8) -> i64 {
    let width = (*type_info).int_param(0);
    let raw = match width {
        1..=8 => i64::from(obj.cast::<i8>().read()),
        9..=16 => i64::from(obj.cast::<i16>().read_unaligned()),
        17..=32 => i64::from(obj.cast::<i32>().read_unaligned()),
        _ => obj.cast::<i64>().read_unaligned(),
    };
    let shift = 64 - width.clamp(1, 64);
    (raw << shift) >> shift
}

#[no_mangle]
pub extern "C" fn __Hlt_int_to_int64(
    type_info: *const TypeInfoHeader,
    obj: *const u8,
    _excpt: *mut *mut HltException,
) -> i64 {
    // SAFETY: see module docs.
    unsafe { read_int(type_info, obj) }
}

#[no_mangle]
pub extern "C" fn __Hlt_int_to_string(
    type_info: *const TypeInfoHeader,
    obj: *const u8,
    _options: i32,
    _excpt: *mut *mut HltException,
) -> *const HltString {
    // SAFETY: see module docs.
    let value = unsafe { read_int(type_info, obj) };
    HltString::alloc(&value.to_string())
}

#[no_mangle]
pub extern "C" fn __Hlt_bool_to_int64(
    _type_info: *const TypeInfoHeader,
    obj: *const u8,
    _excpt: *mut *mut HltException,
) -> i64 {
    // SAFETY: see module docs.
    i64::from(unsafe { obj.read() } & 1)
}

#[no_mangle]
pub extern "C" fn __Hlt_bool_to_string(
    type_info: *const TypeInfoHeader,
    obj: *const u8,
    _options: i32,
    excpt: *mut *mut HltException,
) -> *const HltString {
    let text = if __Hlt_bool_to_int64(type_info, obj, excpt) == 0 {
        "False"
    } else {
        "True"
    };
    HltString::alloc(text)
}

#[no_mangle]
pub extern "C" fn __Hlt_double_to_double(
    _type_info: *const TypeInfoHeader,
    obj: *const u8,
    _excpt: *mut *mut HltException,
) -> f64 {
    // SAFETY: see module docs.
    unsafe { obj.cast::<f64>().read_unaligned() }
}

#[no_mangle]
pub extern "C" fn __Hlt_double_to_string(
    type_info: *const TypeInfoHeader,
    obj: *const u8,
    _options: i32,
    excpt: *mut *mut HltException,
) -> *const HltString {
    HltString::alloc(&__Hlt_double_to_double(type_info, obj, excpt).to_string())
}

/// Strings are stored as pointers; `obj` points at the pointer.
#[no_mangle]
pub extern "C" fn __Hlt_string_to_string(
    _type_info: *const TypeInfoHeader,
    obj: *const u8,
    _options: i32,
    _excpt: *mut *mut HltException,
) -> *const HltString {
    // SAFETY: see module docs.
    unsafe { obj.cast::<*const HltString>().read_unaligned() }
}

/// Address of the implementation of the runtime symbol `symbol`.
pub fn address_of(symbol: &str) -> Option<usize> {
    let addr = match symbol {
        "__hlt_malloc" => __hlt_malloc as *const () as usize,
        "__Hlt_int_to_string" => __Hlt_int_to_string as *const () as usize,
        "__Hlt_int_to_int64" => __Hlt_int_to_int64 as *const () as usize,
        "__Hlt_bool_to_string" => __Hlt_bool_to_string as *const () as usize,
        "__Hlt_bool_to_int64" => __Hlt_bool_to_int64 as *const () as usize,
        "__Hlt_double_to_string" => __Hlt_double_to_string as *const () as usize,
        "__Hlt_double_to_double" => __Hlt_double_to_double as *const () as usize,
        "__Hlt_string_to_string" => __Hlt_string_to_string as *const () as usize,
        _ => return None,
    };
    Some(addr)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::runtime_decl;

    /// A descriptor of `int<width>`.
    #[repr(C)]
    struct IntInfo {
        header: TypeInfoHeader,
        width: i64,
    }

    fn int_info(width: i64) -> IntInfo {
        IntInfo {
            header: TypeInfoHeader {
                type_id: 1,
                name: c"int<16>".as_ptr(),
                num_params: 1,
                to_string: std::ptr::null(),
                to_int64: std::ptr::null(),
                to_double: std::ptr::null(),
            },
            width,
        }
    }

    #[test]
    fn every_declared_function_has_an_implementation() {
        for function in runtime_decl::all() {
            assert!(address_of(function.symbol).is_some(), "{}", function.symbol);
        }
        assert_eq!(address_of("printf"), None);
    }

    #[test]
    fn params_follow_header() {
        let info = int_info(16);
        assert_eq!(unsafe { info.header.int_param(0) }, info.width);
        assert_eq!(unsafe { info.header.name() }, "int<16>");
    }

    #[test]
    fn narrow_ints_are_sign_extended() {
        let info = int_info(16);
        let value: i16 = -3;
        let obj = std::ptr::addr_of!(value).cast::<u8>();
        let ti = std::ptr::addr_of!(info).cast::<TypeInfoHeader>();
        assert_eq!(__Hlt_int_to_int64(ti, obj, std::ptr::null_mut()), -3);

        let s = __Hlt_int_to_string(ti, obj, 0, std::ptr::null_mut());
        assert_eq!(unsafe { HltString::to_rust(s) }, "-3");
    }

    #[test]
    fn bools_and_doubles() {
        let null = std::ptr::null();
        let yes = 1_u8;
        let s = __Hlt_bool_to_string(null, std::ptr::addr_of!(yes), 0, std::ptr::null_mut());
        assert_eq!(unsafe { HltString::to_rust(s) }, "True");

        let d = 2.5_f64;
        let obj = std::ptr::addr_of!(d).cast::<u8>();
        assert_eq!(__Hlt_double_to_double(null, obj, std::ptr::null_mut()), 2.5);
    }

    #[test]
    fn malloc_is_zeroed() {
        let p = __hlt_malloc(32);
        assert!(!p.is_null());
        let bytes = unsafe { std::slice::from_raw_parts(p, 32) };
        assert!(bytes.iter().all(|&b| b == 0));
    }
}

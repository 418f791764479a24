#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use super::*;

#[test]
fn struct_name_and_identity() {
    let mut pool = TypePool::new();
    let int = pool.integer(64).unwrap();
    let fields = vec![StructField::new("a", int), StructField::new("b", Idx::BOOL)];
    let s1 = pool.register_struct(fields.clone());
    let s2 = pool.register_struct(fields);
    assert_eq!(s1, s2);
    assert_eq!(pool.name(s1), "struct { a int<64>, b bool }");
    assert_eq!(pool.lookup("struct { a int<64>, b bool }"), Some(s1));
    assert!(pool.tag(s1).is_heap_type());
}

#[test]
fn enum_has_implicit_undef() {
    let mut pool = TypePool::new();
    let e = pool.register_enum(&["Red", "Green"]);
    assert_eq!(pool.name(e), "enum { Red, Green }");
    assert_eq!(pool.enum_value(e, "Undef"), Some(0));
    assert_eq!(pool.enum_value(e, "Green"), Some(2));
    assert_eq!(pool.enum_value(e, "Blue"), None);
}

#[test]
fn bitset_assigns_bits() {
    let mut pool = TypePool::new();
    let b = pool
        .register_bitset(&[("A", None), ("B", Some(5)), ("C", None)])
        .unwrap();
    assert_eq!(pool.name(b), "bitset { A = 0, B = 5, C = 6 }");
}

#[test]
fn bitset_rejects_high_bits() {
    let mut pool = TypePool::new();
    let err = pool.register_bitset(&[("X", Some(64))]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "error in type parameter: bitset can only store bits 0..63 (X)"
    );
}

// Exceptions

#[test]
fn unset_base_is_root() {
    let mut pool = TypePool::new();
    let e = pool.register_exception("IOError", None, None).unwrap();
    assert_eq!(pool.exception_base(e), Some(pool.exception_root()));
    assert_eq!(pool.exception_base(pool.exception_root()), None);
    assert_eq!(pool.name(e), "exception IOError");
}

#[test]
fn exception_tree() {
    let mut pool = TypePool::new();
    let int = pool.integer(32).unwrap();
    let io = pool.register_exception("IOError", Some(int), None).unwrap();
    let eof = pool.register_exception("EOF", None, Some(io)).unwrap();
    let other = pool.register_exception("Other", None, None).unwrap();

    assert!(pool.is_exception_subtype(eof, io));
    assert!(pool.is_exception_subtype(eof, Idx::EXCEPTION));
    assert!(pool.is_exception_subtype(io, io));
    assert!(!pool.is_exception_subtype(io, eof));
    assert!(!pool.is_exception_subtype(eof, other));
    assert_eq!(pool.exception_arg(io), Some(int));
}

#[test]
fn exception_validation() {
    let mut pool = TypePool::new();
    assert!(pool.register_exception("Bad", None, Some(Idx::BOOL)).is_err());
    assert!(pool.register_exception("Bad", Some(Idx::BYTES), None).is_err());
}

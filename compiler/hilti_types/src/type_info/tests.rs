#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::{StructField, Tag};

// Symbols

#[test]
fn symbol_canonicalization() {
    assert_eq!(type_info_symbol("int<64>"), "__hlt_type_info_int_64");
    assert_eq!(type_info_symbol("bool"), "__hlt_type_info_bool");
    assert_eq!(
        type_info_symbol("tuple<int<64>,bool>"),
        "__hlt_type_info_tuple_int_64_bool"
    );
    assert_eq!(
        type_info_symbol("struct { a int<64>, b bool }"),
        "__hlt_type_info_struct_a_int_64_b_bool"
    );
    assert_eq!(type_info_symbol("ref<__x>"), "__hlt_type_info_ref_x");
}

fn builtin_type_names() -> Vec<String> {
    let mut pool = TypePool::new();
    let mut names = Vec::new();
    let plain = [
        "int8", "int16", "int32", "int64", "double", "string", "bool", "bytes", "addr", "net",
        "port", "regexp",
    ];
    for kw in plain {
        let idx = pool.resolve_type(kw, &[]).unwrap();
        names.push(pool.name(idx).to_owned());
    }
    for width in 1..=64 {
        let idx = pool.integer(width).unwrap();
        names.push(pool.name(idx).to_owned());
    }
    for idx in pool.hilti_types().collect::<Vec<_>>() {
        names.push(pool.name(idx).to_owned());
    }
    names.sort();
    names.dedup();
    names
}

#[test]
fn builtin_symbols_do_not_collide() {
    let names = builtin_type_names();
    let mut symbols: Vec<String> = names.iter().map(|n| type_info_symbol(n)).collect();
    symbols.sort();
    let before = symbols.len();
    symbols.dedup();
    assert_eq!(symbols.len(), before);
}

proptest! {
    #[test]
    fn symbol_is_deterministic_and_clean(name in "[a-z<>,{} _0-9]{0,24}") {
        let a = type_info_symbol(&name);
        let b = type_info_symbol(&name);
        prop_assert_eq!(&a, &b);
        let body = &a[TYPE_INFO_PREFIX.len()..];
        prop_assert!(!body.contains("__"));
        prop_assert!(!body.ends_with('_'));
        let forbidden = ['<', '>', ',', '{', '}', ' '];
        prop_assert!(!body.contains(forbidden));
    }
}

// Records

#[test]
fn record_for_integer() {
    let mut pool = TypePool::new();
    let int = pool.integer(16).unwrap();
    let info = TypeInfo::new(&pool, int).with_to_string("__Hlt::int_to_string");
    assert_eq!(info.type_id, 1);
    assert_eq!(info.name, "int<16>");
    assert_eq!(info.symbol, "__hlt_type_info_int_16");
    assert_eq!(info.params, vec![TypeInfoParam::Int(16)]);
    assert_eq!(info.to_string.as_deref(), Some("__Hlt::int_to_string"));
    assert_eq!(info.to_int64, None);
}

#[test]
fn record_for_channel_nests_item() {
    let mut pool = TypePool::new();
    let int = pool.integer(8).unwrap();
    let chan = pool.channel(int, None).unwrap();
    let info = TypeInfo::new(&pool, chan);
    assert_eq!(info.type_id, Tag::Channel.type_id().unwrap());
    assert_eq!(
        info.params,
        vec![TypeInfoParam::Type(int), TypeInfoParam::Int(0)]
    );
    assert_eq!(info.num_params(), 2);
}

#[test]
fn record_for_struct_has_no_params() {
    let mut pool = TypePool::new();
    let s = pool.register_struct(vec![StructField::new("x", Idx::BOOL)]);
    assert!(TypeInfo::new(&pool, s).params.is_empty());
}

#[test]
#[should_panic(expected = "internal compiler error")]
fn record_for_wildcard_is_a_defect() {
    let mut pool = TypePool::new();
    let any_ref = pool.wildcard(Tag::Reference).unwrap();
    let _ = TypeInfo::new(&pool, any_ref);
}

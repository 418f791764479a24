use pretty_assertions::assert_eq;

use hilti_types::{FunctionParam, Idx, TypePool};

use crate::{Block, CallingConvention, Id, Instruction, Module, ModuleItem};

use super::Function;

fn sample(pool: &mut TypePool) -> Function {
    let i64t = pool.integer(64).unwrap_or_else(|e| panic!("{e}"));
    let ty = pool.function(vec![FunctionParam::new("n", i64t)], Idx::BOOL);
    Function::new(pool, "Main::check", ty, CallingConvention::Hilti)
}

#[test]
fn params_come_from_the_type() {
    let mut pool = TypePool::new();
    let f = sample(&mut pool);
    assert_eq!(f.params.len(), 1);
    assert_eq!(f.params[0].name, "n");
    assert!(f.params[0].is_frame_slot());
    assert_eq!(f.result(&pool), Idx::BOOL);
}

#[test]
fn ids_list_params_before_locals() {
    let mut pool = TypePool::new();
    let mut f = sample(&mut pool);
    f.add_local("ok", Idx::BOOL);
    let names: Vec<&str> = f.ids().map(|id| id.name.as_str()).collect();
    assert_eq!(names, vec!["n", "ok"]);
}

#[test]
fn declarations_have_no_blocks() {
    let mut pool = TypePool::new();
    let mut f = sample(&mut pool);
    assert!(f.is_declaration());
    f.add_block(Block::new().with(Instruction::new("return.void")));
    f.add_block(Block::labeled("done"));
    assert!(!f.is_declaration());
    assert!(f.block("done").is_some());
    assert!(f.block("missing").is_none());
}

#[test]
fn module_lookup_finds_functions_and_globals() {
    let mut pool = TypePool::new();
    let mut m = Module::new("Main");
    m.add_function(sample(&mut pool));
    m.add_global(Id::global("counter", Idx::DOUBLE), None);

    assert!(matches!(m.lookup("Main::check"), Some(ModuleItem::Function(_))));
    assert!(matches!(m.lookup("counter"), Some(ModuleItem::Global(_))));
    assert!(m.lookup("nothing").is_none());
}

#[test]
#[should_panic(expected = "non-function type")]
fn function_needs_function_type() {
    let pool = TypePool::new();
    let _ = Function::new(&pool, "f", Idx::BOOL, CallingConvention::Hilti);
}

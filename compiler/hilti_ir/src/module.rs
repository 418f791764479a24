//! The IR unit handed to the code generator.

use std::fmt;

use hilti_diagnostic::{internal_error, Location};
use hilti_types::{Idx, TypePool};

use crate::{Constant, Id, Instruction};

/// How a function is entered.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum CallingConvention {
    /// Continuation passing over heap frames.
    #[default]
    Hilti,
    /// Plain native call with native argument types.
    C,
    /// Native call with type-erased generic arguments and an exception
    /// out-parameter.
    CHilti,
}

impl CallingConvention {
    /// Implemented outside the unit.
    pub fn is_bridge(self) -> bool {
        !matches!(self, CallingConvention::Hilti)
    }
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallingConvention::Hilti => f.write_str("HILTI"),
            CallingConvention::C => f.write_str("C"),
            CallingConvention::CHilti => f.write_str("C-HILTI"),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Linkage {
    #[default]
    Local,
    Exported,
}

/// A sequence of instructions, optionally labeled as a jump target.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Block {
    pub label: Option<String>,
    pub instructions: Vec<Instruction>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labeled(label: impl Into<String>) -> Self {
        Block {
            label: Some(label.into()),
            instructions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }
}

/// A function, defined in the unit or declared for a bridge.
#[derive(Clone, PartialEq, Debug)]
pub struct Function {
    pub name: String,
    /// A function type of the pool.
    pub ty: Idx,
    pub cc: CallingConvention,
    pub linkage: Linkage,
    pub params: Vec<Id>,
    pub locals: Vec<Id>,
    /// Empty for declarations.
    pub blocks: Vec<Block>,
    pub location: Location,
}

impl Function {
    /// A function of type `ty`; parameters are taken from the type.
    pub fn new(pool: &TypePool, name: impl Into<String>, ty: Idx, cc: CallingConvention) -> Self {
        let name = name.into();
        let Some(params) = pool.function_params(ty) else {
            internal_error(format_args!(
                "function {name} has non-function type {}",
                pool.name(ty)
            ));
        };
        let params = params.iter().map(|p| Id::param(&p.name, p.ty)).collect();
        Function {
            name,
            ty,
            cc,
            linkage: Linkage::default(),
            params,
            locals: Vec::new(),
            blocks: Vec::new(),
            location: Location::none(),
        }
    }

    #[must_use]
    pub fn exported(mut self) -> Self {
        self.linkage = Linkage::Exported;
        self
    }

    /// Declare a local and return its identifier.
    pub fn add_local(&mut self, name: impl Into<String>, ty: Idx) -> Id {
        let id = Id::local(name, ty);
        self.locals.push(id.clone());
        id
    }

    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn result(&self, pool: &TypePool) -> Idx {
        pool.function_result(self.ty).unwrap_or(Idx::VOID)
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Parameters, then locals, in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = &Id> {
        self.params.iter().chain(self.locals.iter())
    }

    pub fn block(&self, label: &str) -> Option<&Block> {
        self.blocks
            .iter()
            .find(|b| b.label.as_deref() == Some(label))
    }

    /// The identifier operand that calls refer to this function by.
    pub fn id(&self) -> Id {
        Id::function(&self.name, self.ty)
    }
}

/// A module-level variable.
#[derive(Clone, PartialEq, Debug)]
pub struct Global {
    pub id: Id,
    pub init: Option<Constant>,
}

/// Something a module-level identifier names.
#[derive(Copy, Clone, Debug)]
pub enum ModuleItem<'a> {
    Function(&'a Function),
    Global(&'a Global),
}

/// A compilation unit.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    pub globals: Vec<Global>,
    /// User-declared types to describe even when no instruction uses them.
    pub exported_types: Vec<Idx>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions.push(function);
    }

    pub fn add_global(&mut self, id: Id, init: Option<Constant>) {
        self.globals.push(Global { id, init });
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn global(&self, name: &str) -> Option<&Global> {
        self.globals.iter().find(|g| g.id.name == name)
    }

    pub fn lookup(&self, name: &str) -> Option<ModuleItem<'_>> {
        self.function(name)
            .map(ModuleItem::Function)
            .or_else(|| self.global(name).map(ModuleItem::Global))
    }
}

#[cfg(test)]
mod tests;

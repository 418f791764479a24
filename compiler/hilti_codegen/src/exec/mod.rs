//! JIT execution of compiled modules.
//!
//! A [`Machine`] takes a finished module together with the
//! [`EntrySignature`]s of the HILTI functions to call, adds a harness per
//! entry (see [`harness`]) and hands the module to LLVM's MCJIT. Runtime
//! functions are bound to [`crate::runtime`]; bridge functions without an
//! implementation in the module are bound with [`Machine::map_host`].
//!
//! Arguments and results cross as single 64-bit words, so only scalar
//! parameter and result types can be called.

mod harness;

#[cfg(test)]
mod tests;

use std::cell::Cell;

use inkwell::context::Context;
use inkwell::execution_engine::ExecutionEngine;
use inkwell::module::Module;
use inkwell::types::BasicTypeEnum;
use inkwell::OptimizationLevel;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::codegen::EntrySignature;
use crate::runtime::{HltException, TypeInfoHeader};
use crate::{runtime, runtime_decl};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    #[error("cannot create execution engine: {0}")]
    Engine(String),

    #[error("unknown entry function @{0}")]
    UnknownEntry(String),

    #[error("@{0} is not declared in the module")]
    UnknownSymbol(String),

    #[error("@{entry} takes {expected} arguments, got {found}")]
    Arity {
        entry: String,
        expected: usize,
        found: usize,
    },

    #[error("{0} cannot cross the harness")]
    Unsupported(String),

    #[error("host functions must be mapped before the first run")]
    AlreadyRunning,

    #[error("@{0} returned without reaching a continuation")]
    FellOff(String),
}

/// A value passed to or returned from an entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    Int(i64),
    Bool(bool),
    Double(f64),
    Ptr(usize),
}

impl Scalar {
    fn to_word(self) -> i64 {
        match self {
            Scalar::Int(v) => v,
            Scalar::Bool(b) => i64::from(b),
            Scalar::Double(d) => d.to_bits() as i64,
            Scalar::Ptr(p) => p as i64,
        }
    }

    fn from_word(ty: BasicTypeEnum<'_>, word: i64) -> Self {
        match ty {
            BasicTypeEnum::IntType(t) if t.get_bit_width() == 1 => Scalar::Bool(word != 0),
            BasicTypeEnum::FloatType(_) => Scalar::Double(f64::from_bits(word as u64)),
            BasicTypeEnum::PointerType(_) => Scalar::Ptr(word as usize),
            _ => Scalar::Int(word),
        }
    }
}

/// An exception that left the entry function.
#[derive(Clone, Debug, PartialEq)]
pub struct Raised {
    pub type_id: i16,
    /// Name of the exception type, from its descriptor.
    pub type_name: String,
    /// Boxed argument; null without one.
    pub arg: *const u8,
}

impl Raised {
    /// The argument, read as an `int<64>`.
    pub fn arg_i64(&self) -> Option<i64> {
        if self.arg.is_null() {
            return None;
        }
        // SAFETY: a non-null argument points at the boxed value.
        Some(unsafe { self.arg.cast::<i64>().read_unaligned() })
    }
}

/// How a HILTI function finished.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Returned(Option<Scalar>),
    Raised(Raised),
}

/// Filled in by the exit continuations of a harness.
#[repr(C)]
struct RunRecord {
    state: i64,
    result: i64,
    exception: *const HltException,
}

type RunFn = unsafe extern "C" fn(*mut RunRecord, *const i64);

pub struct Machine<'ctx> {
    engine: ExecutionEngine<'ctx>,
    module: Module<'ctx>,
    entries: FxHashMap<String, EntrySignature<'ctx>>,
    running: Cell<bool>,
}

impl<'ctx> Machine<'ctx> {
    /// Load `module`, callable through `entries`.
    pub fn new(
        context: &'ctx Context,
        module: Module<'ctx>,
        entries: &[EntrySignature<'ctx>],
    ) -> Result<Self, ExecError> {
        for entry in entries {
            harness::build(context, &module, entry)?;
        }
        if std::env::var(crate::DEBUG_ENV).is_ok() {
            debug!("jit module:\n{}", module.print_to_string().to_string());
        }

        let engine = module
            .create_jit_execution_engine(OptimizationLevel::Default)
            .map_err(|e| ExecError::Engine(e.to_string()))?;
        for function in runtime_decl::all() {
            if let (Some(native), Some(addr)) = (
                module.get_function(function.symbol),
                runtime::address_of(function.symbol),
            ) {
                trace!(symbol = function.symbol, "bind runtime function");
                engine.add_global_mapping(&native, addr);
            }
        }

        Ok(Machine {
            engine,
            module,
            entries: entries
                .iter()
                .map(|entry| (entry.name.clone(), entry.clone()))
                .collect(),
            running: Cell::new(false),
        })
    }

    /// Bind the declared function `name` to the native code at `addr`.
    pub fn map_host(&self, name: &str, addr: usize) -> Result<(), ExecError> {
        if self.running.get() {
            return Err(ExecError::AlreadyRunning);
        }
        let Some(native) = self.module.get_function(name) else {
            return Err(ExecError::UnknownSymbol(name.to_owned()));
        };
        trace!(name, "bind host function");
        self.engine.add_global_mapping(&native, addr);
        Ok(())
    }

    /// Call the HILTI function `entry` and wait for it to continue into
    /// one of the harness continuations.
    pub fn run(&self, entry: &str, args: &[Scalar]) -> Result<Outcome, ExecError> {
        let Some(signature) = self.entries.get(entry) else {
            return Err(ExecError::UnknownEntry(entry.to_owned()));
        };
        if args.len() != signature.params.len() {
            return Err(ExecError::Arity {
                entry: entry.to_owned(),
                expected: signature.params.len(),
                found: args.len(),
            });
        }
        let words: Vec<i64> = args.iter().map(|a| a.to_word()).collect();
        let mut record = RunRecord {
            state: 0,
            result: 0,
            exception: std::ptr::null(),
        };

        self.running.set(true);
        debug!(entry, "run");
        // SAFETY: the harness has the signature `RunFn` and reads exactly
        // `params.len()` words from the argument array.
        unsafe {
            let run = self
                .engine
                .get_function::<RunFn>(&harness::run_name(entry))
                .map_err(|e| ExecError::UnknownEntry(format!("{entry}: {e}")))?;
            run.call(&mut record, words.as_ptr());
        }

        match record.state {
            harness::STATE_RETURNED => Ok(Outcome::Returned(
                signature.result.map(|ty| Scalar::from_word(ty, record.result)),
            )),
            harness::STATE_RAISED => {
                // SAFETY: the exception continuation stored the raised
                // object, whose type info is a generated descriptor.
                let raised = unsafe {
                    let exception = &*record.exception;
                    let info: &TypeInfoHeader = &*exception.type_info;
                    Raised {
                        type_id: info.type_id,
                        type_name: info.name(),
                        arg: exception.arg,
                    }
                };
                Ok(Outcome::Raised(raised))
            }
            _ => Err(ExecError::FellOff(entry.to_owned())),
        }
    }
}

//! Code generator for the HILTI compiler backend.
//!
//! Lowers a validated [`hilti_ir::Module`] into an LLVM module using a
//! continuation-passing calling convention: there is no native call
//! stack, every function takes a pointer to a heap-resident frame, and
//! all control transfer is a tail call through a continuation stored in
//! that frame.
//!
//! # Debug Environment Variables
//!
//! - `HILTI_DEBUG_CODEGEN`: log the finished native module at `debug`
//!   level from [`CodeGen::finalize`]. Any value enables this.
//!
//! - `HILTI_LIBRARY_PATH`: colon-separated directories searched for
//!   `*.ll` prototype files declaring bridge functions.
//!
//! - `RUST_LOG=hilti_codegen=debug`: one event per lowered function and
//!   block. `trace` adds one per instruction.
//!
//! # Clippy Configuration
//!
//! This crate allows certain clippy lints common in codegen code:
//! - Cast warnings: native field indices are `u32`, Rust indices `usize`
//! - Missing panic docs: internal panics are invariant violations
#![allow(
    // Native struct and array indices are u32, we index with usize
    clippy::cast_possible_truncation,
    // Integer slots store i64, widths and indices are unsigned
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    // Internal functions - panics are invariant violations
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
)]
//!
//! # Architecture
//!
//! - [`CodeGen`]: the session; `reset` → `visit` → `finalize`.
//! - [`verify()`]: LLVM's verifier, reported as `E3001`.
//! - [`builder`]: the stack of emission targets.
//! - [`frame`]: frame layouts and the fixed frame prefix.
//! - [`tables`]: the ordered type-dispatch tables driving lowering.
//! - [`exec`]: MCJIT execution of finished modules.
//! - [`runtime`]: native implementations of the runtime functions.
//!
//! # Example
//!
//! ```ignore
//! let mut pool = TypePool::new();
//! let instructions = InstructionSet::with_builtins(&mut pool);
//! let unit = build_unit(&mut pool);
//!
//! let context = Context::create();
//! let mut cg = CodeGen::new(&context, &pool, &instructions, CodegenOptions::from_env());
//! let module = cg.compile(&unit)?;
//! println!("{}", module.print_to_string().to_string());
//! ```

pub mod abi;
pub mod builder;
pub mod dispatch;
pub mod exec;
pub mod frame;
pub mod mangle;
pub mod prototypes;
pub mod runtime;
pub mod runtime_decl;
pub mod tables;

mod codegen;
mod options;
mod verify;

pub use codegen::{CodeGen, EntrySignature};
pub use options::{CodegenOptions, DEBUG_ENV, LIBRARY_PATH_ENV};
pub use verify::{verify, VerifyError};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=hilti_codegen=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

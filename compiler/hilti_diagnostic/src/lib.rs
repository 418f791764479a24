//! Diagnostic system for the HILTI compiler backend.
//!
//! Every user-facing failure of the backend (type resolution, instruction
//! validation, module verification) is reported as a [`Diagnostic`] with a
//! stable [`ErrorCode`]. Internal compiler defects are not diagnostics: they
//! abort through [`internal_error`].
//!
//! # Error Guarantees
//!
//! [`ErrorGuaranteed`] is type-level proof that at least one error was
//! pushed into a [`DiagnosticQueue`]. Code generation returns it in place of
//! a module when compilation of a unit fails.
//!
//! ```text
//! let guarantee = queue.emit_error(diagnostic);
//! fn finalize(..) -> Result<Module<'ctx>, ErrorGuaranteed> { ... }
//! ```

mod diagnostic;
mod error_code;
mod guarantee;
mod location;
mod queue;

pub use diagnostic::{Diagnostic, Label};
pub use error_code::ErrorCode;
pub use guarantee::ErrorGuaranteed;
pub use location::Location;
pub use queue::DiagnosticQueue;

/// Abort on an internal compiler defect.
///
/// Defects mean an earlier pass handed the backend a unit that was not
/// well-formed, or that the backend itself is broken. They are never
/// recoverable, so this panics with the `E9001` code in the message.
#[cold]
#[track_caller]
pub fn internal_error(message: impl std::fmt::Display) -> ! {
    panic!("internal compiler error [{}]: {message}", ErrorCode::E9001)
}

//! Module verification.

use inkwell::module::Module;

use hilti_diagnostic::{Diagnostic, ErrorCode};

#[derive(Debug, thiserror::Error)]
#[error("native module {module} failed verification: {message}")]
pub struct VerifyError {
    pub module: String,
    /// What LLVM's verifier reported.
    pub message: String,
}

impl VerifyError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(ErrorCode::E3001).with_message(self.to_string())
    }
}

/// Run LLVM's verifier over `module`.
pub fn verify(module: &Module<'_>) -> Result<(), VerifyError> {
    module.verify().map_err(|message| VerifyError {
        module: module.get_name().to_string_lossy().into_owned(),
        message: message.to_string().trim_end().to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use inkwell::context::Context;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn accepts_well_formed_module() {
        let context = Context::create();
        let module = context.create_module("ok");
        let f = module.add_function("f", context.void_type().fn_type(&[], false), None);
        let builder = context.create_builder();
        builder.position_at_end(context.append_basic_block(f, "entry"));
        builder.build_return(None).unwrap();
        assert!(verify(&module).is_ok());
    }

    #[test]
    fn reports_missing_terminator() {
        let context = Context::create();
        let module = context.create_module("broken");
        let f = module.add_function("f", context.void_type().fn_type(&[], false), None);
        context.append_basic_block(f, "entry");

        let err = verify(&module).unwrap_err();
        assert_eq!(err.module, "broken");
        assert!(!err.message.is_empty());
        assert_eq!(err.to_diagnostic().code, ErrorCode::E3001);
    }
}

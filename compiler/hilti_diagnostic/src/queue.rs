use crate::{Diagnostic, ErrorGuaranteed};

/// Collects the error diagnostics of one compiled unit.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an error diagnostic and return proof of the emission.
    pub fn emit_error(&mut self, diagnostic: Diagnostic) -> ErrorGuaranteed {
        self.diagnostics.push(diagnostic);
        ErrorGuaranteed::new()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{ErrorCode, Location};

    #[test]
    fn empty_queue_guarantees_nothing() {
        let queue = DiagnosticQueue::new();
        assert_eq!(queue.error_count(), 0);
        assert_eq!(ErrorGuaranteed::from_error_count(queue.error_count()), None);
    }

    #[test]
    fn emitted_errors_are_kept_in_order() {
        let mut queue = DiagnosticQueue::new();
        let first = queue.emit_error(Diagnostic::error(ErrorCode::E3002).with_message("arity"));
        let second = queue.emit_error(
            Diagnostic::error(ErrorCode::E3001)
                .with_message("no terminator")
                .with_label(Location::new("main.hlt", 4), "in this function"),
        );
        assert_eq!(first, second);

        let codes: Vec<ErrorCode> = queue.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(codes, [ErrorCode::E3002, ErrorCode::E3001]);
        assert_eq!(queue.diagnostics()[1].labels[0].location.line, 4);
    }

    #[test]
    fn finalize_style_guarantee_follows_the_count() {
        let mut queue = DiagnosticQueue::new();
        let _ = queue.emit_error(Diagnostic::error(ErrorCode::E3001));
        let _ = queue.emit_error(Diagnostic::error(ErrorCode::E3001));

        let Some(guarantee) = ErrorGuaranteed::from_error_count(queue.error_count()) else {
            panic!("two errors were emitted");
        };
        assert_eq!(queue.error_count(), 2);
        assert_eq!(guarantee.to_string(), "error(s) emitted");
    }
}

use std::fmt;

/// Error codes for all backend diagnostics.
///
/// Format: E#### where first digit indicates phase:
/// - E1xxx: Type resolution errors
/// - E2xxx: Instruction and signature errors
/// - E3xxx: Code generation errors
/// - E9xxx: Internal compiler errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Type Errors (E1xxx)
    /// Unknown type name
    E1001,
    /// Type does not accept parameters
    E1002,
    /// Wrong number of type parameters
    E1003,
    /// Wildcard parameter not allowed
    E1004,
    /// Invalid type parameter
    E1005,
    /// Iterator over a non-container
    E1006,

    // Instruction Errors (E2xxx)
    /// Missing operand
    E2001,
    /// Superfluous operand
    E2002,
    /// Operand type does not match signature
    E2003,
    /// Unknown instruction
    E2004,
    /// No matching operator overload
    E2005,
    /// Instruction rejected by its validation hook
    E2006,

    // Code Generation Errors (E3xxx)
    /// Module verification failed
    E3001,
    /// Bridge declaration does not match its native prototype
    E3002,

    // Internal Errors (E9xxx)
    /// Internal compiler error
    E9001,
}

impl ErrorCode {
    /// Get the string representation of this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            // Type
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E1006 => "E1006",
            // Instruction
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            // Codegen
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            // Internal
            ErrorCode::E9001 => "E9001",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E1001.to_string(), "E1001");
        assert_eq!(ErrorCode::E2003.as_str(), "E2003");
    }
}

use std::fmt;

/// Source position attached to IR nodes by the front-end.
///
/// The backend never parses source text; it only carries locations through
/// so diagnostics can point back at the original input.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Location {
    pub file: Option<String>,
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Location {
            file: Some(file.into()),
            line,
        }
    }

    /// Location for nodes synthesized by the backend itself.
    pub const fn none() -> Self {
        Location {
            file: None,
            line: 0,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{file}:{}", self.line),
            None => write!(f, "<no location>"),
        }
    }
}

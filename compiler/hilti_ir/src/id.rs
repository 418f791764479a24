use std::fmt;

use hilti_types::Idx;

/// What an identifier denotes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum IdRole {
    /// Function-local variable, stored in the frame.
    Local,
    /// Function parameter, stored in the frame.
    Param,
    /// Module-level variable.
    Global,
    /// A function of the module.
    Function,
}

/// A named, typed identifier.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Id {
    pub name: String,
    pub ty: Idx,
    pub role: IdRole,
}

impl Id {
    pub fn new(name: impl Into<String>, ty: Idx, role: IdRole) -> Self {
        Id {
            name: name.into(),
            ty,
            role,
        }
    }

    pub fn local(name: impl Into<String>, ty: Idx) -> Self {
        Self::new(name, ty, IdRole::Local)
    }

    pub fn param(name: impl Into<String>, ty: Idx) -> Self {
        Self::new(name, ty, IdRole::Param)
    }

    pub fn global(name: impl Into<String>, ty: Idx) -> Self {
        Self::new(name, ty, IdRole::Global)
    }

    pub fn function(name: impl Into<String>, ty: Idx) -> Self {
        Self::new(name, ty, IdRole::Function)
    }

    /// Stored in the enclosing function's frame.
    pub fn is_frame_slot(&self) -> bool {
        matches!(self.role, IdRole::Local | IdRole::Param)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

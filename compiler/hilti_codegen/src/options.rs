use std::path::PathBuf;

/// Logs the finished native module when set.
pub const DEBUG_ENV: &str = "HILTI_DEBUG_CODEGEN";

/// Search path for bridge prototype files.
pub const LIBRARY_PATH_ENV: &str = "HILTI_LIBRARY_PATH";

/// Settings of a code generation session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Verify the module in [`crate::CodeGen::compile`].
    pub verify: bool,
    /// Directories holding `*.ll` prototype files.
    pub lib_paths: Vec<PathBuf>,
    /// Log the finished module at `debug` level.
    pub dump_ir: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            verify: true,
            lib_paths: Vec::new(),
            dump_ir: false,
        }
    }
}

impl CodegenOptions {
    /// Defaults, adjusted by `HILTI_DEBUG_CODEGEN` and `HILTI_LIBRARY_PATH`.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        options.dump_ir = std::env::var(DEBUG_ENV).is_ok();
        if let Some(paths) = std::env::var_os(LIBRARY_PATH_ENV) {
            options.lib_paths = std::env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
        options
    }

    #[must_use]
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    #[must_use]
    pub fn with_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.lib_paths.push(path.into());
        self
    }

    #[must_use]
    pub fn with_dump_ir(mut self, dump_ir: bool) -> Self {
        self.dump_ir = dump_ir;
        self
    }
}

//! Prototypes of bridge functions.
//!
//! Native functions that HILTI code reaches through the C or C-HILTI
//! calling convention are supplied by external libraries. Their
//! prototypes come as LLVM assembly files (`*.ll`) in the library search
//! path. Each file is parsed by LLVM and every function declaration in it
//! is indexed, so that a bridge declaration can be checked against the
//! real native signature.

use std::fs;
use std::path::{Path, PathBuf};

use inkwell::context::Context;
use inkwell::memory_buffer::MemoryBuffer;
use inkwell::types::AnyType;
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use hilti_diagnostic::{Diagnostic, ErrorCode, Location};

#[derive(Debug, thiserror::Error)]
pub enum PrototypeError {
    #[error(
        "bridge function {function} takes {declared} native arguments, \
         but its prototype in {} takes {prototype}",
        file.display()
    )]
    ArityMismatch {
        function: String,
        declared: usize,
        prototype: usize,
        file: PathBuf,
    },

    #[error("cannot read prototype file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse prototype file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

impl PrototypeError {
    pub fn to_diagnostic(&self, location: Location) -> Diagnostic {
        Diagnostic::error(ErrorCode::E3002)
            .with_message(self.to_string())
            .with_label(location, "declared here")
    }
}

/// One declared function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prototype {
    pub name: String,
    /// Return type as LLVM prints it.
    pub ret: String,
    /// Parameter types as LLVM prints them.
    pub params: Vec<String>,
    pub variadic: bool,
    pub file: PathBuf,
}

impl Prototype {
    /// Whether a call with `count` arguments fits.
    pub fn accepts(&self, count: usize) -> bool {
        if self.variadic {
            count >= self.params.len()
        } else {
            count == self.params.len()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PrototypeIndex {
    prototypes: FxHashMap<String, Prototype>,
}

impl PrototypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every `*.ll` file directly inside the given directories.
    ///
    /// Missing directories and unreadable files are skipped with a
    /// warning: a prototype that cannot be found is not an error.
    pub fn load(paths: &[PathBuf]) -> Self {
        let mut index = Self::new();
        for dir in paths {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "skipping library path");
                    continue;
                }
            };
            let mut files: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "ll"))
                .collect();
            files.sort();
            for file in files {
                if let Err(e) = index.add_file(&file) {
                    warn!(error = %e, "skipping prototype file");
                }
            }
        }
        index
    }

    /// Index one file; returns the number of prototypes found.
    pub fn add_file(&mut self, path: &Path) -> Result<usize, PrototypeError> {
        let text = fs::read(path).map_err(|source| PrototypeError::Io {
            path: path.to_owned(),
            source,
        })?;
        let count = self.add_source(&text, path)?;
        debug!(path = %path.display(), count, "indexed prototypes");
        Ok(count)
    }

    /// Index the function declarations of the LLVM assembly `text`,
    /// attributed to `file`.
    pub fn add_source(&mut self, text: &[u8], file: &Path) -> Result<usize, PrototypeError> {
        let context = Context::create();
        let name = file.display().to_string();
        let buffer = MemoryBuffer::create_from_memory_range_copy(text, &name);
        let module = context
            .create_module_from_ir(buffer)
            .map_err(|message| PrototypeError::Parse {
                path: file.to_owned(),
                message: message.to_string(),
            })?;

        let mut count = 0;
        for function in module.get_functions() {
            if function.count_basic_blocks() > 0 {
                continue;
            }
            let ty = function.get_type();
            let prototype = Prototype {
                name: function.get_name().to_string_lossy().into_owned(),
                ret: ty
                    .get_return_type()
                    .map_or_else(|| "void".to_owned(), |ret| ret.print_to_string().to_string()),
                params: function
                    .get_params()
                    .iter()
                    .map(|param| param.get_type().print_to_string().to_string())
                    .collect(),
                variadic: ty.is_var_arg(),
                file: file.to_owned(),
            };
            // The first search path entry wins.
            self.prototypes
                .entry(prototype.name.clone())
                .or_insert(prototype);
            count += 1;
        }
        Ok(count)
    }

    pub fn get(&self, name: &str) -> Option<&Prototype> {
        self.prototypes.get(name)
    }

    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    /// Check a bridge declaration taking `count` native arguments.
    pub fn check(&self, name: &str, count: usize) -> Result<(), PrototypeError> {
        let Some(prototype) = self.get(name) else {
            trace!(name, "no prototype");
            return Ok(());
        };
        if prototype.accepts(count) {
            Ok(())
        } else {
            Err(PrototypeError::ArityMismatch {
                function: name.to_owned(),
                declared: count,
                prototype: prototype.params.len(),
                file: prototype.file.clone(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn indexes_declarations_only() {
        let mut index = PrototypeIndex::new();
        let source = b"declare ptr @hlt_string_concat(ptr, ptr, ptr) nounwind\n\
            declare void @\"Hilti::print\"({ i64, i64 }, ...)\n\
            declare fastcc void @f()\n\
            define void @g() {\n  ret void\n}\n";
        let count = index.add_source(source, Path::new("lib.ll")).unwrap();
        assert_eq!(count, 3);

        let p = index.get("hlt_string_concat").unwrap();
        assert_eq!(p.ret, "ptr");
        assert_eq!(p.params, vec!["ptr", "ptr", "ptr"]);
        assert!(!p.variadic);

        let p = index.get("Hilti::print").unwrap();
        assert_eq!(p.params, vec!["{ i64, i64 }"]);
        assert!(p.variadic);

        let p = index.get("f").unwrap();
        assert_eq!(p.ret, "void");
        assert!(p.params.is_empty());
        assert_eq!(p.file, PathBuf::from("lib.ll"));

        assert!(index.get("g").is_none());
    }

    #[test]
    fn malformed_assembly() {
        let err = PrototypeIndex::new()
            .add_source(b"declare i64 @broken(", Path::new("bad.ll"))
            .unwrap_err();
        assert!(matches!(err, PrototypeError::Parse { .. }));
        assert!(err.to_string().starts_with("cannot parse prototype file bad.ll"));
    }

    #[test]
    fn loads_search_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("libhilti.ll")).unwrap();
        writeln!(file, "; runtime prototypes").unwrap();
        writeln!(file, "declare i64 @Hilti_len(ptr, ptr)").unwrap();
        writeln!(file, "declare void @Hilti_log(ptr, ...)").unwrap();
        fs::write(dir.path().join("notes.txt"), "declare void @ignored()").unwrap();
        fs::write(dir.path().join("broken.ll"), "declare void @half(").unwrap();

        let index = PrototypeIndex::load(&[
            dir.path().to_owned(),
            dir.path().join("does-not-exist"),
        ]);
        assert_eq!(index.len(), 2);
        assert!(index.get("ignored").is_none());
        assert!(index.check("Hilti_len", 2).is_ok());
        assert!(index.check("Hilti_log", 3).is_ok());
        assert!(index.check("unknown", 7).is_ok());

        let err = index.check("Hilti_len", 3).unwrap_err();
        assert!(matches!(
            err,
            PrototypeError::ArityMismatch {
                declared: 3,
                prototype: 2,
                ..
            }
        ));
        assert_eq!(err.to_diagnostic(Location::none()).code, ErrorCode::E3002);
    }

    #[test]
    fn unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PrototypeIndex::new()
            .add_file(&dir.path().join("missing.ll"))
            .unwrap_err();
        assert!(matches!(err, PrototypeError::Io { .. }));
    }
}

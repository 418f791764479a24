//! The session-scoped type registry.
//!
//! # Canonicalization
//!
//! Non-wildcard HILTI types are interned by their fully parameterized name:
//! asking for `ref<bytes>` twice yields the same [`Idx`]. Wildcard instances
//! (`ref<*>`) are pushed fresh on every request and never enter the cache.
//! Non-HILTI helper types (function signatures, type-declaration wrappers)
//! are deduplicated in side tables so they never collide with HILTI names.
//!
//! The pool lives for one compilation session and is passed explicitly to
//! every operation that needs it; there is no global registry.

mod construct;
mod matching;

use rustc_hash::FxHashMap;
use smallvec::smallvec;

use hilti_diagnostic::internal_error;

use crate::{FunctionParam, Idx, Tag, TypeDetail, TypeEntry, TypeFlags, TypeParam};

/// Registry of all types of a session.
#[derive(Clone, Debug)]
pub struct TypePool {
    entries: Vec<TypeEntry>,
    /// Canonical HILTI types by name.
    canonical: FxHashMap<String, Idx>,
    /// Canonical HILTI types in registration order.
    hilti_order: Vec<Idx>,
    functions: FxHashMap<String, Idx>,
    decls: FxHashMap<Idx, Idx>,
}

impl TypePool {
    /// Create a pool with the built-in types pre-interned.
    pub fn new() -> Self {
        let mut pool = TypePool {
            entries: Vec::with_capacity(64),
            canonical: FxHashMap::default(),
            hilti_order: Vec::new(),
            functions: FxHashMap::default(),
            decls: FxHashMap::default(),
        };

        for tag in [Tag::Any, Tag::Void, Tag::Label, Tag::Unknown, Tag::Meta] {
            pool.push(TypeEntry::simple(tag));
        }
        for tag in [
            Tag::Double,
            Tag::Bool,
            Tag::String,
            Tag::Bytes,
            Tag::Addr,
            Tag::Net,
            Tag::Port,
            Tag::RegExp,
            Tag::Continuation,
        ] {
            pool.intern(TypeEntry::simple(tag));
        }
        pool.intern(TypeEntry {
            tag: Tag::IteratorBytes,
            name: "iterator<bytes>".to_owned(),
            params: smallvec![TypeParam::Type(Idx::BYTES)],
            flags: TypeFlags::empty(),
            detail: TypeDetail::Iterator {
                container: Idx::BYTES,
            },
        });
        pool.intern(TypeEntry {
            tag: Tag::Exception,
            name: "exception Hilti::Exception".to_owned(),
            params: smallvec![],
            flags: TypeFlags::empty(),
            detail: TypeDetail::Exception {
                name: "Hilti::Exception".to_owned(),
                arg: None,
                base: None,
            },
        });

        debug_assert_eq!(pool.entries.len(), Idx::PREINTERNED_COUNT as usize);
        pool
    }

    // ── Storage ─────────────────────────────────────────────────────

    fn push(&mut self, entry: TypeEntry) -> Idx {
        let Ok(raw) = u32::try_from(self.entries.len()) else {
            internal_error("type pool exhausted");
        };
        self.entries.push(entry);
        Idx::from_raw(raw)
    }

    /// Intern a HILTI type: wildcards are pushed fresh, everything else is
    /// shared by name.
    pub(crate) fn intern(&mut self, mut entry: TypeEntry) -> Idx {
        if entry.is_wildcard() {
            tracing::trace!(name = %entry.name, "wildcard type, not cached");
            return self.push(entry);
        }
        if let Some(&idx) = self.canonical.get(&entry.name) {
            tracing::trace!(name = %entry.name, ?idx, "type cache hit");
            return idx;
        }
        entry.flags |= TypeFlags::CANONICAL;
        let name = entry.name.clone();
        let idx = self.push(entry);
        tracing::debug!(%name, ?idx, "registered canonical type");
        self.canonical.insert(name, idx);
        self.hilti_order.push(idx);
        idx
    }

    pub(crate) fn entry_mut(&mut self, idx: Idx) -> &mut TypeEntry {
        match self.entries.get_mut(idx.index()) {
            Some(entry) => entry,
            None => internal_error(format_args!("type index {idx:?} out of range")),
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Get the entry of a type.
    ///
    /// An index from another pool is an internal defect.
    pub fn get(&self, idx: Idx) -> &TypeEntry {
        match self.entries.get(idx.index()) {
            Some(entry) => entry,
            None => internal_error(format_args!("type index {idx:?} out of range")),
        }
    }

    #[inline]
    pub fn tag(&self, idx: Idx) -> Tag {
        self.get(idx).tag
    }

    #[inline]
    pub fn name(&self, idx: Idx) -> &str {
        &self.get(idx).name
    }

    #[inline]
    pub fn flags(&self, idx: Idx) -> TypeFlags {
        self.get(idx).flags
    }

    #[inline]
    pub fn is_wildcard(&self, idx: Idx) -> bool {
        self.get(idx).is_wildcard()
    }

    /// A HILTI type that is canonical and free of wildcards, i.e. one that
    /// gets runtime metadata.
    pub fn is_concrete(&self, idx: Idx) -> bool {
        let entry = self.get(idx);
        entry.tag.is_hilti()
            && entry.flags.contains(TypeFlags::CANONICAL)
            && entry.flags.is_concrete()
    }

    /// Generic for the native boundary: `any` or a wildcard instance.
    pub fn is_generic(&self, idx: Idx) -> bool {
        let entry = self.get(idx);
        entry.tag == Tag::Any || entry.is_wildcard()
    }

    /// Look up a canonical type by name.
    pub fn lookup(&self, name: &str) -> Option<Idx> {
        self.canonical.get(name).copied()
    }

    /// All canonical HILTI types, in registration order.
    pub fn hilti_types(&self) -> impl Iterator<Item = Idx> + '_ {
        self.hilti_order.iter().copied()
    }

    /// Number of entries, including wildcards and helper types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── Kind accessors ──────────────────────────────────────────────

    /// Strip a type-declaration wrapper.
    pub fn unwrap_decl(&self, idx: Idx) -> Idx {
        match self.get(idx).detail {
            TypeDetail::TypeDecl { target } => target,
            _ => idx,
        }
    }

    pub fn integer_width(&self, idx: Idx) -> Option<u8> {
        match self.get(idx).detail {
            TypeDetail::Integer { width } => Some(width),
            _ => None,
        }
    }

    pub fn tuple_elements(&self, idx: Idx) -> Option<&[Idx]> {
        match &self.get(idx).detail {
            TypeDetail::Tuple { elements } => Some(elements),
            _ => None,
        }
    }

    /// Referenced type; `None` for wildcard references.
    pub fn reference_target(&self, idx: Idx) -> Option<Idx> {
        match self.get(idx).detail {
            TypeDetail::Reference { target } => Some(target),
            _ => None,
        }
    }

    /// Associated iterator type of an iterable type.
    pub fn iterator_of(&self, idx: Idx) -> Option<Idx> {
        match self.get(idx).detail {
            TypeDetail::Container { iterator, .. } | TypeDetail::WildcardContainer { iterator } => {
                Some(iterator)
            }
            _ if self.tag(idx) == Tag::Bytes => Some(Idx::ITERATOR_BYTES),
            _ => None,
        }
    }

    pub fn function_params(&self, idx: Idx) -> Option<&[FunctionParam]> {
        match &self.get(idx).detail {
            TypeDetail::Function { params, .. } => Some(params),
            _ => None,
        }
    }

    pub fn function_result(&self, idx: Idx) -> Option<Idx> {
        match self.get(idx).detail {
            TypeDetail::Function { result, .. } => Some(result),
            _ => None,
        }
    }

    pub(crate) fn param_name(&self, param: &TypeParam) -> String {
        match param {
            TypeParam::Type(idx) => self.name(*idx).to_owned(),
            other => other.to_string(),
        }
    }
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}

//! Constructors for parameterized built-in types.
//!
//! Each constructor validates its parameters, renders the canonical name
//! `name<arg1,arg2>` and interns the entry. Validation failures are
//! parameter mismatches, reported to the user rather than aborting.

use smallvec::{smallvec, SmallVec};

use super::TypePool;
use crate::{FunctionParam, Idx, Tag, TypeDetail, TypeEntry, TypeError, TypeFlags, TypeParam};

/// Kinds that can be written as `name<*>`.
const WILDCARD_KINDS: &[Tag] = &[
    Tag::Integer,
    Tag::Tuple,
    Tag::Reference,
    Tag::Channel,
    Tag::Vector,
    Tag::List,
];

impl TypePool {
    fn param_list_name(&self, base: &str, params: &[TypeParam]) -> String {
        let args: Vec<String> = params.iter().map(|p| self.param_name(p)).collect();
        format!("{base}<{}>", args.join(","))
    }

    fn param_flags(&self, params: &[TypeParam]) -> TypeFlags {
        params
            .iter()
            .filter_map(TypeParam::as_type)
            .fold(TypeFlags::empty(), |acc, idx| acc | self.flags(idx).propagate())
    }

    // ── Wildcards ───────────────────────────────────────────────────

    /// Create a fresh wildcard instance of `tag` (`int<*>`, `ref<*>`).
    pub fn wildcard(&mut self, tag: Tag) -> Result<Idx, TypeError> {
        if !WILDCARD_KINDS.contains(&tag) {
            return Err(TypeError::WildcardNotAllowed {
                name: tag.name().to_owned(),
            });
        }

        let mut entry = TypeEntry::wildcard(tag);
        if tag == Tag::Integer {
            entry.detail = TypeDetail::Integer { width: 0 };
        }
        let idx = self.intern(entry);

        if let Some(iter_tag) = tag.iterator_tag() {
            let name = format!("iterator<{}>", self.name(idx));
            let iterator = self.intern(TypeEntry {
                tag: iter_tag,
                name,
                params: SmallVec::new(),
                flags: TypeFlags::WILDCARD,
                detail: TypeDetail::Iterator { container: idx },
            });
            self.entry_mut(idx).detail = TypeDetail::WildcardContainer { iterator };
        }
        Ok(idx)
    }

    // ── Storage types ───────────────────────────────────────────────

    /// `int<width>`. Width zero is legal and matches every integer.
    pub fn integer(&mut self, width: u8) -> Result<Idx, TypeError> {
        self.integer_from_param(&TypeParam::Int(i64::from(width)))
    }

    pub(crate) fn integer_from_param(&mut self, param: &TypeParam) -> Result<Idx, TypeError> {
        let TypeParam::Int(raw) = param else {
            return Err(TypeError::mismatch(
                self.param_name(param),
                "cannot convert to integer",
            ));
        };
        let width = u8::try_from(*raw)
            .ok()
            .filter(|w| *w <= 64)
            .ok_or_else(|| {
                TypeError::mismatch(raw, "integer width must be between 1 and 64 bits")
            })?;

        Ok(self.intern(TypeEntry {
            tag: Tag::Integer,
            name: format!("int<{width}>"),
            params: smallvec![TypeParam::Int(i64::from(width))],
            flags: TypeFlags::empty(),
            detail: TypeDetail::Integer { width },
        }))
    }

    /// `tuple<t1,...,tn>`.
    pub fn tuple(&mut self, elements: &[Idx]) -> Idx {
        let params: SmallVec<[TypeParam; 2]> =
            elements.iter().map(|&e| TypeParam::Type(e)).collect();
        let entry = TypeEntry {
            tag: Tag::Tuple,
            name: self.param_list_name("tuple", &params),
            flags: self.param_flags(&params),
            params,
            detail: TypeDetail::Tuple {
                elements: elements.iter().copied().collect(),
            },
        };
        self.intern(entry)
    }

    /// `ref<target>`; the target must be a heap type.
    pub fn reference(&mut self, target: Idx) -> Result<Idx, TypeError> {
        if !self.tag(target).is_heap_type() {
            return Err(TypeError::mismatch(
                self.name(target),
                "reference type must be a heap type",
            ));
        }
        let params = smallvec![TypeParam::Type(target)];
        let entry = TypeEntry {
            tag: Tag::Reference,
            name: self.param_list_name("ref", &params),
            flags: self.param_flags(&params),
            params,
            detail: TypeDetail::Reference { target },
        };
        Ok(self.intern(entry))
    }

    // ── Containers ──────────────────────────────────────────────────

    pub fn list(&mut self, item: Idx) -> Result<Idx, TypeError> {
        self.container(Tag::List, item, None)
    }

    pub fn vector(&mut self, item: Idx) -> Result<Idx, TypeError> {
        self.container(Tag::Vector, item, None)
    }

    /// `channel<item,capacity>`; `None` is the unbounded `_` capacity.
    pub fn channel(&mut self, item: Idx, capacity: Option<u64>) -> Result<Idx, TypeError> {
        let capacity = match capacity {
            Some(c) => TypeParam::Int(i64::try_from(c).map_err(|_| {
                TypeError::mismatch(c, "channel capacity out of range")
            })?),
            None => TypeParam::Ident("_".to_owned()),
        };
        self.container(Tag::Channel, item, Some(capacity))
    }

    pub(crate) fn container(
        &mut self,
        tag: Tag,
        item: Idx,
        capacity: Option<TypeParam>,
    ) -> Result<Idx, TypeError> {
        if !self.tag(item).is_value_type() {
            return Err(TypeError::mismatch(
                self.name(item),
                "container type must be a value type",
            ));
        }

        let mut params: SmallVec<[TypeParam; 2]> = smallvec![TypeParam::Type(item)];
        let mut cap = 0;
        if let Some(param) = capacity {
            cap = match &param {
                TypeParam::Ident(s) if s == "_" => 0,
                TypeParam::Int(v) => u64::try_from(*v).map_err(|_| {
                    TypeError::mismatch(v, "channel capacity cannot be negative")
                })?,
                other => {
                    return Err(TypeError::mismatch(
                        self.param_name(other),
                        "cannot convert to integer",
                    ))
                }
            };
            params.push(param);
        }

        let entry = TypeEntry {
            tag,
            name: self.param_list_name(tag.name(), &params),
            flags: self.param_flags(&params),
            params,
            detail: TypeDetail::Container {
                item,
                capacity: cap,
                iterator: Idx::NONE,
            },
        };
        let idx = self.intern(entry);
        self.attach_iterator(idx);
        Ok(idx)
    }

    /// Create the associated iterator of a freshly interned container.
    fn attach_iterator(&mut self, container: Idx) {
        let TypeDetail::Container { iterator, .. } = self.get(container).detail else {
            return;
        };
        if !iterator.is_none() {
            return;
        }
        let Some(iter_tag) = self.tag(container).iterator_tag() else {
            return;
        };

        let params = smallvec![TypeParam::Type(container)];
        let entry = TypeEntry {
            tag: iter_tag,
            name: self.param_list_name("iterator", &params),
            flags: self.param_flags(&params),
            params,
            detail: TypeDetail::Iterator { container },
        };
        let iter_idx = self.intern(entry);
        if let TypeDetail::Container { iterator, .. } = &mut self.entry_mut(container).detail {
            *iterator = iter_idx;
        }
    }

    // ── Helper types ────────────────────────────────────────────────

    /// Function signature type, deduplicated by its rendering.
    pub fn function(&mut self, params: Vec<FunctionParam>, result: Idx) -> Idx {
        let args: Vec<&str> = params.iter().map(|p| self.name(p.ty)).collect();
        let name = format!("function ({}) -> {}", args.join(", "), self.name(result));
        if let Some(&idx) = self.functions.get(&name) {
            return idx;
        }
        let idx = self.push(TypeEntry {
            tag: Tag::Function,
            name: name.clone(),
            params: SmallVec::new(),
            flags: TypeFlags::empty(),
            detail: TypeDetail::Function { params, result },
        });
        self.functions.insert(name, idx);
        idx
    }

    /// The type of an operand that denotes `target` itself.
    pub fn type_decl(&mut self, target: Idx) -> Idx {
        if let Some(&idx) = self.decls.get(&target) {
            return idx;
        }
        let name = self.name(target).to_owned();
        let idx = self.push(TypeEntry {
            tag: Tag::TypeDecl,
            name,
            params: SmallVec::new(),
            flags: TypeFlags::empty(),
            detail: TypeDetail::TypeDecl { target },
        });
        self.decls.insert(target, idx);
        idx
    }
}

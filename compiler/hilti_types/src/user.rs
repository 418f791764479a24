//! User-defined composite types.
//!
//! Structs, enums, bitsets and exceptions do not go through keyword
//! resolution. The front-end builds them from declarations and registers
//! them here, keyed by their structural name like every other canonical
//! type.

use smallvec::SmallVec;

use crate::{Idx, StructField, Tag, TypeDetail, TypeEntry, TypeError, TypeFlags, TypePool};

impl TypePool {
    /// Register `struct { a int<64>, b bool }`.
    pub fn register_struct(&mut self, fields: Vec<StructField>) -> Idx {
        let rendered: Vec<String> = fields
            .iter()
            .map(|f| format!("{} {}", f.name, self.name(f.ty)))
            .collect();
        let flags = fields
            .iter()
            .fold(TypeFlags::empty(), |acc, f| acc | self.flags(f.ty).propagate());
        self.intern(TypeEntry {
            tag: Tag::Struct,
            name: format!("struct {{ {} }}", rendered.join(", ")),
            params: SmallVec::new(),
            flags,
            detail: TypeDetail::Struct { fields },
        })
    }

    /// Register `enum { A, B }`. `Undef` is implicitly label 0.
    pub fn register_enum(&mut self, labels: &[&str]) -> Idx {
        let values = std::iter::once("Undef")
            .chain(labels.iter().copied())
            .zip(0u32..)
            .map(|(label, value)| (label.to_owned(), value))
            .collect();
        self.intern(TypeEntry {
            tag: Tag::Enum,
            name: format!("enum {{ {} }}", labels.join(", ")),
            params: SmallVec::new(),
            flags: TypeFlags::empty(),
            detail: TypeDetail::Enum { labels: values },
        })
    }

    /// Register a bitset. Labels without an explicit bit take the next one
    /// after the highest so far.
    pub fn register_bitset(&mut self, labels: &[(&str, Option<u8>)]) -> Result<Idx, TypeError> {
        let mut bits = Vec::with_capacity(labels.len());
        let mut next = 0u8;
        for &(label, bit) in labels {
            let bit = bit.unwrap_or(next);
            if bit >= 64 {
                return Err(TypeError::mismatch(
                    label,
                    "bitset can only store bits 0..63",
                ));
            }
            next = next.max(bit + 1);
            bits.push((label.to_owned(), bit));
        }

        let rendered: Vec<String> = bits.iter().map(|(l, b)| format!("{l} = {b}")).collect();
        Ok(self.intern(TypeEntry {
            tag: Tag::Bitset,
            name: format!("bitset {{ {} }}", rendered.join(", ")),
            params: SmallVec::new(),
            flags: TypeFlags::empty(),
            detail: TypeDetail::Bitset { bits },
        }))
    }

    /// Register exception class `name`, derived from `base` (the root when
    /// `None`), carrying an optional argument of a storage type.
    pub fn register_exception(
        &mut self,
        name: &str,
        arg: Option<Idx>,
        base: Option<Idx>,
    ) -> Result<Idx, TypeError> {
        if let Some(base) = base {
            if self.tag(base) != Tag::Exception {
                return Err(TypeError::mismatch(
                    self.name(base),
                    "exception base must be an exception type",
                ));
            }
        }
        if let Some(arg) = arg {
            if !self.tag(arg).is_value_type() {
                return Err(TypeError::mismatch(
                    self.name(arg),
                    "exception argument must be a storage type",
                ));
            }
        }

        Ok(self.intern(TypeEntry {
            tag: Tag::Exception,
            name: format!("exception {name}"),
            params: SmallVec::new(),
            flags: TypeFlags::empty(),
            detail: TypeDetail::Exception {
                name: name.to_owned(),
                arg,
                base,
            },
        }))
    }

    /// The session's root exception type.
    #[inline]
    pub fn exception_root(&self) -> Idx {
        Idx::EXCEPTION
    }

    /// Base class of an exception type; an unset base is the root. The root
    /// itself has none.
    pub fn exception_base(&self, idx: Idx) -> Option<Idx> {
        if idx == Idx::EXCEPTION {
            return None;
        }
        match self.get(idx).detail {
            TypeDetail::Exception { base, .. } => Some(base.unwrap_or(Idx::EXCEPTION)),
            _ => None,
        }
    }

    pub fn exception_arg(&self, idx: Idx) -> Option<Idx> {
        match self.get(idx).detail {
            TypeDetail::Exception { arg, .. } => arg,
            _ => None,
        }
    }

    /// Whether `sub` is `sup` or derives from it.
    pub fn is_exception_subtype(&self, sub: Idx, sup: Idx) -> bool {
        let mut current = Some(sub);
        while let Some(idx) = current {
            if idx == sup {
                return true;
            }
            current = self.exception_base(idx);
        }
        false
    }

    /// Value of an enum label.
    pub fn enum_value(&self, idx: Idx, label: &str) -> Option<u32> {
        match &self.get(idx).detail {
            TypeDetail::Enum { labels } => labels.iter().find(|(l, _)| l == label).map(|(_, v)| *v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests;

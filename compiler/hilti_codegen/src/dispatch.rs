//! Ordered type-dispatch tables.
//!
//! A table is a list of (constraint, handler) pairs. Lookup scans in
//! registration order and returns the first handler whose constraint the
//! type satisfies, so specific entries must be registered before the
//! class-wide fallbacks they refine.

use hilti_diagnostic::internal_error;
use hilti_types::{Idx, TypeConstraint, TypePool};

struct Entry<H> {
    constraint: TypeConstraint,
    handler: H,
    doc: Option<&'static str>,
}

pub struct DispatchTable<H> {
    name: &'static str,
    entries: Vec<Entry<H>>,
}

impl<H: Copy> DispatchTable<H> {
    /// An empty table; `name` appears in defect messages.
    pub fn new(name: &'static str) -> Self {
        DispatchTable {
            name,
            entries: Vec::new(),
        }
    }

    pub fn register(&mut self, constraint: impl Into<TypeConstraint>, handler: H) {
        self.entries.push(Entry {
            constraint: constraint.into(),
            handler,
            doc: None,
        });
    }

    /// Register with a description of the mapping, for
    /// [`DispatchTable::docs`].
    pub fn register_documented(
        &mut self,
        constraint: impl Into<TypeConstraint>,
        handler: H,
        doc: &'static str,
    ) {
        self.entries.push(Entry {
            constraint: constraint.into(),
            handler,
            doc: Some(doc),
        });
    }

    /// First handler whose constraint `ty` satisfies.
    pub fn find(&self, pool: &TypePool, ty: Idx) -> Option<H> {
        self.entries
            .iter()
            .find(|e| pool.satisfies(ty, &e.constraint))
            .map(|e| e.handler)
    }

    /// Like [`DispatchTable::find`], for lookups that must succeed.
    pub fn get(&self, pool: &TypePool, ty: Idx) -> H {
        match self.find(pool, ty) {
            Some(handler) => handler,
            None => internal_error(format_args!(
                "no {} handler for type {}",
                self.name,
                pool.name(ty)
            )),
        }
    }

    /// Documented entries, in order.
    pub fn docs(&self) -> impl Iterator<Item = (&TypeConstraint, &'static str)> {
        self.entries
            .iter()
            .filter_map(|e| e.doc.map(|doc| (&e.constraint, doc)))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use hilti_types::{Tag, TypeClass};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn first_match_wins() {
        let mut pool = TypePool::new();
        let i32 = pool.integer(32).unwrap_or_else(|e| panic!("{e}"));

        let mut table: DispatchTable<&str> = DispatchTable::new("test");
        table.register(Tag::Bool, "bool");
        table.register(Tag::Integer, "integer");
        table.register(TypeClass::ValueType, "value");
        table.register(TypeConstraint::ANY, "any");

        assert_eq!(table.find(&pool, Idx::BOOL), Some("bool"));
        assert_eq!(table.find(&pool, i32), Some("integer"));
        assert_eq!(table.find(&pool, Idx::DOUBLE), Some("value"));
        assert_eq!(table.find(&pool, Idx::BYTES), Some("any"));
    }

    #[test]
    fn registration_order_decides() {
        let pool = TypePool::new();
        let mut table: DispatchTable<u8> = DispatchTable::new("test");
        table.register(TypeClass::ValueType, 1);
        table.register(Tag::Bool, 2);
        assert_eq!(table.find(&pool, Idx::BOOL), Some(1));
    }

    #[test]
    fn miss() {
        let pool = TypePool::new();
        let mut table: DispatchTable<u8> = DispatchTable::new("test");
        table.register(TypeClass::HeapType, 1);
        assert_eq!(table.find(&pool, Idx::BOOL), None);
    }

    #[test]
    #[should_panic(expected = "no storage handler for type bool")]
    fn mandatory_miss_is_a_defect() {
        let pool = TypePool::new();
        let table: DispatchTable<u8> = DispatchTable::new("storage");
        table.get(&pool, Idx::BOOL);
    }

    #[test]
    fn docs_skip_undocumented() {
        let mut table: DispatchTable<u8> = DispatchTable::new("test");
        table.register(Tag::Bool, 1);
        table.register_documented(Tag::Double, 2, "double");
        let docs: Vec<_> = table.docs().map(|(_, d)| d).collect();
        assert_eq!(docs, vec!["double"]);
        assert_eq!(table.len(), 2);
    }
}

//! Type system for the HILTI compiler backend.
//!
//! # Architecture
//!
//! - [`Idx`]: 32-bit handle into the [`TypePool`]. Canonical types are
//!   shared, so identity of a canonical type is index equality.
//! - [`Tag`]: closed enumeration of concrete type kinds.
//! - [`TypeClass`]: categories ("any integer type", "any heap type") forming
//!   an explicit is-a tree over the tags.
//! - [`TypePool`]: the session-scoped registry. Non-wildcard HILTI types are
//!   interned by their fully parameterized name; wildcard instances are
//!   created fresh on every request and never cached.
//!
//! # Matching
//!
//! Type compatibility is not identity. [`TypePool::types_match`] implements
//! the polymorphic rules: `any` matches everything, wildcards match every
//! instance of the same kind, and otherwise a kind-specific structural
//! comparison decides. Signature slots use [`TypeConstraint`], which can
//! also name whole classes.
//!
//! # Metadata
//!
//! [`TypeInfo`] is the runtime descriptor emitted once per concrete type.

mod constraint;
mod entry;
mod error;
mod flags;
mod idx;
mod param;
mod pool;
mod resolve;
mod tag;
mod type_info;
mod user;

pub use constraint::TypeConstraint;
pub use entry::{FunctionParam, StructField, TypeDetail, TypeEntry};
pub use error::{Arity, TypeError};
pub use flags::TypeFlags;
pub use idx::Idx;
pub use param::TypeParam;
pub use pool::TypePool;
pub use tag::{Tag, TypeClass};
pub use type_info::{type_info_symbol, TypeInfo, TypeInfoParam, TYPE_INFO_PREFIX};

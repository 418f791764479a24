//! Keyword-driven type resolution.
//!
//! The front-end hands over a type keyword and its parameters; this module
//! validates them against the keyword table and returns the canonical
//! instance.

use crate::{Arity, Idx, Tag, TypeError, TypeParam, TypePool};

#[derive(Copy, Clone, Debug)]
enum Ctor {
    /// A pre-interned, non-parameterized type.
    Simple(Idx),
    Integer,
    Tuple,
    Reference,
    Container(Tag),
    /// Resolved through the container's associated iterator.
    Iterator,
}

struct Keyword {
    name: &'static str,
    ctor: Ctor,
    arity: Arity,
    /// Fixed parameters used instead of user-supplied ones.
    defaults: Option<&'static [i64]>,
}

const fn kw(name: &'static str, ctor: Ctor, arity: usize) -> Keyword {
    Keyword {
        name,
        ctor,
        arity: Arity::Exact(arity),
        defaults: None,
    }
}

const fn int_kw(name: &'static str, defaults: &'static [i64]) -> Keyword {
    Keyword {
        name,
        ctor: Ctor::Integer,
        arity: Arity::Exact(1),
        defaults: Some(defaults),
    }
}

static KEYWORDS: &[Keyword] = &[
    kw("int", Ctor::Integer, 1),
    int_kw("int8", &[8]),
    int_kw("int16", &[16]),
    int_kw("int32", &[32]),
    int_kw("int64", &[64]),
    kw("double", Ctor::Simple(Idx::DOUBLE), 0),
    kw("string", Ctor::Simple(Idx::STRING), 0),
    kw("bool", Ctor::Simple(Idx::BOOL), 0),
    Keyword {
        name: "tuple",
        ctor: Ctor::Tuple,
        arity: Arity::AtLeastOne,
        defaults: None,
    },
    kw("ref", Ctor::Reference, 1),
    kw("channel", Ctor::Container(Tag::Channel), 2),
    kw("bytes", Ctor::Simple(Idx::BYTES), 0),
    kw("iterator", Ctor::Iterator, 1),
    kw("addr", Ctor::Simple(Idx::ADDR), 0),
    kw("net", Ctor::Simple(Idx::NET), 0),
    kw("port", Ctor::Simple(Idx::PORT), 0),
    kw("vector", Ctor::Container(Tag::Vector), 1),
    kw("list", Ctor::Container(Tag::List), 1),
    kw("regexp", Ctor::Simple(Idx::REGEXP), 0),
];

impl TypePool {
    /// Instantiate a type from its keyword and parameters.
    ///
    /// Concrete results are canonical: resolving the same name and
    /// parameters twice returns the same index. A lone [`TypeParam::Wildcard`]
    /// yields a fresh wildcard instance.
    pub fn resolve_type(&mut self, name: &str, params: &[TypeParam]) -> Result<Idx, TypeError> {
        let Some(keyword) = KEYWORDS.iter().find(|k| k.name == name) else {
            return Err(TypeError::UnknownType {
                name: name.to_owned(),
            });
        };

        if !params.is_empty() && (keyword.arity == Arity::Exact(0) || keyword.defaults.is_some()) {
            return Err(TypeError::ParametersNotAccepted {
                name: name.to_owned(),
            });
        }

        let wildcard = matches!(params, [TypeParam::Wildcard]);
        let wrong_count = match keyword.arity {
            Arity::Exact(n) => {
                (!params.is_empty() && params.len() != n && !wildcard)
                    || (params.is_empty() && keyword.defaults.is_none() && n > 0)
            }
            Arity::AtLeastOne => params.is_empty(),
        };
        if wrong_count {
            return Err(TypeError::WrongParameterCount {
                name: name.to_owned(),
                expected: keyword.arity,
                found: params.len(),
            });
        }

        let defaulted: Vec<TypeParam>;
        let params = match keyword.defaults {
            Some(defaults) => {
                defaulted = defaults.iter().map(|&v| TypeParam::Int(v)).collect();
                defaulted.as_slice()
            }
            None => params,
        };

        if wildcard {
            let tag = match keyword.ctor {
                Ctor::Integer => Tag::Integer,
                Ctor::Tuple => Tag::Tuple,
                Ctor::Reference => Tag::Reference,
                Ctor::Container(tag) => tag,
                Ctor::Simple(_) | Ctor::Iterator => {
                    return Err(TypeError::WildcardNotAllowed {
                        name: name.to_owned(),
                    })
                }
            };
            return self.wildcard(tag);
        }

        if params.iter().any(TypeParam::is_wildcard) {
            return Err(TypeError::mismatch(
                name,
                "type arguments cannot be a wildcard here",
            ));
        }

        match keyword.ctor {
            Ctor::Simple(idx) => Ok(idx),
            Ctor::Integer => self.integer_from_param(&params[0]),
            Ctor::Tuple => {
                let mut elements = Vec::with_capacity(params.len());
                for param in params {
                    elements.push(self.type_param(param, "tuple elements must be types")?);
                }
                Ok(self.tuple(&elements))
            }
            Ctor::Reference => {
                let target = self.type_param(&params[0], "reference takes a type as parameter")?;
                self.reference(target)
            }
            Ctor::Container(tag) => {
                let item = self.type_param(&params[0], "container item must be a type")?;
                self.container(tag, item, params.get(1).cloned())
            }
            Ctor::Iterator => self.resolve_iterator(name, &params[0]),
        }
    }

    fn type_param(&self, param: &TypeParam, reason: &str) -> Result<Idx, TypeError> {
        param
            .as_type()
            .ok_or_else(|| TypeError::mismatch(self.param_name(param), reason))
    }

    /// `iterator<C>` is the container's own iterator type, never a new one.
    fn resolve_iterator(&self, name: &str, param: &TypeParam) -> Result<Idx, TypeError> {
        let container = match param {
            TypeParam::Wildcard => {
                return Err(TypeError::WildcardNotAllowed {
                    name: name.to_owned(),
                })
            }
            TypeParam::Type(idx) if self.tag(*idx).is_hilti() => *idx,
            other => {
                return Err(TypeError::NotAType {
                    param: self.param_name(other),
                })
            }
        };
        self.iterator_of(container)
            .ok_or_else(|| TypeError::NotIterable {
                name: self.name(container).to_owned(),
            })
    }
}

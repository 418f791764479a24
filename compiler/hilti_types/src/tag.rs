//! Type kind tags and the class hierarchy over them.
//!
//! Every pool entry carries a [`Tag`] naming its concrete kind. Signature
//! slots and lowering tables talk about categories instead; a [`TypeClass`]
//! is either one of the abstract categories or a single concrete kind, and
//! [`Tag::is_a`] answers membership by walking the explicit parent table.
//!
//! # Hierarchy
//!
//! ```text
//! type
//! ├── HILTI type
//! │   ├── storage type: int double bool string tuple ref addr net port enum bitset
//! │   │   └── iterator: iterator<bytes> iterator<vector> iterator<list> iterator<channel>
//! │   └── heap type: struct bytes regexp exception continuation
//! │       └── container type: channel vector list
//! ├── operand type: label void any unknown
//! ├── type-declaration type
//! ├── function
//! └── meta type
//! ```

use std::fmt;

/// Concrete type kind.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u8)]
pub enum Tag {
    // === Storage types ===
    Integer,
    Double,
    Bool,
    String,
    Tuple,
    Reference,
    Addr,
    Net,
    Port,
    Enum,
    Bitset,

    // === Iterators ===
    IteratorBytes,
    IteratorVector,
    IteratorList,
    IteratorChannel,

    // === Heap types ===
    Struct,
    Bytes,
    RegExp,
    Exception,
    Continuation,
    Channel,
    Vector,
    List,

    // === Non-HILTI types ===
    Function,
    TypeDecl,
    Meta,
    Label,
    Void,
    Any,
    Unknown,
}

impl Tag {
    /// Base name used when rendering types of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Integer => "int",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Tuple => "tuple",
            Self::Reference => "ref",
            Self::Addr => "addr",
            Self::Net => "net",
            Self::Port => "port",
            Self::Enum => "enum",
            Self::Bitset => "bitset",
            Self::IteratorBytes
            | Self::IteratorVector
            | Self::IteratorList
            | Self::IteratorChannel => "iterator",
            Self::Struct => "struct",
            Self::Bytes => "bytes",
            Self::RegExp => "regexp",
            Self::Exception => "exception",
            Self::Continuation => "continuation",
            Self::Channel => "channel",
            Self::Vector => "vector",
            Self::List => "list",
            Self::Function => "function",
            Self::TypeDecl => "type-declaration type",
            Self::Meta => "meta type",
            Self::Label => "label",
            Self::Void => "void",
            Self::Any => "any",
            Self::Unknown => "unknown",
        }
    }

    /// Runtime type id shared with the native support library.
    ///
    /// Only HILTI types have one. Zero is reserved as an error indicator.
    pub const fn type_id(self) -> Option<u16> {
        let id = match self {
            Self::Integer => 1,
            Self::Double => 2,
            Self::String => 3,
            Self::Bool => 4,
            Self::Tuple => 5,
            Self::Reference => 6,
            Self::Struct => 7,
            Self::Channel => 8,
            Self::Bytes => 9,
            Self::Enum => 10,
            Self::Addr => 12,
            Self::Port => 13,
            Self::Vector => 15,
            Self::List => 16,
            Self::Net => 17,
            Self::RegExp => 18,
            Self::Bitset => 19,
            Self::Exception => 20,
            Self::Continuation => 21,
            Self::IteratorBytes => 100,
            Self::IteratorVector => 101,
            Self::IteratorList => 102,
            Self::IteratorChannel => 103,
            Self::Function
            | Self::TypeDecl
            | Self::Meta
            | Self::Label
            | Self::Void
            | Self::Any
            | Self::Unknown => return None,
        };
        Some(id)
    }

    /// Direct parent in the class hierarchy.
    pub const fn parent(self) -> TypeClass {
        match self {
            Self::Integer
            | Self::Double
            | Self::Bool
            | Self::String
            | Self::Tuple
            | Self::Reference
            | Self::Addr
            | Self::Net
            | Self::Port
            | Self::Enum
            | Self::Bitset => TypeClass::ValueType,
            Self::IteratorBytes
            | Self::IteratorVector
            | Self::IteratorList
            | Self::IteratorChannel => TypeClass::Iterator,
            Self::Struct | Self::Bytes | Self::RegExp | Self::Exception | Self::Continuation => {
                TypeClass::HeapType
            }
            Self::Channel | Self::Vector | Self::List => TypeClass::Container,
            Self::Label | Self::Void | Self::Any | Self::Unknown => TypeClass::OperandType,
            Self::TypeDecl => TypeClass::TypeDeclaration,
            Self::Function | Self::Meta => TypeClass::Type,
        }
    }

    /// Whether this kind belongs to `class`.
    ///
    /// The `any` kind used as a class accepts every tag.
    pub fn is_a(self, class: TypeClass) -> bool {
        match class {
            TypeClass::Kind(Tag::Any) => true,
            TypeClass::Kind(tag) => tag == self,
            abstract_class => {
                let mut current = Some(self.parent());
                while let Some(c) = current {
                    if c == abstract_class {
                        return true;
                    }
                    current = c.parent();
                }
                false
            }
        }
    }

    #[inline]
    pub fn is_hilti(self) -> bool {
        self.type_id().is_some()
    }

    #[inline]
    pub fn is_value_type(self) -> bool {
        self.is_a(TypeClass::ValueType)
    }

    #[inline]
    pub fn is_heap_type(self) -> bool {
        self.is_a(TypeClass::HeapType)
    }

    /// Iterator kind associated with an iterable kind.
    pub const fn iterator_tag(self) -> Option<Tag> {
        match self {
            Self::Bytes => Some(Self::IteratorBytes),
            Self::Vector => Some(Self::IteratorVector),
            Self::List => Some(Self::IteratorList),
            Self::Channel => Some(Self::IteratorChannel),
            _ => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Tag must stay one byte; entries store it inline.
const _: () = assert!(std::mem::size_of::<Tag>() == 1);

/// A category of types, or a single concrete kind.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeClass {
    /// Root: every type.
    Type,
    /// Types usable in programs (they have runtime metadata).
    HiltiType,
    /// Types stored directly in variables.
    ValueType,
    /// Types only reachable through references.
    HeapType,
    /// Iterable heap types with an item type.
    Container,
    Iterator,
    /// Types that only appear as operands.
    OperandType,
    /// Wrappers around a declared type.
    TypeDeclaration,
    /// Exactly one concrete kind.
    Kind(Tag),
}

impl TypeClass {
    /// Parent of an abstract class; `None` for the root and for kinds
    /// (use [`Tag::parent`] for those).
    pub const fn parent(self) -> Option<TypeClass> {
        match self {
            Self::Type | Self::Kind(_) => None,
            Self::HiltiType | Self::OperandType | Self::TypeDeclaration => Some(Self::Type),
            Self::ValueType | Self::HeapType => Some(Self::HiltiType),
            Self::Container => Some(Self::HeapType),
            Self::Iterator => Some(Self::ValueType),
        }
    }

    /// Readable name used in mismatch messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::HiltiType => "HILTI type",
            Self::ValueType => "storage type",
            Self::HeapType => "heap type",
            Self::Container => "container type",
            Self::Iterator => "iterator",
            Self::OperandType => "operand type",
            Self::TypeDeclaration => "type-declaration type",
            Self::Kind(tag) => tag.name(),
        }
    }
}

impl From<Tag> for TypeClass {
    fn from(tag: Tag) -> Self {
        TypeClass::Kind(tag)
    }
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

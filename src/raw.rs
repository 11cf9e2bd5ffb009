//! Untyped model produced by artwork extraction and consumed by lowering.
//!
//! References between definitions are indices: a field sized by a sibling holds the sibling's
//! position in its structure, and a resolved container holds a [`StructureId`] into the
//! document-wide list. Resolution rewrites these in place; nothing is copied.

use std::fmt;

/// Inclusive bound; either end may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl Range {
    pub fn new(min: Option<u64>, max: Option<u64>) -> Self {
        Range { min, max }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(min) = self.min {
            write!(f, "{min}")?;
        }
        f.write_str("..")?;
        if let Some(max) = self.max {
            write!(f, "{max}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSize {
    Bits(u64),
    Range(Range),
    /// A bare name such as `i`, not yet resolved.
    Name(String),
    /// The sibling at this index in the same structure carries the length.
    Field(usize),
    Structure(StructureId),
    Enum(EnumId),
}

impl fmt::Display for FieldSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSize::Bits(n) => write!(f, "{n}"),
            FieldSize::Range(r) => write!(f, "{r}"),
            FieldSize::Name(n) => f.write_str(n),
            FieldSize::Field(i) => write!(f, "field#{i}"),
            FieldSize::Structure(id) => write!(f, "structure#{}", id.0),
            FieldSize::Enum(id) => write!(f, "enum#{}", id.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Int(u64),
    Range(Range),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub size: FieldSize,
    pub value: Option<FieldValue>,
}

/// One entry of a structure. Cardinality wrappers are orthogonal to what they wrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Field(Field),
    StructContainer {
        name: String,
        size: FieldSize,
        target: StructureId,
    },
    /// Zero or more occurrences.
    Repeating(Box<FieldType>),
    /// Zero or one occurrence.
    Optional(Box<FieldType>),
}

impl FieldType {
    pub fn name(&self) -> &str {
        match self {
            FieldType::Field(f) => &f.name,
            FieldType::StructContainer { name, .. } => name,
            FieldType::Repeating(inner) | FieldType::Optional(inner) => inner.name(),
        }
    }

    /// The innermost field or container, beneath any cardinality wrappers.
    pub fn leaf(&self) -> &FieldType {
        match self {
            FieldType::Repeating(inner) | FieldType::Optional(inner) => inner.leaf(),
            leaf => leaf,
        }
    }

    pub fn leaf_mut(&mut self) -> &mut FieldType {
        match self {
            FieldType::Repeating(inner) | FieldType::Optional(inner) => inner.leaf_mut(),
            leaf => leaf,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    pub name: String,
    pub fields: Vec<FieldType>,
}

impl Structure {
    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.fields.iter().find(|f| f.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub ty: Option<StructureId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enum {
    pub name: String,
    pub values: Vec<EnumValue>,
}

/// Callbacks the artwork grammar invokes while building the raw model.
///
/// Every method has the obvious default; override to observe or rewrite what the grammar
/// produces.
pub trait Constructors {
    fn new_range(&mut self, min: Option<u64>, max: Option<u64>) -> Range {
        Range::new(min, max)
    }

    fn new_field(&mut self, name: String, size: FieldSize, value: Option<FieldValue>) -> FieldType {
        FieldType::Field(Field { name, size, value })
    }

    fn new_repeating_field(&mut self, target: FieldType) -> FieldType {
        FieldType::Repeating(Box::new(target))
    }

    fn new_optional_field(&mut self, target: FieldType) -> FieldType {
        FieldType::Optional(Box::new(target))
    }

    fn new_struct(&mut self, name: String, fields: Vec<FieldType>) -> Structure {
        Structure { name, fields }
    }

    fn new_enum_value(&mut self, name: String) -> EnumValue {
        EnumValue { name, ty: None }
    }

    fn new_enum(&mut self, name: String, values: Vec<EnumValue>) -> Enum {
        Enum { name, values }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConstructors;

impl Constructors for DefaultConstructors {}

//! Standard traits: named bundles of method signatures a type implements to gain capabilities.
//!
//! Traits are process-wide constants. A parameter or return slot of `None` binds to the
//! implementing type when the trait is implemented (see [`crate::types::ProtocolType::implement_trait`]).
//! Identity matters, not structure: two traits are the same only if they are the same static.

use crate::types::TypeId;

/// The primitive types a trait signature may name directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Nothing,
    Boolean,
    Number,
}

impl Primitive {
    /// Every type arena seeds the primitives at fixed slots, so this mapping is static.
    pub const fn id(self) -> TypeId {
        match self {
            Primitive::Nothing => TypeId::NOTHING,
            Primitive::Boolean => TypeId::BOOLEAN,
            Primitive::Number => TypeId::NUMBER,
        }
    }
}

/// A method signature with possibly unbound slots.
#[derive(Debug)]
pub struct MethodSignature {
    pub name: &'static str,
    pub parameters: &'static [(&'static str, Option<Primitive>)],
    pub return_type: Option<Primitive>,
}

#[derive(Debug)]
pub struct Trait {
    pub name: &'static str,
    pub methods: &'static [MethodSignature],
}

impl PartialEq for Trait {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Trait {}

const SELF: (&str, Option<Primitive>) = ("self", None);
const OTHER: (&str, Option<Primitive>) = ("other", None);
const SELF_OTHER: &[(&str, Option<Primitive>)] = &[SELF, OTHER];

const fn binary(name: &'static str, returns: Option<Primitive>) -> MethodSignature {
    MethodSignature {
        name,
        parameters: SELF_OTHER,
        return_type: returns,
    }
}

pub static VALUE: Trait = Trait {
    name: "Value",
    methods: &[
        MethodSignature {
            name: "get",
            parameters: &[SELF],
            return_type: None,
        },
        MethodSignature {
            name: "set",
            parameters: &[SELF, ("value", None)],
            return_type: Some(Primitive::Nothing),
        },
    ],
};

pub static SIZED: Trait = Trait {
    name: "Sized",
    methods: &[MethodSignature {
        name: "size",
        parameters: &[SELF],
        return_type: Some(Primitive::Number),
    }],
};

pub static INDEX_COLLECTION: Trait = Trait {
    name: "IndexCollection",
    methods: &[
        MethodSignature {
            name: "get",
            parameters: &[SELF, ("index", Some(Primitive::Number))],
            return_type: None,
        },
        MethodSignature {
            name: "set",
            parameters: &[SELF, ("index", Some(Primitive::Number)), ("value", None)],
            return_type: Some(Primitive::Nothing),
        },
        MethodSignature {
            name: "length",
            parameters: &[SELF],
            return_type: Some(Primitive::Number),
        },
    ],
};

pub static EQUALITY: Trait = Trait {
    name: "Equality",
    methods: &[
        binary("eq", Some(Primitive::Boolean)),
        binary("ne", Some(Primitive::Boolean)),
    ],
};

pub static ORDINAL: Trait = Trait {
    name: "Ordinal",
    methods: &[
        binary("lt", Some(Primitive::Boolean)),
        binary("le", Some(Primitive::Boolean)),
        binary("gt", Some(Primitive::Boolean)),
        binary("ge", Some(Primitive::Boolean)),
    ],
};

pub static BOOLEAN_OPS: Trait = Trait {
    name: "BooleanOps",
    methods: &[
        binary("and", Some(Primitive::Boolean)),
        binary("or", Some(Primitive::Boolean)),
        MethodSignature {
            name: "not",
            parameters: &[SELF],
            return_type: Some(Primitive::Boolean),
        },
    ],
};

pub static ARITHMETIC_OPS: Trait = Trait {
    name: "ArithmeticOps",
    methods: &[
        binary("plus", None),
        binary("minus", None),
        binary("multiply", None),
        binary("divide", None),
        binary("modulo", None),
        binary("pow", None),
    ],
};

pub static NUMBER_REPRESENTABLE: Trait = Trait {
    name: "NumberRepresentable",
    methods: &[MethodSignature {
        name: "to_number",
        parameters: &[SELF],
        return_type: Some(Primitive::Number),
    }],
};

/// All standard traits, in declaration order.
pub static STANDARD_TRAITS: [&Trait; 8] = [
    &VALUE,
    &SIZED,
    &EQUALITY,
    &ORDINAL,
    &BOOLEAN_OPS,
    &ARITHMETIC_OPS,
    &NUMBER_REPRESENTABLE,
    &INDEX_COLLECTION,
];

/// Look up a standard trait by name.
pub fn by_name(name: &str) -> Option<&'static Trait> {
    STANDARD_TRAITS.iter().copied().find(|t| t.name == name)
}

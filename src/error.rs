//! Error types for extraction and lowering.
//!
//! [`TypeError`] is fatal: it aborts lowering of the current document. [`ExtractError`] is
//! recoverable and only ever means "this artwork block is not a definition".

/// A fatal error raised while building or checking the IR.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("cannot create type {0}: malformed name")]
    MalformedTypeName(String),
    #[error("cannot create function or field {0}: malformed name")]
    MalformedFunctionName(String),
    #[error("cannot create type {0}: already exists")]
    DuplicateType(String),
    #[error("{container} already contains a field named {field}")]
    DuplicateField { container: String, field: String },
    #[error("{container} has no field named {field}")]
    MissingField { container: String, field: String },
    #[error("{ty} and its parents do not implement the {method} method")]
    MissingMethod { ty: String, method: String },
    #[error("type {ty} already implements trait {trait_name}")]
    TraitAlreadyImplemented { ty: String, trait_name: String },
    #[error("type {ty} already implements a method {method}")]
    MethodCollision { ty: String, method: String },
    #[error("method {method} on {ty}: invalid arguments")]
    InvalidArguments { ty: String, method: String },
    #[error("function {0}: invalid arguments")]
    InvalidFunctionArguments(String),
    #[error("no function named {0}")]
    UnknownFunction(String),
    #[error("no type named {0}")]
    UnknownType(String),
    #[error("cannot access fields in object of type {0}")]
    NotAStruct(String),
    #[error("invalid constraint on {ty}: {actual} != Boolean")]
    ConstraintNotBoolean { ty: String, actual: String },
    #[error("invalid action on {ty}: {actual} != Nothing")]
    ActionNotNothing { ty: String, actual: String },
    #[error("if/else condition has type {0}, expected Boolean")]
    NonBooleanCondition(String),
    #[error("if/else branch types differ: {if_true} vs {if_false}")]
    BranchMismatch { if_true: String, if_false: String },
    #[error("cannot evaluate Self without a containing type")]
    SelfWithoutContainingType,
    #[error("enum {enum_name}: variant {variant} does not refer to a structure")]
    UnresolvedEnumVariant { enum_name: String, variant: String },
    #[error("cannot define PDU {0}: no such type")]
    PduNotFound(String),
    #[error("cannot define PDU {0}: type is not representable")]
    PduNotRepresentable(String),
    #[error("cannot redefine protocol name {existing} as {requested}")]
    ProtocolNameAlreadySet { existing: String, requested: String },
    #[error("structure {0} refers to itself")]
    RecursiveType(String),
    #[error("{0} is defined twice with different contents")]
    DivergentDefinition(String),
}

/// Why an artwork block did not produce a structure or an enum.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("grammar: {0}")]
    Grammar(String),
    #[error("malformed number literal {0}")]
    Number(String),
    #[error("unexpected syntax: {0}")]
    Syntax(String),
}

pub type TypeResult<T> = Result<T, TypeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let err = TypeError::ConstraintNotBoolean {
            ty: "Test".to_string(),
            actual: "Number".to_string(),
        };
        assert_eq!(err.to_string(), "invalid constraint on Test: Number != Boolean");
        let err = TypeError::UnresolvedEnumVariant {
            enum_name: "Frame".to_string(),
            variant: "Ping Frame".to_string(),
        };
        assert!(err.to_string().contains("Ping Frame"));
    }
}

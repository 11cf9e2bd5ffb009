//! Expression AST and static type checking.
//!
//! Expressions are never executed. Lowering builds them for sizes, constraints and actions,
//! and [`Expression::result_type`] checks them against the type arena. All numeric semantics go
//! through trait methods (`to_number`, `eq`, `ge`, `and`, ...), so there are no operators here.

use crate::error::{TypeError, TypeResult};
use crate::types::{is_function_name, TypeArena, TypeId};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    Number(u64),
    Boolean(bool),
    Text(String),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Number(n) => write!(f, "{n}"),
            Constant::Boolean(b) => write!(f, "{b}"),
            Constant::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// A named argument as written in an invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentExpression {
    pub name: String,
    pub value: Expression,
}

impl ArgumentExpression {
    pub fn new(name: impl Into<String>, value: Expression) -> Self {
        ArgumentExpression {
            name: name.into(),
            value,
        }
    }
}

/// An argument after type checking: what a [`crate::types::Function`] is matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal tagged with its declared type; constants of different types never compare equal.
    Constant { ty: TypeId, value: Constant },
    /// The struct whose constraint or action is being evaluated.
    SelfRef,
    FieldAccess {
        target: Box<Expression>,
        field: String,
    },
    ContextAccess {
        context: TypeId,
        field: String,
    },
    MethodInvocation {
        target: Box<Expression>,
        method: String,
        arguments: Vec<ArgumentExpression>,
    },
    FunctionInvocation {
        function: TypeId,
        arguments: Vec<ArgumentExpression>,
    },
    IfElse {
        condition: Box<Expression>,
        if_true: Box<Expression>,
        if_false: Box<Expression>,
    },
}

impl Expression {
    pub fn number(n: u64) -> Self {
        Expression::Constant {
            ty: TypeId::NUMBER,
            value: Constant::Number(n),
        }
    }

    pub fn boolean(b: bool) -> Self {
        Expression::Constant {
            ty: TypeId::BOOLEAN,
            value: Constant::Boolean(b),
        }
    }

    pub fn self_ref() -> Self {
        Expression::SelfRef
    }

    pub fn field(self, name: impl Into<String>) -> Self {
        Expression::FieldAccess {
            target: Box::new(self),
            field: name.into(),
        }
    }

    /// `self.<method>(<arguments>)`, rejecting malformed method names up front.
    pub fn invoke(self, method: &str, arguments: Vec<ArgumentExpression>) -> TypeResult<Self> {
        if !is_function_name(method) {
            return Err(TypeError::MalformedFunctionName(method.to_string()));
        }
        Ok(Expression::MethodInvocation {
            target: Box::new(self),
            method: method.to_string(),
            arguments,
        })
    }

    /// Shorthand for a binary method whose single argument is named `other`.
    pub fn binary(self, method: &str, other: Expression) -> TypeResult<Self> {
        self.invoke(method, vec![ArgumentExpression::new("other", other)])
    }

    pub fn if_else(condition: Expression, if_true: Expression, if_false: Expression) -> Self {
        Expression::IfElse {
            condition: Box::new(condition),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    /// The static type of this expression. `containing` binds `Self` and is required only when
    /// the expression mentions it.
    pub fn result_type(&self, containing: Option<TypeId>, types: &TypeArena) -> TypeResult<TypeId> {
        match self {
            Expression::Constant { ty, .. } => Ok(*ty),
            Expression::SelfRef => containing.ok_or(TypeError::SelfWithoutContainingType),
            Expression::FieldAccess { target, field } => {
                let target_ty = target.result_type(containing, types)?;
                let ty = types.get(target_ty);
                let fields = ty
                    .as_struct()
                    .ok_or_else(|| TypeError::NotAStruct(ty.name.clone()))?;
                fields
                    .field(field)
                    .map(|f| f.ty)
                    .ok_or_else(|| TypeError::MissingField {
                        container: ty.name.clone(),
                        field: field.clone(),
                    })
            }
            Expression::ContextAccess { context, field } => {
                let ty = types.get(*context);
                let fields = ty
                    .as_context()
                    .ok_or_else(|| TypeError::NotAStruct(ty.name.clone()))?;
                fields
                    .field(field)
                    .map(|f| f.ty)
                    .ok_or_else(|| TypeError::MissingField {
                        container: ty.name.clone(),
                        field: field.clone(),
                    })
            }
            Expression::MethodInvocation {
                target,
                method,
                arguments,
            } => {
                let receiver = target.result_type(containing, types)?;
                let function = types.get_method(receiver, method)?;
                let arguments = Self::type_arguments(arguments, containing, types)?;
                if !function.is_method_accepting(receiver, &arguments, types) {
                    return Err(TypeError::InvalidArguments {
                        ty: types.name(receiver).to_string(),
                        method: method.clone(),
                    });
                }
                Ok(function.return_type())
            }
            Expression::FunctionInvocation {
                function,
                arguments,
            } => {
                let ty = types.get(*function);
                let callee = ty
                    .as_function()
                    .ok_or_else(|| TypeError::UnknownFunction(ty.name.clone()))?;
                let arguments = Self::type_arguments(arguments, containing, types)?;
                if !callee.is_accepting(&arguments, types) {
                    return Err(TypeError::InvalidFunctionArguments(callee.name.clone()));
                }
                Ok(callee.return_type())
            }
            Expression::IfElse {
                condition,
                if_true,
                if_false,
            } => {
                let condition = condition.result_type(containing, types)?;
                if condition != TypeId::BOOLEAN {
                    return Err(TypeError::NonBooleanCondition(types.name(condition).to_string()));
                }
                let t = if_true.result_type(containing, types)?;
                let f = if_false.result_type(containing, types)?;
                if t != f {
                    return Err(TypeError::BranchMismatch {
                        if_true: types.name(t).to_string(),
                        if_false: types.name(f).to_string(),
                    });
                }
                Ok(t)
            }
        }
    }

    fn type_arguments(
        arguments: &[ArgumentExpression],
        containing: Option<TypeId>,
        types: &TypeArena,
    ) -> TypeResult<Vec<Argument>> {
        arguments
            .iter()
            .map(|a| {
                Ok(Argument {
                    name: a.name.clone(),
                    ty: a.value.result_type(containing, types)?,
                })
            })
            .collect()
    }
}

fn write_arguments(f: &mut fmt::Formatter<'_>, arguments: &[ArgumentExpression]) -> fmt::Result {
    for (i, a) in arguments.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}={}", a.name, a.value)?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant { value, .. } => write!(f, "{value}"),
            Expression::SelfRef => f.write_str("self"),
            Expression::FieldAccess { target, field } => write!(f, "{target}.{field}"),
            Expression::ContextAccess { field, .. } => write!(f, "context.{field}"),
            Expression::MethodInvocation {
                target,
                method,
                arguments,
            } => {
                write!(f, "{target}.{method}(")?;
                write_arguments(f, arguments)?;
                f.write_str(")")
            }
            Expression::FunctionInvocation { function, arguments } => {
                write!(f, "fn#{}(", function.index())?;
                write_arguments(f, arguments)?;
                f.write_str(")")
            }
            Expression::IfElse {
                condition,
                if_true,
                if_false,
            } => write!(f, "if {condition} then {if_true} else {if_false}"),
        }
    }
}

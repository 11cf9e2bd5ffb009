//! The protocol registry: every type, function and context field of one protocol, plus the
//! ordered list of PDUs.
//!
//! The registry is the only way lowering mutates the IR. Once a document is compiled it is
//! read-only and handed to whatever renders it (see [`crate::dump`]).

use crate::error::{TypeError, TypeResult};
use crate::expr::{ArgumentExpression, Expression};
use crate::traits::Trait;
use crate::types::{
    Context, Function, Parameter, ProtocolType, Size, StructField, TypeArena, TypeId,
    TypeKind,
};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct Protocol {
    name: Option<String>,
    types: TypeArena,
    /// Insertion-ordered names, and the index over them.
    names: Vec<String>,
    by_name: HashMap<String, TypeId>,
    context: TypeId,
    pdus: Vec<String>,
}

impl Default for Protocol {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol {
    pub fn new() -> Self {
        let mut types = TypeArena::new();
        let context = match types.new_context("Context") {
            Ok(id) => id,
            Err(e) => unreachable!("context name is well formed: {e}"),
        };
        let mut protocol = Protocol {
            name: None,
            types,
            names: Vec::new(),
            by_name: HashMap::new(),
            context,
            pdus: Vec::new(),
        };
        for id in [TypeId::NOTHING, TypeId::BOOLEAN, TypeId::NUMBER] {
            let name = protocol.types.name(id).to_string();
            protocol.bind(name, id);
        }
        protocol
    }

    fn bind(&mut self, name: String, id: TypeId) {
        self.by_name.insert(name.clone(), id);
        self.names.push(name);
    }

    fn check_free(&self, name: &str) -> TypeResult<()> {
        if self.by_name.contains_key(name) {
            return Err(TypeError::DuplicateType(name.to_string()));
        }
        Ok(())
    }

    pub fn protocol_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name the protocol. The name can only be set once.
    pub fn set_protocol_name(&mut self, name: impl Into<String>) -> TypeResult<()> {
        let name = name.into();
        if let Some(existing) = &self.name {
            return Err(TypeError::ProtocolNameAlreadySet {
                existing: existing.clone(),
                requested: name,
            });
        }
        tracing::debug!(protocol = %name, "protocol named");
        self.name = Some(name);
        Ok(())
    }

    pub fn types(&self) -> &TypeArena {
        &self.types
    }

    /// Direct access to the arena, for building types that the `define_*` helpers do not cover.
    /// Types created this way are unnamed until passed to [`Protocol::add_type`].
    pub fn types_mut(&mut self) -> &mut TypeArena {
        &mut self.types
    }

    /// Register a type created in this protocol's arena under its own name.
    pub fn add_type(&mut self, id: TypeId) -> TypeResult<TypeId> {
        let name = self.types.name(id).to_string();
        self.check_free(&name)?;
        self.bind(name, id);
        Ok(id)
    }

    pub fn define_bitstring(&mut self, name: &str, size: Size) -> TypeResult<TypeId> {
        self.check_free(name)?;
        let id = self.types.new_bitstring(name, size)?;
        self.add_type(id)
    }

    pub fn define_array(&mut self, name: &str, element: TypeId, length: Option<Expression>) -> TypeResult<TypeId> {
        self.check_free(name)?;
        let id = self.types.new_array(name, element, length)?;
        self.add_type(id)
    }

    pub fn define_option(&mut self, name: &str, reference: TypeId) -> TypeResult<TypeId> {
        self.check_free(name)?;
        let id = self.types.new_option(name, reference)?;
        self.add_type(id)
    }

    /// Define a struct. Constraints and actions are checked against the struct once every field
    /// is in place.
    pub fn define_struct(
        &mut self,
        name: &str,
        fields: Vec<StructField>,
        constraints: Vec<Expression>,
        actions: Vec<Expression>,
    ) -> TypeResult<TypeId> {
        self.check_free(name)?;
        let id = self.types.new_struct(name)?;
        for field in fields {
            self.types.add_field(id, field)?;
        }
        for constraint in constraints {
            self.types.add_constraint(id, constraint)?;
        }
        for action in actions {
            self.types.add_action(id, action)?;
        }
        self.add_type(id)
    }

    pub fn define_enum(&mut self, name: &str, variants: Vec<TypeId>) -> TypeResult<TypeId> {
        self.check_free(name)?;
        let id = self.types.new_enum(name, variants)?;
        self.add_type(id)
    }

    /// A copy of `source` with its own method table, extended with `also_implements`.
    pub fn derive_type(&mut self, name: &str, source: TypeId, also_implements: &[&'static Trait]) -> TypeResult<TypeId> {
        self.check_free(name)?;
        let id = self.types.derive_from(source, name, also_implements)?;
        self.add_type(id)
    }

    /// A subtype of `source`: inherits methods through its parent link and `is_a` source.
    pub fn derive_subtype(&mut self, name: &str, source: TypeId, also_implements: &[&'static Trait]) -> TypeResult<TypeId> {
        self.check_free(name)?;
        let id = self.types.derive_subtype(source, name, also_implements)?;
        self.add_type(id)
    }

    pub fn define_function(
        &mut self,
        name: &str,
        parameters: Vec<Parameter>,
        return_type: Option<TypeId>,
    ) -> TypeResult<TypeId> {
        self.check_free(name)?;
        let id = self.types.new_function(Function::new(name, parameters, return_type))?;
        self.add_type(id)
    }

    pub fn define_context_field(&mut self, name: &str, ty: TypeId) -> TypeResult<()> {
        self.types.add_field(self.context, StructField::new(name, ty))
    }

    /// Mark an existing representable type as a PDU. Declaration order is kept.
    pub fn define_pdu(&mut self, name: &str) -> TypeResult<()> {
        let id = self
            .type_id(name)
            .ok_or_else(|| TypeError::PduNotFound(name.to_string()))?;
        if !self.types.get(id).is_representable() {
            return Err(TypeError::PduNotRepresentable(name.to_string()));
        }
        tracing::debug!(pdu = name, "PDU defined");
        self.pdus.push(name.to_string());
        Ok(())
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    pub fn get_type(&self, name: &str) -> TypeResult<&ProtocolType> {
        self.type_id(name)
            .map(|id| self.types.get(id))
            .ok_or_else(|| TypeError::UnknownType(name.to_string()))
    }

    pub fn has_func(&self, name: &str) -> bool {
        self.get_func(name).is_ok()
    }

    pub fn get_func(&self, name: &str) -> TypeResult<&Function> {
        self.type_id(name)
            .and_then(|id| self.types.get(id).as_function())
            .ok_or_else(|| TypeError::UnknownFunction(name.to_string()))
    }

    pub fn get_context(&self) -> &Context {
        match &self.types.get(self.context).kind {
            TypeKind::Context(c) => c,
            _ => unreachable!("context slot always holds a context"),
        }
    }

    pub fn context_id(&self) -> TypeId {
        self.context
    }

    /// An expression reading a context field.
    pub fn context_access(&self, field: impl Into<String>) -> Expression {
        Expression::ContextAccess {
            context: self.context,
            field: field.into(),
        }
    }

    /// An expression calling a registered function.
    pub fn invoke_function(&self, name: &str, arguments: Vec<ArgumentExpression>) -> TypeResult<Expression> {
        let function = self
            .type_id(name)
            .filter(|id| self.types.get(*id).as_function().is_some())
            .ok_or_else(|| TypeError::UnknownFunction(name.to_string()))?;
        Ok(Expression::FunctionInvocation { function, arguments })
    }

    pub fn get_pdu(&self, name: &str) -> TypeResult<&ProtocolType> {
        if !self.pdus.iter().any(|p| p == name) {
            return Err(TypeError::PduNotFound(name.to_string()));
        }
        self.get_type(name)
    }

    pub fn get_pdu_names(&self) -> &[String] {
        &self.pdus
    }

    /// Every registered name, primitives first, in registration order.
    pub fn get_type_names(&self) -> &[String] {
        &self.names
    }

    /// Constructable type names in dependency-first order: each type after everything it
    /// refers to, walking from the PDUs and then the context. Every name appears once.
    pub fn traversal_order(&self) -> Vec<String> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let roots = self
            .pdus
            .iter()
            .filter_map(|name| self.type_id(name))
            .chain(std::iter::once(self.context));
        for root in roots {
            self.visit(root, &mut seen, &mut order);
        }
        order
    }

    fn visit(&self, id: TypeId, seen: &mut HashSet<TypeId>, order: &mut Vec<String>) {
        let ty = self.types.get(id);
        if ty.is_primitive() || !seen.insert(id) {
            return;
        }
        let children: Vec<TypeId> = match &ty.kind {
            TypeKind::Struct(s) => s.fields().iter().map(|f| f.ty).collect(),
            TypeKind::Context(c) => c.fields().iter().map(|f| f.ty).collect(),
            TypeKind::Enum { variants } => variants.clone(),
            TypeKind::Array { element, .. } => vec![*element],
            TypeKind::Option { reference } => vec![*reference],
            TypeKind::Function(f) => f
                .parameters
                .iter()
                .filter_map(|p| p.ty)
                .chain(f.return_type)
                .collect(),
            TypeKind::Nothing | TypeKind::Boolean | TypeKind::Number | TypeKind::BitString => Vec::new(),
        };
        for child in children.into_iter().chain(ty.parent) {
            self.visit(child, seen, order);
        }
        order.push(ty.name.clone());
    }
}

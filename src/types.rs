//! Protocol types: the nominal type graph of the IR.
//!
//! Every type lives in a [`TypeArena`] and is referred to by an opaque [`TypeId`]. Types are
//! never removed, so ids are stable for the lifetime of the arena and compare by identity.
//!
//! Types fall into capability categories rather than a class hierarchy:
//!
//! - **primitive**: one canonical instance per arena (`Nothing`, `Boolean`, `Number`)
//! - **internal**: not wire-representable (`Boolean`, `Number`, functions, the context)
//! - **representable**: carries a [`Size`] (`Nothing`, bit strings, options, arrays, structs, enums)
//! - **constructable**: everything that is not primitive; named by a protocol definition

use crate::error::{TypeError, TypeResult};
use crate::expr::{Argument, Constant, Expression};
use crate::traits::{self, Trait};
use std::fmt;

/// Opaque handle to a type in a [`TypeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub const NOTHING: TypeId = TypeId(0);
    pub const BOOLEAN: TypeId = TypeId(1);
    pub const NUMBER: TypeId = TypeId(2);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Type names begin with an upper case letter and are at least two characters long.
pub fn is_type_name(name: &str) -> bool {
    is_name(name, |c| c.is_ascii_uppercase())
}

/// Function, method and field names begin with a lower case letter.
pub fn is_function_name(name: &str) -> bool {
    is_name(name, |c| c.is_ascii_lowercase())
}

fn is_name(name: &str, first: impl Fn(char) -> bool) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if first(c) => {}
        _ => return false,
    }
    let rest = chars.as_str();
    !rest.is_empty()
        && rest
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '$' || c == '_')
}

/// Size of a representable type, in bits.
#[derive(Debug, Clone, PartialEq)]
pub enum Size {
    /// Fixed or computed size, e.g. a constant or `self.length.to_number()`.
    Expr(Expression),
    /// Variable size within inclusive bounds; `max: None` is unbounded.
    Bounded { min: u64, max: Option<u64> },
    /// Self-describing variable-length integer: a 2-bit prefix selects 8, 16, 32 or 64 bits.
    VarInt,
    Unspecified,
}

impl Size {
    pub fn bits(n: u64) -> Size {
        Size::Expr(Expression::number(n))
    }

    /// The size in bits, when it is a constant.
    pub fn constant(&self) -> Option<u64> {
        match self {
            Size::Expr(Expression::Constant {
                ty,
                value: Constant::Number(n),
            }) if *ty == TypeId::NUMBER => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    /// `None` binds to the implementing type.
    pub ty: Option<TypeId>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: Option<TypeId>) -> Self {
        Parameter {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeId>,
}

impl Function {
    pub fn new(name: impl Into<String>, parameters: Vec<Parameter>, return_type: Option<TypeId>) -> Self {
        Function {
            name: name.into(),
            parameters,
            return_type,
        }
    }

    fn bind(signature: &traits::MethodSignature, receiver: TypeId) -> Self {
        Function {
            name: signature.name.to_string(),
            parameters: signature
                .parameters
                .iter()
                .map(|(name, ty)| Parameter::new(*name, Some(ty.map_or(receiver, |p| p.id()))))
                .collect(),
            return_type: Some(signature.return_type.map_or(receiver, |p| p.id())),
        }
    }

    fn rebind(&self, from: TypeId, to: TypeId) -> Self {
        let swap = |ty: Option<TypeId>| ty.map(|t| if t == from { to } else { t });
        Function {
            name: self.name.clone(),
            parameters: self
                .parameters
                .iter()
                .map(|p| Parameter::new(p.name.clone(), swap(p.ty)))
                .collect(),
            return_type: swap(self.return_type),
        }
    }

    pub fn return_type(&self) -> TypeId {
        self.return_type.unwrap_or(TypeId::NOTHING)
    }

    /// Whether this is a method whose `self` parameter accepts `receiver`.
    pub fn is_method(&self, receiver: TypeId, types: &TypeArena) -> bool {
        match self.parameters.first() {
            Some(p) if p.name == "self" => types.conforms(receiver, p.ty.unwrap_or(receiver)),
            _ => false,
        }
    }

    /// Whether this method, invoked on `receiver`, accepts `arguments` positionally,
    /// by name and by subtype-compatible type.
    pub fn is_method_accepting(&self, receiver: TypeId, arguments: &[Argument], types: &TypeArena) -> bool {
        self.is_method(receiver, types)
            && Self::accepts(&self.parameters[1..], receiver, arguments, types)
    }

    /// Whether this function, called freely, accepts `arguments`.
    pub fn is_accepting(&self, arguments: &[Argument], types: &TypeArena) -> bool {
        Self::accepts(&self.parameters, TypeId::NOTHING, arguments, types)
    }

    fn accepts(parameters: &[Parameter], receiver: TypeId, arguments: &[Argument], types: &TypeArena) -> bool {
        parameters.len() == arguments.len()
            && parameters.iter().zip(arguments).all(|(p, a)| {
                p.name == a.name && types.conforms(a.ty, p.ty.unwrap_or(receiver))
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub ty: TypeId,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        StructField {
            name: name.into(),
            ty,
        }
    }
}

/// Fields in insertion order, plus constraints and actions checked against the struct.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Struct {
    fields: Vec<StructField>,
    pub constraints: Vec<Expression>,
    pub actions: Vec<Expression>,
}

impl Struct {
    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    fields: Vec<StructField>,
}

impl Context {
    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Nothing,
    Boolean,
    Number,
    BitString,
    Option { reference: TypeId },
    Array { element: TypeId, length: Option<Expression> },
    Struct(Struct),
    Enum { variants: Vec<TypeId> },
    Function(Function),
    Context(Context),
}

impl TypeKind {
    pub fn label(&self) -> &'static str {
        match self {
            TypeKind::Nothing => "Nothing",
            TypeKind::Boolean => "Boolean",
            TypeKind::Number => "Number",
            TypeKind::BitString => "BitString",
            TypeKind::Option { .. } => "Option",
            TypeKind::Array { .. } => "Array",
            TypeKind::Struct(_) => "Struct",
            TypeKind::Enum { .. } => "Enum",
            TypeKind::Function(_) => "Function",
            TypeKind::Context(_) => "Context",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProtocolType {
    id: TypeId,
    pub name: String,
    pub kind: TypeKind,
    size: Option<Size>,
    traits: Vec<&'static Trait>,
    methods: Vec<Function>,
    pub parent: Option<TypeId>,
}

impl ProtocolType {
    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeKind::Nothing | TypeKind::Boolean | TypeKind::Number)
    }

    pub fn is_internal(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Boolean | TypeKind::Number | TypeKind::Function(_) | TypeKind::Context(_)
        )
    }

    pub fn is_representable(&self) -> bool {
        self.size.is_some()
    }

    pub fn is_constructable(&self) -> bool {
        !self.is_primitive()
    }

    /// Size of a representable type; `None` for internal types.
    pub fn size(&self) -> Option<&Size> {
        self.size.as_ref()
    }

    pub fn traits(&self) -> &[&'static Trait] {
        &self.traits
    }

    pub fn implements(&self, t: &Trait) -> bool {
        self.traits.iter().any(|own| *own == t)
    }

    /// Methods bound to this type, in trait implementation order. Inherited methods are not listed.
    pub fn methods(&self) -> &[Function] {
        &self.methods
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match &self.kind {
            TypeKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match &self.kind {
            TypeKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<&Context> {
        match &self.kind {
            TypeKind::Context(c) => Some(c),
            _ => None,
        }
    }

    /// Bind every method of `t` to this type and add it to the method table.
    ///
    /// Fails if `t` is already implemented or if any of its method names is already taken;
    /// nothing is changed on failure.
    pub fn implement_trait(&mut self, t: &'static Trait) -> TypeResult<()> {
        if self.implements(t) {
            return Err(TypeError::TraitAlreadyImplemented {
                ty: self.name.clone(),
                trait_name: t.name.to_string(),
            });
        }
        if let Some(clash) = t.methods.iter().find(|m| self.own_method(m.name).is_some()) {
            return Err(TypeError::MethodCollision {
                ty: self.name.clone(),
                method: clash.name.to_string(),
            });
        }
        self.traits.push(t);
        let id = self.id;
        self.methods
            .extend(t.methods.iter().map(|signature| Function::bind(signature, id)));
        Ok(())
    }

    fn own_method(&self, name: &str) -> Option<&Function> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl fmt::Display for ProtocolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let traits: Vec<&str> = self.traits.iter().map(|t| t.name).collect();
        if self.is_primitive() {
            write!(f, "{}<::{}>", self.kind.label(), traits.join(" "))
        } else {
            write!(f, "{}<{}::{}>", self.kind.label(), self.name, traits.join(" "))
        }
    }
}

/// Dense, id-indexed storage for every type of one protocol.
///
/// A new arena is seeded with the primitive types at [`TypeId::NOTHING`], [`TypeId::BOOLEAN`]
/// and [`TypeId::NUMBER`], each implementing its standard traits.
#[derive(Debug, Clone)]
pub struct TypeArena {
    types: Vec<ProtocolType>,
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeArena {
    pub fn new() -> Self {
        let mut arena = TypeArena { types: Vec::new() };
        let nothing = arena.alloc("Nothing", TypeKind::Nothing, Some(Size::bits(0)));
        let boolean = arena.alloc("Boolean", TypeKind::Boolean, None);
        let number = arena.alloc("Number", TypeKind::Number, None);
        debug_assert_eq!(
            (nothing, boolean, number),
            (TypeId::NOTHING, TypeId::BOOLEAN, TypeId::NUMBER)
        );
        arena
            .seed(nothing, &[&traits::SIZED])
            .and_then(|a| a.seed(boolean, &[&traits::VALUE, &traits::EQUALITY, &traits::BOOLEAN_OPS]))
            .and_then(|a| {
                a.seed(
                    number,
                    &[&traits::VALUE, &traits::EQUALITY, &traits::ORDINAL, &traits::ARITHMETIC_OPS],
                )
            })
            .map(|_| ())
            .unwrap_or_else(|e| unreachable!("standard traits do not collide: {e}"));
        arena
    }

    fn seed(&mut self, id: TypeId, with: &[&'static Trait]) -> TypeResult<&mut Self> {
        for &t in with {
            self.get_mut(id).implement_trait(t)?;
        }
        Ok(self)
    }

    fn alloc(&mut self, name: impl Into<String>, kind: TypeKind, size: Option<Size>) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ProtocolType {
            id,
            name: name.into(),
            kind,
            size,
            traits: Vec::new(),
            methods: Vec::new(),
            parent: None,
        });
        id
    }

    fn alloc_with(
        &mut self,
        name: &str,
        kind: TypeKind,
        size: Option<Size>,
        with: &[&'static Trait],
    ) -> TypeResult<TypeId> {
        if !is_type_name(name) {
            return Err(TypeError::MalformedTypeName(name.to_string()));
        }
        let id = self.alloc(name, kind, size);
        let ty = self.get_mut(id);
        for &t in with {
            ty.implement_trait(t)?;
        }
        Ok(id)
    }

    /// # Panics
    ///
    /// Panics if `id` was not allocated by this arena.
    pub fn get(&self, id: TypeId) -> &ProtocolType {
        &self.types[id.index()]
    }

    /// # Panics
    ///
    /// Panics if `id` was not allocated by this arena.
    pub fn get_mut(&mut self, id: TypeId) -> &mut ProtocolType {
        &mut self.types[id.index()]
    }

    pub fn name(&self, id: TypeId) -> &str {
        &self.get(id).name
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProtocolType> {
        self.types.iter()
    }

    pub fn new_bitstring(&mut self, name: &str, size: Size) -> TypeResult<TypeId> {
        self.alloc_with(
            name,
            TypeKind::BitString,
            Some(size),
            &[&traits::SIZED, &traits::VALUE, &traits::EQUALITY, &traits::NUMBER_REPRESENTABLE],
        )
    }

    /// An optional occurrence of `reference`, as wide as `reference` when present. Methods not
    /// implemented by the option itself resolve through `reference`, which is recorded as its
    /// parent.
    pub fn new_option(&mut self, name: &str, reference: TypeId) -> TypeResult<TypeId> {
        let size = self.get(reference).size().cloned();
        let id = self.alloc_with(
            name,
            TypeKind::Option { reference },
            size,
            &[&traits::SIZED],
        )?;
        self.get_mut(id).parent = Some(reference);
        Ok(id)
    }

    /// An array of `element`. The size is known only when both the element size and the length
    /// are constants.
    pub fn new_array(&mut self, name: &str, element: TypeId, length: Option<Expression>) -> TypeResult<TypeId> {
        let size = match (self.get(element).size().and_then(Size::constant), &length) {
            (Some(bits), Some(Expression::Constant { value: Constant::Number(n), .. })) => {
                bits.checked_mul(*n).map_or(Size::Unspecified, Size::bits)
            }
            _ => Size::Unspecified,
        };
        self.alloc_with(
            name,
            TypeKind::Array { element, length },
            Some(size),
            &[&traits::SIZED, &traits::EQUALITY, &traits::INDEX_COLLECTION],
        )
    }

    pub fn new_struct(&mut self, name: &str) -> TypeResult<TypeId> {
        self.alloc_with(
            name,
            TypeKind::Struct(Struct::default()),
            Some(Size::Unspecified),
            &[&traits::SIZED, &traits::EQUALITY],
        )
    }

    pub fn new_enum(&mut self, name: &str, variants: Vec<TypeId>) -> TypeResult<TypeId> {
        self.alloc_with(
            name,
            TypeKind::Enum { variants },
            Some(Size::Unspecified),
            &[&traits::SIZED],
        )
    }

    pub fn new_function(&mut self, function: Function) -> TypeResult<TypeId> {
        if !is_function_name(&function.name) {
            return Err(TypeError::MalformedFunctionName(function.name));
        }
        let name = function.name.clone();
        Ok(self.alloc(name, TypeKind::Function(function), None))
    }

    pub fn new_context(&mut self, name: &str) -> TypeResult<TypeId> {
        self.alloc_with(name, TypeKind::Context(Context::default()), None, &[])
    }

    pub fn add_field(&mut self, struct_id: TypeId, field: StructField) -> TypeResult<()> {
        if !is_function_name(&field.name) {
            return Err(TypeError::MalformedFunctionName(field.name));
        }
        let ty = self.get_mut(struct_id);
        let container = ty.name.clone();
        let fields = match &mut ty.kind {
            TypeKind::Struct(s) => &mut s.fields,
            TypeKind::Context(c) => &mut c.fields,
            _ => return Err(TypeError::NotAStruct(container)),
        };
        if fields.iter().any(|f| f.name == field.name) {
            return Err(TypeError::DuplicateField {
                container,
                field: field.name,
            });
        }
        fields.push(field);
        Ok(())
    }

    /// Append a constraint; it must type-check to `Boolean` with `Self` bound to the struct.
    pub fn add_constraint(&mut self, struct_id: TypeId, constraint: Expression) -> TypeResult<()> {
        let actual = constraint.result_type(Some(struct_id), self)?;
        if actual != TypeId::BOOLEAN {
            return Err(TypeError::ConstraintNotBoolean {
                ty: self.name(struct_id).to_string(),
                actual: self.name(actual).to_string(),
            });
        }
        self.struct_mut(struct_id)?.constraints.push(constraint);
        Ok(())
    }

    /// Append an action; it must type-check to `Nothing` with `Self` bound to the struct.
    pub fn add_action(&mut self, struct_id: TypeId, action: Expression) -> TypeResult<()> {
        let actual = action.result_type(Some(struct_id), self)?;
        if actual != TypeId::NOTHING {
            return Err(TypeError::ActionNotNothing {
                ty: self.name(struct_id).to_string(),
                actual: self.name(actual).to_string(),
            });
        }
        self.struct_mut(struct_id)?.actions.push(action);
        Ok(())
    }

    fn struct_mut(&mut self, id: TypeId) -> TypeResult<&mut Struct> {
        let ty = self.get_mut(id);
        match &mut ty.kind {
            TypeKind::Struct(s) => Ok(s),
            _ => Err(TypeError::NotAStruct(ty.name.clone())),
        }
    }

    /// Resolve a method on `id`, then on each ancestor in turn.
    pub fn get_method(&self, id: TypeId, method: &str) -> TypeResult<&Function> {
        let mut current = Some(id);
        while let Some(ty) = current.map(|c| self.get(c)) {
            if let Some(found) = ty.own_method(method) {
                return Ok(found);
            }
            current = ty.parent;
        }
        Err(TypeError::MissingMethod {
            ty: self.get(id).to_string(),
            method: method.to_string(),
        })
    }

    /// Whether `other` is a strict ancestor of `id`.
    pub fn is_a(&self, id: TypeId, other: TypeId) -> bool {
        let mut current = self.get(id).parent;
        while let Some(parent) = current {
            if parent == other {
                return true;
            }
            current = self.get(parent).parent;
        }
        false
    }

    /// Whether a value of type `actual` may be used where `expected` is required.
    pub fn conforms(&self, actual: TypeId, expected: TypeId) -> bool {
        actual == expected || self.is_a(actual, expected)
    }

    /// A copy of `source` under a new name, with the source's methods rebound to the copy,
    /// additionally implementing `also_implements`.
    pub fn derive_from(
        &mut self,
        source: TypeId,
        name: &str,
        also_implements: &[&'static Trait],
    ) -> TypeResult<TypeId> {
        if !is_type_name(name) {
            return Err(TypeError::MalformedTypeName(name.to_string()));
        }
        let base = self.get(source).clone();
        let id = self.alloc(name, base.kind, base.size);
        let derived = self.get_mut(id);
        derived.parent = base.parent;
        derived.traits = base.traits;
        derived.methods = base.methods.iter().map(|m| m.rebind(source, id)).collect();
        for &t in also_implements {
            derived.implement_trait(t)?;
        }
        Ok(id)
    }

    /// A new type with the representation of `source`, an empty method table and `source`
    /// recorded as its parent, so that it `is_a` source and inherits its methods by lookup.
    pub fn derive_subtype(
        &mut self,
        source: TypeId,
        name: &str,
        also_implements: &[&'static Trait],
    ) -> TypeResult<TypeId> {
        if !is_type_name(name) {
            return Err(TypeError::MalformedTypeName(name.to_string()));
        }
        let base = self.get(source);
        let (kind, size) = (base.kind.clone(), base.size.clone());
        let id = self.alloc(name, kind, size);
        let derived = self.get_mut(id);
        derived.parent = Some(source);
        for &t in also_implements {
            derived.implement_trait(t)?;
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{EQUALITY, INDEX_COLLECTION, ORDINAL, VALUE};

    #[test]
    fn name_rules() {
        assert!(is_type_name("Test"));
        assert!(is_type_name("Ack_frame$2"));
        assert!(!is_type_name("T"));
        assert!(!is_type_name("test"));
        assert!(!is_type_name("Has space"));
        assert!(is_function_name("to_number"));
        assert!(!is_function_name("ToNumber"));
        assert!(!is_function_name("f7-bit"));
    }

    #[test]
    fn primitives_are_seeded() {
        let arena = TypeArena::new();
        assert_eq!(arena.name(TypeId::NUMBER), "Number");
        assert!(arena.get(TypeId::NOTHING).is_representable());
        assert_eq!(arena.get(TypeId::NOTHING).size().and_then(Size::constant), Some(0));
        assert!(arena.get(TypeId::BOOLEAN).is_internal());
        assert!(arena.get(TypeId::NUMBER).implements(&ORDINAL));
        assert!(!arena.get(TypeId::BOOLEAN).implements(&ORDINAL));
    }

    #[test]
    fn bitstring_traits_and_bound_methods() {
        let mut arena = TypeArena::new();
        let ts = arena.new_bitstring("Timestamp", Size::bits(32)).unwrap();
        let ty = arena.get(ts);
        let names: Vec<&str> = ty.traits().iter().map(|t| t.name).collect();
        assert_eq!(names, ["Sized", "Value", "Equality", "NumberRepresentable"]);
        let eq = arena.get_method(ts, "eq").unwrap();
        assert_eq!(eq.parameters[0].ty, Some(ts));
        assert_eq!(eq.parameters[1].ty, Some(ts));
        assert_eq!(eq.return_type(), TypeId::BOOLEAN);
        assert_eq!(arena.get_method(ts, "to_number").unwrap().return_type(), TypeId::NUMBER);
    }

    #[test]
    fn implementing_twice_fails() {
        let mut arena = TypeArena::new();
        let ts = arena.new_bitstring("Timestamp", Size::bits(32)).unwrap();
        let err = arena.get_mut(ts).implement_trait(&EQUALITY).unwrap_err();
        assert!(matches!(err, TypeError::TraitAlreadyImplemented { .. }));
    }

    #[test]
    fn colliding_methods_fail_without_partial_change() {
        let mut arena = TypeArena::new();
        let ts = arena.new_bitstring("Timestamp", Size::bits(32)).unwrap();
        let before = arena.get(ts).methods().len();
        let err = arena.get_mut(ts).implement_trait(&INDEX_COLLECTION).unwrap_err();
        assert_eq!(
            err,
            TypeError::MethodCollision {
                ty: "Timestamp".to_string(),
                method: "get".to_string()
            }
        );
        assert_eq!(arena.get(ts).methods().len(), before);
        assert!(!arena.get(ts).implements(&INDEX_COLLECTION));
    }

    #[test]
    fn value_and_index_collection_cannot_compose() {
        let mut arena = TypeArena::new();
        let ctx = arena.new_context("Scratch").unwrap();
        arena.get_mut(ctx).implement_trait(&VALUE).unwrap();
        assert!(arena.get_mut(ctx).implement_trait(&INDEX_COLLECTION).is_err());
    }

    #[test]
    fn subtype_resolves_through_parent() {
        let mut arena = TypeArena::new();
        let bits16 = arena.new_bitstring("Bits16", Size::bits(16)).unwrap();
        let seq = arena.derive_subtype(bits16, "SeqNum", &[&ORDINAL]).unwrap();
        assert!(arena.is_a(seq, bits16));
        assert!(!arena.is_a(bits16, seq));
        assert!(!arena.is_a(seq, seq));
        assert_eq!(arena.get(seq).methods().len(), 4);
        let eq = arena.get_method(seq, "eq").unwrap();
        assert_eq!(eq.parameters[0].ty, Some(bits16));
        assert!(eq.is_method(seq, &arena));
        assert!(arena.get_method(seq, "lt").is_ok());
        assert!(arena.get_method(bits16, "lt").is_err());
    }

    #[test]
    fn derive_from_rebinds_methods() {
        let mut arena = TypeArena::new();
        let bits16 = arena.new_bitstring("Bits16", Size::bits(16)).unwrap();
        let seq = arena.derive_from(bits16, "SeqNum", &[&ORDINAL]).unwrap();
        let ty = arena.get(seq);
        assert_eq!(ty.traits().len(), 5);
        assert_eq!(ty.parent, None);
        assert_eq!(arena.get_method(seq, "eq").unwrap().parameters[0].ty, Some(seq));
        assert_eq!(arena.get(seq).size().and_then(Size::constant), Some(16));
    }

    #[test]
    fn array_size_from_constant_parts() {
        let mut arena = TypeArena::new();
        let ssrc = arena.new_bitstring("Ssrc", Size::bits(32)).unwrap();
        let list = arena
            .new_array("CsrcList", ssrc, Some(Expression::number(4)))
            .unwrap();
        assert_eq!(arena.get(list).size().and_then(Size::constant), Some(128));
        let open = arena.new_array("CsrcOpen", ssrc, None).unwrap();
        assert_eq!(arena.get(open).size(), Some(&Size::Unspecified));
    }

    #[test]
    fn option_keeps_reference_width() {
        let mut arena = TypeArena::new();
        let token = arena.new_bitstring("Token", Size::bits(8)).unwrap();
        let opt = arena.new_option("TokenOpt", token).unwrap();
        assert_eq!(arena.get(opt).size().and_then(Size::constant), Some(8));
        assert!(arena.is_a(opt, token));
        let flag = arena.new_option("FlagOpt", TypeId::BOOLEAN).unwrap();
        assert!(!arena.get(flag).is_representable());
    }

    #[test]
    fn struct_fields_are_unique_and_well_named() {
        let mut arena = TypeArena::new();
        let ts = arena.new_bitstring("Timestamp", Size::bits(32)).unwrap();
        let s = arena.new_struct("Header").unwrap();
        arena.add_field(s, StructField::new("ts", ts)).unwrap();
        assert!(matches!(
            arena.add_field(s, StructField::new("ts", ts)),
            Err(TypeError::DuplicateField { .. })
        ));
        assert!(matches!(
            arena.add_field(s, StructField::new("Bad", ts)),
            Err(TypeError::MalformedFunctionName(_))
        ));
    }

    #[test]
    fn display_lists_traits() {
        let mut arena = TypeArena::new();
        let s = arena.new_struct("Header").unwrap();
        assert_eq!(arena.get(s).to_string(), "Struct<Header::Sized Equality>");
        assert_eq!(arena.get(TypeId::BOOLEAN).to_string(), "Boolean<::Value Equality BooleanOps>");
    }
}

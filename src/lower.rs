//! Lowering: resolved raw definitions into registered, type-checked IR types.
//!
//! Structures and enums are memoized by normalized name, so a structure reached through several
//! containers or enum variants is lowered once and every reference shares the same [`TypeId`].
//!
//! Per field, the type is chosen in this order:
//!
//! 1. a nested structure or enum (container, or a size naming one) is lowered and used directly
//! 2. a literal size becomes a constant-size bit string
//! 3. a sibling length field becomes `self.<sibling>.to_number()`, if the sibling came first
//! 4. a range becomes a bounded size, and the varint marker a variable-length integer
//!
//! Values become constraints: `= v` gives `to_number().eq(v)` and `= a..b` gives
//! `to_number().ge(a).and(to_number().le(b))`. Fields typed by a structure or enum get none.

use crate::config::CompileOptions;
use crate::error::{TypeError, TypeResult};
use crate::expr::Expression;
use crate::extract::{Definition, ParsedRepresentation};
use crate::protocol::Protocol;
use crate::raw::{EnumId, Field, FieldSize, FieldType, FieldValue, Range, Structure, StructureId};
use crate::types::{Size, StructField, TypeId};
use std::collections::{HashMap, HashSet};

/// Field and method names: lower case, words joined by `_`. A leading digit gets an `F` prefix.
pub fn normalize_field_name(name: &str) -> String {
    let collapsed = collapse_whitespace(&prefix_digit(name, 'F'));
    sanitize(&collapsed.to_lowercase())
}

/// Type names: capitalized, words joined by `_`. A leading digit gets a `T` prefix.
pub fn normalize_type_name(name: &str) -> String {
    let collapsed = collapse_whitespace(&prefix_digit(name, 'T'));
    sanitize(&capitalize(&collapsed))
}

fn prefix_digit(name: &str, prefix: char) -> String {
    let name = name.trim_start();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("{prefix}{name}")
    } else {
        name.to_string()
    }
}

fn collapse_whitespace(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First character upper case, the rest lower case.
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '$' || c == '_' { c } else { '_' })
        .collect()
}

fn to_number(field: &str) -> TypeResult<Expression> {
    Expression::self_ref().field(field).invoke("to_number", vec![])
}

/// Constraints implied by a field's declared value.
pub fn value_constraints(field: &str, value: FieldValue) -> TypeResult<Vec<Expression>> {
    match value {
        FieldValue::Int(v) => Ok(vec![to_number(field)?.binary("eq", Expression::number(v))?]),
        FieldValue::Range(Range { min, max: Some(max) }) => {
            let ge = to_number(field)?.binary("ge", Expression::number(min.unwrap_or(0)))?;
            let le = to_number(field)?.binary("le", Expression::number(max))?;
            Ok(vec![ge.binary("and", le)?])
        }
        FieldValue::Range(_) => Ok(Vec::new()),
    }
}

/// Where a field sits while it is being lowered.
struct FieldSite<'r> {
    structure: &'r Structure,
    index: usize,
    struct_ty: TypeId,
    field_name: String,
}

pub struct Lowering<'a> {
    protocol: &'a mut Protocol,
    raw: &'a ParsedRepresentation,
    options: &'a CompileOptions,
    structs: HashMap<String, (StructureId, TypeId)>,
    enums: HashMap<String, (EnumId, TypeId)>,
    in_progress: HashSet<String>,
}

impl<'a> Lowering<'a> {
    pub fn new(protocol: &'a mut Protocol, raw: &'a ParsedRepresentation, options: &'a CompileOptions) -> Self {
        Lowering {
            protocol,
            raw,
            options,
            structs: HashMap::new(),
            enums: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Name the protocol if it has no name yet, lower every definition in document order, then
    /// register the top-level ones as PDUs.
    pub fn run(mut self) -> TypeResult<()> {
        let raw = self.raw;
        if self.protocol.protocol_name().is_none() {
            if let Some(name) = self.options.protocol_name.clone().or_else(|| raw.name.clone()) {
                self.protocol.set_protocol_name(name)?;
            }
        }
        for &definition in raw.definitions() {
            self.lower_definition(definition)?;
        }
        if self.options.define_pdus {
            for definition in raw.top_level() {
                let ty = self.lower_definition(definition)?;
                let name = self.protocol.types().name(ty).to_string();
                if !self.protocol.get_pdu_names().contains(&name) {
                    self.protocol.define_pdu(&name)?;
                }
            }
        }
        Ok(())
    }

    pub fn lower_definition(&mut self, definition: Definition) -> TypeResult<TypeId> {
        match definition {
            Definition::Structure(id) => self.lower_structure(id),
            Definition::Enum(id) => self.lower_enum(id),
        }
    }

    pub fn lower_structure(&mut self, id: StructureId) -> TypeResult<TypeId> {
        let raw = self.raw;
        let structure = raw.structure(id);
        let name = normalize_type_name(&structure.name);
        if let Some(&(seen, ty)) = self.structs.get(&name) {
            if seen != id && raw.structure(seen) != structure {
                return Err(TypeError::DivergentDefinition(name));
            }
            tracing::debug!(structure = %name, "reusing lowered structure");
            return Ok(ty);
        }
        if !self.in_progress.insert(name.clone()) {
            return Err(TypeError::RecursiveType(name));
        }
        if self.protocol.has_type(&name) {
            return Err(TypeError::DuplicateType(name));
        }

        let struct_ty = self.protocol.types_mut().new_struct(&name)?;
        for (index, field) in structure.fields.iter().enumerate() {
            let site = FieldSite {
                structure,
                index,
                struct_ty,
                field_name: normalize_field_name(field.name()),
            };
            let stem = format!("{name}_{}", site.field_name);
            let (ty, constraints, _) = self.lower_field(&site, field, stem)?;
            tracing::trace!(structure = %name, field = %site.field_name, ty = %self.protocol.types().name(ty), "field lowered");
            let types = self.protocol.types_mut();
            types.add_field(struct_ty, StructField::new(site.field_name.clone(), ty))?;
            for constraint in constraints {
                types.add_constraint(struct_ty, constraint)?;
            }
        }
        self.protocol.add_type(struct_ty)?;

        self.in_progress.remove(&name);
        self.structs.insert(name, (id, struct_ty));
        Ok(struct_ty)
    }

    pub fn lower_enum(&mut self, id: EnumId) -> TypeResult<TypeId> {
        let raw = self.raw;
        let e = raw.enumeration(id);
        let name = normalize_type_name(&e.name);
        if let Some(&(seen, ty)) = self.enums.get(&name) {
            if seen != id && raw.enumeration(seen) != e {
                return Err(TypeError::DivergentDefinition(name));
            }
            tracing::debug!(enumeration = %name, "reusing lowered enum");
            return Ok(ty);
        }
        if !self.in_progress.insert(name.clone()) {
            return Err(TypeError::RecursiveType(name));
        }

        let mut variants = Vec::with_capacity(e.values.len());
        for value in &e.values {
            let target = value.ty.ok_or_else(|| TypeError::UnresolvedEnumVariant {
                enum_name: e.name.clone(),
                variant: value.name.clone(),
            })?;
            variants.push(self.lower_structure(target)?);
        }
        let ty = self.protocol.define_enum(&name, variants)?;

        self.in_progress.remove(&name);
        self.enums.insert(name, (id, ty));
        Ok(ty)
    }

    /// The type of one structure entry, the constraints it implies, and the name stem for any
    /// wrapper built around it.
    fn lower_field(
        &mut self,
        site: &FieldSite<'_>,
        field: &FieldType,
        stem: String,
    ) -> TypeResult<(TypeId, Vec<Expression>, String)> {
        match field {
            FieldType::Field(f) => {
                let (ty, constraints) = self.lower_leaf(site, f, &stem)?;
                Ok((ty, constraints, stem))
            }
            FieldType::StructContainer { target, .. } => Ok((self.lower_structure(*target)?, Vec::new(), stem)),
            FieldType::Optional(inner) => {
                let (inner_ty, constraints, stem) = self.lower_field(site, inner, stem)?;
                let stem = format!("{stem}_opt");
                let ty = self.protocol.define_option(&stem, inner_ty)?;
                Ok((ty, constraints, stem))
            }
            FieldType::Repeating(inner) => {
                let (element, constraints, stem) = self.lower_field(site, inner, stem)?;
                if !constraints.is_empty() {
                    tracing::debug!(field = %site.field_name, "dropping value constraint on repeated field");
                }
                let stem = format!("{stem}_list");
                let ty = self.protocol.define_array(&stem, element, None)?;
                Ok((ty, Vec::new(), stem))
            }
        }
    }

    fn lower_leaf(&mut self, site: &FieldSite<'_>, field: &Field, stem: &str) -> TypeResult<(TypeId, Vec<Expression>)> {
        let size = match &field.size {
            FieldSize::Structure(id) => return Ok((self.lower_structure(*id)?, Vec::new())),
            FieldSize::Enum(id) => return Ok((self.lower_enum(*id)?, Vec::new())),
            FieldSize::Bits(n) => Size::bits(*n),
            FieldSize::Range(r) => Size::Bounded {
                min: r.min.unwrap_or(0),
                max: r.max,
            },
            FieldSize::Name(n) if *n == self.options.varint_marker => Size::VarInt,
            FieldSize::Name(n) => {
                tracing::warn!(field = %field.name, size = %n, "unknown size name, size left unspecified");
                Size::Unspecified
            }
            FieldSize::Field(sibling) => self.length_size(site, *sibling),
        };
        // Each struct is lowered once, so a taken name means two fields normalize alike.
        let ty = self.protocol.define_bitstring(stem, size)?;
        let constraints = match field.value {
            Some(value) => value_constraints(&site.field_name, value)?,
            None => Vec::new(),
        };
        Ok((ty, constraints))
    }

    /// `self.<sibling>.to_number()`, provided the sibling is already a numeric field of the struct.
    fn length_size(&self, site: &FieldSite<'_>, sibling: usize) -> Size {
        let Some(length_field) = site.structure.fields.get(sibling).filter(|_| sibling < site.index) else {
            tracing::warn!(field = %site.field_name, "length field does not precede the field it sizes");
            return Size::Unspecified;
        };
        let expr = to_number(&normalize_field_name(length_field.name()));
        match expr.and_then(|e| e.result_type(Some(site.struct_ty), self.protocol.types()).map(|_| e)) {
            Ok(e) => Size::Expr(e),
            Err(err) => {
                tracing::warn!(field = %site.field_name, error = %err, "length field is not numeric");
                Size::Unspecified
            }
        }
    }
}

/// Lower a resolved representation into a fresh protocol.
pub fn lower(raw: &ParsedRepresentation, options: &CompileOptions) -> TypeResult<Protocol> {
    let mut protocol = Protocol::new();
    Lowering::new(&mut protocol, raw, options).run()?;
    Ok(protocol)
}

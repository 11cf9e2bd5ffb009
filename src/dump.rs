//! Human-readable rendering of a lowered protocol: one line per type, indented members.

use crate::expr::Expression;
use crate::protocol::Protocol;
use crate::types::{ProtocolType, Size, TypeArena, TypeKind};
use std::fmt::Write;

pub fn format_expression(expr: &Expression) -> String {
    expr.to_string()
}

pub fn format_size(size: &Size) -> String {
    match size {
        Size::Expr(e) => format_expression(e),
        Size::Bounded { min, max: Some(max) } => format!("{min}..{max}"),
        Size::Bounded { min, max: None } => format!("{min}.."),
        Size::VarInt => "varint".to_string(),
        Size::Unspecified => "?".to_string(),
    }
}

/// The protocol name, every registered non-primitive type in registration order, the context
/// fields and the PDUs.
pub fn format_protocol(protocol: &Protocol) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "protocol {}", protocol.protocol_name().unwrap_or("<unnamed>"));
    let types = protocol.types();
    for name in protocol.get_type_names() {
        let Ok(ty) = protocol.get_type(name) else {
            continue;
        };
        if !ty.is_primitive() {
            format_type(&mut out, ty, types);
        }
    }
    let context = protocol.get_context();
    if !context.fields().is_empty() {
        out.push_str("context\n");
        for field in context.fields() {
            let _ = writeln!(out, "  {}: {}", field.name, types.name(field.ty));
        }
    }
    for pdu in protocol.get_pdu_names() {
        let _ = writeln!(out, "pdu {pdu}");
    }
    out
}

fn format_type(out: &mut String, ty: &ProtocolType, types: &TypeArena) {
    let traits: Vec<&str> = ty.traits().iter().map(|t| t.name).collect();
    let size = ty.size().map(format_size);
    match &ty.kind {
        TypeKind::BitString => {
            let _ = writeln!(out, "bits {} ({}) [{}]", ty.name, size.unwrap_or_default(), traits.join(", "));
        }
        TypeKind::Option { reference } => {
            let _ = writeln!(out, "option {} of {}", ty.name, types.name(*reference));
        }
        TypeKind::Array { element, length } => {
            let length = length.as_ref().map(format_expression).unwrap_or_else(|| "..".to_string());
            let _ = writeln!(out, "array {} of {} [{}]", ty.name, types.name(*element), length);
        }
        TypeKind::Struct(s) => {
            let _ = writeln!(out, "struct {} {{", ty.name);
            for field in s.fields() {
                let _ = writeln!(out, "  {}: {}", field.name, types.name(field.ty));
            }
            for constraint in &s.constraints {
                let _ = writeln!(out, "  where {}", format_expression(constraint));
            }
            for action in &s.actions {
                let _ = writeln!(out, "  then {}", format_expression(action));
            }
            out.push_str("}\n");
        }
        TypeKind::Enum { variants } => {
            let names: Vec<&str> = variants.iter().map(|v| types.name(*v)).collect();
            let _ = writeln!(out, "enum {} = {}", ty.name, names.join(" | "));
        }
        TypeKind::Function(f) => {
            let params: Vec<String> = f
                .parameters
                .iter()
                .map(|p| match p.ty {
                    Some(t) => format!("{}: {}", p.name, types.name(t)),
                    None => p.name.clone(),
                })
                .collect();
            let _ = writeln!(out, "fn {}({}) -> {}", f.name, params.join(", "), types.name(f.return_type()));
        }
        TypeKind::Nothing | TypeKind::Boolean | TypeKind::Number | TypeKind::Context(_) => {}
    }
}

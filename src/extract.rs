//! Whole-document extraction: every artwork block through the grammar (phase 1), then
//! cross-reference resolution over everything found (phase 2).
//!
//! Resolution runs after all blocks are read because definitions refer to each other in both
//! directions of document order.

use crate::config::CompileOptions;
use crate::document::Document;
use crate::grammar::{extract_block, Extracted};
use crate::raw::{
    Constructors, DefaultConstructors, Enum, EnumId, FieldSize, FieldType, Structure, StructureId,
};
use std::collections::{HashMap, HashSet};

/// A definition in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Definition {
    Structure(StructureId),
    Enum(EnumId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRepresentation {
    pub name: Option<String>,
    pub structs: Vec<Structure>,
    pub enums: Vec<Enum>,
    order: Vec<Definition>,
}

impl ParsedRepresentation {
    /// Extract and resolve every definition in `document`.
    pub fn new(document: &Document, options: &CompileOptions) -> Self {
        let mut parsed = Self::from_blocks(document.artwork(), &mut DefaultConstructors);
        parsed.name = document.protocol_name();
        parsed.resolve(options);
        parsed
    }

    /// Phase 1 only: run each block through the grammar and record what matched.
    pub fn from_blocks<'a>(
        blocks: impl IntoIterator<Item = &'a str>,
        ctors: &mut impl Constructors,
    ) -> Self {
        let mut parsed = ParsedRepresentation::default();
        for block in blocks {
            match extract_block(block, ctors) {
                Extracted::Structure(s) => {
                    parsed.add_struct(s);
                }
                Extracted::Enum(e) => {
                    parsed.add_enum(e);
                }
                Extracted::NoMatch => {}
            }
        }
        parsed
    }

    pub fn add_struct(&mut self, structure: Structure) -> StructureId {
        let id = StructureId(self.structs.len());
        tracing::trace!(name = %structure.name, fields = structure.fields.len(), "structure extracted");
        self.structs.push(structure);
        self.order.push(Definition::Structure(id));
        id
    }

    pub fn add_enum(&mut self, e: Enum) -> EnumId {
        let id = EnumId(self.enums.len());
        tracing::trace!(name = %e.name, variants = e.values.len(), "enum extracted");
        self.enums.push(e);
        self.order.push(Definition::Enum(id));
        id
    }

    pub fn structure(&self, id: StructureId) -> &Structure {
        &self.structs[id.0]
    }

    pub fn enumeration(&self, id: EnumId) -> &Enum {
        &self.enums[id.0]
    }

    /// Every definition, in the order it was extracted.
    pub fn definitions(&self) -> &[Definition] {
        &self.order
    }

    pub fn definition_name(&self, definition: Definition) -> &str {
        match definition {
            Definition::Structure(id) => &self.structure(id).name,
            Definition::Enum(id) => &self.enumeration(id).name,
        }
    }

    /// Phase 2: bind containers, length backreferences, named sizes and enum variants.
    ///
    /// The first definition of a name wins when a name is defined more than once.
    pub fn resolve(&mut self, options: &CompileOptions) {
        let struct_names = first_by_name(self.structs.iter().map(|s| s.name.as_str()));
        let enum_names = first_by_name(self.enums.iter().map(|e| e.name.as_str()));

        for structure in &mut self.structs {
            let siblings: Vec<String> = structure.fields.iter().map(|f| f.name().to_string()).collect();
            for (index, field) in structure.fields.iter_mut().enumerate() {
                let leaf = field.leaf_mut();
                let FieldType::Field(raw) = &mut *leaf else {
                    continue;
                };
                if let Some(&target) = struct_names.get(raw.name.as_str()) {
                    *leaf = FieldType::StructContainer {
                        name: raw.name.clone(),
                        size: raw.size.clone(),
                        target: StructureId(target),
                    };
                    continue;
                }
                let resolved = match &raw.size {
                    FieldSize::Range(_) => length_field(index, &siblings, &options.length_suffix).map(FieldSize::Field),
                    FieldSize::Name(name) => struct_names
                        .get(name.as_str())
                        .map(|&i| FieldSize::Structure(StructureId(i)))
                        .or_else(|| enum_names.get(name.as_str()).map(|&i| FieldSize::Enum(EnumId(i))))
                        .or_else(|| length_field(index, &siblings, &options.length_suffix).map(FieldSize::Field)),
                    _ => None,
                };
                if let Some(size) = resolved {
                    tracing::trace!(structure = %structure.name, field = %raw.name, size = %size, "size resolved");
                    raw.size = size;
                }
            }
        }

        for e in &mut self.enums {
            for value in e.values.iter_mut().filter(|v| v.ty.is_none()) {
                value.ty = struct_names.get(value.name.as_str()).map(|&i| StructureId(i));
            }
        }
    }

    /// Definitions nothing else refers to, in document order.
    pub fn top_level(&self) -> Vec<Definition> {
        let mut referenced = HashSet::new();
        for structure in &self.structs {
            for field in &structure.fields {
                match field.leaf() {
                    FieldType::StructContainer { target, .. } => {
                        referenced.insert(Definition::Structure(*target));
                    }
                    FieldType::Field(f) => match f.size {
                        FieldSize::Structure(id) => {
                            referenced.insert(Definition::Structure(id));
                        }
                        FieldSize::Enum(id) => {
                            referenced.insert(Definition::Enum(id));
                        }
                        _ => {}
                    },
                    FieldType::Repeating(_) | FieldType::Optional(_) => {}
                }
            }
        }
        for e in &self.enums {
            referenced.extend(e.values.iter().filter_map(|v| v.ty).map(Definition::Structure));
        }
        self.order
            .iter()
            .copied()
            .filter(|d| !referenced.contains(d))
            .collect()
    }
}

fn first_by_name<'a>(names: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (i, name) in names.enumerate() {
        map.entry(name.to_string()).or_insert(i);
    }
    map
}

/// Index of the sibling holding the length of the field at `index`.
///
/// An exact `"<name><suffix>"` sibling wins; otherwise the first sibling whose name contains the
/// field's name and ends with the suffix. Names compare case-insensitively. A field that is itself
/// a length never has one.
fn length_field(index: usize, siblings: &[String], suffix: &str) -> Option<usize> {
    let own = siblings.get(index)?.to_lowercase();
    let suffix = suffix.to_lowercase();
    if own.ends_with(suffix.trim_start()) {
        return None;
    }
    let lowered: Vec<String> = siblings.iter().map(|s| s.to_lowercase()).collect();
    let exact = format!("{own}{suffix}");
    lowered.iter().position(|s| *s == exact).or_else(|| {
        lowered
            .iter()
            .enumerate()
            .position(|(j, s)| j != index && s.contains(&own) && s.ends_with(&suffix))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{Field, FieldValue, Range};

    fn parsed(blocks: &[&str]) -> ParsedRepresentation {
        let mut parsed = ParsedRepresentation::from_blocks(blocks.iter().copied(), &mut DefaultConstructors);
        parsed.resolve(&CompileOptions::default());
        parsed
    }

    fn leaf_field(s: &Structure, i: usize) -> &Field {
        match s.fields[i].leaf() {
            FieldType::Field(f) => f,
            other => panic!("not a field: {other:?}"),
        }
    }

    #[test]
    fn varint_size_binds_to_length_sibling() {
        let p = parsed(&["Example {\n  A (i),\n  A Length (8),\n}"]);
        let s = &p.structs[0];
        assert_eq!(leaf_field(s, 0).size, FieldSize::Field(1));
        assert_eq!(s.fields[1].name(), "A Length");
        assert_eq!(leaf_field(s, 1).size, FieldSize::Bits(8));
    }

    #[test]
    fn range_size_binds_to_containing_length_sibling() {
        let p = parsed(&["Long Header Packet {\n  Destination Connection ID Length (8),\n  Destination Connection ID (0..160),\n  Length (i),\n  Packet Number (8..32),\n}"]);
        let s = &p.structs[0];
        assert_eq!(leaf_field(s, 1).size, FieldSize::Field(0));
        // a length field never gets a length of its own
        assert_eq!(leaf_field(s, 2).size, FieldSize::Name("i".into()));
        assert_eq!(leaf_field(s, 3).size, FieldSize::Range(Range::new(Some(8), Some(32))));
    }

    #[test]
    fn containers_keep_their_cardinality() {
        let p = parsed(&[
            "ACK Frame {\n  Type (i) = 0x02..0x03,\n  ACK Range (..) ...,\n  [ECN Counts (..)],\n}",
            "ACK Range {\n  Gap (i),\n  ACK Range Length (i),\n}",
            "ECN Counts {\n  ECT0 Count (i),\n}",
        ]);
        let ack = &p.structs[0];
        match &ack.fields[1] {
            FieldType::Repeating(inner) => assert!(matches!(
                **inner,
                FieldType::StructContainer { target: StructureId(1), .. }
            )),
            other => panic!("expected repeating container, got {other:?}"),
        }
        match &ack.fields[2] {
            FieldType::Optional(inner) => assert!(matches!(
                **inner,
                FieldType::StructContainer { target: StructureId(2), .. }
            )),
            other => panic!("expected optional container, got {other:?}"),
        }
        assert_eq!(leaf_field(ack, 0).value, Some(FieldValue::Range(Range::new(Some(2), Some(3)))));
        assert_eq!(
            p.top_level(),
            vec![Definition::Structure(StructureId(0))]
        );
    }

    #[test]
    fn named_sizes_resolve_structures_then_enums() {
        let p = parsed(&[
            "Packet {\n  Hdr (Header),\n  Payload (Body),\n  Flags (f),\n}",
            "Header {\n  Version (8),\n}",
            "Body = Ping Frame | Pong Frame",
            "Ping Frame {\n  Type (8) = 1,\n}",
            "Pong Frame {\n  Type (8) = 2,\n}",
        ]);
        let packet = &p.structs[0];
        assert_eq!(leaf_field(packet, 0).size, FieldSize::Structure(StructureId(1)));
        assert_eq!(leaf_field(packet, 1).size, FieldSize::Enum(EnumId(0)));
        assert_eq!(leaf_field(packet, 2).size, FieldSize::Name("f".into()));
        assert_eq!(p.enums[0].values[0].ty, Some(StructureId(2)));
        assert_eq!(p.enums[0].values[1].ty, Some(StructureId(3)));
        assert_eq!(p.top_level(), vec![Definition::Structure(StructureId(0))]);
    }

    #[test]
    fn unknown_variant_stays_unresolved() {
        let p = parsed(&["Frame = Missing Frame | Other Frame"]);
        assert!(p.enums[0].values.iter().all(|v| v.ty.is_none()));
    }

    #[test]
    fn first_definition_wins() {
        let p = parsed(&[
            "Outer {\n  Inner,\n}",
            "Inner {\n  A (8),\n}",
            "Inner {\n  A (16),\n}",
        ]);
        assert!(matches!(
            p.structs[0].fields[0],
            FieldType::StructContainer { target: StructureId(1), .. }
        ));
        assert_eq!(p.definitions().len(), 3);
        assert_eq!(
            p.top_level(),
            vec![Definition::Structure(StructureId(0)), Definition::Structure(StructureId(2))]
        );
    }

    #[test]
    fn document_name_and_blocks() {
        use crate::document::Title;
        let doc = Document::from_text("Ping {\n  Type (8) = 1,\n}\n\nsome prose that is not a definition\n")
            .with_title(Title {
                text: Some("Ping: A Test Protocol".into()),
                abbrev: None,
            });
        let p = ParsedRepresentation::new(&doc, &CompileOptions::default());
        assert_eq!(p.name.as_deref(), Some("Ping"));
        assert_eq!(p.structs.len(), 1);
        assert_eq!(p.definition_name(p.definitions()[0]), "Ping");
    }
}

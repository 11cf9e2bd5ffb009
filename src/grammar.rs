//! Parse artwork text with PEST and build raw definitions through [`Constructors`].
//!
//! Parsing and building are separate steps: PEST produces the syntax tree, and the `build_*`
//! functions walk it, calling back into the constructors for every node.

use crate::error::ExtractError;
use crate::raw::{Constructors, Enum, FieldSize, FieldType, FieldValue, Range, Structure};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct ArtworkParser;

/// What one artwork block turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Structure(Structure),
    Enum(Enum),
    NoMatch,
}

/// Try the block as a structure, then as an enum. Anything else is not a definition.
pub fn extract_block(text: &str, ctors: &mut impl Constructors) -> Extracted {
    let as_structure = match parse_structure(text, ctors) {
        Ok(s) => return Extracted::Structure(s),
        Err(e) => e,
    };
    match parse_enum(text, ctors) {
        Ok(e) => Extracted::Enum(e),
        Err(as_enum) => {
            tracing::debug!(as_structure = %as_structure, as_enum = %as_enum, "artwork is not a definition");
            Extracted::NoMatch
        }
    }
}

pub fn parse_structure(text: &str, ctors: &mut impl Constructors) -> Result<Structure, ExtractError> {
    let pair = parse_rule(Rule::structure, text)?;
    build_structure(pair, ctors)
}

pub fn parse_enum(text: &str, ctors: &mut impl Constructors) -> Result<Enum, ExtractError> {
    let pair = parse_rule(Rule::enum_def, text)?;
    build_enum(pair, ctors)
}

fn parse_rule(rule: Rule, text: &str) -> Result<Pair<'_, Rule>, ExtractError> {
    let mut pairs = ArtworkParser::parse(rule, text).map_err(|e| ExtractError::Grammar(e.to_string()))?;
    pairs
        .next()
        .ok_or_else(|| ExtractError::Syntax("empty parse".to_string()))
}

fn build_structure(pair: Pair<Rule>, ctors: &mut impl Constructors) -> Result<Structure, ExtractError> {
    let mut name = None;
    let mut fields = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::name => name = Some(inner.as_str().to_string()),
            Rule::field_entry => fields.push(build_field_entry(inner, ctors)?),
            _ => {}
        }
    }
    let name = name.ok_or_else(|| ExtractError::Syntax("structure: missing name".to_string()))?;
    Ok(ctors.new_struct(name, fields))
}

fn build_field_entry(pair: Pair<Rule>, ctors: &mut impl Constructors) -> Result<FieldType, ExtractError> {
    let entry = pair
        .into_inner()
        .next()
        .ok_or_else(|| ExtractError::Syntax("empty field entry".to_string()))?;
    let optional = entry.as_rule() == Rule::optional_field;
    let mut field = None;
    let mut repeated = false;
    for part in entry.into_inner() {
        match part.as_rule() {
            Rule::field => field = Some(build_field(part, ctors)?),
            Rule::repeated => repeated = true,
            _ => {}
        }
    }
    let mut field = field.ok_or_else(|| ExtractError::Syntax("field entry: missing field".to_string()))?;
    if repeated {
        field = ctors.new_repeating_field(field);
    }
    if optional {
        field = ctors.new_optional_field(field);
    }
    Ok(field)
}

fn build_field(pair: Pair<Rule>, ctors: &mut impl Constructors) -> Result<FieldType, ExtractError> {
    let mut name = None;
    let mut size = None;
    let mut value = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::name => name = Some(inner.as_str().to_string()),
            Rule::size => size = Some(build_size(inner, ctors)?),
            Rule::value => value = Some(build_value(inner, ctors)?),
            _ => {}
        }
    }
    let name = name.ok_or_else(|| ExtractError::Syntax("field: missing name".to_string()))?;
    // No size written means any size.
    let size = match size {
        Some(size) => size,
        None => FieldSize::Range(ctors.new_range(None, None)),
    };
    Ok(ctors.new_field(name, size, value))
}

fn build_size(pair: Pair<Rule>, ctors: &mut impl Constructors) -> Result<FieldSize, ExtractError> {
    let inner = single(pair, "size")?;
    match inner.as_rule() {
        Rule::range => Ok(FieldSize::Range(build_range(inner, ctors)?)),
        Rule::number => Ok(FieldSize::Bits(parse_number(inner.as_str())?)),
        Rule::name => Ok(FieldSize::Name(inner.as_str().to_string())),
        other => Err(ExtractError::Syntax(format!("size: unexpected {other:?}"))),
    }
}

fn build_value(pair: Pair<Rule>, ctors: &mut impl Constructors) -> Result<FieldValue, ExtractError> {
    let inner = single(pair, "value")?;
    match inner.as_rule() {
        Rule::range => Ok(FieldValue::Range(build_range(inner, ctors)?)),
        Rule::number => Ok(FieldValue::Int(parse_number(inner.as_str())?)),
        other => Err(ExtractError::Syntax(format!("value: unexpected {other:?}"))),
    }
}

fn build_range(pair: Pair<Rule>, ctors: &mut impl Constructors) -> Result<Range, ExtractError> {
    let mut min = None;
    let mut max = None;
    for bound in pair.into_inner() {
        let n = parse_number(single(bound.clone(), "range bound")?.as_str())?;
        match bound.as_rule() {
            Rule::range_min => min = Some(n),
            Rule::range_max => max = Some(n),
            _ => {}
        }
    }
    Ok(ctors.new_range(min, max))
}

fn build_enum(pair: Pair<Rule>, ctors: &mut impl Constructors) -> Result<Enum, ExtractError> {
    let mut names = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::name)
        .map(|p| p.as_str().to_string());
    let name = names
        .next()
        .ok_or_else(|| ExtractError::Syntax("enum: missing name".to_string()))?;
    let values = names.map(|v| ctors.new_enum_value(v)).collect();
    Ok(ctors.new_enum(name, values))
}

fn single<'a>(pair: Pair<'a, Rule>, what: &str) -> Result<Pair<'a, Rule>, ExtractError> {
    pair.into_inner()
        .next()
        .ok_or_else(|| ExtractError::Syntax(format!("{what}: empty")))
}

/// Decimal, or hexadecimal with a `0x` prefix.
fn parse_number(s: &str) -> Result<u64, ExtractError> {
    let parsed = match s.get(..2) {
        Some("0x") | Some("0X") => u64::from_str_radix(&s[2..], 16),
        _ => s.parse(),
    };
    parsed.map_err(|_| ExtractError::Number(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{DefaultConstructors, EnumValue, Field};

    fn field(name: &str, size: FieldSize, value: Option<FieldValue>) -> FieldType {
        FieldType::Field(Field {
            name: name.to_string(),
            size,
            value,
        })
    }

    #[test]
    fn structure_with_every_size_form() {
        let text = r#"
        Test {
            Field One (2) = 2,
            Field Two (..20),
            Field Three (i),
            Field Four (..) = 3..6,
        }
        "#;
        let parsed = parse_structure(text, &mut DefaultConstructors).unwrap();
        assert_eq!(
            parsed,
            Structure {
                name: "Test".to_string(),
                fields: vec![
                    field("Field One", FieldSize::Bits(2), Some(FieldValue::Int(2))),
                    field("Field Two", FieldSize::Range(Range::new(None, Some(20))), None),
                    field("Field Three", FieldSize::Name("i".to_string()), None),
                    field(
                        "Field Four",
                        FieldSize::Range(Range::default()),
                        Some(FieldValue::Range(Range::new(Some(3), Some(6))))
                    ),
                ],
            }
        );
    }

    #[test]
    fn cardinality_and_hex_values() {
        let text = "ACK Frame {\n  Type (i) = 0x02..0x03,\n  ACK Range (..) ...,\n  [ECN Counts (..)],\n}";
        let parsed = parse_structure(text, &mut DefaultConstructors).unwrap();
        assert_eq!(parsed.name, "ACK Frame");
        assert_eq!(
            parsed.fields[0],
            field(
                "Type",
                FieldSize::Name("i".to_string()),
                Some(FieldValue::Range(Range::new(Some(2), Some(3))))
            )
        );
        assert!(matches!(parsed.fields[1], FieldType::Repeating(_)));
        assert!(matches!(parsed.fields[2], FieldType::Optional(_)));
        assert_eq!(parsed.fields[2].name(), "ECN Counts");
    }

    #[test]
    fn field_without_size_is_unbounded() {
        let parsed = parse_structure("Payload { Data }", &mut DefaultConstructors).unwrap();
        assert_eq!(parsed.fields, vec![field("Data", FieldSize::Range(Range::default()), None)]);
    }

    #[test]
    fn multi_word_size_names() {
        let parsed = parse_structure(
            "Packet {\n  Hdr (Packet Header),\n  Payload (2 Bytes),\n  Len (8),\n}",
            &mut DefaultConstructors,
        )
        .unwrap();
        assert_eq!(parsed.fields[0], field("Hdr", FieldSize::Name("Packet Header".to_string()), None));
        assert_eq!(parsed.fields[1], field("Payload", FieldSize::Name("2 Bytes".to_string()), None));
        assert_eq!(parsed.fields[2], field("Len", FieldSize::Bits(8), None));
        assert!(matches!(
            extract_block("Packet {\n  Hdr (Packet Header),\n}", &mut DefaultConstructors),
            Extracted::Structure(_)
        ));
    }

    #[test]
    fn enum_production() {
        let parsed = parse_enum("Frame = Padding Frame | Ping Frame", &mut DefaultConstructors).unwrap();
        assert_eq!(parsed.name, "Frame");
        assert_eq!(
            parsed.values,
            vec![
                EnumValue { name: "Padding Frame".to_string(), ty: None },
                EnumValue { name: "Ping Frame".to_string(), ty: None },
            ]
        );
    }

    #[test]
    fn prose_is_no_match() {
        let mut ctors = DefaultConstructors;
        assert_eq!(extract_block("+--------+\n| Header |\n+--------+", &mut ctors), Extracted::NoMatch);
        assert_eq!(extract_block("", &mut ctors), Extracted::NoMatch);
        assert!(matches!(extract_block("X = Y | Z", &mut ctors), Extracted::Enum(_)));
    }

    #[test]
    fn oversized_number_is_an_error() {
        let err = parse_structure("Big { Huge (99999999999999999999999) }", &mut DefaultConstructors).unwrap_err();
        assert!(matches!(err, ExtractError::Number(_)));
    }

    #[derive(Default)]
    struct Counting {
        fields: usize,
        ranges: usize,
    }

    impl Constructors for Counting {
        fn new_field(&mut self, name: String, size: FieldSize, value: Option<FieldValue>) -> FieldType {
            self.fields += 1;
            FieldType::Field(Field { name, size, value })
        }

        fn new_range(&mut self, min: Option<u64>, max: Option<u64>) -> Range {
            self.ranges += 1;
            Range::new(min, max)
        }
    }

    #[test]
    fn constructors_see_every_node() {
        let mut counting = Counting::default();
        parse_structure("Hdr { A (8), B (0..4) = 1..2, C }", &mut counting).unwrap();
        assert_eq!(counting.fields, 3);
        assert_eq!(counting.ranges, 3);
    }
}

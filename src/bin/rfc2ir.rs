//! Compile the packet diagrams in a plain-text document and print the resulting protocol.
//!
//! Usage:
//!   rfc2ir [OPTIONS] [FILE]
//!   rfc2ir [OPTIONS] < file.txt
//!
//! Artwork blocks are separated by blank lines; blocks that are not a structure or enum
//! definition are skipped.
//!
//! Options:
//!   --name NAME            Protocol name (default: none)
//!   --varint-marker M      Size name meaning a variable-length integer (default: i)
//!   --length-suffix S      Suffix marking a length field (default: " length")
//!   --no-pdus              Do not register top-level definitions as PDUs
//!   --order                Print type names in dependency order instead of the full listing

use anyhow::{bail, Context};
use rfc2ir::dump::format_protocol;
use rfc2ir::{compile, CompileOptions, Document};
use std::io::{self, Read};

/// Remove `flag` from `args`, reporting whether it was present.
fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    if let Some(pos) = args.iter().position(|a| a == flag) {
        args.remove(pos);
        true
    } else {
        false
    }
}

/// Remove `flag` and its value from `args`.
fn take_value(args: &mut Vec<String>, flag: &str) -> anyhow::Result<Option<String>> {
    let Some(pos) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        bail!("{flag} needs a value");
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(value))
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let order = take_flag(&mut args, "--order");
    let no_pdus = take_flag(&mut args, "--no-pdus");

    let mut options = CompileOptions::default().with_pdus(!no_pdus);
    if let Some(name) = take_value(&mut args, "--name")? {
        options = options.with_protocol_name(name);
    }
    if let Some(marker) = take_value(&mut args, "--varint-marker")? {
        options = options.with_varint_marker(marker);
    }
    if let Some(suffix) = take_value(&mut args, "--length-suffix")? {
        options = options.with_length_suffix(suffix);
    }

    let (document, source) = match args.as_slice() {
        [] => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            (Document::from_text(&text), "<stdin>".to_string())
        }
        [path] => (
            Document::from_path(path).with_context(|| format!("reading {path}"))?,
            path.clone(),
        ),
        _ => bail!("expected at most one input file, got {}", args.len()),
    };

    let protocol = compile(&document, &options).with_context(|| format!("compiling {source}"))?;
    if order {
        for name in protocol.traversal_order() {
            println!("{name}");
        }
    } else {
        print!("{}", format_protocol(&protocol));
    }
    Ok(())
}

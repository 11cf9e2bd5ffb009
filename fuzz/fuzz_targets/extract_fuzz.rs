//! A single artwork block through the grammar. Anything that is neither a structure nor an
//! enum must come back as `NoMatch`, never as a panic.
//! Run with: cargo fuzz run extract_fuzz

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
use rfc2ir::grammar::{extract_block, Extracted};

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let Ok(block) = std::str::from_utf8(data) else {
        return;
    };
    if let Extracted::Structure(s) = extract_block(block, &mut rfc2ir::raw::DefaultConstructors) {
        assert!(!s.name.is_empty());
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Run with: cargo fuzz run extract_fuzz");
}

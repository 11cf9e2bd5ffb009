//! Whole documents through compilation. Bad definitions must surface as `TypeError`; a
//! protocol that compiles must list and traverse without panicking.
//! Run with: cargo fuzz run compile_fuzz

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(protocol) = rfc2ir::compile_text(text, &rfc2ir::CompileOptions::default()) {
        let order = protocol.traversal_order();
        assert_eq!(order.last().map(String::as_str), Some("Context"));
        let _ = rfc2ir::dump::format_protocol(&protocol);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Run with: cargo fuzz run compile_fuzz");
}

//! Fuzz target for the restricted expression grammar.
//!
//! Parsing arbitrary text must return an error rather than panic, and any
//! expression that parses must evaluate without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rk_core::expr::{Expression, Variables};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(expr) = Expression::parse(text) {
        let mut vars = Variables::new();
        for name in expr.variables() {
            vars.set(name, 1.5);
        }
        let _ = expr.evaluate(&vars);
        // Display must re-parse.
        let _ = Expression::parse(&expr.to_string());
    }
});

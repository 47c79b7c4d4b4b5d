#![no_main]

use libfuzzer_sys::fuzz_target;

// Arbitrary bytes through the predicate compiler. Goal: compile() either
// returns a tree or a typed error; it never panics, even on garbage.
fuzz_target!(|data: &[u8]| {
    let _ = tracescan_core::compile(data);
});

//! Fuzz target for layout JSON parsing.
//!
//! Anything that parses must also validate and rearrange without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use redecor::layout::io_json::from_json_slice;
use redecor::rearrange::{generate_rearranged_layouts, RearrangeOptions};
use redecor::validation::{validate_layout, ValidateOptions};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(layout) = from_json_slice(data) {
        let _ = validate_layout(&layout, &ValidateOptions::default());
        let _ = generate_rearranged_layouts(
            &layout,
            &RearrangeOptions {
                num_versions: 2,
                seed: Some(0),
            },
        );
    }
});

//! Fuzz target for config YAML parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use redecor::config::Config;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 1024 * 1024 {
        return;
    }

    if let Ok(config) = Config::from_yaml_str(text) {
        let _ = config.validate();
    }
});

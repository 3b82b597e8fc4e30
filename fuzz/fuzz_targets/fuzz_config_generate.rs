#![no_main]

use libfuzzer_sys::fuzz_target;
use melodia_core::{check_line, generate, GenerationConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(mut config) = GenerationConfig::from_json(text) else {
        return;
    };
    config.length = config.length.min(64);
    config.max_attempts = config.max_attempts.min(2_000);

    let Ok(resolved) = config.validate() else {
        return;
    };
    let Ok(result) = generate(&config) else {
        return;
    };
    let report = check_line(&resolved, &result);
    if result.completed {
        assert!(
            report.violations.iter().all(|v| v.is_soft()),
            "hard violation for {:?}: {:?}",
            config,
            report.violations
        );
    }
});

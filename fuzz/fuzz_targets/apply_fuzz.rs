#![no_main]
use libfuzzer_sys::fuzz_target;
use oxipatch::PatchOptions;

fuzz_target!(|data: &[u8]| {
    // Arbitrary patches must only ever produce errors, never panics.
    let opts = PatchOptions::default()
        .with_max_target_size(16 * 1024 * 1024)
        .with_max_inflated_size(16 * 1024 * 1024);

    let _ = oxipatch::apply_with_options(&[], data, &opts);

    if data.len() >= 2 {
        let split = data.len() / 2;
        let (old, patch) = data.split_at(split);
        let _ = oxipatch::apply_with_options(old, patch, &opts);
    }
});

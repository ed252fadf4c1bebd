#![no_main]
use libfuzzer_sys::fuzz_target;
use oxipatch::bsdiff::{ControlIter, PatchContainer};

fuzz_target!(|data: &[u8]| {
    // Header and segment split must never panic on arbitrary bytes.
    if let Ok(container) = PatchContainer::parse(data) {
        assert!(container.control.len() + container.diff.len() + container.extra.len() + 32 == data.len());
    }

    // Nor may tuple decoding over an arbitrary raw control stream.
    let mut iter = ControlIter::new(data);
    let n = iter.by_ref().count();
    assert_eq!(n, data.len() / 24);
    assert_eq!(iter.remainder().len(), data.len() % 24);
});

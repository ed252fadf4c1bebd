mod common;

use common::{build_patch, simple_patch};
use oxipatch::{PatchError, apply};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_simple_patch_roundtrip(
        old in proptest::collection::vec(any::<u8>(), 0..2048),
        new in proptest::collection::vec(any::<u8>(), 0..2048),
    ) {
        let patch = simple_patch(&old, &new);
        prop_assert_eq!(apply(&old, &patch).unwrap(), new);
    }

    #[test]
    fn prop_apply_is_deterministic(
        old in proptest::collection::vec(any::<u8>(), 0..512),
        new in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let patch = simple_patch(&old, &new);
        prop_assert_eq!(apply(&old, &patch).unwrap(), apply(&old, &patch).unwrap());
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(
        old in proptest::collection::vec(any::<u8>(), 0..256),
        patch in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let _ = apply(&old, &patch);
    }

    #[test]
    fn prop_arbitrary_header_after_magic_never_panics(
        fields in proptest::collection::vec(any::<u8>(), 24..128),
    ) {
        let mut patch = b"BSDIFF40".to_vec();
        patch.extend_from_slice(&fields);
        let _ = apply(b"old", &patch);
    }

    #[test]
    fn prop_out_of_range_seek_never_fails(
        old in proptest::collection::vec(any::<u8>(), 0..64),
        diff in proptest::collection::vec(any::<u8>(), 1..128),
        seek in -1_000_000i64..1_000_000,
    ) {
        let len = diff.len() as i64;
        let patch = build_patch(len, &[(0, 0, seek), (len, 0, 0)], &diff, b"");
        let out = apply(&old, &patch).unwrap();
        prop_assert_eq!(out.len(), diff.len());
        for (i, &b) in out.iter().enumerate() {
            let idx = seek + i as i64;
            let base = if idx >= 0 && (idx as usize) < old.len() { old[idx as usize] } else { 0 };
            prop_assert_eq!(b, diff[i].wrapping_add(base));
        }
    }

    #[test]
    fn prop_short_control_is_corrupt(
        inserted in 0i64..64,
        missing in 1i64..64,
    ) {
        let extra = vec![0xAA; inserted as usize];
        let patch = build_patch(inserted + missing, &[(0, inserted, 0)], b"", &extra);
        let err = apply(b"", &patch).unwrap_err();
        let is_exhausted = matches!(err, PatchError::ControlStreamExhausted { .. });
        prop_assert!(is_exhausted);
    }
}

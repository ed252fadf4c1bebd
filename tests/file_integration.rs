mod common;

use common::{build_patch, simple_patch};
use oxipatch::batch::{PatchJob, apply_all};
use oxipatch::{PatchOptions, ResultCode, apply_file, apply_patch, describe};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tempfile::tempdir;

#[test]
fn apply_patch_writes_new_file() {
    let dir = tempdir().unwrap();
    let old = dir.path().join("old.bin");
    let patch = dir.path().join("p.bsdiff");
    let new = dir.path().join("new.bin");

    std::fs::write(&old, b"ABCDEFGH").unwrap();
    std::fs::write(&patch, build_patch(8, &[(8, 0, 0)], &[1, 0, 0, 0, 0, 0, 0, 0], b"")).unwrap();

    assert_eq!(apply_patch(&old, &new, &patch), 0);
    assert_eq!(std::fs::read(&new).unwrap(), b"BBCDEFGH");
}

#[test]
fn io_failures_map_to_codes() {
    let dir = tempdir().unwrap();
    let old = dir.path().join("old.bin");
    let patch = dir.path().join("p.bsdiff");
    let new = dir.path().join("new.bin");

    assert_eq!(apply_patch(&old, &new, &patch), ResultCode::OpenOld.code());

    std::fs::write(&old, b"").unwrap();
    assert_eq!(apply_patch(&old, &new, &patch), ResultCode::OpenPatch.code());

    std::fs::write(&patch, simple_patch(b"", b"hi")).unwrap();
    let nested = dir.path().join("missing").join("new.bin");
    assert_eq!(apply_patch(&old, &nested, &patch), ResultCode::CreateNew.code());
}

#[test]
fn bad_magic_leaves_no_output() {
    let dir = tempdir().unwrap();
    let old = dir.path().join("old.bin");
    let patch = dir.path().join("p.bsdiff");
    let new = dir.path().join("new.bin");

    let mut data = simple_patch(b"abc", b"abd");
    data[..8].copy_from_slice(b"XXXXXXXX");
    std::fs::write(&old, b"abc").unwrap();
    std::fs::write(&patch, data).unwrap();

    let code = apply_patch(&old, &new, &patch);
    assert_eq!(code, -4);
    assert_ne!(describe(code), describe(0));
    assert!(!new.exists());
}

#[test]
fn large_random_payload_roundtrip() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut old = vec![0u8; 1 << 20];
    rng.fill(&mut old[..]);
    let mut new = old.clone();
    for _ in 0..1000 {
        let i = rng.random_range(0..new.len());
        new[i] = rng.random();
    }
    new.extend((0..4096).map(|_| rng.random::<u8>()));

    let dir = tempdir().unwrap();
    let old_path = dir.path().join("old.bin");
    let patch_path = dir.path().join("p.bsdiff");
    let new_path = dir.path().join("new.bin");
    std::fs::write(&old_path, &old).unwrap();
    std::fs::write(&patch_path, simple_patch(&old, &new)).unwrap();

    let stats = apply_file(&old_path, &patch_path, &new_path, &PatchOptions::default()).unwrap();
    assert_eq!(stats.old_size, old.len() as u64);
    assert_eq!(stats.new_size, new.len() as u64);
    assert_eq!(std::fs::read(&new_path).unwrap(), new);
}

#[test]
fn batch_jobs_are_independent() {
    let dir = tempdir().unwrap();
    let mut jobs = Vec::new();
    for i in 0..4u8 {
        let old = dir.path().join(format!("old{i}"));
        let patch = dir.path().join(format!("p{i}"));
        let new = dir.path().join(format!("new{i}"));
        std::fs::write(&old, [i; 16]).unwrap();
        std::fs::write(&patch, simple_patch(&[i; 16], &[i + 1; 20])).unwrap();
        jobs.push(PatchJob::new(old, patch, new));
    }
    // One broken job must not affect the rest.
    jobs.push(PatchJob::new(
        dir.path().join("nope"),
        dir.path().join("p0"),
        dir.path().join("never"),
    ));

    let results = apply_all(&jobs, &PatchOptions::default());
    assert_eq!(results.len(), 5);
    for (i, result) in results.iter().take(4).enumerate() {
        assert_eq!(result.as_ref().unwrap().new_size, 20);
        let new = std::fs::read(&jobs[i].new).unwrap();
        assert_eq!(new, vec![i as u8 + 1; 20]);
    }
    assert_eq!(
        results[4].as_ref().unwrap_err().code(),
        ResultCode::OpenOld
    );
}

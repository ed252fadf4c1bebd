// Patch builders shared by the integration tests.

#![allow(dead_code)]

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

pub const MAGIC: &[u8; 8] = b"BSDIFF40";

pub fn encode_offset(value: i64) -> [u8; 8] {
    let mut word = value.unsigned_abs();
    if value < 0 {
        word |= 1 << 63;
    }
    word.to_le_bytes()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

pub fn control_stream(tuples: &[(i64, i64, i64)]) -> Vec<u8> {
    let mut out = Vec::with_capacity(tuples.len() * 24);
    for &(copy, insert, seek) in tuples {
        out.extend_from_slice(&encode_offset(copy));
        out.extend_from_slice(&encode_offset(insert));
        out.extend_from_slice(&encode_offset(seek));
    }
    out
}

/// Assemble a container from already-compressed segments.
pub fn assemble(target_size: i64, control: &[u8], diff: &[u8], extra: &[u8]) -> Vec<u8> {
    let mut out = MAGIC.to_vec();
    out.extend_from_slice(&encode_offset(control.len() as i64));
    out.extend_from_slice(&encode_offset(diff.len() as i64));
    out.extend_from_slice(&encode_offset(target_size));
    out.extend_from_slice(control);
    out.extend_from_slice(diff);
    out.extend_from_slice(extra);
    out
}

pub fn build_patch(
    target_size: i64,
    tuples: &[(i64, i64, i64)],
    diff: &[u8],
    extra: &[u8],
) -> Vec<u8> {
    let extra = if extra.is_empty() {
        Vec::new()
    } else {
        gzip(extra)
    };
    assemble(
        target_size,
        &gzip(&control_stream(tuples)),
        &gzip(diff),
        &extra,
    )
}

/// Naive diff producing a single copy tuple over the common prefix length
/// and an insert for the remainder. Enough to turn any `old` into any `new`.
pub fn simple_patch(old: &[u8], new: &[u8]) -> Vec<u8> {
    let copy = old.len().min(new.len());
    let diff: Vec<u8> = (0..copy).map(|i| new[i].wrapping_sub(old[i])).collect();
    let extra = &new[copy..];
    build_patch(
        new.len() as i64,
        &[(copy as i64, extra.len() as i64, 0)],
        &diff,
        extra,
    )
}

// Fixture builders shared by unit tests.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::bsdiff::header::BSDIFF_MAGIC;

/// Sign-magnitude encoding, the inverse of `decode_offset`.
pub fn encode_offset(value: i64) -> [u8; 8] {
    let mut word = value.unsigned_abs();
    if value < 0 {
        word |= 1 << 63;
    }
    word.to_le_bytes()
}

/// A bare 32-byte header with the given fields.
pub fn raw_header(control_len: i64, diff_len: i64, target_size: i64) -> Vec<u8> {
    let mut out = BSDIFF_MAGIC.to_vec();
    out.extend_from_slice(&encode_offset(control_len));
    out.extend_from_slice(&encode_offset(diff_len));
    out.extend_from_slice(&encode_offset(target_size));
    out
}

/// Uncompressed control stream for the given `(copy, insert, seek)` tuples.
pub fn control_stream(tuples: &[(i64, i64, i64)]) -> Vec<u8> {
    let mut out = Vec::with_capacity(tuples.len() * 24);
    for &(copy, insert, seek) in tuples {
        out.extend_from_slice(&encode_offset(copy));
        out.extend_from_slice(&encode_offset(insert));
        out.extend_from_slice(&encode_offset(seek));
    }
    out
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// Full patch container. An empty `extra` is stored as a zero-length
/// segment, the way bsdiff-style producers omit it.
pub fn build_patch(
    target_size: i64,
    tuples: &[(i64, i64, i64)],
    diff: &[u8],
    extra: &[u8],
) -> Vec<u8> {
    let control = gzip(&control_stream(tuples));
    let diff = gzip(diff);
    let extra = if extra.is_empty() {
        Vec::new()
    } else {
        gzip(extra)
    };

    let mut out = raw_header(control.len() as i64, diff.len() as i64, target_size);
    out.extend_from_slice(&control);
    out.extend_from_slice(&diff);
    out.extend_from_slice(&extra);
    out
}
